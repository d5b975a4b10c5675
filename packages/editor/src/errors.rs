//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Denormalize error: {0}")]
    Denormalize(#[from] crate::denormalize::DenormalizeError),

    #[error("Integrity error: {0}")]
    Integrity(#[from] crate::integrity::IntegrityError),

    #[error("Config error: {0}")]
    Config(#[from] quiz_common::CommonError),

    #[error("Editing session has not received a quiz yet")]
    NotInitialized,
}
