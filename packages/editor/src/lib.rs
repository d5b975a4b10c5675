//! # Quiz Editor
//!
//! Normalized entity store behind the quiz editor frame.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host: nested quiz document                  │
//! └─────────────────────────────────────────────┘
//!                     ↓ normalize
//! ┌─────────────────────────────────────────────┐
//! │ editor: flat tables + session state         │
//! │  - Apply mutations with validation          │
//! │  - Cascade deletes through post-effects     │
//! │  - Keep sibling order dense                 │
//! │  - Check references after each change       │
//! └─────────────────────────────────────────────┘
//!                     ↓ denormalize
//! ┌─────────────────────────────────────────────┐
//! │ host: nested quiz document                  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Tables are the source of truth**: the nested document is a derived view
//! 2. **Order is authoritative**: id-list positions never move, `order` does
//! 3. **Session state follows entities**: created and removed together
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quiz_editor::{EditSession, ItemField};
//! use quiz_common::EditorConfig;
//! use quiz_schema::ItemKind;
//!
//! let mut session = EditSession::new(EditorConfig::default());
//! session.bootstrap(None);
//!
//! let result = session.create_item(ItemKind::Open)?;
//! let item_id = result.document.unwrap().items[0].id.clone();
//! session.edit_item(&item_id, ItemField::ValidityRegex("^[0-9]+$".into()))?;
//! ```

mod denormalize;
mod document;
mod errors;
mod fields;
mod integrity;
mod mutations;
mod normalize;
mod pipeline;
mod post_effects;
mod session;
mod variables;

pub use denormalize::{denormalize, DenormalizeError};
pub use document::{EditorState, MutationResult};
pub use errors::EditorError;
pub use fields::{ItemField, OptionField, PeerReviewCollectionField, QuestionField, QuizField};
pub use integrity::{check_ordering, check_references, IntegrityError};
pub use mutations::{Mutation, MutationError, MutationOutcome};
pub use normalize::normalize;
pub use pipeline::{Pipeline, PipelineResult};
pub use post_effects::{
    CascadeCollectionQuestions, CascadeItemOptions, PostEffect, PostEffectEngine,
};
pub use session::EditSession;
pub use variables::{
    ItemVariables, OptionVariables, PeerReviewCollectionVariables, QuestionVariables, QuizVariables,
    ScaleBounds, SessionVariables, UiCommand,
};
