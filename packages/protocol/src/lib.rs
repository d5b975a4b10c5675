//! # Quiz Editor Host Protocol
//!
//! Connects an editing session to the page that embeds the editor frame.
//! The frame announces itself with `"ready"`, receives a message port,
//! and from then on exchanges JSON messages over that port only.

mod messages;
mod port;
mod sync;

pub use messages::{CurrentStateData, MessageFromEditor, MessageToEditor};
pub use port::{
    window_pair, FrameWindow, HostWindow, MessageChannel, MessagePort, WindowMessage, ANY_ORIGIN,
    READY_MESSAGE,
};
pub use sync::{EditorCommand, HostSync};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed {message} message: {source}")]
    MalformedMessage {
        message: String,
        source: serde_json::Error,
    },

    #[error("Message channel closed")]
    ChannelClosed,

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Editor error: {0}")]
    Editor(#[from] quiz_editor::EditorError),
}
