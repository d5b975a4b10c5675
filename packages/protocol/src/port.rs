//! # Message Ports
//!
//! A `MessageChannel` is a pair of entangled ports over unbounded tokio
//! `mpsc` channels; whatever one port posts, the other receives, in order.
//! Posting never waits on the receiver.
//!
//! ## Handshake
//!
//! ```text
//! frame                                  host
//!   │── "ready" (target origin "*") ──────▶│
//!   │◀──── window message + port2 ─────────│
//!   │══════════ port1 ⇄ port2 ═════════════│
//! ```
//!
//! The port handed over by the host is the frame's only channel for the
//! rest of the session. Window messages that carry no port are ignored.

use crate::ProtocolError;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

pub const READY_MESSAGE: &str = "ready";
pub const ANY_ORIGIN: &str = "*";

/// One end of a message channel
#[derive(Debug)]
pub struct MessagePort {
    sender: mpsc::UnboundedSender<Value>,
    receiver: mpsc::UnboundedReceiver<Value>,
}

impl MessagePort {
    /// Queue a message for the other end
    pub fn post(&self, message: &impl Serialize) -> Result<(), ProtocolError> {
        let value = serde_json::to_value(message)?;
        self.sender
            .send(value)
            .map_err(|_| ProtocolError::ChannelClosed)
    }

    /// Next message from the other end; `None` once it is gone
    pub async fn recv(&mut self) -> Option<Value> {
        self.receiver.recv().await
    }
}

/// Two entangled ports
#[derive(Debug)]
pub struct MessageChannel {
    pub port1: MessagePort,
    pub port2: MessagePort,
}

impl MessageChannel {
    pub fn new() -> Self {
        let (to_port2, from_port1) = mpsc::unbounded_channel();
        let (to_port1, from_port2) = mpsc::unbounded_channel();

        Self {
            port1: MessagePort {
                sender: to_port2,
                receiver: from_port2,
            },
            port2: MessagePort {
                sender: to_port1,
                receiver: from_port1,
            },
        }
    }
}

impl Default for MessageChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Message posted to a window, optionally transferring a port
#[derive(Debug)]
pub struct WindowMessage {
    pub data: Value,
    pub target_origin: String,
    pub port: Option<MessagePort>,
}

/// The editor frame's view of its parent window
#[derive(Debug)]
pub struct FrameWindow {
    to_parent: mpsc::Sender<WindowMessage>,
    from_parent: mpsc::Receiver<WindowMessage>,
}

/// The host page's view of the editor frame
#[derive(Debug)]
pub struct HostWindow {
    to_frame: mpsc::Sender<WindowMessage>,
    from_frame: mpsc::Receiver<WindowMessage>,
}

/// Connected frame and host windows
pub fn window_pair(capacity: usize) -> (FrameWindow, HostWindow) {
    let (to_parent, from_frame) = mpsc::channel(capacity);
    let (to_frame, from_parent) = mpsc::channel(capacity);

    (
        FrameWindow {
            to_parent,
            from_parent,
        },
        HostWindow {
            to_frame,
            from_frame,
        },
    )
}

impl FrameWindow {
    /// Announce readiness and wait for the host to hand over a port
    pub async fn handshake(&mut self) -> Result<MessagePort, ProtocolError> {
        self.to_parent
            .send(WindowMessage {
                data: Value::String(READY_MESSAGE.to_string()),
                target_origin: ANY_ORIGIN.to_string(),
                port: None,
            })
            .await
            .map_err(|_| ProtocolError::Handshake("parent window is gone".into()))?;

        while let Some(message) = self.from_parent.recv().await {
            match message.port {
                Some(port) => {
                    debug!("Received message port from host");
                    return Ok(port);
                }
                None => debug!(data = %message.data, "Ignoring window message without a port"),
            }
        }

        Err(ProtocolError::Handshake(
            "parent window closed before sending a port".into(),
        ))
    }
}

impl HostWindow {
    /// Wait for the frame's ready signal, then hand it one end of a new channel
    pub async fn accept(&mut self) -> Result<MessagePort, ProtocolError> {
        loop {
            let message = self
                .from_frame
                .recv()
                .await
                .ok_or_else(|| ProtocolError::Handshake("frame closed before ready".into()))?;

            if message.data == Value::String(READY_MESSAGE.to_string()) {
                break;
            }
        }

        let MessageChannel { port1, port2 } = MessageChannel::new();
        self.to_frame
            .send(WindowMessage {
                data: Value::String("communication-port".into()),
                target_origin: ANY_ORIGIN.to_string(),
                port: Some(port2),
            })
            .await
            .map_err(|_| ProtocolError::Handshake("frame is gone".into()))?;

        Ok(port1)
    }

    /// Post a plain window message (no port)
    pub async fn post(&self, data: Value) -> Result<(), ProtocolError> {
        self.to_frame
            .send(WindowMessage {
                data,
                target_origin: ANY_ORIGIN.to_string(),
                port: None,
            })
            .await
            .map_err(|_| ProtocolError::ChannelClosed)
    }

    /// Next window message from the frame
    pub async fn recv(&mut self) -> Option<WindowMessage> {
        self.from_frame.recv().await
    }
}
