//! # Host Sync
//!
//! Drives one editing session against the host page:
//! - `set-state` re-bootstraps the session (never a merge)
//! - `set-language` is stored on the session
//! - every applied mutation posts `current-state` with the rebuilt document
//! - height reports post `height-changed` when the value changes

use crate::messages::{MessageFromEditor, MessageToEditor};
use crate::port::{FrameWindow, MessagePort};
use crate::ProtocolError;
use quiz_editor::{EditSession, EditorError, Mutation, PipelineResult, UiCommand};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Local requests fed to the sync loop by the editor UI
#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    Apply(Mutation),
    Ui(UiCommand),
    ReportHeight(f64),
}

/// Owns the host port and the editing session
pub struct HostSync {
    port: MessagePort,
    session: EditSession,
    last_height: Option<f64>,
}

impl HostSync {
    pub fn new(port: MessagePort, session: EditSession) -> Self {
        Self {
            port,
            session,
            last_height: None,
        }
    }

    /// Run the ready handshake and take ownership of the granted port
    pub async fn connect(
        window: &mut FrameWindow,
        session: EditSession,
    ) -> Result<Self, ProtocolError> {
        let port = window.handshake().await?;
        info!(session_id = %session.id, "Connected to host");
        Ok(Self::new(port, session))
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// Command channel sized by the session's configured capacity
    pub fn command_channel(&self) -> (mpsc::Sender<EditorCommand>, mpsc::Receiver<EditorCommand>) {
        mpsc::channel(self.session.config().channel_capacity.max(1))
    }

    /// Handle one raw message from the host
    ///
    /// Untagged and unknown messages are ignored. A known message that
    /// fails to decode is an error; for `set-state` the session is reset
    /// so the previous quiz is never posted back as current.
    pub fn handle(&mut self, value: Value) -> Result<(), ProtocolError> {
        let Some(tag) = value.get("message").and_then(Value::as_str) else {
            warn!(data = %value, "Ignoring untagged message from host");
            return Ok(());
        };
        if !MessageToEditor::is_known(tag) {
            warn!(message = tag, "Ignoring unknown message from host");
            return Ok(());
        }
        let tag = tag.to_string();

        let message = match serde_json::from_value::<MessageToEditor>(value) {
            Ok(message) => message,
            Err(source) => {
                if tag == MessageToEditor::SET_STATE {
                    self.session.reset();
                }
                return Err(ProtocolError::MalformedMessage {
                    message: tag,
                    source,
                });
            }
        };

        match message {
            MessageToEditor::SetState { data, valid, .. } => {
                debug!(valid, has_data = data.is_some(), "Received set-state");
                self.session.bootstrap(data);
            }
            MessageToEditor::SetLanguage { data } => {
                debug!(language = %data, "Received set-language");
                self.session.set_language(data);
            }
        }
        Ok(())
    }

    /// Run a session operation and sync the result to the host
    pub fn edit<F>(&mut self, operation: F) -> Result<PipelineResult, ProtocolError>
    where
        F: FnOnce(&mut EditSession) -> Result<PipelineResult, EditorError>,
    {
        let result = operation(&mut self.session)?;

        if let Some(document) = &result.document {
            let message = MessageFromEditor::current_state(document.clone(), result.valid);
            post(&self.port, &message);
        }

        Ok(result)
    }

    /// Post `height-changed` unless the height is unchanged; returns whether it posted
    pub fn report_height(&mut self, height: f64) -> bool {
        if self.last_height == Some(height) {
            return false;
        }
        self.last_height = Some(height);
        post(&self.port, &MessageFromEditor::HeightChanged { data: height });
        true
    }

    /// Process host messages and local commands until the host port closes
    pub async fn run(mut self, mut commands: mpsc::Receiver<EditorCommand>) -> EditSession {
        let mut commands_open = true;

        loop {
            tokio::select! {
                // Host state is applied before queued local commands
                biased;

                inbound = self.port.recv() => match inbound {
                    Some(value) => {
                        if let Err(e) = self.handle(value) {
                            error!(error = %e, "Rejected message from host");
                        }
                    }
                    None => {
                        info!("Host closed the message port");
                        break;
                    }
                },
                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.run_command(command),
                    None => commands_open = false,
                },
            }
        }

        self.session
    }

    fn run_command(&mut self, command: EditorCommand) {
        let result = match command {
            EditorCommand::Apply(mutation) => self.edit(|session| session.apply(mutation)).map(drop),
            EditorCommand::Ui(command) => self
                .session
                .apply_ui(command)
                .map_err(ProtocolError::from),
            EditorCommand::ReportHeight(height) => {
                self.report_height(height);
                Ok(())
            }
        };

        if let Err(e) = result {
            error!(error = %e, "Editor command failed");
        }
    }
}

// Fire-and-forget: a closed port is logged, never retried
fn post(port: &MessagePort, message: &MessageFromEditor) {
    if let Err(e) = port.post(message) {
        error!(error = %e, "Failed to post message to host");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MessageChannel;
    use quiz_common::{EditorConfig, SequentialIdGenerator};
    use quiz_schema::ItemKind;
    use serde_json::json;

    fn connected() -> (HostSync, MessagePort) {
        let MessageChannel { port1, port2 } = MessageChannel::new();
        let session = EditSession::with_id_generator(
            EditorConfig::default(),
            Box::new(SequentialIdGenerator::new("id")),
        );
        (HostSync::new(port2, session), port1)
    }

    fn set_state(data: Value) -> Value {
        json!({ "message": "set-state", "data": data, "valid": true })
    }

    #[test]
    fn test_set_state_bootstraps_session() {
        let (mut sync, _host) = connected();

        sync.handle(set_state(Value::Null)).unwrap();

        let state = sync.session().state().unwrap();
        assert!(state.variables().quizzes[state.root()].new_quiz);
    }

    #[test]
    fn test_unknown_message_is_ignored() {
        let (mut sync, _host) = connected();

        sync.handle(json!({ "message": "self-destruct" })).unwrap();
        sync.handle(json!("ready")).unwrap();

        assert!(!sync.session().is_initialized());
    }

    #[test]
    fn test_option_without_parent_id_is_accepted() {
        let (mut sync, _host) = connected();
        sync.handle(set_state(Value::Null)).unwrap();

        sync.handle(set_state(json!({
            "id": "quiz-2",
            "items": [{
                "id": "item-1",
                "quizId": "quiz-2",
                "type": "multiple-choice",
                "order": 0,
                "options": [{ "id": "option-1", "order": 0 }]
            }]
        })))
        .unwrap();

        let state = sync.session().state().unwrap();
        assert_eq!(state.root(), "quiz-2");
        assert_eq!(state.tables().options["option-1"].quiz_item_id, "item-1");
    }

    #[tokio::test]
    async fn test_malformed_set_state_stops_stale_sync() {
        let (mut sync, mut host) = connected();
        sync.handle(set_state(Value::Null)).unwrap();

        let err = sync
            .handle(set_state(json!({ "id": "quiz-2", "items": "not a list" })))
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::MalformedMessage { ref message, .. } if message == "set-state"
        ));
        assert!(!sync.session().is_initialized());

        let result = sync.edit(|session| session.create_item(ItemKind::Essay));
        assert!(matches!(
            result,
            Err(ProtocolError::Editor(EditorError::NotInitialized))
        ));

        sync.handle(set_state(json!({ "id": "quiz-3" }))).unwrap();
        sync.edit(|session| session.create_item(ItemKind::Essay))
            .unwrap();

        let message = host.recv().await.unwrap();
        assert_eq!(message["data"]["private_spec"]["id"], "quiz-3");
    }

    #[test]
    fn test_malformed_set_language_keeps_quiz() {
        let (mut sync, _host) = connected();
        sync.handle(set_state(Value::Null)).unwrap();

        let result = sync.handle(json!({ "message": "set-language", "data": 7 }));

        assert!(result.is_err());
        assert!(sync.session().is_initialized());
    }

    #[tokio::test]
    async fn test_mutation_posts_current_state() {
        let (mut sync, mut host) = connected();
        sync.handle(set_state(Value::Null)).unwrap();

        sync.edit(|session| session.create_item(ItemKind::Essay))
            .unwrap();

        let message = host.recv().await.unwrap();
        assert_eq!(message["message"], "current-state");
        assert_eq!(message["valid"], true);
        assert_eq!(message["data"]["private_spec"]["items"][0]["type"], "essay");
    }

    #[tokio::test]
    async fn test_edits_do_not_wait_for_host_to_read() {
        let (mut sync, mut host) = connected();
        sync.handle(set_state(Value::Null)).unwrap();

        for _ in 0..50 {
            sync.edit(|session| session.create_item(ItemKind::Open))
                .unwrap();
        }

        for _ in 0..50 {
            let message = host.recv().await.unwrap();
            assert_eq!(message["message"], "current-state");
        }
    }

    #[tokio::test]
    async fn test_repeated_height_is_suppressed() {
        let (mut sync, mut host) = connected();

        assert!(sync.report_height(480.0));
        assert!(!sync.report_height(480.0));
        assert!(sync.report_height(512.5));

        assert_eq!(host.recv().await.unwrap()["data"], 480.0);
        assert_eq!(host.recv().await.unwrap()["data"], 512.5);
    }
}
