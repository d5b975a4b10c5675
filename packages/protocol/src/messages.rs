//! Messages exchanged with the host page over the message port.

use quiz_schema::QuizDocument;
use serde::{Deserialize, Serialize};

/// Host → editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message", rename_all = "kebab-case")]
pub enum MessageToEditor {
    /// Replace the quiz being edited; `null` asks for a blank quiz
    SetState {
        #[serde(default)]
        data: Option<QuizDocument>,
        #[serde(default)]
        valid: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        view_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_information: Option<serde_json::Value>,
    },

    SetLanguage { data: String },
}

impl MessageToEditor {
    pub const SET_STATE: &'static str = "set-state";
    pub const SET_LANGUAGE: &'static str = "set-language";

    /// Whether `tag` names a message the editor understands
    pub fn is_known(tag: &str) -> bool {
        matches!(tag, Self::SET_STATE | Self::SET_LANGUAGE)
    }
}

/// Editor → host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message", rename_all = "kebab-case")]
pub enum MessageFromEditor {
    CurrentState { data: CurrentStateData, valid: bool },

    HeightChanged { data: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentStateData {
    pub private_spec: QuizDocument,
}

impl MessageFromEditor {
    pub fn current_state(document: QuizDocument, valid: bool) -> Self {
        MessageFromEditor::CurrentState {
            data: CurrentStateData {
                private_spec: document,
            },
            valid,
        }
    }
}
