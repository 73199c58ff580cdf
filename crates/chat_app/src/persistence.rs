use std::path::Path;

use chat_core::{ConversationSnapshot, Message, Model, Role, Theme};
use chat_engine::StateFile;
use chat_logging::{chat_error, chat_info, chat_warn};
use serde::{Deserialize, Serialize};

const STATE_FILENAME: &str = "chat_state.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState {
    messages: Vec<PersistedMessage>,
    selected_model: PersistedModel,
    #[serde(default)]
    loading: bool,
    #[serde(default)]
    theme: PersistedTheme,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedMessage {
    id: u64,
    role: PersistedRole,
    content: String,
    timestamp: i64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PersistedRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedModel {
    id: String,
    name: String,
    description: String,
    context_length: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
enum PersistedTheme {
    #[default]
    Light,
    Dark,
}

/// Durable home of the conversation: one JSON blob, rewritten after every transition.
#[derive(Debug, Clone)]
pub struct StateStore {
    file: StateFile,
}

impl StateStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            file: StateFile::new(state_dir.join(STATE_FILENAME)),
        }
    }

    /// Absent or malformed state yields `None`, meaning a fresh conversation.
    pub fn load(&self) -> Option<ConversationSnapshot> {
        let path = self.file.path();
        let content = match self.file.read() {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(err) => {
                chat_warn!("Failed to read persisted state from {:?}: {}", path, err);
                return None;
            }
        };

        match from_json(&content) {
            Ok(snapshot) => {
                chat_info!(
                    "Loaded {} persisted messages from {:?}",
                    snapshot.messages.len(),
                    path
                );
                Some(snapshot)
            }
            Err(err) => {
                chat_warn!("Failed to parse persisted state from {:?}: {}", path, err);
                None
            }
        }
    }

    /// Failures are logged; a lost write must not interrupt the conversation.
    ///
    /// Snapshots taken mid-stream are replaced on the next chunk and skip the fsync.
    pub fn save(&self, snapshot: &ConversationSnapshot) {
        let content = match to_json(snapshot) {
            Ok(text) => text,
            Err(err) => {
                chat_error!("Failed to serialize persisted state: {}", err);
                return;
            }
        };

        let written = if snapshot.loading {
            self.file.write_unsynced(&content)
        } else {
            self.file.write(&content)
        };
        if let Err(err) = written {
            chat_error!(
                "Failed to write persisted state to {:?}: {}",
                self.file.path(),
                err
            );
        }
    }
}

pub(crate) fn to_json(snapshot: &ConversationSnapshot) -> serde_json::Result<String> {
    let state = PersistedState {
        messages: snapshot.messages.iter().map(PersistedMessage::from).collect(),
        selected_model: PersistedModel::from(&snapshot.selected_model),
        loading: snapshot.loading,
        theme: match snapshot.theme {
            Theme::Light => PersistedTheme::Light,
            Theme::Dark => PersistedTheme::Dark,
        },
    };
    serde_json::to_string(&state)
}

pub(crate) fn from_json(text: &str) -> serde_json::Result<ConversationSnapshot> {
    let state: PersistedState = serde_json::from_str(text)?;
    Ok(ConversationSnapshot {
        messages: state.messages.into_iter().map(Message::from).collect(),
        selected_model: Model {
            id: state.selected_model.id,
            name: state.selected_model.name,
            description: state.selected_model.description,
            context_length: state.selected_model.context_length,
        },
        loading: state.loading,
        theme: match state.theme {
            PersistedTheme::Light => Theme::Light,
            PersistedTheme::Dark => Theme::Dark,
        },
    })
}

impl From<&Message> for PersistedMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            role: match message.role {
                Role::User => PersistedRole::User,
                Role::Assistant => PersistedRole::Assistant,
            },
            content: message.content.clone(),
            timestamp: message.timestamp_ms,
            pending: message.pending,
            error: message.error.clone(),
        }
    }
}

impl From<PersistedMessage> for Message {
    fn from(message: PersistedMessage) -> Self {
        Self {
            id: message.id,
            role: match message.role {
                PersistedRole::User => Role::User,
                PersistedRole::Assistant => Role::Assistant,
            },
            content: message.content,
            timestamp_ms: message.timestamp,
            pending: message.pending,
            error: message.error,
        }
    }
}

impl From<&Model> for PersistedModel {
    fn from(model: &Model) -> Self {
        Self {
            id: model.id.clone(),
            name: model.name.clone(),
            description: model.description.clone(),
            context_length: model.context_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chat_core::{default_model, find_model, ConversationSnapshot, Message, Role, Theme};
    use tempfile::TempDir;

    use super::{from_json, to_json, StateStore, STATE_FILENAME};

    fn sample() -> ConversationSnapshot {
        ConversationSnapshot {
            messages: vec![
                Message {
                    id: 1,
                    role: Role::User,
                    content: "What is Rust?".to_string(),
                    timestamp_ms: 1_700_000_000_000,
                    pending: false,
                    error: None,
                },
                Message {
                    id: 2,
                    role: Role::Assistant,
                    content: "A systems language.\n```rust\nfn main() {}\n```".to_string(),
                    timestamp_ms: 1_700_000_000_000,
                    pending: false,
                    error: None,
                },
                Message {
                    id: 3,
                    role: Role::Assistant,
                    content: String::new(),
                    timestamp_ms: 1_700_000_000_500,
                    pending: false,
                    error: Some("Failed to generate response (HTTP 500)".to_string()),
                },
            ],
            selected_model: find_model("mistral").expect("catalog model"),
            loading: false,
            theme: Theme::Dark,
        }
    }

    #[test]
    fn json_round_trip_preserves_snapshot() {
        let snapshot = sample();
        let text = to_json(&snapshot).unwrap();
        assert_eq!(from_json(&text).unwrap(), snapshot);
    }

    #[test]
    fn json_layout_uses_camel_case_keys() {
        let text = to_json(&sample()).unwrap();
        assert!(!text.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["selectedModel"]["contextLength"], 8192);
        assert_eq!(value["theme"], "dark");
        assert_eq!(value["loading"], false);
        assert_eq!(value["messages"][0]["role"], "user");
        assert!(value["messages"][0].get("error").is_none());
        assert_eq!(
            value["messages"][2]["error"],
            "Failed to generate response (HTTP 500)"
        );
    }

    #[test]
    fn store_round_trips_through_disk() {
        let temp = TempDir::new().unwrap();
        let store = StateStore::new(temp.path());
        assert!(store.load().is_none());

        let mut snapshot = sample();
        snapshot.loading = true;
        snapshot.messages[2].pending = true;
        store.save(&snapshot);

        assert_eq!(store.load(), Some(snapshot));
    }

    #[test]
    fn malformed_state_loads_as_none() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(STATE_FILENAME), "{ not json").unwrap();
        assert!(StateStore::new(temp.path()).load().is_none());

        fs::write(
            temp.path().join(STATE_FILENAME),
            r#"{"messages":[],"selectedModel":{"id":"x"}}"#,
        )
        .unwrap();
        assert!(StateStore::new(temp.path()).load().is_none());
    }

    #[test]
    fn missing_theme_and_loading_default() {
        let model = default_model();
        let text = format!(
            r#"{{"messages":[],"selectedModel":{{"id":"{}","name":"{}","description":"{}","contextLength":{}}}}}"#,
            model.id, model.name, model.description, model.context_length
        );
        let snapshot = from_json(&text).unwrap();
        assert_eq!(snapshot.theme, Theme::Light);
        assert!(!snapshot.loading);
        assert_eq!(snapshot.selected_model, model);
    }
}
