use crate::{MessageId, Role, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    Pending,
    Complete,
    /// Rendered distinctly instead of as assistant content.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversationViewModel {
    pub messages: Vec<MessageView>,
    pub model_name: String,
    pub loading: bool,
    pub theme: Theme,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp_ms: i64,
    pub status: MessageStatus,
    pub error: Option<String>,
}
