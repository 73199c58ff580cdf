use chat_logging::{chat_debug, chat_warn};

use crate::view_model::{ConversationViewModel, MessageStatus, MessageView};
use crate::{default_model, Model};

pub type MessageId = u64;
pub type RequestId = u64;

/// Shown when a failure carries no usable message.
pub const FALLBACK_ERROR_MESSAGE: &str = "An unexpected error occurred";
/// Attached to a message that was still streaming when the state was persisted.
pub const INTERRUPTED_ERROR_MESSAGE: &str = "Response was interrupted before it completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp_ms: i64,
    pub pending: bool,
    pub error: Option<String>,
}

/// Persisted shape of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSnapshot {
    pub messages: Vec<Message>,
    pub selected_model: Model,
    pub loading: bool,
    pub theme: Theme,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InFlight {
    request_id: RequestId,
    message_id: MessageId,
    accumulated: String,
}

/// Conversation log plus the bookkeeping for the single in-flight request.
///
/// `loading` is true exactly when `in_flight` is set, and `in_flight` always
/// points at the one message with `pending == true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    messages: Vec<Message>,
    selected_model: Model,
    loading: bool,
    theme: Theme,
    in_flight: Option<InFlight>,
    next_message_id: MessageId,
    next_request_id: RequestId,
    dirty: bool,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            selected_model: default_model(),
            loading: false,
            theme: Theme::default(),
            in_flight: None,
            next_message_id: 1,
            next_request_id: 1,
            dirty: false,
        }
    }
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn selected_model(&self) -> &Model {
        &self.selected_model
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Request currently allowed to write into the log, if any.
    pub fn in_flight_request(&self) -> Option<RequestId> {
        self.in_flight.as_ref().map(|flight| flight.request_id)
    }

    pub fn pending_message(&self) -> Option<&Message> {
        self.messages.iter().find(|message| message.pending)
    }

    /// Returns whether the state changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            messages: self.messages.clone(),
            selected_model: self.selected_model.clone(),
            loading: self.loading,
            theme: self.theme,
        }
    }

    pub fn view(&self) -> ConversationViewModel {
        ConversationViewModel {
            messages: self.messages.iter().map(message_view).collect(),
            model_name: self.selected_model.name.clone(),
            loading: self.loading,
            theme: self.theme,
        }
    }

    /// Appends the user message and the assistant placeholder.
    pub(crate) fn begin_turn(&mut self, prompt: String, timestamp_ms: i64) -> RequestId {
        let user_id = self.allocate_message_id();
        self.messages.push(Message {
            id: user_id,
            role: Role::User,
            content: prompt,
            timestamp_ms,
            pending: false,
            error: None,
        });

        let assistant_id = self.allocate_message_id();
        self.messages.push(Message {
            id: assistant_id,
            role: Role::Assistant,
            content: String::new(),
            timestamp_ms,
            pending: true,
            error: None,
        });

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.in_flight = Some(InFlight {
            request_id,
            message_id: assistant_id,
            accumulated: String::new(),
        });
        self.loading = true;
        self.dirty = true;
        request_id
    }

    pub(crate) fn apply_chunk(&mut self, request_id: RequestId, delta: &str, done: bool) {
        let Some(flight) = self.current_flight(request_id) else {
            return;
        };
        flight.accumulated.push_str(delta);
        let content = flight.accumulated.clone();
        let message_id = flight.message_id;

        if let Some(message) = self.message_mut(message_id) {
            message.content = content;
            message.pending = !done;
        }
        if done {
            self.in_flight = None;
            self.loading = false;
        }
        self.dirty = true;
    }

    pub(crate) fn finish_stream(&mut self, request_id: RequestId) {
        let Some(flight) = self.current_flight(request_id) else {
            return;
        };
        let message_id = flight.message_id;
        chat_debug!(
            "request {} ended without a done chunk; finalizing message {}",
            request_id,
            message_id
        );
        if let Some(message) = self.message_mut(message_id) {
            message.pending = false;
        }
        self.in_flight = None;
        self.loading = false;
        self.dirty = true;
    }

    pub(crate) fn fail_stream(&mut self, request_id: RequestId, error_text: &str) {
        let Some(flight) = self.current_flight(request_id) else {
            return;
        };
        let message_id = flight.message_id;
        let error_text = if error_text.trim().is_empty() {
            FALLBACK_ERROR_MESSAGE
        } else {
            error_text
        };
        if let Some(message) = self.message_mut(message_id) {
            message.error = Some(error_text.to_string());
            message.pending = false;
        }
        self.in_flight = None;
        self.loading = false;
        self.dirty = true;
    }

    /// Empties the log and detaches any in-flight request, returning its id.
    pub(crate) fn clear_messages(&mut self) -> Option<RequestId> {
        let detached = self.in_flight.take().map(|flight| flight.request_id);
        if self.messages.is_empty() && detached.is_none() {
            return None;
        }
        self.messages.clear();
        self.loading = false;
        self.dirty = true;
        detached
    }

    pub(crate) fn select_model(&mut self, model: Model) {
        if self.selected_model != model {
            self.selected_model = model;
            self.dirty = true;
        }
    }

    pub(crate) fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.dirty = true;
    }

    /// Replaces the log with a persisted snapshot.
    ///
    /// Nothing is streaming after a restart, so a message persisted as pending
    /// is finalized with an interruption error and `loading` is cleared.
    pub(crate) fn restore(&mut self, snapshot: ConversationSnapshot) {
        let ConversationSnapshot {
            mut messages,
            selected_model,
            loading: _,
            theme,
        } = snapshot;

        for message in messages.iter_mut().filter(|message| message.pending) {
            message.pending = false;
            if message.error.is_none() {
                message.error = Some(INTERRUPTED_ERROR_MESSAGE.to_string());
            }
        }

        let highest = messages.iter().map(|message| message.id).max().unwrap_or(0);
        self.messages = messages;
        // An exhausted counter is compacted on the next allocation.
        self.next_message_id = highest.saturating_add(1);
        self.selected_model = selected_model;
        self.theme = theme;
        self.loading = false;
        self.in_flight = None;
        self.dirty = true;
    }

    fn current_flight(&mut self, request_id: RequestId) -> Option<&mut InFlight> {
        match self.in_flight.as_mut() {
            Some(flight) if flight.request_id == request_id => Some(flight),
            _ => {
                chat_debug!("ignoring stream event for stale request {}", request_id);
                None
            }
        }
    }

    fn message_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|message| message.id == id)
    }

    fn allocate_message_id(&mut self) -> MessageId {
        if self.next_message_id == MessageId::MAX {
            self.compact_message_ids();
        }
        let id = self.next_message_id;
        self.next_message_id += 1;
        id
    }

    /// Renumbers the log from 1 in order, keeping the in-flight record attached.
    fn compact_message_ids(&mut self) {
        chat_warn!(
            "message ids exhausted; renumbering {} messages",
            self.messages.len()
        );
        for (index, message) in self.messages.iter_mut().enumerate() {
            let id = index as MessageId + 1;
            if let Some(flight) = self.in_flight.as_mut() {
                if flight.message_id == message.id {
                    flight.message_id = id;
                }
            }
            message.id = id;
        }
        self.next_message_id = self.messages.len() as MessageId + 1;
    }
}

fn message_view(message: &Message) -> MessageView {
    let status = if message.error.is_some() {
        MessageStatus::Failed
    } else if message.pending {
        MessageStatus::Pending
    } else {
        MessageStatus::Complete
    };
    MessageView {
        id: message.id,
        role: message.role,
        content: message.content.clone(),
        timestamp_ms: message.timestamp_ms,
        status,
        error: message.error.clone(),
    }
}
