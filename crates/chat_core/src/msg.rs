use crate::{ConversationSnapshot, Model, RequestId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User sent a prompt.
    Submit { text: String, timestamp_ms: i64 },
    /// Decoder yielded a chunk for a request.
    StreamChunk {
        request_id: RequestId,
        content: String,
        done: bool,
    },
    /// Transport ended normally.
    StreamFinished { request_id: RequestId },
    /// Decoder or transport failed; `message` is user-facing.
    StreamFailed {
        request_id: RequestId,
        message: String,
    },
    /// User picked another model.
    SelectModel(Model),
    /// User cleared the conversation log.
    ClearHistory,
    /// User flipped light/dark.
    ToggleTheme,
    /// User asked to stop the in-flight response.
    CancelRequested,
    /// Replace the state with a previously persisted snapshot.
    Restore(ConversationSnapshot),
}
