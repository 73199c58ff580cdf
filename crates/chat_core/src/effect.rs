use crate::RequestId;

/// IO requested by `update`; executed by the driver that owns the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open a generation stream and feed its chunks back as `Msg::StreamChunk`.
    StartStream {
        request_id: RequestId,
        prompt: String,
        model_id: String,
    },
    /// Stop consuming the stream for `request_id`.
    CancelStream { request_id: RequestId },
}
