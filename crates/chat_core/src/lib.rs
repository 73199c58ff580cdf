//! Chat core: pure conversation state machine and view-model helpers.
mod effect;
mod model;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use model::{default_model, find_model, model_catalog, Model};
pub use msg::Msg;
pub use state::{
    ConversationSnapshot, ConversationState, Message, MessageId, RequestId, Role, Theme,
    FALLBACK_ERROR_MESSAGE, INTERRUPTED_ERROR_MESSAGE,
};
pub use update::update;
pub use view_model::{ConversationViewModel, MessageStatus, MessageView};
