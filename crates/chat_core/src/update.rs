use crate::{ConversationState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
///
/// Rejected messages hand the state back untouched, so the returned value
/// compares equal to the input.
pub fn update(mut state: ConversationState, msg: Msg) -> (ConversationState, Vec<Effect>) {
    let effects = match msg {
        Msg::Submit { text, timestamp_ms } => {
            // Single in-flight request: the loading guard is the only lock.
            if state.is_loading() || text.trim().is_empty() {
                return (state, Vec::new());
            }
            let model_id = state.selected_model().id.clone();
            let request_id = state.begin_turn(text.clone(), timestamp_ms);
            vec![Effect::StartStream {
                request_id,
                prompt: text,
                model_id,
            }]
        }
        Msg::StreamChunk {
            request_id,
            content,
            done,
        } => {
            state.apply_chunk(request_id, &content, done);
            Vec::new()
        }
        Msg::StreamFinished { request_id } => {
            state.finish_stream(request_id);
            Vec::new()
        }
        Msg::StreamFailed {
            request_id,
            message,
        } => {
            state.fail_stream(request_id, &message);
            Vec::new()
        }
        Msg::SelectModel(model) => {
            state.select_model(model);
            Vec::new()
        }
        Msg::ClearHistory => match state.clear_messages() {
            Some(request_id) => vec![Effect::CancelStream { request_id }],
            None => Vec::new(),
        },
        Msg::ToggleTheme => {
            state.toggle_theme();
            Vec::new()
        }
        Msg::CancelRequested => match state.in_flight_request() {
            Some(request_id) => vec![Effect::CancelStream { request_id }],
            None => Vec::new(),
        },
        Msg::Restore(snapshot) => {
            state.restore(snapshot);
            Vec::new()
        }
    };

    (state, effects)
}
