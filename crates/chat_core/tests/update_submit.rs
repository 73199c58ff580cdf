use std::sync::Once;

use chat_core::{default_model, find_model, update, ConversationState, Effect, Msg, Role, Theme};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(chat_logging::initialize_for_tests);
}

fn submit(state: ConversationState, text: &str) -> (ConversationState, Vec<Effect>) {
    update(
        state,
        Msg::Submit {
            text: text.to_string(),
            timestamp_ms: 1_700_000_000_000,
        },
    )
}

#[test]
fn submit_appends_user_and_placeholder() {
    init_logging();
    let (mut state, effects) = submit(ConversationState::new(), "Why is the sky blue?");

    assert!(state.is_loading());
    assert!(state.consume_dirty());
    let messages = state.messages();
    assert_eq!(messages.len(), 2);

    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "Why is the sky blue?");
    assert!(!messages[0].pending);

    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "");
    assert!(messages[1].pending);
    assert!(messages[1].error.is_none());
    assert_ne!(messages[0].id, messages[1].id);

    assert_eq!(
        effects,
        vec![Effect::StartStream {
            request_id: 1,
            prompt: "Why is the sky blue?".to_string(),
            model_id: default_model().id,
        }]
    );
}

#[test]
fn blank_prompts_are_rejected() {
    init_logging();
    for text in ["", "   ", "\n\t "] {
        let state = ConversationState::new();
        let (mut next, effects) = submit(state.clone(), text);

        assert_eq!(next, state);
        assert!(effects.is_empty());
        assert!(!next.consume_dirty());
    }
}

#[test]
fn submit_while_loading_leaves_state_unchanged() {
    init_logging();
    let (state, _) = submit(ConversationState::new(), "first");
    let before = state.clone();

    let (next, effects) = submit(state, "second");

    assert_eq!(next, before);
    assert!(effects.is_empty());
    assert_eq!(next.messages().len(), 2);
}

#[test]
fn selected_model_is_captured_at_submit() {
    init_logging();
    let mistral = find_model("mistral").expect("catalog model");
    let (state, _) = update(ConversationState::new(), Msg::SelectModel(mistral.clone()));
    let (state, effects) = submit(state, "hello");

    assert_eq!(
        effects,
        vec![Effect::StartStream {
            request_id: 1,
            prompt: "hello".to_string(),
            model_id: "mistral".to_string(),
        }]
    );

    // Switching mid-stream does not touch the in-flight request.
    let (state, effects) = update(state, Msg::SelectModel(default_model()));
    assert!(effects.is_empty());
    assert_eq!(state.selected_model(), &default_model());
    assert_eq!(state.in_flight_request(), Some(1));
    assert!(state.is_loading());
}

#[test]
fn request_ids_increase_per_submission() {
    init_logging();
    let (state, _) = submit(ConversationState::new(), "one");
    let (state, _) = update(
        state,
        Msg::StreamChunk {
            request_id: 1,
            content: "ok".to_string(),
            done: true,
        },
    );
    let (state, effects) = submit(state, "two");

    assert_eq!(state.messages().len(), 4);
    assert!(matches!(
        effects.as_slice(),
        [Effect::StartStream { request_id: 2, .. }]
    ));
}

#[test]
fn clear_empties_log_regardless_of_content() {
    init_logging();
    let (state, _) = submit(ConversationState::new(), "one");
    let (state, _) = update(
        state,
        Msg::StreamChunk {
            request_id: 1,
            content: "answer".to_string(),
            done: true,
        },
    );
    let (mut state, effects) = update(state, Msg::ClearHistory);

    assert!(state.messages().is_empty());
    assert!(effects.is_empty());
    assert!(state.consume_dirty());

    let (mut state, effects) = update(state, Msg::ClearHistory);
    assert!(state.messages().is_empty());
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
}

#[test]
fn clear_while_streaming_detaches_request() {
    init_logging();
    let (state, _) = submit(ConversationState::new(), "long question");
    let (state, effects) = update(state, Msg::ClearHistory);

    assert_eq!(effects, vec![Effect::CancelStream { request_id: 1 }]);
    assert!(state.messages().is_empty());
    assert!(!state.is_loading());
    assert_eq!(state.in_flight_request(), None);

    // Late chunks from the detached request are dropped.
    let (state, _) = update(
        state,
        Msg::StreamChunk {
            request_id: 1,
            content: "late".to_string(),
            done: false,
        },
    );
    assert!(state.messages().is_empty());
    assert!(!state.is_loading());
}

#[test]
fn toggle_theme_flips_and_marks_dirty() {
    init_logging();
    let (mut state, _) = update(ConversationState::new(), Msg::ToggleTheme);
    assert_eq!(state.theme(), Theme::Dark);
    assert!(state.consume_dirty());

    let (state, _) = update(state, Msg::ToggleTheme);
    assert_eq!(state.theme(), Theme::Light);
}
