use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use chat_core::{
    update, ConversationState, ConversationViewModel, Effect, Model, Msg, RequestId,
};
use chat_engine::{Generator, StreamError};
use chat_logging::{chat_debug, chat_info, chat_warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::persistence::StateStore;

/// Receives one view model per state transition, in transition order.
pub trait View {
    fn render(&mut self, view: &ConversationViewModel);
}

/// Shared slot holding the cancellation token of the in-flight request.
///
/// Other tasks only queue cancel requests; the session turns them into
/// `Msg::CancelRequested` and fires the token from the resulting effect.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    active: Arc<Mutex<Option<(RequestId, CancellationToken)>>>,
    requests: mpsc::UnboundedSender<RequestId>,
}

impl CancelHandle {
    fn new(requests: mpsc::UnboundedSender<RequestId>) -> Self {
        Self {
            active: Arc::default(),
            requests,
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<(RequestId, CancellationToken)>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn arm(&self, request_id: RequestId) -> CancellationToken {
        let token = CancellationToken::new();
        *self.slot() = Some((request_id, token.clone()));
        token
    }

    fn disarm(&self, request_id: RequestId) {
        let mut slot = self.slot();
        if matches!(slot.as_ref(), Some((id, _)) if *id == request_id) {
            *slot = None;
        }
    }

    fn cancel(&self, request_id: RequestId) -> bool {
        match self.slot().as_ref() {
            Some((id, token)) if *id == request_id => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Asks the session to stop whatever is streaming. Returns false when nothing is.
    pub fn request_cancel(&self) -> bool {
        let active = self.slot().as_ref().map(|(id, _)| *id);
        let Some(request_id) = active else {
            return false;
        };
        chat_info!("cancel requested for request {}", request_id);
        self.requests.send(request_id).is_ok()
    }
}

/// Sole owner and writer of the conversation state.
///
/// Every operation runs `update`, then renders and persists the new snapshot
/// when it changed. Streams are consumed one chunk at a time, each chunk
/// fully applied before the next read.
pub struct ChatSession<V: View> {
    state: ConversationState,
    generator: Arc<dyn Generator>,
    store: StateStore,
    view: V,
    cancel: CancelHandle,
    cancel_requests: mpsc::UnboundedReceiver<RequestId>,
}

impl<V: View> ChatSession<V> {
    /// Builds the session and restores the persisted conversation, if any.
    pub fn new(generator: Arc<dyn Generator>, store: StateStore, view: V) -> Self {
        let (requests, cancel_requests) = mpsc::unbounded_channel();
        let mut session = Self {
            state: ConversationState::new(),
            generator,
            store,
            view,
            cancel: CancelHandle::new(requests),
            cancel_requests,
        };
        match session.store.load() {
            Some(snapshot) => {
                session.dispatch(Msg::Restore(snapshot));
            }
            None => {
                let view = session.state.view();
                session.view.render(&view);
            }
        }
        session
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn dispatch(&mut self, msg: Msg) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.view.render(&state.view());
            self.store.save(&state.snapshot());
        }
        self.state = state;
        effects
    }

    /// Sends a prompt and streams the reply to completion, failure or
    /// cancellation. Never fails: errors end up on the assistant message.
    pub async fn submit(&mut self, text: &str) {
        let effects = self.dispatch(Msg::Submit {
            text: text.to_string(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        });
        self.run_effects(effects).await;
    }

    pub fn select_model(&mut self, model: Model) {
        chat_info!("selecting model {}", model.id);
        self.dispatch(Msg::SelectModel(model));
    }

    pub async fn clear(&mut self) {
        let effects = self.dispatch(Msg::ClearHistory);
        self.run_effects(effects).await;
    }

    pub fn toggle_theme(&mut self) {
        self.dispatch(Msg::ToggleTheme);
    }

    /// Stops the in-flight request; the stream then reports the cancellation.
    pub fn cancel(&mut self) {
        for effect in self.dispatch(Msg::CancelRequested) {
            if let Effect::CancelStream { request_id } = effect {
                self.cancel_stream(request_id);
            }
        }
    }

    async fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartStream {
                    request_id,
                    prompt,
                    model_id,
                } => self.stream_reply(request_id, &prompt, &model_id).await,
                Effect::CancelStream { request_id } => self.cancel_stream(request_id),
            }
        }
    }

    fn cancel_stream(&self, request_id: RequestId) {
        if !self.cancel.cancel(request_id) {
            chat_debug!("request {} already finished", request_id);
        }
    }

    /// Awaits `work` while serving cancel requests aimed at `request_id`.
    async fn serve_cancels<F: Future>(&mut self, request_id: RequestId, work: F) -> F::Output {
        tokio::pin!(work);
        loop {
            let requested = tokio::select! {
                biased;
                output = &mut work => return output,
                Some(id) = self.cancel_requests.recv() => id,
            };
            if requested == request_id {
                self.cancel();
            } else {
                chat_debug!("ignoring cancel request for finished request {}", requested);
            }
        }
    }

    async fn stream_reply(&mut self, request_id: RequestId, prompt: &str, model_id: &str) {
        let token = self.cancel.arm(request_id);
        let generator = Arc::clone(&self.generator);

        let started = self
            .serve_cancels(request_id, generator.start(prompt, model_id, token))
            .await;
        let outcome: Result<usize, StreamError> = match started {
            Ok(mut chunks) => {
                let mut received = 0;
                let outcome = loop {
                    match self.serve_cancels(request_id, chunks.next()).await {
                        Some(Ok(chunk)) => {
                            received += 1;
                            self.dispatch(Msg::StreamChunk {
                                request_id,
                                content: chunk.content,
                                done: chunk.done,
                            });
                        }
                        Some(Err(err)) => break Err(err),
                        None => break Ok(received),
                    }
                };
                let skipped = chunks.parse_failures();
                if skipped > 0 {
                    chat_warn!(
                        "request {} skipped {} unparsable stream lines",
                        request_id,
                        skipped
                    );
                }
                outcome
            }
            Err(err) => Err(err),
        };
        self.cancel.disarm(request_id);

        let msg = match outcome {
            Ok(received) => {
                chat_info!("request {} finished after {} chunks", request_id, received);
                Msg::StreamFinished { request_id }
            }
            Err(err) => {
                chat_warn!("request {} failed: {}", request_id, err);
                Msg::StreamFailed {
                    request_id,
                    message: err.to_string(),
                }
            }
        };
        self.dispatch(msg);
    }
}
