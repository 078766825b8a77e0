//! Query controller: explicit per-session state, a reducer over session
//! events, and an async driver that runs retrieval commands on tokio.
//!
//! Submissions are serialized: `Submit` while a search is pending is ignored.
//! Every submission is also tagged with a fresh `RequestId`, and completions
//! that do not match the in-flight id are discarded.

use std::{mem, sync::Arc};

use shared::{
    domain::{RequestId, SessionId, SortMode},
    protocol::SearchResponse,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{
    error::RetrievalError,
    view::{render_session, ViewModel},
    SearchBackend,
};

#[derive(Debug, Clone)]
pub enum SessionEvent {
    InputChanged(String),
    Submit,
    ToggleSortMode,
    RetrievalSucceeded {
        request_id: RequestId,
        response: SearchResponse,
    },
    RetrievalFailed {
        request_id: RequestId,
        error: RetrievalError,
    },
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCommand {
    Fetch { request_id: RequestId, query: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Succeeded {
        request_id: RequestId,
        result_count: Option<i64>,
    },
    Failed {
        request_id: RequestId,
        error: RetrievalError,
    },
}

impl SubmissionOutcome {
    pub fn request_id(&self) -> RequestId {
        match self {
            SubmissionOutcome::Succeeded { request_id, .. }
            | SubmissionOutcome::Failed { request_id, .. } => *request_id,
        }
    }

    pub fn error(&self) -> Option<&RetrievalError> {
        match self {
            SubmissionOutcome::Failed { error, .. } => Some(error),
            SubmissionOutcome::Succeeded { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    input_text: String,
    submitted_query: Option<String>,
    in_flight: Option<RequestId>,
    response: Option<Arc<SearchResponse>>,
    sort_mode: SortMode,
    last_outcome: Option<SubmissionOutcome>,
    issued_requests: u64,
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub state: SessionState,
    pub command: Option<SearchCommand>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reduce(mut self, event: SessionEvent) -> Transition {
        let command = match event {
            SessionEvent::InputChanged(text) => {
                self.input_text = text;
                None
            }
            SessionEvent::Submit => self.begin_submission(),
            SessionEvent::ToggleSortMode => {
                self.sort_mode = self.sort_mode.next();
                None
            }
            SessionEvent::RetrievalSucceeded {
                request_id,
                response,
            } => {
                self.complete(request_id, Ok(response));
                None
            }
            SessionEvent::RetrievalFailed { request_id, error } => {
                self.complete(request_id, Err(error));
                None
            }
        };
        Transition {
            state: self,
            command,
        }
    }

    /// In-place form of [`SessionState::reduce`].
    pub fn apply(&mut self, event: SessionEvent) -> Option<SearchCommand> {
        let transition = mem::take(self).reduce(event);
        *self = transition.state;
        transition.command
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn submitted_query(&self) -> Option<&str> {
        self.submitted_query.as_deref()
    }

    pub fn pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        self.in_flight
    }

    pub fn response(&self) -> Option<&Arc<SearchResponse>> {
        self.response.as_ref()
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn last_outcome(&self) -> Option<&SubmissionOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn last_error(&self) -> Option<&RetrievalError> {
        self.last_outcome.as_ref().and_then(SubmissionOutcome::error)
    }

    pub fn view(&self) -> ViewModel<'_> {
        render_session(self.response.as_deref(), self.sort_mode)
    }

    fn begin_submission(&mut self) -> Option<SearchCommand> {
        if let Some(request_id) = self.in_flight {
            debug!(%request_id, "submit ignored while a search is pending");
            return None;
        }
        if self.input_text.is_empty() {
            debug!("submit ignored for empty input");
            return None;
        }

        self.issued_requests += 1;
        let request_id = RequestId(self.issued_requests);
        let query = self.input_text.clone();
        info!(%request_id, %query, "search submitted");

        self.submitted_query = Some(query.clone());
        self.in_flight = Some(request_id);
        Some(SearchCommand::Fetch { request_id, query })
    }

    fn complete(&mut self, request_id: RequestId, result: Result<SearchResponse, RetrievalError>) {
        if self.in_flight != Some(request_id) {
            debug!(%request_id, in_flight = ?self.in_flight, "discarding stale search completion");
            return;
        }
        self.in_flight = None;

        match result {
            Ok(response) => {
                info!(
                    %request_id,
                    result_count = ?response.result_count,
                    stores = response.content.len(),
                    items = response.item_count(),
                    "search results received"
                );
                self.last_outcome = Some(SubmissionOutcome::Succeeded {
                    request_id,
                    result_count: response.result_count,
                });
                self.response = Some(Arc::new(response));
            }
            Err(error) => {
                warn!(%request_id, %error, "search failed; keeping previous results");
                self.last_outcome = Some(SubmissionOutcome::Failed { request_id, error });
            }
        }
    }
}

/// One user's search session. Sessions share nothing with each other.
///
/// `submit` spawns the retrieval on the current tokio runtime; call
/// `next_completion` to ingest its result.
pub struct SearchSession<B> {
    id: SessionId,
    state: SessionState,
    backend: Arc<B>,
    completion_tx: mpsc::UnboundedSender<SessionEvent>,
    completion_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl<B: SearchBackend + 'static> SearchSession<B> {
    pub fn new(backend: Arc<B>) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            id: SessionId::generate(),
            state: SessionState::new(),
            backend,
            completion_tx,
            completion_rx,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn view(&self) -> ViewModel<'_> {
        self.state.view()
    }

    pub fn update_input(&mut self, text: impl Into<String>) {
        self.dispatch(SessionEvent::InputChanged(text.into()));
    }

    /// Returns the id of the spawned retrieval, or `None` if the submit was ignored.
    pub fn submit(&mut self) -> Option<RequestId> {
        self.dispatch(SessionEvent::Submit)
    }

    pub fn toggle_sort_mode(&mut self) -> SortMode {
        self.dispatch(SessionEvent::ToggleSortMode);
        self.state.sort_mode()
    }

    pub fn dispatch(&mut self, event: SessionEvent) -> Option<RequestId> {
        let command = self.state.apply(event)?;
        Some(self.execute(command))
    }

    /// Waits for the pending retrieval and ingests it. Returns `None` when
    /// nothing is pending.
    pub async fn next_completion(&mut self) -> Option<&SubmissionOutcome> {
        let in_flight = self.state.in_flight()?;
        loop {
            let event = self.completion_rx.recv().await?;
            self.state.apply(event);
            if !self.state.pending() {
                break;
            }
        }
        self.state
            .last_outcome()
            .filter(|outcome| outcome.request_id() == in_flight)
    }

    /// Replaces the input, submits it and waits for the outcome.
    pub async fn search(&mut self, text: impl Into<String>) -> Option<&SubmissionOutcome> {
        self.update_input(text);
        self.submit()?;
        self.next_completion().await
    }

    fn execute(&self, command: SearchCommand) -> RequestId {
        match command {
            SearchCommand::Fetch { request_id, query } => {
                let backend = Arc::clone(&self.backend);
                let completion_tx = self.completion_tx.clone();
                let span = info_span!("search", session_id = %self.id, %request_id);
                // The fetch runs in its own task so a panicking backend still
                // yields a completion and clears `pending`.
                let fetch = tokio::spawn(async move { backend.search(&query).await });
                tokio::spawn(
                    async move {
                        let event = match fetch.await {
                            Ok(Ok(response)) => SessionEvent::RetrievalSucceeded {
                                request_id,
                                response,
                            },
                            Ok(Err(error)) => SessionEvent::RetrievalFailed { request_id, error },
                            Err(join_error) => {
                                error!(%join_error, "search task aborted");
                                SessionEvent::RetrievalFailed {
                                    request_id,
                                    error: RetrievalError::Transport(format!(
                                        "search task aborted: {join_error}"
                                    )),
                                }
                            }
                        };
                        if completion_tx.send(event).is_err() {
                            debug!("session dropped before search completed");
                        }
                    }
                    .instrument(span),
                );
                request_id
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
