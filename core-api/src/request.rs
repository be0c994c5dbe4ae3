//! # Request Pipeline
//!
//! Building, executing and cancelling a single API call.
//!
//! ## Lifecycle
//!
//! A [`Request`] is assembled by value: every builder method consumes it and
//! returns it. [`Request::execute`] consumes the builder, so handlers cannot
//! be attached late and a request cannot be executed twice.
//!
//! Execution marks network activity, acquires the requested UI side effects,
//! sends the call through the session's transport and classifies the result
//! once. Finalization then runs in this order:
//!
//! 1. failure handlers and the alert handler, or completion handlers
//! 2. network activity released
//! 3. finish handlers
//! 4. overlay dismissed and interaction re-enabled
//!
//! ## Cancellation
//!
//! [`RequestHandle::cancel`] aborts the transport and releases every UI side
//! effect immediately. A cancelled request runs none of its handlers. The
//! pipeline claims the right to dispatch with a single state transition, so
//! a cancel that arrives after the transport settled but before dispatch
//! still suppresses the handlers.

use crate::classify::classify;
use crate::encoding::ParameterEncoding;
use crate::endpoint::Endpoint;
use crate::error::{transport_code, ApiError};
use crate::handlers::Handlers;
use crate::session::Session;
use bridge_traits::http::{HttpMethod, HttpRequest};
use bridge_traits::ui::{Alert, AlertAction};
use core_runtime::logging::redact_headers;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

pub const ALERT_TITLE: &str = "Error";

/// Result of a request that reached its handlers.
pub type Outcome = Result<Value, ApiError>;

/// A pending API call.
#[must_use = "a request does nothing until `execute` or `run` is called"]
pub struct Request {
    id: Uuid,
    session: Session,
    endpoint: Option<Endpoint>,
    url: String,
    method: HttpMethod,
    params: Option<Map<String, Value>>,
    headers: HashMap<String, String>,
    encoding: ParameterEncoding,
    handlers: Handlers,
    show_overlay: bool,
    lock_interaction: bool,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (completion, failure, finish) = self.handlers.counts();
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &redact_headers(&self.headers))
            .field("encoding", &self.encoding)
            .field("completion_handlers", &completion)
            .field("failure_handlers", &failure)
            .field("finish_handlers", &finish)
            .field("show_alert", &self.handlers.has_alert())
            .field("show_overlay", &self.show_overlay)
            .field("lock_interaction", &self.lock_interaction)
            .finish()
    }
}

impl Request {
    /// A GET request against an arbitrary URL with no headers.
    pub fn new(session: &Session, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session: session.clone(),
            endpoint: None,
            url: url.into(),
            method: HttpMethod::default(),
            params: None,
            headers: HashMap::new(),
            encoding: ParameterEncoding::default(),
            handlers: Handlers::default(),
            show_overlay: false,
            lock_interaction: false,
        }
    }

    /// A GET request against `endpoint` on the session's base URL.
    pub fn to_endpoint(session: &Session, endpoint: Endpoint) -> Self {
        let mut request = Self::new(session, endpoint.url(session.base_url()));
        request.endpoint = Some(endpoint);
        request
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn endpoint(&self) -> Option<Endpoint> {
        self.endpoint
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.params = Some(params);
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn encoding(mut self, encoding: ParameterEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn add_completion_handler<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(&Value) + Send + 'static,
    {
        self.handlers.push_completion(Box::new(handler));
        self
    }

    pub fn add_failure_handler<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(&ApiError) + Send + 'static,
    {
        self.handlers.push_failure(Box::new(handler));
        self
    }

    pub fn add_finish_handler<F>(mut self, handler: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.handlers.push_finish(Box::new(handler));
        self
    }

    /// Presents an "Error" alert with the error description if the request
    /// fails. Runs after the failure handlers.
    ///
    /// Ignored with a warning when the session has no alert presenter.
    /// Only the first call on a request takes effect.
    pub fn show_alert_if_error(mut self, actions: Vec<AlertAction>) -> Self {
        let Some(presenter) = self.session.alert_presenter().cloned() else {
            warn!(request_id = %self.id, "No alert presenter configured, error alert disabled");
            return self;
        };

        let installed = self.handlers.set_alert(Box::new(move |err: &ApiError| {
            presenter.present(Alert {
                title: ALERT_TITLE.to_string(),
                message: err.description().to_string(),
                actions,
            });
        }));
        if !installed {
            debug!(request_id = %self.id, "Error alert already attached");
        }
        self
    }

    /// Disables user interaction while the request is in flight.
    pub fn disable_user_interaction(mut self) -> Self {
        self.lock_interaction = true;
        self
    }

    /// Shows the blocking progress overlay while the request is in flight.
    pub fn add_activity_indicator_view(mut self) -> Self {
        self.show_overlay = true;
        self
    }

    fn build_http_request(&self) -> Result<HttpRequest, ApiError> {
        let request = HttpRequest::new(self.method, self.url.clone())
            .headers(self.headers.clone())
            .timeout(self.session.request_timeout());
        self.encoding.encode(request, self.params.as_ref())
    }

    fn start(self) -> (Pipeline, Arc<Shared>) {
        let span = info_span!(
            "request",
            id = %self.id,
            method = %self.method,
            url = %self.url,
        );
        debug!(
            parent: &span,
            headers = ?redact_headers(&self.headers),
            encoding = ?self.encoding,
            overlay = self.show_overlay,
            lock_interaction = self.lock_interaction,
            "Starting request"
        );

        let shared = Arc::new(Shared {
            state: AtomicU8::new(PENDING),
            cancel: CancellationToken::new(),
            lease: ActivityLease::acquire(
                self.session.clone(),
                self.show_overlay,
                self.lock_interaction,
            ),
        });

        let pipeline = Pipeline {
            http_request: self.build_http_request(),
            session: self.session,
            handlers: self.handlers,
            shared: shared.clone(),
            span,
        };
        (pipeline, shared)
    }

    /// Starts the request on the current Tokio runtime.
    ///
    /// Errors are never returned here; they reach the failure handlers.
    /// Without a runtime the request fails immediately with
    /// [`transport_code::NOT_AVAILABLE`], and its handlers run on the
    /// calling thread.
    pub fn execute(self) -> RequestHandle {
        let id = self.id;
        let (pipeline, shared) = self.start();

        let task = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => Task::Spawned(runtime.spawn(pipeline.drive())),
            Err(_) => {
                warn!(request_id = %id, "No Tokio runtime available, failing request");
                Task::Ready(pipeline.fail_without_runtime())
            }
        };

        RequestHandle { id, shared, task }
    }

    /// Drives the request on the caller's task and returns the outcome after
    /// every handler has run.
    pub async fn run(self) -> Outcome {
        let (pipeline, _shared) = self.start();
        pipeline.drive().await.unwrap_or_else(|| Err(cancelled_error()))
    }
}

fn cancelled_error() -> ApiError {
    ApiError::Transport {
        code: transport_code::CANCELLED,
        description: "Request was cancelled".to_string(),
    }
}

const PENDING: u8 = 0;
const DISPATCHING: u8 = 1;
const CANCELLED: u8 = 2;
const FINISHED: u8 = 3;

struct Shared {
    state: AtomicU8,
    cancel: CancellationToken,
    lease: ActivityLease,
}

impl Shared {
    /// Moves from pending to `next`; fails if the request already left the
    /// pending state.
    fn transition(&self, next: u8) -> bool {
        self.state
            .compare_exchange(PENDING, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn state(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }
}

/// UI side effects held by one request. Each is released at most once,
/// whichever of finalization, cancel or drop gets there first.
struct ActivityLease {
    session: Session,
    network: AtomicBool,
    overlay: AtomicBool,
    interaction: AtomicBool,
}

impl ActivityLease {
    fn acquire(session: Session, overlay: bool, interaction: bool) -> Self {
        session.acquire_network();
        if overlay {
            session.acquire_overlay();
        }
        if interaction {
            session.lock_interaction();
        }
        Self {
            session,
            network: AtomicBool::new(true),
            overlay: AtomicBool::new(overlay),
            interaction: AtomicBool::new(interaction),
        }
    }

    fn release_network(&self) {
        if self.network.swap(false, Ordering::AcqRel) {
            self.session.release_network();
        }
    }

    fn release_ui(&self) {
        if self.overlay.swap(false, Ordering::AcqRel) {
            self.session.release_overlay();
        }
        if self.interaction.swap(false, Ordering::AcqRel) {
            self.session.unlock_interaction();
        }
    }

    fn release_all(&self) {
        self.release_network();
        self.release_ui();
    }
}

impl Drop for ActivityLease {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Releases the lease when the pipeline future ends, including by panic.
struct ReleaseOnExit(Arc<Shared>);

impl Drop for ReleaseOnExit {
    fn drop(&mut self) {
        self.0.lease.release_all();
    }
}

struct Pipeline {
    http_request: Result<HttpRequest, ApiError>,
    session: Session,
    handlers: Handlers,
    shared: Arc<Shared>,
    span: tracing::Span,
}

impl Pipeline {
    /// `None` when the request was cancelled before dispatch.
    async fn drive(self) -> Option<Outcome> {
        let Pipeline {
            http_request,
            session,
            handlers,
            shared,
            span,
        } = self;

        async move {
            let _release = ReleaseOnExit(shared.clone());

            let settled = match http_request {
                Ok(request) => {
                    let client = session.http_client().clone();
                    tokio::select! {
                        biased;
                        _ = shared.cancel.cancelled() => {
                            debug!("Request cancelled in flight");
                            return None;
                        }
                        result = client.execute(request) => Ok(result),
                    }
                }
                Err(err) => Err(err),
            };

            if !shared.transition(DISPATCHING) {
                debug!("Request cancelled before dispatch");
                return None;
            }

            let outcome = match settled {
                Ok(result) => classify(result),
                Err(err) => Err(err),
            };
            log_outcome(&outcome);

            Some(finalize(handlers, &shared, outcome))
        }
        .instrument(span)
        .await
    }

    fn fail_without_runtime(self) -> Option<Outcome> {
        let _entered = self.span.enter();
        let _release = ReleaseOnExit(self.shared.clone());

        if !self.shared.transition(DISPATCHING) {
            return None;
        }
        let outcome = Err(ApiError::Transport {
            code: transport_code::NOT_AVAILABLE,
            description: "No async runtime available to execute the request".to_string(),
        });
        log_outcome(&outcome);
        Some(finalize(self.handlers, &self.shared, outcome))
    }
}

fn finalize(handlers: Handlers, shared: &Shared, outcome: Outcome) -> Outcome {
    let finish = handlers.resolve(&outcome);
    shared.lease.release_network();
    finish.run();
    shared.lease.release_ui();
    shared.state.store(FINISHED, Ordering::Release);
    outcome
}

fn log_outcome(outcome: &Outcome) {
    match outcome {
        Ok(_) => info!("Request succeeded"),
        Err(err) => warn!(code = err.code(), error = %err, "Request failed"),
    }
}

enum Task {
    Spawned(JoinHandle<Option<Outcome>>),
    Ready(Option<Outcome>),
}

/// Handle to an executed request.
///
/// Dropping the handle does not cancel the request.
pub struct RequestHandle {
    id: Uuid,
    shared: Arc<Shared>,
    task: Task,
}

impl std::fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandle")
            .field("id", &self.id)
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl RequestHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Cancels the request unless its handlers already started.
    ///
    /// Releases network activity, the overlay and the interaction lock right
    /// away. Returns whether this call cancelled the request.
    pub fn cancel(&self) -> bool {
        if !self.shared.transition(CANCELLED) {
            debug!(request_id = %self.id, "Cancel ignored, request already dispatched");
            return false;
        }
        self.shared.cancel.cancel();
        self.shared.lease.release_all();
        info!(request_id = %self.id, "Request cancelled");
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.state() == CANCELLED
    }

    /// Whether every handler has run and all UI side effects are released.
    pub fn is_finished(&self) -> bool {
        self.shared.state() == FINISHED
    }

    /// Waits for the pipeline.
    ///
    /// `None` if the request was cancelled or a handler panicked.
    pub async fn wait(self) -> Option<Outcome> {
        match self.task {
            Task::Ready(outcome) => outcome,
            Task::Spawned(join) => match join.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(request_id = %self.id, error = %e, "Request task did not complete");
                    None
                }
            },
        }
    }
}
