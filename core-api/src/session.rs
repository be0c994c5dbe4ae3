//! # Session
//!
//! Context shared by every request: the access token, the transport, the UI
//! bridges and the reference-counted UI state.
//!
//! ## Overview
//!
//! A [`Session`] is cheap to clone; clones share the same state. UI side
//! effects are counted rather than toggled, so overlapping requests keep the
//! network activity indicator, the progress overlay and the interaction lock
//! up until the last of them releases it.
//!
//! The access token lives in memory. When a [`SecureStore`] is configured it
//! can also be persisted under the `access_token` key and restored on the
//! next launch. The token value is never logged.

use crate::error::{SessionError, SessionResult};
use bridge_traits::{
    AlertPresenter, HttpClient, InteractionLock, NetworkActivityIndicator, NoopUi,
    ProgressOverlay, SecureStore,
};
use core_runtime::config::{ApiConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Header and storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Counts holders of one shared UI effect.
///
/// The `on_first`/`on_last` callbacks run while the count is locked, so
/// show/hide transitions reach the bridge in the same order as the count
/// changes.
#[derive(Debug, Default)]
struct RefCounter {
    count: Mutex<usize>,
}

impl RefCounter {
    fn acquire(&self, on_first: impl FnOnce()) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count += 1;
        if *count == 1 {
            on_first();
        }
    }

    fn release(&self, on_last: impl FnOnce()) -> bool {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        if *count == 0 {
            return false;
        }
        *count -= 1;
        if *count == 0 {
            on_last();
        }
        true
    }

    fn get(&self) -> usize {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct SessionInner {
    base_url: String,
    request_timeout: Duration,
    http_client: Arc<dyn HttpClient>,
    activity_indicator: Arc<dyn NetworkActivityIndicator>,
    progress_overlay: Arc<dyn ProgressOverlay>,
    interaction_lock: Arc<dyn InteractionLock>,
    alert_presenter: Option<Arc<dyn AlertPresenter>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    token: RwLock<String>,
    network: RefCounter,
    overlay: RefCounter,
    interaction: RefCounter,
}

/// Shared request context.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.inner.base_url)
            .field("request_timeout", &self.inner.request_timeout)
            .field("active_requests", &self.active_requests())
            .field("has_alert_presenter", &self.inner.alert_presenter.is_some())
            .field("has_secure_store", &self.inner.secure_store.is_some())
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Session {
    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(SessionInner {
            base_url: config.base_url.clone(),
            request_timeout: config.request_timeout,
            http_client: config.http_client.clone(),
            activity_indicator: config.activity_indicator.clone(),
            progress_overlay: config.progress_overlay.clone(),
            interaction_lock: config.interaction_lock.clone(),
            alert_presenter: config.alert_presenter.clone(),
            secure_store: config.secure_store.clone(),
            token: RwLock::new(config.initial_token.clone().unwrap_or_default()),
            network: RefCounter::default(),
            overlay: RefCounter::default(),
            interaction: RefCounter::default(),
        })
    }

    /// Unvalidated builder, mainly for tests and embedding.
    ///
    /// UI bridges default to [`NoopUi`].
    pub fn builder(http_client: Arc<dyn HttpClient>) -> SessionBuilder {
        SessionBuilder::new(http_client)
    }

    fn new(inner: SessionInner) -> Self {
        debug!(
            base_url = %inner.base_url,
            timeout_ms = inner.request_timeout.as_millis() as u64,
            "Session created"
        );
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.inner.request_timeout
    }

    pub(crate) fn http_client(&self) -> &Arc<dyn HttpClient> {
        &self.inner.http_client
    }

    pub(crate) fn alert_presenter(&self) -> Option<&Arc<dyn AlertPresenter>> {
        self.inner.alert_presenter.as_ref()
    }

    // ------------------------------------------------------------------
    // Token
    // ------------------------------------------------------------------

    /// The stored access token; empty when none is set.
    pub fn token(&self) -> String {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn has_token(&self) -> bool {
        !self
            .inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token.into();
        debug!("Access token updated");
    }

    pub fn clear_token(&self) {
        self.inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("Access token cleared");
    }

    /// Loads the persisted token into memory.
    ///
    /// Returns `Ok(None)` when there is no store or nothing was stored; the
    /// in-memory token is left untouched in that case.
    pub async fn restore_token(&self) -> SessionResult<Option<String>> {
        let Some(store) = &self.inner.secure_store else {
            debug!("No secure store configured, skipping token restore");
            return Ok(None);
        };

        let Some(bytes) = store.get_secret(ACCESS_TOKEN_KEY).await? else {
            debug!("No persisted access token");
            return Ok(None);
        };

        let token = String::from_utf8(bytes).map_err(|_| {
            warn!("Persisted access token is not valid UTF-8");
            SessionError::InvalidStoredToken
        })?;

        self.set_token(token.clone());
        info!("Restored access token from secure store");
        Ok(Some(token))
    }

    /// Sets the token and writes it to the secure store if one is configured.
    pub async fn persist_token(&self, token: impl Into<String>) -> SessionResult<()> {
        let token = token.into();
        self.set_token(token.clone());

        if let Some(store) = &self.inner.secure_store {
            store
                .set_secret(ACCESS_TOKEN_KEY, token.as_bytes())
                .await
                .inspect_err(|e| warn!(error = %e, "Failed to persist access token"))?;
            info!("Persisted access token");
        }

        Ok(())
    }

    /// Clears the token from memory and from the secure store.
    pub async fn forget_token(&self) -> SessionResult<()> {
        self.clear_token();

        if let Some(store) = &self.inner.secure_store {
            store
                .delete_secret(ACCESS_TOKEN_KEY)
                .await
                .inspect_err(|e| warn!(error = %e, "Failed to delete access token"))?;
            info!("Deleted persisted access token");
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Headers
    // ------------------------------------------------------------------

    /// Headers every call carries: `{"access_token": <token>}`.
    pub fn headers(&self) -> HashMap<String, String> {
        HashMap::from([(ACCESS_TOKEN_KEY.to_string(), self.token())])
    }

    /// [`headers`](Self::headers) merged with operation-specific fields.
    /// Fields in `extra` win on conflict.
    pub fn headers_with<I, K, V>(&self, extra: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut headers = self.headers();
        headers.extend(extra.into_iter().map(|(k, v)| (k.into(), v.into())));
        headers
    }

    // ------------------------------------------------------------------
    // Shared UI state
    // ------------------------------------------------------------------

    pub fn is_network_active(&self) -> bool {
        self.active_requests() > 0
    }

    /// Requests currently holding the network activity indicator.
    pub fn active_requests(&self) -> usize {
        self.inner.network.get()
    }

    pub fn is_overlay_visible(&self) -> bool {
        self.inner.overlay.get() > 0
    }

    pub fn is_interaction_locked(&self) -> bool {
        self.inner.interaction.get() > 0
    }

    pub(crate) fn acquire_network(&self) {
        let indicator = &self.inner.activity_indicator;
        self.inner.network.acquire(|| indicator.set_visible(true));
    }

    pub(crate) fn release_network(&self) {
        let indicator = &self.inner.activity_indicator;
        if !self.inner.network.release(|| indicator.set_visible(false)) {
            warn!("Network activity released more often than acquired");
        }
    }

    pub(crate) fn acquire_overlay(&self) {
        let overlay = &self.inner.progress_overlay;
        self.inner.overlay.acquire(|| overlay.show());
    }

    pub(crate) fn release_overlay(&self) {
        let overlay = &self.inner.progress_overlay;
        if !self.inner.overlay.release(|| overlay.dismiss()) {
            warn!("Progress overlay released more often than acquired");
        }
    }

    pub(crate) fn lock_interaction(&self) {
        let lock = &self.inner.interaction_lock;
        self.inner
            .interaction
            .acquire(|| lock.set_interaction_enabled(false));
    }

    pub(crate) fn unlock_interaction(&self) {
        let lock = &self.inner.interaction_lock;
        if !self
            .inner
            .interaction
            .release(|| lock.set_interaction_enabled(true))
        {
            warn!("Interaction lock released more often than acquired");
        }
    }
}

/// Builder for [`Session`] without going through [`ApiConfig`].
pub struct SessionBuilder {
    base_url: String,
    request_timeout: Duration,
    http_client: Arc<dyn HttpClient>,
    activity_indicator: Arc<dyn NetworkActivityIndicator>,
    progress_overlay: Arc<dyn ProgressOverlay>,
    interaction_lock: Arc<dyn InteractionLock>,
    alert_presenter: Option<Arc<dyn AlertPresenter>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    token: String,
}

impl SessionBuilder {
    fn new(http_client: Arc<dyn HttpClient>) -> Self {
        let noop = Arc::new(NoopUi);
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            http_client,
            activity_indicator: noop.clone(),
            progress_overlay: noop.clone(),
            interaction_lock: noop,
            alert_presenter: None,
            secure_store: None,
            token: String::new(),
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn activity_indicator(mut self, indicator: Arc<dyn NetworkActivityIndicator>) -> Self {
        self.activity_indicator = indicator;
        self
    }

    pub fn progress_overlay(mut self, overlay: Arc<dyn ProgressOverlay>) -> Self {
        self.progress_overlay = overlay;
        self
    }

    pub fn interaction_lock(mut self, lock: Arc<dyn InteractionLock>) -> Self {
        self.interaction_lock = lock;
        self
    }

    pub fn alert_presenter(mut self, presenter: Arc<dyn AlertPresenter>) -> Self {
        self.alert_presenter = Some(presenter);
        self
    }

    /// Uses one object for all four UI bridges.
    pub fn ui<U>(self, ui: Arc<U>) -> Self
    where
        U: NetworkActivityIndicator + ProgressOverlay + InteractionLock + AlertPresenter + 'static,
    {
        self.activity_indicator(ui.clone())
            .progress_overlay(ui.clone())
            .interaction_lock(ui.clone())
            .alert_presenter(ui)
    }

    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn build(self) -> Session {
        Session::new(SessionInner {
            base_url: self.base_url,
            request_timeout: self.request_timeout,
            http_client: self.http_client,
            activity_indicator: self.activity_indicator,
            progress_overlay: self.progress_overlay,
            interaction_lock: self.interaction_lock,
            alert_presenter: self.alert_presenter,
            secure_store: self.secure_store,
            token: RwLock::new(self.token),
            network: RefCounter::default(),
            overlay: RefCounter::default(),
            interaction: RefCounter::default(),
        })
    }
}
