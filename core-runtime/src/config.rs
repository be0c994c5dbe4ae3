//! # API Configuration
//!
//! Collects the settings and host bridges every request needs.
//!
//! ## Overview
//!
//! [`ApiConfig`] is built once at startup with [`ApiConfigBuilder`] and then
//! handed to the session. The builder validates eagerly so a misconfigured
//! host fails at launch rather than on its first request.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - transport (desktop default: reqwest)
//!
//! ## Optional Dependencies
//!
//! - `NetworkActivityIndicator`, `ProgressOverlay`, `InteractionLock` -
//!   desktop default: one shared `HeadlessUi`; otherwise `NoopUi`
//! - `AlertPresenter` - without one, `show_alert_if_error` is ignored
//! - `SecureStore` - desktop default with `secure-store`: OS keychain;
//!   without one, the access token lives in memory only
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ApiConfig;
//! use std::sync::Arc;
//!
//! let config = ApiConfig::builder()
//!     .base_url("https://api.example.com/v1/")
//!     .http_client(Arc::new(MyHttpClient))
//!     .ui(Arc::new(MyUiBridge))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    AlertPresenter, HttpClient, InteractionLock, NetworkActivityIndicator, ProgressOverlay,
    SecureStore,
};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://url.com/";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = concat!("rest-core/", env!("CARGO_PKG_VERSION"));

const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);
const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Validated configuration for the request pipeline.
#[derive(Clone)]
pub struct ApiConfig {
    /// Absolute base URL ending in `/`; endpoint paths are appended verbatim
    pub base_url: String,

    /// Per-request transport timeout
    pub request_timeout: Duration,

    /// User agent for the default transport
    pub user_agent: String,

    pub http_client: Arc<dyn HttpClient>,

    pub activity_indicator: Arc<dyn NetworkActivityIndicator>,

    pub progress_overlay: Arc<dyn ProgressOverlay>,

    pub interaction_lock: Arc<dyn InteractionLock>,

    pub alert_presenter: Option<Arc<dyn AlertPresenter>>,

    /// Persistence for the access token (optional)
    pub secure_store: Option<Arc<dyn SecureStore>>,

    /// Token to start the session with, before any restore from storage
    pub initial_token: Option<String>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .field("http_client", &"HttpClient { ... }")
            .field(
                "alert_presenter",
                &self.alert_presenter.as_ref().map(|_| "AlertPresenter { ... }"),
            )
            .field(
                "secure_store",
                &self.secure_store.as_ref().map(|_| "SecureStore { ... }"),
            )
            .field(
                "initial_token",
                &self.initial_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl ApiConfig {
    /// Creates a new builder for constructing an `ApiConfig`.
    pub fn builder() -> ApiConfigBuilder {
        ApiConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The base URL is absolute http(s) and ends with `/`
    /// - The timeout lies between 1 second and 5 minutes
    /// - The user agent is not empty
    pub fn validate(&self) -> Result<()> {
        validate_base_url(&self.base_url)?;

        if self.request_timeout < MIN_REQUEST_TIMEOUT || self.request_timeout > MAX_REQUEST_TIMEOUT
        {
            return Err(Error::Config(format!(
                "Request timeout must be between {}s and {}s, got {:?}",
                MIN_REQUEST_TIMEOUT.as_secs(),
                MAX_REQUEST_TIMEOUT.as_secs(),
                self.request_timeout
            )));
        }

        if self.user_agent.trim().is_empty() {
            return Err(Error::Config("User agent cannot be empty".to_string()));
        }

        Ok(())
    }
}

fn validate_base_url(base_url: &str) -> Result<()> {
    let parsed = Url::parse(base_url)
        .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "Base URL must use http or https, got '{}'",
            parsed.scheme()
        )));
    }

    if !base_url.ends_with('/') {
        return Err(Error::Config(format!(
            "Base URL must end with '/' so endpoint paths can be appended: '{}'",
            base_url
        )));
    }

    Ok(())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(
    timeout: Duration,
    user_agent: &str,
) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_config(timeout, user_agent)
        .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(
    _timeout: Duration,
    _user_agent: &str,
) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client implementation provided. \
                  Desktop: enable the 'desktop-shims' feature to use ReqwestHttpClient. \
                  Mobile: inject the platform transport (URLSession/OkHttp adapter)."
            .to_string(),
    })
}

#[cfg(feature = "secure-store")]
fn provide_default_secure_store() -> Option<Arc<dyn SecureStore>> {
    Some(Arc::new(bridge_desktop::KeyringSecureStore::new()))
}

#[cfg(not(feature = "secure-store"))]
fn provide_default_secure_store() -> Option<Arc<dyn SecureStore>> {
    None
}

struct DefaultUi {
    activity_indicator: Arc<dyn NetworkActivityIndicator>,
    progress_overlay: Arc<dyn ProgressOverlay>,
    interaction_lock: Arc<dyn InteractionLock>,
}

#[cfg(feature = "desktop-shims")]
fn provide_default_ui() -> DefaultUi {
    let ui = Arc::new(bridge_desktop::HeadlessUi::new());
    DefaultUi {
        activity_indicator: ui.clone(),
        progress_overlay: ui.clone(),
        interaction_lock: ui,
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_ui() -> DefaultUi {
    let ui = Arc::new(bridge_traits::NoopUi);
    DefaultUi {
        activity_indicator: ui.clone(),
        progress_overlay: ui.clone(),
        interaction_lock: ui,
    }
}

/// Builder for constructing [`ApiConfig`] instances.
#[derive(Default)]
pub struct ApiConfigBuilder {
    base_url: Option<String>,
    request_timeout: Option<Duration>,
    user_agent: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    activity_indicator: Option<Arc<dyn NetworkActivityIndicator>>,
    progress_overlay: Option<Arc<dyn ProgressOverlay>>,
    interaction_lock: Option<Arc<dyn InteractionLock>>,
    alert_presenter: Option<Arc<dyn AlertPresenter>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    initial_token: Option<String>,
}

impl ApiConfigBuilder {
    /// Sets the base URL. Default: `http://url.com/`
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the per-request timeout. Default: 30 seconds
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the user agent used by the default transport.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the HTTP transport.
    ///
    /// If not provided, `ReqwestHttpClient` is used when the `desktop-shims`
    /// feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn activity_indicator(mut self, indicator: Arc<dyn NetworkActivityIndicator>) -> Self {
        self.activity_indicator = Some(indicator);
        self
    }

    pub fn progress_overlay(mut self, overlay: Arc<dyn ProgressOverlay>) -> Self {
        self.progress_overlay = Some(overlay);
        self
    }

    pub fn interaction_lock(mut self, lock: Arc<dyn InteractionLock>) -> Self {
        self.interaction_lock = Some(lock);
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

    /// Sets the store used to persist the access token.
    ///
    /// If not provided, the OS keychain is used when the `secure-store`
    /// feature is enabled.
    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    /// Seeds the session with an access token.
    pub fn initial_token(mut self, token: impl Into<String>) -> Self {
        self.initial_token = Some(token.into());
        self
    }

    /// Builds the final `ApiConfig` instance.
    ///
    /// # Errors
    ///
    /// - `Error::CapabilityMissing` if no transport was given and no desktop
    ///   default is compiled in
    /// - `Error::Config` if a value fails validation
    pub fn build(self) -> Result<ApiConfig> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        // Validate before building a default transport with these values.
        validate_base_url(&base_url)?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout, &user_agent)?,
        };

        let defaults = provide_default_ui();

        let config = ApiConfig {
            base_url,
            request_timeout,
            user_agent,
            http_client,
            activity_indicator: self
                .activity_indicator
                .unwrap_or(defaults.activity_indicator),
            progress_overlay: self.progress_overlay.unwrap_or(defaults.progress_overlay),
            interaction_lock: self.interaction_lock.unwrap_or(defaults.interaction_lock),
            alert_presenter: self.alert_presenter,
            secure_store: self.secure_store.or_else(provide_default_secure_store),
            initial_token: self.initial_token,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpRequest, HttpResponse};
    use bridge_traits::ui::Alert;

    struct MockHttpClient;

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse::new(200, "{}"))
        }
    }

    struct MockUi;

    impl NetworkActivityIndicator for MockUi {
        fn set_visible(&self, _visible: bool) {}
    }

    impl ProgressOverlay for MockUi {
        fn show(&self) {}
        fn dismiss(&self) {}
    }

    impl InteractionLock for MockUi {
        fn set_interaction_enabled(&self, _enabled: bool) {}
    }

    impl AlertPresenter for MockUi {
        fn present(&self, _alert: Alert) {}
    }

    fn builder() -> ApiConfigBuilder {
        ApiConfig::builder().http_client(Arc::new(MockHttpClient))
    }

    #[test]
    fn test_defaults() {
        let config = builder().build().unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert!(config.user_agent.starts_with("rest-core/"));
        assert!(config.alert_presenter.is_none());
        assert!(config.initial_token.is_none());

        #[cfg(not(feature = "secure-store"))]
        assert!(config.secure_store.is_none());
    }

    #[test]
    fn test_custom_values() {
        let config = builder()
            .base_url("https://api.example.com/v2/")
            .request_timeout(Duration::from_secs(10))
            .user_agent("CoffeeApp/2.1")
            .initial_token("tok")
            .ui(Arc::new(MockUi))
            .build()
            .unwrap();

        assert_eq!(config.base_url, "https://api.example.com/v2/");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.user_agent, "CoffeeApp/2.1");
        assert_eq!(config.initial_token.as_deref(), Some("tok"));
        assert!(config.alert_presenter.is_some());
    }

    #[test]
    fn test_rejects_relative_base_url() {
        let result = builder().base_url("api/v1/").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let result = builder().base_url("ftp://files.example.com/").build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("http")));
    }

    #[test]
    fn test_rejects_base_url_without_trailing_slash() {
        let result = builder().base_url("https://api.example.com/v1").build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("end with '/'")));
    }

    #[test]
    fn test_rejects_out_of_range_timeout() {
        let too_short = builder().request_timeout(Duration::from_millis(10)).build();
        assert!(matches!(too_short, Err(Error::Config(_))));

        let too_long = builder().request_timeout(Duration::from_secs(3600)).build();
        assert!(matches!(too_long, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_empty_user_agent() {
        let result = builder().user_agent("  ").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = builder().initial_token("very-secret").build().unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_http_client_without_desktop_shims() {
        let result = ApiConfig::builder().build();
        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { capability, .. }) if capability == "HttpClient"
        ));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_defaults_fill_transport() {
        assert!(ApiConfig::builder().build().is_ok());
    }
}
