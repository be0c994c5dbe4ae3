//! # Core API
//!
//! Request pipeline for the application's REST backend.
//!
//! ## Overview
//!
//! - [`Endpoint`] - catalog of server operations
//! - [`Session`] - access token, transport and shared UI state
//! - [`Api`] - request factories for the catalog
//! - [`Request`] / [`RequestHandle`] - builder, execution and cancellation
//! - [`ApiError`] - transport and application errors with a uniform code
//!
//! ## Usage
//!
//! ```ignore
//! use core_api::{Api, ApiConfig, AlertAction};
//!
//! let api = Api::from_config(&ApiConfig::builder().initial_token(token).build()?);
//!
//! api.send_sms("+15550100")
//!     .add_completion_handler(|body| println!("sent: {body}"))
//!     .add_failure_handler(|err| eprintln!("failed [{}]: {}", err.code(), err))
//!     .show_alert_if_error(vec![AlertAction::cancel("OK")])
//!     .add_activity_indicator_view()
//!     .disable_user_interaction()
//!     .execute();
//! ```

pub mod api;
pub mod classify;
pub mod encoding;
pub mod endpoint;
pub mod error;
mod handlers;
pub mod request;
pub mod session;

pub use api::Api;
pub use encoding::ParameterEncoding;
pub use endpoint::Endpoint;
pub use error::{transport_code, ApiError, ErrorCode, SessionError, SessionResult};
pub use handlers::{CompletionHandler, FailureHandler, FinishHandler};
pub use request::{Outcome, Request, RequestHandle};
pub use session::{Session, SessionBuilder, ACCESS_TOKEN_KEY};

pub use bridge_traits::http::HttpMethod;
pub use bridge_traits::ui::{AlertAction, AlertActionStyle};
pub use core_runtime::config::{ApiConfig, ApiConfigBuilder};
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
