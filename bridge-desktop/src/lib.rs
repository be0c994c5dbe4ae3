//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `SecureStore` using the `keyring` crate
//! - UI bridges as [`HeadlessUi`], which logs and records state instead of
//!   drawing anything
//!
//! ## Feature Flags
//!
//! - `secure-store`: Enable OS keychain integration (default)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{HeadlessUi, ReqwestHttpClient};
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! let ui = Arc::new(HeadlessUi::new());
//! // Hand both to core_runtime::config::ApiConfig::builder()
//! ```

mod http;
mod ui;

#[cfg(feature = "secure-store")]
mod secure_store;

pub use http::ReqwestHttpClient;
pub use ui::HeadlessUi;

#[cfg(feature = "secure-store")]
pub use secure_store::KeyringSecureStore;
