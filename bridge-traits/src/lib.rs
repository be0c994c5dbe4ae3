//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host application implements.
//!
//! ## Overview
//!
//! This crate defines the contract between the request pipeline and the
//! platform it runs on. Each trait is a capability the core needs but cannot
//! provide portably.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - One-shot async HTTP transport, no retries
//!
//! ### UI side effects
//! - [`NetworkActivityIndicator`](ui::NetworkActivityIndicator) - Status bar spinner
//! - [`ProgressOverlay`](ui::ProgressOverlay) - Blocking progress HUD
//! - [`InteractionLock`](ui::InteractionLock) - Global input switch
//! - [`AlertPresenter`](ui::AlertPresenter) - Modal error alerts
//!
//! ### Storage & logging
//! - [`SecureStore`](storage::SecureStore) - Access token persistence (Keychain/Keystore)
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop  | `bridge-desktop`    |
//! | iOS      | host app            |
//! | Android  | host app            |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Transports
//! should report timeouts and connection failures through their dedicated
//! variants so callers can tell them apart.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so one implementation can be
//! shared by every in-flight request.

pub mod error;
pub mod http;
pub mod log;
pub mod storage;
pub mod ui;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use storage::SecureStore;
pub use ui::{
    Alert, AlertAction, AlertActionStyle, AlertPresenter, InteractionLock,
    NetworkActivityIndicator, NoopUi, ProgressOverlay,
};
