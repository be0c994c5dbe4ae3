//! # Core Runtime Module
//!
//! Foundational infrastructure shared by the request pipeline:
//! - Configuration management with fail-fast validation
//! - Logging and tracing setup
//!
//! ## Overview
//!
//! [`config::ApiConfig`] collects every host bridge the pipeline needs and
//! fills in desktop defaults when the `desktop-shims` feature is enabled.
//! [`logging::init_logging`] installs the `tracing` subscriber once at
//! startup.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ApiConfig, ApiConfigBuilder};
pub use error::{Error, Result};
