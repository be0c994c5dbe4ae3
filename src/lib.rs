//! Workspace façade crate.
//!
//! Host applications depend on `api-workspace` and pick features here instead
//! of wiring `core-api`, `core-runtime` and the bridge crates one by one.
//! Everything public in `core-api` is re-exported at the root.

pub use core_api::*;
