//! Keeper Server - in-memory TTL session store over HTTP.
//!
//! The store itself lives in `keeper-service`; `keeper-http` provides the
//! REST transport. This crate wires them together with configuration,
//! logging, and process lifecycle.

pub mod config;

pub use keeper_http::{AppState, router};
