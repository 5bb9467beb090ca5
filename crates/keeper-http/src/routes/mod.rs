//! HTTP API route handlers.

pub mod sessions;
pub mod system;
