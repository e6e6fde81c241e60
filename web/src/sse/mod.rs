//! SSE HTTP handler for the web layer.
//!
//! This module contains only the Axum adapter that binds a request/response
//! pair to a channel. The engine itself (channels, history, registry, wire
//! encoding) lives in the `sse` crate.

pub mod handler;
