//! HTTP/REST API layer for docagent.
//!
//! Axum-based API serving the chat endpoints and the session history
//! lookup, with permissive CORS and a request body cap.

pub mod error;
pub mod handlers;
pub mod router;
