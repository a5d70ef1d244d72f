//! Shared domain types for docagent.
//!
//! This crate contains the domain types used across the service:
//! chat messages, remote provider files, generation turns, document
//! records, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, secrecy.

pub mod config;
pub mod document;
pub mod error;
pub mod generation;
pub mod message;
pub mod remote_file;
