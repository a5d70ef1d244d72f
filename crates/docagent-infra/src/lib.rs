//! Infrastructure layer for docagent.
//!
//! Contains implementations of the port traits defined in `docagent-core`:
//! SQLite storage (conversation log, document records), the local filesystem
//! adapter, and the Gemini REST backend. Also loads configuration and the
//! prompt template from the data directory.

pub mod config;
pub mod filesystem;
pub mod gemini;
pub mod prompt;
pub mod sqlite;
