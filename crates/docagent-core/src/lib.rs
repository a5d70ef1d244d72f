//! Business logic and port trait definitions for docagent.
//!
//! This crate defines the "ports" (conversation store, document repository,
//! filesystem, generative backend) that the infrastructure layer implements,
//! and the chat-turn pipeline built on top of them. It depends only on
//! `docagent-types` -- never on `docagent-infra` or any database/HTTP crate.

pub mod chat;
pub mod clock;
pub mod conversation;
pub mod document;
pub mod fs;
pub mod generation;
pub mod remote_file;
