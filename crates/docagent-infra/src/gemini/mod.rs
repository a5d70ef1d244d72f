//! Gemini REST backend.
//!
//! Implements `GenerativeBackend` against the Generative Language API: the
//! file store (`/upload/v1beta/files`, `/v1beta/files/*`) and
//! `models/*:generateContent`.

pub mod client;
pub mod types;

pub use client::GeminiBackend;
