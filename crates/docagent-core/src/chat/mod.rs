//! Chat turn pipeline.

pub mod orchestrator;

pub use orchestrator::{Attachment, ChatOrchestrator, ChatTurnRequest, PromptTemplates};
