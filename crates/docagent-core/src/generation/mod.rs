//! Generative backend abstraction.

pub mod backend;
pub mod box_backend;

pub use backend::GenerativeBackend;
pub use box_backend::BoxGenerativeBackend;
