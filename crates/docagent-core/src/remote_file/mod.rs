//! Making local files available at the generative provider.

pub mod lock;
pub mod manager;

pub use lock::{KeyedGuard, KeyedLocks};
pub use manager::{FileLayout, LocalSource, PollPolicy, RemoteFileManager};
