//! FileSystem trait for abstracting file I/O.
//!
//! Defined in docagent-core so the remote file manager and the chat pipeline
//! can stage and read files without depending on any specific filesystem
//! implementation. The `LocalFileSystem` adapter lives in docagent-infra.

use std::path::Path;

/// Abstraction over the filesystem operations the service needs.
///
/// Errors are plain `std::io::Error`s so callers can match on
/// `ErrorKind::NotFound`.
pub trait FileSystem: Send + Sync {
    /// Write bytes to a file, replacing any existing content.
    fn write_bytes(
        &self,
        path: &Path,
        content: &[u8],
    ) -> impl std::future::Future<Output = Result<(), std::io::Error>> + Send;

    /// Read a file's bytes.
    fn read_bytes(
        &self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, std::io::Error>> + Send;

    /// Remove a single file.
    fn remove_file(
        &self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<(), std::io::Error>> + Send;

    /// Create a directory and all parent directories.
    fn create_dir_all(
        &self,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<(), std::io::Error>> + Send;
}
