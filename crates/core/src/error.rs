//! Error types for pycross-core

use thiserror::Error;

use pycross_platform::PlatformError;

/// Errors that can occur while running a build pipeline
///
/// Every variant is fatal: the first error unwinds the whole pipeline and no
/// partially built directories are cleaned up.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("cross toolchain root not set (pass --ndk-root or set ${var})")]
    MissingToolchain { var: &'static str },

    #[error("failed to fetch source from '{url}': {message}")]
    SourceFetch { url: String, message: String },

    #[error("source hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("failed to download distributions for '{requirements}': no compatible wheel")]
    DependencyDownload { requirements: String },

    #[error("command '{program}' exited with status {code:?}")]
    CommandFailed { program: String, code: Option<i32> },

    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<CoreError>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
