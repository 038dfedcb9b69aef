//! Error types for pycross-platform

use thiserror::Error;

/// Errors that can occur while resolving a build target
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("unsupported build target '{0}' (supported: android-x86_64, android-arm64-v8a)")]
    UnsupportedTarget(String),
}
