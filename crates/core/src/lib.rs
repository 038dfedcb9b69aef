//! pycross-core: Cross-compilation pipelines for the Python runtime
//!
//! This crate provides the two build pipelines and everything they share:
//! - `BuildConfig`: immutable run parameters, resolved once by the caller
//! - `compose`: the cross-compilation environment composer
//! - `Toolchain`: the narrow interface to the external build tooling
//! - `RuntimePipeline`: fetches, configures, and cross-builds the runtime
//! - `PackagePipeline`: downloads and cross-builds packages against it

mod config;
mod env;
mod error;
mod fetch;
mod fsutil;
mod packages;
mod runtime;
mod stage;
mod toolchain;

pub use config::{
    ANDROID_API_LEVEL, BuildConfig, DEFAULT_LIBFFI_VERSION, DEFAULT_OPENSSL_VERSION,
    DEFAULT_PYTHON_VERSION, NDK_ROOT_VAR,
};
pub use env::{BuildEnvironment, PipelineKind, compose};
pub use error::CoreError;
pub use fetch::ArchiveKind;
pub use packages::PackagePipeline;
pub use runtime::RuntimePipeline;
pub use stage::StageResult;
pub use toolchain::{SystemToolchain, Toolchain};

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
