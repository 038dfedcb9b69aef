//! Target resolution for cross-compiled Python builds
//!
//! This crate maps the supported Android build targets to:
//! - GNU-style target and build-machine triples
//! - NDK toolchain binary names
//! - wheel platform tags

mod error;
mod target;

pub use error::PlatformError;
pub use target::{HostArch, Target};
