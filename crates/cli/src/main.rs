//! # pycross
//!
//! Cross-compiles the Python runtime and its package set for Android targets.
//!
//! ```bash
//! pycross --target android-arm64-v8a                 # full build
//! pycross --target android-x86_64 --skip-python-build  # packages only
//! ```
//!
//! The runtime pipeline runs first and produces a staged install tree; the
//! package pipeline is constructed with that artifact and runs second.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pycross_core::{
    BuildConfig, DEFAULT_LIBFFI_VERSION, DEFAULT_OPENSSL_VERSION, DEFAULT_PYTHON_VERSION,
    NDK_ROOT_VAR, PackagePipeline, RuntimePipeline, SystemToolchain,
};
use pycross_platform::Target;

/// Cross-compile the Python runtime and packages for Android
#[derive(Parser)]
#[command(name = "pycross", version, about, long_about = None)]
struct Cli {
    /// Build target (android-x86_64 or android-arm64-v8a)
    #[arg(long)]
    target: Target,

    /// Python runtime version to build
    #[arg(long, default_value = DEFAULT_PYTHON_VERSION)]
    python_version: String,

    /// Version of the libffi dependency
    #[arg(long, default_value = DEFAULT_LIBFFI_VERSION)]
    libffi_version: String,

    /// Version of the OpenSSL dependency
    #[arg(long, default_value = DEFAULT_OPENSSL_VERSION)]
    openssl_version: String,

    /// NDK installation root (default: $ANDROID_NDK_HOME)
    #[arg(long)]
    ndk_root: Option<PathBuf>,

    /// Working directory for source/prefix/install/output trees
    /// (default: a per-target directory under the user cache)
    #[arg(long)]
    build_dir: Option<PathBuf>,

    /// Directory holding config.site, the setup.py overrides, and
    /// requirements.txt
    #[arg(long, default_value = "support")]
    code_dir: PathBuf,

    /// Expected SHA-256 of the source archive, verified when given
    #[arg(long)]
    source_sha256: Option<String>,

    /// lib-dynload search path embedded in the runtime's link flags
    /// (default: derived from the Python version)
    #[arg(long)]
    runtime_lib_dir: Option<String>,

    /// Number of parallel build jobs
    #[arg(short, long, default_value_t = 1)]
    jobs: u32,

    /// Skip the runtime build and reuse a previously built install tree
    #[arg(long)]
    skip_python_build: bool,

    /// Skip the package build entirely
    #[arg(long)]
    skip_packages_build: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .without_time()
        .init();

    let build_dir = match cli.build_dir {
        Some(dir) => dir,
        None => default_build_dir(cli.target)?,
    };
    let ndk_root = cli
        .ndk_root
        .or_else(|| std::env::var_os(NDK_ROOT_VAR).map(PathBuf::from));

    let mut config = BuildConfig::new(cli.target, cli.python_version, build_dir, cli.code_dir);
    config.libffi_version = cli.libffi_version;
    config.openssl_version = cli.openssl_version;
    config.ndk_root = ndk_root;
    config.source_sha256 = cli.source_sha256;
    if let Some(dir) = cli.runtime_lib_dir {
        config.runtime_lib_dir = dir;
    }
    config.num_jobs = cli.jobs;
    config.skip_python_build = cli.skip_python_build;
    config.skip_packages_build = cli.skip_packages_build;
    let config = config;

    debug!(config = %serde_json::to_string(&config)?, "resolved configuration");

    let toolchain = SystemToolchain::new(&config);

    let artifact = RuntimePipeline::new(&config, &toolchain)
        .run()
        .context("runtime build failed")?;
    info!(artifact = %artifact.display(), "runtime build complete");

    PackagePipeline::new(&config, &toolchain, artifact)
        .run()
        .context("package build failed")?;
    info!("build complete");

    Ok(())
}

/// Per-target working directory under the user cache
fn default_build_dir(target: Target) -> Result<PathBuf> {
    let cache = dirs::cache_dir().context("failed to determine cache directory")?;
    Ok(cache.join("pycross").join(target.to_string()))
}
