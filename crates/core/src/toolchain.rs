//! External build tooling interface
//!
//! The pipelines drive the OS package manager, prebuilt dependency archives,
//! source downloads, and arbitrary build commands through this narrow trait.
//! Tests inject a recording fake; production uses `SystemToolchain`.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use pycross_platform::Target;

use crate::config::BuildConfig;
use crate::env::BuildEnvironment;
use crate::error::CoreError;
use crate::fetch::{self, ArchiveKind};
use crate::Result;

/// Base URL the prebuilt native dependency archives are published under
pub const DEPENDENCY_BASE_URL: &str =
    "https://github.com/pycross/ext-builds/releases/download";

/// Operations the pipelines need from the external toolchain
pub trait Toolchain {
    /// Install OS packages by name (version pins in apt syntax allowed)
    fn install_packages(&self, packages: &[&str]) -> Result<()>;

    /// Install a prebuilt third-party native library at a pinned version
    fn install_native_dependency(&self, name: &str, version: &str) -> Result<()>;

    /// Retrieve and extract a source archive; returns the extraction root
    fn fetch_source(&self, url: &str, kind: ArchiveKind, dest: &Path) -> Result<PathBuf>;

    /// Run an external command to completion under the given cwd and
    /// environment; nonzero exit is an error
    fn execute(&self, argv: &[&str], cwd: Option<&Path>, env: &BuildEnvironment) -> Result<()>;

    /// Package a finished directory tree into a distributable archive
    fn create_package(&self, contents: &Path, archive: &Path) -> Result<()>;
}

/// Toolchain implementation backed by apt, HTTPS downloads, and subprocesses
pub struct SystemToolchain {
    target: Target,
    install_prefix: PathBuf,
    download_dir: PathBuf,
    source_sha256: Option<String>,
    dependency_base_url: String,
}

impl SystemToolchain {
    /// Create a toolchain bound to the run's configuration
    pub fn new(config: &BuildConfig) -> Self {
        Self {
            target: config.target,
            install_prefix: config.install_prefix(),
            download_dir: config.build_dir.join("downloads"),
            source_sha256: config.source_sha256.clone(),
            dependency_base_url: DEPENDENCY_BASE_URL.to_string(),
        }
    }
}

impl Toolchain for SystemToolchain {
    fn install_packages(&self, packages: &[&str]) -> Result<()> {
        info!(packages = ?packages, "installing OS packages");
        let mut argv = vec!["apt-get", "install", "-y", "--no-install-recommends"];
        argv.extend_from_slice(packages);
        self.execute(&argv, None, &BuildEnvironment::new())
    }

    fn install_native_dependency(&self, name: &str, version: &str) -> Result<()> {
        info!(name, version, "installing native dependency");
        let url = format!(
            "{}/{name}-{version}/{name}-{version}-{}.tar.gz",
            self.dependency_base_url, self.target
        );
        let archive = self.download_dir.join(fetch::archive_file_name(&url));
        fetch::fetch_url(&url, &archive, None)?;
        fetch::unpack_archive(&archive, ArchiveKind::TarGz, &self.install_prefix)
    }

    fn fetch_source(&self, url: &str, kind: ArchiveKind, dest: &Path) -> Result<PathBuf> {
        let archive = self.download_dir.join(fetch::archive_file_name(url));
        fetch::fetch_url(url, &archive, self.source_sha256.as_deref()).map_err(|e| wrap_fetch(url, e))?;
        fetch::unpack_archive(&archive, kind, dest).map_err(|e| wrap_fetch(url, e))?;
        Ok(dest.to_path_buf())
    }

    fn execute(&self, argv: &[&str], cwd: Option<&Path>, env: &BuildEnvironment) -> Result<()> {
        let Some((program, args)) = argv.split_first() else {
            return Err(CoreError::CommandFailed {
                program: String::new(),
                code: None,
            });
        };

        debug!(command = %argv.join(" "), cwd = ?cwd, "executing");

        let mut command = Command::new(program);
        command.args(args).envs(env);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let status = command.status()?;
        if !status.success() {
            return Err(CoreError::CommandFailed {
                program: argv.join(" "),
                code: status.code(),
            });
        }
        Ok(())
    }

    fn create_package(&self, contents: &Path, archive: &Path) -> Result<()> {
        info!(archive = %archive.display(), "packaging");
        if let Some(parent) = archive.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(archive)?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.follow_symlinks(false);
        builder.append_dir_all("", contents)?;
        builder.into_inner()?.finish()?;
        Ok(())
    }
}

/// Keep hash mismatches distinct; everything else is a fetch failure
fn wrap_fetch(url: &str, err: CoreError) -> CoreError {
    match err {
        e @ (CoreError::SourceFetch { .. } | CoreError::HashMismatch { .. }) => e,
        other => CoreError::SourceFetch {
            url: url.to_string(),
            message: other.to_string(),
        },
    }
}
