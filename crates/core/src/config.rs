//! Build configuration resolved once per invocation
//!
//! `BuildConfig` is constructed by the caller before any stage runs and is
//! read-only from then on; no stage obtains configuration by ambient lookup.

use serde::Serialize;
use std::path::{Path, PathBuf};

use pycross_platform::Target;

/// Python version built when none is requested
pub const DEFAULT_PYTHON_VERSION: &str = "3.7.16";

/// Pinned libffi dependency version
pub const DEFAULT_LIBFFI_VERSION: &str = "3.3-1";

/// Pinned OpenSSL dependency version
///
/// `compose` force-sets HAVE_X509_VERIFY_PARAM_SET1_HOST for this version
/// because the cross configure step cannot probe for the symbol; revisit both
/// together when bumping.
pub const DEFAULT_OPENSSL_VERSION: &str = "1.1.1l-1";

/// Android platform API level the NDK sysroot paths are resolved against
pub const ANDROID_API_LEVEL: u32 = 29;

/// Environment variable consulted for the NDK installation root
pub const NDK_ROOT_VAR: &str = "ANDROID_NDK_HOME";

/// Host tag of the NDK prebuilt toolchain directory
pub const NDK_HOST_TAG: &str = "linux-x86_64";

/// Resolved run parameters for both pipelines
#[derive(Debug, Clone, Serialize)]
pub struct BuildConfig {
    /// Cross-compilation destination
    pub target: Target,
    /// Python runtime version to build
    pub python_version: String,
    /// libffi dependency version pin
    pub libffi_version: String,
    /// OpenSSL dependency version pin
    pub openssl_version: String,
    /// NDK installation root; required once an environment is composed
    pub ndk_root: Option<PathBuf>,
    /// Working directory holding source/prefix/install/output trees
    pub build_dir: PathBuf,
    /// Directory holding config.site, setup.py overrides, and requirements
    pub code_dir: PathBuf,
    /// Expected SHA-256 of the source archive, verified when set
    pub source_sha256: Option<String>,
    /// Parallelism hint forwarded to make -j
    pub num_jobs: u32,
    /// Library search path embedded in the runtime's link flags, pointing at
    /// the lib-dynload directory on the deployed device
    pub runtime_lib_dir: String,
    /// Skip the runtime build and reuse a previously built install tree
    pub skip_python_build: bool,
    /// Skip the package build entirely
    pub skip_packages_build: bool,
}

impl BuildConfig {
    /// Create a configuration with the pinned dependency defaults
    pub fn new(
        target: Target,
        python_version: String,
        build_dir: PathBuf,
        code_dir: PathBuf,
    ) -> Self {
        let runtime_lib_dir = default_runtime_lib_dir(&python_version);
        Self {
            target,
            python_version,
            libffi_version: DEFAULT_LIBFFI_VERSION.to_string(),
            openssl_version: DEFAULT_OPENSSL_VERSION.to_string(),
            ndk_root: None,
            build_dir,
            code_dir,
            source_sha256: None,
            num_jobs: 1,
            runtime_lib_dir,
            skip_python_build: false,
            skip_packages_build: false,
        }
    }

    /// `<major>.<minor>` part of the Python version, as used in path names
    pub fn python_short_version(&self) -> String {
        let mut parts = self.python_version.splitn(3, '.');
        let major = parts.next().unwrap_or("3");
        let minor = parts.next().unwrap_or("0");
        format!("{}.{}", major, minor)
    }

    /// Directory the source archive is extracted into
    pub fn source_dir(&self) -> PathBuf {
        self.build_dir.join("source")
    }

    /// Extracted source tree for the configured version
    pub fn source_root(&self) -> PathBuf {
        self.source_dir()
            .join(format!("Python-{}", self.python_version))
    }

    /// Host-side prefix the prebuilt native dependencies are installed under
    pub fn install_prefix(&self) -> PathBuf {
        self.build_dir.join("prefix")
    }

    /// Staged install tree (DESTDIR) produced by the runtime pipeline
    pub fn install_dir(&self) -> PathBuf {
        self.build_dir.join("install")
    }

    /// Output tree seeded with the stdlib and filled with downloaded packages
    pub fn output_dir(&self) -> PathBuf {
        self.build_dir.join("packages")
    }

    /// Requirements list consumed by the package pipeline
    pub fn requirements_file(&self) -> PathBuf {
        self.code_dir.join("requirements.txt")
    }

    /// Standard library subtree inside a runtime install tree
    pub fn stdlib_dir(&self, install_tree: &Path) -> PathBuf {
        install_tree
            .join("lib")
            .join(format!("python{}", self.python_short_version()))
    }

    /// Archive path for the packaged runtime
    pub fn runtime_archive(&self) -> PathBuf {
        self.build_dir.join(format!(
            "python-{}-{}.tar.gz",
            self.python_version, self.target
        ))
    }

    /// Archive path for the packaged third-party packages
    pub fn packages_archive(&self) -> PathBuf {
        self.build_dir.join(format!(
            "python-packages-{}-{}.tar.gz",
            self.python_version, self.target
        ))
    }
}

/// Default lib-dynload search path on the deployed device
fn default_runtime_lib_dir(python_version: &str) -> String {
    let mut parts = python_version.splitn(3, '.');
    let major = parts.next().unwrap_or("3");
    let minor = parts.next().unwrap_or("0");
    format!("/data/local/python{}.{}/lib-dynload", major, minor)
}
