//! Runtime build pipeline
//!
//! Cross-builds the Python runtime for the configured target:
//! bootstrap-host-python → install-native-deps → fetch-source →
//! stage-config-files → configure → build → stage-install → package.
//!
//! The pipeline's artifact is the staged install directory, which the package
//! pipeline consumes. With `skip_python_build` set, the bootstrap stages still
//! run but the install directory is returned unchanged, so packages can be
//! built against a previously built runtime.

use std::fs;
use std::path::PathBuf;
use tracing::info;

use pycross_platform::HostArch;

use crate::config::BuildConfig;
use crate::env::{self, BuildEnvironment, PipelineKind};
use crate::fetch::ArchiveKind;
use crate::stage::{self, StageResult};
use crate::toolchain::Toolchain;
use crate::Result;

/// Orchestrates the runtime build from host bootstrap to packaged artifact
pub struct RuntimePipeline<'a, T: Toolchain> {
    config: &'a BuildConfig,
    toolchain: &'a T,
    env: BuildEnvironment,
}

impl<'a, T: Toolchain> RuntimePipeline<'a, T> {
    /// Create a pipeline over a fixed configuration
    pub fn new(config: &'a BuildConfig, toolchain: &'a T) -> Self {
        Self {
            config,
            toolchain,
            env: BuildEnvironment::new(),
        }
    }

    /// Run every stage in order; returns the install directory artifact
    pub fn run(&mut self) -> Result<PathBuf> {
        info!(
            target = %self.config.target,
            version = %self.config.python_version,
            "building Python runtime"
        );

        let setup: [(&'static str, fn(&mut Self) -> StageResult); 2] = [
            ("bootstrap-host-python", Self::bootstrap_host_python),
            ("install-native-deps", Self::install_native_deps),
        ];
        for (name, run) in setup {
            stage::run_stage(name, || run(&mut *self))?;
        }

        if self.config.skip_python_build {
            stage::skip_stage("python-build")?;
            info!(
                install_dir = %self.config.install_dir().display(),
                "reusing previously built runtime"
            );
            return Ok(self.config.install_dir());
        }

        self.env = env::compose(self.config, self.config.target, PipelineKind::Runtime)?;

        let build: [(&'static str, fn(&mut Self) -> StageResult); 6] = [
            ("fetch-source", Self::fetch_source),
            ("stage-config-files", Self::stage_config_files),
            ("configure", Self::configure),
            ("build", Self::build),
            ("stage-install", Self::stage_install),
            ("package", Self::package),
        ];
        for (name, run) in build {
            stage::run_stage(name, || run(&mut *self))?;
        }

        Ok(self.config.install_dir())
    }

    /// Install the matching host interpreter; the cross configure step invokes
    /// it to generate build metadata
    fn bootstrap_host_python(&mut self) -> StageResult {
        let env = BuildEnvironment::new();
        self.toolchain.execute(&["apt-get", "update", "-y"], None, &env)?;
        self.toolchain
            .execute(&["add-apt-repository", "ppa:deadsnakes/ppa", "-y"], None, &env)?;

        let python = format!("python{}", self.config.python_short_version());
        let dev = format!("{}-dev", python);
        let distutils = format!("{}-distutils", python);
        let tk = format!("{}-tk", python);
        self.toolchain
            .install_packages(&["pkg-config=0.29.1*", &python, &dev, &distutils, &tk])?;

        let host_python = format!("/usr/bin/{}", python);
        self.toolchain.execute(
            &[
                "update-alternatives",
                "--install",
                "/usr/bin/python3",
                "python3",
                &host_python,
                "1",
            ],
            None,
            &env,
        )?;
        self.toolchain.execute(
            &["update-alternatives", "--set", "python3", &host_python],
            None,
            &env,
        )?;
        Ok(())
    }

    fn install_native_deps(&mut self) -> StageResult {
        self.toolchain
            .install_native_dependency("libffi", &self.config.libffi_version)?;
        self.toolchain
            .install_native_dependency("openssl", &self.config.openssl_version)?;
        Ok(())
    }

    fn fetch_source(&mut self) -> StageResult {
        let version = &self.config.python_version;
        let url = format!(
            "https://www.python.org/ftp/python/{version}/Python-{version}.tgz"
        );
        self.toolchain
            .fetch_source(&url, ArchiveKind::TarGz, &self.config.source_dir())?;
        Ok(())
    }

    /// Inject the build customization: a target-agnostic config.site and a
    /// target-specific setup.py that overwrites the upstream build script
    fn stage_config_files(&mut self) -> StageResult {
        let source_root = self.config.source_root();
        let code_dir = &self.config.code_dir;

        fs::copy(
            code_dir.join("config.site"),
            source_root.join("config.site"),
        )?;
        fs::copy(
            code_dir.join(format!("{}.setup.py", self.config.target)),
            source_root.join("setup.py"),
        )?;
        Ok(())
    }

    fn configure(&mut self) -> StageResult {
        let triple = self.config.target.triple();
        let host = format!("--host={}", triple);
        let build = format!("--build={}", HostArch::current().build_triple());
        let target = format!("--target={}", triple);

        self.toolchain.execute(
            &[
                "./configure",
                "--prefix=/",
                &host,
                &build,
                &target,
                "--enable-shared",
                "--disable-ipv6",
                "--with-system-ffi",
            ],
            Some(&self.config.source_root()),
            &self.env,
        )
    }

    fn build(&mut self) -> StageResult {
        let jobs = self.config.num_jobs.to_string();
        self.toolchain.execute(
            &["make", "-j", &jobs],
            Some(&self.config.source_root()),
            &self.env,
        )
    }

    fn stage_install(&mut self) -> StageResult {
        let destdir = format!("DESTDIR={}", self.config.install_dir().display());
        self.toolchain.execute(
            &["make", &destdir, "install"],
            Some(&self.config.source_root()),
            &self.env,
        )
    }

    fn package(&mut self) -> StageResult {
        self.toolchain
            .create_package(&self.config.install_dir(), &self.config.runtime_archive())
    }
}
