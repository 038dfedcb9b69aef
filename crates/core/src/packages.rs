//! Package build pipeline
//!
//! Downloads and cross-builds the third-party package set against a built
//! runtime: bootstrap-pip → derive-target-triple → compose-environment →
//! reset-output-dir → copy-stdlib → upgrade-pip → download-packages →
//! cross-build-packages → package.
//!
//! The pipeline consumes the install directory produced (or reused) by the
//! runtime pipeline and re-derives its own target triple so it can run
//! standalone against a previously built runtime.

use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::{ANDROID_API_LEVEL, BuildConfig};
use crate::env::{self, BuildEnvironment, PipelineKind};
use crate::error::CoreError;
use crate::fsutil;
use crate::stage::{self, StageResult};
use crate::toolchain::Toolchain;
use crate::Result;

/// Name of the cross-build script expected in the code directory
pub const BUILD_SCRIPT: &str = "build-packages.sh";

/// Orchestrates the package download and cross-build
pub struct PackagePipeline<'a, T: Toolchain> {
    config: &'a BuildConfig,
    toolchain: &'a T,
    /// Artifact of the runtime pipeline: the staged install tree
    runtime_install: PathBuf,
    triple: &'static str,
    env: BuildEnvironment,
}

impl<'a, T: Toolchain> PackagePipeline<'a, T> {
    /// Create a pipeline consuming the runtime pipeline's artifact
    pub fn new(config: &'a BuildConfig, toolchain: &'a T, runtime_install: PathBuf) -> Self {
        Self {
            config,
            toolchain,
            runtime_install,
            triple: "",
            env: BuildEnvironment::new(),
        }
    }

    /// Run every stage in order
    pub fn run(&mut self) -> Result<()> {
        info!(target = %self.config.target, "building Python packages");

        stage::run_stage("bootstrap-pip", || self.bootstrap_pip())?;

        if self.config.skip_packages_build {
            stage::skip_stage("packages-build")?;
            return Ok(());
        }

        let stages: [(&'static str, fn(&mut Self) -> StageResult); 8] = [
            ("derive-target-triple", Self::derive_target_triple),
            ("compose-environment", Self::compose_environment),
            ("reset-output-dir", Self::reset_output_dir),
            ("copy-stdlib", Self::copy_stdlib),
            ("upgrade-pip", Self::upgrade_pip),
            ("download-packages", Self::download_packages),
            ("cross-build-packages", Self::cross_build_packages),
            ("package", Self::package),
        ];
        for (name, run) in stages {
            stage::run_stage(name, || run(&mut *self))?;
        }

        Ok(())
    }

    fn bootstrap_pip(&mut self) -> StageResult {
        self.toolchain.install_packages(&["python3-pip"])
    }

    fn derive_target_triple(&mut self) -> StageResult {
        self.triple = self.config.target.triple();
        debug!(triple = self.triple, "resolved target triple");
        Ok(())
    }

    fn compose_environment(&mut self) -> StageResult {
        self.env = env::compose(self.config, self.config.target, PipelineKind::Packages)?;
        Ok(())
    }

    /// Clear the output directory; nothing from a previous run may survive
    /// before the stdlib seed and downloaded packages land there
    fn reset_output_dir(&mut self) -> StageResult {
        fsutil::reset_dir(&self.config.output_dir())
    }

    fn copy_stdlib(&mut self) -> StageResult {
        let stdlib = self.config.stdlib_dir(&self.runtime_install);
        let dest = self.config.stdlib_dir(&self.config.output_dir());
        info!(from = %stdlib.display(), to = %dest.display(), "seeding output with stdlib");
        fsutil::copy_tree(&stdlib, &dest)
    }

    fn upgrade_pip(&mut self) -> StageResult {
        self.toolchain.execute(
            &["python3", "-m", "pip", "install", "--upgrade", "pip"],
            None,
            &self.env,
        )
    }

    /// Download every listed requirement as a wheel for the target platform
    /// tag; resolution and installation stay on the target
    fn download_packages(&mut self) -> StageResult {
        let requirements = self.config.requirements_file();
        let requirements_arg = requirements.display().to_string();
        let platform_tag = self.config.target.wheel_platform_tag(ANDROID_API_LEVEL);
        let dest = self.config.output_dir().display().to_string();

        let result = self.toolchain.execute(
            &[
                "python3",
                "-m",
                "pip",
                "download",
                "-r",
                &requirements_arg,
                "--platform",
                &platform_tag,
                "--only-binary=:all:",
                "--no-deps",
                "-d",
                &dest,
            ],
            None,
            &self.env,
        );

        match result {
            Err(CoreError::CommandFailed { .. }) => Err(CoreError::DependencyDownload {
                requirements: requirements_arg,
            }),
            other => other,
        }
    }

    /// Hand the downloaded set to the external build script, which compiles
    /// any native extension modules for the target triple
    fn cross_build_packages(&mut self) -> StageResult {
        let script = self.config.code_dir.join(BUILD_SCRIPT);
        let script_arg = script.display().to_string();
        let output = self.config.output_dir();
        let output_arg = output.display().to_string();

        self.toolchain.execute(
            &[&script_arg, &output_arg, self.triple],
            Some(&output),
            &self.env,
        )
    }

    fn package(&mut self) -> StageResult {
        self.toolchain
            .create_package(&self.config.output_dir(), &self.config.packages_archive())
    }
}
