//! Cross-compilation environment composition
//!
//! The composer is pure: it derives every variable from the configuration and
//! target alone, performing no filesystem or process I/O. Both pipelines
//! recompute their environment fresh; nothing edits a composed map afterwards.

use std::collections::BTreeMap;
use std::path::PathBuf;

use pycross_platform::Target;

use crate::config::{ANDROID_API_LEVEL, BuildConfig, NDK_HOST_TAG, NDK_ROOT_VAR};
use crate::error::CoreError;
use crate::Result;

/// Variables passed to the external build tools
///
/// A BTreeMap keeps iteration order deterministic, so identical inputs
/// compose byte-identical environments.
pub type BuildEnvironment = BTreeMap<String, String>;

/// Which pipeline the environment is composed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    /// Runtime configure/make build
    Runtime,
    /// Package download and extension cross-build
    Packages,
}

/// Compose the full variable set for one pipeline
///
/// Fails with `MissingToolchain` when the NDK root is unset; everything else
/// is derived unconditionally.
pub fn compose(config: &BuildConfig, target: Target, kind: PipelineKind) -> Result<BuildEnvironment> {
    let ndk_root = config
        .ndk_root
        .as_ref()
        .ok_or(CoreError::MissingToolchain { var: NDK_ROOT_VAR })?;

    let toolchain = ndk_root
        .join("toolchains/llvm/prebuilt")
        .join(NDK_HOST_TAG);
    let bin = toolchain.join("bin");
    let sysroot = toolchain.join("sysroot");
    let cc = bin.join(target.clang_tool(ANDROID_API_LEVEL));
    let prefix = config.install_prefix();

    let mut env = BuildEnvironment::new();
    env.insert("CC".into(), cc.display().to_string());
    env.insert("CXX".into(), format!("{}++", cc.display()));
    env.insert("AR".into(), bin.join("llvm-ar").display().to_string());
    env.insert("RANLIB".into(), bin.join("llvm-ranlib").display().to_string());
    env.insert("READELF".into(), bin.join("llvm-readelf").display().to_string());
    env.insert("STRIP".into(), bin.join("llvm-strip").display().to_string());

    match kind {
        PipelineKind::Runtime => {
            env.insert("CFLAGS".into(), "-fPIC".into());
            env.insert(
                "LDFLAGS".into(),
                format!(
                    "-R{} -L{}/lib/ -lffi",
                    config.runtime_lib_dir,
                    prefix.display()
                ),
            );
            env.insert(
                "CXXFLAGS".into(),
                "-fPIC -Wl,--export-dynamic -Wl,-lffi".into(),
            );
            env.insert(
                "OPENSSL_INCLUDES".into(),
                format!("{}/include/", prefix.display()),
            );
            env.insert(
                "OPENSSL_LDFLAGS".into(),
                format!("-L{}/lib/", prefix.display()),
            );
            env.insert("OPENSSL_LIBS".into(), "-lcrypto -lssl".into());
            // Cross configure cannot probe the running OpenSSL for this
            // symbol; it is present in the pinned 1.1.1 series.
            env.insert("HAVE_X509_VERIFY_PARAM_SET1_HOST".into(), "1".into());
            env.insert("CONFIG_SITE".into(), "config.site".into());
        }
        PipelineKind::Packages => {
            let sysroot_include = sysroot.join("usr/include");
            let sysroot_lib: PathBuf = sysroot
                .join("usr/lib")
                .join(target.triple())
                .join(ANDROID_API_LEVEL.to_string());

            let cflags = format!(
                "-fPIC -I{}/include -I{}",
                prefix.display(),
                sysroot_include.display()
            );
            env.insert("CFLAGS".into(), cflags.clone());
            env.insert("CPPFLAGS".into(), cflags);
            env.insert(
                "LDFLAGS".into(),
                format!("-L{}/lib -L{}", prefix.display(), sysroot_lib.display()),
            );
            env.insert("LDSHARED".into(), format!("{} -shared", cc.display()));
            env.insert(
                "LD_LIBRARY_PATH".into(),
                prefix.join("lib").display().to_string(),
            );
        }
    }

    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config() -> BuildConfig {
        let mut config = BuildConfig::new(
            Target::AndroidArm64V8a,
            "3.7.16".to_string(),
            PathBuf::from("/work"),
            PathBuf::from("/code"),
        );
        config.ndk_root = Some(PathBuf::from("/opt/ndk"));
        config
    }

    #[test]
    fn test_missing_ndk_root_rejected() {
        let mut config = config();
        config.ndk_root = None;
        let err = compose(&config, config.target, PipelineKind::Runtime).unwrap_err();
        assert!(matches!(err, CoreError::MissingToolchain { .. }));
    }

    #[test]
    fn test_composition_is_pure() {
        let config = config();
        for kind in [PipelineKind::Runtime, PipelineKind::Packages] {
            let first = compose(&config, config.target, kind).unwrap();
            let second = compose(&config, config.target, kind).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_runtime_environment_contents() {
        let config = config();
        let env = compose(&config, config.target, PipelineKind::Runtime).unwrap();

        assert_eq!(env["CFLAGS"], "-fPIC");
        assert_eq!(
            env["LDFLAGS"],
            "-R/data/local/python3.7/lib-dynload -L/work/prefix/lib/ -lffi"
        );
        assert_eq!(env["CXXFLAGS"], "-fPIC -Wl,--export-dynamic -Wl,-lffi");
        assert_eq!(env["OPENSSL_INCLUDES"], "/work/prefix/include/");
        assert_eq!(env["OPENSSL_LDFLAGS"], "-L/work/prefix/lib/");
        assert_eq!(env["OPENSSL_LIBS"], "-lcrypto -lssl");
        assert_eq!(env["HAVE_X509_VERIFY_PARAM_SET1_HOST"], "1");
        assert_eq!(env["CONFIG_SITE"], "config.site");
        assert_eq!(
            env["CC"],
            "/opt/ndk/toolchains/llvm/prebuilt/linux-x86_64/bin/aarch64-linux-android29-clang"
        );
    }

    #[test]
    fn test_packages_environment_contents() {
        let config = config();
        let env = compose(&config, config.target, PipelineKind::Packages).unwrap();

        let sysroot = "/opt/ndk/toolchains/llvm/prebuilt/linux-x86_64/sysroot";
        assert_eq!(
            env["CFLAGS"],
            format!("-fPIC -I/work/prefix/include -I{}/usr/include", sysroot)
        );
        assert_eq!(env["CPPFLAGS"], env["CFLAGS"]);
        assert_eq!(
            env["LDFLAGS"],
            format!(
                "-L/work/prefix/lib -L{}/usr/lib/aarch64-linux-android/29",
                sysroot
            )
        );
        assert_eq!(
            env["LDSHARED"],
            "/opt/ndk/toolchains/llvm/prebuilt/linux-x86_64/bin/aarch64-linux-android29-clang -shared"
        );
        assert_eq!(env["LD_LIBRARY_PATH"], "/work/prefix/lib");
    }

    #[test]
    fn test_x86_64_uses_its_own_triple() {
        let mut config = config();
        config.target = Target::AndroidX86_64;
        let env = compose(&config, config.target, PipelineKind::Runtime).unwrap();
        assert!(env["CC"].ends_with("x86_64-linux-android29-clang"));
    }
}
