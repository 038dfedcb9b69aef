//! Build target and host architecture resolution

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PlatformError;

/// Architecture of the machine running the build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostArch {
    X86_64,
    Aarch64,
}

impl HostArch {
    /// Detect the build machine's architecture at compile time
    #[cfg(target_arch = "x86_64")]
    pub const fn current() -> Self {
        HostArch::X86_64
    }

    #[cfg(target_arch = "aarch64")]
    pub const fn current() -> Self {
        HostArch::Aarch64
    }

    /// GNU build-machine triple for this architecture
    pub const fn build_triple(&self) -> &'static str {
        match self {
            HostArch::X86_64 => "x86_64-pc-linux-gnu",
            HostArch::Aarch64 => "aarch64-pc-linux-gnu",
        }
    }
}

/// A supported cross-compilation target
///
/// The set is closed: every target-specific path and flag in the build is
/// chosen by exhaustively matching on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// Android on x86_64 (emulators)
    AndroidX86_64,
    /// Android on 64-bit ARM (devices)
    AndroidArm64V8a,
}

impl Target {
    /// All supported targets
    pub const ALL: &'static [Target] = &[Target::AndroidX86_64, Target::AndroidArm64V8a];

    /// Logical identifier as accepted on the command line
    pub const fn as_str(&self) -> &'static str {
        match self {
            Target::AndroidX86_64 => "android-x86_64",
            Target::AndroidArm64V8a => "android-arm64-v8a",
        }
    }

    /// GNU target triple passed to configure's --host/--target
    pub const fn triple(&self) -> &'static str {
        match self {
            Target::AndroidX86_64 => "x86_64-linux-android",
            Target::AndroidArm64V8a => "aarch64-linux-android",
        }
    }

    /// Android ABI name used in NDK sysroot and package paths
    pub const fn abi(&self) -> &'static str {
        match self {
            Target::AndroidX86_64 => "x86_64",
            Target::AndroidArm64V8a => "arm64_v8a",
        }
    }

    /// NDK clang driver name for this target at the given API level
    pub fn clang_tool(&self, api_level: u32) -> String {
        format!("{}{}-clang", self.triple(), api_level)
    }

    /// Wheel platform tag accepted for prebuilt package downloads
    pub fn wheel_platform_tag(&self, api_level: u32) -> String {
        format!("android_{}_{}", api_level, self.abi())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Target {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "android-x86_64" => Ok(Target::AndroidX86_64),
            "android-arm64-v8a" => Ok(Target::AndroidArm64V8a),
            other => Err(PlatformError::UnsupportedTarget(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triple_format() {
        for target in Target::ALL {
            let triple = target.triple();
            assert_eq!(
                triple.split('-').count(),
                3,
                "triple '{}' is not <arch>-<vendor>-<os>",
                triple
            );
        }
    }

    #[test]
    fn test_parse_supported_targets() {
        assert_eq!(
            "android-x86_64".parse::<Target>().unwrap(),
            Target::AndroidX86_64
        );
        assert_eq!(
            "android-arm64-v8a".parse::<Target>().unwrap(),
            Target::AndroidArm64V8a
        );
    }

    #[test]
    fn test_parse_round_trips_display() {
        for target in Target::ALL {
            assert_eq!(target.as_str().parse::<Target>().unwrap(), *target);
        }
    }

    #[test]
    fn test_unsupported_target_rejected() {
        let err = "ios-arm64".parse::<Target>().unwrap_err();
        assert!(matches!(err, PlatformError::UnsupportedTarget(_)));
    }

    #[test]
    fn test_build_triple_format() {
        let triple = HostArch::current().build_triple();
        assert!(triple.ends_with("-pc-linux-gnu"));
    }

    #[test]
    fn test_clang_tool_names() {
        assert_eq!(
            Target::AndroidArm64V8a.clang_tool(29),
            "aarch64-linux-android29-clang"
        );
        assert_eq!(
            Target::AndroidX86_64.clang_tool(29),
            "x86_64-linux-android29-clang"
        );
    }

    #[test]
    fn test_wheel_platform_tags() {
        assert_eq!(
            Target::AndroidArm64V8a.wheel_platform_tag(29),
            "android_29_arm64_v8a"
        );
        assert_eq!(
            Target::AndroidX86_64.wheel_platform_tag(29),
            "android_29_x86_64"
        );
    }
}
