//! Native build targets and the (SDK, architecture) pairs they compile for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::builder::errors::BuildError;

/// Apple SDK passed to `xcodebuild -sdk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sdk {
    #[serde(rename = "iphoneos")]
    IphoneOs,
    #[serde(rename = "iphonesimulator")]
    IphoneSimulator,
    #[serde(rename = "macosx")]
    MacOsX,
}

impl Sdk {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sdk::IphoneOs => "iphoneos",
            Sdk::IphoneSimulator => "iphonesimulator",
            Sdk::MacOsX => "macosx",
        }
    }

    /// Whether binaries built for this SDK run in the simulator.
    pub fn is_simulator(&self) -> bool {
        matches!(self, Sdk::IphoneSimulator)
    }
}

impl fmt::Display for Sdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sdk {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "iphoneos" => Ok(Sdk::IphoneOs),
            "iphonesimulator" => Ok(Sdk::IphoneSimulator),
            "macosx" => Ok(Sdk::MacOsX),
            _ => Err(format!(
                "unknown sdk '{}'; expected 'iphoneos', 'iphonesimulator' or 'macosx'",
                s
            )),
        }
    }
}

/// CPU architecture passed to `xcodebuild -arch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Arch {
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "x86_64")]
    X86_64,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Arm64 => "arm64",
            Arch::X86_64 => "x86_64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "arm64" => Ok(Arch::Arm64),
            "x86_64" | "x64" => Ok(Arch::X86_64),
            _ => Err(format!("unknown architecture '{}'; expected 'arm64' or 'x86_64'", s)),
        }
    }
}

/// A native target of the multiplatform build.
///
/// Only the iOS targets can compile pods; the macOS targets are recognised so
/// that a manifest naming them fails with a precise error instead of an
/// unknown-name error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NativeTarget {
    #[serde(rename = "iosArm64")]
    IosArm64,
    #[serde(rename = "iosX64")]
    IosX64,
    #[serde(rename = "iosSimulatorArm64")]
    IosSimulatorArm64,
    #[serde(rename = "macosX64")]
    MacosX64,
    #[serde(rename = "macosArm64")]
    MacosArm64,
}

impl NativeTarget {
    /// Name as used for source sets and step names (`iosArm64`).
    pub fn name(&self) -> &'static str {
        match self {
            NativeTarget::IosArm64 => "iosArm64",
            NativeTarget::IosX64 => "iosX64",
            NativeTarget::IosSimulatorArm64 => "iosSimulatorArm64",
            NativeTarget::MacosX64 => "macosX64",
            NativeTarget::MacosArm64 => "macosArm64",
        }
    }

    pub fn arch(&self) -> Arch {
        match self {
            NativeTarget::IosArm64 | NativeTarget::IosSimulatorArm64 | NativeTarget::MacosArm64 => {
                Arch::Arm64
            }
            NativeTarget::IosX64 | NativeTarget::MacosX64 => Arch::X86_64,
        }
    }

    pub fn sdk(&self) -> Sdk {
        match self {
            NativeTarget::IosArm64 => Sdk::IphoneOs,
            NativeTarget::IosX64 | NativeTarget::IosSimulatorArm64 => Sdk::IphoneSimulator,
            NativeTarget::MacosX64 | NativeTarget::MacosArm64 => Sdk::MacOsX,
        }
    }

    /// The (sdk, arch) pair pods are compiled with for this target.
    pub fn pod_sdk_arch(&self) -> Result<(Sdk, Arch), BuildError> {
        let (sdk, arch) = (self.sdk(), self.arch());
        ensure_supported(sdk, arch)?;
        Ok((sdk, arch))
    }

    /// All known targets, in declaration order.
    pub fn all() -> &'static [NativeTarget] {
        &[
            NativeTarget::IosArm64,
            NativeTarget::IosX64,
            NativeTarget::IosSimulatorArm64,
            NativeTarget::MacosX64,
            NativeTarget::MacosArm64,
        ]
    }
}

impl fmt::Display for NativeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NativeTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NativeTarget::all()
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<_> = NativeTarget::all().iter().map(|t| t.name()).collect();
                format!("unknown target '{}'; expected one of: {}", s, names.join(", "))
            })
    }
}

const SUPPORTED: &[(Sdk, Arch)] = &[
    (Sdk::IphoneOs, Arch::Arm64),
    (Sdk::IphoneSimulator, Arch::X86_64),
    (Sdk::IphoneSimulator, Arch::Arm64),
];

/// Reject (sdk, arch) combinations pods cannot be compiled for.
pub fn ensure_supported(sdk: Sdk, arch: Arch) -> Result<(), BuildError> {
    if SUPPORTED.contains(&(sdk, arch)) {
        Ok(())
    } else {
        Err(BuildError::UnsupportedTarget {
            sdk: sdk.to_string(),
            arch: arch.to_string(),
        })
    }
}

/// Identity of a pod compile step: one per (pod module, sdk, arch).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompileStepKey {
    pub module: String,
    pub sdk: Sdk,
    pub arch: Arch,
}

impl CompileStepKey {
    pub fn new(module: impl Into<String>, sdk: Sdk, arch: Arch) -> Result<Self, BuildError> {
        ensure_supported(sdk, arch)?;
        Ok(CompileStepKey {
            module: module.into(),
            sdk,
            arch,
        })
    }

    /// Step name, e.g. `cocoapodBuildAFNetworkingIphoneosArm64`.
    pub fn step_name(&self) -> String {
        format!(
            "cocoapodBuild{}{}{}",
            capitalize(&self.module),
            capitalize(self.sdk.as_str()),
            capitalize(self.arch.as_str())
        )
    }
}

impl fmt::Display for CompileStepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.module, self.sdk, self.arch)
    }
}

/// Upper-case the first character.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ios_targets_map_to_sdk_arch() {
        assert_eq!(
            NativeTarget::IosArm64.pod_sdk_arch().unwrap(),
            (Sdk::IphoneOs, Arch::Arm64)
        );
        assert_eq!(
            NativeTarget::IosX64.pod_sdk_arch().unwrap(),
            (Sdk::IphoneSimulator, Arch::X86_64)
        );
        assert_eq!(
            NativeTarget::IosSimulatorArm64.pod_sdk_arch().unwrap(),
            (Sdk::IphoneSimulator, Arch::Arm64)
        );
    }

    #[test]
    fn test_macos_target_is_unsupported() {
        let err = NativeTarget::MacosX64.pod_sdk_arch().unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedTarget { .. }));
    }

    #[test]
    fn test_compile_step_key_rejects_device_x86_64() {
        let err = CompileStepKey::new("AFNetworking", Sdk::IphoneOs, Arch::X86_64).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported sdk/architecture combination: iphoneos/x86_64"
        );
    }

    #[test]
    fn test_step_name() {
        let key = CompileStepKey::new("AFNetworking", Sdk::IphoneSimulator, Arch::X86_64).unwrap();
        assert_eq!(key.step_name(), "cocoapodBuildAFNetworkingIphonesimulatorX86_64");
    }

    #[test]
    fn test_target_from_str() {
        assert_eq!("iosArm64".parse::<NativeTarget>().unwrap(), NativeTarget::IosArm64);
        assert_eq!(
            "iossimulatorarm64".parse::<NativeTarget>().unwrap(),
            NativeTarget::IosSimulatorArm64
        );
        assert!("android".parse::<NativeTarget>().is_err());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("debug"), "Debug");
        assert_eq!(capitalize("x86_64"), "X86_64");
        assert_eq!(capitalize(""), "");
    }
}
