//! Link settings written for each Apple target.
//!
//! The host build reads `build/cocoapods/settings/<target>.json` to learn
//! which frameworks to pass to the linker, which bindings to generate and
//! which environment the simulator tests need.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::builder::interop::InteropDescriptor;
use crate::core::pod::PodDescriptor;
use crate::core::target::{Arch, NativeTarget, Sdk};
use crate::util::fs::write_string;

/// Environment variable that points simulator tests at compiled pods.
pub const SIMULATOR_FRAMEWORK_PATH_ENV: &str = "SIMCTL_CHILD_DYLD_FRAMEWORK_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FrameworkSettings {
    pub name: String,
    /// Exported artifacts resolved for the target's architecture
    pub exports: Vec<String>,
    pub linker_opts: Vec<String>,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CinteropSettings {
    pub name: String,
    pub module: String,
    pub def_file: PathBuf,
    pub compiler_opts: Vec<String>,
}

/// Settings for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TargetSettings {
    pub target: NativeTarget,
    pub sdk: Sdk,
    pub arch: Arch,
    pub framework: FrameworkSettings,
    pub cinterops: Vec<CinteropSettings>,
    pub test_env: BTreeMap<String, String>,
}

impl TargetSettings {
    /// Collect the settings of `target` from its pods and their bindings.
    ///
    /// `interops` must hold the descriptors generated for `target`.
    pub fn new(
        ctx: &BuildContext,
        target: NativeTarget,
        pods: &[&PodDescriptor],
        interops: &[InteropDescriptor],
    ) -> Result<Self, BuildError> {
        let (sdk, arch) = target.pod_sdk_arch()?;
        let exports = ctx.framework.exports_for(arch)?;
        let frameworks_dir = ctx.frameworks_dir(sdk, arch);
        let has_compiled = pods.iter().any(|p| p.needs_compile());

        let mut linker_opts = Vec::new();
        if has_compiled {
            linker_opts.push(format!("-F{}", frameworks_dir.display()));
        }
        for pod in pods.iter().filter(|p| p.only_link() && p.precompiled()) {
            for path in pod.precompiled_search_paths(arch) {
                let opt = format!("-F{}", path.display());
                if !linker_opts.contains(&opt) {
                    linker_opts.push(opt);
                }
            }
        }

        let cinterops = interops
            .iter()
            .filter(|i| i.target == target)
            .map(|i| CinteropSettings {
                name: i.name.clone(),
                module: i.module.clone(),
                def_file: ctx.def_file(target, &i.module),
                compiler_opts: i.compiler_opts(),
            })
            .collect();

        let mut test_env = BTreeMap::new();
        if has_compiled && sdk.is_simulator() {
            test_env.insert(
                SIMULATOR_FRAMEWORK_PATH_ENV.to_string(),
                frameworks_dir.display().to_string(),
            );
        }

        Ok(TargetSettings {
            target,
            sdk,
            arch,
            framework: FrameworkSettings {
                name: ctx.framework.name.clone(),
                exports,
                linker_opts,
                output_dir: ctx.framework_output_dir(target),
            },
            cinterops,
            test_env,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize target settings")
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut json = self.to_json()?;
        json.push('\n');
        write_string(path, &json)
    }
}
