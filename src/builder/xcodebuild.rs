//! xcodebuild invocation for pod compile steps.

use anyhow::Result;

use crate::builder::context::BuildContext;
use crate::core::errors::ConfigError;
use crate::core::target::CompileStepKey;
use crate::util::process::ProcessBuilder;

/// Build the xcodebuild command compiling `scheme` for `key`.
///
/// The argument order is fixed; the working directory is the pods project.
pub fn compile_command(ctx: &BuildContext, scheme: &str, key: &CompileStepKey) -> Result<ProcessBuilder> {
    let pods_project = ctx
        .pods_project
        .as_ref()
        .ok_or(ConfigError::PodsProjectUnset)?;

    let symroot = ctx.symroot(key.sdk, key.arch);
    let derived_data = ctx.derived_data(&key.module, key.sdk, key.arch);

    let cmd = ProcessBuilder::new(&ctx.xcodebuild)
        .arg("-project")
        .arg(pods_project)
        .arg("-scheme")
        .arg(scheme)
        .arg("-sdk")
        .arg(key.sdk.as_str())
        .arg("-arch")
        .arg(key.arch.as_str())
        .arg("-configuration")
        .arg(ctx.xcode_configuration())
        .arg("-derivedDataPath")
        .arg(&derived_data)
        .arg(format!("SYMROOT={}", symroot.display()))
        .arg("DEPLOYMENT_LOCATION=YES")
        .arg("SKIP_INSTALL=YES")
        .arg("build")
        .cwd(pods_project);

    Ok(cmd)
}
