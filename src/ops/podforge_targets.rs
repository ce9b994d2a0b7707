//! Implementation of `podforge targets` and `podforge def`.

use std::fmt::Write;

use anyhow::Result;

use crate::builder::interop::InteropDescriptor;
use crate::builder::BuildContext;
use crate::core::errors::ConfigError;
use crate::core::project::Project;
use crate::core::source_set::{IosMode, TargetSet};
use crate::core::target::NativeTarget;
use crate::ops::podforge_build::resolve_target;

/// Human-readable listing of a target set.
pub fn format_targets(set: &TargetSet) -> String {
    let mut output = String::new();
    let mode = match set.mode {
        IosMode::Shortcut => "ios() shortcut",
        IosMode::Explicit => "explicit iosArm64/iosX64",
    };

    let _ = writeln!(output, "Apple targets ({}):", mode);
    for target in &set.apple_targets {
        let _ = writeln!(output, "  {} ({}/{})", target, target.sdk(), target.arch());
    }

    let _ = writeln!(output, "\nSource sets:");
    for set in set.source_sets.values() {
        if set.depends_on.is_empty() {
            let _ = writeln!(output, "  {} [{}]", set.name, set.root.display());
        } else {
            let _ = writeln!(
                output,
                "  {} [{}] -> {}",
                set.name,
                set.root.display(),
                set.depends_on.join(", ")
            );
        }
    }

    let _ = writeln!(output, "\nAndroid source roots:");
    for (name, root) in &set.android_roots {
        let _ = writeln!(output, "  {} -> {}", name, root.display());
    }
    let _ = writeln!(output, "  manifest -> {}", set.android_manifest.display());

    output
}

/// Render the definition file of `module` for `target` (default: the first
/// enabled target).
pub fn render_def(project: &Project, module: &str, target: Option<&str>) -> Result<String> {
    let registry = project.registry()?;
    let pod = registry
        .get(module)
        .ok_or_else(|| ConfigError::UnknownPod {
            module: module.to_string(),
            available: registry.modules(),
        })?;

    let enabled = project.target_set().apple_targets;
    let target: NativeTarget = match target {
        Some(name) => resolve_target(&enabled, name)?,
        None => enabled
            .first()
            .copied()
            .unwrap_or(NativeTarget::IosArm64),
    };
    let (sdk, arch) = target.pod_sdk_arch()?;

    let ctx = BuildContext::new(project);
    let search_paths = if pod.needs_compile() {
        vec![ctx.frameworks_dir(sdk, arch)]
    } else {
        pod.precompiled_search_paths(arch)
    };

    let interop = InteropDescriptor::new(pod, target, search_paths);
    tracing::debug!("compiler options: {}", interop.compiler_opts().join(" "));
    Ok(interop.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::Manifest;
    use crate::core::source_set::TargetFlags;
    use crate::util::config::Config;
    use std::path::Path;

    fn project(content: &str) -> Project {
        let manifest = Manifest::parse(content, Path::new("/work/app/Podforge.toml")).unwrap();
        Project::from_manifest(manifest, Config::default())
    }

    #[test]
    fn test_format_targets_shortcut() {
        let set = TargetSet::enumerate(&TargetFlags {
            use_ios_shortcut: true,
            include_simulator: true,
            ios_target_warning: false,
        });
        let output = format_targets(&set);

        assert!(output.starts_with("Apple targets (ios() shortcut):"));
        assert!(output.contains("  iosSimulatorArm64 (iphonesimulator/arm64)"));
        assert!(output.contains("  iosArm64Main [src/iosArm64Main] -> iosMain"));
        assert!(output.contains("  manifest -> src/androidMain/AndroidManifest.xml"));
    }

    #[test]
    fn test_render_def_for_module() {
        let project = project(
            r#"
[[cocoapods.pod]]
scheme = "moko-widgets-flat"
module = "mokoWidgetsFlat"
extra-linker-opts = ["-lz"]
"#,
        );

        let text = render_def(&project, "mokoWidgetsFlat", Some("iosX64")).unwrap();
        assert_eq!(
            text,
            "language = Objective-C\n\
             package = cocoapods.mokoWidgetsFlat\n\
             modules = mokoWidgetsFlat\n\
             linkerOpts = -framework mokoWidgetsFlat -lz\n"
        );
    }

    #[test]
    fn test_render_def_unknown_pod() {
        let project = project("[[cocoapods.pod]]\nname = \"AFNetworking\"\n");

        let err = render_def(&project, "Alamofire", None).unwrap_err();
        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::UnknownPod { available, .. }) => {
                assert_eq!(available, &vec!["AFNetworking".to_string()]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
