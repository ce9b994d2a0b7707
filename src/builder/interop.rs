//! Interop binding definitions for pods.
//!
//! Each (pod, target) pair gets a `.def` file telling the binding generator
//! which Objective-C module to import and how to link it.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::core::pod::PodDescriptor;
use crate::core::target::NativeTarget;
use crate::util::fs::write_string;

/// Binding definition for one pod on one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteropDescriptor {
    /// Binding name, e.g. `cocoapodAFNetworking`
    pub name: String,
    pub module: String,
    pub target: NativeTarget,
    pub extra_modules: Vec<String>,
    pub extra_linker_opts: Vec<String>,
    /// Framework directories passed as `-F`
    pub search_paths: Vec<PathBuf>,
}

impl InteropDescriptor {
    pub fn new(pod: &PodDescriptor, target: NativeTarget, search_paths: Vec<PathBuf>) -> Self {
        InteropDescriptor {
            name: pod.interop_name(),
            module: pod.module().to_string(),
            target,
            extra_modules: pod.extra_modules().to_vec(),
            extra_linker_opts: pod.extra_linker_opts().to_vec(),
            search_paths,
        }
    }

    /// Render the definition file.
    pub fn render(&self) -> String {
        render_def(&self.module, &self.extra_modules, &self.extra_linker_opts)
    }

    /// Compiler options for the binding generator.
    pub fn compiler_opts(&self) -> Vec<String> {
        self.search_paths
            .iter()
            .map(|p| format!("-F{}", p.display()))
            .collect()
    }

    /// Write the definition file to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        write_string(path, &self.render())
    }
}

/// Render definition text. Depends only on its arguments.
pub fn render_def(module: &str, extra_modules: &[String], extra_linker_opts: &[String]) -> String {
    let modules = std::iter::once(module)
        .chain(extra_modules.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");

    let framework = format!("-framework {}", module);
    let linker_opts = std::iter::once(framework.as_str())
        .chain(extra_linker_opts.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "language = Objective-C\npackage = cocoapods.{}\nmodules = {}\nlinkerOpts = {}\n",
        module, modules, linker_opts
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pod::PodSpec;
    use crate::core::registry::PodRegistry;

    #[test]
    fn test_render_plain_pod() {
        let text = render_def("AFNetworking", &[], &[]);
        assert_eq!(
            text,
            "language = Objective-C\n\
             package = cocoapods.AFNetworking\n\
             modules = AFNetworking\n\
             linkerOpts = -framework AFNetworking\n"
        );
    }

    #[test]
    fn test_render_with_extras() {
        let text = render_def(
            "mokoWidgetsFlat",
            &["Extra".to_string()],
            &["-lz".to_string(), "-framework".to_string(), "UIKit".to_string()],
        );
        assert!(text.contains("modules = mokoWidgetsFlat Extra\n"));
        assert!(text.contains("linkerOpts = -framework mokoWidgetsFlat -lz -framework UIKit\n"));
        assert!(!text.lines().any(|l| l.ends_with(' ')));
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut registry = PodRegistry::new();
        let pod = registry
            .declare(PodSpec::new("AFNetworking").extra_linker_opts(["-lz"]))
            .unwrap();

        let a = InteropDescriptor::new(&pod, NativeTarget::IosArm64, vec![]);
        let b = InteropDescriptor::new(&pod, NativeTarget::IosX64, vec![PathBuf::from("/fw")]);
        assert_eq!(a.render(), b.render());
    }

    #[test]
    fn test_compiler_opts() {
        let mut registry = PodRegistry::new();
        let pod = registry.declare(PodSpec::new("AFNetworking")).unwrap();
        let desc = InteropDescriptor::new(
            &pod,
            NativeTarget::IosArm64,
            vec![PathBuf::from("/proj/build/cocoapods/iphoneos-arm64/UninstalledProducts/iphoneos")],
        );

        assert_eq!(desc.name, "cocoapodAFNetworking");
        assert_eq!(
            desc.compiler_opts(),
            vec!["-F/proj/build/cocoapods/iphoneos-arm64/UninstalledProducts/iphoneos"]
        );
    }

    #[test]
    fn test_write() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut registry = PodRegistry::new();
        let pod = registry.declare(PodSpec::new("AFNetworking")).unwrap();
        let desc = InteropDescriptor::new(&pod, NativeTarget::IosArm64, vec![]);

        let path = tmp.path().join("def/iosArm64/AFNetworking.def");
        desc.write(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), desc.render());
    }
}
