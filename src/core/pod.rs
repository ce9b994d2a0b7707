//! Pod descriptors.
//!
//! A pod is a CocoaPods scheme whose product is a framework named after its
//! module. Descriptors are built with [`PodSpec`] and become immutable once
//! the registry accepts them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::target::{Arch, capitalize};

/// Placeholder for the products root in search path templates.
pub const ROOT_PLACEHOLDER: &str = "{root}";
/// Placeholder for the architecture in search path templates.
pub const ARCH_PLACEHOLDER: &str = "{arch}";
/// Search path used by precompiled pods that do not override it.
pub const DEFAULT_SEARCH_PATH: &str = "{root}/{arch}";

/// Where the framework of a precompiled pod lives for a given architecture.
#[derive(Clone)]
pub enum SearchPathResolver {
    /// Path templates using `{root}` and `{arch}`.
    Templates(Vec<String>),
    /// Arbitrary resolver, for library users.
    Custom(Arc<dyn Fn(&Path, Arch) -> Vec<PathBuf> + Send + Sync>),
}

impl SearchPathResolver {
    pub fn resolve(&self, root: &Path, arch: Arch) -> Vec<PathBuf> {
        match self {
            SearchPathResolver::Templates(templates) => templates
                .iter()
                .map(|t| expand_template(t, root, arch))
                .collect(),
            SearchPathResolver::Custom(f) => f(root, arch),
        }
    }
}

impl Default for SearchPathResolver {
    fn default() -> Self {
        SearchPathResolver::Templates(vec![DEFAULT_SEARCH_PATH.to_string()])
    }
}

impl fmt::Debug for SearchPathResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchPathResolver::Templates(t) => f.debug_tuple("Templates").field(t).finish(),
            SearchPathResolver::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn expand_template(template: &str, root: &Path, arch: Arch) -> PathBuf {
    let root_str = root.to_string_lossy();
    let expanded = template
        .replace(ROOT_PLACEHOLDER, &root_str)
        .replace(ARCH_PLACEHOLDER, arch.as_str());
    let path = PathBuf::from(expanded);
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

/// An immutable, configured pod.
#[derive(Debug, Clone)]
pub struct PodDescriptor {
    scheme: String,
    module: String,
    only_link: bool,
    precompiled: bool,
    extra_modules: Vec<String>,
    extra_linker_opts: Vec<String>,
    search_paths: SearchPathResolver,
    products_root: Option<PathBuf>,
}

impl PodDescriptor {
    pub(crate) fn from_spec(spec: PodSpec, products_root: Option<PathBuf>) -> Self {
        let module = spec.module.unwrap_or_else(|| spec.scheme.clone());
        PodDescriptor {
            scheme: spec.scheme,
            module,
            only_link: spec.only_link,
            precompiled: spec.precompiled,
            extra_modules: spec.extra_modules,
            extra_linker_opts: spec.extra_linker_opts,
            search_paths: spec.search_paths.unwrap_or_default(),
            products_root,
        }
    }

    /// Xcode scheme built by `xcodebuild -scheme`.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Module and framework name.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn only_link(&self) -> bool {
        self.only_link
    }

    pub fn precompiled(&self) -> bool {
        self.precompiled
    }

    /// Whether a compile step must run for this pod.
    pub fn needs_compile(&self) -> bool {
        !self.precompiled
    }

    /// Whether interop bindings are generated for this pod.
    pub fn has_interop(&self) -> bool {
        !self.only_link
    }

    pub fn extra_modules(&self) -> &[String] {
        &self.extra_modules
    }

    pub fn extra_linker_opts(&self) -> &[String] {
        &self.extra_linker_opts
    }

    /// Name of the interop binding, e.g. `cocoapodAFNetworking`.
    pub fn interop_name(&self) -> String {
        format!("cocoapod{}", capitalize(&self.module))
    }

    /// Framework directories of a precompiled pod for `arch`.
    ///
    /// Empty for pods compiled from source.
    pub fn precompiled_search_paths(&self, arch: Arch) -> Vec<PathBuf> {
        match (&self.products_root, self.precompiled) {
            (Some(root), true) => self.search_paths.resolve(root, arch),
            _ => Vec::new(),
        }
    }
}

/// Builder for a pod declaration.
#[derive(Debug, Clone)]
pub struct PodSpec {
    scheme: String,
    module: Option<String>,
    only_link: bool,
    precompiled: bool,
    extra_modules: Vec<String>,
    extra_linker_opts: Vec<String>,
    search_paths: Option<SearchPathResolver>,
}

impl PodSpec {
    /// Declare a pod whose module name equals its scheme.
    pub fn new(scheme: impl Into<String>) -> Self {
        PodSpec {
            scheme: scheme.into(),
            module: None,
            only_link: false,
            precompiled: false,
            extra_modules: Vec::new(),
            extra_linker_opts: Vec::new(),
            search_paths: None,
        }
    }

    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn only_link(mut self, only_link: bool) -> Self {
        self.only_link = only_link;
        self
    }

    pub fn precompiled(mut self, precompiled: bool) -> Self {
        self.precompiled = precompiled;
        self
    }

    pub fn extra_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_modules.extend(modules.into_iter().map(Into::into));
        self
    }

    pub fn extra_linker_opts<I, S>(mut self, opts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_linker_opts.extend(opts.into_iter().map(Into::into));
        self
    }

    pub fn search_paths(mut self, resolver: SearchPathResolver) -> Self {
        self.search_paths = Some(resolver);
        self
    }

    /// Module name the pod will be registered under.
    pub fn module_name(&self) -> &str {
        self.module.as_deref().unwrap_or(&self.scheme)
    }

    pub fn is_precompiled(&self) -> bool {
        self.precompiled
    }
}
