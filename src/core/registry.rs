//! Pod descriptor registry.
//!
//! Declared pods are kept in declaration order, keyed by module name.
//! Interested parties subscribe once and see every descriptor exactly once,
//! including those declared before they subscribed.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::core::errors::ConfigError;
use crate::core::pod::{PodDescriptor, PodSpec};

static MODULE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("module name pattern"));

/// Check that `name` can be used as an Objective-C module name.
pub fn is_valid_module_name(name: &str) -> bool {
    MODULE_NAME.is_match(name)
}

type Subscriber = Box<dyn FnMut(&Arc<PodDescriptor>) + Send>;

/// The set of declared pods.
#[derive(Default)]
pub struct PodRegistry {
    products_root: Option<PathBuf>,
    pods: Vec<Arc<PodDescriptor>>,
    subscribers: Vec<Subscriber>,
}

impl PodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose precompiled pods are resolved below `root`.
    pub fn with_products_root(root: impl Into<PathBuf>) -> Self {
        PodRegistry {
            products_root: Some(root.into()),
            ..Self::default()
        }
    }

    pub fn products_root(&self) -> Option<&Path> {
        self.products_root.as_deref()
    }

    /// Declare a pod.
    ///
    /// A pod whose module is already declared replaces the earlier one in
    /// place. Every subscriber is notified with the new descriptor. Modules
    /// that differ from a declared one only by case are rejected.
    pub fn declare(&mut self, spec: PodSpec) -> Result<Arc<PodDescriptor>, ConfigError> {
        let module = spec.module_name().to_string();
        if !is_valid_module_name(&module) {
            return Err(ConfigError::InvalidModuleName { name: module });
        }
        if let Some(existing) = self
            .pods
            .iter()
            .map(|p| p.module())
            .find(|m| *m != module && m.eq_ignore_ascii_case(&module))
        {
            return Err(ConfigError::ModuleNameClash {
                name: module,
                existing: existing.to_string(),
            });
        }
        if spec.is_precompiled() && self.products_root.is_none() {
            return Err(ConfigError::ProductsRootUnset { module });
        }

        let pod = Arc::new(PodDescriptor::from_spec(spec, self.products_root.clone()));

        match self.pods.iter().position(|p| p.module() == pod.module()) {
            Some(index) => {
                tracing::debug!("redeclared pod `{}`", pod.module());
                self.pods[index] = Arc::clone(&pod);
            }
            None => {
                tracing::debug!("declared pod `{}` (scheme {})", pod.module(), pod.scheme());
                self.pods.push(Arc::clone(&pod));
            }
        }

        for subscriber in &mut self.subscribers {
            subscriber(&pod);
        }

        Ok(pod)
    }

    /// Register a callback for configured pods.
    ///
    /// The callback is first replayed with every pod already declared.
    pub fn subscribe<F>(&mut self, mut callback: F)
    where
        F: FnMut(&Arc<PodDescriptor>) + Send + 'static,
    {
        for pod in &self.pods {
            callback(pod);
        }
        self.subscribers.push(Box::new(callback));
    }

    pub fn get(&self, module: &str) -> Option<&Arc<PodDescriptor>> {
        self.pods.iter().find(|p| p.module() == module)
    }

    /// Declared pods in declaration order.
    pub fn pods(&self) -> &[Arc<PodDescriptor>] {
        &self.pods
    }

    pub fn modules(&self) -> Vec<String> {
        self.pods.iter().map(|p| p.module().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.pods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pods.is_empty()
    }
}

impl std::fmt::Debug for PodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PodRegistry")
            .field("products_root", &self.products_root)
            .field("pods", &self.pods)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
