//! Module bundle file
//!
//! A single TOML or JSON document carrying one module's descriptors and the
//! class metadata scanned from it. The format is chosen by file extension;
//! anything other than `.json` is read as TOML.

use super::{EjbJar, EjbJarBnd, EjbJarExt, ManagedBeanBnd};
use crate::class_index::{ClassInfo, InMemoryClassIndex};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Descriptors of one module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescriptors {
    /// Enclosing application, absent for a stand-alone module
    #[serde(default)]
    pub app_name: Option<String>,

    pub module_name: String,

    #[serde(default)]
    pub ejb_jar: Option<EjbJar>,

    #[serde(default)]
    pub ejb_jar_bnd: Option<EjbJarBnd>,

    #[serde(default)]
    pub ejb_jar_ext: Option<EjbJarExt>,

    #[serde(default)]
    pub managed_bean_bnd: Option<ManagedBeanBnd>,
}

impl ModuleDescriptors {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            ..Default::default()
        }
    }
}

/// Descriptors plus class metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleBundle {
    #[serde(flatten)]
    pub descriptors: ModuleDescriptors,

    #[serde(default)]
    pub classes: Vec<ClassInfo>,
}

impl ModuleBundle {
    /// Split into descriptors and an index over the classes.
    pub fn into_parts(self) -> (ModuleDescriptors, InMemoryClassIndex) {
        let index = self.classes.into_iter().collect();
        (self.descriptors, index)
    }
}

/// Read a bundle from disk.
pub fn load_module_bundle(path: &Path) -> Result<ModuleBundle> {
    let content = std::fs::read_to_string(path)?;
    let bundle: ModuleBundle = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => toml::from_str(&content)?,
    };

    if bundle.descriptors.module_name.trim().is_empty() {
        return Err(Error::InvalidInput(format!(
            "{}: module_name must not be blank",
            path.display()
        )));
    }

    debug!(
        module = %bundle.descriptors.module_name,
        classes = bundle.classes.len(),
        "Loaded module bundle from {}",
        path.display()
    );
    Ok(bundle)
}
