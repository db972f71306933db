//! Managed-bean binding descriptor

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedBeanBnd {
    #[serde(default)]
    pub managed_beans: Vec<ManagedBeanBinding>,

    #[serde(default)]
    pub interceptors: Vec<String>,
}

impl ManagedBeanBnd {
    /// Entry for a managed-bean class.
    pub fn managed_bean(&self, class: &str) -> Option<&ManagedBeanBinding> {
        self.managed_beans.iter().find(|b| b.class == class)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedBeanBinding {
    pub class: String,

    #[serde(default)]
    pub binding_name: Option<String>,
}
