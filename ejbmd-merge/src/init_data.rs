//! Frozen merge results
//!
//! [`ModuleInitData`] is produced once per module by the factory and never
//! mutated afterwards. The orchestrator and the surrounding container only
//! read it.

use ejbmd_common::descriptor::{
    ActivationConfigProperty, BeanBinding, BeanExtension, CmpVersion, EjbJarBnd, EjbJarExt,
    ManagedBeanBinding, ManagedBeanBnd, SessionType,
};
use serde::Serialize;
use std::fmt;

/// Resolved component type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BeanType {
    Stateless,
    Stateful,
    Singleton,
    MessageDriven,
    EntityBmp,
    EntityCmp,
    ManagedBean,
    /// Not yet resolved
    Unknown,
}

impl BeanType {
    pub fn is_session(self) -> bool {
        matches!(self, BeanType::Stateless | BeanType::Stateful | BeanType::Singleton)
    }

    pub fn is_entity(self) -> bool {
        matches!(self, BeanType::EntityBmp | BeanType::EntityCmp)
    }

    /// Short label used in diagnostics
    pub fn label(self) -> &'static str {
        match self {
            BeanType::Stateless => "stateless",
            BeanType::Stateful => "stateful",
            BeanType::Singleton => "singleton",
            BeanType::MessageDriven => "message-driven",
            BeanType::EntityBmp => "entity (bean-managed)",
            BeanType::EntityCmp => "entity (container-managed)",
            BeanType::ManagedBean => "managed bean",
            BeanType::Unknown => "unknown",
        }
    }
}

impl From<SessionType> for BeanType {
    fn from(t: SessionType) -> Self {
        match t {
            SessionType::Stateless => BeanType::Stateless,
            SessionType::Stateful => BeanType::Stateful,
            SessionType::Singleton => BeanType::Singleton,
        }
    }
}

impl fmt::Display for BeanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `app#module#component`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct J2eeName {
    pub application: String,
    pub module: String,
    pub component: String,
}

impl J2eeName {
    pub fn new(application: &str, module: &str, component: &str) -> Self {
        Self {
            application: application.to_string(),
            module: module.to_string(),
            component: component.to_string(),
        }
    }
}

impl fmt::Display for J2eeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}#{}", self.application, self.module, self.component)
    }
}

/// Fully resolved description of one bean
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeanInitData {
    pub name: String,
    pub class_name: String,
    pub j2ee_name: J2eeName,
    pub bean_type: BeanType,

    pub remote_home_interface: Option<String>,
    pub remote_interface: Option<String>,
    pub local_home_interface: Option<String>,
    pub local_interface: Option<String>,
    pub remote_business_interfaces: Vec<String>,
    pub local_business_interfaces: Vec<String>,

    /// No-interface view
    pub local_bean: bool,
    pub web_service_endpoint: bool,
    pub message_listener_interface: Option<String>,

    pub bean_managed_transaction: bool,
    pub startup: bool,
    pub depends_on: Vec<String>,
    pub passivation_capable: bool,

    /// `None` when never evaluated
    pub has_schedule_timers: Option<bool>,
    pub timeout_method: Option<String>,

    pub cmp_version: Option<CmpVersion>,
    pub activation_config: Vec<ActivationConfigProperty>,
    pub message_destination_link: Option<String>,

    /// True when the bean has a deployment descriptor entry
    pub from_xml: bool,

    /// Binding entry matched by name and kind
    pub binding: Option<BeanBinding>,
    /// Extension entry matched by name and kind
    pub extension: Option<BeanExtension>,
    pub managed_bean_binding: Option<ManagedBeanBinding>,
}

impl BeanInitData {
    pub fn is_session(&self) -> bool {
        self.bean_type.is_session()
    }

    pub fn has_remote_home(&self) -> bool {
        self.remote_home_interface.is_some()
    }

    pub fn has_local_home(&self) -> bool {
        self.local_home_interface.is_some()
    }
}

/// Merged description of one module
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleInitData {
    pub name: String,
    pub app_name: Option<String>,
    /// Logical module name from the descriptor, else the module name
    pub logical_name: String,
    pub metadata_complete: bool,
    pub beans: Vec<BeanInitData>,
    pub has_timers: bool,

    pub ejb_interceptors: Vec<String>,
    pub managed_bean_interceptors: Vec<String>,

    pub ejb_jar_bnd: Option<EjbJarBnd>,
    pub ejb_jar_ext: Option<EjbJarExt>,
    pub managed_bean_bnd: Option<ManagedBeanBnd>,
}

impl ModuleInitData {
    pub fn bean(&self, name: &str) -> Option<&BeanInitData> {
        self.beans.iter().find(|b| b.name == name)
    }
}
