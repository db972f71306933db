//! Deployment descriptor object model
//!
//! Plain data parsed from the module's descriptors. The merge engine reads
//! these; it never mutates them.
//!
//! - [`EjbJar`]: the standard deployment descriptor
//! - [`EjbJarBnd`]: naming bindings
//! - [`EjbJarExt`]: extensions (bean cache, timeouts, run-as)
//! - [`ManagedBeanBnd`]: managed-bean bindings

mod binding;
mod bundle;
mod extension;
mod managed_bean;

pub use binding::{
    BeanBinding, EjbJarBnd, InterceptorBinding, InterfaceBinding, JcaAdapter,
    MessageDestinationBinding, MessageDrivenBinding, SessionBinding,
};
pub use bundle::{load_module_bundle, ModuleBundle, ModuleDescriptors};
pub use extension::{
    ActivationPolicyType, BeanCache, BeanExtension, EjbJarExt, ExtensionMethod, MessageDrivenExtension,
    MethodType, RunAsIdentity, RunAsMode, SessionExtension,
};
pub use managed_bean::{ManagedBeanBinding, ManagedBeanBnd};

use serde::{Deserialize, Serialize};

/// Session bean flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Stateless,
    Stateful,
    Singleton,
}

/// `transaction-type` element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Bean,
    Container,
}

/// Entity `persistence-type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersistenceType {
    Bean,
    Container,
}

/// Entity `cmp-version`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpVersion {
    #[serde(rename = "1.x")]
    V1,
    #[serde(rename = "2.x")]
    V2,
}

/// Name/value pair of a message-driven activation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationConfigProperty {
    pub name: String,
    pub value: String,
}

impl ActivationConfigProperty {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Declarative timer from the descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    /// Schedule expression as written (e.g. `second=0 minute=*/5`)
    #[serde(default)]
    pub schedule: String,

    #[serde(default)]
    pub timeout_method: Option<String>,
}

/// The standard deployment descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EjbJar {
    /// Descriptor schema version, e.g. "2.1", "3.1"
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub metadata_complete: bool,

    #[serde(default)]
    pub module_name: Option<String>,

    #[serde(default)]
    pub enterprise_beans: Vec<EnterpriseBean>,

    /// Module interceptor classes
    #[serde(default)]
    pub interceptors: Vec<String>,
}

impl EjbJar {
    /// Major/minor version as a comparable number (3.1 -> 31).
    ///
    /// An absent or unparsable version counts as current.
    pub fn version_id(&self) -> u32 {
        self.version
            .as_deref()
            .and_then(parse_version_id)
            .unwrap_or(u32::MAX)
    }

    /// Descriptors before 3.0 carry no annotations, so they are always
    /// complete.
    pub fn is_metadata_complete(&self) -> bool {
        self.metadata_complete || self.version_id() < 30
    }
}

fn parse_version_id(version: &str) -> Option<u32> {
    let mut parts = version.trim().splitn(2, '.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = match parts.next() {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    Some(major * 10 + minor)
}

/// One `enterprise-beans` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EnterpriseBean {
    Session(SessionBean),
    MessageDriven(MessageDrivenBean),
    Entity(EntityBean),
}

impl EnterpriseBean {
    pub fn ejb_name(&self) -> &str {
        match self {
            EnterpriseBean::Session(s) => &s.ejb_name,
            EnterpriseBean::MessageDriven(m) => &m.ejb_name,
            EnterpriseBean::Entity(e) => &e.ejb_name,
        }
    }

    pub fn ejb_class(&self) -> Option<&str> {
        match self {
            EnterpriseBean::Session(s) => s.ejb_class.as_deref(),
            EnterpriseBean::MessageDriven(m) => m.ejb_class.as_deref(),
            EnterpriseBean::Entity(e) => e.ejb_class.as_deref(),
        }
    }

    pub fn as_session(&self) -> Option<&SessionBean> {
        match self {
            EnterpriseBean::Session(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_message_driven(&self) -> Option<&MessageDrivenBean> {
        match self {
            EnterpriseBean::MessageDriven(m) => Some(m),
            _ => None,
        }
    }

    /// `timeout-method` of session and message-driven beans
    pub fn timeout_method(&self) -> Option<&str> {
        match self {
            EnterpriseBean::Session(s) => s.timeout_method.as_deref(),
            EnterpriseBean::MessageDriven(m) => m.timeout_method.as_deref(),
            EnterpriseBean::Entity(_) => None,
        }
    }

    pub fn timers(&self) -> &[Timer] {
        match self {
            EnterpriseBean::Session(s) => &s.timers,
            EnterpriseBean::MessageDriven(m) => &m.timers,
            EnterpriseBean::Entity(_) => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionBean {
    pub ejb_name: String,

    #[serde(default)]
    pub ejb_class: Option<String>,

    #[serde(default)]
    pub session_type: Option<SessionType>,

    #[serde(default)]
    pub home: Option<String>,

    #[serde(default)]
    pub remote: Option<String>,

    #[serde(default)]
    pub local_home: Option<String>,

    #[serde(default)]
    pub local: Option<String>,

    #[serde(default)]
    pub business_remote: Vec<String>,

    #[serde(default)]
    pub business_local: Vec<String>,

    #[serde(default)]
    pub local_bean: bool,

    #[serde(default)]
    pub transaction_type: Option<TransactionType>,

    #[serde(default)]
    pub init_on_startup: Option<bool>,

    #[serde(default)]
    pub depends_on: Vec<String>,

    #[serde(default)]
    pub passivation_capable: Option<bool>,

    #[serde(default)]
    pub timeout_method: Option<String>,

    #[serde(default)]
    pub timers: Vec<Timer>,
}

impl SessionBean {
    pub fn new(ejb_name: impl Into<String>) -> Self {
        Self {
            ejb_name: ejb_name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageDrivenBean {
    pub ejb_name: String,

    #[serde(default)]
    pub ejb_class: Option<String>,

    /// Message listener interface
    #[serde(default)]
    pub messaging_type: Option<String>,

    #[serde(default)]
    pub transaction_type: Option<TransactionType>,

    #[serde(default)]
    pub timeout_method: Option<String>,

    #[serde(default)]
    pub timers: Vec<Timer>,

    #[serde(default)]
    pub activation_config: Vec<ActivationConfigProperty>,

    /// `[module#]destination` link
    #[serde(default)]
    pub message_destination_link: Option<String>,
}

impl MessageDrivenBean {
    pub fn new(ejb_name: impl Into<String>) -> Self {
        Self {
            ejb_name: ejb_name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityBean {
    pub ejb_name: String,

    #[serde(default)]
    pub ejb_class: Option<String>,

    pub persistence_type: PersistenceType,

    #[serde(default)]
    pub cmp_version: Option<CmpVersion>,

    #[serde(default)]
    pub home: Option<String>,

    #[serde(default)]
    pub remote: Option<String>,

    #[serde(default)]
    pub local_home: Option<String>,

    #[serde(default)]
    pub local: Option<String>,
}
