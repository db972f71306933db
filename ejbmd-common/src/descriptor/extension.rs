//! Extension descriptor (`ejb-jar-ext`)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EjbJarExt {
    #[serde(default)]
    pub enterprise_beans: Vec<BeanExtension>,
}

/// Per-bean extension entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BeanExtension {
    Session(SessionExtension),
    MessageDriven(MessageDrivenExtension),
}

impl BeanExtension {
    pub fn name(&self) -> &str {
        match self {
            BeanExtension::Session(s) => &s.name,
            BeanExtension::MessageDriven(m) => &m.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BeanExtension::Session(_) => "session",
            BeanExtension::MessageDriven(_) => "message-driven",
        }
    }

    pub fn run_as_modes(&self) -> &[RunAsMode] {
        match self {
            BeanExtension::Session(s) => &s.run_as_modes,
            BeanExtension::MessageDriven(m) => &m.run_as_modes,
        }
    }

    pub fn as_session(&self) -> Option<&SessionExtension> {
        match self {
            BeanExtension::Session(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionExtension {
    pub name: String,

    #[serde(default)]
    pub bean_cache: Option<BeanCache>,

    /// Stateful session timeout in seconds
    #[serde(default)]
    pub time_out: Option<u64>,

    #[serde(default)]
    pub run_as_modes: Vec<RunAsMode>,
}

impl SessionExtension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDrivenExtension {
    pub name: String,

    #[serde(default)]
    pub run_as_modes: Vec<RunAsMode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeanCache {
    #[serde(default)]
    pub activation_policy: Option<ActivationPolicyType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivationPolicyType {
    Once,
    Transaction,
    ActivitySession,
}

/// Run-as identity applied to a set of methods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAsMode {
    pub identity: RunAsIdentity,

    #[serde(default)]
    pub methods: Vec<ExtensionMethod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RunAsIdentity {
    CallerIdentity,
    SpecifiedIdentity {
        #[serde(default)]
        role: Option<String>,
    },
    SystemIdentity,
}

/// Method selector in an extension: `*` or a method name, an interface type
/// and an optional parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionMethod {
    pub name: String,

    #[serde(rename = "type", default)]
    pub method_type: MethodType,

    /// Whitespace and/or comma separated parameter type names
    #[serde(default)]
    pub params: Option<String>,
}

impl ExtensionMethod {
    pub fn new(name: impl Into<String>, method_type: MethodType, params: Option<&str>) -> Self {
        Self {
            name: name.into(),
            method_type,
            params: params.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MethodType {
    #[default]
    Unspecified,
    Remote,
    Home,
    Local,
    LocalHome,
    ServiceEndpoint,
}
