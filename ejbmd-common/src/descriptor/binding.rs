//! Binding descriptor (`ejb-jar-bnd`)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EjbJarBnd {
    #[serde(default)]
    pub enterprise_beans: Vec<BeanBinding>,

    #[serde(default)]
    pub message_destinations: Vec<MessageDestinationBinding>,

    #[serde(default)]
    pub interceptors: Vec<InterceptorBinding>,
}

impl EjbJarBnd {
    /// Binding name of a module message destination.
    pub fn message_destination(&self, name: &str) -> Option<&str> {
        self.message_destinations
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.binding_name.as_str())
    }
}

/// Per-bean binding entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BeanBinding {
    Session(SessionBinding),
    MessageDriven(MessageDrivenBinding),
}

impl BeanBinding {
    /// Entry name; an entry without one is incomplete.
    pub fn name(&self) -> Option<&str> {
        match self {
            BeanBinding::Session(s) => s.name.as_deref(),
            BeanBinding::MessageDriven(m) => m.name.as_deref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BeanBinding::Session(_) => "session",
            BeanBinding::MessageDriven(_) => "message-driven",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBinding {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub component_id: Option<String>,

    #[serde(default)]
    pub simple_binding_name: Option<String>,

    #[serde(default)]
    pub local_home_binding_name: Option<String>,

    #[serde(default)]
    pub remote_home_binding_name: Option<String>,

    #[serde(default)]
    pub interfaces: Vec<InterfaceBinding>,
}

impl SessionBinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Builder-style helper for an interface binding
    pub fn with_interface(mut self, class: impl Into<String>, binding_name: impl Into<String>) -> Self {
        self.interfaces.push(InterfaceBinding {
            class: class.into(),
            binding_name: binding_name.into(),
        });
        self
    }
}

/// Binding of one business interface (an empty class names the no-interface view)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceBinding {
    #[serde(default)]
    pub class: String,

    #[serde(default)]
    pub binding_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDrivenBinding {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub jca_adapter: Option<JcaAdapter>,

    #[serde(default)]
    pub listener_port: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JcaAdapter {
    #[serde(default)]
    pub activation_spec_binding_name: Option<String>,

    #[serde(default)]
    pub activation_spec_auth_alias: Option<String>,

    #[serde(default)]
    pub destination_binding_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDestinationBinding {
    pub name: String,
    pub binding_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptorBinding {
    pub class: String,
}
