//! Orchestrated bean metadata

use crate::diagnostics::Diagnostic;
use crate::init_data::{BeanInitData, BeanType};
use ejbmd_common::class_index::{ClassMetadataSource, MethodInfo};
use ejbmd_common::descriptor::{MethodType, RunAsIdentity};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Interface through which a method is invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MethodInterface {
    Remote,
    Home,
    Local,
    LocalHome,
    ServiceEndpoint,
    MessageEndpoint,
}

impl MethodInterface {
    /// Whether an extension method selector of `method_type` names this
    /// interface explicitly. `UNSPECIFIED` never does.
    pub fn matches(self, method_type: MethodType) -> bool {
        matches!(
            (self, method_type),
            (MethodInterface::Remote, MethodType::Remote)
                | (MethodInterface::Home, MethodType::Home)
                | (MethodInterface::Local, MethodType::Local)
                | (MethodInterface::MessageEndpoint, MethodType::Local)
                | (MethodInterface::LocalHome, MethodType::LocalHome)
                | (MethodInterface::ServiceEndpoint, MethodType::ServiceEndpoint)
        )
    }
}

/// Activation policy of a bean instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivationPolicy {
    Transaction,
    ActivitySession,
    Once,
}

/// Resolved run-as identity of a method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunAs {
    CallerIdentity,
    SpecifiedIdentity { role: Option<String> },
    SystemIdentity,
}

impl From<&RunAsIdentity> for RunAs {
    fn from(identity: &RunAsIdentity) -> Self {
        match identity {
            RunAsIdentity::CallerIdentity => RunAs::CallerIdentity,
            RunAsIdentity::SystemIdentity => RunAs::SystemIdentity,
            RunAsIdentity::SpecifiedIdentity { role } => RunAs::SpecifiedIdentity {
                role: role
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(str::to_string),
            },
        }
    }
}

/// One method reachable through one interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EjbMethodMetaData {
    pub interface: MethodInterface,
    pub name: String,
    pub params: Vec<String>,
    pub run_as: Option<RunAs>,
    /// Specificity of the rule that set `run_as` (0 = none)
    #[serde(skip)]
    pub run_as_rank: u8,
}

impl EjbMethodMetaData {
    pub fn new(interface: MethodInterface, method: &MethodInfo) -> Self {
        Self {
            interface,
            name: method.name.clone(),
            params: method.params.clone(),
            run_as: None,
            run_as_rank: 0,
        }
    }
}

/// Bean metadata after binding and policy resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeanMetaData {
    pub name: String,
    pub j2ee_name: String,
    pub class_name: String,
    pub bean_type: BeanType,

    pub component_id: Option<String>,
    pub simple_binding_name: Option<String>,
    pub local_home_binding_name: Option<String>,
    pub remote_home_binding_name: Option<String>,
    /// Interface class name to binding name
    pub business_interface_bindings: BTreeMap<String, String>,

    pub activation_policy: ActivationPolicy,
    pub session_timeout_ms: Option<u64>,

    pub activation_spec_jndi_name: Option<String>,
    pub activation_spec_auth_alias: Option<String>,
    pub destination_jndi_name: Option<String>,
    pub listener_port: Option<String>,

    pub methods: Vec<EjbMethodMetaData>,
}

impl BeanMetaData {
    /// Start from merged data, with methods enumerated per interface.
    pub fn new(bean: &BeanInitData, classes: &dyn ClassMetadataSource) -> Self {
        Self {
            name: bean.name.clone(),
            j2ee_name: bean.j2ee_name.to_string(),
            class_name: bean.class_name.clone(),
            bean_type: bean.bean_type,
            component_id: None,
            simple_binding_name: None,
            local_home_binding_name: None,
            remote_home_binding_name: None,
            business_interface_bindings: BTreeMap::new(),
            activation_policy: ActivationPolicy::Once,
            session_timeout_ms: None,
            activation_spec_jndi_name: None,
            activation_spec_auth_alias: None,
            destination_jndi_name: None,
            listener_port: None,
            methods: enumerate_methods(bean, classes),
        }
    }

    pub fn methods_of(&self, interface: MethodInterface) -> impl Iterator<Item = &EjbMethodMetaData> {
        self.methods.iter().filter(move |m| m.interface == interface)
    }

    /// First method with the given interface and name
    pub fn method(&self, interface: MethodInterface, name: &str) -> Option<&EjbMethodMetaData> {
        self.methods_of(interface).find(|m| m.name == name)
    }
}

/// Module metadata after orchestration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleMetaData {
    pub name: String,
    pub app_name: Option<String>,
    pub beans: Vec<BeanMetaData>,
    /// Downgraded violations and orphan entries
    pub warnings: Vec<Diagnostic>,
}

impl ModuleMetaData {
    pub fn bean(&self, name: &str) -> Option<&BeanMetaData> {
        self.beans.iter().find(|b| b.name == name)
    }
}

fn enumerate_methods(bean: &BeanInitData, classes: &dyn ClassMetadataSource) -> Vec<EjbMethodMetaData> {
    let mut methods = Vec::new();
    let remote = bean
        .remote_business_interfaces
        .iter()
        .chain(bean.remote_interface.iter());
    push_interface_methods(&mut methods, MethodInterface::Remote, remote, classes);
    push_interface_methods(&mut methods, MethodInterface::Home, bean.remote_home_interface.iter(), classes);
    let local = bean
        .local_business_interfaces
        .iter()
        .chain(bean.local_interface.iter());
    push_interface_methods(&mut methods, MethodInterface::Local, local, classes);
    push_interface_methods(
        &mut methods,
        MethodInterface::LocalHome,
        bean.local_home_interface.iter(),
        classes,
    );
    push_interface_methods(
        &mut methods,
        MethodInterface::MessageEndpoint,
        bean.message_listener_interface.iter(),
        classes,
    );

    if bean.local_bean || bean.web_service_endpoint {
        let own = class_methods(&bean.class_name, classes);
        if bean.local_bean {
            methods.extend(own.iter().map(|m| EjbMethodMetaData::new(MethodInterface::Local, m)));
        }
        if bean.web_service_endpoint {
            methods.extend(
                own.iter()
                    .map(|m| EjbMethodMetaData::new(MethodInterface::ServiceEndpoint, m)),
            );
        }
    }

    methods
}

fn push_interface_methods<'a>(
    methods: &mut Vec<EjbMethodMetaData>,
    interface: MethodInterface,
    names: impl Iterator<Item = &'a String>,
    classes: &dyn ClassMetadataSource,
) {
    for name in names {
        for method in interface_methods(name, classes) {
            methods.push(EjbMethodMetaData::new(interface, &method));
        }
    }
}

/// Methods of an interface and everything it extends.
fn interface_methods(name: &str, classes: &dyn ClassMetadataSource) -> Vec<MethodInfo> {
    let mut methods: Vec<MethodInfo> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut pending = vec![name.to_string()];
    while let Some(next) = pending.pop() {
        if !seen.insert(next.clone()) {
            continue;
        }
        let Some(info) = classes.class(&next) else {
            continue;
        };
        for method in &info.methods {
            push_method(&mut methods, method);
        }
        pending.extend(info.interfaces.iter().rev().cloned());
    }
    methods
}

/// Methods of a bean class and its superclasses.
fn class_methods(name: &str, classes: &dyn ClassMetadataSource) -> Vec<MethodInfo> {
    let mut methods: Vec<MethodInfo> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut next = Some(name.to_string());
    while let Some(current) = next {
        if !seen.insert(current.clone()) {
            break;
        }
        let Some(info) = classes.class(&current) else {
            break;
        };
        for method in &info.methods {
            push_method(&mut methods, method);
        }
        next = info.superclass.clone();
    }
    methods
}

/// Overridden methods appear once.
fn push_method(methods: &mut Vec<MethodInfo>, method: &MethodInfo) {
    if !methods
        .iter()
        .any(|m| m.name == method.name && m.params == method.params)
    {
        methods.push(method.clone());
    }
}
