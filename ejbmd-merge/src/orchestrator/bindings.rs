//! Custom binding validation
//!
//! Binding names come from the binding descriptor. Each one is trimmed and
//! checked against the interfaces the bean actually exposes. Most
//! violations go through the configured severity policy; a binding for an
//! interface the bean does not have, and a simple binding name mixed with
//! specific ones, always fail.

use super::metadata::BeanMetaData;
use crate::diagnostics::{Diagnostic, ErrorKind};
use crate::error::{Error, Result};
use crate::init_data::{BeanInitData, ModuleInitData};
use ejbmd_common::config::OnError;
use ejbmd_common::descriptor::{MessageDrivenBinding, SessionBinding};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Namespace prefix required on every local binding name
pub const LOCAL_PREFIX: &str = "ejblocal:";

/// Applies the severity policy and collects downgraded violations
pub struct BindingPolicy<'a> {
    on_error: OnError,
    module: &'a str,
    warnings: &'a mut Vec<Diagnostic>,
}

impl<'a> BindingPolicy<'a> {
    pub fn new(on_error: OnError, module: &'a str, warnings: &'a mut Vec<Diagnostic>) -> Self {
        Self {
            on_error,
            module,
            warnings,
        }
    }

    /// Report a policy-governed violation. The caller drops the value
    /// unless this returns an error.
    pub fn violation(&mut self, kind: ErrorKind, bean: &str, message: String) -> Result<()> {
        let diagnostic = Diagnostic::new(kind, self.module, Some(bean), message);
        match self.on_error {
            OnError::Fail => Err(Error::Binding(diagnostic)),
            OnError::Warn => {
                warn!(module = %self.module, bean, code = kind.code(), "{}", diagnostic.message);
                self.warnings.push(diagnostic);
                Ok(())
            }
            OnError::Ignore => {
                debug!(module = %self.module, bean, code = kind.code(), "Ignored: {}", diagnostic.message);
                Ok(())
            }
        }
    }

    /// Violation outside the policy
    pub fn fatal(&self, kind: ErrorKind, bean: &str, message: String) -> Error {
        Error::Binding(Diagnostic::new(kind, self.module, Some(bean), message))
    }

    /// Recorded as a warning whatever the policy
    pub fn warning(&mut self, kind: ErrorKind, bean: Option<&str>, message: String) {
        let diagnostic = Diagnostic::new(kind, self.module, bean, message);
        warn!(
            module = %self.module,
            bean = bean.unwrap_or(""),
            code = kind.code(),
            "{}",
            diagnostic.message
        );
        self.warnings.push(diagnostic);
    }
}

/// Trimmed value, or `None` when empty
pub fn null_if_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate a name bound in the local namespace.
pub fn validate_local_binding(
    policy: &mut BindingPolicy<'_>,
    bean: &str,
    what: &str,
    name: &str,
) -> Result<Option<String>> {
    let name = name.trim();
    if name.is_empty() {
        policy.violation(ErrorKind::BlankJndiBindingName, bean, format!("{} binding name is blank", what))?;
        return Ok(None);
    }
    let Some(rest) = name.strip_prefix(LOCAL_PREFIX) else {
        policy.violation(
            ErrorKind::ImproperLocalJndiBindingPrefix,
            bean,
            format!("{} binding name {} does not begin with {}", what, name, LOCAL_PREFIX),
        )?;
        return Ok(None);
    };
    if rest.trim().is_empty() {
        policy.violation(
            ErrorKind::BlankJndiBindingName,
            bean,
            format!("{} binding name {} has nothing after the prefix", what, name),
        )?;
        return Ok(None);
    }
    if rest.contains(':') {
        policy.violation(
            ErrorKind::NamespaceInLocalJndiBindingName,
            bean,
            format!("{} binding name {} contains a second namespace", what, name),
        )?;
        return Ok(None);
    }
    Ok(Some(name.to_string()))
}

/// Validate a name bound in the remote namespace.
pub fn validate_remote_binding(
    policy: &mut BindingPolicy<'_>,
    bean: &str,
    what: &str,
    name: &str,
) -> Result<Option<String>> {
    let name = name.trim();
    if name.is_empty() {
        policy.violation(ErrorKind::BlankJndiBindingName, bean, format!("{} binding name is blank", what))?;
        return Ok(None);
    }
    if name.starts_with(LOCAL_PREFIX) {
        policy.violation(
            ErrorKind::ImproperRemoteJndiBindingPrefix,
            bean,
            format!("{} binding name {} must not begin with {}", what, name, LOCAL_PREFIX),
        )?;
        return Ok(None);
    }
    if name.contains(':') {
        policy.violation(
            ErrorKind::NamespaceInJndiBindingName,
            bean,
            format!("{} binding name {} contains a namespace", what, name),
        )?;
        return Ok(None);
    }
    Ok(Some(name.to_string()))
}

/// Plain name without namespace: component id and simple binding name.
fn validate_plain_name(
    policy: &mut BindingPolicy<'_>,
    bean: &str,
    what: &str,
    name: &str,
) -> Result<Option<String>> {
    let name = name.trim();
    if name.is_empty() {
        policy.violation(ErrorKind::BlankJndiBindingName, bean, format!("{} is blank", what))?;
        return Ok(None);
    }
    if name.contains(':') {
        policy.violation(
            ErrorKind::NamespaceInJndiBindingName,
            bean,
            format!("{} {} contains a namespace", what, name),
        )?;
        return Ok(None);
    }
    Ok(Some(name.to_string()))
}

/// Trimmed binding value; a blank one is reported and dropped.
fn non_blank<'v>(
    policy: &mut BindingPolicy<'_>,
    bean: &str,
    what: &str,
    value: Option<&'v str>,
) -> Result<Option<&'v str>> {
    match value.map(str::trim) {
        Some("") => {
            policy.violation(ErrorKind::BlankJndiBindingName, bean, format!("{} binding name is blank", what))?;
            Ok(None)
        }
        other => Ok(other),
    }
}

/// Resolve the custom bindings of a session bean.
///
/// Blank values go through the policy first. The combination and
/// corresponding-interface checks only see the values that are left.
pub fn apply_session_binding(
    policy: &mut BindingPolicy<'_>,
    metadata: &mut BeanMetaData,
    bean: &BeanInitData,
    binding: &SessionBinding,
) -> Result<()> {
    let name = bean.name.as_str();

    if let Some(id) = &binding.component_id {
        metadata.component_id = validate_plain_name(policy, name, "component-id", id)?;
    }

    let local_home = non_blank(policy, name, "local home", binding.local_home_binding_name.as_deref())?;
    let remote_home = non_blank(policy, name, "remote home", binding.remote_home_binding_name.as_deref())?;

    let mut interfaces = Vec::with_capacity(binding.interfaces.len());
    for interface in &binding.interfaces {
        let class = match interface.class.trim() {
            "" => bean.class_name.as_str(),
            class => class,
        };
        if let Some(binding_name) = non_blank(policy, name, class, Some(interface.binding_name.as_str()))? {
            interfaces.push((class, binding_name));
        }
    }

    if let Some(simple) = &binding.simple_binding_name {
        if local_home.is_some() || remote_home.is_some() || !interfaces.is_empty() {
            return Err(policy.fatal(
                ErrorKind::InvalidJndiBindingCombination,
                name,
                format!(
                    "simple binding name {} cannot be combined with interface or home bindings",
                    simple.trim()
                ),
            ));
        }
        metadata.simple_binding_name = validate_plain_name(policy, name, "simple binding name", simple)?;
    }

    if let Some(home) = local_home {
        if bean.local_home_interface.is_none() {
            return Err(policy.fatal(
                ErrorKind::JndiBindingHasNoCorrespondingHomeInterface,
                name,
                format!("local home binding {} but the bean has no local home interface", home),
            ));
        }
        metadata.local_home_binding_name = validate_local_binding(policy, name, "local home", home)?;
    }

    if let Some(home) = remote_home {
        if bean.remote_home_interface.is_none() {
            return Err(policy.fatal(
                ErrorKind::JndiBindingHasNoCorrespondingHomeInterface,
                name,
                format!("remote home binding {} but the bean has no remote home interface", home),
            ));
        }
        metadata.remote_home_binding_name = validate_remote_binding(policy, name, "remote home", home)?;
    }

    let mut seen = HashSet::new();
    for (class, binding_name) in interfaces {
        let is_local = bean.local_business_interfaces.iter().any(|i| i == class)
            || (bean.local_bean && class == bean.class_name);
        let is_remote = bean.remote_business_interfaces.iter().any(|i| i == class);
        if !is_local && !is_remote {
            return Err(policy.fatal(
                ErrorKind::JndiBindingHasNoCorrespondingInterface,
                name,
                format!("binding {} names {}, which the bean does not expose", binding_name, class),
            ));
        }

        if !seen.insert(class) {
            policy.violation(
                ErrorKind::MultipleJndiBindingNames,
                name,
                format!("interface {} has more than one binding name", class),
            )?;
            continue;
        }

        let validated = if is_local {
            validate_local_binding(policy, name, class, binding_name)?
        } else {
            validate_remote_binding(policy, name, class, binding_name)?
        };
        if let Some(binding_name) = validated {
            metadata
                .business_interface_bindings
                .insert(class.to_string(), binding_name);
        }
    }

    Ok(())
}

/// Resolve the bindings of a message-driven bean and fill defaults.
pub fn apply_message_driven_binding(
    metadata: &mut BeanMetaData,
    bean: &BeanInitData,
    binding: Option<&MessageDrivenBinding>,
    module: &ModuleInitData,
) {
    if let Some(binding) = binding {
        if let Some(jca) = &binding.jca_adapter {
            metadata.activation_spec_jndi_name = null_if_empty(jca.activation_spec_binding_name.as_deref());
            metadata.activation_spec_auth_alias = null_if_empty(jca.activation_spec_auth_alias.as_deref());
            metadata.destination_jndi_name = null_if_empty(jca.destination_binding_name.as_deref());
        }
        metadata.listener_port = null_if_empty(binding.listener_port.as_deref());
    }

    if metadata.activation_spec_jndi_name.is_none() && metadata.listener_port.is_none() {
        metadata.activation_spec_jndi_name = Some(match &module.app_name {
            Some(app) => format!("{}/{}/{}", app, module.name, bean.name),
            None => format!("{}/{}", module.name, bean.name),
        });
    }

    if metadata.destination_jndi_name.is_none() {
        if let Some(link) = bean.message_destination_link.as_deref() {
            let destination = link.rsplit('#').next().unwrap_or(link);
            let bound = module
                .ejb_jar_bnd
                .as_ref()
                .and_then(|bnd| bnd.message_destination(destination));
            metadata.destination_jndi_name = Some(bound.unwrap_or(destination).to_string());
        }
    }
}
