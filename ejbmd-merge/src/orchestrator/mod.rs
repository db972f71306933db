//! Binding and policy resolution
//!
//! [`EjbMdOrchestrator`] runs after the merge has committed. It reads the
//! frozen [`ModuleInitData`] and produces [`ModuleMetaData`]: validated
//! binding names, activation policies, session timeouts, message-driven
//! bindings and the run-as identity of every method.
//!
//! Policy-governed binding violations are handled per
//! [`OnError`](ejbmd_common::config::OnError): `FAIL` stops at the first
//! one, `WARN` logs it and drops the value, `IGNORE` drops it silently.

pub mod activation;
pub mod bindings;
pub mod metadata;
pub mod run_as;

pub use metadata::{ActivationPolicy, BeanMetaData, EjbMethodMetaData, MethodInterface, ModuleMetaData, RunAs};

use crate::diagnostics::{Diagnostic, ErrorKind};
use crate::error::Result;
use crate::init_data::{BeanInitData, BeanType, ModuleInitData};
use crate::merge::{binding_kind_matches, extension_kind_matches};
use activation::select_activation_policy;
use bindings::{apply_message_driven_binding, apply_session_binding, BindingPolicy};
use ejbmd_common::class_index::ClassMetadataSource;
use ejbmd_common::config::{OnError, TomlConfig};
use ejbmd_common::descriptor::{BeanBinding, BeanExtension};
use run_as::apply_run_as_modes;
use tracing::{debug, info};

/// Orchestrator settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Severity policy for custom binding violations
    pub on_error: OnError,
    /// Stateful session failover enabled
    pub sfsb_failover: bool,
}

impl From<&TomlConfig> for OrchestratorConfig {
    fn from(config: &TomlConfig) -> Self {
        Self {
            on_error: config.custom_bindings_on_error,
            sfsb_failover: config.sfsb_failover,
        }
    }
}

pub struct EjbMdOrchestrator<'a> {
    config: OrchestratorConfig,
    classes: &'a dyn ClassMetadataSource,
}

impl<'a> EjbMdOrchestrator<'a> {
    pub fn new(config: OrchestratorConfig, classes: &'a dyn ClassMetadataSource) -> Self {
        Self { config, classes }
    }

    /// Resolve bindings and policies for every bean of a merged module.
    ///
    /// The input is never modified, so processing the same module twice
    /// yields the same result.
    pub fn process_module(&self, module: &ModuleInitData) -> Result<ModuleMetaData> {
        debug!(
            module = %module.name,
            on_error = %self.config.on_error,
            sfsb_failover = self.config.sfsb_failover,
            "Orchestrating module metadata"
        );

        let mut warnings: Vec<Diagnostic> = Vec::new();
        let mut beans = Vec::with_capacity(module.beans.len());
        {
            let mut policy = BindingPolicy::new(self.config.on_error, &module.name, &mut warnings);
            check_binding_entries(&mut policy, module);
            check_extension_entries(&mut policy, module);

            for bean in &module.beans {
                beans.push(self.process_bean(&mut policy, module, bean)?);
            }
        }

        info!(
            module = %module.name,
            beans = beans.len(),
            warnings = warnings.len(),
            "Orchestrated module metadata"
        );

        Ok(ModuleMetaData {
            name: module.name.clone(),
            app_name: module.app_name.clone(),
            beans,
            warnings,
        })
    }

    fn process_bean(
        &self,
        policy: &mut BindingPolicy<'_>,
        module: &ModuleInitData,
        bean: &BeanInitData,
    ) -> Result<BeanMetaData> {
        let mut metadata = BeanMetaData::new(bean, self.classes);

        match (bean.bean_type, &bean.binding) {
            (t, Some(BeanBinding::Session(binding))) if t.is_session() => {
                apply_session_binding(policy, &mut metadata, bean, binding)?;
            }
            (BeanType::MessageDriven, binding) => {
                let binding = match binding {
                    Some(BeanBinding::MessageDriven(b)) => Some(b),
                    _ => None,
                };
                apply_message_driven_binding(&mut metadata, bean, binding, module);
            }
            _ => {}
        }

        let selection = select_activation_policy(bean, self.config.sfsb_failover);
        if let Some(declared) = selection.downgraded_from {
            policy.warning(
                ErrorKind::ActivationPolicyIgnored,
                Some(bean.name.as_str()),
                format!(
                    "activation policy {:?} ignored, bean is not passivation capable; using {:?}",
                    declared, selection.policy
                ),
            );
        }
        metadata.activation_policy = selection.policy;

        if let Some(BeanExtension::Session(ext)) = &bean.extension {
            if bean.bean_type == BeanType::Stateful {
                metadata.session_timeout_ms = ext.time_out.map(|secs| secs.saturating_mul(1000));
            }
        }

        if let Some(ext) = &bean.extension {
            apply_run_as_modes(&mut metadata.methods, ext.run_as_modes());
        }

        debug!(
            module = %module.name,
            bean = %bean.name,
            activation_policy = ?metadata.activation_policy,
            bindings = metadata.business_interface_bindings.len(),
            methods = metadata.methods.len(),
            "Resolved bean metadata"
        );

        Ok(metadata)
    }
}

/// Binding entries without a name, or naming no bean of the right kind.
fn check_binding_entries(policy: &mut BindingPolicy<'_>, module: &ModuleInitData) {
    let Some(bnd) = &module.ejb_jar_bnd else {
        return;
    };
    for entry in &bnd.enterprise_beans {
        let name = entry.name().map(str::trim).filter(|n| !n.is_empty());
        let Some(name) = name else {
            policy.warning(
                ErrorKind::IncompleteBinding,
                None,
                format!("{} binding entry has no bean name and was skipped", entry.kind()),
            );
            continue;
        };
        let matched = module
            .beans
            .iter()
            .any(|b| b.name == name && binding_kind_matches(entry, b.bean_type));
        if !matched {
            policy.warning(
                ErrorKind::OrphanBindingEntry,
                Some(name),
                format!("{} binding entry names no {} bean in the module", entry.kind(), entry.kind()),
            );
        }
    }
}

fn check_extension_entries(policy: &mut BindingPolicy<'_>, module: &ModuleInitData) {
    let Some(ext) = &module.ejb_jar_ext else {
        return;
    };
    for entry in &ext.enterprise_beans {
        let matched = module
            .beans
            .iter()
            .any(|b| b.name == entry.name() && extension_kind_matches(entry, b.bean_type));
        if !matched {
            policy.warning(
                ErrorKind::OrphanExtensionEntry,
                Some(entry.name()),
                format!("{} extension entry names no {} bean in the module", entry.kind(), entry.kind()),
            );
        }
    }
}
