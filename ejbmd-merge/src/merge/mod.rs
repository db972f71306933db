//! Module metadata merge
//!
//! [`ModuleInitDataFactory`] turns one module's descriptors and class
//! metadata into a frozen [`ModuleInitData`].
//!
//! # Stages
//!
//! 1. Descriptor beans (duplicate names are reported and skipped)
//! 2. Annotated components, unless the module is metadata-complete
//! 3. Class resolution, then session type resolution
//! 4. Managed beans on classes no EJB claims
//! 5. Per-bean merge: interface views, transactions, startup,
//!    passivation, message-driven settings, schedule timers
//! 6. Finalize: one aggregate error if anything was recorded
//!
//! A bean that fails a stage skips its later stages; other beans carry on so
//! a single run reports every problem in the module.

mod attributes;
mod bean;
mod interfaces;
mod module;

pub use bean::BeanMergeData;
pub use module::{ClassLookup, ModuleMergeData};

use crate::diagnostics::ErrorKind;
use crate::error::{Error, Result};
use crate::init_data::{BeanType, J2eeName, ModuleInitData};
use ejbmd_common::class_index::{ClassAnnotation, ClassMetadataSource};
use ejbmd_common::config::{RuntimeVersion, TomlConfig};
use ejbmd_common::descriptor::{
    BeanBinding, BeanExtension, EjbJar, EnterpriseBean, ModuleDescriptors, SessionType,
};
use tracing::{debug, info};

/// Prefix of the generated name of an unnamed managed bean
pub const MANAGED_BEAN_NAME_PREFIX: &str = "$ManagedBean$";

/// Problem found by a merge stage for the bean it is working on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeIssue {
    pub kind: ErrorKind,
    pub message: String,
}

impl MergeIssue {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Merge settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactoryOptions {
    pub runtime_version: RuntimeVersion,
    /// Discover managed beans
    pub managed_beans: bool,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self {
            runtime_version: RuntimeVersion::default(),
            managed_beans: true,
        }
    }
}

impl From<&TomlConfig> for FactoryOptions {
    fn from(config: &TomlConfig) -> Self {
        Self {
            runtime_version: config.runtime_version,
            managed_beans: config.managed_beans,
        }
    }
}

/// Builds [`ModuleInitData`] from descriptors and class metadata
#[derive(Debug, Clone, Default)]
pub struct ModuleInitDataFactory {
    options: FactoryOptions,
}

impl ModuleInitDataFactory {
    pub fn new(options: FactoryOptions) -> Self {
        Self { options }
    }

    /// Merge one module.
    ///
    /// Every bean is processed even after an error; if any error was
    /// recorded the result is a single [`Error::Configuration`] listing all
    /// of them.
    pub fn create_module_init_data(
        &self,
        descriptors: ModuleDescriptors,
        classes: &dyn ClassMetadataSource,
    ) -> Result<ModuleInitData> {
        let ejb_jar = descriptors.ejb_jar.as_ref();
        let metadata_complete = ejb_jar.map(EjbJar::is_metadata_complete).unwrap_or(false);
        let logical_name = ejb_jar
            .and_then(|j| j.module_name.as_deref())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&descriptors.module_name)
            .to_string();

        debug!(
            module = %descriptors.module_name,
            metadata_complete,
            version = %self.options.runtime_version,
            "Merging module metadata"
        );

        let mut module = ModuleMergeData::new(
            &descriptors.module_name,
            descriptors.app_name.as_deref(),
            &logical_name,
            metadata_complete,
            classes,
        );

        if let Some(jar) = ejb_jar {
            self.add_descriptor_beans(&mut module, jar);
        }
        if !metadata_complete {
            self.add_annotated_beans(&mut module);
        }
        self.resolve_classes(&mut module);
        self.resolve_session_types(&mut module);
        if self.options.managed_beans {
            self.add_managed_beans(&mut module);
        }
        self.merge_beans(&mut module);

        let has_timers = module.has_timers();
        self.finish(module, &descriptors, has_timers)
    }

    fn add_descriptor_beans(&self, module: &mut ModuleMergeData<'_>, jar: &EjbJar) {
        for enterprise_bean in &jar.enterprise_beans {
            let name = enterprise_bean.ejb_name().to_string();
            if module.contains_bean(&name) {
                module.error(
                    None,
                    ErrorKind::DuplicateEjb,
                    format!("enterprise bean {} is declared more than once", name),
                );
                continue;
            }
            module.add_bean(BeanMergeData::from_descriptor(enterprise_bean));
        }
    }

    fn add_annotated_beans(&self, module: &mut ModuleMergeData<'_>) {
        let component_classes = module.classes().component_classes().to_vec();
        for class_name in &component_classes {
            let Some(class) = module.classes().class(class_name) else {
                continue;
            };
            for annotation in &class.annotations {
                let (bean_type, name) = match annotation {
                    ClassAnnotation::Stateless { name } => (BeanType::Stateless, name),
                    ClassAnnotation::Stateful { name, .. } => (BeanType::Stateful, name),
                    ClassAnnotation::Singleton { name } => (BeanType::Singleton, name),
                    ClassAnnotation::MessageDriven { name, .. } => (BeanType::MessageDriven, name),
                    _ => continue,
                };
                let bean_name = name
                    .as_deref()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| class.simple_name())
                    .to_string();
                self.merge_component_annotation(module, class_name, bean_type, &bean_name);
            }
        }
    }

    /// Reconcile one component-defining annotation with what is already
    /// known about the bean it names.
    fn merge_component_annotation(
        &self,
        module: &mut ModuleMergeData<'_>,
        class_name: &str,
        bean_type: BeanType,
        bean_name: &str,
    ) {
        let Some(existing) = module.bean(bean_name) else {
            let mut bean = BeanMergeData::new(bean_name);
            bean.set_class_name_from_annotation(class_name);
            bean.set_type_from_annotation(bean_type);
            module.add_bean(bean);
            return;
        };

        let existing_class = existing.class_name().map(str::to_string);
        let existing_type = existing.bean_type();
        let issue = match existing.enterprise_bean() {
            Some(xml) => {
                let kind_conflict = match xml {
                    EnterpriseBean::Session(_) => !bean_type.is_session(),
                    EnterpriseBean::MessageDriven(_) => bean_type != BeanType::MessageDriven,
                    EnterpriseBean::Entity(_) => true,
                };
                if kind_conflict {
                    Some(MergeIssue::new(
                        ErrorKind::IncompatibleBeanKind,
                        format!(
                            "class {} is annotated {} but the deployment descriptor declares a different kind of bean",
                            class_name, bean_type
                        ),
                    ))
                } else if existing_type != BeanType::Unknown && existing_type != bean_type {
                    Some(MergeIssue::new(
                        ErrorKind::IncompatibleDescriptorBeanType,
                        format!(
                            "class {} is annotated {} but the deployment descriptor declares {}",
                            class_name, bean_type, existing_type
                        ),
                    ))
                } else {
                    match existing_class.as_deref() {
                        Some(declared) if declared != class_name => Some(MergeIssue::new(
                            ErrorKind::IncompatibleDescriptorClass,
                            format!(
                                "the deployment descriptor declares class {} but the annotation is on {}",
                                declared, class_name
                            ),
                        )),
                        _ => None,
                    }
                }
            }
            None => {
                if existing_class.as_deref() != Some(class_name) {
                    Some(MergeIssue::new(
                        ErrorKind::IncompatibleClassDeclaration,
                        format!(
                            "classes {} and {} both declare this bean",
                            existing_class.as_deref().unwrap_or("?"),
                            class_name
                        ),
                    ))
                } else if existing_type != bean_type {
                    Some(MergeIssue::new(
                        ErrorKind::IncompatibleBeanType,
                        format!(
                            "class {} declares the bean as both {} and {}",
                            class_name, existing_type, bean_type
                        ),
                    ))
                } else {
                    None
                }
            }
        };

        if let Some(issue) = issue {
            module.error(Some(bean_name), issue.kind, issue.message);
            return;
        }

        if let Some(bean) = module.bean_mut(bean_name) {
            if bean.class_name().is_none() {
                bean.set_class_name_from_annotation(class_name);
            }
            if bean.bean_type() == BeanType::Unknown {
                bean.set_type_from_annotation(bean_type);
            }
        }
    }

    fn resolve_classes(&self, module: &mut ModuleMergeData<'_>) {
        let metadata_complete = module.is_metadata_complete();
        let mut problems = Vec::new();
        let mut claimed = Vec::new();

        for bean in module.beans().iter().filter(|b| !b.is_failed()) {
            match bean.class_name() {
                None => problems.push((
                    bean.name().to_string(),
                    MergeIssue::new(
                        ErrorKind::UnspecifiedClass,
                        format!("no class was specified for bean {}", bean.name()),
                    ),
                )),
                Some(class) => {
                    if !metadata_complete && module.classes().class(class).is_none() {
                        problems.push((
                            bean.name().to_string(),
                            MergeIssue::new(
                                ErrorKind::ClassNotFound,
                                format!("class {} of bean {} was not found", class, bean.name()),
                            ),
                        ));
                    }
                    claimed.push(class.to_string());
                }
            }
        }

        for class in claimed {
            module.claim_class(&class);
        }
        for (bean, issue) in problems {
            module.error(Some(&bean), issue.kind, issue.message);
        }
    }

    fn resolve_session_types(&self, module: &mut ModuleMergeData<'_>) {
        let metadata_complete = module.is_metadata_complete();
        let mut resolved = Vec::new();
        let mut unresolved = Vec::new();

        for bean in module.beans().iter().filter(|b| !b.is_failed()) {
            if bean.bean_type() != BeanType::Unknown {
                continue;
            }
            let inferred = if metadata_complete {
                None
            } else {
                bean.class_name()
                    .and_then(|c| module.classes().class(c))
                    .and_then(|class| {
                        let mut types: Vec<SessionType> = Vec::new();
                        for annotation in &class.annotations {
                            let t = match annotation {
                                ClassAnnotation::Stateless { .. } => SessionType::Stateless,
                                ClassAnnotation::Stateful { .. } => SessionType::Stateful,
                                ClassAnnotation::Singleton { .. } => SessionType::Singleton,
                                _ => continue,
                            };
                            if !types.contains(&t) {
                                types.push(t);
                            }
                        }
                        match types.as_slice() {
                            [only] => Some(*only),
                            _ => None,
                        }
                    })
            };
            match inferred {
                Some(t) => resolved.push((bean.name().to_string(), BeanType::from(t))),
                None => unresolved.push(bean.name().to_string()),
            }
        }

        for (name, bean_type) in resolved {
            if let Some(bean) = module.bean_mut(&name) {
                debug!(bean = %name, bean_type = %bean_type, "Session type taken from class annotation");
                bean.set_type_from_annotation(bean_type);
            }
        }
        for name in unresolved {
            module.error(
                Some(&name),
                ErrorKind::UnspecifiedSessionType,
                format!("no session type was specified for bean {}", name),
            );
        }
    }

    fn add_managed_beans(&self, module: &mut ModuleMergeData<'_>) {
        let component_classes = module.classes().component_classes().to_vec();
        for class_name in &component_classes {
            let Some(class) = module.classes().class(class_name) else {
                continue;
            };
            let Some(name) = class.annotations.iter().find_map(|a| match a {
                ClassAnnotation::ManagedBean { name } => Some(name.clone()),
                _ => None,
            }) else {
                continue;
            };
            if module.is_class_claimed(class_name) {
                debug!(class = %class_name, "Managed bean annotation ignored on EJB class");
                continue;
            }

            let bean_name = name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("{}{}", MANAGED_BEAN_NAME_PREFIX, class_name));
            if module.contains_bean(&bean_name) {
                module.error(
                    None,
                    ErrorKind::DuplicateEjb,
                    format!("managed bean {} on class {} duplicates an existing bean name", bean_name, class_name),
                );
                continue;
            }

            let mut bean = BeanMergeData::new(bean_name);
            bean.set_class_name_from_annotation(class_name);
            bean.set_type_from_annotation(BeanType::ManagedBean);
            module.add_bean(bean);
            module.claim_class(class_name);
        }
    }

    fn merge_beans(&self, module: &mut ModuleMergeData<'_>) {
        let metadata_complete = module.is_metadata_complete();
        let compat = self
            .options
            .runtime_version
            .empty_annotation_ignores_explicit_interfaces();

        for index in 0..module.bean_count() {
            let mut issues = Vec::new();
            let name = {
                let Some((bean, classes)) = module.bean_at_mut(index) else {
                    continue;
                };
                if bean.is_failed() {
                    continue;
                }
                let class = if metadata_complete {
                    None
                } else {
                    bean.class_name().and_then(|c| classes.class(c))
                };
                let class = class.as_ref();

                match bean.bean_type() {
                    BeanType::Stateless | BeanType::Stateful | BeanType::Singleton => {
                        interfaces::merge_session_interfaces(bean, class, classes, compat, &mut issues);
                        attributes::merge_transaction(bean, class);
                        if bean.bean_type() == BeanType::Singleton {
                            attributes::merge_singleton(bean, class);
                        }
                        if bean.bean_type() == BeanType::Stateful {
                            attributes::merge_stateful(bean, class, self.options.runtime_version);
                        }
                        attributes::merge_schedule_timers(bean, class, classes);
                    }
                    BeanType::MessageDriven => {
                        attributes::merge_message_driven(bean, class, classes);
                        attributes::merge_transaction(bean, class);
                        attributes::merge_schedule_timers(bean, class, classes);
                    }
                    BeanType::EntityBmp | BeanType::EntityCmp => {
                        interfaces::check_interface_conflicts(bean, &mut issues);
                    }
                    BeanType::ManagedBean | BeanType::Unknown => {}
                }
                bean.name().to_string()
            };

            for issue in issues {
                module.error(Some(&name), issue.kind, issue.message);
            }
        }
    }

    fn finish(
        &self,
        module: ModuleMergeData<'_>,
        descriptors: &ModuleDescriptors,
        has_timers: bool,
    ) -> Result<ModuleInitData> {
        if module.has_errors() {
            let name = module.name().to_string();
            let (_, diagnostics) = module.into_parts();
            info!(
                module = %name,
                errors = diagnostics.error_count(),
                "Module metadata merge failed"
            );
            return Err(Error::Configuration {
                module: name,
                diagnostics,
            });
        }

        let metadata_complete = module.is_metadata_complete();
        let application = module.app_name().unwrap_or(module.name()).to_string();
        let module_name = module.name().to_string();
        let logical_name = module.logical_name().to_string();

        let mut ejb_interceptors: Vec<String> = Vec::new();
        let mut managed_bean_interceptors: Vec<String> = Vec::new();
        for bean in module.beans() {
            let class = bean.class_name().and_then(|c| module.classes().class(c));
            let Some(class) = class else {
                continue;
            };
            if bean.bean_type() == BeanType::ManagedBean {
                extend_unique(&mut managed_bean_interceptors, class.interceptors());
            } else if !metadata_complete {
                extend_unique(&mut ejb_interceptors, class.interceptors());
            }
        }
        if let Some(jar) = &descriptors.ejb_jar {
            extend_unique(&mut ejb_interceptors, &jar.interceptors);
        }
        if let Some(mb_bnd) = &descriptors.managed_bean_bnd {
            extend_unique(&mut managed_bean_interceptors, &mb_bnd.interceptors);
        }

        let (merged, _) = module.into_parts();
        let mut beans = Vec::with_capacity(merged.len());
        for bean in merged {
            let bean_type = bean.bean_type();
            let binding = descriptors
                .ejb_jar_bnd
                .as_ref()
                .and_then(|bnd| find_binding(&bnd.enterprise_beans, bean.name(), bean_type));
            let extension = descriptors
                .ejb_jar_ext
                .as_ref()
                .and_then(|ext| find_extension(&ext.enterprise_beans, bean.name(), bean_type));
            let managed_bean_binding = match (bean_type, &descriptors.managed_bean_bnd, bean.class_name()) {
                (BeanType::ManagedBean, Some(mb_bnd), Some(class)) => mb_bnd.managed_bean(class).cloned(),
                _ => None,
            };
            debug!(
                bean = %bean.name(),
                from_xml = bean.is_from_xml(),
                class_from_annotation = bean.is_class_name_from_annotation(),
                type_from_annotation = bean.is_type_from_annotation(),
                "Freezing bean"
            );
            let j2ee_name = J2eeName::new(&application, &module_name, bean.name());
            if let Some(frozen) = bean.finish(j2ee_name, binding, extension, managed_bean_binding) {
                beans.push(frozen);
            }
        }

        info!(
            module = %module_name,
            beans = beans.len(),
            has_timers,
            "Merged module metadata"
        );

        Ok(ModuleInitData {
            name: module_name,
            app_name: descriptors.app_name.clone(),
            logical_name,
            metadata_complete,
            beans,
            has_timers,
            ejb_interceptors,
            managed_bean_interceptors,
            ejb_jar_bnd: descriptors.ejb_jar_bnd.clone(),
            ejb_jar_ext: descriptors.ejb_jar_ext.clone(),
            managed_bean_bnd: descriptors.managed_bean_bnd.clone(),
        })
    }
}

/// Binding entry for a bean; name and kind must both match.
fn find_binding(entries: &[BeanBinding], name: &str, bean_type: BeanType) -> Option<BeanBinding> {
    entries
        .iter()
        .find(|entry| entry.name() == Some(name) && binding_kind_matches(entry, bean_type))
        .cloned()
}

pub(crate) fn binding_kind_matches(entry: &BeanBinding, bean_type: BeanType) -> bool {
    match entry {
        BeanBinding::Session(_) => bean_type.is_session(),
        BeanBinding::MessageDriven(_) => bean_type == BeanType::MessageDriven,
    }
}

/// Extension entry for a bean; name and kind must both match.
fn find_extension(entries: &[BeanExtension], name: &str, bean_type: BeanType) -> Option<BeanExtension> {
    entries
        .iter()
        .find(|entry| entry.name() == name && extension_kind_matches(entry, bean_type))
        .cloned()
}

pub(crate) fn extension_kind_matches(entry: &BeanExtension, bean_type: BeanType) -> bool {
    match entry {
        BeanExtension::Session(_) => bean_type.is_session(),
        BeanExtension::MessageDriven(_) => bean_type == BeanType::MessageDriven,
    }
}

fn extend_unique(target: &mut Vec<String>, values: &[String]) {
    for value in values {
        if !target.contains(value) {
            target.push(value.clone());
        }
    }
}
