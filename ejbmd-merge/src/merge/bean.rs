//! Per-bean merge ledger
//!
//! [`BeanMergeData`] accumulates facts about one bean from the deployment
//! descriptor and from annotations. Every field that two sources may both
//! claim carries provenance, so a later stage can tell "set from XML",
//! "set from an annotation" and "never set" apart. Nothing is defaulted
//! until [`BeanMergeData::finish`].

use crate::init_data::{BeanInitData, BeanType, J2eeName};
use ejbmd_common::descriptor::{
    ActivationConfigProperty, BeanBinding, BeanExtension, CmpVersion, EnterpriseBean,
    ManagedBeanBinding, PersistenceType, TransactionType,
};

#[derive(Debug, Clone)]
pub struct BeanMergeData {
    name: String,
    enterprise_bean: Option<EnterpriseBean>,

    class_name: Option<String>,
    class_name_from_annotation: bool,
    bean_type: BeanType,
    type_from_annotation: bool,

    remote_home: Option<String>,
    remote: Option<String>,
    local_home: Option<String>,
    local: Option<String>,
    remote_business: Vec<String>,
    local_business: Vec<String>,
    local_bean: bool,
    web_service: bool,
    message_listener: Option<String>,

    bean_managed_transaction: bool,
    set_bean_managed_transaction: bool,
    startup: bool,
    set_startup: bool,
    passivation_capable: bool,
    set_passivation_capable: bool,
    depends_on: Option<Vec<String>>,

    has_schedule_timers: Option<bool>,
    timeout_method: Option<String>,
    cmp_version: Option<CmpVersion>,
    activation_config: Vec<ActivationConfigProperty>,
    message_destination_link: Option<String>,

    failed: bool,
}

impl BeanMergeData {
    /// Bean discovered from an annotation only
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enterprise_bean: None,
            class_name: None,
            class_name_from_annotation: false,
            bean_type: BeanType::Unknown,
            type_from_annotation: false,
            remote_home: None,
            remote: None,
            local_home: None,
            local: None,
            remote_business: Vec::new(),
            local_business: Vec::new(),
            local_bean: false,
            web_service: false,
            message_listener: None,
            bean_managed_transaction: false,
            set_bean_managed_transaction: false,
            startup: false,
            set_startup: false,
            passivation_capable: true,
            set_passivation_capable: false,
            depends_on: None,
            has_schedule_timers: None,
            timeout_method: None,
            cmp_version: None,
            activation_config: Vec::new(),
            message_destination_link: None,
            failed: false,
        }
    }

    /// Bean declared in the deployment descriptor.
    ///
    /// Copies every fact the descriptor states; the type stays
    /// [`BeanType::Unknown`] for a session bean without a session type.
    pub fn from_descriptor(bean: &EnterpriseBean) -> Self {
        let mut data = Self::new(bean.ejb_name());
        if let Some(class) = bean.ejb_class() {
            data.set_class_name(class);
        }

        match bean {
            EnterpriseBean::Session(s) => {
                if let Some(session_type) = s.session_type {
                    data.set_type(session_type.into());
                }
                data.remote_home = s.home.clone();
                data.remote = s.remote.clone();
                data.local_home = s.local_home.clone();
                data.local = s.local.clone();
                for name in &s.business_remote {
                    data.add_remote_business_interface(name);
                }
                for name in &s.business_local {
                    data.add_local_business_interface(name);
                }
                if s.local_bean {
                    data.set_local_bean();
                }
                if let Some(tx) = s.transaction_type {
                    data.set_bean_managed_transaction(tx == TransactionType::Bean);
                }
                if let Some(startup) = s.init_on_startup {
                    data.set_startup(startup);
                }
                if !s.depends_on.is_empty() {
                    data.set_depends_on(s.depends_on.clone());
                }
                if let Some(capable) = s.passivation_capable {
                    data.set_passivation_capable(capable);
                }
            }
            EnterpriseBean::MessageDriven(m) => {
                data.set_type(BeanType::MessageDriven);
                data.message_listener = m.messaging_type.clone();
                if let Some(tx) = m.transaction_type {
                    data.set_bean_managed_transaction(tx == TransactionType::Bean);
                }
                for property in &m.activation_config {
                    data.put_activation_config(property.clone());
                }
                data.message_destination_link = m.message_destination_link.clone();
            }
            EnterpriseBean::Entity(e) => {
                data.set_type(match e.persistence_type {
                    PersistenceType::Bean => BeanType::EntityBmp,
                    PersistenceType::Container => BeanType::EntityCmp,
                });
                data.cmp_version = e.cmp_version;
                data.remote_home = e.home.clone();
                data.remote = e.remote.clone();
                data.local_home = e.local_home.clone();
                data.local = e.local.clone();
            }
        }

        data.timeout_method = bean.timeout_method().map(str::to_string);
        if !bean.timers().is_empty() {
            data.has_schedule_timers = Some(true);
        }
        data.enterprise_bean = Some(bean.clone());
        data
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Descriptor entry, if the bean has one
    pub fn enterprise_bean(&self) -> Option<&EnterpriseBean> {
        self.enterprise_bean.as_ref()
    }

    pub(crate) fn is_from_xml(&self) -> bool {
        self.enterprise_bean.is_some()
    }

    // --- identity ---

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn set_class_name(&mut self, class_name: &str) {
        self.class_name = Some(class_name.to_string());
    }

    pub fn set_class_name_from_annotation(&mut self, class_name: &str) {
        self.set_class_name(class_name);
        self.class_name_from_annotation = true;
    }

    pub(crate) fn is_class_name_from_annotation(&self) -> bool {
        self.class_name_from_annotation
    }

    pub fn bean_type(&self) -> BeanType {
        self.bean_type
    }

    pub fn set_type(&mut self, bean_type: BeanType) {
        self.bean_type = bean_type;
    }

    pub fn set_type_from_annotation(&mut self, bean_type: BeanType) {
        self.set_type(bean_type);
        self.type_from_annotation = true;
    }

    pub(crate) fn is_type_from_annotation(&self) -> bool {
        self.type_from_annotation
    }

    // --- interface views ---

    pub fn remote_home_interface(&self) -> Option<&str> {
        self.remote_home.as_deref()
    }

    pub fn local_home_interface(&self) -> Option<&str> {
        self.local_home.as_deref()
    }

    /// First writer wins.
    pub fn set_remote_home_if_absent(&mut self, interface: &str) {
        if self.remote_home.is_none() {
            self.remote_home = Some(interface.to_string());
        }
    }

    /// First writer wins.
    pub fn set_local_home_if_absent(&mut self, interface: &str) {
        if self.local_home.is_none() {
            self.local_home = Some(interface.to_string());
        }
    }

    pub fn has_home(&self) -> bool {
        self.remote_home.is_some() || self.local_home.is_some()
    }

    pub fn remote_business_interfaces(&self) -> &[String] {
        &self.remote_business
    }

    pub fn local_business_interfaces(&self) -> &[String] {
        &self.local_business
    }

    pub fn has_business_interfaces(&self) -> bool {
        !self.remote_business.is_empty() || !self.local_business.is_empty()
    }

    pub fn add_remote_business_interface(&mut self, interface: &str) {
        push_unique(&mut self.remote_business, interface);
    }

    pub fn add_local_business_interface(&mut self, interface: &str) {
        push_unique(&mut self.local_business, interface);
    }

    pub fn is_local_bean(&self) -> bool {
        self.local_bean
    }

    pub fn set_local_bean(&mut self) {
        self.local_bean = true;
    }

    pub fn is_web_service(&self) -> bool {
        self.web_service
    }

    pub fn set_web_service(&mut self) {
        self.web_service = true;
    }

    pub fn message_listener_interface(&self) -> Option<&str> {
        self.message_listener.as_deref()
    }

    pub fn set_message_listener_interface(&mut self, interface: &str) {
        self.message_listener = Some(interface.to_string());
    }

    // --- attributes with explicit-set provenance ---

    pub fn set_bean_managed_transaction(&mut self, bean_managed: bool) {
        self.bean_managed_transaction = bean_managed;
        self.set_bean_managed_transaction = true;
    }

    pub fn is_set_bean_managed_transaction(&self) -> bool {
        self.set_bean_managed_transaction
    }

    /// `None` until a source sets it
    pub fn bean_managed_transaction(&self) -> Option<bool> {
        self.set_bean_managed_transaction
            .then_some(self.bean_managed_transaction)
    }

    pub fn set_startup(&mut self, startup: bool) {
        self.startup = startup;
        self.set_startup = true;
    }

    pub fn is_set_startup(&self) -> bool {
        self.set_startup
    }

    pub fn startup(&self) -> Option<bool> {
        self.set_startup.then_some(self.startup)
    }

    pub fn set_passivation_capable(&mut self, capable: bool) {
        self.passivation_capable = capable;
        self.set_passivation_capable = true;
    }

    pub fn is_set_passivation_capable(&self) -> bool {
        self.set_passivation_capable
    }

    pub fn passivation_capable(&self) -> Option<bool> {
        self.set_passivation_capable
            .then_some(self.passivation_capable)
    }

    pub fn depends_on(&self) -> Option<&[String]> {
        self.depends_on.as_deref()
    }

    /// Ordered, without duplicates
    pub fn set_depends_on(&mut self, names: Vec<String>) {
        let mut ordered = Vec::with_capacity(names.len());
        for name in &names {
            push_unique(&mut ordered, name);
        }
        self.depends_on = Some(ordered);
    }

    // --- timers ---

    pub fn has_schedule_timers(&self) -> Option<bool> {
        self.has_schedule_timers
    }

    pub fn set_has_schedule_timers(&mut self, has_timers: bool) {
        self.has_schedule_timers = Some(has_timers);
    }

    pub fn timeout_method(&self) -> Option<&str> {
        self.timeout_method.as_deref()
    }

    // --- message-driven ---

    pub fn activation_config(&self) -> &[ActivationConfigProperty] {
        &self.activation_config
    }

    /// Insert or replace a property by name.
    pub fn put_activation_config(&mut self, property: ActivationConfigProperty) {
        match self.activation_config.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => existing.value = property.value,
            None => self.activation_config.push(property),
        }
    }

    // --- failure ---

    /// Exclude this bean from the finished module
    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Apply defaults and freeze.
    ///
    /// Returns `None` for a bean whose class never resolved; the factory
    /// records that as an error before it gets here.
    pub fn finish(
        self,
        j2ee_name: J2eeName,
        binding: Option<BeanBinding>,
        extension: Option<BeanExtension>,
        managed_bean_binding: Option<ManagedBeanBinding>,
    ) -> Option<BeanInitData> {
        let class_name = self.class_name?;
        let startup = self.bean_type == BeanType::Singleton && self.startup;
        let passivation_capable = self.bean_type == BeanType::Stateful && self.passivation_capable;
        Some(BeanInitData {
            name: self.name,
            class_name,
            j2ee_name,
            bean_type: self.bean_type,
            remote_home_interface: self.remote_home,
            remote_interface: self.remote,
            local_home_interface: self.local_home,
            local_interface: self.local,
            remote_business_interfaces: self.remote_business,
            local_business_interfaces: self.local_business,
            local_bean: self.local_bean,
            web_service_endpoint: self.web_service,
            message_listener_interface: self.message_listener,
            bean_managed_transaction: self.bean_managed_transaction,
            startup,
            depends_on: self.depends_on.unwrap_or_default(),
            passivation_capable,
            has_schedule_timers: self.has_schedule_timers,
            timeout_method: self.timeout_method,
            cmp_version: self.cmp_version,
            activation_config: self.activation_config,
            message_destination_link: self.message_destination_link,
            from_xml: self.enterprise_bean.is_some(),
            binding,
            extension,
            managed_bean_binding,
        })
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}
