//! Per-module merge context
//!
//! Owns every [`BeanMergeData`] of one module in declaration order, the set
//! of classes already claimed by an EJB, the diagnostics collected so far and
//! a caching view over the class metadata source. Built fresh for each
//! deployment and consumed by finalize.

use super::bean::BeanMergeData;
use crate::diagnostics::{Diagnostic, Diagnostics, ErrorKind};
use crate::init_data::BeanType;
use ejbmd_common::class_index::{
    ClassInfo, ClassMetadataSource, MethodAnnotation, JAKARTA_TIMED_OBJECT, TIMED_OBJECT,
};
use once_cell::unsync::OnceCell;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error};

/// Caching front for a [`ClassMetadataSource`]
pub struct ClassLookup<'a> {
    source: &'a dyn ClassMetadataSource,
    cache: RefCell<HashMap<String, Option<Arc<ClassInfo>>>>,
    component_classes: OnceCell<Vec<String>>,
}

impl<'a> ClassLookup<'a> {
    pub fn new(source: &'a dyn ClassMetadataSource) -> Self {
        Self {
            source,
            cache: RefCell::new(HashMap::new()),
            component_classes: OnceCell::new(),
        }
    }

    pub fn class(&self, name: &str) -> Option<Arc<ClassInfo>> {
        if let Some(cached) = self.cache.borrow().get(name) {
            return cached.clone();
        }
        let found = self.source.class(name);
        self.cache.borrow_mut().insert(name.to_string(), found.clone());
        found
    }

    /// Component classes, fetched from the source on first use
    pub fn component_classes(&self) -> &[String] {
        self.component_classes
            .get_or_init(|| self.source.component_classes())
    }

    /// The class followed by its known superclasses, nearest first.
    ///
    /// Stops at the first superclass missing from the index.
    pub fn hierarchy(&self, class: &Arc<ClassInfo>) -> Vec<Arc<ClassInfo>> {
        let mut chain = vec![Arc::clone(class)];
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(class.name.clone());
        let mut next = class.superclass.clone();
        while let Some(name) = next {
            if !seen.insert(name.clone()) {
                break;
            }
            match self.class(&name) {
                Some(parent) => {
                    next = parent.superclass.clone();
                    chain.push(parent);
                }
                None => break,
            }
        }
        chain
    }

    /// True if the class or any known superclass implements the legacy timed
    /// object marker.
    pub fn implements_timed_object(&self, class: &Arc<ClassInfo>) -> bool {
        self.hierarchy(class).iter().any(|c| {
            c.interfaces
                .iter()
                .any(|i| i == TIMED_OBJECT || i == JAKARTA_TIMED_OBJECT)
        })
    }

    /// True if any method in the hierarchy carries the annotation.
    pub fn any_method_with(&self, class: &Arc<ClassInfo>, annotation: MethodAnnotation) -> bool {
        self.hierarchy(class)
            .iter()
            .any(|c| c.methods_with(annotation).next().is_some())
    }
}

/// Merge state for one module
pub struct ModuleMergeData<'a> {
    name: String,
    app_name: Option<String>,
    logical_name: String,
    metadata_complete: bool,
    classes: ClassLookup<'a>,
    beans: Vec<BeanMergeData>,
    positions: HashMap<String, usize>,
    claimed_classes: HashSet<String>,
    diagnostics: Diagnostics,
    has_timers: OnceCell<bool>,
}

impl<'a> ModuleMergeData<'a> {
    pub fn new(
        name: &str,
        app_name: Option<&str>,
        logical_name: &str,
        metadata_complete: bool,
        source: &'a dyn ClassMetadataSource,
    ) -> Self {
        Self {
            name: name.to_string(),
            app_name: app_name.map(str::to_string),
            logical_name: logical_name.to_string(),
            metadata_complete,
            classes: ClassLookup::new(source),
            beans: Vec::new(),
            positions: HashMap::new(),
            claimed_classes: HashSet::new(),
            diagnostics: Diagnostics::new(),
            has_timers: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    pub fn is_metadata_complete(&self) -> bool {
        self.metadata_complete
    }

    pub fn classes(&self) -> &ClassLookup<'a> {
        &self.classes
    }

    // --- beans ---

    /// Add a bean; returns false (and drops it) if the name is taken.
    pub fn add_bean(&mut self, bean: BeanMergeData) -> bool {
        if self.positions.contains_key(bean.name()) {
            return false;
        }
        self.positions.insert(bean.name().to_string(), self.beans.len());
        self.beans.push(bean);
        true
    }

    pub fn contains_bean(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn bean(&self, name: &str) -> Option<&BeanMergeData> {
        self.positions.get(name).map(|&i| &self.beans[i])
    }

    pub fn bean_mut(&mut self, name: &str) -> Option<&mut BeanMergeData> {
        match self.positions.get(name) {
            Some(&i) => self.beans.get_mut(i),
            None => None,
        }
    }

    pub fn beans(&self) -> &[BeanMergeData] {
        &self.beans
    }

    pub fn bean_count(&self) -> usize {
        self.beans.len()
    }

    /// Bean at `index` together with the class lookup
    pub fn bean_at_mut(&mut self, index: usize) -> Option<(&mut BeanMergeData, &ClassLookup<'a>)> {
        let classes = &self.classes;
        self.beans.get_mut(index).map(|bean| (bean, classes))
    }

    // --- claimed classes ---

    pub fn claim_class(&mut self, class_name: &str) {
        self.claimed_classes.insert(class_name.to_string());
    }

    pub fn is_class_claimed(&self, class_name: &str) -> bool {
        self.claimed_classes.contains(class_name)
    }

    // --- diagnostics ---

    /// Record an error against the module and fail the named bean.
    ///
    /// Processing continues; finalize refuses the module afterwards.
    pub fn error(&mut self, bean: Option<&str>, kind: ErrorKind, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(kind, &self.name, bean, message);
        error!(
            module = %self.name,
            bean = bean.unwrap_or(""),
            code = kind.code(),
            "{}",
            diagnostic.message
        );
        if let Some(name) = bean {
            if let Some(data) = self.bean_mut(name) {
                data.mark_failed();
            }
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    // --- module-wide timers ---

    /// Whether any EJB in the module uses the timer service.
    ///
    /// Computed on first call. Per-bean flags and the timed-object marker
    /// are checked for every bean before any method is scanned for a timeout
    /// callback, and the scan stops at the first hit.
    pub fn has_timers(&self) -> bool {
        *self.has_timers.get_or_init(|| {
            let candidates: Vec<&BeanMergeData> = self
                .beans
                .iter()
                .filter(|b| b.bean_type() != BeanType::ManagedBean && !b.is_failed())
                .collect();

            for bean in &candidates {
                if bean.has_schedule_timers() == Some(true) || bean.timeout_method().is_some() {
                    debug!(module = %self.name, bean = bean.name(), "Bean declares timers");
                    return true;
                }
                let class = bean.class_name().and_then(|c| self.classes.class(c));
                if let Some(class) = class {
                    if self.classes.implements_timed_object(&class) {
                        debug!(module = %self.name, bean = bean.name(), "Bean is a timed object");
                        return true;
                    }
                }
            }

            if self.metadata_complete {
                return false;
            }

            candidates.iter().any(|bean| {
                bean.class_name()
                    .and_then(|c| self.classes.class(c))
                    .map(|class| self.classes.any_method_with(&class, MethodAnnotation::Timeout))
                    .unwrap_or(false)
            })
        })
    }

    pub fn into_parts(self) -> (Vec<BeanMergeData>, Diagnostics) {
        (self.beans, self.diagnostics)
    }
}
