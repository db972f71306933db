//! Class metadata capability
//!
//! The merge engine never loads or reflects over classes. Everything it needs
//! to know about a class (implements clause, superclass, annotations and
//! annotated methods) comes through [`ClassMetadataSource`]. Production
//! callers back it with an annotation scanner; tests and the CLI use
//! [`InMemoryClassIndex`].

use crate::descriptor::ActivationConfigProperty;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Interfaces that never count as business interfaces.
pub const SERIALIZABLE: &str = "java.io.Serializable";
pub const EXTERNALIZABLE: &str = "java.io.Externalizable";

/// Legacy timer callback capability marker
pub const TIMED_OBJECT: &str = "javax.ejb.TimedObject";
pub const JAKARTA_TIMED_OBJECT: &str = "jakarta.ejb.TimedObject";

const RESERVED_PACKAGES: [&str; 2] = ["javax.ejb.", "jakarta.ejb."];

/// True when `name` is excluded from the eligible-interface set.
pub fn is_excluded_interface(name: &str) -> bool {
    name == SERIALIZABLE
        || name == EXTERNALIZABLE
        || RESERVED_PACKAGES.iter().any(|p| name.starts_with(p))
}

/// Query interface over a module's classes.
///
/// Lookups are synchronous; implementations may load lazily and cache.
pub trait ClassMetadataSource {
    /// Look up a class or interface by fully qualified name.
    fn class(&self, name: &str) -> Option<Arc<ClassInfo>>;

    /// Names of classes carrying a component-defining annotation, in index
    /// order.
    fn component_classes(&self) -> Vec<String>;
}

/// Class-level annotations understood by the merge engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClassAnnotation {
    Stateless {
        #[serde(default)]
        name: Option<String>,
    },
    Stateful {
        #[serde(default)]
        name: Option<String>,
        /// Absent means the default (`true`)
        #[serde(default)]
        passivation_capable: Option<bool>,
    },
    Singleton {
        #[serde(default)]
        name: Option<String>,
    },
    MessageDriven {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        message_listener_interface: Option<String>,
        #[serde(default)]
        activation_config: Vec<ActivationConfigProperty>,
    },
    ManagedBean {
        #[serde(default)]
        name: Option<String>,
    },
    Remote {
        #[serde(default)]
        interfaces: Vec<String>,
    },
    Local {
        #[serde(default)]
        interfaces: Vec<String>,
    },
    RemoteHome {
        interface: String,
    },
    LocalHome {
        interface: String,
    },
    LocalBean,
    WebService,
    WebServiceProvider,
    TransactionManagement {
        bean_managed: bool,
    },
    Startup,
    DependsOn {
        #[serde(default)]
        names: Vec<String>,
    },
    Interceptors {
        #[serde(default)]
        classes: Vec<String>,
    },
}

impl ClassAnnotation {
    /// True for annotations that make the class a component.
    pub fn is_component_defining(&self) -> bool {
        matches!(
            self,
            ClassAnnotation::Stateless { .. }
                | ClassAnnotation::Stateful { .. }
                | ClassAnnotation::Singleton { .. }
                | ClassAnnotation::MessageDriven { .. }
                | ClassAnnotation::ManagedBean { .. }
        )
    }
}

/// Method-level annotations that affect timer detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MethodAnnotation {
    Timeout,
    Schedule,
    Schedules,
}

/// A declared method
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,

    /// Parameter type names, in declaration order
    #[serde(default)]
    pub params: Vec<String>,

    #[serde(default)]
    pub annotations: Vec<MethodAnnotation>,
}

impl MethodInfo {
    pub fn has_annotation(&self, annotation: MethodAnnotation) -> bool {
        self.annotations.contains(&annotation)
    }
}

/// Everything the merge engine may ask about one class or interface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,

    #[serde(default)]
    pub superclass: Option<String>,

    /// Implements (or, for an interface, extends) clause in declared order
    #[serde(default)]
    pub interfaces: Vec<String>,

    #[serde(default)]
    pub is_interface: bool,

    #[serde(default)]
    pub annotations: Vec<ClassAnnotation>,

    #[serde(default)]
    pub methods: Vec<MethodInfo>,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Unqualified class name, used as the default bean name.
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn has_component_annotation(&self) -> bool {
        self.annotations.iter().any(ClassAnnotation::is_component_defining)
    }

    pub fn has_local_bean(&self) -> bool {
        self.annotations.contains(&ClassAnnotation::LocalBean)
    }

    pub fn has_web_service(&self) -> bool {
        self.annotations.iter().any(|a| {
            matches!(
                a,
                ClassAnnotation::WebService | ClassAnnotation::WebServiceProvider
            )
        })
    }

    pub fn has_startup(&self) -> bool {
        self.annotations.contains(&ClassAnnotation::Startup)
    }

    /// `Remote` annotation interface list, if the annotation is present
    pub fn remote(&self) -> Option<&[String]> {
        self.annotations.iter().find_map(|a| match a {
            ClassAnnotation::Remote { interfaces } => Some(interfaces.as_slice()),
            _ => None,
        })
    }

    /// `Local` annotation interface list, if the annotation is present
    pub fn local(&self) -> Option<&[String]> {
        self.annotations.iter().find_map(|a| match a {
            ClassAnnotation::Local { interfaces } => Some(interfaces.as_slice()),
            _ => None,
        })
    }

    pub fn remote_home(&self) -> Option<&str> {
        self.annotations.iter().find_map(|a| match a {
            ClassAnnotation::RemoteHome { interface } => Some(interface.as_str()),
            _ => None,
        })
    }

    pub fn local_home(&self) -> Option<&str> {
        self.annotations.iter().find_map(|a| match a {
            ClassAnnotation::LocalHome { interface } => Some(interface.as_str()),
            _ => None,
        })
    }

    pub fn transaction_management(&self) -> Option<bool> {
        self.annotations.iter().find_map(|a| match a {
            ClassAnnotation::TransactionManagement { bean_managed } => Some(*bean_managed),
            _ => None,
        })
    }

    pub fn depends_on(&self) -> Option<&[String]> {
        self.annotations.iter().find_map(|a| match a {
            ClassAnnotation::DependsOn { names } => Some(names.as_slice()),
            _ => None,
        })
    }

    pub fn interceptors(&self) -> &[String] {
        self.annotations
            .iter()
            .find_map(|a| match a {
                ClassAnnotation::Interceptors { classes } => Some(classes.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Methods carrying the given annotation
    pub fn methods_with(&self, annotation: MethodAnnotation) -> impl Iterator<Item = &MethodInfo> {
        self.methods
            .iter()
            .filter(move |m| m.has_annotation(annotation))
    }
}

/// Unqualified part of a dotted class name.
pub fn simple_name(class_name: &str) -> &str {
    class_name.rsplit('.').next().unwrap_or(class_name)
}

/// Class index held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryClassIndex {
    classes: HashMap<String, Arc<ClassInfo>>,
    order: Vec<String>,
}

impl InMemoryClassIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class; a later entry with the same name replaces the earlier one.
    pub fn insert(&mut self, class: ClassInfo) {
        if !self.classes.contains_key(&class.name) {
            self.order.push(class.name.clone());
        }
        self.classes.insert(class.name.clone(), Arc::new(class));
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl FromIterator<ClassInfo> for InMemoryClassIndex {
    fn from_iter<I: IntoIterator<Item = ClassInfo>>(iter: I) -> Self {
        let mut index = InMemoryClassIndex::new();
        for class in iter {
            index.insert(class);
        }
        index
    }
}

impl ClassMetadataSource for InMemoryClassIndex {
    fn class(&self, name: &str) -> Option<Arc<ClassInfo>> {
        self.classes.get(name).cloned()
    }

    fn component_classes(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|name| {
                self.classes
                    .get(*name)
                    .map(|c| c.has_component_annotation())
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excluded_interfaces() {
        assert!(is_excluded_interface("java.io.Serializable"));
        assert!(is_excluded_interface("java.io.Externalizable"));
        assert!(is_excluded_interface("javax.ejb.SessionBean"));
        assert!(is_excluded_interface("jakarta.ejb.TimedObject"));
        assert!(!is_excluded_interface("com.x.Bar"));
        assert!(!is_excluded_interface("javax.ejbx.Bar"));
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(simple_name("com.x.Foo"), "Foo");
        assert_eq!(simple_name("Foo"), "Foo");
    }

    #[test]
    fn test_component_classes_in_insertion_order() {
        let mut b = ClassInfo::new("com.x.B");
        b.annotations.push(ClassAnnotation::Singleton { name: None });
        let plain = ClassInfo::new("com.x.Plain");
        let mut a = ClassInfo::new("com.x.A");
        a.annotations.push(ClassAnnotation::Stateless { name: None });

        let index: InMemoryClassIndex = vec![b, plain, a].into_iter().collect();

        assert_eq!(index.len(), 3);
        assert_eq!(index.component_classes(), vec!["com.x.B", "com.x.A"]);
        assert!(index.class("com.x.Plain").is_some());
        assert!(index.class("com.x.Missing").is_none());
    }

    #[test]
    fn test_annotation_deserialize() {
        let json = r#"[
            {"type": "stateful", "passivation_capable": false},
            {"type": "remote"},
            {"type": "local", "interfaces": ["com.x.L"]},
            {"type": "local-bean"}
        ]"#;
        let annotations: Vec<ClassAnnotation> = serde_json::from_str(json).unwrap();
        assert_eq!(
            annotations[0],
            ClassAnnotation::Stateful {
                name: None,
                passivation_capable: Some(false)
            }
        );
        let mut class = ClassInfo::new("com.x.Bean");
        class.annotations = annotations;
        assert_eq!(class.remote(), Some(&[][..]));
        assert_eq!(class.local(), Some(&["com.x.L".to_string()][..]));
        assert!(class.has_local_bean());
        assert!(!class.has_web_service());
    }
}
