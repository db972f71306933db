//! Interface-view inference for session beans
//!
//! Decides which business interfaces a session bean exposes as remote or
//! local, and whether it has a no-interface view, from the descriptor, the
//! class-level `Remote`/`Local` markers and the implements clause.
//!
//! # Algorithm
//!
//! 1. Home interfaces: descriptor first, then annotation.
//! 2. Class markers: a listed interface joins its set; an empty marker
//!    records an implements-derived view (at most one of Remote/Local).
//! 3. Eligible interfaces: the implements clause without serialization
//!    markers and reserved EJB interfaces.
//! 4. Empty marker with nothing eligible is an error.
//! 5. Eligible interfaces carrying their own marker join that set; the
//!    marker must not list interfaces.
//! 6. No-interface view: explicit marker, or nothing else exposes a view
//!    and nothing is eligible.
//! 7. No business interface yet: eligible interfaces go to the derived
//!    view, else to local.
//! 8. No interface may be both remote and local.

use super::module::ClassLookup;
use super::MergeIssue;
use super::bean::BeanMergeData;
use crate::diagnostics::ErrorKind;
use ejbmd_common::class_index::{is_excluded_interface, ClassInfo};
use std::sync::Arc;
use tracing::debug;

/// Business view named by an empty class-level marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DerivedView {
    Remote,
    Local,
}

/// Implements-clause interfaces that may become business interfaces.
///
/// With `include_superclasses` the interfaces of every known superclass are
/// appended, nearest class first.
pub(crate) fn eligible_interfaces(
    class: &Arc<ClassInfo>,
    classes: &ClassLookup<'_>,
    include_superclasses: bool,
) -> Vec<String> {
    let hierarchy = if include_superclasses {
        classes.hierarchy(class)
    } else {
        vec![Arc::clone(class)]
    };

    let mut eligible: Vec<String> = Vec::new();
    for c in &hierarchy {
        for interface in &c.interfaces {
            if !is_excluded_interface(interface) && !eligible.contains(interface) {
                eligible.push(interface.clone());
            }
        }
    }
    eligible
}

/// Resolve the interface views of a session bean.
///
/// `class` is `None` for metadata-complete modules: only descriptor views
/// count and no fallback view is inferred.
pub(crate) fn merge_session_interfaces(
    bean: &mut BeanMergeData,
    class: Option<&Arc<ClassInfo>>,
    classes: &ClassLookup<'_>,
    empty_annotation_ignores_explicit_interfaces: bool,
    issues: &mut Vec<MergeIssue>,
) {
    let Some(class) = class else {
        check_interface_conflicts(bean, issues);
        return;
    };

    if let Some(home) = class.remote_home() {
        bean.set_remote_home_if_absent(home);
    }
    if let Some(home) = class.local_home() {
        bean.set_local_home_if_absent(home);
    }
    if class.has_local_bean() {
        bean.set_local_bean();
    }
    if class.has_web_service() {
        bean.set_web_service();
    }

    let mut derived: Option<DerivedView> = None;
    if let Some(listed) = class.remote() {
        if listed.is_empty() {
            derived = Some(DerivedView::Remote);
        }
        for interface in listed {
            bean.add_remote_business_interface(interface);
        }
    }
    if let Some(listed) = class.local() {
        if listed.is_empty() {
            if derived.is_some() {
                issues.push(MergeIssue::new(
                    ErrorKind::IncompatibleDefaultBusinessInterfaceType,
                    format!(
                        "class {} declares both Remote and Local without interfaces",
                        class.name
                    ),
                ));
                return;
            }
            derived = Some(DerivedView::Local);
        }
        for interface in listed {
            bean.add_local_business_interface(interface);
        }
    }

    let eligible = eligible_interfaces(class, classes, false);

    if let Some(view) = derived {
        if eligible.is_empty() {
            issues.push(MergeIssue::new(
                ErrorKind::DefaultImplementsNone,
                format!(
                    "class {} declares {:?} without interfaces but implements no eligible interface",
                    class.name, view
                ),
            ));
            return;
        }
    }

    for interface in &eligible {
        let Some(info) = classes.class(interface) else {
            continue;
        };
        if let Some(listed) = info.remote() {
            if listed.is_empty() {
                bean.add_remote_business_interface(interface);
            } else {
                issues.push(implements_value_issue(&class.name, interface, "Remote"));
            }
        }
        if let Some(listed) = info.local() {
            if listed.is_empty() {
                bean.add_local_business_interface(interface);
            } else {
                issues.push(implements_value_issue(&class.name, interface, "Local"));
            }
        }
    }

    let explicit_local_bean = bean.is_local_bean();
    if !explicit_local_bean
        && !bean.has_business_interfaces()
        && !bean.has_home()
        && !bean.is_web_service()
        && eligible.is_empty()
    {
        debug!(bean = bean.name(), "No view declared, using no-interface view");
        bean.set_local_bean();
    }

    if !bean.has_business_interfaces() && !explicit_local_bean && !eligible.is_empty() {
        match derived {
            Some(DerivedView::Remote) => {
                for interface in &eligible {
                    bean.add_remote_business_interface(interface);
                }
            }
            Some(DerivedView::Local) => {
                for interface in &eligible {
                    bean.add_local_business_interface(interface);
                }
            }
            None if !bean.has_home() && !bean.is_web_service() => {
                for interface in &eligible {
                    bean.add_local_business_interface(interface);
                }
            }
            None => {}
        }
    } else if empty_annotation_ignores_explicit_interfaces && eligible.len() == 1 {
        let only = &eligible[0];
        match derived {
            Some(DerivedView::Local)
                if !bean.remote_business_interfaces().contains(only) =>
            {
                bean.add_local_business_interface(only);
            }
            Some(DerivedView::Remote)
                if !bean.local_business_interfaces().contains(only) =>
            {
                bean.add_remote_business_interface(only);
            }
            _ => {}
        }
    }

    check_interface_conflicts(bean, issues);
}

fn implements_value_issue(class: &str, interface: &str, marker: &str) -> MergeIssue {
    MergeIssue::new(
        ErrorKind::ImplementsInterfaceTypeValue,
        format!(
            "interface {} implemented by {} has a {} annotation with a value",
            interface, class, marker
        ),
    )
}

/// Same interface in both business sets is an error.
pub(crate) fn check_interface_conflicts(bean: &BeanMergeData, issues: &mut Vec<MergeIssue>) {
    for interface in bean.remote_business_interfaces() {
        if bean.local_business_interfaces().contains(interface) {
            issues.push(MergeIssue::new(
                ErrorKind::IncompatibleInterfaceType,
                format!("interface {} is both a remote and a local business interface", interface),
            ));
        }
    }
}
