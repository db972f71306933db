//! Attribute merge stages
//!
//! Transaction management, singleton startup ordering, stateful
//! passivation, message-driven listener and activation config, and
//! schedule-timer detection. The descriptor has already populated the bean,
//! so annotation values only fill what it left unset.

use super::bean::BeanMergeData;
use super::interfaces::eligible_interfaces;
use super::module::ClassLookup;
use ejbmd_common::class_index::{ClassAnnotation, ClassInfo, MethodAnnotation};
use ejbmd_common::config::RuntimeVersion;
use std::sync::Arc;
use tracing::debug;

/// Bean-managed vs container-managed transactions; the descriptor wins.
pub(crate) fn merge_transaction(bean: &mut BeanMergeData, class: Option<&Arc<ClassInfo>>) {
    if bean.is_set_bean_managed_transaction() {
        return;
    }
    if let Some(bean_managed) = class.and_then(|c| c.transaction_management()) {
        bean.set_bean_managed_transaction(bean_managed);
    }
}

/// Startup flag and `dependsOn` for singletons.
pub(crate) fn merge_singleton(bean: &mut BeanMergeData, class: Option<&Arc<ClassInfo>>) {
    let Some(class) = class else {
        return;
    };
    if !bean.is_set_startup() && class.has_startup() {
        bean.set_startup(true);
    }
    if bean.depends_on().is_none() {
        if let Some(names) = class.depends_on() {
            bean.set_depends_on(names.to_vec());
        }
    }
}

/// Passivation capability of a stateful bean.
///
/// The annotation attribute only exists from 3.2; the descriptor element is
/// honoured on every version.
pub(crate) fn merge_stateful(
    bean: &mut BeanMergeData,
    class: Option<&Arc<ClassInfo>>,
    version: RuntimeVersion,
) {
    if bean.is_set_passivation_capable() || !version.honors_passivation_capable_annotation() {
        return;
    }
    let annotated = class.and_then(|c| {
        c.annotations.iter().find_map(|a| match a {
            ClassAnnotation::Stateful {
                passivation_capable: Some(capable),
                ..
            } => Some(*capable),
            _ => None,
        })
    });
    if let Some(capable) = annotated {
        bean.set_passivation_capable(capable);
    }
}

/// Message listener interface and activation config properties.
pub(crate) fn merge_message_driven(
    bean: &mut BeanMergeData,
    class: Option<&Arc<ClassInfo>>,
    classes: &ClassLookup<'_>,
) {
    let Some(class) = class else {
        return;
    };

    let annotation = class.annotations.iter().find_map(|a| match a {
        ClassAnnotation::MessageDriven {
            message_listener_interface,
            activation_config,
            ..
        } => Some((message_listener_interface, activation_config)),
        _ => None,
    });

    if let Some((listener, properties)) = annotation {
        if bean.message_listener_interface().is_none() {
            if let Some(listener) = listener {
                bean.set_message_listener_interface(listener);
            }
        }
        for property in properties {
            if !bean.activation_config().iter().any(|p| p.name == property.name) {
                bean.put_activation_config(property.clone());
            }
        }
    }

    if bean.message_listener_interface().is_none() {
        let eligible = eligible_interfaces(class, classes, true);
        if eligible.len() == 1 {
            debug!(
                bean = bean.name(),
                listener = %eligible[0],
                "Message listener interface taken from implements clause"
            );
            bean.set_message_listener_interface(&eligible[0]);
        }
    }
}

/// Schedule timers, scanning methods only when the descriptor has none.
pub(crate) fn merge_schedule_timers(
    bean: &mut BeanMergeData,
    class: Option<&Arc<ClassInfo>>,
    classes: &ClassLookup<'_>,
) {
    if bean.has_schedule_timers() == Some(true) {
        return;
    }
    let scheduled = class
        .map(|c| {
            classes.any_method_with(c, MethodAnnotation::Schedule)
                || classes.any_method_with(c, MethodAnnotation::Schedules)
        })
        .unwrap_or(false);
    bean.set_has_schedule_timers(scheduled);
}
