//! Activation policy selection

use super::metadata::ActivationPolicy;
use crate::init_data::{BeanInitData, BeanType};
use ejbmd_common::descriptor::ActivationPolicyType;

/// Result of selecting a policy; `downgraded_from` is set when a declared
/// policy had to be replaced because the bean cannot passivate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicySelection {
    pub policy: ActivationPolicy,
    pub downgraded_from: Option<ActivationPolicy>,
}

impl From<ActivationPolicyType> for ActivationPolicy {
    fn from(declared: ActivationPolicyType) -> Self {
        match declared {
            ActivationPolicyType::Once => ActivationPolicy::Once,
            ActivationPolicyType::Transaction => ActivationPolicy::Transaction,
            ActivationPolicyType::ActivitySession => ActivationPolicy::ActivitySession,
        }
    }
}

/// Choose the activation policy of a bean.
///
/// Session beans follow the bean-cache setting of their extension; a bean
/// that cannot passivate only supports ONCE. A stateful bean with failover
/// enabled never stays at ONCE: whether ONCE was declared, defaulted or the
/// result of a downgrade, it is promoted to TRANSACTION. Every other kind
/// of bean is activated once.
pub fn select_activation_policy(bean: &BeanInitData, sfsb_failover: bool) -> PolicySelection {
    if !bean.is_session() {
        return PolicySelection {
            policy: ActivationPolicy::Once,
            downgraded_from: None,
        };
    }

    let failover = sfsb_failover && bean.bean_type == BeanType::Stateful;
    let declared = bean
        .extension
        .as_ref()
        .and_then(|ext| ext.as_session())
        .and_then(|ext| ext.bean_cache.as_ref())
        .and_then(|cache| cache.activation_policy)
        .map(ActivationPolicy::from);

    let (policy, downgraded_from) = match declared {
        Some(policy) if !bean.passivation_capable && policy != ActivationPolicy::Once => {
            (ActivationPolicy::Once, Some(policy))
        }
        Some(policy) => (policy, None),
        None => (ActivationPolicy::Once, None),
    };

    let policy = if policy == ActivationPolicy::Once && failover {
        ActivationPolicy::Transaction
    } else {
        policy
    };

    PolicySelection {
        policy,
        downgraded_from,
    }
}
