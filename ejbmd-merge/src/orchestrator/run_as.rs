//! Run-as extension propagation
//!
//! Each run-as mode names methods with a selector. Selectors are ranked by
//! specificity and a method keeps the identity of the most specific
//! selector that matched it:
//!
//! | rank | selector |
//! |------|----------|
//! | 1 | `*`, no interface type |
//! | 2 | `*`, matching interface type |
//! | 3 | method name, no parameter list |
//! | 4 | method name, exact parameter list |
//!
//! An equal rank replaces the previous identity, a lower one never does, so
//! applying the same modes again changes nothing.

use super::metadata::{EjbMethodMetaData, RunAs};
use ejbmd_common::descriptor::{ExtensionMethod, MethodType, RunAsMode};

const WILDCARD: &str = "*";

/// Apply every run-as mode, in declaration order, to the bean's methods.
pub fn apply_run_as_modes(methods: &mut [EjbMethodMetaData], modes: &[RunAsMode]) {
    for mode in modes {
        let run_as = RunAs::from(&mode.identity);
        for selector in &mode.methods {
            for method in methods.iter_mut() {
                let Some(rank) = selector_rank(selector, method) else {
                    continue;
                };
                if method.run_as_rank <= rank {
                    method.run_as = Some(run_as.clone());
                    method.run_as_rank = rank;
                }
            }
        }
    }
}

/// Rank of `selector` for `method`, or `None` if it does not select it.
pub fn selector_rank(selector: &ExtensionMethod, method: &EjbMethodMetaData) -> Option<u8> {
    let unspecified = selector.method_type == MethodType::Unspecified;
    let type_matches = unspecified || method.interface.matches(selector.method_type);
    if !type_matches {
        return None;
    }

    if selector.name.trim() == WILDCARD {
        return Some(if unspecified { 1 } else { 2 });
    }
    if selector.name.trim() != method.name {
        return None;
    }
    match &selector.params {
        None => Some(3),
        Some(params) if parse_params(params) == method.params => Some(4),
        Some(_) => None,
    }
}

/// Split a parameter list on whitespace and commas.
fn parse_params(params: &str) -> Vec<String> {
    params
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::metadata::MethodInterface;
    use ejbmd_common::class_index::MethodInfo;
    use ejbmd_common::descriptor::RunAsIdentity;

    fn method(interface: MethodInterface, name: &str, params: &[&str]) -> EjbMethodMetaData {
        EjbMethodMetaData::new(
            interface,
            &MethodInfo {
                name: name.to_string(),
                params: params.iter().map(|p| p.to_string()).collect(),
                annotations: vec![],
            },
        )
    }

    fn mode(identity: RunAsIdentity, selectors: Vec<ExtensionMethod>) -> RunAsMode {
        RunAsMode {
            identity,
            methods: selectors,
        }
    }

    fn role(name: &str) -> RunAsIdentity {
        RunAsIdentity::SpecifiedIdentity {
            role: Some(name.to_string()),
        }
    }

    #[test]
    fn test_parse_params() {
        assert_eq!(parse_params("int, java.lang.String"), vec!["int", "java.lang.String"]);
        assert_eq!(parse_params("  int   long "), vec!["int", "long"]);
        assert!(parse_params("").is_empty());
    }

    #[test]
    fn test_ranks() {
        let m = method(MethodInterface::Remote, "buy", &["int", "java.lang.String"]);
        let star = ExtensionMethod::new("*", MethodType::Unspecified, None);
        let star_remote = ExtensionMethod::new("*", MethodType::Remote, None);
        let star_local = ExtensionMethod::new("*", MethodType::Local, None);
        let named = ExtensionMethod::new("buy", MethodType::Unspecified, None);
        let exact = ExtensionMethod::new("buy", MethodType::Remote, Some("int java.lang.String"));
        let wrong_params = ExtensionMethod::new("buy", MethodType::Remote, Some("int"));

        assert_eq!(selector_rank(&star, &m), Some(1));
        assert_eq!(selector_rank(&star_remote, &m), Some(2));
        assert_eq!(selector_rank(&star_local, &m), None);
        assert_eq!(selector_rank(&named, &m), Some(3));
        assert_eq!(selector_rank(&exact, &m), Some(4));
        assert_eq!(selector_rank(&wrong_params, &m), None);
    }

    #[test]
    fn test_local_selector_matches_message_endpoint() {
        let m = method(MethodInterface::MessageEndpoint, "onMessage", &["javax.jms.Message"]);
        let star_local = ExtensionMethod::new("*", MethodType::Local, None);
        assert_eq!(selector_rank(&star_local, &m), Some(2));
    }

    #[test]
    fn test_most_specific_wins_regardless_of_order() {
        let mut methods = vec![
            method(MethodInterface::Local, "buy", &["int"]),
            method(MethodInterface::Local, "sell", &[]),
        ];
        let modes = vec![
            mode(role("buyer"), vec![ExtensionMethod::new("buy", MethodType::Local, Some("int"))]),
            mode(RunAsIdentity::SystemIdentity, vec![ExtensionMethod::new("*", MethodType::Unspecified, None)]),
        ];

        apply_run_as_modes(&mut methods, &modes);

        assert_eq!(
            methods[0].run_as,
            Some(RunAs::SpecifiedIdentity {
                role: Some("buyer".to_string())
            })
        );
        assert_eq!(methods[1].run_as, Some(RunAs::SystemIdentity));
    }

    #[test]
    fn test_equal_rank_later_mode_wins() {
        let mut methods = vec![method(MethodInterface::Remote, "buy", &[])];
        let modes = vec![
            mode(RunAsIdentity::CallerIdentity, vec![ExtensionMethod::new("buy", MethodType::Unspecified, None)]),
            mode(RunAsIdentity::SystemIdentity, vec![ExtensionMethod::new("buy", MethodType::Remote, None)]),
        ];
        apply_run_as_modes(&mut methods, &modes);
        assert_eq!(methods[0].run_as, Some(RunAs::SystemIdentity));
    }

    #[test]
    fn test_reapplying_is_idempotent() {
        let mut methods = vec![
            method(MethodInterface::Remote, "buy", &["int"]),
            method(MethodInterface::Home, "create", &[]),
        ];
        let modes = vec![
            mode(role("admin"), vec![ExtensionMethod::new("*", MethodType::Remote, None)]),
            mode(RunAsIdentity::CallerIdentity, vec![ExtensionMethod::new("create", MethodType::Home, None)]),
        ];

        apply_run_as_modes(&mut methods, &modes);
        let first = methods.clone();
        apply_run_as_modes(&mut methods, &modes);
        assert_eq!(methods, first);
    }

    #[test]
    fn test_blank_role_becomes_none() {
        let mut methods = vec![method(MethodInterface::Local, "run", &[])];
        let modes = vec![mode(
            RunAsIdentity::SpecifiedIdentity {
                role: Some("   ".to_string()),
            },
            vec![ExtensionMethod::new("*", MethodType::Unspecified, None)],
        )];
        apply_run_as_modes(&mut methods, &modes);
        assert_eq!(methods[0].run_as, Some(RunAs::SpecifiedIdentity { role: None }));
    }
}
