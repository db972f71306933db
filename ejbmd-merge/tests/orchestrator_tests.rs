//! Orchestration tests: merge a module, then resolve bindings and policies.

mod common;

use common::*;
use ejbmd_common::class_index::{ClassAnnotation, InMemoryClassIndex};
use ejbmd_common::config::OnError;
use ejbmd_common::descriptor::{
    ActivationPolicyType, BeanBinding, BeanCache, BeanExtension, EjbJarBnd, EjbJarExt, EnterpriseBean,
    ExtensionMethod, JcaAdapter, MessageDestinationBinding, MessageDrivenBean, MessageDrivenBinding,
    MethodType, ModuleDescriptors, RunAsIdentity, RunAsMode, SessionBinding, SessionExtension, SessionType,
};
use ejbmd_merge::orchestrator::{ActivationPolicy, MethodInterface, RunAs};
use ejbmd_merge::{EjbMdOrchestrator, Error, ErrorKind, ModuleMetaData, OrchestratorConfig};

/// Stateless `Cart` with local `com.x.Cart` and remote `com.x.CartRemote`
fn cart_classes() -> InMemoryClassIndex {
    index(vec![
        bean_class(
            "com.x.CartBean",
            vec![
                stateless(Some("Cart")),
                local(&["com.x.Cart"]),
                remote(&["com.x.CartRemote"]),
            ],
            &["com.x.Cart", "com.x.CartRemote"],
        ),
        interface("com.x.Cart", &["add", "clear"]),
        interface("com.x.CartRemote", &["checkout"]),
    ])
}

fn with_binding(binding: SessionBinding) -> ModuleDescriptors {
    let mut descriptors = annotations_only();
    descriptors.ejb_jar_bnd = Some(EjbJarBnd {
        enterprise_beans: vec![BeanBinding::Session(binding)],
        ..Default::default()
    });
    descriptors
}

fn run(
    descriptors: ModuleDescriptors,
    classes: &InMemoryClassIndex,
    on_error: OnError,
    sfsb_failover: bool,
) -> Result<ModuleMetaData, Error> {
    let module = merge(descriptors, classes)?;
    let config = OrchestratorConfig {
        on_error,
        sfsb_failover,
    };
    EjbMdOrchestrator::new(config, classes).process_module(&module)
}

fn binding_code(result: Result<ModuleMetaData, Error>) -> &'static str {
    match result {
        Err(Error::Binding(d)) => d.code,
        other => panic!("expected a binding error, got {:?}", other),
    }
}

// ========================================
// Business interface bindings
// ========================================

#[test]
fn test_valid_interface_bindings() {
    let classes = cart_classes();
    let binding = SessionBinding::new("Cart")
        .with_interface("com.x.Cart", " ejblocal:shop/Cart ")
        .with_interface("com.x.CartRemote", "ejb/shop/CartRemote");

    let result = run(with_binding(binding), &classes, OnError::Fail, false).unwrap();

    let cart = result.bean("Cart").unwrap();
    assert_eq!(
        cart.business_interface_bindings.get("com.x.Cart").map(String::as_str),
        Some("ejblocal:shop/Cart")
    );
    assert_eq!(
        cart.business_interface_bindings.get("com.x.CartRemote").map(String::as_str),
        Some("ejb/shop/CartRemote")
    );
    assert!(result.warnings.is_empty());
}

#[test]
fn test_local_binding_without_prefix_follows_policy() {
    let classes = cart_classes();
    let binding = || SessionBinding::new("Cart").with_interface("com.x.Cart", "shop/Cart");

    let code = binding_code(run(with_binding(binding()), &classes, OnError::Fail, false));
    assert_eq!(code, "CNTR0136E");

    let warned = run(with_binding(binding()), &classes, OnError::Warn, false).unwrap();
    assert!(warned.bean("Cart").unwrap().business_interface_bindings.is_empty());
    assert_eq!(warned.warnings.len(), 1);
    assert_eq!(warned.warnings[0].kind, ErrorKind::ImproperLocalJndiBindingPrefix);
    assert_eq!(warned.warnings[0].bean.as_deref(), Some("Cart"));

    let ignored = run(with_binding(binding()), &classes, OnError::Ignore, false).unwrap();
    assert!(ignored.bean("Cart").unwrap().business_interface_bindings.is_empty());
    assert!(ignored.warnings.is_empty());
}

#[test]
fn test_remote_binding_in_local_namespace() {
    let classes = cart_classes();
    let binding = SessionBinding::new("Cart").with_interface("com.x.CartRemote", "ejblocal:CartRemote");

    let code = binding_code(run(with_binding(binding), &classes, OnError::Fail, false));
    assert_eq!(code, "CNTR0137E");
}

#[test]
fn test_blank_binding_name_is_dropped() {
    let classes = cart_classes();
    let binding = SessionBinding::new("Cart").with_interface("com.x.CartRemote", "   ");

    let result = run(with_binding(binding), &classes, OnError::Warn, false).unwrap();
    assert!(result.bean("Cart").unwrap().business_interface_bindings.is_empty());
    assert_eq!(result.warnings[0].code, "CNTR0138E");
}

#[test]
fn test_binding_for_unknown_interface_is_always_fatal() {
    let classes = cart_classes();
    let binding = SessionBinding::new("Cart").with_interface("com.x.Unknown", "ejb/Unknown");

    let code = binding_code(run(with_binding(binding), &classes, OnError::Ignore, false));
    assert_eq!(code, "CNTR0140E");
}

#[test]
fn test_second_binding_for_interface_keeps_first() {
    let classes = cart_classes();
    let binding = SessionBinding::new("Cart")
        .with_interface("com.x.CartRemote", "ejb/first")
        .with_interface("com.x.CartRemote", "ejb/second");

    let result = run(with_binding(binding), &classes, OnError::Warn, false).unwrap();

    let cart = result.bean("Cart").unwrap();
    assert_eq!(
        cart.business_interface_bindings.get("com.x.CartRemote").map(String::as_str),
        Some("ejb/first")
    );
    assert_eq!(result.warnings[0].kind, ErrorKind::MultipleJndiBindingNames);
}

#[test]
fn test_binding_after_dropped_binding_is_still_a_duplicate() {
    let classes = cart_classes();
    let binding = SessionBinding::new("Cart")
        .with_interface("com.x.Cart", "shop/Cart")
        .with_interface("com.x.Cart", "ejblocal:shop/Cart");

    let result = run(with_binding(binding), &classes, OnError::Warn, false).unwrap();

    assert!(result.bean("Cart").unwrap().business_interface_bindings.is_empty());
    let codes: Vec<&str> = result.warnings.iter().map(|w| w.code).collect();
    assert_eq!(codes, vec!["CNTR0136E", "CNTR0139E"]);
}

#[test]
fn test_blank_binding_for_unknown_interface_follows_policy() {
    let classes = cart_classes();
    let binding = || SessionBinding::new("Cart").with_interface("com.x.Unknown", "  ");

    let warned = run(with_binding(binding()), &classes, OnError::Warn, false).unwrap();
    assert_eq!(warned.warnings.len(), 1);
    assert_eq!(warned.warnings[0].kind, ErrorKind::BlankJndiBindingName);

    let code = binding_code(run(with_binding(binding()), &classes, OnError::Fail, false));
    assert_eq!(code, "CNTR0138E");
}

#[test]
fn test_no_interface_view_binds_bean_class() {
    let classes = index(vec![bean_class("com.x.Plain", vec![stateless(None)], &[])]);
    let binding = SessionBinding::new("Plain").with_interface("", "ejblocal:Plain");

    let result = run(with_binding(binding), &classes, OnError::Fail, false).unwrap();

    let plain = result.bean("Plain").unwrap();
    assert_eq!(
        plain.business_interface_bindings.get("com.x.Plain").map(String::as_str),
        Some("ejblocal:Plain")
    );
}

// ========================================
// Simple, component and home bindings
// ========================================

#[test]
fn test_simple_binding_name() {
    let classes = cart_classes();
    let mut binding = SessionBinding::new("Cart");
    binding.simple_binding_name = Some(" shop/Cart ".to_string());
    binding.component_id = Some("shop-cart".to_string());

    let result = run(with_binding(binding), &classes, OnError::Fail, false).unwrap();

    let cart = result.bean("Cart").unwrap();
    assert_eq!(cart.simple_binding_name.as_deref(), Some("shop/Cart"));
    assert_eq!(cart.component_id.as_deref(), Some("shop-cart"));
}

#[test]
fn test_simple_binding_with_interface_binding_is_always_fatal() {
    let classes = cart_classes();
    let mut binding = SessionBinding::new("Cart").with_interface("com.x.CartRemote", "ejb/CartRemote");
    binding.simple_binding_name = Some("shop/Cart".to_string());

    let code = binding_code(run(with_binding(binding), &classes, OnError::Ignore, false));
    assert_eq!(code, "CNTR0130E");
}

#[test]
fn test_component_id_with_namespace_follows_policy() {
    let classes = cart_classes();
    let mut binding = SessionBinding::new("Cart");
    binding.component_id = Some("java:global/Cart".to_string());

    let result = run(with_binding(binding), &classes, OnError::Warn, false).unwrap();
    assert_eq!(result.bean("Cart").unwrap().component_id, None);
    assert_eq!(result.warnings[0].code, "CNTR0339W");
}

#[test]
fn test_home_binding_without_home_is_always_fatal() {
    let classes = cart_classes();
    let mut binding = SessionBinding::new("Cart");
    binding.local_home_binding_name = Some("ejblocal:CartHome".to_string());

    let code = binding_code(run(with_binding(binding), &classes, OnError::Warn, false));
    assert_eq!(code, "CNTR0141E");
}

#[test]
fn test_home_bindings() {
    let classes = index(vec![
        bean_class("com.x.LegacyBean", vec![], &[]),
        interface("com.x.LegacyHome", &["create"]),
        interface("com.x.Legacy", &["work"]),
    ]);
    let mut legacy = session("Legacy", Some("com.x.LegacyBean"), Some(SessionType::Stateless));
    legacy.home = Some("com.x.LegacyHome".to_string());
    legacy.remote = Some("com.x.Legacy".to_string());
    let mut descriptors = descriptors(vec![EnterpriseBean::Session(legacy)]);
    let mut binding = SessionBinding::new("Legacy");
    binding.remote_home_binding_name = Some("ejb/LegacyHome".to_string());
    descriptors.ejb_jar_bnd = Some(EjbJarBnd {
        enterprise_beans: vec![BeanBinding::Session(binding)],
        ..Default::default()
    });

    let result = run(descriptors, &classes, OnError::Fail, false).unwrap();

    let legacy = result.bean("Legacy").unwrap();
    assert_eq!(legacy.remote_home_binding_name.as_deref(), Some("ejb/LegacyHome"));
    assert!(legacy.method(MethodInterface::Home, "create").is_some());
    assert!(legacy.method(MethodInterface::Remote, "work").is_some());
}

#[test]
fn test_blank_home_binding_without_home_follows_policy() {
    let classes = cart_classes();
    let binding = || {
        let mut binding = SessionBinding::new("Cart");
        binding.local_home_binding_name = Some("   ".to_string());
        binding
    };

    let warned = run(with_binding(binding()), &classes, OnError::Warn, false).unwrap();
    assert_eq!(warned.bean("Cart").unwrap().local_home_binding_name, None);
    assert_eq!(warned.warnings.len(), 1);
    assert_eq!(warned.warnings[0].code, "CNTR0138E");

    let ignored = run(with_binding(binding()), &classes, OnError::Ignore, false).unwrap();
    assert_eq!(ignored.bean("Cart").unwrap().local_home_binding_name, None);
    assert!(ignored.warnings.is_empty());

    let code = binding_code(run(with_binding(binding()), &classes, OnError::Fail, false));
    assert_eq!(code, "CNTR0138E");
}

#[test]
fn test_blank_remote_home_binding_without_home_is_not_fatal() {
    let classes = cart_classes();
    let mut binding = SessionBinding::new("Cart");
    binding.remote_home_binding_name = Some("".to_string());

    let result = run(with_binding(binding), &classes, OnError::Ignore, false).unwrap();
    assert_eq!(result.bean("Cart").unwrap().remote_home_binding_name, None);
}

#[test]
fn test_simple_binding_with_blank_specific_bindings() {
    let classes = cart_classes();
    let binding = || {
        let mut binding = SessionBinding::new("Cart").with_interface("com.x.Cart", "  ");
        binding.simple_binding_name = Some("ejb/Cart".to_string());
        binding.remote_home_binding_name = Some(" ".to_string());
        binding
    };

    let warned = run(with_binding(binding()), &classes, OnError::Warn, false).unwrap();
    let cart = warned.bean("Cart").unwrap();
    assert_eq!(cart.simple_binding_name.as_deref(), Some("ejb/Cart"));
    assert!(cart.business_interface_bindings.is_empty());
    let codes: Vec<&str> = warned.warnings.iter().map(|w| w.code).collect();
    assert_eq!(codes, vec!["CNTR0138E", "CNTR0138E"]);

    let ignored = run(with_binding(binding()), &classes, OnError::Ignore, false).unwrap();
    assert_eq!(ignored.bean("Cart").unwrap().simple_binding_name.as_deref(), Some("ejb/Cart"));
    assert!(ignored.warnings.is_empty());

    let code = binding_code(run(with_binding(binding()), &classes, OnError::Fail, false));
    assert_eq!(code, "CNTR0138E");
}

// ========================================
// Orphan entries
// ========================================

#[test]
fn test_orphan_and_incomplete_entries_are_warnings() {
    let classes = cart_classes();
    let mut descriptors = annotations_only();
    descriptors.ejb_jar_bnd = Some(EjbJarBnd {
        enterprise_beans: vec![
            BeanBinding::Session(SessionBinding::new("Ghost")),
            BeanBinding::MessageDriven(MessageDrivenBinding {
                name: Some("Cart".to_string()),
                ..Default::default()
            }),
            BeanBinding::MessageDriven(MessageDrivenBinding::default()),
        ],
        ..Default::default()
    });
    descriptors.ejb_jar_ext = Some(EjbJarExt {
        enterprise_beans: vec![BeanExtension::Session(SessionExtension::new("Phantom"))],
    });

    let result = run(descriptors, &classes, OnError::Fail, false).unwrap();

    let codes: Vec<&str> = result.warnings.iter().map(|w| w.code).collect();
    assert_eq!(codes, vec!["CNTR0169E", "CNTR0169E", "CNTR0142W", "CNTR0170W"]);
    assert!(result.bean("Cart").is_some());
}

// ========================================
// Message-driven beans
// ========================================

fn feed_module(binding: Option<MessageDrivenBinding>, link: Option<&str>) -> ModuleDescriptors {
    let mut feed = MessageDrivenBean::new("Feed");
    feed.ejb_class = Some("com.x.FeedBean".to_string());
    feed.messaging_type = Some("javax.jms.MessageListener".to_string());
    feed.message_destination_link = link.map(str::to_string);
    let mut descriptors = descriptors(vec![EnterpriseBean::MessageDriven(feed)]);
    descriptors.ejb_jar_bnd = Some(EjbJarBnd {
        enterprise_beans: binding.map(BeanBinding::MessageDriven).into_iter().collect(),
        message_destinations: vec![MessageDestinationBinding {
            name: "OrderQueue".to_string(),
            binding_name: "jms/orders".to_string(),
        }],
        ..Default::default()
    });
    descriptors
}

fn feed_classes() -> InMemoryClassIndex {
    let mut listener = interface("javax.jms.MessageListener", &[]);
    listener.methods = vec![method("onMessage", &["javax.jms.Message"])];
    index(vec![bean_class("com.x.FeedBean", vec![], &[]), listener])
}

#[test]
fn test_message_driven_defaults() {
    let classes = feed_classes();
    let result = run(feed_module(None, Some("orders.jar#OrderQueue")), &classes, OnError::Fail, false).unwrap();

    let feed = result.bean("Feed").unwrap();
    assert_eq!(feed.activation_spec_jndi_name.as_deref(), Some("shop/shop.jar/Feed"));
    assert_eq!(feed.destination_jndi_name.as_deref(), Some("jms/orders"));
    assert_eq!(feed.activation_policy, ActivationPolicy::Once);
    assert!(feed.method(MethodInterface::MessageEndpoint, "onMessage").is_some());
}

#[test]
fn test_unbound_destination_link_uses_link_name() {
    let classes = feed_classes();
    let result = run(feed_module(None, Some("AuditTopic")), &classes, OnError::Fail, false).unwrap();
    assert_eq!(
        result.bean("Feed").unwrap().destination_jndi_name.as_deref(),
        Some("AuditTopic")
    );
}

#[test]
fn test_message_driven_jca_binding() {
    let classes = feed_classes();
    let binding = MessageDrivenBinding {
        name: Some("Feed".to_string()),
        jca_adapter: Some(JcaAdapter {
            activation_spec_binding_name: Some(" jms/as/feed ".to_string()),
            activation_spec_auth_alias: Some("  ".to_string()),
            destination_binding_name: Some("jms/feed".to_string()),
        }),
        listener_port: None,
    };

    let result = run(feed_module(Some(binding), Some("OrderQueue")), &classes, OnError::Fail, false).unwrap();

    let feed = result.bean("Feed").unwrap();
    assert_eq!(feed.activation_spec_jndi_name.as_deref(), Some("jms/as/feed"));
    assert_eq!(feed.activation_spec_auth_alias, None);
    assert_eq!(feed.destination_jndi_name.as_deref(), Some("jms/feed"));
}

#[test]
fn test_listener_port_suppresses_default_activation_spec() {
    let classes = feed_classes();
    let binding = MessageDrivenBinding {
        name: Some("Feed".to_string()),
        jca_adapter: None,
        listener_port: Some("FeedPort".to_string()),
    };

    let result = run(feed_module(Some(binding), None), &classes, OnError::Fail, false).unwrap();

    let feed = result.bean("Feed").unwrap();
    assert_eq!(feed.listener_port.as_deref(), Some("FeedPort"));
    assert_eq!(feed.activation_spec_jndi_name, None);
    assert_eq!(feed.destination_jndi_name, None);
}

// ========================================
// Activation policy and session timeout
// ========================================

fn stateful_module(passivation_capable: Option<bool>, extension: Option<SessionExtension>) -> ModuleDescriptors {
    let mut cart = session("Cart", Some("com.x.CartBean"), Some(SessionType::Stateful));
    cart.passivation_capable = passivation_capable;
    let mut descriptors = descriptors(vec![EnterpriseBean::Session(cart)]);
    descriptors.ejb_jar_ext = extension.map(|ext| EjbJarExt {
        enterprise_beans: vec![BeanExtension::Session(ext)],
    });
    descriptors
}

fn cart_extension(policy: Option<ActivationPolicyType>, time_out: Option<u64>) -> SessionExtension {
    let mut ext = SessionExtension::new("Cart");
    ext.bean_cache = policy.map(|p| BeanCache {
        activation_policy: Some(p),
    });
    ext.time_out = time_out;
    ext
}

fn stateful_classes() -> InMemoryClassIndex {
    index(vec![bean_class("com.x.CartBean", vec![], &[])])
}

#[test]
fn test_declared_activation_policy_and_timeout() {
    let classes = stateful_classes();
    let ext = cart_extension(Some(ActivationPolicyType::Transaction), Some(600));

    let result = run(stateful_module(None, Some(ext)), &classes, OnError::Fail, false).unwrap();

    let cart = result.bean("Cart").unwrap();
    assert_eq!(cart.activation_policy, ActivationPolicy::Transaction);
    assert_eq!(cart.session_timeout_ms, Some(600_000));
    assert!(result.warnings.is_empty());
}

#[test]
fn test_policy_downgraded_when_not_passivation_capable() {
    let classes = stateful_classes();
    let ext = cart_extension(Some(ActivationPolicyType::ActivitySession), None);

    let result = run(stateful_module(Some(false), Some(ext)), &classes, OnError::Fail, false).unwrap();

    assert_eq!(result.bean("Cart").unwrap().activation_policy, ActivationPolicy::Once);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].code, "CNTR0332W");
}

#[test]
fn test_failover_default_policy() {
    let classes = stateful_classes();

    let result = run(stateful_module(None, None), &classes, OnError::Fail, true).unwrap();
    assert_eq!(result.bean("Cart").unwrap().activation_policy, ActivationPolicy::Transaction);

    let result = run(stateful_module(None, None), &classes, OnError::Fail, false).unwrap();
    assert_eq!(result.bean("Cart").unwrap().activation_policy, ActivationPolicy::Once);
}

#[test]
fn test_failover_promotes_declared_once() {
    let classes = stateful_classes();
    let ext = || cart_extension(Some(ActivationPolicyType::Once), None);

    let result = run(stateful_module(None, Some(ext())), &classes, OnError::Fail, true).unwrap();
    assert_eq!(result.bean("Cart").unwrap().activation_policy, ActivationPolicy::Transaction);
    assert!(result.warnings.is_empty());

    let result = run(stateful_module(None, Some(ext())), &classes, OnError::Fail, false).unwrap();
    assert_eq!(result.bean("Cart").unwrap().activation_policy, ActivationPolicy::Once);
}

#[test]
fn test_failover_promotes_downgraded_policy() {
    let classes = stateful_classes();
    let ext = cart_extension(Some(ActivationPolicyType::ActivitySession), None);

    let result = run(stateful_module(Some(false), Some(ext)), &classes, OnError::Fail, true).unwrap();

    assert_eq!(result.bean("Cart").unwrap().activation_policy, ActivationPolicy::Transaction);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].code, "CNTR0332W");
}

// ========================================
// Run-as
// ========================================

#[test]
fn test_run_as_modes_resolved_per_method() {
    let classes = cart_classes();
    let mut ext = SessionExtension::new("Cart");
    ext.run_as_modes = vec![
        RunAsMode {
            identity: RunAsIdentity::SpecifiedIdentity {
                role: Some("shopper".to_string()),
            },
            methods: vec![ExtensionMethod::new("*", MethodType::Unspecified, None)],
        },
        RunAsMode {
            identity: RunAsIdentity::SystemIdentity,
            methods: vec![ExtensionMethod::new("clear", MethodType::Local, Some(""))],
        },
    ];
    let mut descriptors = annotations_only();
    descriptors.ejb_jar_ext = Some(EjbJarExt {
        enterprise_beans: vec![BeanExtension::Session(ext)],
    });

    let result = run(descriptors, &classes, OnError::Fail, false).unwrap();

    let cart = result.bean("Cart").unwrap();
    let shopper = Some(RunAs::SpecifiedIdentity {
        role: Some("shopper".to_string()),
    });
    assert_eq!(cart.method(MethodInterface::Local, "add").unwrap().run_as, shopper);
    assert_eq!(cart.method(MethodInterface::Remote, "checkout").unwrap().run_as, shopper);
    assert_eq!(
        cart.method(MethodInterface::Local, "clear").unwrap().run_as,
        Some(RunAs::SystemIdentity)
    );
}

#[test]
fn test_orchestration_is_repeatable() {
    let classes = cart_classes();
    let module = merge(
        with_binding(SessionBinding::new("Cart").with_interface("com.x.Cart", "bad-local")),
        &classes,
    )
    .unwrap();
    let orchestrator = EjbMdOrchestrator::new(
        OrchestratorConfig {
            on_error: OnError::Warn,
            sfsb_failover: false,
        },
        &classes,
    );

    let first = orchestrator.process_module(&module).unwrap();
    let second = orchestrator.process_module(&module).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.warnings.len(), 1);
}

#[test]
fn test_local_bean_annotation_exposes_class_methods() {
    let mut plain = bean_class("com.x.Counter", vec![stateless(None), ClassAnnotation::LocalBean], &[]);
    plain.methods = vec![method("increment", &["int"])];
    let classes = index(vec![plain]);

    let result = run(annotations_only(), &classes, OnError::Fail, false).unwrap();

    let counter = result.bean("Counter").unwrap();
    let increment = counter.method(MethodInterface::Local, "increment").unwrap();
    assert_eq!(increment.params, vec!["int"]);
}
