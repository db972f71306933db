//! Builders shared by the ejbmd-merge integration tests

#![allow(dead_code)]

use ejbmd_common::class_index::{ClassAnnotation, ClassInfo, InMemoryClassIndex, MethodAnnotation, MethodInfo};
use ejbmd_common::config::RuntimeVersion;
use ejbmd_common::descriptor::{EjbJar, EnterpriseBean, ModuleDescriptors, SessionBean, SessionType};
use ejbmd_merge::{Error, FactoryOptions, ModuleInitData, ModuleInitDataFactory};

pub const MODULE: &str = "shop.jar";
pub const APP: &str = "shop";

/// Class carrying the given annotations and implements clause
pub fn bean_class(name: &str, annotations: Vec<ClassAnnotation>, interfaces: &[&str]) -> ClassInfo {
    let mut class = ClassInfo::new(name);
    class.annotations = annotations;
    class.interfaces = interfaces.iter().map(|i| i.to_string()).collect();
    class
}

/// Interface declaring the given no-argument methods
pub fn interface(name: &str, methods: &[&str]) -> ClassInfo {
    let mut class = ClassInfo::new(name);
    class.is_interface = true;
    class.methods = methods.iter().map(|m| method(m, &[])).collect();
    class
}

pub fn method(name: &str, params: &[&str]) -> MethodInfo {
    MethodInfo {
        name: name.to_string(),
        params: params.iter().map(|p| p.to_string()).collect(),
        annotations: vec![],
    }
}

pub fn annotated_method(name: &str, annotation: MethodAnnotation) -> MethodInfo {
    MethodInfo {
        name: name.to_string(),
        params: vec![],
        annotations: vec![annotation],
    }
}

pub fn stateless(name: Option<&str>) -> ClassAnnotation {
    ClassAnnotation::Stateless {
        name: name.map(str::to_string),
    }
}

pub fn stateful(name: Option<&str>) -> ClassAnnotation {
    ClassAnnotation::Stateful {
        name: name.map(str::to_string),
        passivation_capable: None,
    }
}

pub fn remote(interfaces: &[&str]) -> ClassAnnotation {
    ClassAnnotation::Remote {
        interfaces: interfaces.iter().map(|i| i.to_string()).collect(),
    }
}

pub fn local(interfaces: &[&str]) -> ClassAnnotation {
    ClassAnnotation::Local {
        interfaces: interfaces.iter().map(|i| i.to_string()).collect(),
    }
}

/// Descriptor session entry
pub fn session(name: &str, class: Option<&str>, session_type: Option<SessionType>) -> SessionBean {
    let mut bean = SessionBean::new(name);
    bean.ejb_class = class.map(str::to_string);
    bean.session_type = session_type;
    bean
}

/// Module with an ejb-jar at version 3.2 holding `beans`
pub fn descriptors(beans: Vec<EnterpriseBean>) -> ModuleDescriptors {
    let mut descriptors = ModuleDescriptors::new(MODULE);
    descriptors.app_name = Some(APP.to_string());
    descriptors.ejb_jar = Some(EjbJar {
        version: Some("3.2".to_string()),
        enterprise_beans: beans,
        ..Default::default()
    });
    descriptors
}

/// Module with no deployment descriptor
pub fn annotations_only() -> ModuleDescriptors {
    let mut descriptors = ModuleDescriptors::new(MODULE);
    descriptors.app_name = Some(APP.to_string());
    descriptors
}

pub fn index(classes: Vec<ClassInfo>) -> InMemoryClassIndex {
    classes.into_iter().collect()
}

pub fn merge(descriptors: ModuleDescriptors, classes: &InMemoryClassIndex) -> Result<ModuleInitData, Error> {
    ModuleInitDataFactory::default().create_module_init_data(descriptors, classes)
}

pub fn merge_with_version(
    descriptors: ModuleDescriptors,
    classes: &InMemoryClassIndex,
    runtime_version: RuntimeVersion,
) -> Result<ModuleInitData, Error> {
    let options = FactoryOptions {
        runtime_version,
        ..Default::default()
    };
    ModuleInitDataFactory::new(options).create_module_init_data(descriptors, classes)
}

/// Codes of every diagnostic carried by a failed merge
pub fn error_codes(result: Result<ModuleInitData, Error>) -> Vec<&'static str> {
    match result {
        Ok(module) => panic!("expected merge of {} to fail", module.name),
        Err(e) => e.diagnostics().iter().map(|d| d.code).collect(),
    }
}
