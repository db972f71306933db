//! ejbmd-merge - EJB module metadata merge and orchestration
//!
//! Reconciles the deployment descriptor of a module with the annotations
//! found on its classes and produces one consistent description per bean.
//!
//! - [`merge`]: [`ModuleInitDataFactory`] builds the frozen
//!   [`ModuleInitData`] and reports every configuration error of a module
//!   in one aggregate [`Error::Configuration`]
//! - [`orchestrator`]: [`EjbMdOrchestrator`] validates custom bindings and
//!   resolves activation policy and run-as identities into
//!   [`ModuleMetaData`]

pub mod diagnostics;
pub mod error;
pub mod init_data;
pub mod merge;
pub mod orchestrator;

pub use diagnostics::{Diagnostic, Diagnostics, ErrorKind, Severity};
pub use error::{Error, Result};
pub use init_data::{BeanInitData, BeanType, J2eeName, ModuleInitData};
pub use merge::{FactoryOptions, ModuleInitDataFactory};
pub use orchestrator::{BeanMetaData, EjbMdOrchestrator, ModuleMetaData, OrchestratorConfig};
