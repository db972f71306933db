//! Error types for the merge engine and orchestrator

use crate::diagnostics::{Diagnostic, Diagnostics};
use thiserror::Error;

/// Result type for merge and orchestration
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Aggregate raised once every bean of a module has been processed
    #[error("module {module} has {} configuration error(s):\n{diagnostics}", diagnostics.error_count())]
    Configuration {
        module: String,
        diagnostics: Diagnostics,
    },

    /// Binding violation that stops orchestration immediately
    #[error("{0}")]
    Binding(Diagnostic),

    #[error(transparent)]
    Common(#[from] ejbmd_common::Error),
}

impl Error {
    /// Diagnostics carried by this error
    pub fn diagnostics(&self) -> Vec<&Diagnostic> {
        match self {
            Error::Configuration { diagnostics, .. } => diagnostics.iter().collect(),
            Error::Binding(d) => vec![d],
            Error::Common(_) => Vec::new(),
        }
    }
}
