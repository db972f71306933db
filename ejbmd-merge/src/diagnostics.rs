//! Diagnostic records and the stable error-code taxonomy
//!
//! Every configuration problem found while merging or validating a module is
//! recorded as a [`Diagnostic`] with a stable message code. Operators script
//! against these codes, so a kind's code never changes once published.

use serde::Serialize;
use std::fmt;

/// Whether a diagnostic blocks deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Kinds of configuration problems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    DuplicateEjb,
    UnspecifiedClass,
    UnspecifiedSessionType,
    IncompatibleBeanKind,
    IncompatibleBeanType,
    IncompatibleDescriptorBeanType,
    IncompatibleClassDeclaration,
    IncompatibleDescriptorClass,
    IncompatibleDefaultBusinessInterfaceType,
    DefaultImplementsNone,
    IncompatibleInterfaceType,
    ImplementsInterfaceTypeValue,
    ClassNotFound,
    InvalidJndiBindingCombination,
    ImproperLocalJndiBindingPrefix,
    ImproperRemoteJndiBindingPrefix,
    BlankJndiBindingName,
    MultipleJndiBindingNames,
    JndiBindingHasNoCorrespondingInterface,
    JndiBindingHasNoCorrespondingHomeInterface,
    IncompleteBinding,
    OrphanBindingEntry,
    OrphanExtensionEntry,
    ActivationPolicyIgnored,
    NamespaceInJndiBindingName,
    NamespaceInLocalJndiBindingName,
}

impl ErrorKind {
    /// Stable message code
    pub const fn code(self) -> &'static str {
        match self {
            ErrorKind::DuplicateEjb => "CNTR4100E",
            ErrorKind::UnspecifiedClass => "CNTR4101E",
            ErrorKind::UnspecifiedSessionType => "CNTR4102E",
            ErrorKind::IncompatibleBeanKind => "CNTR4103E",
            ErrorKind::IncompatibleBeanType => "CNTR4104E",
            ErrorKind::IncompatibleDescriptorBeanType => "CNTR4105E",
            ErrorKind::IncompatibleClassDeclaration => "CNTR4106E",
            ErrorKind::IncompatibleDescriptorClass => "CNTR4114E",
            ErrorKind::IncompatibleDefaultBusinessInterfaceType => "CNTR4107E",
            ErrorKind::DefaultImplementsNone => "CNTR4108E",
            ErrorKind::IncompatibleInterfaceType => "CNTR4110E",
            ErrorKind::ImplementsInterfaceTypeValue => "CNTR4111E",
            ErrorKind::ClassNotFound => "CNTR4115E",
            ErrorKind::InvalidJndiBindingCombination => "CNTR0130E",
            ErrorKind::ImproperLocalJndiBindingPrefix => "CNTR0136E",
            ErrorKind::ImproperRemoteJndiBindingPrefix => "CNTR0137E",
            ErrorKind::BlankJndiBindingName => "CNTR0138E",
            ErrorKind::MultipleJndiBindingNames => "CNTR0139E",
            ErrorKind::JndiBindingHasNoCorrespondingInterface => "CNTR0140E",
            ErrorKind::JndiBindingHasNoCorrespondingHomeInterface => "CNTR0141E",
            ErrorKind::IncompleteBinding => "CNTR0142W",
            ErrorKind::OrphanBindingEntry => "CNTR0169E",
            ErrorKind::OrphanExtensionEntry => "CNTR0170W",
            ErrorKind::ActivationPolicyIgnored => "CNTR0332W",
            ErrorKind::NamespaceInJndiBindingName => "CNTR0339W",
            ErrorKind::NamespaceInLocalJndiBindingName => "CNTR0340W",
        }
    }

    /// Severity when recorded outside the binding severity policy
    pub const fn severity(self) -> Severity {
        match self {
            ErrorKind::IncompleteBinding
            | ErrorKind::OrphanBindingEntry
            | ErrorKind::OrphanExtensionEntry
            | ErrorKind::ActivationPolicyIgnored
            | ErrorKind::NamespaceInJndiBindingName
            | ErrorKind::NamespaceInLocalJndiBindingName => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// True when the custom-bindings severity policy decides the outcome
    pub const fn is_policy_governed(self) -> bool {
        matches!(
            self,
            ErrorKind::ImproperLocalJndiBindingPrefix
                | ErrorKind::ImproperRemoteJndiBindingPrefix
                | ErrorKind::BlankJndiBindingName
                | ErrorKind::MultipleJndiBindingNames
                | ErrorKind::NamespaceInJndiBindingName
                | ErrorKind::NamespaceInLocalJndiBindingName
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One structured problem report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub severity: Severity,
    pub module: String,
    pub bean: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, module: &str, bean: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: kind.code(),
            severity: kind.severity(),
            module: module.to_string(),
            bean: bean.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.bean {
            Some(bean) => write!(f, "{} {}: {}", self.code, bean, self.message),
            None => write!(f, "{} {}: {}", self.code, self.module, self.message),
        }
    }
}

/// Accumulator threaded through every merge stage
///
/// Recording an error never stops processing; the factory checks
/// [`Diagnostics::has_errors`] once every bean has been merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.entries.iter().filter(|d| d.is_error()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// True if any entry has the given kind
    pub fn contains(&self, kind: ErrorKind) -> bool {
        self.entries.iter().any(|d| d.kind == kind)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}
