//! Reporting of recoverable resolution problems.
//!
//! A missing reference target does not abort a run: the walker reports a
//! [`Diagnostic`] to the configured [`DiagnosticSink`] and carries on. The
//! resolved documents can therefore still contain unresolved `$ref`s;
//! inspect the sink when full flattening is required.

use std::fmt;

use tracing::{error, warn};
use url::Url;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// The result is usable but may not be fully self-contained.
    Warning,
    /// A reference could not be resolved.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A recoverable problem found while resolving a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// How serious the problem is.
    pub severity: Severity,
    /// The document holding the reference.
    pub locator: Url,
    /// The reference as written.
    pub reference: String,
    /// A human readable description.
    pub message: String,
}

impl Diagnostic {
    /// A reference whose target pointer does not exist.
    pub fn missing_reference(locator: &Url, reference: &str) -> Self {
        Self {
            severity: Severity::Error,
            locator: locator.clone(),
            reference: reference.to_string(),
            message: "missing reference".to_string(),
        }
    }

    /// A non-fatal problem with a reference.
    pub fn warning(locator: &Url, reference: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            locator: locator.clone(),
            reference: reference.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            severity,
            locator,
            reference,
            message,
        } = self;
        write!(f, "{severity}: {message} '{reference}' in {locator}")
    }
}

/// Receives diagnostics as the walk goes.
pub trait DiagnosticSink {
    /// Records one diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// The default sink: logs every diagnostic with `tracing` and keeps it.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// All diagnostics, in report order.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Returns `true` if at least one [`Severity::Error`] was reported.
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    /// Number of diagnostics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DiagnosticSink for Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => {
                warn!(locator = %diagnostic.locator, reference = %diagnostic.reference, "{}", diagnostic.message);
            }
            Severity::Error => {
                error!(locator = %diagnostic.locator, reference = %diagnostic.reference, "{}", diagnostic.message);
            }
        }
        self.entries.push(diagnostic);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
