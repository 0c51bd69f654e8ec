//! Structured diagnostics for recoverable problems.
//!
//! Components never print. They push a [`Diagnostic`] into a [`Diagnostics`]
//! collection and keep going; the command layer decides how to render them.
//!
//! # Kinds
//!
//! | Kind                        | Severity | Raised by          |
//! |-----------------------------|----------|--------------------|
//! | `InvalidMetadataDocument`   | warning  | metadata loader    |
//! | `InvalidFieldValue`         | warning  | metadata loader    |
//! | `UnresolvableReference`     | warning  | metadata / catalog |
//! | `WriteFailed`               | warning  | rewriter           |
//! | `AssetOutsideProjectRoot`   | note     | link resolver      |
//! | `AssetNotFound`             | note     | link resolver      |
//! | `UnreadableFile`            | note     | rewriter           |

use crate::log;
use std::fmt;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Note,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Metadata file is not JSON or not an object
    InvalidMetadataDocument,
    /// Known metadata key with a wrong type or value
    InvalidFieldValue,
    /// Page reference that does not resolve into the project
    UnresolvableReference,
    /// Rewritten file could not be written back
    WriteFailed,
    /// Asset reference resolving outside its project root
    AssetOutsideProjectRoot,
    /// Asset reference whose target does not exist
    AssetNotFound,
    /// File that is not valid UTF-8 text
    UnreadableFile,
}

impl DiagnosticKind {
    pub const fn severity(self) -> Severity {
        match self {
            Self::InvalidMetadataDocument
            | Self::InvalidFieldValue
            | Self::UnresolvableReference
            | Self::WriteFailed => Severity::Warning,
            Self::AssetOutsideProjectRoot | Self::AssetNotFound | Self::UnreadableFile => {
                Severity::Note
            }
        }
    }
}

/// A single recoverable problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// What the problem is about: a project id or a root-relative file path
    pub scope: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.scope, self.message)
    }
}

// ============================================================================
// Collection
// ============================================================================

/// Ordered collection of diagnostics produced during one run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        kind: DiagnosticKind,
        scope: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.items.push(Diagnostic {
            severity: kind.severity(),
            kind,
            scope: scope.into(),
            message: message.into(),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Print warnings, and notes too when `verbose` is set.
    pub fn emit(&self, verbose: bool) {
        for diagnostic in self.iter() {
            match diagnostic.severity {
                Severity::Warning => log!("warn"; "{diagnostic}"),
                Severity::Note if verbose => log!("note"; "{diagnostic}"),
                Severity::Note => {}
            }
        }
    }
}
