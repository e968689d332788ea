// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Validation findings.
//!
//! Findings are values rather than errors: the validator collects every one of
//! them into a [`Diagnostics`] report and the caller decides whether the report
//! blocks generation.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    DuplicateName,
    AddressConflict,
    FieldOverlap,
    FieldOutOfRegisterWidth,
    UnknownRegisterType,
    UnresolvedLockTarget,
    UnresolvedMagicTarget,
    MissingAddress,
    CyclicDependency,
    InvalidWidth,
    InvalidIdentifier,
    AddressOutOfRange,
    InvalidBusOption,
    MisalignedAddress,
    NonStandardDataWidth,
    ResetValueTruncated,
    MagicValueTruncated,
    TypeProtocolMismatch,
    UnusedField,
    MultiPortWriteCollision,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Where a finding applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "scope", rename_all = "lowercase")]
pub enum Location {
    /// The file as a whole (widths, protocol, options).
    Config,
    Register {
        register: String,
    },
    Field {
        register: String,
        field: String,
    },
}

impl Location {
    pub fn register(name: &str) -> Self {
        Location::Register {
            register: name.to_string(),
        }
    }

    pub fn field(register: &str, field: &str) -> Self {
        Location::Field {
            register: register.to_string(),
            field: field.to_string(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Config => f.write_str("<config>"),
            Location::Register { register } => f.write_str(register),
            Location::Field { register, field } => write!(f, "{register}.{field}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub location: Location,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}: {}",
            self.severity, self.kind, self.location, self.message
        )
    }
}

/// Ordered collection of findings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn error(&mut self, kind: DiagnosticKind, location: Location, message: impl Into<String>) {
        self.push(Diagnostic {
            severity: Severity::Error,
            kind,
            location,
            message: message.into(),
        });
    }

    pub fn warning(
        &mut self,
        kind: DiagnosticKind,
        location: Location,
        message: impl Into<String>,
    ) {
        self.push(Diagnostic {
            severity: Severity::Warning,
            kind,
            location,
            message: message.into(),
        });
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// True when any finding of `kind` is present.
    pub fn contains(&self, kind: DiagnosticKind) -> bool {
        self.items.iter().any(|d| d.kind == kind)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.items {
            writeln!(f, "{d}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
