//! Diagnostics
//!
//! Collects errors and notes during the mapping passes. Passes keep going
//! after an error so that a single run reports every problem; the pipeline
//! refuses to hand a pass's output on when it carries errors.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // === Structural ===
    /// Two independent sources produce the same field name in one directory
    DuplicateField,
    /// Two root entities share a name under the fake root
    DuplicateRootEntry,
    /// Node kind the traversal does not understand
    UnknownNodeKind,
    /// Config-true list without a key
    MissingListKey,
    /// Declared key leaf is not a child of the list
    UnknownListKey,
    /// Leafref key could not be followed into config/state
    UnresolvedKeyLeafref,
    /// Key resolution asked for on something that is not a list
    NotAList,
    /// Two identities produce the same name
    IdentityNameConflict,

    // === Type Mapping ===
    /// More than one inline enumeration in one union
    MultipleInlineEnums,
    /// Union without members
    EmptyUnion,
    /// Identityref without a base identity
    MissingIdentityBase,
    /// Enumerated type with no enumeration entity for its context
    EnumWithoutContext,
    /// Leafref target not present in the schema tree index
    UnresolvedLeafref,
    /// Type kind with no mapping
    UnsupportedType,
    /// Leaf or leaf-list without a type
    MissingType,

    // === Informational ===
    /// Keyless read-only list, mapped to an unkeyed sequence
    KeylessList,
    /// Union collapsed to its single distinct member
    UnionSimplified,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateField => "E101",
            Self::DuplicateRootEntry => "E102",
            Self::UnknownNodeKind => "E103",
            Self::MissingListKey => "E104",
            Self::UnknownListKey => "E105",
            Self::UnresolvedKeyLeafref => "E106",
            Self::NotAList => "E107",
            Self::IdentityNameConflict => "E108",
            Self::MultipleInlineEnums => "E201",
            Self::EmptyUnion => "E202",
            Self::MissingIdentityBase => "E203",
            Self::EnumWithoutContext => "E204",
            Self::UnresolvedLeafref => "E205",
            Self::UnsupportedType => "E206",
            Self::MissingType => "E207",
            Self::KeylessList => "I001",
            Self::UnionSimplified => "I002",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::KeylessList | Self::UnionSimplified => Severity::Info,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Schema path the diagnostic is about
    pub path: String,
    pub code: DiagnosticCode,
    pub message: String,
    /// Additional context (related paths, hints)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(path: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.path
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of diagnostics from the mapping passes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DiagnosticItem) {
        self.items.push(item);
    }

    /// Add an error; `code` must be an error code
    pub fn error(&mut self, path: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) {
        debug_assert_eq!(code.severity(), Severity::Error, "{} is not an error code", code);
        self.push(DiagnosticItem::new(path, code, message));
    }

    /// Add an informational note; `code` must be an info code
    pub fn info(&mut self, path: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) {
        debug_assert_eq!(code.severity(), Severity::Info, "{} is not an info code", code);
        self.push(DiagnosticItem::new(path, code, message));
    }

    /// Add diagnostic for a field name produced twice
    pub fn duplicate_field(&mut self, dir_path: &str, name: &str, first: &str, second: &str) {
        self.push(
            DiagnosticItem::new(
                dir_path,
                DiagnosticCode::DuplicateField,
                format!("duplicate field name {} in {}", name, dir_path),
            )
            .with_context(format!("first: {}", first))
            .with_context(format!("second: {}", second)),
        );
    }

    /// Add diagnostic for an unresolved leafref
    pub fn unresolved_leafref(&mut self, path: impl Into<String>, target: &str) {
        self.push(DiagnosticItem::new(
            path,
            DiagnosticCode::UnresolvedLeafref,
            format!("leafref target '{}' not found in schema tree", target),
        ));
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Error)
    }

    pub fn notes(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() != Severity::Error)
    }

    /// Does any item carry this code?
    pub fn contains(&self, code: DiagnosticCode) -> bool {
        self.items.iter().any(|i| i.code == code)
    }

    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Merge another Diagnostics into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Order by path, then code, then message, dropping exact duplicates
    pub fn sort(&mut self) {
        self.items.sort_by(|a, b| {
            (&a.path, a.code, &a.message, &a.context).cmp(&(&b.path, b.code, &b.message, &b.context))
        });
        self.items.dedup();
    }

    /// Only the non-error items
    pub fn without_errors(&self) -> Diagnostics {
        Self {
            items: self.notes().cloned().collect(),
        }
    }

    /// `Ok(value)` when no errors were collected, the whole batch otherwise
    pub fn into_result<T>(mut self, value: T) -> Result<T, Diagnostics> {
        if self.has_errors() {
            self.sort();
            Err(self)
        } else {
            Ok(value)
        }
    }

    /// Format all diagnostics for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }

        if self.has_errors() {
            output.push_str(&format!("\n{} error(s)\n", self.error_count()));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticItem;
    type IntoIter = std::vec::IntoIter<DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Extend<DiagnosticItem> for Diagnostics {
    fn extend<I: IntoIterator<Item = DiagnosticItem>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}
