//! Error types for schema loading and IR generation

use std::path::PathBuf;
use thiserror::Error;

use crate::mapping::Diagnostics;

/// Result type for crate operations
pub type Result<T> = std::result::Result<T, YgenError>;

/// Broad class of a failure, preserved from the parser through to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    FileNotFound,
    Syntax,
    UnresolvedReference,
    /// Structural or type-mapping problems found by the mapping passes
    Generation,
    /// IO, JSON and configuration failures
    Environment,
}

/// Crate-level errors
#[derive(Error, Debug)]
pub enum YgenError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("syntax error in {}: {message}", path.display())]
    Syntax { path: PathBuf, message: String },

    #[error("unresolved reference in module {module}: {reference}")]
    UnresolvedReference { module: String, reference: String },

    #[error("generation failed with {} error(s):\n{0}", .0.error_count())]
    Generation(Diagnostics),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl YgenError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FileNotFound(_) => ErrorCategory::FileNotFound,
            Self::Syntax { .. } => ErrorCategory::Syntax,
            Self::UnresolvedReference { .. } => ErrorCategory::UnresolvedReference,
            Self::Generation(_) => ErrorCategory::Generation,
            Self::Io(_) | Self::Json(_) | Self::Config(_) => ErrorCategory::Environment,
        }
    }

    /// Diagnostics carried by a generation failure
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::Generation(d) => Some(d),
            _ => None,
        }
    }
}

impl From<Diagnostics> for YgenError {
    fn from(diagnostics: Diagnostics) -> Self {
        Self::Generation(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::DiagnosticCode;

    #[test]
    fn test_messages_keep_category_substrings() {
        let err = YgenError::FileNotFound(PathBuf::from("a.json"));
        assert!(err.to_string().contains("file not found"));
        assert_eq!(err.category(), ErrorCategory::FileNotFound);

        let err = YgenError::Syntax {
            path: PathBuf::from("a.json"),
            message: "expected value".to_string(),
        };
        assert!(err.to_string().contains("syntax error"));

        let err = YgenError::UnresolvedReference {
            module: "a".to_string(),
            reference: "b".to_string(),
        };
        assert!(err.to_string().contains("unresolved reference"));
    }

    #[test]
    fn test_generation_error_lists_diagnostics() {
        let mut diags = Diagnostics::new();
        diags.error("/mod/a", DiagnosticCode::DuplicateField, "duplicate field name b in /mod/a");
        let err = YgenError::from(diags);
        assert_eq!(err.category(), ErrorCategory::Generation);
        assert!(err.to_string().contains("1 error(s)"));
        assert!(err.to_string().contains("duplicate field name b"));
    }
}
