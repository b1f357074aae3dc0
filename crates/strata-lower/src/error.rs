//! Lowering errors
//!
//! A shape a pass does not handle is never an error (the pass answers
//! `Transformation::NoChange`). The variants below are the failures that abort the
//! lowering of a file.

use serde::Serialize;
use strata_ir::{DeclId, FileId, IrError, Span, Violation};
use thiserror::Error;

/// Result type for lowering operations
pub type LowerResult<T> = Result<T, LowerError>;

/// One declaration taking part in a name clash
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClashSite {
    /// The declaration
    pub symbol: DeclId,
    /// Its kind ("function", "field", ...)
    pub kind: &'static str,
    /// Its source position
    pub span: Span,
}

/// Errors raised while lowering a file
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LowerError {
    /// The input graph has unresolved references or inconsistent types
    #[error("{file} violates the front-end contract: {}", summarize(.violations))]
    FrontEndContract {
        /// Offending file
        file: FileId,
        /// What is wrong
        violations: Vec<Violation>,
    },

    /// Sibling declarations end up with the same target name
    #[error("Conflicting declarations named '{name}' in {file}")]
    NameClash {
        /// File containing the clash
        file: FileId,
        /// The shared target name
        name: String,
        /// Every declaration with that name, in declaration order
        declarations: Vec<ClashSite>,
    },

    /// A class leaves a member of an implicit interface unimplemented
    #[error("Class '{class_name}' does not implement '{member_name}' of implicit interface '{interface}'")]
    AbstractMemberNotImplemented {
        /// File containing the class
        file: FileId,
        /// The class
        class: DeclId,
        /// The class name
        class_name: String,
        /// The missing member
        member: DeclId,
        /// The member name
        member_name: String,
        /// Name of the implicit interface declaring the member
        interface: String,
        /// Source position of the class
        span: Span,
    },

    /// A pass met a shape an earlier pass should have removed
    #[error("Pipeline ordering violated at '{pass}' in {file}: {message}")]
    PipelineOrdering {
        /// Pass or stage that detected the violation
        pass: &'static str,
        /// File being lowered
        file: FileId,
        /// Detail
        message: String,
    },

    /// A jump inside a multi-branch value would leave the local function the
    /// value is lowered into
    #[error("'{jump}' in {declaration} cannot leave a multi-branch value in {file}")]
    NonLocalJump {
        /// File being lowered
        file: FileId,
        /// Declaration whose code holds the multi-branch
        declaration: DeclId,
        /// `return`, `break` or `continue`
        jump: &'static str,
        /// Source position of the multi-branch or branch
        span: Span,
    },

    /// A symbol no longer resolves after lowering
    #[error("Dangling symbol {symbol} in {file} after lowering")]
    DanglingSymbol {
        /// File referencing the symbol
        file: FileId,
        /// The unbound symbol
        symbol: DeclId,
    },

    /// Arena operation failed
    #[error(transparent)]
    Ir(#[from] IrError),
}

fn summarize(violations: &[Violation]) -> String {
    match violations {
        [] => "no details".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

impl LowerError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            LowerError::FrontEndContract { .. } => "L0001",
            LowerError::NameClash { .. } => "L0002",
            LowerError::AbstractMemberNotImplemented { .. } => "L0003",
            LowerError::PipelineOrdering { .. } => "L0004",
            LowerError::DanglingSymbol { .. } => "L0005",
            LowerError::Ir(_) => "L0006",
            LowerError::NonLocalJump { .. } => "L0007",
        }
    }

    /// File the error belongs to, when known
    pub fn file(&self) -> Option<FileId> {
        match self {
            LowerError::FrontEndContract { file, .. }
            | LowerError::NameClash { file, .. }
            | LowerError::AbstractMemberNotImplemented { file, .. }
            | LowerError::PipelineOrdering { file, .. }
            | LowerError::DanglingSymbol { file, .. }
            | LowerError::NonLocalJump { file, .. } => Some(*file),
            LowerError::Ir(IrError::UnknownFile { file }) => Some(*file),
            LowerError::Ir(_) => None,
        }
    }

    /// Check whether the error is an internal defect rather than a user-facing problem
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            LowerError::PipelineOrdering { .. } | LowerError::DanglingSymbol { .. } | LowerError::Ir(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let file = FileId::new(0);
        let errors = [
            LowerError::FrontEndContract {
                file,
                violations: Vec::new(),
            },
            LowerError::NameClash {
                file,
                name: "a".to_string(),
                declarations: Vec::new(),
            },
            LowerError::PipelineOrdering {
                pass: "whens",
                file,
                message: String::new(),
            },
            LowerError::DanglingSymbol {
                file,
                symbol: DeclId::new(1),
            },
            LowerError::Ir(IrError::UnboundSymbol { symbol: DeclId::new(1) }),
            LowerError::NonLocalJump {
                file,
                declaration: DeclId::new(2),
                jump: "return",
                span: Span::default(),
            },
        ];
        let mut codes: Vec<&str> = errors.iter().map(LowerError::code).collect();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_ir_error_converts() {
        fn fails() -> LowerResult<()> {
            let resolved: Result<(), IrError> = Err(IrError::UnboundSymbol { symbol: DeclId::new(4) });
            resolved?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert_eq!(err.code(), "L0006");
        assert!(err.is_internal());
        assert_eq!(err.to_string(), "Unbound symbol s4");
    }

    #[test]
    fn test_display_pipeline_ordering() {
        let err = LowerError::PipelineOrdering {
            pass: "statement group",
            file: FileId::new(2),
            message: "when in statement position".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Pipeline ordering violated at 'statement group' in file2: when in statement position"
        );
        assert_eq!(err.file(), Some(FileId::new(2)));
    }
}
