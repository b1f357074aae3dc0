//! Diagnostic rendering for lowering errors
//!
//! Wraps `codespan-reporting` so a `LowerError` can be shown against the source
//! text of the file it came from.

use crate::error::LowerError;
use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, LabelStyle, Severity};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{Buffer, ColorChoice, StandardStream};
use serde::{Deserialize, Serialize};
use strata_ir::Span;

/// Error code for a diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    /// The code text
    pub fn as_str(&self) -> &str {
        self.0
    }
}

/// A diagnostic message with source code context
pub struct Diagnostic {
    inner: CsDiagnostic<usize>,
    code: Option<ErrorCode>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            inner: CsDiagnostic::new(severity).with_message(message),
            code: None,
        }
    }

    /// Create an error diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create an internal-defect diagnostic
    pub fn bug(message: impl Into<String>) -> Self {
        Self::new(Severity::Bug, message)
    }

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.inner = self.inner.with_code(code.0);
        self.code = Some(code);
        self
    }

    /// Add a primary label (main error location)
    pub fn with_primary_label(mut self, file_id: usize, span: Span, message: impl Into<String>) -> Self {
        let label = Label::primary(file_id, span.start as usize..span.end as usize).with_message(message);
        self.inner.labels.push(label);
        self
    }

    /// Add a secondary label (related location)
    pub fn with_secondary_label(mut self, file_id: usize, span: Span, message: impl Into<String>) -> Self {
        let label = Label::secondary(file_id, span.start as usize..span.end as usize).with_message(message);
        self.inner.labels.push(label);
        self
    }

    /// Add a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.inner.notes.push(note.into());
        self
    }

    /// Add a help suggestion
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.inner.notes.push(format!("help: {}", help.into()));
        self
    }

    /// Create a diagnostic from a lowering error raised for the source file
    /// registered as `file_id`
    pub fn from_lower_error(error: &LowerError, file_id: usize) -> Self {
        let code = ErrorCode(error.code());
        match error {
            LowerError::FrontEndContract { violations, .. } => {
                let mut diag = Diagnostic::bug("Input program violates the resolution contract").with_code(code);
                for violation in violations {
                    diag = diag.with_note(violation.to_string());
                }
                diag
            }

            LowerError::NameClash {
                name, declarations, ..
            } => {
                let mut diag =
                    Diagnostic::error(format!("Conflicting declarations: '{}'", name)).with_code(code);
                if let Some((first, rest)) = declarations.split_first() {
                    diag = diag.with_primary_label(file_id, first.span, format!("{} '{}' declared here", first.kind, name));
                    for site in rest {
                        diag = diag.with_secondary_label(file_id, site.span, format!("{} with the same name", site.kind));
                    }
                }
                diag.with_help("rename one of the declarations or give it an explicit target name")
            }

            LowerError::AbstractMemberNotImplemented {
                class_name,
                member_name,
                interface,
                span,
                ..
            } => Diagnostic::error(format!(
                "Class '{}' is not abstract and does not implement abstract member '{}'",
                class_name, member_name
            ))
            .with_code(code)
            .with_primary_label(file_id, *span, format!("missing '{}'", member_name))
            .with_note(format!("'{}' is declared by implicit interface '{}'", member_name, interface)),

            LowerError::PipelineOrdering { pass, message, .. } => {
                Diagnostic::bug(format!("Lowering pipeline misconfigured at '{}'", pass))
                    .with_code(code)
                    .with_note(message.clone())
            }

            LowerError::NonLocalJump { jump, span, .. } => Diagnostic::error(format!(
                "'{}' cannot leave this multi-branch value",
                jump
            ))
            .with_code(code)
            .with_primary_label(file_id, *span, "this value is evaluated in a local function")
            .with_help(format!("move the '{}' out of the multi-branch or use the multi-branch as a statement", jump)),

            LowerError::DanglingSymbol { symbol, .. } => {
                Diagnostic::bug(format!("Symbol {} does not resolve after lowering", symbol)).with_code(code)
            }

            LowerError::Ir(inner) => Diagnostic::bug(inner.to_string()).with_code(code),
        }
    }

    /// Emit the diagnostic to stderr with colors
    pub fn emit(&self, files: &SimpleFiles<String, String>) -> Result<(), codespan_reporting::files::Error> {
        let mut writer = StandardStream::stderr(ColorChoice::Auto);
        let config = term::Config::default();
        term::emit(&mut writer, &config, files, &self.inner)
    }

    /// Render without colors
    pub fn to_string_plain(&self, files: &SimpleFiles<String, String>) -> Result<String, codespan_reporting::files::Error> {
        let mut buffer = Buffer::no_color();
        let config = term::Config::default();
        term::emit(&mut buffer, &config, files, &self.inner)?;
        Ok(String::from_utf8_lossy(buffer.as_slice()).into_owned())
    }

    /// Get the underlying codespan diagnostic
    pub fn inner(&self) -> &CsDiagnostic<usize> {
        &self.inner
    }

    /// Error code, if set
    pub fn code(&self) -> Option<&ErrorCode> {
        self.code.as_ref()
    }

    /// Convert to JSON
    pub fn to_json(&self, files: &SimpleFiles<String, String>) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&JsonDiagnostic::from_diagnostic(self, files))
    }
}

/// JSON representation of a diagnostic
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    /// Error code (e.g., "L0002")
    pub code: Option<String>,
    /// Severity level
    pub severity: String,
    /// Main message
    pub message: String,
    /// Source locations with labels
    pub labels: Vec<JsonLabel>,
    /// Notes and help
    pub notes: Vec<String>,
}

/// JSON representation of a diagnostic label
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLabel {
    /// File name
    pub file: String,
    /// Start line (1-indexed)
    pub start_line: usize,
    /// Start column (1-indexed)
    pub start_column: usize,
    /// Label message
    pub message: String,
    /// "primary" or "secondary"
    pub style: String,
}

impl JsonDiagnostic {
    /// Convert a Diagnostic to its JSON representation
    pub fn from_diagnostic(diag: &Diagnostic, files: &SimpleFiles<String, String>) -> Self {
        let severity = match diag.inner.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
            Severity::Bug => "bug",
        };

        let labels = diag
            .inner
            .labels
            .iter()
            .filter_map(|label| {
                let file = files.get(label.file_id).ok()?;
                let start = file.location((), label.range.start).ok()?;
                Some(JsonLabel {
                    file: file.name().to_string(),
                    start_line: start.line_number,
                    start_column: start.column_number,
                    message: label.message.clone(),
                    style: match label.style {
                        LabelStyle::Primary => "primary",
                        LabelStyle::Secondary => "secondary",
                    }
                    .to_string(),
                })
            })
            .collect();

        JsonDiagnostic {
            code: diag.code.as_ref().map(|c| c.0.to_string()),
            severity: severity.to_string(),
            message: diag.inner.message.clone(),
            labels,
            notes: diag.inner.notes.clone(),
        }
    }
}

/// Create a `SimpleFiles` holding one source file
pub fn create_files(name: impl Into<String>, source: impl Into<String>) -> SimpleFiles<String, String> {
    let mut files = SimpleFiles::new();
    files.add(name.into(), source.into());
    files
}
