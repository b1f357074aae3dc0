//! Lowering pipeline
//!
//! Passes run in four groups, in this order: file passes, declaration passes,
//! statement passes, expression passes. Within a group the order is the order
//! the passes were registered in.

mod driver;
mod engine;
mod stage;
mod walk;

pub use driver::{FileReport, Lowerer, LoweringReport, PassStat};
pub use stage::FileStage;

use crate::lowerings::{
    BuiltinGetterLowering, ComplexParamDefaultsLowering, ConstLambdaLiteralsLowering, GetterCallsLowering,
    ImportsLowering, TargetNamesLowering, WhenExpressionsLowering, WhenStatementsLowering,
    WhenSubjectExpressionsLowering, WhenSubjectNonNullLowering, WhenSubjectStatementsLowering,
};
use crate::transform::{DeclarationLowering, ExpressionLowering, FileLowering, StatementLowering};
use std::fmt;

/// Ordered pass registry
pub struct Pipeline {
    pub(crate) file: Vec<Box<dyn FileLowering>>,
    pub(crate) declaration: Vec<Box<dyn DeclarationLowering>>,
    pub(crate) statement: Vec<Box<dyn StatementLowering>>,
    pub(crate) expression: Vec<Box<dyn ExpressionLowering>>,
}

impl Pipeline {
    /// A pipeline without passes
    pub fn empty() -> Self {
        Self {
            file: Vec::new(),
            declaration: Vec::new(),
            statement: Vec::new(),
            expression: Vec::new(),
        }
    }

    /// The standard pass order
    ///
    /// Complex parameter defaults run before target names so the synthesized
    /// markers and factory constructors get their names in the same run. Subject
    /// non-null repair runs before subject wrapping, which runs before the
    /// multi-branch fold.
    pub fn standard() -> Self {
        Self::empty()
            .with_file_pass(ImportsLowering)
            .with_declaration_pass(ComplexParamDefaultsLowering)
            .with_declaration_pass(TargetNamesLowering)
            .with_declaration_pass(BuiltinGetterLowering)
            .with_statement_pass(WhenSubjectStatementsLowering)
            .with_statement_pass(WhenStatementsLowering)
            .with_expression_pass(WhenSubjectNonNullLowering)
            .with_expression_pass(WhenSubjectExpressionsLowering)
            .with_expression_pass(WhenExpressionsLowering)
            .with_expression_pass(ConstLambdaLiteralsLowering)
            .with_expression_pass(GetterCallsLowering)
    }

    /// Append a file pass
    pub fn with_file_pass(mut self, pass: impl FileLowering + 'static) -> Self {
        self.file.push(Box::new(pass));
        self
    }

    /// Append a declaration pass
    pub fn with_declaration_pass(mut self, pass: impl DeclarationLowering + 'static) -> Self {
        self.declaration.push(Box::new(pass));
        self
    }

    /// Append a statement pass
    pub fn with_statement_pass(mut self, pass: impl StatementLowering + 'static) -> Self {
        self.statement.push(Box::new(pass));
        self
    }

    /// Append an expression pass
    pub fn with_expression_pass(mut self, pass: impl ExpressionLowering + 'static) -> Self {
        self.expression.push(Box::new(pass));
        self
    }

    /// Pass names in run order
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.file
            .iter()
            .map(|p| p.name())
            .chain(self.declaration.iter().map(|p| p.name()))
            .chain(self.statement.iter().map(|p| p.name()))
            .chain(self.expression.iter().map(|p| p.name()))
            .collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline").field("passes", &self.pass_names()).finish()
    }
}
