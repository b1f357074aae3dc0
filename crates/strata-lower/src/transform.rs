//! Transformation protocol
//!
//! A lowering never splices its own result into the tree. It answers with a
//! `Transformation` and the pipeline driver applies it:
//!
//! | result               | declaration pass                          | statement pass          | expression pass                                     |
//! |----------------------|-------------------------------------------|-------------------------|-----------------------------------------------------|
//! | `NoChange`           | nothing                                   | nothing                 | nothing                                             |
//! | `Replace(x)`         | `x == self`: changed in place; else swap  | swap                    | swap                                                |
//! | `ReplaceWithMany(v)` | insert the detached ones after `self`     | splice into the block   | splice (statement position) or block (value position) |
//! | `Remove`             | destroy                                   | drop                    | drop (statement position only)                      |
//!
//! Replaced and inserted nodes are offered to the same pass exactly once more.

use crate::context::{LoweringContext, Scope};
use crate::error::LowerResult;
use strata_ir::{DeclId, Expr, IrFile, Stmt};

/// Result of one lowering step
#[derive(Debug, Clone, PartialEq)]
pub enum Transformation<T, M = Stmt> {
    /// The node is left as it is
    NoChange,
    /// The node is replaced by another node of the same kind
    Replace(T),
    /// The node is replaced by a sequence
    ReplaceWithMany(Vec<M>),
    /// The node is removed
    Remove,
}

impl<T, M> Transformation<T, M> {
    /// Check whether the result changes anything
    pub fn is_change(&self) -> bool {
        !matches!(self, Transformation::NoChange)
    }

    /// Short name of the result kind, used in traces
    pub fn kind(&self) -> &'static str {
        match self {
            Transformation::NoChange => "no-change",
            Transformation::Replace(_) => "replace",
            Transformation::ReplaceWithMany(_) => "replace-with-many",
            Transformation::Remove => "remove",
        }
    }
}

/// Order an expression pass sees a node relative to its children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    /// Parent before children
    Pre,
    /// Children before parent
    Post,
}

/// A pass over a whole file record (imports, top-level list)
pub trait FileLowering {
    /// Pass name, used in logs and reports
    fn name(&self) -> &'static str;

    /// Lower one file; `Replace` carries the new file record
    fn transform(&self, ctx: &mut LoweringContext<'_>, file: &IrFile) -> LowerResult<Transformation<IrFile>>;
}

/// A pass over member declarations (top-level, class members, property parts)
pub trait DeclarationLowering {
    /// Pass name, used in logs and reports
    fn name(&self) -> &'static str;

    /// Lower one declaration; the results name declarations by symbol, and new
    /// ones must be detached
    fn transform(
        &self,
        ctx: &mut LoweringContext<'_>,
        decl: DeclId,
        scope: &Scope,
    ) -> LowerResult<Transformation<DeclId, DeclId>>;
}

/// A pass over statements of every block
pub trait StatementLowering {
    /// Pass name, used in logs and reports
    fn name(&self) -> &'static str;

    /// Lower one statement
    ///
    /// The statement may be mutated only when the result is not `NoChange`.
    fn transform(
        &self,
        ctx: &mut LoweringContext<'_>,
        stmt: &mut Stmt,
        scope: &Scope,
    ) -> LowerResult<Transformation<Stmt>>;
}

/// A pass over every expression node
pub trait ExpressionLowering {
    /// Pass name, used in logs and reports
    fn name(&self) -> &'static str;

    /// Whether the pass sees parents before or after their children
    fn order(&self) -> TraversalOrder {
        TraversalOrder::Pre
    }

    /// Lower one expression
    ///
    /// The expression may be mutated only when the result is not `NoChange`.
    fn transform(
        &self,
        ctx: &mut LoweringContext<'_>,
        expr: &mut Expr,
        scope: &Scope,
    ) -> LowerResult<Transformation<Expr>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_change() {
        assert!(!Transformation::<Expr>::NoChange.is_change());
        assert!(Transformation::<Expr>::Remove.is_change());
        assert!(Transformation::<Expr>::ReplaceWithMany(Vec::new()).is_change());
        assert_eq!(Transformation::<Expr>::Replace(Expr::int(1)).kind(), "replace");
    }
}
