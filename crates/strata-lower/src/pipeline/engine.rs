//! Pass drivers
//!
//! One engine per pass kind. An engine walks the file, offers every node to its
//! pass and applies the `Transformation` it gets back. Nodes produced by a
//! replacement are offered to the same pass once more (`runs` counts down from
//! two), never again after that.

use super::walk::{block_position, walk_expr_children, walk_file, walk_stmt_children, CodeVisitor};
use crate::context::{LoweringContext, Position, Scope};
use crate::error::{LowerError, LowerResult};
use crate::transform::{
    DeclarationLowering, ExpressionLowering, StatementLowering, Transformation, TraversalOrder,
};
use strata_ir::{Block, Container, DeclId, DeclKind, Expr, Stmt};
use tracing::trace;

const FIRST_RUN: u8 = 2;

// ============================================================================
// Declarations
// ============================================================================

/// Drives a declaration pass over top-level declarations, class members and
/// property parts, parents first
pub(crate) struct DeclarationEngine<'p> {
    pass: &'p dyn DeclarationLowering,
    changes: usize,
}

impl<'p> DeclarationEngine<'p> {
    pub(crate) fn new(pass: &'p dyn DeclarationLowering) -> Self {
        Self { pass, changes: 0 }
    }

    /// Run the pass over the current file, returning the number of changes
    pub(crate) fn run(mut self, ctx: &mut LoweringContext<'_>) -> LowerResult<usize> {
        let top = ctx.program.file(ctx.file)?.declarations.clone();
        for id in top {
            self.lower(ctx, id, None, FIRST_RUN)?;
        }
        Ok(self.changes)
    }

    fn record(&mut self, id: DeclId, kind: &'static str) {
        self.changes += 1;
        trace!(pass = self.pass.name(), symbol = %id, result = kind, "declaration transformed");
    }

    fn lower(
        &mut self,
        ctx: &mut LoweringContext<'_>,
        id: DeclId,
        class: Option<DeclId>,
        runs: u8,
    ) -> LowerResult<()> {
        if !ctx.program.is_live(id) {
            return Ok(());
        }
        if runs > 0 {
            let scope = Scope::member(ctx.file, id, class);
            let result = self.pass.transform(ctx, id, &scope)?;
            let kind = result.kind();
            match result {
                Transformation::NoChange => {}
                Transformation::Replace(new) if new == id => self.record(id, kind),
                Transformation::Replace(new) => {
                    self.record(id, kind);
                    self.container(ctx, id)?;
                    ctx.program.replace_in_container(id, new)?;
                    ctx.program.destroy(id)?;
                    return self.lower(ctx, new, class, runs - 1);
                }
                Transformation::ReplaceWithMany(ids) => {
                    self.record(id, kind);
                    let container = self.container(ctx, id)?;
                    let mut anchor = id;
                    for &new in ids.iter().filter(|new| **new != id) {
                        ctx.program.insert_after(container, anchor, new)?;
                        anchor = new;
                    }
                    if !ids.contains(&id) {
                        ctx.program.destroy(id)?;
                    }
                    for new in ids {
                        if new == id {
                            self.descend(ctx, id, class)?;
                        } else {
                            self.lower(ctx, new, class, runs - 1)?;
                        }
                    }
                    return Ok(());
                }
                Transformation::Remove => {
                    self.record(id, kind);
                    ctx.program.destroy(id)?;
                    return Ok(());
                }
            }
        }
        self.descend(ctx, id, class)
    }

    fn descend(&mut self, ctx: &mut LoweringContext<'_>, id: DeclId, class: Option<DeclId>) -> LowerResult<()> {
        let (children, class) = match &ctx.program.resolve(id)?.kind {
            DeclKind::Class(c) => (c.members.clone(), Some(id)),
            DeclKind::Property(p) => (
                [p.backing_field, p.getter, p.setter].into_iter().flatten().collect(),
                class,
            ),
            _ => return Ok(()),
        };
        for child in children {
            self.lower(ctx, child, class, FIRST_RUN)?;
        }
        Ok(())
    }

    /// Container of a declaration that is about to be swapped out; property
    /// parts can only change in place
    fn container(&self, ctx: &LoweringContext<'_>, id: DeclId) -> LowerResult<Container> {
        ctx.program
            .container_of(id)?
            .ok_or_else(|| LowerError::PipelineOrdering {
                pass: self.pass.name(),
                file: ctx.file,
                message: format!("{} is not a file or class member and can only change in place", id),
            })
    }
}

// ============================================================================
// Statements
// ============================================================================

/// Drives a statement pass over every block of the file
pub(crate) struct StatementEngine<'p> {
    pass: &'p dyn StatementLowering,
    changes: usize,
}

impl<'p> StatementEngine<'p> {
    pub(crate) fn new(pass: &'p dyn StatementLowering) -> Self {
        Self { pass, changes: 0 }
    }

    /// Run the pass over the current file, returning the number of changes
    pub(crate) fn run(mut self, ctx: &mut LoweringContext<'_>) -> LowerResult<usize> {
        walk_file(&mut self, ctx)?;
        Ok(self.changes)
    }

    fn lower(
        &mut self,
        ctx: &mut LoweringContext<'_>,
        mut stmt: Stmt,
        scope: &Scope,
        runs: u8,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let result = if runs > 0 {
            self.pass.transform(ctx, &mut stmt, scope)?
        } else {
            Transformation::NoChange
        };
        if result.is_change() {
            self.changes += 1;
            trace!(pass = self.pass.name(), result = result.kind(), "statement transformed");
        }
        match result {
            Transformation::NoChange => {
                walk_stmt_children(self, ctx, &mut stmt, scope)?;
                out.push(stmt);
            }
            Transformation::Replace(new) => self.lower(ctx, new, scope, runs - 1, out)?,
            Transformation::ReplaceWithMany(statements) => {
                let len = statements.len();
                for (index, new) in statements.into_iter().enumerate() {
                    let position = if index + 1 == len {
                        scope.position
                    } else {
                        Position::Statement
                    };
                    self.lower(ctx, new, &scope.at(position), runs - 1, out)?;
                }
            }
            Transformation::Remove => {}
        }
        Ok(())
    }
}

impl CodeVisitor for StatementEngine<'_> {
    fn visit_block(
        &mut self,
        ctx: &mut LoweringContext<'_>,
        block: &mut Block,
        scope: &Scope,
        value_block: bool,
    ) -> LowerResult<()> {
        let statements = std::mem::take(&mut block.statements);
        let len = statements.len();
        let mut out = Vec::with_capacity(len);
        for (index, stmt) in statements.into_iter().enumerate() {
            let position = block_position(index, len, &stmt, value_block);
            self.lower(ctx, stmt, &scope.at(position), FIRST_RUN, &mut out)?;
        }
        block.statements = out;
        Ok(())
    }

    fn visit_expr(&mut self, ctx: &mut LoweringContext<'_>, expr: &mut Expr, scope: &Scope) -> LowerResult<()> {
        walk_expr_children(self, ctx, expr, scope)
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// What happened to an expression that is a direct statement of a block
enum Outcome {
    Keep,
    Splice {
        statements: Vec<Stmt>,
        runs: u8,
        descend: bool,
    },
    Removed,
}

/// Drives an expression pass over every expression of the file
pub(crate) struct ExpressionEngine<'p> {
    pass: &'p dyn ExpressionLowering,
    order: TraversalOrder,
    changes: usize,
}

impl<'p> ExpressionEngine<'p> {
    pub(crate) fn new(pass: &'p dyn ExpressionLowering) -> Self {
        Self {
            pass,
            order: pass.order(),
            changes: 0,
        }
    }

    /// Run the pass over the current file, returning the number of changes
    pub(crate) fn run(mut self, ctx: &mut LoweringContext<'_>) -> LowerResult<usize> {
        walk_file(&mut self, ctx)?;
        Ok(self.changes)
    }

    fn lower(
        &mut self,
        ctx: &mut LoweringContext<'_>,
        expr: &mut Expr,
        scope: &Scope,
        runs: u8,
        descend: bool,
    ) -> LowerResult<Outcome> {
        if self.order == TraversalOrder::Pre && runs > 0 {
            let result = self.pass.transform(ctx, expr, scope)?;
            if result.is_change() {
                return self.apply(ctx, expr, scope, result, runs - 1, descend);
            }
        }
        if descend {
            walk_expr_children(self, ctx, expr, scope)?;
        }
        if self.order == TraversalOrder::Post && runs > 0 {
            let result = self.pass.transform(ctx, expr, scope)?;
            if result.is_change() {
                return self.apply(ctx, expr, scope, result, runs - 1, false);
            }
        }
        Ok(Outcome::Keep)
    }

    fn apply(
        &mut self,
        ctx: &mut LoweringContext<'_>,
        expr: &mut Expr,
        scope: &Scope,
        result: Transformation<Expr>,
        runs: u8,
        descend: bool,
    ) -> LowerResult<Outcome> {
        self.changes += 1;
        trace!(pass = self.pass.name(), result = result.kind(), "expression transformed");
        match result {
            Transformation::NoChange => Ok(Outcome::Keep),
            Transformation::Replace(new) => {
                *expr = new;
                self.lower(ctx, expr, scope, runs, descend)
            }
            Transformation::ReplaceWithMany(statements) if scope.is_statement() => Ok(Outcome::Splice {
                statements,
                runs,
                descend,
            }),
            Transformation::ReplaceWithMany(statements) => {
                let span = expr.span;
                *expr = Expr::block(statements, expr.ty.clone()).with_span(span);
                self.lower(ctx, expr, scope, runs, descend)
            }
            Transformation::Remove if scope.is_statement() => Ok(Outcome::Removed),
            Transformation::Remove => Err(LowerError::PipelineOrdering {
                pass: self.pass.name(),
                file: ctx.file,
                message: "an expression in value position cannot be removed".to_string(),
            }),
        }
    }

    fn lower_stmt(
        &mut self,
        ctx: &mut LoweringContext<'_>,
        mut stmt: Stmt,
        scope: &Scope,
        runs: u8,
        descend: bool,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let outcome = match &mut stmt {
            Stmt::Expr(expr) => self.lower(ctx, expr, scope, runs, descend)?,
            other => {
                if descend {
                    walk_stmt_children(self, ctx, other, scope)?;
                }
                Outcome::Keep
            }
        };
        match outcome {
            Outcome::Keep => out.push(stmt),
            Outcome::Removed => {}
            Outcome::Splice {
                statements,
                runs,
                descend,
            } => {
                let len = statements.len();
                for (index, new) in statements.into_iter().enumerate() {
                    let position = if index + 1 == len {
                        scope.position
                    } else {
                        Position::Statement
                    };
                    self.lower_stmt(ctx, new, &scope.at(position), runs, descend, out)?;
                }
            }
        }
        Ok(())
    }
}

impl CodeVisitor for ExpressionEngine<'_> {
    fn visit_block(
        &mut self,
        ctx: &mut LoweringContext<'_>,
        block: &mut Block,
        scope: &Scope,
        value_block: bool,
    ) -> LowerResult<()> {
        let statements = std::mem::take(&mut block.statements);
        let len = statements.len();
        let mut out = Vec::with_capacity(len);
        for (index, stmt) in statements.into_iter().enumerate() {
            let position = block_position(index, len, &stmt, value_block);
            self.lower_stmt(ctx, stmt, &scope.at(position), FIRST_RUN, true, &mut out)?;
        }
        block.statements = out;
        Ok(())
    }

    fn visit_expr(&mut self, ctx: &mut LoweringContext<'_>, expr: &mut Expr, scope: &Scope) -> LowerResult<()> {
        match self.lower(ctx, expr, scope, FIRST_RUN, true)? {
            Outcome::Keep => Ok(()),
            Outcome::Splice { .. } | Outcome::Removed => Err(LowerError::PipelineOrdering {
                pass: self.pass.name(),
                file: ctx.file,
                message: "a statement-level result was produced outside a block".to_string(),
            }),
        }
    }
}
