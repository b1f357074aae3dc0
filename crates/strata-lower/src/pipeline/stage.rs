//! File stages and the structural checks between pass groups

use crate::error::{LowerError, LowerResult};
use serde::Serialize;
use std::fmt;
use strata_ir::visit::{walk_declaration_code, walk_expr, walk_stmt, Visitor};
use strata_ir::{Expr, ExprKind, FileId, Program, Stmt};

/// How far a file has been lowered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum FileStage {
    /// Nothing has run yet
    NotLowered,
    /// File passes applied
    FilePassesApplied,
    /// Declaration passes applied
    DeclarationPassesApplied,
    /// Statement passes applied; no multi-branch is left in statement position
    StatementPassesApplied,
    /// Expression passes applied; no multi-branch is left at all
    ExpressionPassesApplied,
    /// Post-lowering checks passed
    Lowered,
}

impl fmt::Display for FileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileStage::NotLowered => "not-lowered",
            FileStage::FilePassesApplied => "file-passes-applied",
            FileStage::DeclarationPassesApplied => "declaration-passes-applied",
            FileStage::StatementPassesApplied => "statement-passes-applied",
            FileStage::ExpressionPassesApplied => "expression-passes-applied",
            FileStage::Lowered => "lowered",
        };
        f.write_str(name)
    }
}

/// Finds multi-branches by position
#[derive(Default)]
struct WhenFinder {
    in_statement_position: usize,
    anywhere: usize,
    subjects: usize,
}

impl WhenFinder {
    fn visit_value_block(&mut self, statements: &[Stmt]) {
        let Some((last, rest)) = statements.split_last() else {
            return;
        };
        for stmt in rest {
            self.visit_stmt(stmt);
        }
        match last {
            Stmt::Expr(value) => self.visit_expr(value),
            other => self.visit_stmt(other),
        }
    }
}

impl Visitor for WhenFinder {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if stmt.is_when() {
            self.in_statement_position += 1;
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::When(_) => self.anywhere += 1,
            ExprKind::Subject => self.subjects += 1,
            // The value of a block expression is not in statement position
            ExprKind::Block(block) => {
                self.visit_type(&expr.ty);
                self.visit_value_block(&block.statements);
                return;
            }
            _ => {}
        }
        walk_expr(self, expr);
    }
}

fn find_whens(program: &Program, file: FileId) -> LowerResult<WhenFinder> {
    let mut finder = WhenFinder::default();
    for id in program.file_decl_tree(file)? {
        walk_declaration_code(&mut finder, program.resolve(id)?);
    }
    Ok(finder)
}

/// After the statement group: no multi-branch in statement position
pub(crate) fn check_statement_stage(program: &Program, file: FileId) -> LowerResult<()> {
    let finder = find_whens(program, file)?;
    if finder.in_statement_position > 0 {
        return Err(LowerError::PipelineOrdering {
            pass: "statement group",
            file,
            message: format!(
                "{} multi-branch statement(s) left in statement position",
                finder.in_statement_position
            ),
        });
    }
    Ok(())
}

/// After the expression group: no multi-branch and no subject placeholder
pub(crate) fn check_expression_stage(program: &Program, file: FileId) -> LowerResult<()> {
    let finder = find_whens(program, file)?;
    if finder.anywhere > 0 || finder.subjects > 0 {
        return Err(LowerError::PipelineOrdering {
            pass: "expression group",
            file,
            message: format!(
                "{} multi-branch expression(s) and {} subject read(s) left after lowering",
                finder.anywhere, finder.subjects
            ),
        });
    }
    Ok(())
}
