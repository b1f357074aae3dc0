//! Statements

use crate::expr::{Block, Expr};
use crate::symbol::DeclId;
use serde::Serialize;

/// A statement inside a body or block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// Expression evaluated for its effect (or the value of a value block)
    Expr(Expr),
    /// Local declaration; the declaration is owned by the enclosing function
    Decl(DeclId),
    /// `if`/`else`
    If {
        /// Condition
        cond: Expr,
        /// Then block
        then: Block,
        /// Else block
        otherwise: Option<Block>,
    },
    /// `while` loop
    While {
        /// Loop label
        label: Option<String>,
        /// Condition
        cond: Expr,
        /// Body
        body: Block,
    },
    /// Nested block
    Block(Block),
    /// `break`
    Break(Option<String>),
    /// `continue`
    Continue(Option<String>),
}

impl Stmt {
    /// Expression of an expression statement
    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            Stmt::Expr(e) => Some(e),
            _ => None,
        }
    }

    /// Check whether the statement is a multi-branch expression statement
    pub fn is_when(&self) -> bool {
        matches!(self, Stmt::Expr(e) if e.is_when())
    }
}
