//! Lowering context and traversal scope
//!
//! `LoweringContext` is the mutable state a pass works with (the program, the
//! options, the file being lowered). `Scope` is the immutable ancestry the driver
//! threads down the traversal, so a pass never searches for its enclosing
//! declaration.

use crate::config::LoweringOptions;
use crate::error::LowerResult;
use rustc_hash::FxHashSet;
use strata_ir::visit::{walk_expr, walk_stmt, Visitor};
use strata_ir::{Container, DeclId, DeclOrigin, Expr, ExprKind, FileId, Program, Stmt};
use tracing::trace;

/// Mutable state shared by the passes lowering one file
pub struct LoweringContext<'a> {
    /// The whole program
    pub program: &'a mut Program,
    /// Pipeline options
    pub options: &'a LoweringOptions,
    /// File being lowered
    pub file: FileId,
    temporaries: u32,
}

impl<'a> LoweringContext<'a> {
    /// Create a context for one file
    pub fn new(program: &'a mut Program, options: &'a LoweringOptions, file: FileId) -> Self {
        Self {
            program,
            options,
            file,
            temporaries: 0,
        }
    }

    /// Fresh name for a temporary (`tmp0_subject`, `tmp1_subject`, ...)
    pub fn new_temporary_name(&mut self, suffix: &str) -> String {
        let name = format!("{}{}_{}", self.options.temporary_prefix, self.temporaries, suffix);
        self.temporaries += 1;
        name
    }

    /// `base`, or `base_1`, `base_2`, ... when a top-level declaration of the
    /// current file already has that name
    pub fn unique_top_level_name(&self, base: &str) -> LowerResult<String> {
        let taken: FxHashSet<&str> = self
            .program
            .file(self.file)?
            .declarations
            .iter()
            .filter_map(|id| self.program.get(*id))
            .map(|decl| decl.name.as_str())
            .collect();
        if !taken.contains(base) {
            return Ok(base.to_string());
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}_{}", base, n);
            if !taken.contains(candidate.as_str()) {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    /// Attach a detached declaration to the end of the current file
    pub fn add_to_file(&mut self, id: DeclId) -> LowerResult<()> {
        self.program.attach(Container::File(self.file), id)?;
        trace!(symbol = %id, file = %self.file, "added top-level declaration");
        Ok(())
    }

    /// Allocate a local owned by `owner` and tag its origin
    pub fn add_temporary(
        &mut self,
        owner: DeclId,
        name: &str,
        initializer: Expr,
        origin: DeclOrigin,
    ) -> LowerResult<DeclId> {
        let ty = initializer.ty.clone();
        let local = self.program.add_local(owner, name, ty, None, false)?;
        self.adopt_expr(&initializer, local)?;
        let decl = self.program.resolve_mut(local)?;
        decl.origin = origin;
        decl.span = initializer.span;
        if let strata_ir::DeclKind::Variable(v) = &mut decl.kind {
            v.initializer = Some(initializer);
        }
        Ok(local)
    }

    /// Make `owner` the owner of every local and lambda introduced by `expr`
    ///
    /// Call this after moving code from one declaration into another.
    pub fn adopt_expr(&mut self, expr: &Expr, owner: DeclId) -> LowerResult<()> {
        let mut finder = IntroducedDeclarations::default();
        finder.visit_expr(expr);
        self.adopt_all(finder.found, owner)
    }

    /// `adopt_expr` for statements
    pub fn adopt_stmts(&mut self, statements: &[Stmt], owner: DeclId) -> LowerResult<()> {
        let mut finder = IntroducedDeclarations::default();
        for stmt in statements {
            finder.visit_stmt(stmt);
        }
        self.adopt_all(finder.found, owner)
    }

    fn adopt_all(&mut self, found: Vec<DeclId>, owner: DeclId) -> LowerResult<()> {
        for id in found {
            if self.program.resolve(id)?.parent == strata_ir::Parent::Decl(owner) {
                continue;
            }
            self.program.detach(id)?;
            self.program.set_owner(id, owner)?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct IntroducedDeclarations {
    found: Vec<DeclId>,
}

impl Visitor for IntroducedDeclarations {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if let Stmt::Decl(symbol) = stmt {
            self.found.push(*symbol);
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if let ExprKind::FunctionExpr(symbol) = expr.kind {
            self.found.push(symbol);
        }
        walk_expr(self, expr);
    }
}

/// Whether a node's value is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Evaluated for its effect only
    Statement,
    /// Its value is used
    Value,
}

/// Structural context of the node a pass is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    /// File being lowered
    pub file: FileId,
    /// Declaration whose code holds the node; it owns new locals and lambdas
    pub declaration: DeclId,
    /// Nearest enclosing function, lambda or constructor
    pub function: Option<DeclId>,
    /// Nearest enclosing class
    pub class: Option<DeclId>,
    /// Inside an initializer the target evaluates at compile time
    pub const_initializer: bool,
    /// Statement or value position
    pub position: Position,
}

impl Scope {
    /// Scope of a member declaration
    pub fn member(file: FileId, declaration: DeclId, class: Option<DeclId>) -> Self {
        Self {
            file,
            declaration,
            function: None,
            class,
            const_initializer: false,
            position: Position::Statement,
        }
    }

    /// The same scope with another position
    pub fn at(&self, position: Position) -> Self {
        Self { position, ..*self }
    }

    /// The same scope in value position
    pub fn value(&self) -> Self {
        self.at(Position::Value)
    }

    /// The same scope in statement position
    pub fn statement(&self) -> Self {
        self.at(Position::Statement)
    }

    /// Check whether the node is in statement position
    pub fn is_statement(&self) -> bool {
        self.position == Position::Statement
    }
}
