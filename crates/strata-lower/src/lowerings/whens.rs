//! Multi-branch (`when`) lowering
//!
//! The target has no multi-branch. Statements become `if`/`else` chains, values
//! become nested conditionals. A subject is evaluated once into a temporary that
//! every branch condition reads:
//!
//! ```text
//! when (next()) { 1 -> a; else -> b }      final tmp0_subject = next();
//!                                          if (tmp0_subject == 1) a; else b;
//! ```
//!
//! In value position the temporary needs a statement to live in, so the
//! multi-branch moves into an immediately invoked local function:
//!
//! ```text
//! val y = when (next()) { .. }             final y = (() {
//!                                            final tmp0_subject = next();
//!                                            return tmp0_subject == 1 ? a : b;
//!                                          })();
//! ```
//!
//! Once the subject is a temporary, the target's flow analysis no longer knows
//! that the original variable is non-null in the branches after a `null ->`
//! branch. Reads of that variable in those branches get an explicit `!`.
//!
//! A `return`, `break` or `continue` that would have to leave such a local
//! function fails the file.

use crate::context::{LoweringContext, Scope};
use crate::error::{LowerError, LowerResult};
use crate::transform::{ExpressionLowering, StatementLowering, Transformation, TraversalOrder};
use rustc_hash::FxHashSet;
use strata_ir::visit::{
    walk_declaration_code, walk_declaration_code_mut, walk_expr, walk_expr_mut, walk_stmt, walk_stmt_mut,
};
use strata_ir::{
    Block, Branch, DeclId, DeclOrigin, Expr, ExprKind, ExprOrigin, IrType, Program, Span, Stmt, Visitor,
    VisitorMut,
};
use tracing::trace;

// ============================================================================
// Statement group
// ============================================================================

/// Moves the subject of a statement-position multi-branch into a temporary
pub struct WhenSubjectStatementsLowering;

impl StatementLowering for WhenSubjectStatementsLowering {
    fn name(&self) -> &'static str {
        "when-subject-statements"
    }

    fn transform(
        &self,
        ctx: &mut LoweringContext<'_>,
        stmt: &mut Stmt,
        scope: &Scope,
    ) -> LowerResult<Transformation<Stmt>> {
        if !scope.is_statement() {
            return Ok(Transformation::NoChange);
        }
        let Stmt::Expr(expr) = stmt else {
            return Ok(Transformation::NoChange);
        };
        let (ty, span) = (expr.ty.clone(), expr.span);
        let ExprKind::When(when) = &mut expr.kind else {
            return Ok(Transformation::NoChange);
        };
        let Some(subject) = when.subject.take() else {
            return Ok(Transformation::NoChange);
        };

        let mut branches = std::mem::take(&mut when.branches);
        if let Some(original) = subject.as_get_value() {
            repair_non_null(ctx.program, &mut branches, original)?;
        }
        let name = ctx.new_temporary_name("subject");
        let tmp = ctx.add_temporary(scope.declaration, &name, *subject, DeclOrigin::SubjectTemporary)?;
        bind_subject(ctx.program, &mut branches, tmp)?;
        trace!(temporary = %name, "subject moved into a temporary");

        let when = Expr::when(None, branches, ty)
            .with_origin(ExprOrigin::WhenStatement)
            .with_span(span);
        Ok(Transformation::ReplaceWithMany(vec![Stmt::Decl(tmp), Stmt::Expr(when)]))
    }
}

/// Turns a statement-position multi-branch without subject into `if`/`else`
pub struct WhenStatementsLowering;

impl StatementLowering for WhenStatementsLowering {
    fn name(&self) -> &'static str {
        "when-statements"
    }

    fn transform(
        &self,
        _ctx: &mut LoweringContext<'_>,
        stmt: &mut Stmt,
        scope: &Scope,
    ) -> LowerResult<Transformation<Stmt>> {
        if !scope.is_statement() {
            return Ok(Transformation::NoChange);
        }
        let Stmt::Expr(expr) = stmt else {
            return Ok(Transformation::NoChange);
        };
        let ExprKind::When(when) = &mut expr.kind else {
            return Ok(Transformation::NoChange);
        };
        if when.subject.is_some() {
            return Ok(Transformation::NoChange);
        }

        let mut rest: Vec<Stmt> = Vec::new();
        for branch in std::mem::take(&mut when.branches).into_iter().rev() {
            if branch.is_else() {
                rest = into_block(branch.result).statements;
                continue;
            }
            let otherwise = (!rest.is_empty()).then(|| Block::new(std::mem::take(&mut rest)));
            rest = vec![Stmt::If {
                cond: branch.condition,
                then: into_block(branch.result),
                otherwise,
            }];
        }

        Ok(match rest.len() {
            0 => Transformation::Remove,
            1 => Transformation::Replace(rest.remove(0)),
            _ => Transformation::Replace(Stmt::Block(Block::new(rest))),
        })
    }
}

fn into_block(result: Expr) -> Block {
    match result.kind {
        ExprKind::Block(block) => block,
        _ => Block::new(vec![Stmt::Expr(result)]),
    }
}

// ============================================================================
// Expression group
// ============================================================================

/// Adds `!` to reads of a variable subject after a `null ->` branch
pub struct WhenSubjectNonNullLowering;

impl ExpressionLowering for WhenSubjectNonNullLowering {
    fn name(&self) -> &'static str {
        "when-subject-non-null"
    }

    fn transform(
        &self,
        ctx: &mut LoweringContext<'_>,
        expr: &mut Expr,
        _scope: &Scope,
    ) -> LowerResult<Transformation<Expr>> {
        let ExprKind::When(when) = &mut expr.kind else {
            return Ok(Transformation::NoChange);
        };
        let Some(original) = when.subject.as_ref().and_then(|s| s.as_get_value()) else {
            return Ok(Transformation::NoChange);
        };
        if repair_non_null(ctx.program, &mut when.branches, original)? == 0 {
            return Ok(Transformation::NoChange);
        }
        Ok(Transformation::Replace(expr.take()))
    }
}

/// Moves a value-position multi-branch with subject into an invoked local
/// function that holds the subject temporary
pub struct WhenSubjectExpressionsLowering;

impl ExpressionLowering for WhenSubjectExpressionsLowering {
    fn name(&self) -> &'static str {
        "when-subject-expressions"
    }

    fn transform(
        &self,
        ctx: &mut LoweringContext<'_>,
        expr: &mut Expr,
        scope: &Scope,
    ) -> LowerResult<Transformation<Expr>> {
        if !matches!(&expr.kind, ExprKind::When(when) if when.subject.is_some()) {
            return Ok(Transformation::NoChange);
        }
        let mut jumps = JumpFinder::new(ctx.program);
        jumps.visit_expr(expr);
        if let Some(jump) = jumps.finish()? {
            return Err(non_local_jump(ctx, scope, jump, expr.span));
        }

        let (ty, span) = (expr.ty.clone(), expr.span);
        let ExprKind::When(when) = &mut expr.kind else {
            return Ok(Transformation::NoChange);
        };
        let Some(subject) = when.subject.take() else {
            return Ok(Transformation::NoChange);
        };
        let mut branches = std::mem::take(&mut when.branches);

        let wrapper = new_wrapper(ctx, scope.declaration, &ty, span)?;
        let name = ctx.new_temporary_name("subject");
        let tmp = ctx.add_temporary(wrapper, &name, *subject, DeclOrigin::SubjectTemporary)?;
        bind_subject(ctx.program, &mut branches, tmp)?;

        let inner = Expr::when(None, branches, ty.clone()).with_span(span);
        ctx.adopt_expr(&inner, wrapper)?;
        ctx.program.set_body(
            wrapper,
            Block::new(vec![Stmt::Decl(tmp), Stmt::Expr(Expr::ret(wrapper, Some(inner)))]),
        )?;
        trace!(wrapper = %wrapper, temporary = %name, "subject scoped in a local function");
        Ok(Transformation::Replace(invoke_wrapper(wrapper, ty, span)))
    }
}

/// Folds a value-position multi-branch without subject into conditionals
pub struct WhenExpressionsLowering;

impl ExpressionLowering for WhenExpressionsLowering {
    fn name(&self) -> &'static str {
        "when-expressions"
    }

    fn order(&self) -> TraversalOrder {
        TraversalOrder::Post
    }

    fn transform(
        &self,
        ctx: &mut LoweringContext<'_>,
        expr: &mut Expr,
        scope: &Scope,
    ) -> LowerResult<Transformation<Expr>> {
        let (ty, span) = (expr.ty.clone(), expr.span);
        let ExprKind::When(when) = &mut expr.kind else {
            return Ok(Transformation::NoChange);
        };
        if when.subject.is_some() {
            return Ok(Transformation::NoChange);
        }

        let mut folded: Option<Expr> = None;
        for branch in std::mem::take(&mut when.branches).into_iter().rev() {
            let is_else = branch.is_else();
            let value = branch_value(ctx, scope, branch.result, &ty)?;
            folded = Some(if is_else {
                value
            } else {
                let otherwise = folded.take().unwrap_or_else(|| Expr::null(ty.clone()));
                Expr::conditional(branch.condition, value, otherwise, ty.clone())
                    .with_origin(ExprOrigin::When)
                    .with_span(span)
            });
        }
        Ok(Transformation::Replace(
            folded.unwrap_or_else(|| Expr::null(ty).with_span(span)),
        ))
    }
}

/// A branch result as a single expression
fn branch_value(ctx: &mut LoweringContext<'_>, scope: &Scope, result: Expr, ty: &IrType) -> LowerResult<Expr> {
    let span = result.span;
    let mut block = match result.kind {
        ExprKind::Block(block) => block,
        _ => return Ok(result),
    };
    if block.is_empty() {
        return Ok(Expr::null(ty.clone()).with_span(span));
    }
    if matches!(block.statements.as_slice(), [Stmt::Expr(_)]) {
        if let Some(Stmt::Expr(value)) = block.statements.pop() {
            return Ok(value);
        }
    }

    let mut jumps = JumpFinder::new(ctx.program);
    for stmt in &block.statements {
        jumps.visit_stmt(stmt);
    }
    if let Some(jump) = jumps.finish()? {
        return Err(non_local_jump(ctx, scope, jump, span));
    }

    let wrapper = new_wrapper(ctx, scope.declaration, ty, span)?;
    if let Some(Stmt::Expr(last)) = block.statements.last_mut() {
        if !last.is_jump() {
            let value = last.take();
            *last = Expr::ret(wrapper, Some(value)).with_span(span);
        }
    }
    ctx.adopt_stmts(&block.statements, wrapper)?;
    ctx.program.set_body(wrapper, block)?;
    Ok(invoke_wrapper(wrapper, ty.clone(), span))
}

fn new_wrapper(ctx: &mut LoweringContext<'_>, owner: DeclId, ty: &IrType, span: Span) -> LowerResult<DeclId> {
    let wrapper = ctx.program.add_lambda(owner, ty.clone(), Block::default())?;
    let decl = ctx.program.resolve_mut(wrapper)?;
    decl.origin = DeclOrigin::WhenWrapper;
    decl.span = span;
    Ok(wrapper)
}

fn non_local_jump(ctx: &LoweringContext<'_>, scope: &Scope, jump: &'static str, span: Span) -> LowerError {
    LowerError::NonLocalJump {
        file: ctx.file,
        declaration: scope.declaration,
        jump,
        span,
    }
}

fn invoke_wrapper(wrapper: DeclId, ty: IrType, span: Span) -> Expr {
    let callee = Expr::function_expr(wrapper, IrType::function(Vec::new(), ty.clone())).with_span(span);
    Expr::invoke(callee, Vec::new(), ty)
        .with_origin(ExprOrigin::WhenWrapperCall)
        .with_span(span)
}

// ============================================================================
// Subject binding and non-null repair
// ============================================================================

/// Replace `Subject` placeholders by reads of `tmp`, in the branches and in the
/// lambdas and locals they introduce
///
/// Nested multi-branches with their own subject only have that subject bound.
fn bind_subject(program: &mut Program, branches: &mut [Branch], tmp: DeclId) -> LowerResult<()> {
    let mut binder = SubjectBinder {
        tmp,
        nested: Vec::new(),
    };
    for branch in branches {
        binder.visit_expr(&mut branch.condition);
        binder.visit_expr(&mut branch.result);
    }
    visit_nested_code(program, &mut binder)
}

/// A mutable visitor that steps over lambdas and locals, collecting them so
/// their code can be visited through the arena
trait NestedCode: VisitorMut {
    fn nested(&mut self) -> &mut Vec<DeclId>;
}

fn visit_nested_code<V: NestedCode>(program: &mut Program, visitor: &mut V) -> LowerResult<()> {
    while let Some(id) = visitor.nested().pop() {
        walk_declaration_code_mut(visitor, program.resolve_mut(id)?);
    }
    Ok(())
}

struct SubjectBinder {
    tmp: DeclId,
    nested: Vec<DeclId>,
}

impl NestedCode for SubjectBinder {
    fn nested(&mut self) -> &mut Vec<DeclId> {
        &mut self.nested
    }
}

impl VisitorMut for SubjectBinder {
    fn visit_expr(&mut self, expr: &mut Expr) {
        if matches!(expr.kind, ExprKind::Subject) {
            *expr = Expr::get_value(self.tmp, expr.ty.clone()).with_span(expr.span);
            return;
        }
        match &mut expr.kind {
            ExprKind::When(when) => {
                if let Some(subject) = &mut when.subject {
                    self.visit_expr(subject);
                    return;
                }
            }
            ExprKind::FunctionExpr(lambda) => {
                self.nested.push(*lambda);
                return;
            }
            _ => {}
        }
        walk_expr_mut(self, expr);
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        if let Stmt::Decl(local) = stmt {
            self.nested.push(*local);
        }
        walk_stmt_mut(self, stmt);
    }
}

/// Assert non-null on reads of `original` in the results of branches after a
/// `null ->` branch, lambdas and locals included; returns the number of
/// assertions added
///
/// Reads the front end already typed as non-null are the ones that relied on
/// narrowing, so the declared type decides, not the type of the read.
fn repair_non_null(program: &mut Program, branches: &mut [Branch], original: DeclId) -> LowerResult<usize> {
    let declared = match program.resolve(original)?.value_type() {
        Some(ty) if ty.is_nullable() => ty.clone(),
        _ => return Ok(0),
    };
    let mut repair = NonNullRepair {
        original,
        declared,
        nested: Vec::new(),
        added: 0,
    };
    let mut after_null = false;
    for branch in branches {
        if after_null {
            repair.visit_expr(&mut branch.result);
        }
        if branch.condition.is_eq_null() {
            after_null = true;
        }
    }
    visit_nested_code(program, &mut repair)?;
    Ok(repair.added)
}

struct NonNullRepair {
    original: DeclId,
    declared: IrType,
    nested: Vec<DeclId>,
    added: usize,
}

impl NestedCode for NonNullRepair {
    fn nested(&mut self) -> &mut Vec<DeclId> {
        &mut self.nested
    }
}

impl VisitorMut for NonNullRepair {
    fn visit_expr(&mut self, expr: &mut Expr) {
        match &expr.kind {
            ExprKind::NotNull(operand) if operand.as_get_value() == Some(self.original) => return,
            ExprKind::FunctionExpr(lambda) => {
                self.nested.push(*lambda);
                return;
            }
            _ => {}
        }
        if expr.as_get_value() == Some(self.original) {
            let read = Expr::get_value(self.original, self.declared.clone()).with_span(expr.span);
            *expr = Expr::not_null(read);
            self.added += 1;
            return;
        }
        walk_expr_mut(self, expr);
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        if let Stmt::Decl(local) = stmt {
            self.nested.push(*local);
        }
        walk_stmt_mut(self, stmt);
    }
}

// ============================================================================
// Jumps out of a local function
// ============================================================================

/// Finds `return`, `break` and `continue` in code about to move into a local
/// function that target a function or loop outside of it
struct JumpFinder<'a> {
    program: &'a Program,
    introduced: Vec<DeclId>,
    returns: Vec<DeclId>,
    loops: Vec<Option<String>>,
    escaping: Option<&'static str>,
}

impl<'a> JumpFinder<'a> {
    fn new(program: &'a Program) -> Self {
        Self {
            program,
            introduced: Vec::new(),
            returns: Vec::new(),
            loops: Vec::new(),
            escaping: None,
        }
    }

    /// Visit the code of the lambdas and locals seen so far, then report the
    /// first kind of jump that leaves the visited code
    fn finish(mut self) -> LowerResult<Option<&'static str>> {
        let program = self.program;
        let mut order = Vec::new();
        for id in std::mem::take(&mut self.introduced) {
            order.extend(program.subtree(id)?);
        }
        let inside: FxHashSet<DeclId> = order.iter().copied().collect();
        for id in order {
            if self.escaping.is_some() {
                break;
            }
            self.loops.clear();
            walk_declaration_code(&mut self, program.resolve(id)?);
        }
        if self.escaping.is_none() && self.returns.iter().any(|from| !inside.contains(from)) {
            self.escaping = Some("return");
        }
        Ok(self.escaping)
    }

    fn leaves_loops(&self, label: &Option<String>) -> bool {
        match label {
            None => self.loops.is_empty(),
            Some(_) => !self.loops.contains(label),
        }
    }
}

impl Visitor for JumpFinder<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Return { from, .. } => self.returns.push(*from),
            ExprKind::FunctionExpr(lambda) => self.introduced.push(*lambda),
            _ => {}
        }
        walk_expr(self, expr);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(local) => self.introduced.push(*local),
            Stmt::While { label, .. } => {
                self.loops.push(label.clone());
                walk_stmt(self, stmt);
                self.loops.pop();
                return;
            }
            Stmt::Break(label) if self.leaves_loops(label) => {
                self.escaping.get_or_insert("break");
            }
            Stmt::Continue(label) if self.leaves_loops(label) => {
                self.escaping.get_or_insert("continue");
            }
            _ => {}
        }
        walk_stmt(self, stmt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoweringOptions;
    use strata_ir::{Container, FileId, Program};

    fn setup() -> (Program, FileId, DeclId) {
        let mut program = Program::new();
        let file = program.add_file("a.kt", "app");
        let f = program
            .add_function(Container::File(file), "f", IrType::Void)
            .unwrap();
        (program, file, f)
    }

    fn subject_eq(value: Expr) -> Expr {
        Expr::eq(Expr::subject(IrType::int().make_nullable()), value)
    }

    #[test]
    fn test_statement_chain() {
        let (mut program, file, f) = setup();
        let options = LoweringOptions::default();
        let mut ctx = LoweringContext::new(&mut program, &options, file);
        let scope = Scope::member(file, f, None);

        let when = Expr::when(
            None,
            vec![
                Branch::new(Expr::bool(false), Expr::int(1)),
                Branch::new(Expr::bool(true), Expr::int(2)),
            ],
            IrType::Void,
        );
        let mut stmt = Stmt::Expr(when);
        let result = WhenStatementsLowering.transform(&mut ctx, &mut stmt, &scope).unwrap();
        // `true` reads as the else branch
        let Transformation::Replace(Stmt::If { otherwise, .. }) = result else {
            panic!("expected an if statement, got {:?}", result);
        };
        assert_eq!(otherwise, Some(Block::new(vec![Stmt::Expr(Expr::int(2))])));
    }

    #[test]
    fn test_empty_statement_is_removed() {
        let (mut program, file, f) = setup();
        let options = LoweringOptions::default();
        let mut ctx = LoweringContext::new(&mut program, &options, file);
        let scope = Scope::member(file, f, None);

        let mut stmt = Stmt::Expr(Expr::when(None, Vec::new(), IrType::Void));
        assert_eq!(
            WhenStatementsLowering.transform(&mut ctx, &mut stmt, &scope).unwrap(),
            Transformation::Remove
        );
    }

    #[test]
    fn test_value_position_is_left_to_expressions() {
        let (mut program, file, f) = setup();
        let options = LoweringOptions::default();
        let mut ctx = LoweringContext::new(&mut program, &options, file);
        let scope = Scope::member(file, f, None).value();

        let mut stmt = Stmt::Expr(Expr::when(None, vec![Branch::otherwise(Expr::int(1))], IrType::int()));
        assert_eq!(
            WhenStatementsLowering.transform(&mut ctx, &mut stmt, &scope).unwrap(),
            Transformation::NoChange
        );
    }

    #[test]
    fn test_repair_after_null_branch_only() {
        let (mut program, _file, f) = setup();
        let x = program.add_param(f, "x", IrType::int().make_nullable()).unwrap();
        let read = Expr::get_value(x, IrType::int().make_nullable());
        let narrowed = Expr::get_value(x, IrType::int());

        let mut branches = vec![
            Branch::new(subject_eq(Expr::int(0)), read.clone()),
            Branch::new(subject_eq(Expr::null(IrType::int())), Expr::int(1)),
            Branch::new(subject_eq(Expr::int(2)), narrowed),
            Branch::otherwise(Expr::not_null(read.clone())),
        ];
        assert_eq!(repair_non_null(&mut program, &mut branches, x).unwrap(), 1);
        assert_eq!(branches[0].result, read);
        let ExprKind::NotNull(operand) = &branches[2].result.kind else {
            panic!("narrowed read is asserted");
        };
        assert_eq!(operand.ty, IrType::int().make_nullable());
        assert_eq!(branches[2].result.ty, IrType::int());
        assert_eq!(repair_non_null(&mut program, &mut branches, x).unwrap(), 0);
    }

    #[test]
    fn test_repair_enters_lambdas() {
        let (mut program, _file, f) = setup();
        let x = program.add_param(f, "x", IrType::int().make_nullable()).unwrap();
        let lambda = program.add_lambda(f, IrType::int(), Block::default()).unwrap();
        program
            .set_body(
                lambda,
                Block::new(vec![Stmt::Expr(Expr::ret(lambda, Some(Expr::get_value(x, IrType::int()))))]),
            )
            .unwrap();

        let mut branches = vec![
            Branch::new(subject_eq(Expr::null(IrType::int())), Expr::int(0)),
            Branch::otherwise(Expr::function_expr(lambda, IrType::function(Vec::new(), IrType::int()))),
        ];
        assert_eq!(repair_non_null(&mut program, &mut branches, x).unwrap(), 1);
        let body = program[lambda].as_function().unwrap().body.as_ref().unwrap();
        let Some(Stmt::Expr(ret)) = body.statements.first() else {
            panic!("lambda body kept its return");
        };
        let ExprKind::Return { value: Some(value), .. } = &ret.kind else {
            panic!("return keeps its value");
        };
        assert!(matches!(value.kind, ExprKind::NotNull(_)));
    }

    #[test]
    fn test_non_null_parameter_is_not_repaired() {
        let (mut program, _file, f) = setup();
        let x = program.add_param(f, "x", IrType::int()).unwrap();
        let mut branches = vec![
            Branch::new(subject_eq(Expr::null(IrType::int())), Expr::int(0)),
            Branch::otherwise(Expr::get_value(x, IrType::int())),
        ];
        assert_eq!(repair_non_null(&mut program, &mut branches, x).unwrap(), 0);
    }

    #[test]
    fn test_nested_subject_is_not_rebound() {
        let mut program = Program::new();
        let tmp = DeclId::new(7);
        let inner = Expr::when(
            Some(Expr::subject(IrType::int())),
            vec![Branch::new(subject_eq(Expr::int(1)), Expr::int(1))],
            IrType::int(),
        );
        let mut branches = vec![Branch::new(subject_eq(Expr::int(0)), inner)];
        bind_subject(&mut program, &mut branches, tmp).unwrap();

        let ExprKind::Binary { lhs, .. } = &branches[0].condition.kind else {
            panic!("condition is a comparison");
        };
        assert_eq!(lhs.as_get_value(), Some(tmp));
        let ExprKind::When(inner) = &branches[0].result.kind else {
            panic!("result is a nested when");
        };
        assert_eq!(inner.subject.as_ref().and_then(|s| s.as_get_value()), Some(tmp));
        let ExprKind::Binary { lhs, .. } = &inner.branches[0].condition.kind else {
            panic!("condition is a comparison");
        };
        assert!(matches!(lhs.kind, ExprKind::Subject));
    }

    #[test]
    fn test_jumps_leaving_moved_code() {
        let (mut program, _file, f) = setup();
        let lambda = program.add_lambda(f, IrType::int(), Block::default()).unwrap();
        let local_return = Expr::function_expr(lambda, IrType::function(Vec::new(), IrType::int()));
        program
            .set_body(lambda, Block::new(vec![Stmt::Expr(Expr::ret(lambda, Some(Expr::int(1))))]))
            .unwrap();

        let find = |statements: &[Stmt]| {
            let mut finder = JumpFinder::new(&program);
            for stmt in statements {
                finder.visit_stmt(stmt);
            }
            finder.finish().unwrap()
        };
        assert_eq!(find(&[Stmt::Expr(local_return)]), None);
        assert_eq!(find(&[Stmt::Expr(Expr::ret(f, Some(Expr::int(5))))]), Some("return"));
        assert_eq!(find(&[Stmt::Break(None)]), Some("break"));
        let inner_loop = Stmt::While {
            label: None,
            cond: Expr::bool(true),
            body: Block::new(vec![Stmt::Break(None), Stmt::Continue(Some("outer".to_string()))]),
        };
        assert_eq!(find(&[inner_loop]), Some("continue"));
    }

    #[test]
    fn test_value_without_else_falls_back_to_null() {
        let (mut program, file, f) = setup();
        let options = LoweringOptions::default();
        let mut ctx = LoweringContext::new(&mut program, &options, file);
        let scope = Scope::member(file, f, None).value();

        let mut expr = Expr::when(
            None,
            vec![Branch::new(Expr::bool(false), Expr::int(1))],
            IrType::int().make_nullable(),
        );
        let Transformation::Replace(folded) = WhenExpressionsLowering.transform(&mut ctx, &mut expr, &scope).unwrap()
        else {
            panic!("expected a replacement");
        };
        let ExprKind::Conditional { otherwise, .. } = folded.kind else {
            panic!("expected a conditional");
        };
        assert!(otherwise.is_null_const());
    }
}
