//! Code traversal shared by the statement and expression engines
//!
//! Every piece of code a file holds is reached from its member declarations.
//! Locals and lambdas are reached through the code that introduces them
//! (`Stmt::Decl`, `FunctionExpr`). A declaration's code is checked out of the
//! arena while it is walked so passes can mutate the rest of the program.

use crate::context::{LoweringContext, Position, Scope};
use crate::error::LowerResult;
use strata_ir::{Block, DeclCode, DeclId, DeclKind, Expr, ExprKind, Stmt};

/// Hooks an engine implements; the walk functions below call back into them
pub(crate) trait CodeVisitor {
    /// Visit a block; `value_block` is set when the block's last statement is
    /// its value
    fn visit_block(
        &mut self,
        ctx: &mut LoweringContext<'_>,
        block: &mut Block,
        scope: &Scope,
        value_block: bool,
    ) -> LowerResult<()>;

    /// Visit an expression that is not a direct statement of a block
    fn visit_expr(&mut self, ctx: &mut LoweringContext<'_>, expr: &mut Expr, scope: &Scope) -> LowerResult<()>;
}

/// Position of the statement at `index` of a block with `len` statements
pub(crate) fn block_position(index: usize, len: usize, stmt: &Stmt, value_block: bool) -> Position {
    if value_block && index + 1 == len && matches!(stmt, Stmt::Expr(_)) {
        Position::Value
    } else {
        Position::Statement
    }
}

/// Walk the code of every member declaration of the current file
pub(crate) fn walk_file<V: CodeVisitor>(visitor: &mut V, ctx: &mut LoweringContext<'_>) -> LowerResult<()> {
    // Declarations a pass appends to the file are walked too
    let mut index = 0;
    while let Some(&id) = ctx.program.file(ctx.file)?.declarations.get(index) {
        walk_member(visitor, ctx, id, None)?;
        index += 1;
    }
    Ok(())
}

fn walk_member<V: CodeVisitor>(
    visitor: &mut V,
    ctx: &mut LoweringContext<'_>,
    id: DeclId,
    class: Option<DeclId>,
) -> LowerResult<()> {
    let Some(decl) = ctx.program.get(id) else {
        return Ok(());
    };
    match &decl.kind {
        DeclKind::Class(c) => {
            let members = c.members.clone();
            for member in members {
                walk_member(visitor, ctx, member, Some(id))?;
            }
        }
        DeclKind::Property(p) => {
            let parts: Vec<DeclId> = [p.backing_field, p.getter, p.setter].into_iter().flatten().collect();
            for part in parts {
                walk_member(visitor, ctx, part, class)?;
            }
        }
        _ => {
            let scope = Scope::member(ctx.file, id, class);
            walk_code(visitor, ctx, id, &scope)?;
        }
    }
    Ok(())
}

/// Walk the code `id` holds: parameter default values first, then the
/// delegation, body or value
pub(crate) fn walk_code<V: CodeVisitor>(
    visitor: &mut V,
    ctx: &mut LoweringContext<'_>,
    id: DeclId,
    outer: &Scope,
) -> LowerResult<()> {
    let decl = ctx.program.resolve(id)?;
    let params = decl.params().to_vec();
    let callable = decl.is_function() || decl.is_constructor();
    let const_initializer = match &decl.kind {
        DeclKind::Field(f) => f.is_const,
        DeclKind::ValueParameter(_) => true,
        _ => false,
    };
    let scope = Scope {
        file: outer.file,
        declaration: id,
        function: if callable { Some(id) } else { outer.function },
        class: outer.class,
        const_initializer,
        position: Position::Statement,
    };

    for param in params {
        walk_code(visitor, ctx, param, &scope)?;
    }

    let mut code = ctx.program.take_code(id)?;
    let result = walk_checked_out(visitor, ctx, &mut code, &scope);
    ctx.program.restore_code(id, code)?;
    result
}

fn walk_checked_out<V: CodeVisitor>(
    visitor: &mut V,
    ctx: &mut LoweringContext<'_>,
    code: &mut DeclCode,
    scope: &Scope,
) -> LowerResult<()> {
    if let Some(delegation) = &mut code.delegation {
        visitor.visit_expr(ctx, delegation, &scope.value())?;
    }
    if let Some(body) = &mut code.body {
        visitor.visit_block(ctx, body, &scope.statement(), false)?;
    }
    if let Some(value) = &mut code.value {
        visitor.visit_expr(ctx, value, &scope.value())?;
    }
    Ok(())
}

/// Visit the children of an expression; they are all in value position
pub(crate) fn walk_expr_children<V: CodeVisitor>(
    visitor: &mut V,
    ctx: &mut LoweringContext<'_>,
    expr: &mut Expr,
    scope: &Scope,
) -> LowerResult<()> {
    let inner = scope.value();
    match &mut expr.kind {
        ExprKind::Const(_)
        | ExprKind::GetValue(_)
        | ExprKind::Subject
        | ExprKind::FunctionRef(_)
        | ExprKind::This { .. } => {}
        ExprKind::SetValue { value, .. } => visitor.visit_expr(ctx, value, &inner)?,
        ExprKind::GetField { receiver, .. } => {
            if let Some(receiver) = receiver {
                visitor.visit_expr(ctx, receiver, &inner)?;
            }
        }
        ExprKind::SetField { receiver, value, .. } => {
            if let Some(receiver) = receiver {
                visitor.visit_expr(ctx, receiver, &inner)?;
            }
            visitor.visit_expr(ctx, value, &inner)?;
        }
        ExprKind::Call(call) => {
            if let Some(receiver) = &mut call.receiver {
                visitor.visit_expr(ctx, receiver, &inner)?;
            }
            // Arguments of a const call are themselves constant
            let args_scope = if call.explicit_const {
                Scope {
                    const_initializer: true,
                    ..inner
                }
            } else {
                inner
            };
            for arg in call.args.iter_mut().flatten() {
                visitor.visit_expr(ctx, arg, &args_scope)?;
            }
        }
        ExprKind::Binary { lhs, rhs, .. } | ExprKind::Identical(lhs, rhs) => {
            visitor.visit_expr(ctx, lhs, &inner)?;
            visitor.visit_expr(ctx, rhs, &inner)?;
        }
        ExprKind::Not(operand) | ExprKind::NotNull(operand) | ExprKind::Throw(operand) => {
            visitor.visit_expr(ctx, operand, &inner)?;
        }
        ExprKind::TypeOp { operand, .. } => visitor.visit_expr(ctx, operand, &inner)?,
        ExprKind::When(when) => {
            if let Some(subject) = &mut when.subject {
                visitor.visit_expr(ctx, subject, &inner)?;
            }
            for branch in &mut when.branches {
                visitor.visit_expr(ctx, &mut branch.condition, &inner)?;
                visitor.visit_expr(ctx, &mut branch.result, &inner)?;
            }
        }
        ExprKind::Conditional {
            cond,
            then,
            otherwise,
        } => {
            visitor.visit_expr(ctx, cond, &inner)?;
            visitor.visit_expr(ctx, then, &inner)?;
            visitor.visit_expr(ctx, otherwise, &inner)?;
        }
        ExprKind::Block(block) => {
            let value_block = !scope.is_statement();
            visitor.visit_block(ctx, block, scope, value_block)?;
        }
        ExprKind::FunctionExpr(lambda) => {
            let lambda = *lambda;
            walk_code(visitor, ctx, lambda, scope)?;
        }
        ExprKind::Invoke { callee, args } => {
            visitor.visit_expr(ctx, callee, &inner)?;
            for arg in args {
                visitor.visit_expr(ctx, arg, &inner)?;
            }
        }
        ExprKind::Return { value, .. } => {
            if let Some(value) = value {
                visitor.visit_expr(ctx, value, &inner)?;
            }
        }
        ExprKind::StringConcat(parts) => {
            for part in parts {
                visitor.visit_expr(ctx, part, &inner)?;
            }
        }
    }
    Ok(())
}

/// Visit the children of a statement
pub(crate) fn walk_stmt_children<V: CodeVisitor>(
    visitor: &mut V,
    ctx: &mut LoweringContext<'_>,
    stmt: &mut Stmt,
    scope: &Scope,
) -> LowerResult<()> {
    match stmt {
        Stmt::Expr(expr) => visitor.visit_expr(ctx, expr, scope),
        Stmt::Decl(local) => {
            let local = *local;
            walk_code(visitor, ctx, local, scope)
        }
        Stmt::If {
            cond,
            then,
            otherwise,
        } => {
            visitor.visit_expr(ctx, cond, &scope.value())?;
            visitor.visit_block(ctx, then, &scope.statement(), false)?;
            if let Some(otherwise) = otherwise {
                visitor.visit_block(ctx, otherwise, &scope.statement(), false)?;
            }
            Ok(())
        }
        Stmt::While { cond, body, .. } => {
            visitor.visit_expr(ctx, cond, &scope.value())?;
            visitor.visit_block(ctx, body, &scope.statement(), false)
        }
        Stmt::Block(block) => visitor.visit_block(ctx, block, &scope.statement(), false),
        Stmt::Break(_) | Stmt::Continue(_) => Ok(()),
    }
}
