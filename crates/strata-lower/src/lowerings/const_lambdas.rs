//! Lambdas passed to constant constructor calls
//!
//! A constant expression cannot contain a function literal, only a reference to
//! a top-level or static function. A lambda argument of a const constructor call
//! that captures nothing is moved to a private top-level function and the
//! argument becomes a reference to it.
//!
//! The function name is derived from the lambda's source span, so recompiling
//! unchanged input gives the same names.

use crate::context::{LoweringContext, Scope};
use crate::error::LowerResult;
use crate::lowerings::target_names::private_target_name;
use crate::transform::{ExpressionLowering, Transformation};
use rustc_hash::FxHashSet;
use strata_ir::visit::{walk_declaration_code, walk_expr};
use strata_ir::{
    deep_copy, ClassKind, DeclId, DeclKind, DeclOrigin, Expr, ExprKind, Parent, Program, Span, Visibility,
    Visitor,
};
use tracing::debug;

/// Promotes capture-free lambda arguments of const calls to top-level functions
pub struct ConstLambdaLiteralsLowering;

impl ExpressionLowering for ConstLambdaLiteralsLowering {
    fn name(&self) -> &'static str {
        "const-lambda-literals"
    }

    fn transform(
        &self,
        ctx: &mut LoweringContext<'_>,
        expr: &mut Expr,
        scope: &Scope,
    ) -> LowerResult<Transformation<Expr>> {
        let ExprKind::Call(call) = &mut expr.kind else {
            return Ok(Transformation::NoChange);
        };
        if !(call.explicit_const || scope.const_initializer) || !is_const_constructor(ctx.program, call.target) {
            return Ok(Transformation::NoChange);
        }

        let mut promoted = Vec::new();
        for (index, arg) in call.args.iter().enumerate() {
            if let Some(ExprKind::FunctionExpr(lambda)) = arg.as_ref().map(|a| &a.kind) {
                if is_capture_free(ctx.program, *lambda)? {
                    promoted.push((index, *lambda));
                }
            }
        }
        if promoted.is_empty() {
            return Ok(Transformation::NoChange);
        }

        for (index, lambda) in promoted {
            let function = promote(ctx, lambda)?;
            if let Some(Some(arg)) = call.args.get_mut(index) {
                *arg = Expr::function_ref(function, arg.ty.clone()).with_span(arg.span);
            }
        }
        Ok(Transformation::Replace(expr.take()))
    }
}

/// Name of the function promoted from a lambda at `span`
pub fn promoted_function_name(span: Span) -> String {
    let hash = 31i32
        .wrapping_mul(31i32.wrapping_add(span.start as i32))
        .wrapping_add(span.end as i32);
    format!("${:x}", hash as u32)
}

fn is_const_constructor(program: &Program, id: DeclId) -> bool {
    program.get(id).is_some_and(|decl| {
        decl.as_constructor()
            .is_some_and(|c| c.is_const || decl.annotations.target_const)
    })
}

fn promote(ctx: &mut LoweringContext<'_>, lambda: DeclId) -> LowerResult<DeclId> {
    let span = ctx.program.resolve(lambda)?.span;
    let name = ctx.unique_top_level_name(&promoted_function_name(span))?;
    let target_name = private_target_name(&name);

    let function = deep_copy(ctx.program, lambda, |decl| {
        decl.name = name;
        decl.target_name = Some(target_name);
        decl.visibility = Visibility::Private;
        decl.origin = DeclOrigin::PromotedLambda;
        if let Some(f) = decl.as_function_mut() {
            f.is_lambda = false;
        }
    })?;
    ctx.add_to_file(function)?;
    ctx.program.destroy(lambda)?;
    debug!(lambda = %lambda, function = %function, "lambda promoted to a top-level function");
    Ok(function)
}

// ============================================================================
// Capture analysis
// ============================================================================

fn is_capture_free(program: &Program, lambda: DeclId) -> LowerResult<bool> {
    let inside: FxHashSet<DeclId> = program.subtree(lambda)?.into_iter().collect();
    let mut finder = CaptureFinder {
        program,
        inside: &inside,
        captures: false,
    };
    for &id in &inside {
        walk_declaration_code(&mut finder, program.resolve(id)?);
        if finder.captures {
            return Ok(false);
        }
    }
    Ok(true)
}

struct CaptureFinder<'a> {
    program: &'a Program,
    inside: &'a FxHashSet<DeclId>,
    captures: bool,
}

impl CaptureFinder<'_> {
    fn is_outer_local(&self, symbol: DeclId) -> bool {
        !self.inside.contains(&symbol)
            && self.program.get(symbol).is_some_and(|decl| {
                matches!(decl.kind, DeclKind::ValueParameter(_) | DeclKind::Variable(_))
                    && matches!(decl.parent, Parent::Decl(_))
            })
    }

    /// Instance member reached through an implicit `this`
    fn is_instance_member(&self, symbol: DeclId) -> bool {
        let Some(decl) = self.program.get(symbol) else {
            return false;
        };
        let is_static = match &decl.kind {
            DeclKind::Function(f) => f.is_static,
            DeclKind::Field(f) => f.is_static,
            DeclKind::Property(_) => false,
            _ => return false,
        };
        if is_static {
            return false;
        }
        let mut owner = decl.parent;
        if let Parent::Decl(id) = owner {
            if let Some(property) = self.program.get(id).filter(|d| d.as_property().is_some()) {
                owner = property.parent;
            }
        }
        match owner {
            Parent::Decl(class) => self
                .program
                .get(class)
                .and_then(|c| c.as_class())
                .is_some_and(|c| c.kind != ClassKind::Object),
            _ => false,
        }
    }
}

impl Visitor for CaptureFinder<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        let captures = match &expr.kind {
            ExprKind::GetValue(symbol) | ExprKind::SetValue { target: symbol, .. } => self.is_outer_local(*symbol),
            ExprKind::This { .. } => true,
            ExprKind::Return { from, .. } => !self.inside.contains(from),
            ExprKind::GetField { receiver: None, field } | ExprKind::SetField { receiver: None, field, .. } => {
                self.is_instance_member(*field)
            }
            ExprKind::Call(call) if call.receiver.is_none() => self.is_instance_member(call.target),
            _ => false,
        };
        if captures {
            self.captures = true;
            return;
        }
        walk_expr(self, expr);
    }
}
