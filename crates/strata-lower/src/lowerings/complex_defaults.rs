//! Parameter default values that are not compile-time constants
//!
//! The target only accepts constant default values. A parameter whose default
//! is anything else gets a marker instance as its default, and the body starts
//! by swapping the marker for the real default:
//!
//! ```text
//! fun f(a: Item = Item.create()) { .. }
//!
//! f({Item a = const $DefaultItemValue()}) {
//!   if (identical(a, const $DefaultItemValue())) a = Item.create();
//!   ..
//! }
//! ```
//!
//! When the parameter type is a non-generic class of the program, the marker
//! class implements it (`$Default<Class>Value`). Platform types cannot be
//! implemented: the parameter is widened to `Object?`, the shared `$DefaultValue`
//! marker is used, and the typed value lives in a local `<name>$` that the body
//! reads instead of the parameter.
//!
//! A constructor whose complex parameter initializes a field directly, or is read
//! by its delegation, cannot run anything before them. It becomes a factory that
//! evaluates the defaults and forwards to a private copy of the constructor.

use crate::context::{LoweringContext, Scope};
use crate::error::{LowerError, LowerResult};
use crate::lowerings::target_names::private_target_name;
use crate::transform::{DeclarationLowering, Transformation};
use strata_ir::copy::rebind_block;
use strata_ir::visit::references_of;
use strata_ir::{
    deep_copy, rebind, Block, ClassDecl, ClassKind, DeclId, DeclKind, DeclOrigin, Declaration, Expr, ExprKind,
    ExprOrigin, FileId, IrError, IrType, Parent, Program, Stmt, SuperRelation, SuperType, TypeOperator, Visibility,
};
use tracing::debug;

const SHARED_MARKER: &str = "$DefaultValue";

/// Replaces non-constant default values with marker instances
pub struct ComplexParamDefaultsLowering;

impl DeclarationLowering for ComplexParamDefaultsLowering {
    fn name(&self) -> &'static str {
        "complex-param-defaults"
    }

    fn transform(
        &self,
        ctx: &mut LoweringContext<'_>,
        id: DeclId,
        _scope: &Scope,
    ) -> LowerResult<Transformation<DeclId, DeclId>> {
        let decl = ctx.program.resolve(id)?;
        let eligible = !decl.annotations.builtin
            && match &decl.kind {
                DeclKind::Function(f) => f.body.is_some() && !f.is_lambda,
                DeclKind::Constructor(_) => true,
                _ => false,
            };
        if !eligible {
            return Ok(Transformation::NoChange);
        }
        let complex = complex_params(ctx.program, id)?;
        if complex.is_empty() {
            return Ok(Transformation::NoChange);
        }
        debug!(symbol = %id, params = complex.len(), "lowering complex default values");

        if needs_factory(ctx.program, id, &complex)? {
            return redirect_constructor(ctx, id, &complex);
        }
        guard_in_body(ctx, id, &complex)?;
        Ok(Transformation::Replace(id))
    }
}

/// Check whether the target accepts `expr` as a default value
pub fn is_constant_expression(program: &Program, expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Const(_) => true,
        ExprKind::Binary { lhs, rhs, .. } => {
            is_constant_expression(program, lhs) && is_constant_expression(program, rhs)
        }
        ExprKind::Not(operand) => is_constant_expression(program, operand),
        ExprKind::StringConcat(parts) => parts.iter().all(|p| is_constant_expression(program, p)),
        ExprKind::Call(call) => {
            call.receiver.is_none()
                && is_const_constructor(program, call.target)
                && call.args.iter().flatten().all(|a| is_constant_expression(program, a))
        }
        ExprKind::GetField { receiver: None, field } => program
            .get(*field)
            .is_some_and(|f| matches!(&f.kind, DeclKind::Field(field) if field.is_const)),
        ExprKind::FunctionRef(function) => program.get(*function).is_some_and(|f| {
            matches!(f.parent, Parent::File(_)) || f.as_function().is_some_and(|f| f.is_static)
        }),
        _ => false,
    }
}

fn is_const_constructor(program: &Program, id: DeclId) -> bool {
    program.get(id).is_some_and(|decl| {
        decl.as_constructor()
            .is_some_and(|c| c.is_const || decl.annotations.target_const)
    })
}

fn complex_params(program: &Program, id: DeclId) -> LowerResult<Vec<DeclId>> {
    let mut complex = Vec::new();
    for &param in program.resolve(id)?.params() {
        let is_complex = program
            .resolve(param)?
            .as_param()
            .and_then(|p| p.default_value.as_ref())
            .is_some_and(|d| !is_constant_expression(program, d));
        if is_complex {
            complex.push(param);
        }
    }
    Ok(complex)
}

fn needs_factory(program: &Program, id: DeclId, complex: &[DeclId]) -> LowerResult<bool> {
    let Some(ctor) = program.resolve(id)?.as_constructor() else {
        return Ok(false);
    };
    let delegated = ctor
        .delegation
        .as_ref()
        .map(|d| references_of(d))
        .unwrap_or_default();
    for &param in complex {
        let initializes = program
            .resolve(param)?
            .as_param()
            .is_some_and(|p| p.initializes.is_some());
        if initializes || delegated.contains(&param) {
            return Ok(true);
        }
    }
    Ok(false)
}

// ============================================================================
// Markers
// ============================================================================

/// Marker instance for a parameter of type `ty`, and whether the parameter must
/// be widened to hold it
fn marker_for(ctx: &mut LoweringContext<'_>, ty: &IrType) -> LowerResult<(Expr, bool)> {
    let implemented = match ty {
        IrType::Class(c) if c.args.is_empty() => c.class.filter(|class| {
            ctx.program
                .get(*class)
                .is_some_and(|decl| decl.is_class() && !decl.annotations.builtin)
        }),
        _ => None,
    };
    let (class, ctor) = marker_class(ctx, implemented)?;
    let class_name = ctx.program.resolve(class)?.name.clone();
    let mut instance = Expr::call(ctor, Vec::new(), IrType::declared(class_name, class));
    if let ExprKind::Call(call) = &mut instance.kind {
        call.explicit_const = true;
    }
    Ok((instance, implemented.is_none()))
}

/// The file's marker class for `implemented` (or the shared one), created on
/// first use
///
/// Markers are keyed by the class they implement. Classes sharing a simple name
/// get `$Default<Class>Value_1`, `_2`, ...
fn marker_class(ctx: &mut LoweringContext<'_>, implemented: Option<DeclId>) -> LowerResult<(DeclId, DeclId)> {
    if let Some(existing) = existing_marker(ctx.program, ctx.file, implemented)? {
        return Ok(existing);
    }

    let (base, super_types) = match implemented {
        Some(class) => {
            let decl = ctx.program.resolve(class)?;
            let relation = if decl.is_interface() {
                SuperRelation::Implements
            } else {
                SuperRelation::ImplicitInterface
            };
            let super_type = SuperType {
                ty: IrType::declared(decl.name.clone(), class),
                relation,
            };
            (format!("$Default{}Value", decl.name), vec![super_type])
        }
        None => (SHARED_MARKER.to_string(), Vec::new()),
    };
    let name = ctx.unique_top_level_name(&base)?;

    let class = ctx.program.alloc(
        Declaration::new(
            name.clone(),
            DeclKind::Class(ClassDecl {
                kind: ClassKind::Class,
                super_types,
                members: Vec::new(),
            }),
        )
        .with_origin(DeclOrigin::ComplexParamDefaultValueMarker),
    );
    ctx.add_to_file(class)?;
    let ctor = ctx.program.add_constructor(class, "")?;
    let decl = ctx.program.resolve_mut(ctor)?;
    decl.origin = DeclOrigin::ComplexParamDefaultValueMarker;
    if let Some(c) = decl.as_constructor_mut() {
        c.is_const = true;
        c.body = None;
    }
    debug!(marker = %name, file = %ctx.file, "default value marker added");
    Ok((class, ctor))
}

/// Marker class and constructor of `file` implementing `implemented`; the shared
/// marker implements nothing
fn existing_marker(
    program: &Program,
    file: FileId,
    implemented: Option<DeclId>,
) -> LowerResult<Option<(DeclId, DeclId)>> {
    for &existing in &program.file(file)?.declarations {
        let Some(decl) = program.get(existing) else {
            continue;
        };
        if decl.origin != DeclOrigin::ComplexParamDefaultValueMarker {
            continue;
        }
        let Some(class) = decl.as_class() else {
            continue;
        };
        let implements = class.super_types.first().and_then(|s| s.ty.class_symbol());
        if implements == implemented {
            if let Some(&ctor) = class.members.first() {
                return Ok(Some((existing, ctor)));
            }
        }
    }
    Ok(None)
}

// ============================================================================
// Prologue
// ============================================================================

/// A parameter whose default was replaced by a marker
struct Materialized {
    param: DeclId,
    name: String,
    default: Expr,
    marker: Expr,
    ty: IrType,
    widened: bool,
}

fn materialize(ctx: &mut LoweringContext<'_>, param: DeclId) -> LowerResult<Materialized> {
    let code = ctx.program.take_code(param)?;
    let decl = ctx.program.resolve(param)?;
    let name = decl.name.clone();
    let ty = decl.value_type().cloned().unwrap_or(IrType::Dynamic);
    let default = code.value.ok_or_else(|| IrError::WrongKind {
        symbol: param,
        name: name.clone(),
        expected: "parameter with a default value",
    })?;

    let (marker, widened) = marker_for(ctx, &ty)?;
    let decl = ctx.program.resolve_mut(param)?;
    if widened {
        decl.origin = DeclOrigin::ComplexParam {
            original_type: ty.clone(),
        };
    }
    if let Some(p) = decl.as_param_mut() {
        if widened {
            p.ty = IrType::object().make_nullable();
        }
        p.default_value = Some(marker.clone());
    }
    Ok(Materialized {
        param,
        name,
        default,
        marker,
        ty,
        widened,
    })
}

/// Statements swapping markers for defaults, owned by `owner`, plus the local
/// that replaces each widened parameter
fn prologue(
    ctx: &mut LoweringContext<'_>,
    owner: DeclId,
    params: Vec<Materialized>,
) -> LowerResult<(Vec<Stmt>, Vec<(DeclId, DeclId)>)> {
    let mut statements = Vec::new();
    let mut rebinds: Vec<(DeclId, DeclId)> = Vec::new();
    for m in params {
        let mut default = m.default;
        for &(from, to) in &rebinds {
            rebind(&mut default, from, to);
        }
        let span = default.span;

        if m.widened {
            let read = Expr::get_value(m.param, IrType::object().make_nullable()).with_span(span);
            let passed_marker = Expr::identical(read.clone(), m.marker)
                .with_origin(ExprOrigin::ComplexDefaultGuard)
                .with_span(span);
            let typed = Expr::type_op(TypeOperator::Cast, read, m.ty.clone());
            let value = Expr::conditional(passed_marker, default, typed, m.ty.clone()).with_span(span);
            let local = ctx.add_temporary(owner, &format!("{}$", m.name), value, DeclOrigin::ComplexParamValue)?;
            statements.push(Stmt::Decl(local));
            rebinds.push((m.param, local));
        } else {
            let read = Expr::get_value(m.param, m.ty.clone()).with_span(span);
            let passed_marker = Expr::identical(read, m.marker)
                .with_origin(ExprOrigin::ComplexDefaultGuard)
                .with_span(span);
            ctx.adopt_expr(&default, owner)?;
            statements.push(Stmt::If {
                cond: passed_marker,
                then: Block::new(vec![Stmt::Expr(Expr::set_value(m.param, default).with_span(span))]),
                otherwise: None,
            });
        }
    }
    Ok((statements, rebinds))
}

/// Locals and lambdas introduced by the code of `id` (not its parameters)
fn code_introduced(program: &Program, id: DeclId) -> LowerResult<Vec<DeclId>> {
    let params = program.resolve(id)?.params().to_vec();
    Ok(program
        .owned_children(id)?
        .into_iter()
        .filter(|child| !params.contains(child))
        .collect())
}

/// Everything below `id` except its own parameters
fn descendants_except_params(program: &Program, id: DeclId) -> LowerResult<Vec<DeclId>> {
    let params = program.resolve(id)?.params().to_vec();
    Ok(program
        .subtree(id)?
        .into_iter()
        .filter(|d| *d != id && !params.contains(d))
        .collect())
}

fn rebind_code(program: &mut Program, ids: &[DeclId], rebinds: &[(DeclId, DeclId)]) -> LowerResult<()> {
    for &id in ids {
        if !program.is_live(id) {
            continue;
        }
        let mut code = program.take_code(id)?;
        for &(from, to) in rebinds {
            if let Some(body) = &mut code.body {
                rebind_block(body, from, to);
            }
            if let Some(value) = &mut code.value {
                rebind(value, from, to);
            }
            if let Some(delegation) = &mut code.delegation {
                rebind(delegation, from, to);
            }
        }
        program.restore_code(id, code)?;
    }
    Ok(())
}

/// Drop the code of `id` together with the locals and lambdas it introduces
fn discard_code(program: &mut Program, id: DeclId) -> LowerResult<()> {
    for child in code_introduced(program, id)? {
        program.destroy(child)?;
    }
    program.take_code(id)?;
    Ok(())
}

// ============================================================================
// Functions and plain constructors
// ============================================================================

fn guard_in_body(ctx: &mut LoweringContext<'_>, function: DeclId, complex: &[DeclId]) -> LowerResult<()> {
    let descendants = descendants_except_params(ctx.program, function)?;

    let mut materialized = Vec::with_capacity(complex.len());
    for &param in complex {
        materialized.push(materialize(ctx, param)?);
    }
    let (mut statements, rebinds) = prologue(ctx, function, materialized)?;

    let mut code = ctx.program.take_code(function)?;
    let mut body = code.body.take().unwrap_or_default();
    for &(from, to) in &rebinds {
        rebind_block(&mut body, from, to);
        if let Some(delegation) = &mut code.delegation {
            rebind(delegation, from, to);
        }
    }
    statements.append(&mut body.statements);
    code.body = Some(Block::new(statements));
    ctx.program.restore_code(function, code)?;

    rebind_code(ctx.program, &descendants, &rebinds)
}

// ============================================================================
// Factory redirect
// ============================================================================

fn redirect_constructor(
    ctx: &mut LoweringContext<'_>,
    ctor: DeclId,
    complex: &[DeclId],
) -> LowerResult<Transformation<DeclId, DeclId>> {
    let decl = ctx.program.resolve(ctor)?;
    let Parent::Decl(class) = decl.parent else {
        return Err(LowerError::PipelineOrdering {
            pass: "complex-param-defaults",
            file: ctx.file,
            message: format!("constructor {} is not a class member", ctor),
        });
    };
    let actual_name = format!("{}$", decl.name);
    let class_name = ctx.program.resolve(class)?.name.clone();

    let actual = deep_copy(ctx.program, ctor, |decl| {
        decl.target_name = Some(private_target_name(&actual_name));
        decl.name = actual_name;
        decl.visibility = Visibility::Private;
        decl.origin = DeclOrigin::FactoryRedirectActual;
        decl.annotations.target_name = None;
    })?;
    for param in ctx.program.resolve(actual)?.params().to_vec() {
        discard_code(ctx.program, param)?;
        ctx.program.resolve_mut(param)?.origin = DeclOrigin::FactoryRedirectActualParam;
    }

    discard_code(ctx.program, ctor)?;
    let params = ctx.program.resolve(ctor)?.params().to_vec();
    for &param in &params {
        if let Some(p) = ctx.program.resolve_mut(param)?.as_param_mut() {
            p.initializes = None;
        }
    }

    let mut materialized = Vec::with_capacity(complex.len());
    for &param in complex {
        materialized.push(materialize(ctx, param)?);
    }
    let (mut statements, rebinds) = prologue(ctx, ctor, materialized)?;

    let mut args = Vec::with_capacity(params.len());
    for &param in &params {
        let value = rebinds
            .iter()
            .find(|(from, _)| *from == param)
            .map_or(param, |(_, to)| *to);
        let ty = ctx
            .program
            .resolve(value)?
            .value_type()
            .cloned()
            .unwrap_or(IrType::Dynamic);
        args.push(Expr::get_value(value, ty));
    }
    let forward = Expr::call(actual, args, IrType::declared(class_name, class));
    statements.push(Stmt::Expr(Expr::ret(ctor, Some(forward))));

    let decl = ctx.program.resolve_mut(ctor)?;
    decl.origin = DeclOrigin::FactoryRedirect;
    if let Some(c) = decl.as_constructor_mut() {
        c.is_factory = true;
        c.is_const = false;
        c.is_primary = false;
        c.delegation = None;
        c.body = Some(Block::new(statements));
    }
    debug!(constructor = %ctor, actual = %actual, "constructor redirected through a factory");
    Ok(Transformation::ReplaceWithMany(vec![ctor, actual]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoweringOptions;
    use strata_ir::{BinaryOp, Container};

    #[test]
    fn test_constant_expressions() {
        let mut program = Program::new();
        let file = program.add_file("a.kt", "app");
        let class = program.add_class(Container::File(file), "Point").unwrap();
        let ctor = program.add_constructor(class, "").unwrap();
        program[ctor].as_constructor_mut().unwrap().is_const = true;
        let make = program
            .add_function(Container::File(file), "make", IrType::int())
            .unwrap();

        let sum = Expr::binary(BinaryOp::Add, Expr::int(1), Expr::int(2), IrType::int());
        assert!(is_constant_expression(&program, &sum));
        assert!(is_constant_expression(&program, &Expr::null(IrType::int())));
        assert!(is_constant_expression(
            &program,
            &Expr::call(ctor, vec![], IrType::declared("Point", class))
        ));
        assert!(!is_constant_expression(&program, &Expr::call(make, vec![], IrType::int())));
    }

    #[test]
    fn test_markers_are_shared_per_file() {
        let mut program = Program::new();
        let file = program.add_file("a.kt", "app");
        let options = LoweringOptions::default();
        let mut ctx = LoweringContext::new(&mut program, &options, file);

        let (first, widened) = marker_for(&mut ctx, &IrType::int()).unwrap();
        let (second, _) = marker_for(&mut ctx, &IrType::string()).unwrap();
        assert!(widened);
        assert_eq!(first, second);
        assert_eq!(ctx.program.file(file).unwrap().declarations.len(), 1);
    }

    #[test]
    fn test_class_marker_implements_class() {
        let mut program = Program::new();
        let file = program.add_file("a.kt", "app");
        let item = program.add_class(Container::File(file), "Item").unwrap();
        let options = LoweringOptions::default();
        let mut ctx = LoweringContext::new(&mut program, &options, file);

        let (instance, widened) = marker_for(&mut ctx, &IrType::declared("Item", item)).unwrap();
        assert!(!widened);
        let marker = instance.ty.class_symbol().unwrap();
        let decl = &ctx.program[marker];
        assert_eq!(decl.name, "$DefaultItemValue");
        assert_eq!(decl.as_class().unwrap().super_types[0].ty.class_symbol(), Some(item));
    }

    #[test]
    fn test_same_named_classes_get_distinct_markers() {
        let mut program = Program::new();
        let first_file = program.add_file("p1/Item.kt", "p1");
        let first = program.add_class(Container::File(first_file), "Item").unwrap();
        let second_file = program.add_file("p2/Item.kt", "p2");
        let second = program.add_class(Container::File(second_file), "Item").unwrap();
        let file = program.add_file("a.kt", "app");
        let options = LoweringOptions::default();
        let mut ctx = LoweringContext::new(&mut program, &options, file);

        let (a, _) = marker_for(&mut ctx, &IrType::declared("Item", first)).unwrap();
        let (b, _) = marker_for(&mut ctx, &IrType::declared("Item", second)).unwrap();
        let (again, _) = marker_for(&mut ctx, &IrType::declared("Item", second)).unwrap();
        let (a, b) = (a.ty.class_symbol().unwrap(), b.ty.class_symbol().unwrap());
        assert_ne!(a, b);
        assert_eq!(again.ty.class_symbol(), Some(b));
        assert_eq!(ctx.program[a].name, "$DefaultItemValue");
        assert_eq!(ctx.program[b].name, "$DefaultItemValue_1");
        assert_eq!(ctx.program[b].as_class().unwrap().super_types[0].ty.class_symbol(), Some(second));
    }
}
