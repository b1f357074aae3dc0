//! Integration tests for non-constant parameter default values

mod common;

use common::{body, call_with, lower, with_origin, Interpreter, Value};
use strata_ir::{
    Block, Container, DeclId, DeclKind, DeclOrigin, Expr, ExprKind, ExprOrigin, IrType, Program, Stmt,
    SuperRelation, Visibility,
};

fn default_value(program: &Program, param: DeclId) -> &Expr {
    program[param]
        .as_param()
        .and_then(|p| p.default_value.as_ref())
        .expect("parameter has a default value")
}

fn marker_of(program: &Program, param: DeclId) -> DeclId {
    let default = default_value(program, param);
    let ExprKind::Call(call) = &default.kind else {
        panic!("default is a marker instance, got {:?}", default);
    };
    assert!(call.explicit_const);
    default.ty.class_symbol().expect("marker type is a declared class")
}

/// `fun f(a: Int = nonConstExpr()): Int = a`
#[test_log::test]
fn test_default_is_evaluated_only_when_omitted() {
    let mut program = Program::new();
    let file = program.add_file("defaults.kt", "app");
    let non_const = program
        .add_function(Container::File(file), "nonConstExpr", IrType::int())
        .unwrap();
    let f = program
        .add_function(Container::File(file), "f", IrType::int())
        .unwrap();
    let a = program.add_param(f, "a", IrType::int()).unwrap();
    program
        .set_default_value(a, Expr::call(non_const, vec![], IrType::int()))
        .unwrap();
    program
        .set_body(
            f,
            Block::new(vec![Stmt::Expr(Expr::ret(f, Some(Expr::get_value(a, IrType::int()))))]),
        )
        .unwrap();

    let report = lower(&mut program);
    assert_eq!(common::changes(&report, file, "complex-param-defaults"), 1);

    // Platform types cannot be implemented by a marker
    assert_eq!(program[a].value_type(), Some(&IrType::object().make_nullable()));
    assert_eq!(
        program[a].origin,
        DeclOrigin::ComplexParam {
            original_type: IrType::int()
        }
    );
    let marker = marker_of(&program, a);
    assert_eq!(program[marker].name, "$DefaultValue");

    let statements = &body(&program, f).statements;
    let Stmt::Decl(local) = statements[0] else {
        panic!("expected the typed local, got {:?}", statements[0]);
    };
    assert_eq!(program[local].name, "a$");
    assert_eq!(program[local].origin, DeclOrigin::ComplexParamValue);

    let mut run = Interpreter::new(&program);
    assert_eq!(run.call(f, vec![None]), Value::Int(1));
    assert_eq!(run.calls(non_const), 1);
    assert_eq!(run.call(f, vec![Some(Value::Int(7))]), Value::Int(7));
    assert_eq!(run.calls(non_const), 1);
    assert_eq!(run.call(f, vec![None]), Value::Int(2));
    assert_eq!(run.calls(non_const), 2);
}

/// `fun g(a: A = A(), b: B = B(), n: Int = 3): A`
#[test_log::test]
fn test_each_class_gets_its_own_marker() {
    let mut program = Program::new();
    let file = program.add_file("defaults.kt", "app");
    let class_a = program.add_class(Container::File(file), "A").unwrap();
    let ctor_a = program.add_constructor(class_a, "").unwrap();
    let class_b = program.add_class(Container::File(file), "B").unwrap();
    let ctor_b = program.add_constructor(class_b, "").unwrap();
    let type_a = IrType::declared("A", class_a);
    let type_b = IrType::declared("B", class_b);

    let g = program
        .add_function(Container::File(file), "g", type_a.clone())
        .unwrap();
    let a = program.add_param(g, "a", type_a.clone()).unwrap();
    program
        .set_default_value(a, Expr::call(ctor_a, vec![], type_a.clone()))
        .unwrap();
    let b = program.add_param(g, "b", type_b.clone()).unwrap();
    program
        .set_default_value(b, Expr::call(ctor_b, vec![], type_b.clone()))
        .unwrap();
    let n = program.add_param(g, "n", IrType::int()).unwrap();
    program.set_default_value(n, Expr::int(3)).unwrap();
    program
        .set_body(
            g,
            Block::new(vec![Stmt::Expr(Expr::ret(g, Some(Expr::get_value(a, type_a.clone()))))]),
        )
        .unwrap();

    lower(&mut program);

    let marker_a = marker_of(&program, a);
    let marker_b = marker_of(&program, b);
    assert_ne!(marker_a, marker_b);
    assert_eq!(program[marker_a].name, "$DefaultAValue");
    assert_eq!(program[marker_b].name, "$DefaultBValue");
    let super_type = &program[marker_a].as_class().unwrap().super_types[0];
    assert_eq!(super_type.relation, SuperRelation::ImplicitInterface);
    assert_eq!(super_type.ty.class_symbol(), Some(class_a));

    // Class-typed parameters keep their type; constant defaults are untouched
    assert_eq!(program[a].value_type(), Some(&type_a));
    assert_eq!(program[a].origin, DeclOrigin::Source);
    assert_eq!(default_value(&program, n), &Expr::int(3));
    assert_eq!(
        with_origin(&program, file, &DeclOrigin::ComplexParamDefaultValueMarker).len(),
        4,
        "two marker classes with one constructor each"
    );

    let guards = body(&program, g)
        .statements
        .iter()
        .filter(|s| {
            matches!(s, Stmt::If { cond, .. } if cond.origin == ExprOrigin::ComplexDefaultGuard)
        })
        .count();
    assert_eq!(guards, 2);

    let mut run = Interpreter::new(&program);
    assert_eq!(run.call(g, vec![None, None, None]), Value::Object(class_a));
}

/// `class Box(val size: Int = compute())`, constructed as `Box()`
#[test_log::test]
fn test_field_initializing_constructor_becomes_factory() {
    let mut program = Program::new();
    let file = program.add_file("defaults.kt", "app");
    let compute = program
        .add_function(Container::File(file), "compute", IrType::int())
        .unwrap();
    let class = program.add_class(Container::File(file), "Box").unwrap();
    let box_type = IrType::declared("Box", class);
    let field = program
        .add_field(Container::Class(class), "size", IrType::int(), None)
        .unwrap();
    let ctor = program.add_constructor(class, "").unwrap();
    program[ctor].as_constructor_mut().unwrap().is_primary = true;
    let size = program.add_param(ctor, "size", IrType::int()).unwrap();
    program
        .set_default_value(size, Expr::call(compute, vec![], IrType::int()))
        .unwrap();
    program[size].as_param_mut().unwrap().initializes = Some(field);

    let make = program
        .add_function(Container::File(file), "make", box_type.clone())
        .unwrap();
    program
        .set_body(
            make,
            Block::new(vec![Stmt::Expr(Expr::ret(
                make,
                Some(call_with(ctor, vec![None], box_type.clone())),
            ))]),
        )
        .unwrap();

    lower(&mut program);

    let members = program[class].as_class().unwrap().members.clone();
    assert_eq!(members.len(), 3);
    assert_eq!(members[1], ctor);
    let actual = members[2];

    let DeclKind::Constructor(redirect) = &program[ctor].kind else {
        panic!("constructor kept its kind");
    };
    assert!(redirect.is_factory);
    assert!(!redirect.is_primary);
    assert_eq!(program[ctor].origin, DeclOrigin::FactoryRedirect);
    assert!(program[size].as_param().unwrap().initializes.is_none());

    assert_eq!(program[actual].origin, DeclOrigin::FactoryRedirectActual);
    assert_eq!(program[actual].visibility, Visibility::Private);
    assert_eq!(program[actual].effective_name(), "_$");
    let actual_param = program[actual].params()[0];
    assert_eq!(program[actual_param].origin, DeclOrigin::FactoryRedirectActualParam);
    let actual_param = program[actual_param].as_param().unwrap();
    assert_eq!(actual_param.initializes, Some(field));
    assert!(actual_param.default_value.is_none());

    let Some(Stmt::Expr(last)) = body(&program, ctor).statements.last() else {
        panic!("factory ends with a statement");
    };
    let ExprKind::Return { value: Some(forward), .. } = &last.kind else {
        panic!("factory returns the forwarded instance");
    };
    let ExprKind::Call(call) = &forward.kind else {
        panic!("factory forwards with a call");
    };
    assert_eq!(call.target, actual);

    let mut run = Interpreter::new(&program);
    assert_eq!(run.call(make, Vec::new()), Value::Object(class));
    assert_eq!(run.calls(compute), 1);
    assert_eq!(run.calls(actual), 1);
}

/// A constructor whose complex parameter is only read by its body keeps its shape
#[test_log::test]
fn test_plain_constructor_guards_in_body() {
    let mut program = Program::new();
    let file = program.add_file("defaults.kt", "app");
    let compute = program
        .add_function(Container::File(file), "compute", IrType::int())
        .unwrap();
    let class = program.add_class(Container::File(file), "Counter").unwrap();
    let ctor = program.add_constructor(class, "").unwrap();
    let start = program.add_param(ctor, "start", IrType::int()).unwrap();
    program
        .set_default_value(start, Expr::call(compute, vec![], IrType::int()))
        .unwrap();
    program
        .set_body(
            ctor,
            Block::new(vec![Stmt::Expr(Expr::call(compute, vec![], IrType::int()))]),
        )
        .unwrap();

    lower(&mut program);

    assert_eq!(program[class].as_class().unwrap().members, vec![ctor]);
    assert!(!program[ctor].as_constructor().unwrap().is_factory);
    let statements = &body(&program, ctor).statements;
    assert_eq!(statements.len(), 2);
    assert!(matches!(statements[0], Stmt::Decl(_)));
}

/// `fun g(a: p1.Item = p1.Item(), b: p2.Item = p2.Item()): p1.Item = a`
#[test_log::test]
fn test_same_named_classes_get_their_own_markers() {
    let mut program = Program::new();
    let file_one = program.add_file("p1/Item.kt", "p1");
    let item_one = program.add_class(Container::File(file_one), "Item").unwrap();
    let ctor_one = program.add_constructor(item_one, "").unwrap();
    let file_two = program.add_file("p2/Item.kt", "p2");
    let item_two = program.add_class(Container::File(file_two), "Item").unwrap();
    let ctor_two = program.add_constructor(item_two, "").unwrap();
    let type_one = IrType::declared("Item", item_one);
    let type_two = IrType::declared("Item", item_two);

    let file = program.add_file("app/defaults.kt", "app");
    let g = program
        .add_function(Container::File(file), "g", type_one.clone())
        .unwrap();
    let a = program.add_param(g, "a", type_one.clone()).unwrap();
    program
        .set_default_value(a, Expr::call(ctor_one, vec![], type_one.clone()))
        .unwrap();
    let b = program.add_param(g, "b", type_two.clone()).unwrap();
    program
        .set_default_value(b, Expr::call(ctor_two, vec![], type_two.clone()))
        .unwrap();
    program
        .set_body(
            g,
            Block::new(vec![Stmt::Expr(Expr::ret(g, Some(Expr::get_value(a, type_one.clone()))))]),
        )
        .unwrap();

    lower(&mut program);

    let marker_a = marker_of(&program, a);
    let marker_b = marker_of(&program, b);
    assert_ne!(marker_a, marker_b);
    assert_eq!(program[marker_a].name, "$DefaultItemValue");
    assert_eq!(program[marker_b].name, "$DefaultItemValue_1");
    let implemented = |marker: DeclId| program[marker].as_class().unwrap().super_types[0].ty.class_symbol();
    assert_eq!(implemented(marker_a), Some(item_one));
    assert_eq!(implemented(marker_b), Some(item_two));

    let mut run = Interpreter::new(&program);
    assert_eq!(run.call(g, vec![None, None]), Value::Object(item_one));
    assert_eq!(run.calls(ctor_one), 1);
    assert_eq!(run.calls(ctor_two), 1);
}
