//! Shared fixtures for the lowering integration tests
//!
//! `Interpreter` evaluates the subset of the IR the fixtures use, before and
//! after lowering. Functions without a body act as counters: they return how
//! many times they have been called, which makes repeated evaluation visible.

#![allow(dead_code)]

use rustc_hash::FxHashMap;
use strata_ir::visit::{walk_declaration_code, walk_expr, Visitor};
use strata_ir::{
    BinaryOp, Block, DeclId, DeclKind, DeclOrigin, Expr, ExprKind, FileId, IrType, Literal, Program, Stmt,
    TypeOperator,
};
use strata_lower::{LowerError, Lowerer, LoweringOptions, LoweringReport};

// ============================================================================
// Running the pipeline
// ============================================================================

/// Options used by the tests: verification plus the idempotence re-run
pub fn options() -> LoweringOptions {
    LoweringOptions {
        check_idempotence: true,
        ..LoweringOptions::default()
    }
}

/// Lower with the standard pipeline, failing the test on any error
pub fn lower(program: &mut Program) -> LoweringReport {
    match Lowerer::new(options()).lower(program) {
        Ok(report) => report,
        Err(errors) => panic!("lowering failed: {:#?}", errors),
    }
}

/// Lower with the standard pipeline, expecting errors
pub fn lower_errors(program: &mut Program) -> Vec<LowerError> {
    match Lowerer::new(options()).lower(program) {
        Ok(report) => panic!("lowering succeeded: {:#?}", report),
        Err(errors) => errors,
    }
}

/// Changes a pass made to a file
pub fn changes(report: &LoweringReport, file: FileId, pass: &str) -> usize {
    report
        .file(file)
        .and_then(|f| f.passes.iter().find(|p| p.name == pass))
        .map_or(0, |p| p.changes)
}

// ============================================================================
// Building
// ============================================================================

/// Call with explicit argument slots; `None` leaves the argument out
pub fn call_with(target: DeclId, args: Vec<Option<Expr>>, ty: IrType) -> Expr {
    let mut call = Expr::call(target, Vec::new(), ty);
    if let ExprKind::Call(c) = &mut call.kind {
        c.args = args;
    }
    call
}

// ============================================================================
// Tree queries
// ============================================================================

/// Declarations of a file with the given origin
pub fn with_origin(program: &Program, file: FileId, origin: &DeclOrigin) -> Vec<DeclId> {
    program
        .file_decl_tree(file)
        .expect("file exists")
        .into_iter()
        .filter(|id| program[*id].origin == *origin)
        .collect()
}

/// Body of a function or constructor
pub fn body(program: &Program, id: DeclId) -> &Block {
    match &program[id].kind {
        DeclKind::Function(f) => f.body.as_ref().expect("function has a body"),
        DeclKind::Constructor(c) => c.body.as_ref().expect("constructor has a body"),
        other => panic!("no body on {:?}", other),
    }
}

#[derive(Default)]
struct Census {
    calls: FxHashMap<DeclId, usize>,
    whens: usize,
    not_null: usize,
    conditionals: usize,
}

impl Visitor for Census {
    fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Call(call) => *self.calls.entry(call.target).or_default() += 1,
            ExprKind::When(_) => self.whens += 1,
            ExprKind::NotNull(_) => self.not_null += 1,
            ExprKind::Conditional { .. } => self.conditionals += 1,
            _ => {}
        }
        walk_expr(self, expr);
    }
}

fn census(program: &Program, file: FileId) -> Census {
    let mut census = Census::default();
    for id in program.file_decl_tree(file).expect("file exists") {
        walk_declaration_code(&mut census, &program[id]);
    }
    census
}

/// Number of call sites of `target` anywhere in a file
pub fn call_sites(program: &Program, file: FileId, target: DeclId) -> usize {
    census(program, file).calls.get(&target).copied().unwrap_or(0)
}

/// Number of multi-branch nodes left in a file
pub fn whens(program: &Program, file: FileId) -> usize {
    census(program, file).whens
}

/// Number of non-null assertions in a file
pub fn not_null_assertions(program: &Program, file: FileId) -> usize {
    census(program, file).not_null
}

/// Number of conditionals in a file
pub fn conditionals(program: &Program, file: FileId) -> usize {
    census(program, file).conditionals
}

// ============================================================================
// Interpreter
// ============================================================================

/// Runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
    Null,
    Unit,
    /// Instance of a class
    Object(DeclId),
    /// Function value
    Function(DeclId),
}

enum Unwind {
    Return { from: DeclId, value: Value },
}

type Eval = Result<Value, Unwind>;

/// Evaluator for the IR subset used by the fixtures
pub struct Interpreter<'a> {
    program: &'a Program,
    env: FxHashMap<DeclId, Value>,
    subjects: Vec<Value>,
    calls: FxHashMap<DeclId, usize>,
}

impl<'a> Interpreter<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self {
            program,
            env: FxHashMap::default(),
            subjects: Vec::new(),
            calls: FxHashMap::default(),
        }
    }

    /// Times `function` has been entered
    pub fn calls(&self, function: DeclId) -> usize {
        self.calls.get(&function).copied().unwrap_or(0)
    }

    /// Call `function`; `None` arguments are omitted
    pub fn call(&mut self, function: DeclId, args: Vec<Option<Value>>) -> Value {
        let count = self.calls.entry(function).or_default();
        *count += 1;
        let count = *count;

        let program = self.program;
        let decl = &program[function];
        for (index, param) in decl.params().iter().enumerate() {
            let value = match args.get(index).cloned().flatten() {
                Some(value) => value,
                None => {
                    let default = match &program[*param].kind {
                        DeclKind::ValueParameter(p) => p.default_value.clone(),
                        _ => None,
                    };
                    let default = default.unwrap_or_else(|| panic!("no value for parameter {}", param));
                    self.value(&default)
                }
            };
            self.env.insert(*param, value);
        }

        let (body, result_class) = match &decl.kind {
            DeclKind::Function(f) => (f.body.clone(), None),
            DeclKind::Constructor(c) => (c.body.clone().filter(|_| c.is_factory), program.enclosing_class(function)),
            other => panic!("cannot call {:?}", other),
        };
        match (body, result_class) {
            (Some(body), _) => match self.block(&body) {
                Ok(value) => value,
                Err(Unwind::Return { from, value }) if from == function => value,
                Err(Unwind::Return { from, .. }) => panic!("return from {} escaped {}", from, function),
            },
            (None, Some(class)) => Value::Object(class),
            (None, None) => Value::Int(count as i64),
        }
    }

    fn value(&mut self, expr: &Expr) -> Value {
        match self.expr(expr) {
            Ok(value) => value,
            Err(Unwind::Return { from, .. }) => panic!("return from {} in a value", from),
        }
    }

    fn block(&mut self, block: &Block) -> Eval {
        let mut last = Value::Unit;
        for stmt in &block.statements {
            last = self.stmt(stmt)?;
        }
        Ok(last)
    }

    fn stmt(&mut self, stmt: &Stmt) -> Eval {
        match stmt {
            Stmt::Expr(expr) => self.expr(expr),
            Stmt::Decl(local) => {
                let initializer = match &self.program[*local].kind {
                    DeclKind::Variable(v) => v.initializer.clone(),
                    DeclKind::Function(_) => None,
                    other => panic!("unexpected local {:?}", other),
                };
                let value = match initializer {
                    Some(init) => self.expr(&init)?,
                    None => Value::Null,
                };
                self.env.insert(*local, value);
                Ok(Value::Unit)
            }
            Stmt::If { cond, then, otherwise } => {
                if self.expr(cond)? == Value::Bool(true) {
                    self.block(then)
                } else if let Some(otherwise) = otherwise {
                    self.block(otherwise)
                } else {
                    Ok(Value::Unit)
                }
            }
            Stmt::While { cond, body, .. } => {
                while self.expr(cond)? == Value::Bool(true) {
                    self.block(body)?;
                }
                Ok(Value::Unit)
            }
            Stmt::Block(block) => self.block(block),
            Stmt::Break(_) | Stmt::Continue(_) => panic!("jumps are not supported"),
        }
    }

    fn expr(&mut self, expr: &Expr) -> Eval {
        Ok(match &expr.kind {
            ExprKind::Const(literal) => match literal {
                Literal::Int(v) => Value::Int(*v),
                Literal::Bool(v) => Value::Bool(*v),
                Literal::String(v) => Value::Str(v.clone()),
                Literal::Null => Value::Null,
                Literal::Double(_) => panic!("doubles are not supported"),
            },
            ExprKind::GetValue(symbol) => self
                .env
                .get(symbol)
                .cloned()
                .unwrap_or_else(|| panic!("{} read before it was set", symbol)),
            ExprKind::SetValue { target, value } => {
                let value = self.expr(value)?;
                self.env.insert(*target, value);
                Value::Unit
            }
            ExprKind::Call(call) => {
                let mut args = Vec::with_capacity(call.args.len());
                for arg in &call.args {
                    args.push(match arg {
                        Some(arg) => Some(self.expr(arg)?),
                        None => None,
                    });
                }
                self.call(call.target, args)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let (lhs, rhs) = (self.expr(lhs)?, self.expr(rhs)?);
                match (op, lhs, rhs) {
                    (BinaryOp::Eq, l, r) => Value::Bool(l == r),
                    (BinaryOp::NotEq, l, r) => Value::Bool(l != r),
                    (BinaryOp::Add, Value::Int(l), Value::Int(r)) => Value::Int(l + r),
                    (BinaryOp::Mul, Value::Int(l), Value::Int(r)) => Value::Int(l * r),
                    (op, l, r) => panic!("unsupported {:?} on {:?} and {:?}", op, l, r),
                }
            }
            ExprKind::Not(operand) => match self.expr(operand)? {
                Value::Bool(v) => Value::Bool(!v),
                other => panic!("cannot negate {:?}", other),
            },
            ExprKind::NotNull(operand) => match self.expr(operand)? {
                Value::Null => panic!("null asserted non-null"),
                value => value,
            },
            ExprKind::TypeOp { op, operand, .. } => match op {
                TypeOperator::Cast | TypeOperator::SafeCast => self.expr(operand)?,
                other => panic!("unsupported type operator {:?}", other),
            },
            ExprKind::Identical(a, b) => {
                let (a, b) = (self.expr(a)?, self.expr(b)?);
                Value::Bool(a == b)
            }
            ExprKind::When(when) => {
                let pushed = match &when.subject {
                    Some(subject) => {
                        let value = self.expr(subject)?;
                        self.subjects.push(value);
                        true
                    }
                    None => false,
                };
                let mut result = Value::Null;
                for branch in &when.branches {
                    if self.expr(&branch.condition)? == Value::Bool(true) {
                        result = self.expr(&branch.result)?;
                        break;
                    }
                }
                if pushed {
                    self.subjects.pop();
                }
                result
            }
            ExprKind::Subject => self.subjects.last().cloned().expect("subject inside a when"),
            ExprKind::Conditional { cond, then, otherwise } => {
                if self.expr(cond)? == Value::Bool(true) {
                    self.expr(then)?
                } else {
                    self.expr(otherwise)?
                }
            }
            ExprKind::Block(block) => self.block(block)?,
            ExprKind::FunctionExpr(function) | ExprKind::FunctionRef(function) => Value::Function(*function),
            ExprKind::Invoke { callee, args } => {
                let Value::Function(function) = self.expr(callee)? else {
                    panic!("invoked a non-function");
                };
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(Some(self.expr(arg)?));
                }
                self.call(function, values)
            }
            ExprKind::Return { from, value } => {
                let value = match value {
                    Some(value) => self.expr(value)?,
                    None => Value::Unit,
                };
                return Err(Unwind::Return { from: *from, value });
            }
            ExprKind::StringConcat(parts) => {
                let mut text = String::new();
                for part in parts {
                    match self.expr(part)? {
                        Value::Str(s) => text.push_str(&s),
                        Value::Int(v) => text.push_str(&v.to_string()),
                        other => text.push_str(&format!("{:?}", other)),
                    }
                }
                Value::Str(text)
            }
            other => panic!("unsupported expression {:?}", other),
        })
    }
}
