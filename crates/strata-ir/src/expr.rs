//! Expressions
//!
//! Expressions are owned trees compared by value. Every node carries its resolved
//! type and an origin tag. References to declarations (reads, calls, lambdas) go
//! through symbols, never through pointers into the tree.

use crate::origin::ExprOrigin;
use crate::stmt::Stmt;
use crate::symbol::{DeclId, Span};
use crate::types::IrType;
use serde::Serialize;

/// A typed expression node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    /// Node kind
    pub kind: ExprKind,
    /// Resolved type
    pub ty: IrType,
    /// Why the node exists
    pub origin: ExprOrigin,
    /// Source position
    pub span: Span,
}

/// Literal constants
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    /// Integer
    Int(i64),
    /// Floating point
    Double(f64),
    /// Boolean
    Bool(bool),
    /// String
    String(String),
    /// `null`
    Null,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `??`
    IfNull,
}

impl BinaryOp {
    /// Check whether the operator produces a `bool`
    pub fn is_predicate(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::And
                | BinaryOp::Or
        )
    }

    /// Operator token
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::IfNull => "??",
        }
    }
}

/// Type operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TypeOperator {
    /// `is`
    Is,
    /// `!is`
    NotIs,
    /// `as`
    Cast,
    /// `as?`
    SafeCast,
}

/// How a call is emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CallStyle {
    /// `f(args)`
    #[default]
    Regular,
    /// Property read `x.f`
    Getter,
    /// Property write `x.f = v`
    Setter,
}

/// Call of a function, constructor or accessor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Call {
    /// Called declaration
    pub target: DeclId,
    /// Dispatch receiver
    pub receiver: Option<Box<Expr>>,
    /// One slot per parameter of the target; `None` when the argument is omitted
    pub args: Vec<Option<Expr>>,
    /// Emission style
    pub style: CallStyle,
    /// Call site requests constant evaluation
    pub explicit_const: bool,
    /// `?.` call
    pub safe: bool,
}

/// One branch of a multi-branch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch {
    /// Branch test; the else branch tests the literal `true`
    pub condition: Expr,
    /// Branch value
    pub result: Expr,
}

impl Branch {
    /// Create a branch
    pub fn new(condition: Expr, result: Expr) -> Self {
        Self { condition, result }
    }

    /// Create an else branch
    pub fn otherwise(result: Expr) -> Self {
        Self {
            condition: Expr::bool(true),
            result,
        }
    }

    /// Check whether this is the else branch
    pub fn is_else(&self) -> bool {
        matches!(self.condition.kind, ExprKind::Const(Literal::Bool(true)))
    }
}

/// Source multi-branch (`when`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct When {
    /// Subject, read in branch conditions through `ExprKind::Subject`
    pub subject: Option<Box<Expr>>,
    /// Branches in source order
    pub branches: Vec<Branch>,
}

/// Statement list; in value position the last statement is the value
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Block {
    /// Statements in order
    pub statements: Vec<Stmt>,
}

impl Block {
    /// Create a block
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    /// The value expression when the block is used in value position
    pub fn value(&self) -> Option<&Expr> {
        match self.statements.last() {
            Some(Stmt::Expr(e)) => Some(e),
            _ => None,
        }
    }

    /// Check whether the block has no statements
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Expression kinds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    /// Literal
    Const(Literal),
    /// Read of a parameter or local
    GetValue(DeclId),
    /// Write of a local or parameter
    SetValue {
        /// Written declaration
        target: DeclId,
        /// New value
        value: Box<Expr>,
    },
    /// Field read
    GetField {
        /// Object, `None` for static fields or implicit `this`
        receiver: Option<Box<Expr>>,
        /// The field
        field: DeclId,
    },
    /// Field write
    SetField {
        /// Object
        receiver: Option<Box<Expr>>,
        /// The field
        field: DeclId,
        /// New value
        value: Box<Expr>,
    },
    /// Call
    Call(Call),
    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
    /// Logical not
    Not(Box<Expr>),
    /// Non-null assertion (`e!`)
    NotNull(Box<Expr>),
    /// Type test or cast
    TypeOp {
        /// Operator
        op: TypeOperator,
        /// Tested value
        operand: Box<Expr>,
        /// Type operand
        operand_ty: IrType,
    },
    /// Source multi-branch
    When(When),
    /// Subject of the enclosing `When`
    Subject,
    /// Target binary conditional (`c ? a : b`)
    Conditional {
        /// Condition
        cond: Box<Expr>,
        /// Value when true
        then: Box<Expr>,
        /// Value when false
        otherwise: Box<Expr>,
    },
    /// Statement block whose last statement is the value
    Block(Block),
    /// Lambda literal owning a function declaration
    FunctionExpr(DeclId),
    /// Reference to a named function
    FunctionRef(DeclId),
    /// Call of a function value
    Invoke {
        /// Function value
        callee: Box<Expr>,
        /// Arguments
        args: Vec<Expr>,
    },
    /// Return from a function
    Return {
        /// Function returned from
        from: DeclId,
        /// Returned value
        value: Option<Box<Expr>>,
    },
    /// Throw
    Throw(Box<Expr>),
    /// String template
    StringConcat(Vec<Expr>),
    /// Target identity comparison (`identical(a, b)`)
    Identical(Box<Expr>, Box<Expr>),
    /// `this` of a class
    This {
        /// The class
        class: DeclId,
    },
}

impl Expr {
    /// Create an expression with the default origin and an unknown span
    pub fn new(kind: ExprKind, ty: IrType) -> Self {
        Self {
            kind,
            ty,
            origin: ExprOrigin::Source,
            span: Span::default(),
        }
    }

    /// Builder-style origin setter
    pub fn with_origin(mut self, origin: ExprOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Builder-style span setter
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Integer literal
    pub fn int(value: i64) -> Self {
        Self::new(ExprKind::Const(Literal::Int(value)), IrType::int())
    }

    /// Boolean literal
    pub fn bool(value: bool) -> Self {
        Self::new(ExprKind::Const(Literal::Bool(value)), IrType::bool())
    }

    /// String literal
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ExprKind::Const(Literal::String(value.into())), IrType::string())
    }

    /// `null` of the given (nullable) type
    pub fn null(ty: IrType) -> Self {
        let ty = ty.make_nullable();
        Self::new(ExprKind::Const(Literal::Null), ty)
    }

    /// Read of a local or parameter
    pub fn get_value(symbol: DeclId, ty: IrType) -> Self {
        Self::new(ExprKind::GetValue(symbol), ty)
    }

    /// Write of a local or parameter
    pub fn set_value(target: DeclId, value: Expr) -> Self {
        Self::new(
            ExprKind::SetValue {
                target,
                value: Box::new(value),
            },
            IrType::Void,
        )
    }

    /// Call with every argument present
    pub fn call(target: DeclId, args: Vec<Expr>, ty: IrType) -> Self {
        Self::new(
            ExprKind::Call(Call {
                target,
                receiver: None,
                args: args.into_iter().map(Some).collect(),
                style: CallStyle::Regular,
                explicit_const: false,
                safe: false,
            }),
            ty,
        )
    }

    /// Binary operation; predicates are typed `bool`
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, ty: IrType) -> Self {
        debug_assert!(
            !op.is_predicate() || ty.is_builtin_named("bool"),
            "predicate {:?} must be typed bool, got {}",
            op,
            ty
        );
        let origin = if op == BinaryOp::Eq {
            ExprOrigin::EqEq
        } else {
            ExprOrigin::Source
        };
        Self::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
        )
        .with_origin(origin)
    }

    /// `lhs == rhs`
    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Eq, lhs, rhs, IrType::bool())
    }

    /// `!operand`
    pub fn not(operand: Expr) -> Self {
        debug_assert!(operand.ty.is_builtin_named("bool"), "negated operand must be bool");
        Self::new(ExprKind::Not(Box::new(operand)), IrType::bool())
    }

    /// `operand!`
    pub fn not_null(operand: Expr) -> Self {
        let ty = operand.ty.make_not_null();
        let span = operand.span;
        Self::new(ExprKind::NotNull(Box::new(operand)), ty)
            .with_origin(ExprOrigin::ExclExcl)
            .with_span(span)
    }

    /// Type test or cast
    pub fn type_op(op: TypeOperator, operand: Expr, operand_ty: IrType) -> Self {
        let ty = match op {
            TypeOperator::Is | TypeOperator::NotIs => IrType::bool(),
            TypeOperator::Cast => operand_ty.clone(),
            TypeOperator::SafeCast => operand_ty.make_nullable(),
        };
        Self::new(
            ExprKind::TypeOp {
                op,
                operand: Box::new(operand),
                operand_ty,
            },
            ty,
        )
    }

    /// Multi-branch
    pub fn when(subject: Option<Expr>, branches: Vec<Branch>, ty: IrType) -> Self {
        Self::new(
            ExprKind::When(When {
                subject: subject.map(Box::new),
                branches,
            }),
            ty,
        )
        .with_origin(ExprOrigin::When)
    }

    /// Placeholder for the subject of the enclosing multi-branch
    pub fn subject(ty: IrType) -> Self {
        Self::new(ExprKind::Subject, ty)
    }

    /// `cond ? then : otherwise`
    pub fn conditional(cond: Expr, then: Expr, otherwise: Expr, ty: IrType) -> Self {
        debug_assert!(cond.ty.is_builtin_named("bool"), "condition must be bool, got {}", cond.ty);
        Self::new(
            ExprKind::Conditional {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            ty,
        )
    }

    /// Block expression
    pub fn block(statements: Vec<Stmt>, ty: IrType) -> Self {
        Self::new(ExprKind::Block(Block::new(statements)), ty)
    }

    /// Lambda literal
    pub fn function_expr(function: DeclId, ty: IrType) -> Self {
        debug_assert!(matches!(ty, IrType::Function(_)), "lambda must have a function type");
        Self::new(ExprKind::FunctionExpr(function), ty)
    }

    /// Reference to a named function
    pub fn function_ref(function: DeclId, ty: IrType) -> Self {
        debug_assert!(matches!(ty, IrType::Function(_)), "reference must have a function type");
        Self::new(ExprKind::FunctionRef(function), ty)
    }

    /// Call of a function value
    pub fn invoke(callee: Expr, args: Vec<Expr>, ty: IrType) -> Self {
        Self::new(
            ExprKind::Invoke {
                callee: Box::new(callee),
                args,
            },
            ty,
        )
    }

    /// `return value` from `from`
    pub fn ret(from: DeclId, value: Option<Expr>) -> Self {
        Self::new(
            ExprKind::Return {
                from,
                value: value.map(Box::new),
            },
            IrType::Never,
        )
    }

    /// `throw value`
    pub fn throw(value: Expr) -> Self {
        Self::new(ExprKind::Throw(Box::new(value)), IrType::Never)
    }

    /// `identical(a, b)`
    pub fn identical(a: Expr, b: Expr) -> Self {
        Self::new(ExprKind::Identical(Box::new(a), Box::new(b)), IrType::bool())
    }

    /// `this`
    pub fn this(class: DeclId, ty: IrType) -> Self {
        Self::new(ExprKind::This { class }, ty)
    }

    /// Move the node out, leaving a `null` placeholder behind
    pub fn take(&mut self) -> Expr {
        std::mem::replace(self, Expr::null(IrType::Dynamic))
    }

    /// Check whether this is the `null` literal
    pub fn is_null_const(&self) -> bool {
        matches!(self.kind, ExprKind::Const(Literal::Null))
    }

    /// Check whether this is `lhs == null`
    pub fn is_eq_null(&self) -> bool {
        matches!(&self.kind, ExprKind::Binary { op: BinaryOp::Eq, rhs, .. } if rhs.is_null_const())
    }

    /// Symbol read by a `GetValue`
    pub fn as_get_value(&self) -> Option<DeclId> {
        match self.kind {
            ExprKind::GetValue(symbol) => Some(symbol),
            _ => None,
        }
    }

    /// Check whether control never completes normally past this node
    pub fn is_jump(&self) -> bool {
        matches!(self.kind, ExprKind::Return { .. } | ExprKind::Throw(_))
    }

    /// Check whether this is a multi-branch
    pub fn is_when(&self) -> bool {
        matches!(self.kind, ExprKind::When(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_null_detection() {
        let x = Expr::get_value(DeclId::new(0), IrType::int().make_nullable());
        let test = Expr::eq(x.clone(), Expr::null(IrType::int()));
        assert!(test.is_eq_null());
        assert_eq!(test.origin, ExprOrigin::EqEq);
        assert!(!Expr::eq(x, Expr::int(1)).is_eq_null());
    }

    #[test]
    fn test_not_null_narrows_type() {
        let x = Expr::get_value(DeclId::new(0), IrType::string().make_nullable());
        let asserted = Expr::not_null(x);
        assert!(!asserted.ty.is_nullable());
        assert_eq!(asserted.origin, ExprOrigin::ExclExcl);
    }

    #[test]
    fn test_take_leaves_placeholder() {
        let mut e = Expr::int(4);
        let taken = e.take();
        assert_eq!(taken, Expr::int(4));
        assert!(e.is_null_const());
    }

    #[test]
    fn test_else_branch() {
        let branch = Branch::otherwise(Expr::int(0));
        assert!(branch.is_else());
        assert!(!Branch::new(Expr::bool(false), Expr::int(0)).is_else());
    }

    #[test]
    fn test_block_value() {
        let block = Block::new(vec![Stmt::Expr(Expr::int(1)), Stmt::Expr(Expr::int(2))]);
        assert_eq!(block.value(), Some(&Expr::int(2)));
        assert!(Block::default().value().is_none());
    }
}
