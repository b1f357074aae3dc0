//! IR visitors
//!
//! `Visitor` walks expression trees by reference, `VisitorMut` by mutable
//! reference. Override a `visit_*` method to intercept a node and call the
//! matching `walk_*` function to continue into its children.
//!
//! Visitors do not follow symbols: a lambda's body or a local's initializer lives
//! on its own declaration and is walked with `walk_declaration_code`.

use crate::decl::{DeclKind, Declaration};
use crate::expr::{Block, Expr, ExprKind};
use crate::stmt::Stmt;
use crate::symbol::DeclId;
use crate::types::IrType;
use rustc_hash::FxHashSet;

/// Read-only IR visitor
pub trait Visitor: Sized {
    /// Visit an expression
    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    /// Visit a statement
    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    /// Visit a block
    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    /// Visit a symbol reference
    fn visit_symbol(&mut self, _symbol: DeclId) {}

    /// Visit a type
    fn visit_type(&mut self, _ty: &IrType) {}
}

/// Walk the children of an expression
pub fn walk_expr<V: Visitor>(visitor: &mut V, expr: &Expr) {
    visitor.visit_type(&expr.ty);
    match &expr.kind {
        ExprKind::Const(_) | ExprKind::Subject => {}
        ExprKind::GetValue(symbol) | ExprKind::FunctionExpr(symbol) | ExprKind::FunctionRef(symbol) => {
            visitor.visit_symbol(*symbol);
        }
        ExprKind::SetValue { target, value } => {
            visitor.visit_symbol(*target);
            visitor.visit_expr(value);
        }
        ExprKind::GetField { receiver, field } => {
            if let Some(receiver) = receiver {
                visitor.visit_expr(receiver);
            }
            visitor.visit_symbol(*field);
        }
        ExprKind::SetField {
            receiver,
            field,
            value,
        } => {
            if let Some(receiver) = receiver {
                visitor.visit_expr(receiver);
            }
            visitor.visit_symbol(*field);
            visitor.visit_expr(value);
        }
        ExprKind::Call(call) => {
            visitor.visit_symbol(call.target);
            if let Some(receiver) = &call.receiver {
                visitor.visit_expr(receiver);
            }
            for arg in call.args.iter().flatten() {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::Binary { lhs, rhs, .. } | ExprKind::Identical(lhs, rhs) => {
            visitor.visit_expr(lhs);
            visitor.visit_expr(rhs);
        }
        ExprKind::Not(operand) | ExprKind::NotNull(operand) | ExprKind::Throw(operand) => {
            visitor.visit_expr(operand);
        }
        ExprKind::TypeOp {
            operand, operand_ty, ..
        } => {
            visitor.visit_expr(operand);
            visitor.visit_type(operand_ty);
        }
        ExprKind::When(when) => {
            if let Some(subject) = &when.subject {
                visitor.visit_expr(subject);
            }
            for branch in &when.branches {
                visitor.visit_expr(&branch.condition);
                visitor.visit_expr(&branch.result);
            }
        }
        ExprKind::Conditional {
            cond,
            then,
            otherwise,
        } => {
            visitor.visit_expr(cond);
            visitor.visit_expr(then);
            visitor.visit_expr(otherwise);
        }
        ExprKind::Block(block) => visitor.visit_block(block),
        ExprKind::Invoke { callee, args } => {
            visitor.visit_expr(callee);
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::Return { from, value } => {
            visitor.visit_symbol(*from);
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        ExprKind::StringConcat(parts) => {
            for part in parts {
                visitor.visit_expr(part);
            }
        }
        ExprKind::This { class } => visitor.visit_symbol(*class),
    }
}

/// Walk the children of a statement
pub fn walk_stmt<V: Visitor>(visitor: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Expr(expr) => visitor.visit_expr(expr),
        Stmt::Decl(symbol) => visitor.visit_symbol(*symbol),
        Stmt::If {
            cond,
            then,
            otherwise,
        } => {
            visitor.visit_expr(cond);
            visitor.visit_block(then);
            if let Some(otherwise) = otherwise {
                visitor.visit_block(otherwise);
            }
        }
        Stmt::While { cond, body, .. } => {
            visitor.visit_expr(cond);
            visitor.visit_block(body);
        }
        Stmt::Block(block) => visitor.visit_block(block),
        Stmt::Break(_) | Stmt::Continue(_) => {}
    }
}

/// Walk the statements of a block
pub fn walk_block<V: Visitor>(visitor: &mut V, block: &Block) {
    for stmt in &block.statements {
        visitor.visit_stmt(stmt);
    }
}

/// Walk the code a declaration holds directly: body, initializer, default value
/// and constructor delegation
pub fn walk_declaration_code<V: Visitor>(visitor: &mut V, decl: &Declaration) {
    match &decl.kind {
        DeclKind::Function(f) => {
            if let Some(body) = &f.body {
                visitor.visit_block(body);
            }
        }
        DeclKind::Constructor(c) => {
            if let Some(delegation) = &c.delegation {
                visitor.visit_expr(delegation);
            }
            if let Some(body) = &c.body {
                visitor.visit_block(body);
            }
        }
        DeclKind::Field(f) => {
            if let Some(init) = &f.initializer {
                visitor.visit_expr(init);
            }
        }
        DeclKind::ValueParameter(p) => {
            if let Some(default) = &p.default_value {
                visitor.visit_expr(default);
            }
        }
        DeclKind::Variable(v) => {
            if let Some(init) = &v.initializer {
                visitor.visit_expr(init);
            }
        }
        DeclKind::Class(_) | DeclKind::Property(_) => {}
    }
}

/// Walk the types and symbols a declaration mentions in its signature, then its code
pub fn walk_declaration<V: Visitor>(visitor: &mut V, decl: &Declaration) {
    match &decl.kind {
        DeclKind::Class(c) => {
            for super_type in &c.super_types {
                visitor.visit_type(&super_type.ty);
            }
        }
        DeclKind::Function(f) => {
            visitor.visit_type(&f.return_type);
            for overridden in &f.overridden {
                visitor.visit_symbol(*overridden);
            }
        }
        DeclKind::Property(p) => visitor.visit_type(&p.ty),
        DeclKind::Field(f) => visitor.visit_type(&f.ty),
        DeclKind::ValueParameter(p) => visitor.visit_type(&p.ty),
        DeclKind::Variable(v) => visitor.visit_type(&v.ty),
        DeclKind::Constructor(_) => {}
    }
    walk_declaration_code(visitor, decl);
}

/// Mutating IR visitor
pub trait VisitorMut: Sized {
    /// Visit an expression
    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }

    /// Visit a statement
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt);
    }

    /// Visit a block
    fn visit_block(&mut self, block: &mut Block) {
        walk_block_mut(self, block);
    }

    /// Visit a symbol reference
    fn visit_symbol(&mut self, _symbol: &mut DeclId) {}

    /// Visit a type
    fn visit_type(&mut self, _ty: &mut IrType) {}
}

/// Walk the children of an expression
pub fn walk_expr_mut<V: VisitorMut>(visitor: &mut V, expr: &mut Expr) {
    visitor.visit_type(&mut expr.ty);
    match &mut expr.kind {
        ExprKind::Const(_) | ExprKind::Subject => {}
        ExprKind::GetValue(symbol) | ExprKind::FunctionExpr(symbol) | ExprKind::FunctionRef(symbol) => {
            visitor.visit_symbol(symbol);
        }
        ExprKind::SetValue { target, value } => {
            visitor.visit_symbol(target);
            visitor.visit_expr(value);
        }
        ExprKind::GetField { receiver, field } => {
            if let Some(receiver) = receiver {
                visitor.visit_expr(receiver);
            }
            visitor.visit_symbol(field);
        }
        ExprKind::SetField {
            receiver,
            field,
            value,
        } => {
            if let Some(receiver) = receiver {
                visitor.visit_expr(receiver);
            }
            visitor.visit_symbol(field);
            visitor.visit_expr(value);
        }
        ExprKind::Call(call) => {
            visitor.visit_symbol(&mut call.target);
            if let Some(receiver) = &mut call.receiver {
                visitor.visit_expr(receiver);
            }
            for arg in call.args.iter_mut().flatten() {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::Binary { lhs, rhs, .. } | ExprKind::Identical(lhs, rhs) => {
            visitor.visit_expr(lhs);
            visitor.visit_expr(rhs);
        }
        ExprKind::Not(operand) | ExprKind::NotNull(operand) | ExprKind::Throw(operand) => {
            visitor.visit_expr(operand);
        }
        ExprKind::TypeOp {
            operand, operand_ty, ..
        } => {
            visitor.visit_expr(operand);
            visitor.visit_type(operand_ty);
        }
        ExprKind::When(when) => {
            if let Some(subject) = &mut when.subject {
                visitor.visit_expr(subject);
            }
            for branch in &mut when.branches {
                visitor.visit_expr(&mut branch.condition);
                visitor.visit_expr(&mut branch.result);
            }
        }
        ExprKind::Conditional {
            cond,
            then,
            otherwise,
        } => {
            visitor.visit_expr(cond);
            visitor.visit_expr(then);
            visitor.visit_expr(otherwise);
        }
        ExprKind::Block(block) => visitor.visit_block(block),
        ExprKind::Invoke { callee, args } => {
            visitor.visit_expr(callee);
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::Return { from, value } => {
            visitor.visit_symbol(from);
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        ExprKind::StringConcat(parts) => {
            for part in parts {
                visitor.visit_expr(part);
            }
        }
        ExprKind::This { class } => visitor.visit_symbol(class),
    }
}

/// Walk the children of a statement
pub fn walk_stmt_mut<V: VisitorMut>(visitor: &mut V, stmt: &mut Stmt) {
    match stmt {
        Stmt::Expr(expr) => visitor.visit_expr(expr),
        Stmt::Decl(symbol) => visitor.visit_symbol(symbol),
        Stmt::If {
            cond,
            then,
            otherwise,
        } => {
            visitor.visit_expr(cond);
            visitor.visit_block(then);
            if let Some(otherwise) = otherwise {
                visitor.visit_block(otherwise);
            }
        }
        Stmt::While { cond, body, .. } => {
            visitor.visit_expr(cond);
            visitor.visit_block(body);
        }
        Stmt::Block(block) => visitor.visit_block(block),
        Stmt::Break(_) | Stmt::Continue(_) => {}
    }
}

/// Walk the statements of a block
pub fn walk_block_mut<V: VisitorMut>(visitor: &mut V, block: &mut Block) {
    for stmt in &mut block.statements {
        visitor.visit_stmt(stmt);
    }
}

/// Walk the code a declaration holds directly
pub fn walk_declaration_code_mut<V: VisitorMut>(visitor: &mut V, decl: &mut Declaration) {
    match &mut decl.kind {
        DeclKind::Function(f) => {
            if let Some(body) = &mut f.body {
                visitor.visit_block(body);
            }
        }
        DeclKind::Constructor(c) => {
            if let Some(delegation) = &mut c.delegation {
                visitor.visit_expr(delegation);
            }
            if let Some(body) = &mut c.body {
                visitor.visit_block(body);
            }
        }
        DeclKind::Field(f) => {
            if let Some(init) = &mut f.initializer {
                visitor.visit_expr(init);
            }
        }
        DeclKind::ValueParameter(p) => {
            if let Some(default) = &mut p.default_value {
                visitor.visit_expr(default);
            }
        }
        DeclKind::Variable(v) => {
            if let Some(init) = &mut v.initializer {
                visitor.visit_expr(init);
            }
        }
        DeclKind::Class(_) | DeclKind::Property(_) => {}
    }
}

/// Walk the signature types and code of a declaration
pub fn walk_declaration_mut<V: VisitorMut>(visitor: &mut V, decl: &mut Declaration) {
    match &mut decl.kind {
        DeclKind::Class(c) => {
            for super_type in &mut c.super_types {
                visitor.visit_type(&mut super_type.ty);
            }
        }
        DeclKind::Function(f) => visitor.visit_type(&mut f.return_type),
        DeclKind::Property(p) => visitor.visit_type(&mut p.ty),
        DeclKind::Field(f) => visitor.visit_type(&mut f.ty),
        DeclKind::ValueParameter(p) => visitor.visit_type(&mut p.ty),
        DeclKind::Variable(v) => visitor.visit_type(&mut v.ty),
        DeclKind::Constructor(_) => {}
    }
    walk_declaration_code_mut(visitor, decl);
}

struct ReferenceCollector {
    symbols: FxHashSet<DeclId>,
}

impl Visitor for ReferenceCollector {
    fn visit_symbol(&mut self, symbol: DeclId) {
        self.symbols.insert(symbol);
    }

    fn visit_type(&mut self, ty: &IrType) {
        ty.for_each_class_symbol(&mut |id| {
            self.symbols.insert(id);
        });
    }
}

/// Every symbol an expression tree mentions, including class symbols of types
pub fn references_of(expr: &Expr) -> FxHashSet<DeclId> {
    let mut collector = ReferenceCollector {
        symbols: FxHashSet::default(),
    };
    collector.visit_expr(expr);
    collector.symbols
}

/// Every symbol a declaration's signature and code mention
pub fn declaration_references(decl: &Declaration) -> FxHashSet<DeclId> {
    let mut collector = ReferenceCollector {
        symbols: FxHashSet::default(),
    };
    walk_declaration(&mut collector, decl);
    collector.symbols
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Branch;

    #[test]
    fn test_references_of_collects_symbols_and_types() {
        let a = DeclId::new(1);
        let b = DeclId::new(2);
        let class = DeclId::new(3);
        let expr = Expr::call(
            a,
            vec![Expr::get_value(b, IrType::declared("Box", class))],
            IrType::int(),
        );
        let refs = references_of(&expr);
        assert!(refs.contains(&a));
        assert!(refs.contains(&b));
        assert!(refs.contains(&class));
        assert_eq!(refs.len(), 3);
    }

    struct CountWhens(usize);

    impl Visitor for CountWhens {
        fn visit_expr(&mut self, expr: &Expr) {
            if expr.is_when() {
                self.0 += 1;
            }
            walk_expr(self, expr);
        }
    }

    #[test]
    fn test_walk_reaches_nested_branches() {
        let inner = Expr::when(None, vec![Branch::otherwise(Expr::int(1))], IrType::int());
        let outer = Expr::when(
            None,
            vec![Branch::new(Expr::bool(false), inner), Branch::otherwise(Expr::int(2))],
            IrType::int(),
        );
        let mut counter = CountWhens(0);
        counter.visit_expr(&outer);
        assert_eq!(counter.0, 2);
    }

    struct Renumber;

    impl VisitorMut for Renumber {
        fn visit_symbol(&mut self, symbol: &mut DeclId) {
            *symbol = DeclId::new(symbol.as_u32() + 100);
        }
    }

    #[test]
    fn test_visitor_mut_rewrites_symbols() {
        let mut stmt = Stmt::Expr(Expr::set_value(DeclId::new(1), Expr::get_value(DeclId::new(2), IrType::int())));
        Renumber.visit_stmt(&mut stmt);
        match stmt {
            Stmt::Expr(Expr {
                kind: ExprKind::SetValue { target, value },
                ..
            }) => {
                assert_eq!(target, DeclId::new(101));
                assert_eq!(value.as_get_value(), Some(DeclId::new(102)));
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }
}
