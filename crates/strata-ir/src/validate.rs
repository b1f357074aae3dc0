//! Structural validation
//!
//! `check_resolved` verifies the input contract of the lowering pipeline: every
//! referenced symbol is live, ownership links are consistent, and calls agree
//! with their targets. `dangling_symbols` is the cheaper post-lowering check.

use crate::decl::{DeclKind, Parent};
use crate::expr::{Expr, ExprKind};
use crate::program::Program;
use crate::symbol::{DeclId, FileId};
use crate::types::IrType;
use crate::visit::{declaration_references, walk_declaration, walk_expr, Visitor};
use serde::Serialize;
use std::fmt;

/// Kind of a structural violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViolationKind {
    /// A symbol does not resolve to a live declaration
    UnboundReference,
    /// An owned declaration's parent link does not point back at its owner
    BrokenParentLink,
    /// A call's type disagrees with its target
    CallTypeMismatch,
    /// A call has a different number of argument slots than its target has parameters
    ArityMismatch,
}

/// One structural violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// File the violation was found in
    pub file: FileId,
    /// Declaration the violation was found in
    pub symbol: DeclId,
    /// What is wrong
    pub kind: ViolationKind,
    /// Human-readable detail
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}: {}", self.symbol, self.file, self.message)
    }
}

struct CallChecker<'a> {
    program: &'a Program,
    file: FileId,
    symbol: DeclId,
    violations: Vec<Violation>,
}

impl CallChecker<'_> {
    fn report(&mut self, kind: ViolationKind, message: String) {
        self.violations.push(Violation {
            file: self.file,
            symbol: self.symbol,
            kind,
            message,
        });
    }

    fn check_call(&mut self, expr: &Expr) {
        let ExprKind::Call(call) = &expr.kind else {
            return;
        };
        let Some(target) = self.program.get(call.target) else {
            return;
        };
        if call.args.len() != target.params().len() {
            self.report(
                ViolationKind::ArityMismatch,
                format!(
                    "call of '{}' has {} argument slots, target has {} parameters",
                    target.name,
                    call.args.len(),
                    target.params().len()
                ),
            );
        }
        let expected = match &target.kind {
            DeclKind::Function(f) => Some(f.return_type.clone()),
            DeclKind::Constructor(_) => match target.parent {
                Parent::Decl(class) => self
                    .program
                    .get(class)
                    .map(|c| IrType::declared(c.name.clone(), class)),
                _ => None,
            },
            _ => None,
        };
        if let Some(expected) = expected {
            if !types_agree(&expected, &expr.ty) {
                self.report(
                    ViolationKind::CallTypeMismatch,
                    format!(
                        "call of '{}' typed {}, target returns {}",
                        target.name, expr.ty, expected
                    ),
                );
            }
        }
    }
}

/// Types agree when they name the same type; nullability, type arguments and
/// generic positions are not compared
fn types_agree(expected: &IrType, actual: &IrType) -> bool {
    if expected.is_generic() || actual.is_generic() {
        return true;
    }
    match (expected, actual) {
        (_, IrType::Never) => true,
        (IrType::Class(e), IrType::Class(a)) => match (e.class, a.class) {
            (Some(e), Some(a)) => e == a,
            _ => e.name == a.name,
        },
        (IrType::Function(_), IrType::Function(_)) => true,
        (e, a) => e.simple_name() == a.simple_name(),
    }
}

impl Visitor for CallChecker<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        self.check_call(expr);
        walk_expr(self, expr);
    }
}

/// Check that a program satisfies the resolution contract
pub fn check_resolved(program: &Program) -> Vec<Violation> {
    let mut violations = Vec::new();
    for file in program.files() {
        for &top in &file.declarations {
            match program.get(top) {
                None => violations.push(Violation {
                    file: file.id,
                    symbol: top,
                    kind: ViolationKind::UnboundReference,
                    message: format!("top-level symbol {} is unbound", top),
                }),
                Some(decl) if decl.parent != Parent::File(file.id) => violations.push(Violation {
                    file: file.id,
                    symbol: top,
                    kind: ViolationKind::BrokenParentLink,
                    message: format!("'{}' is listed in {} but owned by {:?}", decl.name, file.name, decl.parent),
                }),
                Some(_) => {}
            }
        }

        let Ok(tree) = program.file_decl_tree(file.id) else {
            continue;
        };
        for id in tree {
            let Some(decl) = program.get(id) else {
                continue;
            };

            let mut unbound: Vec<DeclId> = declaration_references(decl)
                .into_iter()
                .filter(|s| !program.is_live(*s))
                .collect();
            unbound.sort();
            for symbol in unbound {
                violations.push(Violation {
                    file: file.id,
                    symbol: id,
                    kind: ViolationKind::UnboundReference,
                    message: format!("'{}' references unbound symbol {}", decl.name, symbol),
                });
            }

            if let Ok(children) = program.owned_children(id) {
                for child in children {
                    match program.get(child) {
                        Some(c) if c.parent != Parent::Decl(id) => violations.push(Violation {
                            file: file.id,
                            symbol: child,
                            kind: ViolationKind::BrokenParentLink,
                            message: format!(
                                "'{}' is owned by '{}' but its parent is {:?}",
                                c.name, decl.name, c.parent
                            ),
                        }),
                        Some(_) => {}
                        None => violations.push(Violation {
                            file: file.id,
                            symbol: id,
                            kind: ViolationKind::UnboundReference,
                            message: format!("'{}' owns unbound symbol {}", decl.name, child),
                        }),
                    }
                }
            }

            let mut checker = CallChecker {
                program,
                file: file.id,
                symbol: id,
                violations: Vec::new(),
            };
            walk_declaration(&mut checker, decl);
            violations.extend(checker.violations);
        }
    }
    violations
}

/// Symbols referenced from a file's declarations that no longer resolve
pub fn dangling_symbols(program: &Program) -> Vec<(FileId, DeclId)> {
    let mut result = Vec::new();
    for file in program.files() {
        for &top in &file.declarations {
            if !program.is_live(top) {
                result.push((file.id, top));
            }
        }
        let Ok(tree) = program.file_decl_tree(file.id) else {
            continue;
        };
        let mut dangling: Vec<DeclId> = tree
            .iter()
            .filter_map(|id| program.get(*id))
            .flat_map(declaration_references)
            .filter(|s| !program.is_live(*s))
            .collect();
        dangling.sort();
        dangling.dedup();
        result.extend(dangling.into_iter().map(|s| (file.id, s)));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Block;
    use crate::program::Container;
    use crate::stmt::Stmt;

    fn program_calling(ty: IrType) -> (Program, DeclId) {
        let mut program = Program::new();
        let file = program.add_file("a.kt", "a");
        let callee = program
            .add_function(Container::File(file), "callee", IrType::int())
            .unwrap();
        let caller = program
            .add_function(Container::File(file), "caller", IrType::Void)
            .unwrap();
        program
            .set_body(caller, Block::new(vec![Stmt::Expr(Expr::call(callee, vec![], ty))]))
            .unwrap();
        (program, callee)
    }

    #[test]
    fn test_valid_program() {
        let (program, _) = program_calling(IrType::int());
        assert!(check_resolved(&program).is_empty());
        assert!(dangling_symbols(&program).is_empty());
    }

    #[test]
    fn test_call_type_mismatch() {
        let (program, _) = program_calling(IrType::string());
        let violations = check_resolved(&program);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::CallTypeMismatch);
    }

    #[test]
    fn test_dangling_after_destroy() {
        let (mut program, callee) = program_calling(IrType::int());
        program.destroy(callee).unwrap();
        let dangling = dangling_symbols(&program);
        assert_eq!(dangling, vec![(FileId::new(0), callee)]);
        assert!(check_resolved(&program)
            .iter()
            .any(|v| v.kind == ViolationKind::UnboundReference));
    }
}
