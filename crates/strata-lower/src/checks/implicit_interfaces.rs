//! Members of implicit interfaces
//!
//! In the target every class is also an interface. A class listing another class
//! with the implicit-interface relation, directly or through an interface that
//! does, has to override each open function of it; unlike the source, nothing is
//! inherited from an implemented class.
//!
//! Interfaces, abstract classes, platform classes and default-value markers are
//! not checked.

use crate::error::{LowerError, LowerResult};
use rustc_hash::FxHashSet;
use strata_ir::{ClassDecl, DeclId, DeclOrigin, FileId, Modality, Program, SuperRelation};

/// Every open function of an implicit interface a class of `file` leaves
/// unimplemented
pub fn check_implicit_interfaces(program: &Program, file: FileId) -> LowerResult<Vec<LowerError>> {
    let mut errors = Vec::new();
    for id in program.file_decl_tree(file)? {
        let decl = program.resolve(id)?;
        let Some(class) = decl.as_class() else {
            continue;
        };
        if decl.is_interface()
            || decl.modality == Modality::Abstract
            || decl.annotations.builtin
            || decl.origin == DeclOrigin::ComplexParamDefaultValueMarker
        {
            continue;
        }
        let interfaces = implicit_interfaces(program, class);
        if interfaces.is_empty() {
            continue;
        }

        let implemented = implemented_functions(program, id);
        for interface in interfaces {
            let interface_decl = program.resolve(interface)?;
            let Some(members) = interface_decl.as_class().map(|c| &c.members) else {
                continue;
            };
            for &member in members {
                let member_decl = program.resolve(member)?;
                let Some(function) = member_decl.as_function() else {
                    continue;
                };
                if function.is_static || function.accessor.is_some() || member_decl.modality == Modality::Final {
                    continue;
                }
                if !implemented.contains(&member) {
                    errors.push(LowerError::AbstractMemberNotImplemented {
                        file,
                        class: id,
                        class_name: decl.name.clone(),
                        member,
                        member_name: member_decl.name.clone(),
                        interface: interface_decl.name.clone(),
                        span: decl.span,
                    });
                }
            }
        }
    }
    Ok(errors)
}

/// Implicit interfaces of a class, in declaration order
fn implicit_interfaces(program: &Program, class: &ClassDecl) -> Vec<DeclId> {
    let mut found = Vec::new();
    let mut seen = FxHashSet::default();
    collect_implicit(program, class, &mut seen, &mut found);
    found
}

fn collect_implicit(program: &Program, class: &ClassDecl, seen: &mut FxHashSet<DeclId>, found: &mut Vec<DeclId>) {
    for super_type in &class.super_types {
        let Some(target) = super_type.ty.class_symbol() else {
            continue;
        };
        match super_type.relation {
            SuperRelation::ImplicitInterface => {
                if seen.insert(target) {
                    found.push(target);
                }
            }
            SuperRelation::Implements => {
                let interface = program
                    .get(target)
                    .filter(|d| d.is_interface())
                    .and_then(|d| d.as_class());
                if let Some(interface) = interface {
                    if seen.insert(target) {
                        collect_implicit(program, interface, seen, found);
                    }
                }
            }
            SuperRelation::Extends => {}
        }
    }
}

/// Functions the class and its superclasses implement, with everything they
/// transitively override
fn implemented_functions(program: &Program, class: DeclId) -> FxHashSet<DeclId> {
    let mut implemented = FxHashSet::default();
    let mut visited = FxHashSet::default();
    let mut current = Some(class);
    while let Some(id) = current {
        if !visited.insert(id) {
            break;
        }
        let Some(class) = program.get(id).and_then(|d| d.as_class()) else {
            break;
        };
        for &member in &class.members {
            let Some(decl) = program.get(member) else {
                continue;
            };
            if decl.is_function() && decl.modality != Modality::Abstract {
                add_override_closure(program, member, &mut implemented);
            }
        }
        current = class
            .super_types
            .iter()
            .find(|s| s.relation == SuperRelation::Extends)
            .and_then(|s| s.ty.class_symbol());
    }
    implemented
}

fn add_override_closure(program: &Program, function: DeclId, implemented: &mut FxHashSet<DeclId>) {
    let mut stack = vec![function];
    while let Some(current) = stack.pop() {
        if !implemented.insert(current) {
            continue;
        }
        if let Some(f) = program.get(current).and_then(|d| d.as_function()) {
            stack.extend(f.overridden.iter().copied());
        }
    }
}
