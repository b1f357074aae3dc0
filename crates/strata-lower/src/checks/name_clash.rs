//! Duplicate target names among siblings
//!
//! Containers are the file's top level and every class. A property stands for
//! itself and its accessors (which share its name) plus its backing field.
//! Constructors only clash with constructors, and platform declarations are
//! never emitted.

use crate::error::{ClashSite, LowerError, LowerResult};
use rustc_hash::FxHashMap;
use strata_ir::{DeclId, FileId, Program};

/// Every set of sibling declarations of `file` sharing a target name
pub fn check_name_clashes(program: &Program, file: FileId) -> LowerResult<Vec<LowerError>> {
    let mut errors = Vec::new();
    check_container(program, file, &program.file(file)?.declarations, &mut errors)?;
    for id in program.file_decl_tree(file)? {
        if let Some(class) = program.resolve(id)?.as_class() {
            check_container(program, file, &class.members, &mut errors)?;
        }
    }
    Ok(errors)
}

fn check_container(
    program: &Program,
    file: FileId,
    members: &[DeclId],
    errors: &mut Vec<LowerError>,
) -> LowerResult<()> {
    let mut named = Vec::new();
    for &member in members {
        let decl = program.resolve(member)?;
        if decl.annotations.builtin || decl.is_accessor() {
            continue;
        }
        named.push(member);
        if let Some(field) = decl.as_property().and_then(|p| p.backing_field) {
            named.push(field);
        }
    }

    let mut groups: Vec<((bool, &str), Vec<DeclId>)> = Vec::new();
    let mut index: FxHashMap<(bool, &str), usize> = FxHashMap::default();
    for id in named {
        let decl = program.resolve(id)?;
        let key = (decl.is_constructor(), decl.effective_name());
        match index.get(&key) {
            Some(&at) => groups[at].1.push(id),
            None => {
                index.insert(key, groups.len());
                groups.push((key, vec![id]));
            }
        }
    }

    for ((_, name), ids) in groups {
        if ids.len() < 2 {
            continue;
        }
        let mut declarations = Vec::with_capacity(ids.len());
        for id in ids {
            let decl = program.resolve(id)?;
            declarations.push(ClashSite {
                symbol: id,
                kind: decl.kind_name(),
                span: decl.span,
            });
        }
        errors.push(LowerError::NameClash {
            file,
            name: name.to_string(),
            declarations,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_ir::{Container, IrType, Visibility};

    #[test]
    fn test_private_and_public_clash_after_renaming() {
        let mut program = Program::new();
        let file = program.add_file("a.kt", "app");
        let private = program.add_function(Container::File(file), "run", IrType::Void).unwrap();
        program[private].visibility = Visibility::Private;
        program[private].target_name = Some("_run".to_string());
        let public = program.add_function(Container::File(file), "_run", IrType::Void).unwrap();

        let errors = check_name_clashes(&program, file).unwrap();
        assert_eq!(errors.len(), 1);
        let LowerError::NameClash { name, declarations, .. } = &errors[0] else {
            panic!("expected a name clash");
        };
        assert_eq!(name, "_run");
        let symbols: Vec<DeclId> = declarations.iter().map(|d| d.symbol).collect();
        assert_eq!(symbols, vec![private, public]);
    }

    #[test]
    fn test_exemptions() {
        let mut program = Program::new();
        let file = program.add_file("a.kt", "app");
        let class = program.add_class(Container::File(file), "Box").unwrap();
        program.add_constructor(class, "size").unwrap();
        let property = program
            .add_property(Container::Class(class), "size", IrType::int(), true)
            .unwrap();
        let field = program[property].as_property().and_then(|p| p.backing_field).unwrap();
        program[field].target_name = Some("_$sizeBackingField".to_string());
        let builtin = program.add_function(Container::Class(class), "size", IrType::int()).unwrap();
        program[builtin].annotations.builtin = true;

        assert!(check_name_clashes(&program, file).unwrap().is_empty());
    }

    #[test]
    fn test_backing_field_takes_part() {
        let mut program = Program::new();
        let file = program.add_file("a.kt", "app");
        let class = program.add_class(Container::File(file), "Box").unwrap();
        let property = program
            .add_property(Container::Class(class), "size", IrType::int(), true)
            .unwrap();
        let field = program[property].as_property().and_then(|p| p.backing_field).unwrap();
        program[field].target_name = Some("_$sizeBackingField".to_string());
        program
            .add_field(Container::Class(class), "_$sizeBackingField", IrType::int(), None)
            .unwrap();

        let errors = check_name_clashes(&program, file).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "L0002");
    }
}
