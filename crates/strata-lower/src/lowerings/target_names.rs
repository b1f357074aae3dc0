//! Names in the target language
//!
//! The target has no `private` keyword; privacy is a leading underscore. Rules,
//! first match wins:
//!
//! 1. an explicit `target_name` annotation
//! 2. platform declarations keep their name
//! 3. the backing field of property `p` is `_$pBackingField`
//! 4. accessors share the name of their property
//! 5. a private unnamed constructor is `_`, any other private declaration gets a
//!    leading underscore

use crate::context::{LoweringContext, Scope};
use crate::error::LowerResult;
use crate::transform::{DeclarationLowering, Transformation};
use strata_ir::{DeclId, Parent, Program, Visibility};
use tracing::trace;

/// Computes the target name of every member declaration
pub struct TargetNamesLowering;

impl DeclarationLowering for TargetNamesLowering {
    fn name(&self) -> &'static str {
        "target-names"
    }

    fn transform(
        &self,
        ctx: &mut LoweringContext<'_>,
        id: DeclId,
        _scope: &Scope,
    ) -> LowerResult<Transformation<DeclId, DeclId>> {
        let name = target_name(ctx.program, id)?;
        let decl = ctx.program.resolve_mut(id)?;
        if decl.target_name == name {
            return Ok(Transformation::NoChange);
        }
        trace!(symbol = %id, source = %decl.name, target = ?name, "target name assigned");
        decl.target_name = name;
        Ok(Transformation::Replace(id))
    }
}

fn target_name(program: &Program, id: DeclId) -> LowerResult<Option<String>> {
    let decl = program.resolve(id)?;
    if let Some(name) = &decl.annotations.target_name {
        return Ok(Some(name.clone()));
    }
    if decl.annotations.builtin {
        return Ok(None);
    }

    if let Parent::Decl(owner) = decl.parent {
        let owner = program.resolve(owner)?;
        if let Some(property) = owner.as_property() {
            if property.backing_field == Some(id) {
                return Ok(Some(format!("_${}BackingField", owner.name)));
            }
            return Ok(Some(owner.effective_name().to_string()));
        }
    }

    if decl.visibility == Visibility::Private {
        if decl.is_constructor() && decl.name.is_empty() {
            return Ok(Some("_".to_string()));
        }
        return Ok(Some(private_target_name(&decl.name)));
    }
    Ok(None)
}

/// Target name of a private declaration named `name`
pub fn private_target_name(name: &str) -> String {
    if name.starts_with('_') {
        name.to_string()
    } else {
        format!("_{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoweringOptions;
    use strata_ir::{Container, IrType};

    fn lower(program: &mut Program, file: strata_ir::FileId, id: DeclId) -> Transformation<DeclId, DeclId> {
        let options = LoweringOptions::default();
        let mut ctx = LoweringContext::new(program, &options, file);
        let scope = Scope::member(file, id, None);
        TargetNamesLowering.transform(&mut ctx, id, &scope).unwrap()
    }

    #[test]
    fn test_private_names() {
        assert_eq!(private_target_name("count"), "_count");
        assert_eq!(private_target_name("_count"), "_count");

        let mut program = Program::new();
        let file = program.add_file("a.kt", "app");
        let class = program.add_class(Container::File(file), "Box").unwrap();
        let ctor = program.add_constructor(class, "").unwrap();
        program[ctor].visibility = Visibility::Private;

        assert_eq!(lower(&mut program, file, ctor), Transformation::Replace(ctor));
        assert_eq!(program[ctor].effective_name(), "_");
        assert_eq!(lower(&mut program, file, ctor), Transformation::NoChange);
    }

    #[test]
    fn test_property_parts() {
        let mut program = Program::new();
        let file = program.add_file("a.kt", "app");
        let class = program.add_class(Container::File(file), "Box").unwrap();
        let property = program
            .add_property(Container::Class(class), "size", IrType::int(), true)
            .unwrap();
        let parts = program[property].as_property().cloned().unwrap();

        lower(&mut program, file, parts.backing_field.unwrap());
        lower(&mut program, file, parts.getter.unwrap());
        assert_eq!(
            program[parts.backing_field.unwrap()].effective_name(),
            "_$sizeBackingField"
        );
        assert_eq!(program[parts.getter.unwrap()].effective_name(), "size");
    }

    #[test]
    fn test_annotation_wins() {
        let mut program = Program::new();
        let file = program.add_file("a.kt", "app");
        let f = program.add_function(Container::File(file), "f", IrType::Void).unwrap();
        program[f].visibility = Visibility::Private;
        program[f].annotations.target_name = Some("g".to_string());

        lower(&mut program, file, f);
        assert_eq!(program[f].effective_name(), "g");
    }
}
