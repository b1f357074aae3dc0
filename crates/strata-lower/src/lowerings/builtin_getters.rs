//! Platform functions that are getters in the target
//!
//! A zero-parameter function is emitted as a getter when it, or any function it
//! transitively overrides, is annotated `builtin_getter`.

use crate::context::{LoweringContext, Scope};
use crate::error::LowerResult;
use crate::transform::{DeclarationLowering, Transformation};
use rustc_hash::FxHashSet;
use strata_ir::{DeclId, FunctionStyle, Program};
use tracing::trace;

/// Marks getter-style functions
pub struct BuiltinGetterLowering;

impl DeclarationLowering for BuiltinGetterLowering {
    fn name(&self) -> &'static str {
        "builtin-getters"
    }

    fn transform(
        &self,
        ctx: &mut LoweringContext<'_>,
        id: DeclId,
        _scope: &Scope,
    ) -> LowerResult<Transformation<DeclId, DeclId>> {
        let Some(function) = ctx.program.resolve(id)?.as_function() else {
            return Ok(Transformation::NoChange);
        };
        if function.style != FunctionStyle::Regular
            || !function.params.is_empty()
            || function.accessor.is_some()
            || function.is_lambda
            || !overrides_builtin_getter(ctx.program, id)
        {
            return Ok(Transformation::NoChange);
        }
        if let Some(function) = ctx.program.resolve_mut(id)?.as_function_mut() {
            function.style = FunctionStyle::Getter;
        }
        trace!(symbol = %id, "function emitted as getter");
        Ok(Transformation::Replace(id))
    }
}

fn overrides_builtin_getter(program: &Program, id: DeclId) -> bool {
    let mut seen = FxHashSet::default();
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        let Some(decl) = program.get(current) else {
            continue;
        };
        if decl.annotations.builtin_getter {
            return true;
        }
        if let Some(function) = decl.as_function() {
            stack.extend(function.overridden.iter().copied());
        }
    }
    false
}
