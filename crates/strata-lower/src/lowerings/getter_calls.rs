//! Property syntax for calls of getters and setters
//!
//! `x.length()` of a function emitted as a getter must be written `x.length`,
//! and a setter call `x.setSize(v)` becomes `x.size = v`.

use crate::context::{LoweringContext, Scope};
use crate::error::LowerResult;
use crate::transform::{ExpressionLowering, Transformation};
use strata_ir::{AccessorKind, CallStyle, Declaration, Expr, ExprKind, FunctionStyle};

/// Sets the call style of calls to getters and setters
pub struct GetterCallsLowering;

impl ExpressionLowering for GetterCallsLowering {
    fn name(&self) -> &'static str {
        "getter-calls"
    }

    fn transform(
        &self,
        ctx: &mut LoweringContext<'_>,
        expr: &mut Expr,
        _scope: &Scope,
    ) -> LowerResult<Transformation<Expr>> {
        let ExprKind::Call(call) = &mut expr.kind else {
            return Ok(Transformation::NoChange);
        };
        let Some(style) = ctx.program.get(call.target).and_then(call_style) else {
            return Ok(Transformation::NoChange);
        };
        if call.style == style {
            return Ok(Transformation::NoChange);
        }
        call.style = style;
        Ok(Transformation::Replace(expr.take()))
    }
}

fn call_style(target: &Declaration) -> Option<CallStyle> {
    let function = target.as_function()?;
    match (function.style, function.accessor.map(|a| a.kind)) {
        (FunctionStyle::Getter, _) | (_, Some(AccessorKind::Getter)) => Some(CallStyle::Getter),
        (FunctionStyle::Setter, _) | (_, Some(AccessorKind::Setter)) => Some(CallStyle::Setter),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoweringOptions;
    use strata_ir::{Container, IrType, Program};

    #[test]
    fn test_getter_calls() {
        let mut program = Program::new();
        let file = program.add_file("a.kt", "app");
        let length = program.add_function(Container::File(file), "length", IrType::int()).unwrap();
        program[length].as_function_mut().unwrap().style = FunctionStyle::Getter;
        let plain = program.add_function(Container::File(file), "plain", IrType::int()).unwrap();

        let options = LoweringOptions::default();
        let mut ctx = LoweringContext::new(&mut program, &options, file);
        let scope = Scope::member(file, plain, None).value();

        let mut call = Expr::call(length, vec![], IrType::int());
        let Transformation::Replace(lowered) = GetterCallsLowering.transform(&mut ctx, &mut call, &scope).unwrap()
        else {
            panic!("expected a replacement");
        };
        assert!(matches!(&lowered.kind, ExprKind::Call(c) if c.style == CallStyle::Getter));

        let mut again = lowered;
        assert_eq!(
            GetterCallsLowering.transform(&mut ctx, &mut again, &scope).unwrap(),
            Transformation::NoChange
        );
        let mut other = Expr::call(plain, vec![], IrType::int());
        assert_eq!(
            GetterCallsLowering.transform(&mut ctx, &mut other, &scope).unwrap(),
            Transformation::NoChange
        );
    }

    #[test]
    fn test_property_accessor_calls() {
        let mut program = Program::new();
        let file = program.add_file("a.kt", "app");
        let class = program.add_class(Container::File(file), "Box").unwrap();
        let property = program
            .add_property(Container::Class(class), "size", IrType::int(), false)
            .unwrap();
        let getter = program[property].as_property().and_then(|p| p.getter).unwrap();
        assert_eq!(call_style(&program[getter]), Some(CallStyle::Getter));
    }
}
