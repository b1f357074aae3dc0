//! The lowering passes
//!
//! | pass                       | kind        | what it does                                          |
//! |----------------------------|-------------|-------------------------------------------------------|
//! | `imports`                  | file        | import directives for clashing core-library names     |
//! | `complex-param-defaults`   | declaration | non-constant default values via marker instances      |
//! | `target-names`             | declaration | names in the target language                          |
//! | `builtin-getters`          | declaration | zero-argument platform functions become getters       |
//! | `when-subject-statements`  | statement   | subject moved into a temporary                        |
//! | `when-statements`          | statement   | multi-branch statements become `if`/`else` chains     |
//! | `when-subject-non-null`    | expression  | non-null assertions after a `null` branch             |
//! | `when-subject-expressions` | expression  | subject scoped in an invoked local function           |
//! | `when-expressions`         | expression  | multi-branch values become nested conditionals        |
//! | `const-lambda-literals`    | expression  | lambdas in constant constructor calls become functions |
//! | `getter-calls`             | expression  | calls of getters and setters use property syntax      |

mod builtin_getters;
mod complex_defaults;
mod const_lambdas;
mod getter_calls;
mod imports;
mod target_names;
mod whens;

pub use builtin_getters::BuiltinGetterLowering;
pub use complex_defaults::{is_constant_expression, ComplexParamDefaultsLowering};
pub use const_lambdas::{promoted_function_name, ConstLambdaLiteralsLowering};
pub use getter_calls::GetterCallsLowering;
pub use imports::{collect_imports, ImportsLowering};
pub use target_names::{private_target_name, TargetNamesLowering};
pub use whens::{
    WhenExpressionsLowering, WhenStatementsLowering, WhenSubjectExpressionsLowering, WhenSubjectNonNullLowering,
    WhenSubjectStatementsLowering,
};
