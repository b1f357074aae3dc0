//! Origin tags
//!
//! Origins record why a node exists. They are a closed vocabulary: later passes
//! match on them to recognize (and leave alone) what earlier passes produced.

use crate::types::IrType;
use serde::Serialize;
use std::fmt;

/// Why a declaration exists
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum DeclOrigin {
    /// Written by the programmer
    #[default]
    Source,
    /// Class whose instance marks "no argument was passed" for a parameter whose
    /// default value is not a compile-time constant in the target language
    ComplexParamDefaultValueMarker,
    /// Parameter whose type was widened so it can hold a default value marker
    ComplexParam {
        /// The declared type before widening
        original_type: IrType,
    },
    /// Constructor turned into a factory that evaluates complex default values and
    /// forwards to the actual constructor
    FactoryRedirect,
    /// The constructor a factory redirect forwards to
    FactoryRedirectActual,
    /// Parameter of a factory redirect's actual constructor
    FactoryRedirectActualParam,
    /// Top-level function extracted from a lambda literal
    PromotedLambda,
    /// Field storing the value of a property
    PropertyBackingField,
    /// Local holding a multi-branch subject
    SubjectTemporary,
    /// Local function that gives a multi-branch expression its own scope
    WhenWrapper,
    /// Local holding a parameter value re-typed after widening
    ComplexParamValue,
}

impl DeclOrigin {
    /// Check whether the declaration was synthesized by a lowering
    pub fn is_synthesized(&self) -> bool {
        !matches!(self, DeclOrigin::Source)
    }
}

impl fmt::Display for DeclOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeclOrigin::Source => "SOURCE",
            DeclOrigin::ComplexParamDefaultValueMarker => "COMPLEX_PARAM_DEFAULT_VALUE_MARKER",
            DeclOrigin::ComplexParam { .. } => "COMPLEX_PARAM",
            DeclOrigin::FactoryRedirect => "FACTORY_REDIRECT",
            DeclOrigin::FactoryRedirectActual => "FACTORY_REDIRECT_ACTUAL",
            DeclOrigin::FactoryRedirectActualParam => "FACTORY_REDIRECT_ACTUAL_PARAM",
            DeclOrigin::PromotedLambda => "PROMOTED_LAMBDA",
            DeclOrigin::PropertyBackingField => "PROPERTY_BACKING_FIELD",
            DeclOrigin::SubjectTemporary => "SUBJECT_TEMPORARY",
            DeclOrigin::WhenWrapper => "WHEN_WRAPPER",
            DeclOrigin::ComplexParamValue => "COMPLEX_PARAM_VALUE",
        };
        f.write_str(name)
    }
}

/// Why an expression exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ExprOrigin {
    /// Written by the programmer
    #[default]
    Source,
    /// A `when` multi-branch
    When,
    /// A `when` canonicalized in statement position
    WhenStatement,
    /// An `if`/`else` desugared into a multi-branch
    If,
    /// An equality test
    EqEq,
    /// A non-null assertion
    ExclExcl,
    /// The "was the marker passed?" guard of a complex default value
    ComplexDefaultGuard,
    /// Invocation of a `WhenWrapper` local function
    WhenWrapperCall,
}
