//! Resolved types
//!
//! Types are values: two types are equal when they have the same shape. Class
//! types carry the symbol of their declaration when the class is part of the
//! program; platform built-ins (`int`, `String`, ...) have no declaration.

use crate::symbol::DeclId;
use serde::Serialize;
use std::fmt;

/// A resolved type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum IrType {
    /// A class, interface or built-in type
    Class(ClassType),
    /// A function type
    Function(FunctionType),
    /// A type parameter
    TypeParam {
        /// Parameter name
        name: String,
        /// Whether the use site is nullable
        nullable: bool,
    },
    /// The dynamic type
    Dynamic,
    /// No value
    Void,
    /// The bottom type (throw, return)
    Never,
}

/// A class type reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ClassType {
    /// Type name as written in the target language
    pub name: String,
    /// Declaration of the class, `None` for platform built-ins
    pub class: Option<DeclId>,
    /// Type arguments
    pub args: Vec<IrType>,
    /// Whether the type admits null
    pub nullable: bool,
}

/// A function type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionType {
    /// Parameter types
    pub params: Vec<IrType>,
    /// Return type
    pub ret: Box<IrType>,
    /// Whether the type admits null
    pub nullable: bool,
}

impl IrType {
    /// A built-in class type with no declaration in the program
    pub fn builtin(name: impl Into<String>) -> Self {
        IrType::Class(ClassType {
            name: name.into(),
            class: None,
            args: Vec::new(),
            nullable: false,
        })
    }

    /// A class type declared in the program
    pub fn declared(name: impl Into<String>, class: DeclId) -> Self {
        IrType::Class(ClassType {
            name: name.into(),
            class: Some(class),
            args: Vec::new(),
            nullable: false,
        })
    }

    /// `int`
    pub fn int() -> Self {
        Self::builtin("int")
    }

    /// `double`
    pub fn double() -> Self {
        Self::builtin("double")
    }

    /// `bool`
    pub fn bool() -> Self {
        Self::builtin("bool")
    }

    /// `String`
    pub fn string() -> Self {
        Self::builtin("String")
    }

    /// `Object`
    pub fn object() -> Self {
        Self::builtin("Object")
    }

    /// A function type
    pub fn function(params: Vec<IrType>, ret: IrType) -> Self {
        IrType::Function(FunctionType {
            params,
            ret: Box::new(ret),
            nullable: false,
        })
    }

    /// Add type arguments to a class type (no-op for other types)
    pub fn with_args(mut self, type_args: Vec<IrType>) -> Self {
        if let IrType::Class(class) = &mut self {
            class.args = type_args;
        }
        self
    }

    /// Check whether the type admits null
    pub fn is_nullable(&self) -> bool {
        match self {
            IrType::Class(c) => c.nullable,
            IrType::Function(f) => f.nullable,
            IrType::TypeParam { nullable, .. } => *nullable,
            IrType::Dynamic => true,
            IrType::Void | IrType::Never => false,
        }
    }

    /// The same type with null admitted
    pub fn make_nullable(&self) -> Self {
        self.with_nullability(true)
    }

    /// The same type with null excluded
    pub fn make_not_null(&self) -> Self {
        self.with_nullability(false)
    }

    fn with_nullability(&self, value: bool) -> Self {
        let mut ty = self.clone();
        match &mut ty {
            IrType::Class(c) => c.nullable = value,
            IrType::Function(f) => f.nullable = value,
            IrType::TypeParam { nullable, .. } => *nullable = value,
            IrType::Dynamic | IrType::Void | IrType::Never => {}
        }
        ty
    }

    /// Declaration of a class type, if any
    pub fn class_symbol(&self) -> Option<DeclId> {
        match self {
            IrType::Class(c) => c.class,
            _ => None,
        }
    }

    /// Check whether this is a class type provided by the platform
    pub fn is_builtin(&self) -> bool {
        matches!(self, IrType::Class(c) if c.class.is_none())
    }

    /// Check whether this is the built-in type with the given name
    pub fn is_builtin_named(&self, name: &str) -> bool {
        matches!(self, IrType::Class(c) if c.class.is_none() && c.name == name)
    }

    /// Check whether the type mentions a type parameter or `dynamic`
    pub fn is_generic(&self) -> bool {
        match self {
            IrType::Class(c) => c.args.iter().any(IrType::is_generic),
            IrType::Function(f) => f.params.iter().any(IrType::is_generic) || f.ret.is_generic(),
            IrType::TypeParam { .. } | IrType::Dynamic => true,
            IrType::Void | IrType::Never => false,
        }
    }

    /// Simple name of the type (without arguments or nullability)
    pub fn simple_name(&self) -> String {
        match self {
            IrType::Class(c) => c.name.clone(),
            IrType::Function(_) => "Function".to_string(),
            IrType::TypeParam { name, .. } => name.clone(),
            IrType::Dynamic => "dynamic".to_string(),
            IrType::Void => "void".to_string(),
            IrType::Never => "Never".to_string(),
        }
    }

    /// Visit every class symbol mentioned by this type, including type arguments
    pub fn for_each_class_symbol(&self, f: &mut impl FnMut(DeclId)) {
        match self {
            IrType::Class(c) => {
                if let Some(id) = c.class {
                    f(id);
                }
                for arg in &c.args {
                    arg.for_each_class_symbol(f);
                }
            }
            IrType::Function(func) => {
                for param in &func.params {
                    param.for_each_class_symbol(f);
                }
                func.ret.for_each_class_symbol(f);
            }
            IrType::TypeParam { .. } | IrType::Dynamic | IrType::Void | IrType::Never => {}
        }
    }

    /// Rewrite every class symbol mentioned by this type
    pub fn remap_class_symbols(&mut self, f: &mut impl FnMut(DeclId) -> DeclId) {
        match self {
            IrType::Class(c) => {
                if let Some(id) = c.class {
                    c.class = Some(f(id));
                }
                for arg in &mut c.args {
                    arg.remap_class_symbols(f);
                }
            }
            IrType::Function(func) => {
                for param in &mut func.params {
                    param.remap_class_symbols(f);
                }
                func.ret.remap_class_symbols(f);
            }
            IrType::TypeParam { .. } | IrType::Dynamic | IrType::Void | IrType::Never => {}
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Class(c) => {
                write!(f, "{}", c.name)?;
                if !c.args.is_empty() {
                    let args: Vec<String> = c.args.iter().map(|a| a.to_string()).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                if c.nullable {
                    write!(f, "?")?;
                }
                Ok(())
            }
            IrType::Function(func) => {
                let params: Vec<String> = func.params.iter().map(|p| p.to_string()).collect();
                if func.nullable {
                    write!(f, "({} Function({}))?", func.ret, params.join(", "))
                } else {
                    write!(f, "{} Function({})", func.ret, params.join(", "))
                }
            }
            IrType::TypeParam { name, nullable } => {
                write!(f, "{}{}", name, if *nullable { "?" } else { "" })
            }
            IrType::Dynamic => write!(f, "dynamic"),
            IrType::Void => write!(f, "void"),
            IrType::Never => write!(f, "Never"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullability_round_trip() {
        let ty = IrType::string();
        assert!(!ty.is_nullable());
        let nullable = ty.make_nullable();
        assert!(nullable.is_nullable());
        assert_eq!(nullable.to_string(), "String?");
        assert_eq!(nullable.make_not_null(), ty);
    }

    #[test]
    fn test_builtin_vs_declared() {
        assert!(IrType::int().is_builtin());
        assert!(IrType::int().is_builtin_named("int"));
        let declared = IrType::declared("Vector", DeclId::new(3));
        assert!(!declared.is_builtin());
        assert_eq!(declared.class_symbol(), Some(DeclId::new(3)));
    }

    #[test]
    fn test_display_function_and_generic() {
        let list = IrType::builtin("List").with_args(vec![IrType::int()]);
        assert_eq!(list.to_string(), "List<int>");
        let func = IrType::function(vec![IrType::int()], IrType::bool());
        assert_eq!(func.to_string(), "bool Function(int)");
        assert!(!func.is_generic());
        assert!(IrType::Dynamic.is_generic());
    }

    #[test]
    fn test_class_symbol_visit_and_remap() {
        let mut ty = IrType::builtin("List").with_args(vec![IrType::declared("A", DeclId::new(1))]);
        let mut seen = Vec::new();
        ty.for_each_class_symbol(&mut |id| seen.push(id));
        assert_eq!(seen, vec![DeclId::new(1)]);

        ty.remap_class_symbols(&mut |id| DeclId::new(id.as_u32() + 10));
        let mut seen = Vec::new();
        ty.for_each_class_symbol(&mut |id| seen.push(id));
        assert_eq!(seen, vec![DeclId::new(11)]);
    }
}
