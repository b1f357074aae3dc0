//! Strata IR
//!
//! The mutable, typed intermediate representation the lowering pipeline works on.
//!
//! # Structure
//!
//! - `Program` - Arena of declarations plus the compilation files that own them
//! - `Declaration` - Classes, functions, constructors, properties, fields, parameters, locals
//! - `Expr` / `Stmt` - Typed expression and statement trees
//! - `DeclId` - Stable symbol of a declaration, independent of where it lives in the tree
//!
//! Declarations are referenced by symbol everywhere (calls, reads, types), so a pass
//! can move, rename or copy a declaration without chasing pointers through the tree.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod build;
pub mod copy;
pub mod decl;
pub mod error;
pub mod expr;
pub mod file;
pub mod origin;
pub mod pretty;
pub mod program;
pub mod stmt;
pub mod symbol;
pub mod types;
pub mod validate;
pub mod visit;

pub use copy::{deep_copy, rebind};
pub use decl::{
    Accessor, AccessorKind, Annotations, ClassDecl, ClassKind, ConstructorDecl, DeclKind,
    Declaration, FieldDecl, FunctionDecl, FunctionStyle, Modality, ParamDecl, Parent,
    PropertyDecl, SuperRelation, SuperType, VariableDecl, Visibility,
};
pub use error::{IrError, IrResult};
pub use expr::{BinaryOp, Block, Branch, Call, CallStyle, Expr, ExprKind, Literal, TypeOperator, When};
pub use file::{ImportDirective, ImportSet, IrFile};
pub use origin::{DeclOrigin, ExprOrigin};
pub use pretty::PrettyPrint;
pub use program::{Container, DeclCode, Program};
pub use stmt::Stmt;
pub use symbol::{DeclId, FileId, Span};
pub use types::{ClassType, FunctionType, IrType};
pub use validate::{Violation, ViolationKind};
pub use visit::{Visitor, VisitorMut};
