//! Declarations
//!
//! A declaration is a named thing with target-visible identity. Every declaration
//! lives in the `Program` arena under its `DeclId`; the tree structure is expressed
//! through `Parent` links and the member/parameter lists of the owners.

use crate::expr::{Block, Expr};
use crate::origin::DeclOrigin;
use crate::symbol::{DeclId, FileId, Span};
use crate::types::IrType;
use serde::Serialize;

/// Owner of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Parent {
    /// Top-level declaration of a file
    File(FileId),
    /// Member, parameter, accessor or local of another declaration
    Decl(DeclId),
    /// Not attached (freshly allocated, or being relocated)
    Detached,
}

/// Declaration visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Visibility {
    /// Visible everywhere
    #[default]
    Public,
    /// Visible to subclasses
    Protected,
    /// Visible within the module
    Internal,
    /// Visible within the enclosing file or class
    Private,
    /// Function-local
    Local,
}

/// Declaration modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Modality {
    /// Cannot be overridden
    #[default]
    Final,
    /// Can be overridden
    Open,
    /// Must be overridden
    Abstract,
}

/// Typed annotation set of a declaration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Annotations {
    /// Explicit name in the target language
    pub target_name: Option<String>,
    /// Constructor may be invoked as a compile-time constant in the target language
    pub target_const: bool,
    /// Provided by the target platform, never emitted
    pub builtin: bool,
    /// Function is a getter in the target language
    pub builtin_getter: bool,
    /// Library the declaration must be alias-imported from, hiding its plain name
    pub import_alias: Option<String>,
    /// Library the declaration's name must be hidden from
    pub hide_import: Option<String>,
}

impl Annotations {
    /// Alias prefix for an `import_alias` library: the text after the scheme
    /// (`dart:core` gives `core`), or the last segment of a dotted package
    pub fn import_prefix(library: &str) -> &str {
        match library.rsplit_once(':') {
            Some((_, rest)) => rest,
            None => library.rsplit('.').next().unwrap_or(library),
        }
    }
}

/// A declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    /// Stable symbol
    pub id: DeclId,
    /// Source name (empty for unnamed constructors)
    pub name: String,
    /// Name in the target language, once computed
    pub target_name: Option<String>,
    /// Owner
    pub parent: Parent,
    /// Visibility
    pub visibility: Visibility,
    /// Modality
    pub modality: Modality,
    /// Why the declaration exists
    pub origin: DeclOrigin,
    /// Annotations
    pub annotations: Annotations,
    /// Source position
    pub span: Span,
    /// Kind-specific data
    pub kind: DeclKind,
}

/// Kind-specific declaration data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DeclKind {
    /// Class, interface or object
    Class(ClassDecl),
    /// Function, method, accessor or lambda
    Function(FunctionDecl),
    /// Constructor
    Constructor(ConstructorDecl),
    /// Property (owns its accessors and backing field)
    Property(PropertyDecl),
    /// Field
    Field(FieldDecl),
    /// Value parameter of a function or constructor
    ValueParameter(ParamDecl),
    /// Local variable
    Variable(VariableDecl),
}

/// Kind of a class declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClassKind {
    /// Regular class
    Class,
    /// Interface
    Interface,
    /// Singleton object
    Object,
}

/// How a class relates to one of its super types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SuperRelation {
    /// Superclass
    Extends,
    /// Implemented interface
    Implements,
    /// A class used as an interface (target languages where every class is one)
    ImplicitInterface,
}

/// Super type entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuperType {
    /// The super type
    pub ty: IrType,
    /// Relation to the subclass
    pub relation: SuperRelation,
}

/// Class data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDecl {
    /// Class, interface or object
    pub kind: ClassKind,
    /// Super types in declaration order
    pub super_types: Vec<SuperType>,
    /// Owned members
    pub members: Vec<DeclId>,
}

/// Style a function is emitted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FunctionStyle {
    /// Regular method or function
    #[default]
    Regular,
    /// Target getter (`get name`)
    Getter,
    /// Target setter (`set name`)
    Setter,
}

/// Which accessor of a property a function is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessorKind {
    /// `get`
    Getter,
    /// `set`
    Setter,
}

/// Back-link from an accessor to its property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Accessor {
    /// The property
    pub property: DeclId,
    /// Getter or setter
    pub kind: AccessorKind,
}

/// Function data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    /// Value parameters in order
    pub params: Vec<DeclId>,
    /// Return type
    pub return_type: IrType,
    /// Body, `None` for abstract and external functions
    pub body: Option<Block>,
    /// Static member
    pub is_static: bool,
    /// Operator function
    pub is_operator: bool,
    /// Declared by a lambda literal
    pub is_lambda: bool,
    /// Target emission style
    pub style: FunctionStyle,
    /// Property this function is an accessor of
    pub accessor: Option<Accessor>,
    /// Functions this one overrides
    pub overridden: Vec<DeclId>,
}

/// Constructor data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructorDecl {
    /// Value parameters in order
    pub params: Vec<DeclId>,
    /// Body
    pub body: Option<Block>,
    /// Primary constructor
    pub is_primary: bool,
    /// Const constructor
    pub is_const: bool,
    /// Factory constructor
    pub is_factory: bool,
    /// Delegating or super constructor call, evaluated before the body
    pub delegation: Option<Box<Expr>>,
}

/// Property data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDecl {
    /// Property type
    pub ty: IrType,
    /// Getter function
    pub getter: Option<DeclId>,
    /// Setter function
    pub setter: Option<DeclId>,
    /// Field storing the value
    pub backing_field: Option<DeclId>,
}

/// Field data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDecl {
    /// Field type
    pub ty: IrType,
    /// Initializer
    pub initializer: Option<Expr>,
    /// Static field
    pub is_static: bool,
    /// Assigned once
    pub is_final: bool,
    /// Compile-time constant
    pub is_const: bool,
}

/// Value parameter data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamDecl {
    /// Parameter type
    pub ty: IrType,
    /// Default value
    pub default_value: Option<Expr>,
    /// Position in the parameter list
    pub index: usize,
    /// Field or property this parameter initializes directly (`this.x`)
    pub initializes: Option<DeclId>,
}

/// Local variable data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDecl {
    /// Variable type
    pub ty: IrType,
    /// Initializer
    pub initializer: Option<Expr>,
    /// `var` rather than `val`
    pub is_mutable: bool,
}

impl Declaration {
    /// Create a detached declaration with default attributes
    pub fn new(name: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            id: DeclId::UNALLOCATED,
            name: name.into(),
            target_name: None,
            parent: Parent::Detached,
            visibility: Visibility::Public,
            modality: Modality::Final,
            origin: DeclOrigin::Source,
            annotations: Annotations::default(),
            span: Span::default(),
            kind,
        }
    }

    /// Builder-style visibility setter
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Builder-style modality setter
    pub fn with_modality(mut self, modality: Modality) -> Self {
        self.modality = modality;
        self
    }

    /// Builder-style origin setter
    pub fn with_origin(mut self, origin: DeclOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Builder-style span setter
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Builder-style annotations setter
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    /// Name used in the target language: the computed target name when present,
    /// else the explicit annotation, else the source name
    pub fn effective_name(&self) -> &str {
        self.target_name
            .as_deref()
            .or(self.annotations.target_name.as_deref())
            .unwrap_or(&self.name)
    }

    /// Short description of the kind, used in errors
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            DeclKind::Class(c) => match c.kind {
                ClassKind::Class => "class",
                ClassKind::Interface => "interface",
                ClassKind::Object => "object",
            },
            DeclKind::Function(_) => "function",
            DeclKind::Constructor(_) => "constructor",
            DeclKind::Property(_) => "property",
            DeclKind::Field(_) => "field",
            DeclKind::ValueParameter(_) => "parameter",
            DeclKind::Variable(_) => "variable",
        }
    }

    /// Type of the value this declaration holds or returns
    pub fn value_type(&self) -> Option<&IrType> {
        match &self.kind {
            DeclKind::Function(f) => Some(&f.return_type),
            DeclKind::Property(p) => Some(&p.ty),
            DeclKind::Field(f) => Some(&f.ty),
            DeclKind::ValueParameter(p) => Some(&p.ty),
            DeclKind::Variable(v) => Some(&v.ty),
            DeclKind::Class(_) | DeclKind::Constructor(_) => None,
        }
    }

    /// Value parameters of a function or constructor
    pub fn params(&self) -> &[DeclId] {
        match &self.kind {
            DeclKind::Function(f) => &f.params,
            DeclKind::Constructor(c) => &c.params,
            _ => &[],
        }
    }

    /// Check whether this is a class, interface or object
    pub fn is_class(&self) -> bool {
        matches!(self.kind, DeclKind::Class(_))
    }

    /// Check whether this is an interface
    pub fn is_interface(&self) -> bool {
        matches!(&self.kind, DeclKind::Class(c) if c.kind == ClassKind::Interface)
    }

    /// Check whether this is a function
    pub fn is_function(&self) -> bool {
        matches!(self.kind, DeclKind::Function(_))
    }

    /// Check whether this is a constructor
    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, DeclKind::Constructor(_))
    }

    /// Check whether this is an accessor of a property
    pub fn is_accessor(&self) -> bool {
        matches!(&self.kind, DeclKind::Function(f) if f.accessor.is_some())
    }

    /// Class data
    pub fn as_class(&self) -> Option<&ClassDecl> {
        match &self.kind {
            DeclKind::Class(c) => Some(c),
            _ => None,
        }
    }

    /// Mutable class data
    pub fn as_class_mut(&mut self) -> Option<&mut ClassDecl> {
        match &mut self.kind {
            DeclKind::Class(c) => Some(c),
            _ => None,
        }
    }

    /// Function data
    pub fn as_function(&self) -> Option<&FunctionDecl> {
        match &self.kind {
            DeclKind::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Mutable function data
    pub fn as_function_mut(&mut self) -> Option<&mut FunctionDecl> {
        match &mut self.kind {
            DeclKind::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Constructor data
    pub fn as_constructor(&self) -> Option<&ConstructorDecl> {
        match &self.kind {
            DeclKind::Constructor(c) => Some(c),
            _ => None,
        }
    }

    /// Mutable constructor data
    pub fn as_constructor_mut(&mut self) -> Option<&mut ConstructorDecl> {
        match &mut self.kind {
            DeclKind::Constructor(c) => Some(c),
            _ => None,
        }
    }

    /// Parameter data
    pub fn as_param(&self) -> Option<&ParamDecl> {
        match &self.kind {
            DeclKind::ValueParameter(p) => Some(p),
            _ => None,
        }
    }

    /// Mutable parameter data
    pub fn as_param_mut(&mut self) -> Option<&mut ParamDecl> {
        match &mut self.kind {
            DeclKind::ValueParameter(p) => Some(p),
            _ => None,
        }
    }

    /// Property data
    pub fn as_property(&self) -> Option<&PropertyDecl> {
        match &self.kind {
            DeclKind::Property(p) => Some(p),
            _ => None,
        }
    }

    /// Variable data
    pub fn as_variable(&self) -> Option<&VariableDecl> {
        match &self.kind {
            DeclKind::Variable(v) => Some(v),
            _ => None,
        }
    }
}

impl FunctionDecl {
    /// A regular function with the given parameters and return type
    pub fn new(params: Vec<DeclId>, return_type: IrType, body: Option<Block>) -> Self {
        Self {
            params,
            return_type,
            body,
            is_static: false,
            is_operator: false,
            is_lambda: false,
            style: FunctionStyle::Regular,
            accessor: None,
            overridden: Vec::new(),
        }
    }
}

impl ConstructorDecl {
    /// A non-primary, non-const constructor
    pub fn new(params: Vec<DeclId>, body: Option<Block>) -> Self {
        Self {
            params,
            body,
            is_primary: false,
            is_const: false,
            is_factory: false,
            delegation: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_prefix() {
        assert_eq!(Annotations::import_prefix("dart:core"), "core");
        assert_eq!(Annotations::import_prefix("dart:typed_data"), "typed_data");
        assert_eq!(Annotations::import_prefix("dart.typeddata"), "typeddata");
        assert_eq!(Annotations::import_prefix("plain"), "plain");
    }

    #[test]
    fn test_effective_name_precedence() {
        let mut decl = Declaration::new(
            "size",
            DeclKind::Variable(VariableDecl {
                ty: IrType::int(),
                initializer: None,
                is_mutable: false,
            }),
        );
        assert_eq!(decl.effective_name(), "size");

        decl.annotations.target_name = Some("length".to_string());
        assert_eq!(decl.effective_name(), "length");

        decl.target_name = Some("_length".to_string());
        assert_eq!(decl.effective_name(), "_length");
    }

    #[test]
    fn test_kind_queries() {
        let class = Declaration::new(
            "Pigeon",
            DeclKind::Class(ClassDecl {
                kind: ClassKind::Interface,
                super_types: Vec::new(),
                members: Vec::new(),
            }),
        );
        assert!(class.is_class());
        assert!(class.is_interface());
        assert_eq!(class.kind_name(), "interface");
        assert!(class.value_type().is_none());
        assert!(class.params().is_empty());
    }
}
