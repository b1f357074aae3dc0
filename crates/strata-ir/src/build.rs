//! Declaration builders
//!
//! Convenience constructors that allocate a declaration and wire it into the
//! ownership tree in one step. Front-ends and lowerings that synthesize
//! declarations go through these so parent links are always set.

use crate::decl::{
    Accessor, AccessorKind, ClassDecl, ClassKind, ConstructorDecl, DeclKind, Declaration, FieldDecl,
    FunctionDecl, ParamDecl, PropertyDecl, VariableDecl, Visibility,
};
use crate::error::{IrError, IrResult};
use crate::expr::{Block, Expr};
use crate::program::{Container, Program};
use crate::symbol::DeclId;
use crate::types::IrType;

impl Program {
    /// Add an empty class
    pub fn add_class(&mut self, container: Container, name: &str) -> IrResult<DeclId> {
        self.add_class_of_kind(container, name, ClassKind::Class)
    }

    /// Add an empty class, interface or object
    pub fn add_class_of_kind(
        &mut self,
        container: Container,
        name: &str,
        kind: ClassKind,
    ) -> IrResult<DeclId> {
        let decl = Declaration::new(
            name,
            DeclKind::Class(ClassDecl {
                kind,
                super_types: Vec::new(),
                members: Vec::new(),
            }),
        );
        let id = self.alloc(decl);
        self.attach(container, id)?;
        Ok(id)
    }

    /// Add a function without parameters or body
    pub fn add_function(
        &mut self,
        container: Container,
        name: &str,
        return_type: IrType,
    ) -> IrResult<DeclId> {
        let decl = Declaration::new(
            name,
            DeclKind::Function(FunctionDecl::new(Vec::new(), return_type, None)),
        );
        let id = self.alloc(decl);
        self.attach(container, id)?;
        Ok(id)
    }

    /// Add a constructor without parameters or body; `name` is empty for the
    /// unnamed constructor
    pub fn add_constructor(&mut self, class: DeclId, name: &str) -> IrResult<DeclId> {
        let decl = Declaration::new(
            name,
            DeclKind::Constructor(ConstructorDecl::new(Vec::new(), Some(Block::default()))),
        );
        let id = self.alloc(decl);
        self.attach_to_class(class, id)?;
        Ok(id)
    }

    /// Append a value parameter to a function or constructor
    pub fn add_param(&mut self, owner: DeclId, name: &str, ty: IrType) -> IrResult<DeclId> {
        let index = {
            let decl = self.resolve(owner)?;
            match &decl.kind {
                DeclKind::Function(_) | DeclKind::Constructor(_) => decl.params().len(),
                _ => {
                    return Err(IrError::WrongKind {
                        symbol: owner,
                        name: decl.name.clone(),
                        expected: "function or constructor",
                    })
                }
            }
        };
        let decl = Declaration::new(
            name,
            DeclKind::ValueParameter(ParamDecl {
                ty,
                default_value: None,
                index,
                initializes: None,
            }),
        );
        let id = self.alloc(decl);
        match &mut self.resolve_mut(owner)?.kind {
            DeclKind::Function(f) => f.params.push(id),
            DeclKind::Constructor(c) => c.params.push(id),
            _ => {}
        }
        self.set_owner(id, owner)?;
        Ok(id)
    }

    /// Set the default value of a parameter
    pub fn set_default_value(&mut self, param: DeclId, value: Expr) -> IrResult<()> {
        let decl = self.resolve_mut(param)?;
        let name = decl.name.clone();
        match decl.as_param_mut() {
            Some(p) => {
                p.default_value = Some(value);
                Ok(())
            }
            None => Err(IrError::WrongKind {
                symbol: param,
                name,
                expected: "parameter",
            }),
        }
    }

    /// Allocate a local variable owned by `owner`; the caller places the
    /// `Stmt::Decl` in the owner's code
    pub fn add_local(
        &mut self,
        owner: DeclId,
        name: &str,
        ty: IrType,
        initializer: Option<Expr>,
        is_mutable: bool,
    ) -> IrResult<DeclId> {
        let decl = Declaration::new(
            name,
            DeclKind::Variable(VariableDecl {
                ty,
                initializer,
                is_mutable,
            }),
        )
        .with_visibility(Visibility::Local);
        let id = self.alloc(decl);
        self.set_owner(id, owner)?;
        Ok(id)
    }

    /// Allocate a lambda function owned by `owner`; the caller places the
    /// `FunctionExpr` in the owner's code
    pub fn add_lambda(&mut self, owner: DeclId, return_type: IrType, body: Block) -> IrResult<DeclId> {
        let mut function = FunctionDecl::new(Vec::new(), return_type, Some(body));
        function.is_lambda = true;
        let decl = Declaration::new("<anonymous>", DeclKind::Function(function))
            .with_visibility(Visibility::Local);
        let id = self.alloc(decl);
        self.set_owner(id, owner)?;
        Ok(id)
    }

    /// Add a field to a class or file
    pub fn add_field(
        &mut self,
        container: Container,
        name: &str,
        ty: IrType,
        initializer: Option<Expr>,
    ) -> IrResult<DeclId> {
        let decl = Declaration::new(
            name,
            DeclKind::Field(FieldDecl {
                ty,
                initializer,
                is_static: false,
                is_final: true,
                is_const: false,
            }),
        );
        let id = self.alloc(decl);
        self.attach(container, id)?;
        Ok(id)
    }

    /// Add a property with a getter and, if `backing_field`, a backing field
    pub fn add_property(
        &mut self,
        container: Container,
        name: &str,
        ty: IrType,
        backing_field: bool,
    ) -> IrResult<DeclId> {
        let property = self.alloc(Declaration::new(
            name,
            DeclKind::Property(PropertyDecl {
                ty: ty.clone(),
                getter: None,
                setter: None,
                backing_field: None,
            }),
        ));
        self.attach(container, property)?;

        let mut getter = FunctionDecl::new(Vec::new(), ty.clone(), None);
        getter.accessor = Some(Accessor {
            property,
            kind: AccessorKind::Getter,
        });
        let getter = self.alloc(Declaration::new(
            format!("<get-{}>", name),
            DeclKind::Function(getter),
        ));
        self.set_owner(getter, property)?;

        let field = if backing_field {
            let field = self.alloc(Declaration::new(
                name,
                DeclKind::Field(FieldDecl {
                    ty,
                    initializer: None,
                    is_static: false,
                    is_final: true,
                    is_const: false,
                }),
            ));
            self.set_owner(field, property)?;
            Some(field)
        } else {
            None
        };

        if let DeclKind::Property(p) = &mut self.resolve_mut(property)?.kind {
            p.getter = Some(getter);
            p.backing_field = field;
        }
        Ok(property)
    }

    /// Replace the body of a function or constructor
    pub fn set_body(&mut self, id: DeclId, body: Block) -> IrResult<()> {
        let decl = self.resolve_mut(id)?;
        let name = decl.name.clone();
        match &mut decl.kind {
            DeclKind::Function(f) => f.body = Some(body),
            DeclKind::Constructor(c) => c.body = Some(body),
            _ => {
                return Err(IrError::WrongKind {
                    symbol: id,
                    name,
                    expected: "function or constructor",
                })
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::Parent;

    #[test]
    fn test_add_param_indices() {
        let mut program = Program::new();
        let file = program.add_file("a.kt", "a");
        let f = program
            .add_function(Container::File(file), "f", IrType::Void)
            .unwrap();
        let a = program.add_param(f, "a", IrType::int()).unwrap();
        let b = program.add_param(f, "b", IrType::int()).unwrap();
        assert_eq!(program[a].as_param().unwrap().index, 0);
        assert_eq!(program[b].as_param().unwrap().index, 1);
        assert_eq!(program[f].params(), &[a, b]);
        assert_eq!(program[b].parent, Parent::Decl(f));
    }

    #[test]
    fn test_add_param_to_class_fails() {
        let mut program = Program::new();
        let file = program.add_file("a.kt", "a");
        let class = program.add_class(Container::File(file), "A").unwrap();
        assert!(matches!(
            program.add_param(class, "x", IrType::int()),
            Err(IrError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_add_property_owns_accessors() {
        let mut program = Program::new();
        let file = program.add_file("a.kt", "a");
        let class = program.add_class(Container::File(file), "A").unwrap();
        let property = program
            .add_property(Container::Class(class), "size", IrType::int(), true)
            .unwrap();
        let children = program.owned_children(property).unwrap();
        assert_eq!(children.len(), 2);
        for child in children {
            assert_eq!(program[child].parent, Parent::Decl(property));
        }
    }
}
