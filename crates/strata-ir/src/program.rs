//! Declaration arena
//!
//! `Program` owns every declaration of every file. A `DeclId` indexes the arena
//! directly, so `resolve` is O(1). Removed declarations leave a hole (`None`) so
//! symbols are never reused.
//!
//! Ownership is a tree: a declaration's `parent` names its single owner, and the
//! owner lists it (file declarations, class members, parameters, accessors) or
//! mentions it in its code (locals, lambdas).

use crate::decl::{DeclKind, Declaration, Parent};
use crate::error::{IrError, IrResult};
use crate::expr::{Block, Expr, ExprKind};
use crate::file::IrFile;
use crate::stmt::Stmt;
use crate::symbol::{DeclId, FileId};
use crate::visit::{walk_declaration_code, walk_expr, walk_stmt, Visitor};
use serde::Serialize;
use std::ops::{Index, IndexMut};

/// A place that holds a member list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    /// Top level of a file
    File(FileId),
    /// Members of a class
    Class(DeclId),
}

/// Code checked out of a declaration with `Program::take_code`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclCode {
    /// Function or constructor body
    pub body: Option<Block>,
    /// Field/variable initializer or parameter default value
    pub value: Option<Expr>,
    /// Constructor delegation
    pub delegation: Option<Box<Expr>>,
}

impl DeclCode {
    /// Check whether nothing was checked out
    pub fn is_empty(&self) -> bool {
        self.body.is_none() && self.value.is_none() && self.delegation.is_none()
    }
}

/// The whole program being lowered
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Program {
    decls: Vec<Option<Declaration>>,
    files: Vec<IrFile>,
}

impl Program {
    /// Create an empty program
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Files
    // ========================================================================

    /// Add an empty file
    pub fn add_file(&mut self, name: impl Into<String>, package: impl Into<String>) -> FileId {
        let id = FileId::new(self.files.len() as u32);
        self.files.push(IrFile::new(id, name, package));
        id
    }

    /// Get a file
    pub fn file(&self, id: FileId) -> IrResult<&IrFile> {
        self.files
            .get(id.index())
            .ok_or(IrError::UnknownFile { file: id })
    }

    /// Get a file mutably
    pub fn file_mut(&mut self, id: FileId) -> IrResult<&mut IrFile> {
        self.files
            .get_mut(id.index())
            .ok_or(IrError::UnknownFile { file: id })
    }

    /// All files
    pub fn files(&self) -> &[IrFile] {
        &self.files
    }

    /// IDs of all files in order
    pub fn file_ids(&self) -> Vec<FileId> {
        self.files.iter().map(|f| f.id).collect()
    }

    // ========================================================================
    // Arena
    // ========================================================================

    /// Allocate a fresh symbol for a detached declaration
    pub fn alloc(&mut self, mut decl: Declaration) -> DeclId {
        let id = DeclId::new(self.decls.len() as u32);
        decl.id = id;
        decl.parent = Parent::Detached;
        self.decls.push(Some(decl));
        id
    }

    /// Get a declaration if the symbol is live
    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.decls.get(id.index()).and_then(Option::as_ref)
    }

    /// Get a declaration mutably if the symbol is live
    pub fn get_mut(&mut self, id: DeclId) -> Option<&mut Declaration> {
        self.decls.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Resolve a symbol to its declaration
    pub fn resolve(&self, id: DeclId) -> IrResult<&Declaration> {
        self.get(id).ok_or(IrError::UnboundSymbol { symbol: id })
    }

    /// Resolve a symbol to its declaration mutably
    pub fn resolve_mut(&mut self, id: DeclId) -> IrResult<&mut Declaration> {
        self.get_mut(id).ok_or(IrError::UnboundSymbol { symbol: id })
    }

    /// Check whether a symbol resolves to a live declaration
    pub fn is_live(&self, id: DeclId) -> bool {
        self.get(id).is_some()
    }

    /// Iterate over live declarations
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.decls.iter().flatten()
    }

    /// Number of live declarations
    pub fn live_count(&self) -> usize {
        self.decls.iter().filter(|d| d.is_some()).count()
    }

    /// Name used in the target language
    pub fn effective_name(&self, id: DeclId) -> IrResult<&str> {
        Ok(self.resolve(id)?.effective_name())
    }

    // ========================================================================
    // Ownership
    // ========================================================================

    /// Append a detached declaration to the top level of a file
    pub fn attach_to_file(&mut self, file: FileId, id: DeclId) -> IrResult<()> {
        self.ensure_detached(id)?;
        self.file_mut(file)?.declarations.push(id);
        self.resolve_mut(id)?.parent = Parent::File(file);
        Ok(())
    }

    /// Append a detached declaration to the members of a class
    pub fn attach_to_class(&mut self, class: DeclId, id: DeclId) -> IrResult<()> {
        self.ensure_detached(id)?;
        let owner = self.resolve_mut(class)?;
        let name = owner.name.clone();
        match owner.as_class_mut() {
            Some(c) => c.members.push(id),
            None => return Err(IrError::NotAContainer { symbol: class, name }),
        }
        self.resolve_mut(id)?.parent = Parent::Decl(class);
        Ok(())
    }

    /// Append a detached declaration to a container
    pub fn attach(&mut self, container: Container, id: DeclId) -> IrResult<()> {
        match container {
            Container::File(file) => self.attach_to_file(file, id),
            Container::Class(class) => self.attach_to_class(class, id),
        }
    }

    /// Record `owner` as the owner of a detached declaration that the owner lists
    /// itself (parameters, accessors) or mentions in its code (locals, lambdas)
    pub fn set_owner(&mut self, id: DeclId, owner: DeclId) -> IrResult<()> {
        self.ensure_detached(id)?;
        self.resolve(owner)?;
        self.resolve_mut(id)?.parent = Parent::Decl(owner);
        Ok(())
    }

    fn ensure_detached(&self, id: DeclId) -> IrResult<()> {
        let decl = self.resolve(id)?;
        if decl.parent != Parent::Detached {
            return Err(IrError::AlreadyAttached {
                symbol: id,
                name: decl.name.clone(),
            });
        }
        Ok(())
    }

    /// Container a declaration is listed in, if it is a file or class member
    pub fn container_of(&self, id: DeclId) -> IrResult<Option<Container>> {
        Ok(match self.resolve(id)?.parent {
            Parent::File(file) => Some(Container::File(file)),
            Parent::Decl(owner) if self.resolve(owner)?.is_class() => Some(Container::Class(owner)),
            Parent::Decl(_) | Parent::Detached => None,
        })
    }

    /// Remove a declaration from its owner's lists and mark it detached
    ///
    /// Code that mentions a detached local or lambda is the caller's to rewrite.
    pub fn detach(&mut self, id: DeclId) -> IrResult<()> {
        let parent = self.resolve(id)?.parent;
        match parent {
            Parent::Detached => return Ok(()),
            Parent::File(file) => {
                self.file_mut(file)?.declarations.retain(|d| *d != id);
            }
            Parent::Decl(owner) => match &mut self.resolve_mut(owner)?.kind {
                DeclKind::Class(c) => c.members.retain(|d| *d != id),
                DeclKind::Function(f) => f.params.retain(|d| *d != id),
                DeclKind::Constructor(c) => c.params.retain(|d| *d != id),
                DeclKind::Property(p) => {
                    for slot in [&mut p.getter, &mut p.setter, &mut p.backing_field] {
                        if *slot == Some(id) {
                            *slot = None;
                        }
                    }
                }
                DeclKind::Field(_) | DeclKind::ValueParameter(_) | DeclKind::Variable(_) => {}
            },
        }
        self.resolve_mut(id)?.parent = Parent::Detached;
        Ok(())
    }

    /// Detach a declaration and remove it and everything it owns from the arena
    pub fn destroy(&mut self, id: DeclId) -> IrResult<()> {
        self.detach(id)?;
        for symbol in self.subtree(id)? {
            if let Some(slot) = self.decls.get_mut(symbol.index()) {
                *slot = None;
            }
        }
        Ok(())
    }

    /// Put `new` (detached) in the container slot of `old`, detaching `old`
    pub fn replace_in_container(&mut self, old: DeclId, new: DeclId) -> IrResult<()> {
        self.ensure_detached(new)?;
        let parent = self.resolve(old)?.parent;
        let replaced = match parent {
            Parent::File(file) => replace_slot(&mut self.file_mut(file)?.declarations, old, new),
            Parent::Decl(owner) => {
                let decl = self.resolve_mut(owner)?;
                let name = decl.name.clone();
                match decl.as_class_mut() {
                    Some(c) => replace_slot(&mut c.members, old, new),
                    None => return Err(IrError::NotAContainer { symbol: owner, name }),
                }
            }
            Parent::Detached => false,
        };
        if replaced {
            self.resolve_mut(old)?.parent = Parent::Detached;
            self.resolve_mut(new)?.parent = parent;
        }
        Ok(())
    }

    /// Insert a detached declaration into a container right after `anchor`, or at
    /// the end when `anchor` is not listed there
    pub fn insert_after(&mut self, container: Container, anchor: DeclId, id: DeclId) -> IrResult<()> {
        self.ensure_detached(id)?;
        let (list, parent) = match container {
            Container::File(file) => (&mut self.file_mut(file)?.declarations, Parent::File(file)),
            Container::Class(class) => {
                let owner = self.resolve_mut(class)?;
                let name = owner.name.clone();
                match owner.as_class_mut() {
                    Some(c) => (&mut c.members, Parent::Decl(class)),
                    None => return Err(IrError::NotAContainer { symbol: class, name }),
                }
            }
        };
        let at = list
            .iter()
            .position(|m| *m == anchor)
            .map_or(list.len(), |i| i + 1);
        list.insert(at, id);
        self.resolve_mut(id)?.parent = parent;
        Ok(())
    }

    // ========================================================================
    // Code checkout
    // ========================================================================

    /// Move a declaration's code out of the arena so it can be rewritten while
    /// the rest of the program is mutated
    pub fn take_code(&mut self, id: DeclId) -> IrResult<DeclCode> {
        let decl = self.resolve_mut(id)?;
        Ok(match &mut decl.kind {
            DeclKind::Function(f) => DeclCode {
                body: f.body.take(),
                ..DeclCode::default()
            },
            DeclKind::Constructor(c) => DeclCode {
                body: c.body.take(),
                delegation: c.delegation.take(),
                ..DeclCode::default()
            },
            DeclKind::Field(f) => DeclCode {
                value: f.initializer.take(),
                ..DeclCode::default()
            },
            DeclKind::ValueParameter(p) => DeclCode {
                value: p.default_value.take(),
                ..DeclCode::default()
            },
            DeclKind::Variable(v) => DeclCode {
                value: v.initializer.take(),
                ..DeclCode::default()
            },
            DeclKind::Class(_) | DeclKind::Property(_) => DeclCode::default(),
        })
    }

    /// Put checked-out code back
    ///
    /// Parts the declaration gained while its code was checked out are kept when
    /// the checked-out part is empty.
    pub fn restore_code(&mut self, id: DeclId, code: DeclCode) -> IrResult<()> {
        let decl = self.resolve_mut(id)?;
        match &mut decl.kind {
            DeclKind::Function(f) => {
                if code.body.is_some() {
                    f.body = code.body;
                }
            }
            DeclKind::Constructor(c) => {
                if code.body.is_some() {
                    c.body = code.body;
                }
                if code.delegation.is_some() {
                    c.delegation = code.delegation;
                }
            }
            DeclKind::Field(f) => {
                if code.value.is_some() {
                    f.initializer = code.value;
                }
            }
            DeclKind::ValueParameter(p) => {
                if code.value.is_some() {
                    p.default_value = code.value;
                }
            }
            DeclKind::Variable(v) => {
                if code.value.is_some() {
                    v.initializer = code.value;
                }
            }
            DeclKind::Class(_) | DeclKind::Property(_) => {}
        }
        Ok(())
    }

    // ========================================================================
    // Tree queries
    // ========================================================================

    /// Declarations owned directly by `id`, in declaration order
    pub fn owned_children(&self, id: DeclId) -> IrResult<Vec<DeclId>> {
        let decl = self.resolve(id)?;
        let mut children = match &decl.kind {
            DeclKind::Class(c) => c.members.clone(),
            DeclKind::Function(f) => f.params.clone(),
            DeclKind::Constructor(c) => c.params.clone(),
            DeclKind::Property(p) => [p.getter, p.setter, p.backing_field]
                .into_iter()
                .flatten()
                .collect(),
            DeclKind::Field(_) | DeclKind::ValueParameter(_) | DeclKind::Variable(_) => Vec::new(),
        };
        let mut finder = LocalDeclarations { found: Vec::new() };
        walk_declaration_code(&mut finder, decl);
        children.extend(finder.found);
        Ok(children)
    }

    /// `id` and every declaration it transitively owns, parents first
    pub fn subtree(&self, id: DeclId) -> IrResult<Vec<DeclId>> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.is_live(current) {
                continue;
            }
            result.push(current);
            let children = self.owned_children(current)?;
            stack.extend(children.into_iter().rev());
        }
        Ok(result)
    }

    /// Every declaration of a file, parents first
    pub fn file_decl_tree(&self, file: FileId) -> IrResult<Vec<DeclId>> {
        let mut result = Vec::new();
        for &top in &self.file(file)?.declarations {
            result.extend(self.subtree(top)?);
        }
        Ok(result)
    }

    /// File a declaration ultimately belongs to
    pub fn enclosing_file(&self, id: DeclId) -> Option<FileId> {
        let mut current = id;
        loop {
            match self.get(current)?.parent {
                Parent::File(file) => return Some(file),
                Parent::Decl(owner) => current = owner,
                Parent::Detached => return None,
            }
        }
    }

    /// Nearest class enclosing a declaration
    pub fn enclosing_class(&self, id: DeclId) -> Option<DeclId> {
        let mut current = self.get(id)?.parent;
        while let Parent::Decl(owner) = current {
            let decl = self.get(owner)?;
            if decl.is_class() {
                return Some(owner);
            }
            current = decl.parent;
        }
        None
    }

    /// Check whether `ancestor` transitively owns `id` (or is `id`)
    pub fn is_descendant(&self, id: DeclId, ancestor: DeclId) -> bool {
        let mut current = id;
        loop {
            if current == ancestor {
                return true;
            }
            match self.get(current).map(|d| d.parent) {
                Some(Parent::Decl(owner)) => current = owner,
                _ => return false,
            }
        }
    }
}

fn replace_slot(list: &mut [DeclId], old: DeclId, new: DeclId) -> bool {
    match list.iter_mut().find(|d| **d == old) {
        Some(slot) => {
            *slot = new;
            true
        }
        None => false,
    }
}

/// Collects declarations introduced directly by code: locals and lambdas
struct LocalDeclarations {
    found: Vec<DeclId>,
}

impl Visitor for LocalDeclarations {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if let Stmt::Decl(symbol) = stmt {
            self.found.push(*symbol);
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if let ExprKind::FunctionExpr(symbol) = expr.kind {
            self.found.push(symbol);
        }
        walk_expr(self, expr);
    }
}

impl Index<DeclId> for Program {
    type Output = Declaration;

    fn index(&self, id: DeclId) -> &Declaration {
        match self.get(id) {
            Some(decl) => decl,
            None => panic!("unbound symbol {}", id),
        }
    }
}

impl IndexMut<DeclId> for Program {
    fn index_mut(&mut self, id: DeclId) -> &mut Declaration {
        match self.get_mut(id) {
            Some(decl) => decl,
            None => panic!("unbound symbol {}", id),
        }
    }
}
