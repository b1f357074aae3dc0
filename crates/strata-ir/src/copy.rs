//! Copy-with-rebind
//!
//! `deep_copy` duplicates a declaration and everything it owns under fresh
//! symbols. References between declarations inside the copied subtree are
//! rewritten to the copies; references to anything outside keep pointing at the
//! originals.

use crate::decl::{DeclKind, Declaration, Parent};
use crate::error::IrResult;
use crate::expr::{Block, Expr};
use crate::program::Program;
use crate::symbol::DeclId;
use crate::types::IrType;
use crate::visit::{walk_declaration_mut, walk_expr_mut, VisitorMut};
use rustc_hash::FxHashMap;

struct SymbolRemapper<'a> {
    map: &'a FxHashMap<DeclId, DeclId>,
}

impl SymbolRemapper<'_> {
    fn remap(&self, symbol: DeclId) -> DeclId {
        self.map.get(&symbol).copied().unwrap_or(symbol)
    }

    fn remap_kind(&self, kind: &mut DeclKind) {
        let remap_all = |ids: &mut Vec<DeclId>| {
            for id in ids.iter_mut() {
                *id = self.remap(*id);
            }
        };
        match kind {
            DeclKind::Class(c) => remap_all(&mut c.members),
            DeclKind::Function(f) => {
                remap_all(&mut f.params);
                remap_all(&mut f.overridden);
                if let Some(accessor) = &mut f.accessor {
                    accessor.property = self.remap(accessor.property);
                }
            }
            DeclKind::Constructor(c) => remap_all(&mut c.params),
            DeclKind::Property(p) => {
                for slot in [&mut p.getter, &mut p.setter, &mut p.backing_field] {
                    if let Some(id) = slot {
                        *id = self.remap(*id);
                    }
                }
            }
            DeclKind::ValueParameter(p) => {
                if let Some(target) = &mut p.initializes {
                    *target = self.remap(*target);
                }
            }
            DeclKind::Field(_) | DeclKind::Variable(_) => {}
        }
    }
}

impl VisitorMut for SymbolRemapper<'_> {
    fn visit_symbol(&mut self, symbol: &mut DeclId) {
        *symbol = self.remap(*symbol);
    }

    fn visit_type(&mut self, ty: &mut IrType) {
        ty.remap_class_symbols(&mut |id| self.remap(id));
    }
}

/// Copy `root` and its whole subtree under fresh symbols
///
/// The copy of `root` is returned detached; `edit` is applied to it before it is
/// returned (rename, change visibility, re-tag the origin). Copies of owned
/// declarations are owned by the corresponding copies.
pub fn deep_copy(
    program: &mut Program,
    root: DeclId,
    edit: impl FnOnce(&mut Declaration),
) -> IrResult<DeclId> {
    let originals = program.subtree(root)?;

    let mut map = FxHashMap::default();
    for &original in &originals {
        let decl = program.resolve(original)?.clone();
        map.insert(original, program.alloc(decl));
    }

    let remapper = SymbolRemapper { map: &map };
    for &original in &originals {
        let copy = remapper.remap(original);
        let parent = program.resolve(original)?.parent;
        let decl = program.resolve_mut(copy)?;
        decl.parent = match parent {
            Parent::Decl(owner) if original != root => Parent::Decl(remapper.remap(owner)),
            _ => Parent::Detached,
        };
        remapper.remap_kind(&mut decl.kind);
        let mut visitor = SymbolRemapper { map: &map };
        walk_declaration_mut(&mut visitor, decl);
    }

    let copied_root = remapper.remap(root);
    edit(program.resolve_mut(copied_root)?);
    Ok(copied_root)
}

struct Rebinder {
    from: DeclId,
    to: DeclId,
    count: usize,
}

impl VisitorMut for Rebinder {
    fn visit_symbol(&mut self, symbol: &mut DeclId) {
        if *symbol == self.from {
            *symbol = self.to;
            self.count += 1;
        }
    }
}

/// Rewrite every reference to `from` inside `expr` to `to`, returning how many
/// references changed
pub fn rebind(expr: &mut Expr, from: DeclId, to: DeclId) -> usize {
    let mut rebinder = Rebinder { from, to, count: 0 };
    walk_expr_mut(&mut rebinder, expr);
    rebinder.count
}

/// Rewrite every reference to `from` inside a block
pub fn rebind_block(block: &mut Block, from: DeclId, to: DeclId) -> usize {
    let mut rebinder = Rebinder { from, to, count: 0 };
    rebinder.visit_block(block);
    rebinder.count
}
