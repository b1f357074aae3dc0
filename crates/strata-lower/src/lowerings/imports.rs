//! Import directives for names that clash with platform libraries
//!
//! A declaration annotated `import_alias(lib)` is reached through an aliased
//! import of `lib`, and its plain name is hidden from the unaliased import. A
//! declaration annotated `hide_import(lib)` only hides its name. References to a
//! constructor count as references to its class.

use crate::config::LoweringOptions;
use crate::context::LoweringContext;
use crate::error::LowerResult;
use crate::transform::{FileLowering, Transformation};
use rustc_hash::FxHashSet;
use strata_ir::visit::declaration_references;
use strata_ir::{Annotations, DeclId, Declaration, FileId, ImportSet, IrFile, Parent, Program};
use tracing::debug;

/// Adds the import directives a file's references need
pub struct ImportsLowering;

impl FileLowering for ImportsLowering {
    fn name(&self) -> &'static str {
        "imports"
    }

    fn transform(&self, ctx: &mut LoweringContext<'_>, file: &IrFile) -> LowerResult<Transformation<IrFile>> {
        let collected = collect_imports(ctx.program, ctx.options, file.id)?;
        let mut imports = file.imports.clone();
        imports.merge(&collected);
        if imports == file.imports {
            return Ok(Transformation::NoChange);
        }
        debug!(file = %file.name, directives = imports.len(), "import directives updated");
        Ok(Transformation::Replace(IrFile {
            imports,
            ..file.clone()
        }))
    }
}

/// Import directives needed by everything a file declares or references
pub fn collect_imports(program: &Program, options: &LoweringOptions, file: FileId) -> LowerResult<ImportSet> {
    let mut symbols: FxHashSet<DeclId> = FxHashSet::default();
    for id in program.file_decl_tree(file)? {
        symbols.insert(id);
        symbols.extend(declaration_references(program.resolve(id)?));
    }

    let mut imports = ImportSet::new();
    for symbol in symbols {
        if let Some(decl) = imported_declaration(program, symbol) {
            record(decl, options, &mut imports);
        }
    }
    Ok(imports)
}

fn imported_declaration(program: &Program, symbol: DeclId) -> Option<&Declaration> {
    let decl = program.get(symbol)?;
    match decl.parent {
        Parent::Decl(class) if decl.is_constructor() => program.get(class),
        _ => Some(decl),
    }
}

fn record(decl: &Declaration, options: &LoweringOptions, imports: &mut ImportSet) {
    let name = decl.effective_name();
    if let Some(library) = &decl.annotations.import_alias {
        let library = options.resolve_library(library);
        imports.hide(library, name);
        imports.alias(library, Annotations::import_prefix(library));
    }
    if let Some(library) = &decl.annotations.hide_import {
        // An empty library names the core library
        let library = if library.is_empty() {
            options.core_library.as_str()
        } else {
            options.resolve_library(library)
        };
        imports.hide(library, name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_ir::{Block, Container, Expr, IrType, Stmt};

    fn annotated_class(program: &mut Program, file: FileId, name: &str, annotations: Annotations) -> DeclId {
        let class = program.add_class(Container::File(file), name).unwrap();
        program[class].annotations = annotations;
        class
    }

    #[test]
    fn test_alias_and_hide() {
        let mut program = Program::new();
        let sdk = program.add_file("sdk.kt", "dart.typeddata");
        let app = program.add_file("app.kt", "app");
        let list = annotated_class(
            &mut program,
            sdk,
            "Int8List",
            Annotations {
                builtin: true,
                import_alias: Some("dart.typeddata".to_string()),
                ..Annotations::default()
            },
        );
        let f = program
            .add_function(Container::File(app), "make", IrType::declared("Int8List", list))
            .unwrap();
        program.set_body(f, Block::new(vec![])).unwrap();

        let imports = collect_imports(&program, &LoweringOptions::default(), app).unwrap();
        assert!(imports.has_alias("dart:typed_data", "typed_data"));
        assert!(imports
            .hidden_from("dart:typed_data")
            .is_some_and(|names| names.contains("Int8List")));
    }

    #[test]
    fn test_constructor_reference_counts_as_class() {
        let mut program = Program::new();
        let app = program.add_file("app.kt", "app");
        let pair = annotated_class(
            &mut program,
            app,
            "Pair",
            Annotations {
                hide_import: Some(String::new()),
                ..Annotations::default()
            },
        );
        let ctor = program.add_constructor(pair, "").unwrap();
        let f = program.add_function(Container::File(app), "f", IrType::Void).unwrap();
        program
            .set_body(
                f,
                Block::new(vec![Stmt::Expr(Expr::call(ctor, vec![], IrType::declared("Pair", pair)))]),
            )
            .unwrap();

        let imports = collect_imports(&program, &LoweringOptions::default(), app).unwrap();
        assert_eq!(imports.len(), 1);
        assert!(imports.hidden_from("dart:core").is_some_and(|names| names.contains("Pair")));
    }

    #[test]
    fn test_nothing_to_import() {
        let mut program = Program::new();
        let app = program.add_file("app.kt", "app");
        program.add_function(Container::File(app), "f", IrType::Void).unwrap();
        let imports = collect_imports(&program, &LoweringOptions::default(), app).unwrap();
        assert!(imports.is_empty());
    }
}
