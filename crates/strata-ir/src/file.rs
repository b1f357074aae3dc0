//! Compilation files and import directives

use crate::symbol::{DeclId, FileId};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One compilation file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrFile {
    /// File ID
    pub id: FileId,
    /// File name (used in diagnostics)
    pub name: String,
    /// Package of the file
    pub package: String,
    /// Top-level declarations in order
    pub declarations: Vec<DeclId>,
    /// Accumulated import directives
    pub imports: ImportSet,
}

impl IrFile {
    /// Create an empty file
    pub fn new(id: FileId, name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            package: package.into(),
            declarations: Vec::new(),
            imports: ImportSet::default(),
        }
    }
}

/// A rendered import directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportDirective {
    /// Imported library
    pub library: String,
    /// `as` prefix
    pub alias: Option<String>,
    /// Hidden names
    pub hide: BTreeSet<String>,
}

impl fmt::Display for ImportDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "import '{}'", self.library)?;
        if let Some(alias) = &self.alias {
            write!(f, " as {}", alias)?;
        }
        if !self.hide.is_empty() {
            let names: Vec<&str> = self.hide.iter().map(String::as_str).collect();
            write!(f, " hide {}", names.join(", "))?;
        }
        write!(f, ";")
    }
}

/// Per-file import directives with set semantics
///
/// Directives are keyed by `(library, alias)`; hide names for the same key are
/// merged. Insertion order never affects the result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportSet {
    entries: BTreeMap<(String, Option<String>), BTreeSet<String>>,
}

impl ImportSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide `name` from `library`
    pub fn hide(&mut self, library: &str, name: &str) {
        self.entries
            .entry((library.to_string(), None))
            .or_default()
            .insert(name.to_string());
    }

    /// Import `library` under `alias`
    pub fn alias(&mut self, library: &str, alias: &str) {
        self.entries
            .entry((library.to_string(), Some(alias.to_string())))
            .or_default();
    }

    /// Add a directive
    pub fn add(&mut self, directive: ImportDirective) {
        self.entries
            .entry((directive.library, directive.alias))
            .or_default()
            .extend(directive.hide);
    }

    /// Merge another set into this one
    pub fn merge(&mut self, other: &ImportSet) {
        for ((library, alias), hide) in &other.entries {
            self.entries
                .entry((library.clone(), alias.clone()))
                .or_default()
                .extend(hide.iter().cloned());
        }
    }

    /// Directives ordered by library, plain import before aliased ones
    pub fn directives(&self) -> Vec<ImportDirective> {
        self.entries
            .iter()
            .map(|((library, alias), hide)| ImportDirective {
                library: library.clone(),
                alias: alias.clone(),
                hide: hide.clone(),
            })
            .collect()
    }

    /// Names hidden from `library` by its plain import
    pub fn hidden_from(&self, library: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(&(library.to_string(), None))
    }

    /// Check whether `library` is imported under `alias`
    pub fn has_alias(&self, library: &str, alias: &str) -> bool {
        self.entries
            .contains_key(&(library.to_string(), Some(alias.to_string())))
    }

    /// Number of directives
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether there are no directives
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ImportSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let directives = self.directives();
        let mut seq = serializer.serialize_seq(Some(directives.len()))?;
        for directive in &directives {
            seq.serialize_element(directive)?;
        }
        seq.end()
    }
}
