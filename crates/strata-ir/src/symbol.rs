//! Symbols and source positions
//!
//! A `DeclId` is the stable identity of a declaration. It indexes the declaration
//! arena directly, so resolving a symbol never searches the tree.

use serde::Serialize;
use std::fmt;

/// Stable symbol of a declaration (index into the `Program` arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclId(pub u32);

impl DeclId {
    /// Symbol used by declarations that have not been allocated yet
    pub const UNALLOCATED: DeclId = DeclId(u32::MAX);

    /// Create a new symbol
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Identifier of a compilation file within a `Program`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a new file ID
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file{}", self.0)
    }
}

/// Byte offsets of a node in its source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    /// Start offset (inclusive)
    pub start: u32,
    /// End offset (exclusive)
    pub end: u32,
}

impl Span {
    /// Create a new span
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Check whether this is the default (unknown) span
    pub fn is_unknown(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}
