//! IR errors

use crate::symbol::{DeclId, FileId};
use thiserror::Error;

/// Result type for arena and graph operations
pub type IrResult<T> = Result<T, IrError>;

/// Errors raised by declaration-graph operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IrError {
    /// A symbol does not resolve to a live declaration
    #[error("Unbound symbol {symbol}")]
    UnboundSymbol {
        /// The symbol that failed to resolve
        symbol: DeclId,
    },

    /// A file ID is out of range
    #[error("Unknown file {file}")]
    UnknownFile {
        /// The missing file
        file: FileId,
    },

    /// A declaration was expected to own a member list
    #[error("Declaration {symbol} ('{name}') cannot contain members")]
    NotAContainer {
        /// The declaration
        symbol: DeclId,
        /// Its name
        name: String,
    },

    /// A declaration has the wrong kind for the requested operation
    #[error("Declaration {symbol} ('{name}') is not a {expected}")]
    WrongKind {
        /// The declaration
        symbol: DeclId,
        /// Its name
        name: String,
        /// The expected kind
        expected: &'static str,
    },

    /// A declaration already has an owner
    #[error("Declaration {symbol} ('{name}') is already attached")]
    AlreadyAttached {
        /// The declaration
        symbol: DeclId,
        /// Its name
        name: String,
    },
}
