//! Strata lowering pipeline
//!
//! Rewrites a resolved `strata_ir::Program` until every construct has a direct
//! counterpart in the target language, so the emitter only has to print.
//!
//! # Architecture
//!
//! ```text
//! Program ──▶ validate ──▶ per file: file passes ──▶ declaration passes
//!                                 ──▶ statement passes ──▶ expression passes
//!         ──▶ post checks (dangling symbols, name clashes, implicit interfaces)
//! ```
//!
//! A pass never edits the tree it is handed beyond the node it answers for; it
//! returns a [`Transformation`] and the pipeline splices it in, offering the
//! result to the same pass once more.
//!
//! # Example
//!
//! ```text
//! let lowerer = Lowerer::new(LoweringOptions::default());
//! let report = lowerer.lower(&mut program)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod checks;
pub mod config;
pub mod context;
pub mod diagnostic;
pub mod error;
pub mod lowerings;
pub mod pipeline;
pub mod transform;

pub use config::{ConfigError, LoweringOptions};
pub use context::{LoweringContext, Position, Scope};
pub use diagnostic::Diagnostic;
pub use error::{ClashSite, LowerError, LowerResult};
pub use pipeline::{FileReport, FileStage, Lowerer, LoweringReport, PassStat, Pipeline};
pub use transform::{
    DeclarationLowering, ExpressionLowering, FileLowering, StatementLowering, Transformation, TraversalOrder,
};
