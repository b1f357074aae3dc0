//! Pipeline driver
//!
//! `Lowerer` validates the input, runs every pass group over every file, checks
//! the stage invariants between groups and runs the post-lowering checks. Errors
//! are collected across files; a file that fails is not lowered further, the
//! other files are.

use super::engine::{DeclarationEngine, ExpressionEngine, StatementEngine};
use super::stage::{check_expression_stage, check_statement_stage, FileStage};
use super::Pipeline;
use crate::checks::{check_implicit_interfaces, check_name_clashes};
use crate::config::LoweringOptions;
use crate::context::LoweringContext;
use crate::error::{LowerError, LowerResult};
use crate::transform::Transformation;
use rustc_hash::FxHashMap;
use serde::Serialize;
use strata_ir::validate::{check_resolved, dangling_symbols};
use strata_ir::{FileId, Program, Violation};
use tracing::{debug, info, warn};

/// Changes one pass made to one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassStat {
    /// Pass name
    pub name: &'static str,
    /// Number of transformations applied
    pub changes: usize,
}

/// Lowering summary of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// File ID
    pub file: FileId,
    /// File name
    pub name: String,
    /// Stage the file reached
    pub stage: FileStage,
    /// Per-pass change counts in run order
    pub passes: Vec<PassStat>,
}

impl FileReport {
    /// Total number of transformations applied to the file
    pub fn total_changes(&self) -> usize {
        self.passes.iter().map(|p| p.changes).sum()
    }
}

/// Summary of a successful lowering
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LoweringReport {
    /// One entry per file, in file order
    pub files: Vec<FileReport>,
}

impl LoweringReport {
    /// Report of a file
    pub fn file(&self, file: FileId) -> Option<&FileReport> {
        self.files.iter().find(|f| f.file == file)
    }

    /// Serialize the report as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Runs the lowering pipeline over a program
#[derive(Debug)]
pub struct Lowerer {
    options: LoweringOptions,
    pipeline: Pipeline,
}

impl Lowerer {
    /// Create a lowerer with the standard pipeline
    pub fn new(options: LoweringOptions) -> Self {
        Self {
            options,
            pipeline: Pipeline::standard(),
        }
    }

    /// Replace the pass pipeline
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Options in use
    pub fn options(&self) -> &LoweringOptions {
        &self.options
    }

    /// Lower every file of the program in place
    ///
    /// On error the program is left partially lowered and must not be emitted.
    pub fn lower(&self, program: &mut Program) -> Result<LoweringReport, Vec<LowerError>> {
        let mut errors = Vec::new();

        let mut rejected: Vec<FileId> = Vec::new();
        if self.options.verify {
            for (file, violations) in group_by_file(check_resolved(program)) {
                warn!(file = %file, count = violations.len(), "input violates the resolution contract");
                rejected.push(file);
                errors.push(LowerError::FrontEndContract { file, violations });
            }
        }

        let mut reports = Vec::new();
        for file in program.file_ids() {
            if rejected.contains(&file) {
                continue;
            }
            match self.lower_file(program, file) {
                Ok(report) => reports.push(report),
                Err(error) => {
                    warn!(file = %file, error = %error, "lowering failed");
                    errors.push(error);
                }
            }
        }

        if self.options.verify {
            for (file, symbol) in dangling_symbols(program) {
                errors.push(LowerError::DanglingSymbol { file, symbol });
            }
        }

        for report in &mut reports {
            match self.post_checks(program, report.file) {
                Ok(found) if found.is_empty() => report.stage = FileStage::Lowered,
                Ok(found) => errors.extend(found),
                Err(error) => errors.push(error),
            }
        }

        if errors.is_empty() && self.options.check_idempotence {
            errors.extend(self.check_idempotence(program));
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        info!(files = reports.len(), "lowering complete");
        Ok(LoweringReport { files: reports })
    }

    fn lower_file(&self, program: &mut Program, file: FileId) -> LowerResult<FileReport> {
        let name = program.file(file)?.name.clone();
        let mut ctx = LoweringContext::new(program, &self.options, file);
        let mut passes = Vec::new();
        debug!(file = %name, stage = %FileStage::NotLowered, "lowering file");

        for pass in &self.pipeline.file {
            let snapshot = ctx.program.file(file)?.clone();
            let changes = match pass.transform(&mut ctx, &snapshot)? {
                Transformation::NoChange => 0,
                Transformation::Replace(new) => {
                    *ctx.program.file_mut(file)? = new;
                    1
                }
                other => {
                    return Err(LowerError::PipelineOrdering {
                        pass: pass.name(),
                        file,
                        message: format!("a file pass cannot answer {}", other.kind()),
                    })
                }
            };
            debug!(file = %name, pass = pass.name(), changes, "file pass applied");
            passes.push(PassStat { name: pass.name(), changes });
        }
        debug!(file = %name, stage = %FileStage::FilePassesApplied, "stage reached");

        for pass in &self.pipeline.declaration {
            let changes = DeclarationEngine::new(&**pass).run(&mut ctx)?;
            debug!(file = %name, pass = pass.name(), changes, "declaration pass applied");
            passes.push(PassStat { name: pass.name(), changes });
        }
        debug!(file = %name, stage = %FileStage::DeclarationPassesApplied, "stage reached");

        for pass in &self.pipeline.statement {
            let changes = StatementEngine::new(&**pass).run(&mut ctx)?;
            debug!(file = %name, pass = pass.name(), changes, "statement pass applied");
            passes.push(PassStat { name: pass.name(), changes });
        }
        if !self.pipeline.statement.is_empty() {
            check_statement_stage(ctx.program, file)?;
        }
        debug!(file = %name, stage = %FileStage::StatementPassesApplied, "stage reached");

        for pass in &self.pipeline.expression {
            let changes = ExpressionEngine::new(&**pass).run(&mut ctx)?;
            debug!(file = %name, pass = pass.name(), changes, "expression pass applied");
            passes.push(PassStat { name: pass.name(), changes });
        }
        if !self.pipeline.expression.is_empty() {
            check_expression_stage(ctx.program, file)?;
        }
        debug!(file = %name, stage = %FileStage::ExpressionPassesApplied, "stage reached");

        Ok(FileReport {
            file,
            name,
            stage: FileStage::ExpressionPassesApplied,
            passes,
        })
    }

    fn post_checks(&self, program: &Program, file: FileId) -> LowerResult<Vec<LowerError>> {
        let mut found = check_name_clashes(program, file)?;
        found.extend(check_implicit_interfaces(program, file)?);
        Ok(found)
    }

    /// Lower a copy of the already-lowered program and report every pass that
    /// still finds something to change
    fn check_idempotence(&self, program: &Program) -> Vec<LowerError> {
        let mut again = program.clone();
        let mut errors = Vec::new();
        for file in again.file_ids() {
            match self.lower_file(&mut again, file) {
                Ok(report) => {
                    for pass in report.passes.iter().filter(|p| p.changes > 0) {
                        errors.push(LowerError::PipelineOrdering {
                            pass: pass.name,
                            file,
                            message: format!(
                                "pass made {} change(s) to already-lowered code",
                                pass.changes
                            ),
                        });
                    }
                }
                Err(error) => errors.push(error),
            }
        }
        if errors.is_empty() && again != *program {
            errors.push(LowerError::PipelineOrdering {
                pass: "idempotence",
                file: FileId::new(0),
                message: "lowering the output again changed the program".to_string(),
            });
        }
        errors
    }
}

fn group_by_file(violations: Vec<Violation>) -> Vec<(FileId, Vec<Violation>)> {
    let mut grouped: FxHashMap<FileId, Vec<Violation>> = FxHashMap::default();
    for violation in violations {
        grouped.entry(violation.file).or_default().push(violation);
    }
    let mut grouped: Vec<_> = grouped.into_iter().collect();
    grouped.sort_by_key(|(file, _)| *file);
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_ir::{Block, Container, Expr, IrType, Stmt};

    #[test]
    fn test_group_by_file_is_sorted() {
        let violation = |file: u32| Violation {
            file: FileId::new(file),
            symbol: strata_ir::DeclId::new(0),
            kind: strata_ir::ViolationKind::UnboundReference,
            message: String::new(),
        };
        let grouped = group_by_file(vec![violation(2), violation(0), violation(2)]);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].0, FileId::new(0));
        assert_eq!(grouped[1].1.len(), 2);
    }

    #[test]
    fn test_empty_pipeline_reaches_lowered() {
        let mut program = Program::new();
        let file = program.add_file("a.kt", "app");
        let f = program
            .add_function(Container::File(file), "f", IrType::int())
            .unwrap();
        program
            .set_body(f, Block::new(vec![Stmt::Expr(Expr::ret(f, Some(Expr::int(1))))]))
            .unwrap();

        let report = Lowerer::new(LoweringOptions::default())
            .with_pipeline(Pipeline::empty())
            .lower(&mut program)
            .unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].stage, FileStage::Lowered);
        assert_eq!(report.files[0].total_changes(), 0);
    }

    #[test]
    fn test_contract_violation_rejects_file() {
        let mut program = Program::new();
        let file = program.add_file("a.kt", "app");
        let f = program
            .add_function(Container::File(file), "f", IrType::Void)
            .unwrap();
        let missing = strata_ir::DeclId::new(99);
        program
            .set_body(f, Block::new(vec![Stmt::Expr(Expr::call(missing, vec![], IrType::Void))]))
            .unwrap();

        let errors = Lowerer::new(LoweringOptions::default()).lower(&mut program).unwrap_err();
        assert!(matches!(errors[0], LowerError::FrontEndContract { .. }));
    }
}
