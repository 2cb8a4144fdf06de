//! End-to-end lint pipeline: load → validate → check links → aggregate → report.

use std::fmt;
use std::path::Path;
use std::time::Instant;

use tracing::{info, instrument};

use corpuslint_loader::Loader;
use corpuslint_shared::{LintConfig, Result};

use crate::aggregator::{aggregate, tally_findings};
use crate::links::check_links;
use crate::report::LintReport;
use crate::validator::validate;

/// Pipeline stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loading,
    Validating,
    LinkChecking,
    Aggregating,
    Reporting,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Loading,
        Stage::Validating,
        Stage::LinkChecking,
        Stage::Aggregating,
        Stage::Reporting,
    ];

    /// Short description shown by progress reporters.
    pub fn description(self) -> &'static str {
        match self {
            Stage::Loading => "Loading corpus",
            Stage::Validating => "Validating front-matter",
            Stage::LinkChecking => "Checking links",
            Stage::Aggregating => "Aggregating manifests",
            Stage::Reporting => "Building report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new stage.
    fn phase(&self, stage: Stage);
    /// Called once the report is built.
    fn done(&self, report: &LintReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _stage: Stage) {}
    fn done(&self, _report: &LintReport) {}
}

/// Run every stage over the corpus at `root`.
///
/// Returns `Err` only when the corpus cannot be loaded at all; every finding
/// about its content ends up in the report.
#[instrument(skip_all, fields(root = %root.display()))]
pub async fn run_lint(
    root: &Path,
    config: &LintConfig,
    progress: &dyn ProgressReporter,
) -> Result<LintReport> {
    let start = Instant::now();
    info!("starting lint pipeline");

    progress.phase(Stage::Loading);
    let loaded = Loader::new(config.loader.clone()).load(root).await?;
    let corpus = loaded.corpus;
    let mut diagnostics = loaded.diagnostics;

    progress.phase(Stage::Validating);
    diagnostics.extend(validate(&corpus, &config.validator));

    progress.phase(Stage::LinkChecking);
    diagnostics.extend(check_links(&corpus, &config.links));

    progress.phase(Stage::Aggregating);
    let mut aggregation = aggregate(&corpus);
    diagnostics.append(&mut aggregation.diagnostics);
    tally_findings(&mut aggregation.courses, &diagnostics);

    progress.phase(Stage::Reporting);
    let report = LintReport::new(
        corpus.root,
        aggregation.courses,
        diagnostics,
        loaded.files_read,
    );

    progress.done(&report);

    info!(
        courses = report.summary.courses,
        lessons = report.summary.lessons,
        errors = report.summary.errors,
        warnings = report.summary.warnings,
        elapsed_ms = start.elapsed().as_millis(),
        "lint pipeline complete"
    );

    Ok(report)
}
