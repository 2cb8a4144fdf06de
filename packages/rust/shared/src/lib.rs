//! Shared types, error model, and configuration for corpuslint.
//!
//! This crate is the foundation depended on by all other corpuslint crates.
//! It provides:
//! - [`CorpusLintError`], the unified error type for fatal failures
//! - Corpus tree types ([`Corpus`], [`Course`], [`Section`], [`Lesson`])
//! - Lint findings ([`Diagnostic`] and its per-kind records)
//! - Configuration ([`LintConfig`], config discovery and loading)

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    CONFIG_FILE_NAME, LinksConfig, LintConfig, LoaderConfig, ReportConfig, ReportFormat,
    ValidatorConfig, load_config_from, resolve_config, user_config_path,
};
pub use diagnostics::{
    BrokenLinkError, CountMismatchWarning, CountScope, Diagnostic, DiagnosticKind,
    FrontMatterIssue, FrontMatterWarning, PlaceholderWarning, Severity, StructureError,
};
pub use error::{CorpusLintError, Result};
pub use types::{
    Corpus, Course, FieldValue, FrontMatter, Lesson, Manifest, ManifestField, Section,
    README_FILE_NAME,
};
