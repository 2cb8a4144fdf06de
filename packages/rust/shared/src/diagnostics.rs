//! Lint findings collected across a run.
//!
//! Errors ([`StructureError`], [`BrokenLinkError`]) decide the exit code;
//! warnings are informational unless the caller denies them.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::types::ManifestField;

/// How a finding affects the run outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Stable kind tag used for summaries and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    StructureError,
    BrokenLink,
    FrontMatterMismatch,
    CountMismatch,
    Placeholder,
}

impl DiagnosticKind {
    /// All kinds, in report order.
    pub const ALL: [DiagnosticKind; 5] = [
        Self::StructureError,
        Self::BrokenLink,
        Self::FrontMatterMismatch,
        Self::CountMismatch,
        Self::Placeholder,
    ];

    pub fn severity(self) -> Severity {
        match self {
            Self::StructureError | Self::BrokenLink => Severity::Error,
            _ => Severity::Warning,
        }
    }

    /// Label used in text reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::StructureError => "StructureError",
            Self::BrokenLink => "BrokenLinkError",
            Self::FrontMatterMismatch => "FrontMatterWarning",
            Self::CountMismatch => "CountMismatchWarning",
            Self::Placeholder => "PlaceholderWarning",
        }
    }
}

// ---------------------------------------------------------------------------
// Per-kind records
// ---------------------------------------------------------------------------

/// A lesson file without usable front-matter. The file is skipped.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{}: {reason}", .path.display())]
pub struct StructureError {
    pub path: PathBuf,
    pub reason: String,
}

/// A relative markdown link whose target does not exist.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{}:{line}: link target '{target}' does not exist", .file.display())]
pub struct BrokenLinkError {
    /// File containing the link.
    pub file: PathBuf,
    /// 1-based line of the link.
    pub line: usize,
    /// Link target as written.
    pub target: String,
    /// Where the target was resolved to.
    pub resolved: PathBuf,
}

/// What is wrong with a lesson's front-matter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum FrontMatterIssue {
    MissingField { field: String },
    EmptyField { field: String },
    NotAString { field: String },
    CourseMismatch { declared: String, expected: String },
    DuplicateLesson { source_lesson: String, first: PathBuf },
}

impl std::fmt::Display for FrontMatterIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "missing required field `{field}`"),
            Self::EmptyField { field } => write!(f, "required field `{field}` is empty"),
            Self::NotAString { field } => write!(f, "field `{field}` is not a string"),
            Self::CourseMismatch { declared, expected } => write!(
                f,
                "source_course '{declared}' does not match course directory '{expected}'"
            ),
            Self::DuplicateLesson {
                source_lesson,
                first,
            } => write!(
                f,
                "source_lesson '{source_lesson}' already used by {}",
                first.display()
            ),
        }
    }
}

/// A front-matter inconsistency in one lesson.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontMatterWarning {
    pub path: PathBuf,
    #[serde(flatten)]
    pub issue: FrontMatterIssue,
}

/// Whether a count comparison concerns a section or a whole course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountScope {
    Section,
    Course,
}

/// A README-declared lesson count that disagrees with the files present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountMismatchWarning {
    pub readme: PathBuf,
    pub scope: CountScope,
    pub declared: u32,
    pub actual: usize,
}

/// A README field rendered as the literal text `undefined`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceholderWarning {
    pub readme: PathBuf,
    pub field: ManifestField,
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// One finding, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    Structure(StructureError),
    BrokenLink(BrokenLinkError),
    FrontMatter(FrontMatterWarning),
    CountMismatch(CountMismatchWarning),
    Placeholder(PlaceholderWarning),
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::Structure(_) => DiagnosticKind::StructureError,
            Self::BrokenLink(_) => DiagnosticKind::BrokenLink,
            Self::FrontMatter(_) => DiagnosticKind::FrontMatterMismatch,
            Self::CountMismatch(_) => DiagnosticKind::CountMismatch,
            Self::Placeholder(_) => DiagnosticKind::Placeholder,
        }
    }

    pub fn severity(&self) -> Severity {
        self.kind().severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    /// The file the finding is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::Structure(e) => &e.path,
            Self::BrokenLink(e) => &e.file,
            Self::FrontMatter(w) => &w.path,
            Self::CountMismatch(w) => &w.readme,
            Self::Placeholder(w) => &w.readme,
        }
    }

    /// Line number, where one is known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::BrokenLink(e) => Some(e.line),
            _ => None,
        }
    }

    /// Human-readable message without the path prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Structure(e) => e.reason.clone(),
            Self::BrokenLink(e) => format!("link target '{}' does not exist", e.target),
            Self::FrontMatter(w) => w.issue.to_string(),
            Self::CountMismatch(w) => {
                let scope = match w.scope {
                    CountScope::Section => "section",
                    CountScope::Course => "course",
                };
                format!(
                    "{scope} README declares {} lessons but {} lesson files exist",
                    w.declared, w.actual
                )
            }
            Self::Placeholder(w) => format!("{} is the literal text 'undefined'", w.field),
        }
    }

    /// Ordering key: path, line, then kind.
    pub fn sort_key(&self) -> (PathBuf, usize, DiagnosticKind) {
        (
            self.path().to_path_buf(),
            self.line().unwrap_or(0),
            self.kind(),
        )
    }
}

impl From<StructureError> for Diagnostic {
    fn from(e: StructureError) -> Self {
        Self::Structure(e)
    }
}

impl From<BrokenLinkError> for Diagnostic {
    fn from(e: BrokenLinkError) -> Self {
        Self::BrokenLink(e)
    }
}

impl From<FrontMatterWarning> for Diagnostic {
    fn from(w: FrontMatterWarning) -> Self {
        Self::FrontMatter(w)
    }
}

impl From<CountMismatchWarning> for Diagnostic {
    fn from(w: CountMismatchWarning) -> Self {
        Self::CountMismatch(w)
    }
}

impl From<PlaceholderWarning> for Diagnostic {
    fn from(w: PlaceholderWarning) -> Self {
        Self::Placeholder(w)
    }
}
