//! Lint report model and rendering.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use corpuslint_shared::{CorpusLintError, Diagnostic, DiagnosticKind, ReportFormat, Result, Severity};

use crate::aggregator::CourseManifest;

/// Exit code for a clean run.
pub const EXIT_OK: i32 = 0;
/// Exit code when errors (or denied warnings) were recorded.
pub const EXIT_FAILURE: i32 = 1;

/// Counts shown at the top of every report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub courses: usize,
    pub sections: usize,
    pub lessons: usize,
    pub files_read: usize,
    pub errors: usize,
    pub warnings: usize,
    /// Findings per kind; every kind is present, zero or not.
    pub by_kind: BTreeMap<DiagnosticKind, usize>,
}

/// The complete result of a lint run.
#[derive(Debug, Clone, Serialize)]
pub struct LintReport {
    pub root: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub summary: Summary,
    pub courses: Vec<CourseManifest>,
    /// Sorted by path, line, then kind.
    pub diagnostics: Vec<Diagnostic>,
}

impl LintReport {
    /// Build a report, sorting diagnostics deterministically.
    pub fn new(
        root: PathBuf,
        courses: Vec<CourseManifest>,
        mut diagnostics: Vec<Diagnostic>,
        files_read: usize,
    ) -> Self {
        diagnostics.sort_by_key(Diagnostic::sort_key);

        let mut by_kind: BTreeMap<DiagnosticKind, usize> =
            DiagnosticKind::ALL.iter().map(|k| (*k, 0)).collect();
        for d in &diagnostics {
            *by_kind.entry(d.kind()).or_default() += 1;
        }

        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        let summary = Summary {
            courses: courses.len(),
            sections: courses.iter().map(|c| c.sections.len()).sum(),
            lessons: courses.iter().map(|c| c.total_lessons).sum(),
            files_read,
            errors,
            warnings: diagnostics.len() - errors,
            by_kind,
        };

        Self {
            root,
            generated_at: Utc::now(),
            summary,
            courses,
            diagnostics,
        }
    }

    /// Findings that decide the exit code.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// `0` when no errors were recorded, `1` otherwise. Warnings count only
    /// when `deny_warnings` is set.
    pub fn exit_code(&self, deny_warnings: bool) -> i32 {
        let failing = if deny_warnings {
            self.diagnostics.len()
        } else {
            self.summary.errors
        };
        if failing == 0 { EXIT_OK } else { EXIT_FAILURE }
    }

    /// Render in the requested format.
    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Json => self.render_json(),
        }
    }

    /// Pretty-printed JSON.
    pub fn render_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CorpusLintError::parse(format!("failed to serialize report: {e}")))
    }

    /// Plain-text report: summary, per-course table, findings grouped by course.
    pub fn render_text(&self) -> String {
        let s = &self.summary;
        let mut out = format!("corpuslint report for {}\n", self.root.display());
        out.push_str(&format!(
            "  {} courses, {} sections, {} lessons ({} files read)\n\n",
            s.courses, s.sections, s.lessons, s.files_read
        ));

        out.push_str("Summary\n");
        for (kind, count) in &s.by_kind {
            out.push_str(&format!("  {:<22} {count}\n", kind.label()));
        }
        out.push_str(&format!("  {:<22} {}\n", "errors", s.errors));
        out.push_str(&format!("  {:<22} {}\n", "warnings", s.warnings));

        if !self.courses.is_empty() {
            out.push_str("\nCourses\n");
            for course in &self.courses {
                out.push_str(&self.course_summary(course));
            }
        }

        if !self.diagnostics.is_empty() {
            out.push_str("\nDiagnostics\n");
            let mut attributed = vec![false; self.diagnostics.len()];
            for course in &self.courses {
                let entries: Vec<usize> = self
                    .diagnostics
                    .iter()
                    .enumerate()
                    .filter(|(i, d)| !attributed[*i] && d.path().starts_with(&course.path))
                    .map(|(i, _)| i)
                    .collect();
                if entries.is_empty() {
                    continue;
                }
                out.push_str(&format!("  {}\n", course.slug));
                for i in entries {
                    attributed[i] = true;
                    out.push_str(&self.diagnostic_line(&self.diagnostics[i]));
                }
            }

            let rest: Vec<&Diagnostic> = self
                .diagnostics
                .iter()
                .zip(&attributed)
                .filter(|(_, done)| !**done)
                .map(|(d, _)| d)
                .collect();
            if !rest.is_empty() {
                out.push_str("  (outside any course)\n");
                for d in rest {
                    out.push_str(&self.diagnostic_line(d));
                }
            }
        }

        out
    }

    fn diagnostic_line(&self, d: &Diagnostic) -> String {
        let severity = match d.severity() {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        let location = match d.line() {
            Some(line) => format!("{}:{line}", self.display_path(d.path())),
            None => self.display_path(d.path()),
        };
        format!(
            "    {severity:<7} {location}  {}: {}\n",
            d.kind().label(),
            d.message()
        )
    }

    fn course_summary(&self, course: &CourseManifest) -> String {
        let declared = course
            .declared_lessons
            .map(|d| format!(" (declared {d})"))
            .unwrap_or_default();
        let challenges = course
            .declared_challenges
            .map(|c| format!(", {c} challenges"))
            .unwrap_or_default();
        let title = course
            .title
            .as_deref()
            .map(|t| format!(" - {t}"))
            .unwrap_or_default();

        let mut out = format!(
            "  {}{title}: {} lessons{declared}{challenges}, {} resource links\n",
            course.slug, course.total_lessons, course.resource_links
        );
        out.push_str(&format!(
            "    broken links: {}, front-matter mismatches: {}, structure errors: {}\n",
            course.count(DiagnosticKind::BrokenLink),
            course.count(DiagnosticKind::FrontMatterMismatch),
            course.count(DiagnosticKind::StructureError),
        ));

        for section in &course.sections {
            let declared = section
                .declared_lessons
                .map(|d| d.to_string())
                .unwrap_or_else(|| "?".into());
            let marker = if section.is_mismatched() { "  mismatch" } else { "" };
            out.push_str(&format!(
                "    {:<32} {}/{declared}{marker}\n",
                section.dir_name, section.actual_lessons
            ));
        }
        out
    }

    fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use corpuslint_shared::{BrokenLinkError, CountMismatchWarning, CountScope, StructureError};

    use crate::aggregator::SectionManifest;

    fn broken(file: &str, line: usize) -> Diagnostic {
        BrokenLinkError {
            file: PathBuf::from(file),
            line,
            target: "./gone.md".into(),
            resolved: PathBuf::from("/corpus/gone.md"),
        }
        .into()
    }

    fn mismatch() -> Diagnostic {
        CountMismatchWarning {
            readme: PathBuf::from("/corpus/php/01-basics/README.md"),
            scope: CountScope::Section,
            declared: 5,
            actual: 4,
        }
        .into()
    }

    fn course() -> CourseManifest {
        CourseManifest {
            slug: "php".into(),
            path: PathBuf::from("/corpus/php"),
            title: Some("PHP Fundamentals".into()),
            description: None,
            sections: vec![SectionManifest {
                dir_name: "01-basics".into(),
                number: Some(1),
                title: None,
                icon: None,
                readme: None,
                declared_lessons: Some(5),
                actual_lessons: 4,
                declared_challenges: None,
            }],
            course_level_lessons: 0,
            total_lessons: 4,
            declared_lessons: None,
            declared_challenges: None,
            resource_links: 2,
            distinct_resource_links: 2,
            findings: [(DiagnosticKind::BrokenLink, 1), (DiagnosticKind::CountMismatch, 1)]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn empty_report_exits_zero() {
        let report = LintReport::new(PathBuf::from("/corpus"), vec![], vec![], 0);
        assert_eq!(report.exit_code(false), EXIT_OK);
        assert_eq!(report.exit_code(true), EXIT_OK);
        assert!(report.diagnostics.is_empty());
        assert_eq!(report.summary.by_kind.len(), DiagnosticKind::ALL.len());
    }

    #[test]
    fn warnings_only_fail_when_denied() {
        let report = LintReport::new(PathBuf::from("/corpus"), vec![course()], vec![mismatch()], 5);
        assert_eq!(report.summary.warnings, 1);
        assert_eq!(report.exit_code(false), EXIT_OK);
        assert_eq!(report.exit_code(true), EXIT_FAILURE);
    }

    #[test]
    fn errors_fail_and_are_sorted() {
        let structure: Diagnostic = StructureError {
            path: PathBuf::from("/corpus/php/01-basics/a.md"),
            reason: "missing front-matter".into(),
        }
        .into();
        let report = LintReport::new(
            PathBuf::from("/corpus"),
            vec![],
            vec![
                broken("/corpus/php/01-basics/b.md", 9),
                broken("/corpus/php/01-basics/b.md", 3),
                structure,
            ],
            3,
        );

        assert_eq!(report.exit_code(false), EXIT_FAILURE);
        assert_eq!(report.errors().count(), 3);
        let order: Vec<_> = report
            .diagnostics
            .iter()
            .map(|d| (d.path().to_path_buf(), d.line()))
            .collect();
        assert_eq!(
            order,
            vec![
                (PathBuf::from("/corpus/php/01-basics/a.md"), None),
                (PathBuf::from("/corpus/php/01-basics/b.md"), Some(3)),
                (PathBuf::from("/corpus/php/01-basics/b.md"), Some(9)),
            ]
        );
        assert_eq!(report.summary.by_kind[&DiagnosticKind::BrokenLink], 2);
        assert!(report.render_text().contains("(outside any course)"));
        assert_eq!(report.summary.by_kind[&DiagnosticKind::StructureError], 1);
    }

    #[test]
    fn text_report_lists_counts_and_relative_paths() {
        let report = LintReport::new(
            PathBuf::from("/corpus"),
            vec![course()],
            vec![mismatch(), broken("/corpus/php/01-basics/b.md", 3)],
            5,
        );
        let text = report.render_text();

        assert!(text.contains("BrokenLinkError        1"));
        assert!(text.contains("CountMismatchWarning   1"));
        assert!(text.contains("php - PHP Fundamentals: 4 lessons"));
        assert!(text.contains("4/5  mismatch"));
        assert!(text.contains("broken links: 1, front-matter mismatches: 0, structure errors: 0"));
        assert!(text.contains("  php\n    warning php/01-basics/README.md  CountMismatchWarning"));
        assert!(text.contains("    error   php/01-basics/b.md:3  BrokenLinkError"));
        assert!(!text.contains("outside any course"));
    }

    #[test]
    fn json_report_shape() {
        let report = LintReport::new(PathBuf::from("/corpus"), vec![course()], vec![mismatch()], 5);
        let json = report.render(ReportFormat::Json).expect("render json");
        let v: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(v["summary"]["warnings"], 1);
        assert_eq!(v["summary"]["by_kind"]["count_mismatch"], 1);
        assert_eq!(v["courses"][0]["sections"][0]["actual_lessons"], 4);
        assert_eq!(v["courses"][0]["findings"]["broken_link"], 1);
        assert_eq!(v["diagnostics"][0]["kind"], "count_mismatch");
        assert_eq!(v["diagnostics"][0]["declared"], 5);
    }
}
