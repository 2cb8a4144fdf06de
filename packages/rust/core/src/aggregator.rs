//! Per-course manifests and README count comparison.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, instrument};

use corpuslint_shared::{
    Corpus, CountMismatchWarning, CountScope, Course, Diagnostic, DiagnosticKind, Section,
};

/// Declared vs. actual numbers for one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionManifest {
    pub dir_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<PathBuf>,
    pub declared_lessons: Option<u32>,
    pub actual_lessons: usize,
    pub declared_challenges: Option<u32>,
}

impl SectionManifest {
    /// Whether a declared count exists and disagrees with the files present.
    pub fn is_mismatched(&self) -> bool {
        self.declared_lessons
            .is_some_and(|d| usize::try_from(d).ok() != Some(self.actual_lessons))
    }
}

/// Summary of one course.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseManifest {
    pub slug: String,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sections: Vec<SectionManifest>,
    /// Lesson files directly in the course directory.
    pub course_level_lessons: usize,
    /// All lesson files in the course.
    pub total_lessons: usize,
    /// Total from the course README.
    pub declared_lessons: Option<u32>,
    /// Course README total, or the sum of section declarations.
    pub declared_challenges: Option<u32>,
    pub resource_links: usize,
    pub distinct_resource_links: usize,
    /// Findings about files in this course, per kind.
    pub findings: BTreeMap<DiagnosticKind, usize>,
}

impl CourseManifest {
    /// Number of findings of one kind in this course.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.findings.get(&kind).copied().unwrap_or_default()
    }
}

/// Aggregator output: manifests plus count warnings.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub courses: Vec<CourseManifest>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build course manifests and compare declared counts with the files present.
#[instrument(skip_all, fields(courses = corpus.courses.len()))]
pub fn aggregate(corpus: &Corpus) -> Aggregation {
    let mut aggregation = Aggregation::default();

    for course in &corpus.courses {
        let manifest = course_manifest(course);

        for (section, summary) in course.sections.iter().zip(&manifest.sections) {
            if let Some(w) = section_mismatch(section, summary) {
                aggregation.diagnostics.push(w.into());
            }
        }

        if let (Some(readme), Some(declared)) = (&course.manifest, manifest.declared_lessons) {
            if usize::try_from(declared).ok() != Some(manifest.total_lessons) {
                aggregation.diagnostics.push(
                    CountMismatchWarning {
                        readme: readme.path.clone(),
                        scope: CountScope::Course,
                        declared,
                        actual: manifest.total_lessons,
                    }
                    .into(),
                );
            }
        }

        aggregation.courses.push(manifest);
    }

    debug!(
        mismatches = aggregation.diagnostics.len(),
        "aggregation complete"
    );
    aggregation
}

/// Attribute every diagnostic to the course whose directory contains it.
pub fn tally_findings(courses: &mut [CourseManifest], diagnostics: &[Diagnostic]) {
    for course in courses.iter_mut() {
        course.findings = DiagnosticKind::ALL.iter().map(|k| (*k, 0)).collect();
    }
    for d in diagnostics {
        if let Some(course) = courses.iter_mut().find(|c| d.path().starts_with(&c.path)) {
            *course.findings.entry(d.kind()).or_default() += 1;
        }
    }
}

fn section_mismatch(section: &Section, summary: &SectionManifest) -> Option<CountMismatchWarning> {
    if !summary.is_mismatched() {
        return None;
    }
    let readme = section.manifest.as_ref()?;
    Some(CountMismatchWarning {
        readme: readme.path.clone(),
        scope: CountScope::Section,
        declared: summary.declared_lessons?,
        actual: summary.actual_lessons,
    })
}

fn section_manifest(section: &Section) -> SectionManifest {
    let readme = section.manifest.as_ref();
    SectionManifest {
        dir_name: section.dir_name.clone(),
        number: section.number,
        title: readme.and_then(|m| m.title.clone()),
        icon: readme.and_then(|m| m.icon.clone()),
        readme: readme.map(|m| m.path.clone()),
        declared_lessons: readme.and_then(|m| m.declared_lessons),
        actual_lessons: section.lesson_file_count(),
        declared_challenges: readme.and_then(|m| m.declared_challenges),
    }
}

fn course_manifest(course: &Course) -> CourseManifest {
    let readme = course.manifest.as_ref();
    let sections: Vec<SectionManifest> = course.sections.iter().map(section_manifest).collect();

    let section_challenges = sections
        .iter()
        .filter_map(|s| s.declared_challenges)
        .reduce(|a, b| a.saturating_add(b));

    let links: Vec<&str> = course
        .all_lessons()
        .flat_map(|l| l.resource_links.iter().map(String::as_str))
        .collect();
    let distinct: HashSet<&str> = links.iter().copied().collect();

    CourseManifest {
        slug: course.slug.clone(),
        path: course.path.clone(),
        title: readme.and_then(|m| m.title.clone()),
        description: readme.and_then(|m| m.description.clone()),
        course_level_lessons: course.lessons.len() + course.rejected.len(),
        total_lessons: course.lesson_file_count(),
        declared_lessons: readme.and_then(|m| m.declared_lessons),
        declared_challenges: readme
            .and_then(|m| m.declared_challenges)
            .or(section_challenges),
        resource_links: links.len(),
        distinct_resource_links: distinct.len(),
        findings: BTreeMap::new(),
        sections,
    }
}
