//! Front-matter validation.
//!
//! Every finding here is a warning: the corpus is known to carry
//! inconsistent metadata, and a lint run should describe it, not stop on it.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, instrument};

use corpuslint_shared::{
    Corpus, Course, Diagnostic, FieldValue, FrontMatterIssue, FrontMatterWarning, Lesson,
    PlaceholderWarning, ValidatorConfig,
};

/// Check required fields, course slugs, duplicate lesson slugs, and README
/// placeholders across the corpus.
#[instrument(skip_all, fields(courses = corpus.courses.len()))]
pub fn validate(corpus: &Corpus, config: &ValidatorConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for course in &corpus.courses {
        for lesson in course.all_lessons() {
            diagnostics.extend(validate_lesson(course, lesson, config));
        }
        diagnostics.extend(duplicate_lessons(course));
        diagnostics.extend(placeholders(course));
    }

    debug!(findings = diagnostics.len(), "validation complete");
    diagnostics
}

/// Field and slug checks for a single lesson.
pub fn validate_lesson(course: &Course, lesson: &Lesson, config: &ValidatorConfig) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let fm = &lesson.front_matter;

    for field in &config.required_fields {
        let issue = match fm.field(field) {
            FieldValue::Missing => FrontMatterIssue::MissingField {
                field: field.clone(),
            },
            FieldValue::NotAString => FrontMatterIssue::NotAString {
                field: field.clone(),
            },
            FieldValue::Text(s) if s.trim().is_empty() => FrontMatterIssue::EmptyField {
                field: field.clone(),
            },
            FieldValue::Text(_) => continue,
        };
        out.push(warning(&lesson.path, issue));
    }

    if let Some(declared) = fm.source_course().map(str::trim) {
        if !declared.is_empty() && declared != course.slug {
            out.push(warning(
                &lesson.path,
                FrontMatterIssue::CourseMismatch {
                    declared: declared.to_string(),
                    expected: course.slug.clone(),
                },
            ));
        }
    }

    out
}

/// Lessons in one course sharing a `source_lesson` value.
fn duplicate_lessons(course: &Course) -> Vec<Diagnostic> {
    let mut first_seen: HashMap<&str, &Path> = HashMap::new();
    let mut out = Vec::new();

    for lesson in course.all_lessons() {
        let Some(slug) = lesson.front_matter.source_lesson().map(str::trim) else {
            continue;
        };
        if slug.is_empty() {
            continue;
        }
        match first_seen.get(slug) {
            Some(first) => out.push(warning(
                &lesson.path,
                FrontMatterIssue::DuplicateLesson {
                    source_lesson: slug.to_string(),
                    first: first.to_path_buf(),
                },
            )),
            None => {
                first_seen.insert(slug, &lesson.path);
            }
        }
    }

    out
}

fn placeholders(course: &Course) -> impl Iterator<Item = Diagnostic> + '_ {
    course.manifests().flat_map(|m| {
        m.placeholders.iter().map(move |field| {
            Diagnostic::from(PlaceholderWarning {
                readme: m.path.clone(),
                field: *field,
            })
        })
    })
}

fn warning(path: &Path, issue: FrontMatterIssue) -> Diagnostic {
    FrontMatterWarning {
        path: path.to_path_buf(),
        issue,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use corpuslint_shared::{DiagnosticKind, FrontMatter, Manifest, ManifestField, Section};

    fn lesson(path: &str, course: Option<&str>, slug: Option<&str>) -> Lesson {
        let mut front_matter = FrontMatter::default();
        if let Some(course) = course {
            front_matter.fields.insert("source_course".into(), course.into());
        }
        if let Some(slug) = slug {
            front_matter.fields.insert("source_lesson".into(), slug.into());
        }
        Lesson {
            path: PathBuf::from(path),
            front_matter,
            title: None,
            body: String::new(),
            body_start_line: 1,
            resource_links: vec![],
        }
    }

    fn course(slug: &str, lessons: Vec<Lesson>) -> Course {
        Course {
            slug: slug.into(),
            path: PathBuf::from(slug),
            manifest: None,
            sections: vec![Section {
                dir_name: "01-intro".into(),
                path: PathBuf::from(slug).join("01-intro"),
                number: Some(1),
                manifest: None,
                lessons,
                rejected: vec![],
            }],
            lessons: vec![],
            rejected: vec![],
        }
    }

    fn corpus(courses: Vec<Course>) -> Corpus {
        Corpus {
            root: PathBuf::from("."),
            courses,
        }
    }

    #[test]
    fn consistent_lessons_produce_nothing() {
        let c = corpus(vec![course(
            "ruby-basics",
            vec![
                lesson("a.md", Some("ruby-basics"), Some("ruby-basics-a")),
                lesson("b.md", Some("ruby-basics"), Some("ruby-basics-b")),
            ],
        )]);
        assert!(validate(&c, &ValidatorConfig::default()).is_empty());
    }

    #[test]
    fn course_mismatch_emits_exactly_one_warning() {
        let c = corpus(vec![course("y", vec![lesson("y/01-intro/a.md", Some("x"), Some("a"))])]);
        let diags = validate(&c, &ValidatorConfig::default());

        assert_eq!(diags.len(), 1);
        let Diagnostic::FrontMatter(w) = &diags[0] else {
            panic!("expected front-matter warning, got {:?}", diags[0]);
        };
        assert_eq!(
            w.issue,
            FrontMatterIssue::CourseMismatch {
                declared: "x".into(),
                expected: "y".into(),
            }
        );
        assert!(!diags[0].is_error());
    }

    #[test]
    fn missing_and_empty_fields() {
        let c = corpus(vec![course(
            "nestjs",
            vec![lesson("a.md", None, Some("  "))],
        )]);
        let diags = validate(&c, &ValidatorConfig::default());
        let issues: Vec<_> = diags
            .iter()
            .map(|d| match d {
                Diagnostic::FrontMatter(w) => w.issue.clone(),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            issues,
            vec![
                FrontMatterIssue::MissingField {
                    field: "source_course".into()
                },
                FrontMatterIssue::EmptyField {
                    field: "source_lesson".into()
                },
            ]
        );
    }

    #[test]
    fn custom_required_fields_use_extra_keys() {
        let mut l = lesson("a.md", Some("vue"), Some("vue-a"));
        l.front_matter
            .fields
            .insert("order".into(), serde_json::json!(1));
        let c = corpus(vec![course("vue", vec![l])]);
        let config = ValidatorConfig {
            required_fields: vec!["order".into(), "author".into()],
        };

        let diags = validate(&c, &config);
        assert_eq!(diags.len(), 2);
        assert!(diags[0].message().contains("`order` is not a string"));
        assert!(diags[1].message().contains("missing required field `author`"));
    }

    #[test]
    fn list_valued_slug_is_a_warning() {
        let mut l = lesson("a.md", Some("go"), None);
        l.front_matter
            .fields
            .insert("source_lesson".into(), serde_json::json!(["a", "b"]));
        let c = corpus(vec![course("go", vec![l])]);

        let diags = validate(&c, &ValidatorConfig::default());
        assert_eq!(diags.len(), 1);
        assert!(!diags[0].is_error());
        let Diagnostic::FrontMatter(w) = &diags[0] else {
            panic!("expected front-matter warning, got {:?}", diags[0]);
        };
        assert_eq!(
            w.issue,
            FrontMatterIssue::NotAString {
                field: "source_lesson".into()
            }
        );
    }

    #[test]
    fn duplicate_source_lesson_names_first_file() {
        let c = corpus(vec![course(
            "svelte",
            vec![
                lesson("s/01.md", Some("svelte"), Some("stores")),
                lesson("s/02.md", Some("svelte"), Some("stores")),
            ],
        )]);
        let diags = validate(&c, &ValidatorConfig::default());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].path(), Path::new("s/02.md"));
        assert!(diags[0].message().contains("s/01.md"));
    }

    #[test]
    fn manifest_placeholders_are_flagged() {
        let mut c = course("postgresql-replication", vec![]);
        c.sections[0].manifest = Some(Manifest {
            path: PathBuf::from("postgresql-replication/01-intro/README.md"),
            placeholders: vec![ManifestField::Icon, ManifestField::Title],
            ..Manifest::default()
        });
        let diags = validate(&corpus(vec![c]), &ValidatorConfig::default());
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| d.kind() == DiagnosticKind::Placeholder));
    }
}
