//! Corpus tree types: courses, sections, lessons and their README manifests.
//!
//! The loader builds a [`Corpus`] once; every later stage borrows it.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// File name that marks a course or section manifest instead of a lesson.
pub const README_FILE_NAME: &str = "README.md";

// ---------------------------------------------------------------------------
// FrontMatter
// ---------------------------------------------------------------------------

/// The YAML block at the top of a lesson file.
///
/// Every key is kept as a loosely typed value so that a wrong type on a
/// well-known key is a validation finding rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrontMatter {
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// Lookup result for a front-matter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// Key absent or `null`.
    Missing,
    /// Key present with a non-string value.
    NotAString,
    /// Key present with a string value (possibly blank).
    Text(&'a str),
}

impl FrontMatter {
    /// Look up a key by name.
    pub fn field(&self, name: &str) -> FieldValue<'_> {
        match self.fields.get(name) {
            None | Some(serde_json::Value::Null) => FieldValue::Missing,
            Some(serde_json::Value::String(s)) => FieldValue::Text(s),
            Some(_) => FieldValue::NotAString,
        }
    }

    /// String value of a key, if it has one.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.field(name) {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Slug of the course this lesson claims to belong to.
    pub fn source_course(&self) -> Option<&str> {
        self.text("source_course")
    }

    /// Slug of the lesson itself.
    pub fn source_lesson(&self) -> Option<&str> {
        self.text("source_lesson")
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// A manifest field that may be missing or rendered as a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestField {
    Title,
    Icon,
    Description,
    LessonCount,
    ChallengeCount,
}

impl std::fmt::Display for ManifestField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Title => "title",
            Self::Icon => "icon",
            Self::Description => "description",
            Self::LessonCount => "lesson count",
            Self::ChallengeCount => "challenge count",
        };
        f.write_str(name)
    }
}

/// Parsed `README.md` of a course or section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Path to the README file.
    pub path: PathBuf,
    /// H1 text with any leading icon removed.
    pub title: Option<String>,
    /// Leading emoji/symbol of the H1.
    pub icon: Option<String>,
    /// First prose paragraph or blockquote after the title.
    pub description: Option<String>,
    /// Count from an "N lessons" phrase.
    pub declared_lessons: Option<u32>,
    /// Count from an "N challenges" phrase.
    pub declared_challenges: Option<u32>,
    /// Fields rendered as the literal text `undefined`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placeholders: Vec<ManifestField>,
    /// Raw README text, kept for link checking.
    #[serde(skip)]
    pub content: String,
}

// ---------------------------------------------------------------------------
// Lesson / Section / Course / Corpus
// ---------------------------------------------------------------------------

/// A single lesson markdown file with parsed front-matter.
#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    /// Path to the lesson file.
    pub path: PathBuf,
    pub front_matter: FrontMatter,
    /// First H1 of the body.
    pub title: Option<String>,
    /// Everything after the front-matter block.
    pub body: String,
    /// 1-based line number in the file where `body` starts.
    pub body_start_line: usize,
    /// Absolute `http(s)` URLs linked from the body.
    pub resource_links: Vec<String>,
}

/// A subdirectory of a course holding lessons.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Directory name, e.g. `03-joins`.
    pub dir_name: String,
    pub path: PathBuf,
    /// Leading number of the directory name.
    pub number: Option<u32>,
    pub manifest: Option<Manifest>,
    pub lessons: Vec<Lesson>,
    /// Lesson files that failed to load (structure errors).
    pub rejected: Vec<PathBuf>,
}

impl Section {
    /// Number of non-README markdown files found in this directory.
    pub fn lesson_file_count(&self) -> usize {
        self.lessons.len() + self.rejected.len()
    }
}

/// A top-level course directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    /// Directory name, e.g. `postgresql-fundamentals`.
    pub slug: String,
    pub path: PathBuf,
    pub manifest: Option<Manifest>,
    pub sections: Vec<Section>,
    /// Lessons placed directly in the course directory.
    pub lessons: Vec<Lesson>,
    /// Course-level lesson files that failed to load.
    pub rejected: Vec<PathBuf>,
}

impl Course {
    /// All lessons of the course, course-level first, then by section order.
    pub fn all_lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.lessons
            .iter()
            .chain(self.sections.iter().flat_map(|s| s.lessons.iter()))
    }

    /// Every manifest in the course (course README first).
    pub fn manifests(&self) -> impl Iterator<Item = &Manifest> {
        self.manifest
            .iter()
            .chain(self.sections.iter().filter_map(|s| s.manifest.as_ref()))
    }

    /// Total markdown lesson files in the course, loaded or not.
    pub fn lesson_file_count(&self) -> usize {
        self.lessons.len()
            + self.rejected.len()
            + self
                .sections
                .iter()
                .map(Section::lesson_file_count)
                .sum::<usize>()
    }
}

/// The whole loaded corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    pub root: PathBuf,
    /// Courses ordered by slug.
    pub courses: Vec<Course>,
}

impl Corpus {
    /// Every lesson paired with its course.
    pub fn lessons(&self) -> impl Iterator<Item = (&Course, &Lesson)> {
        self.courses
            .iter()
            .flat_map(|c| c.all_lessons().map(move |l| (c, l)))
    }

    /// Total number of loaded lessons.
    pub fn lesson_count(&self) -> usize {
        self.lessons().count()
    }
}
