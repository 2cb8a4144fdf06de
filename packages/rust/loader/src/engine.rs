//! Concurrent corpus loader.
//!
//! Files are read and parsed in semaphore-bounded tokio tasks. Results are
//! collected in plan order, so the resulting tree never depends on task
//! scheduling.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use corpuslint_shared::{
    Corpus, CorpusLintError, Course, Diagnostic, Lesson, LoaderConfig, Manifest, Result, Section,
    StructureError,
};

use crate::walk::{CoursePlan, SectionPlan, plan_corpus};

/// Result of loading a corpus.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub corpus: Corpus,
    /// Structure errors for files that could not be loaded.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of files read (lessons and READMEs).
    pub files_read: usize,
    pub duration: Duration,
}

/// What to do with a planned file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Lesson,
    Readme,
}

/// Parsed result of one file.
#[derive(Debug)]
enum FileOutcome {
    Lesson(Box<Lesson>),
    Manifest(Manifest),
    Rejected(StructureError),
}

/// Loads a corpus directory into a [`Corpus`] tree.
pub struct Loader {
    config: LoaderConfig,
}

impl Loader {
    /// Create a loader with the given configuration.
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Walk `root`, then read and parse every lesson and README.
    ///
    /// Only an unusable root (missing, not a directory, unreadable listing)
    /// is an `Err`. Broken lesson files become structure diagnostics.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub async fn load(&self, root: &Path) -> Result<LoadOutcome> {
        let start = Instant::now();
        let plan = plan_corpus(root, &self.config).await?;

        let mut jobs: Vec<(PathBuf, FileKind)> = Vec::with_capacity(plan.file_count());
        for course in &plan.courses {
            push_jobs(&mut jobs, course.readme.as_ref(), &course.lesson_files);
            for section in &course.sections {
                push_jobs(&mut jobs, section.readme.as_ref(), &section.lesson_files);
            }
        }

        info!(
            courses = plan.courses.len(),
            files = jobs.len(),
            concurrency = self.config.concurrency,
            "loading corpus"
        );

        let files_read = jobs.len();
        let outcomes = self.read_all(jobs).await?;

        let mut diagnostics: Vec<Diagnostic> =
            plan.unreadable.into_iter().map(Diagnostic::from).collect();
        let mut outcomes = outcomes.into_iter();
        let courses = plan
            .courses
            .into_iter()
            .map(|course| assemble_course(course, &mut outcomes, &mut diagnostics))
            .collect();

        let corpus = Corpus {
            root: plan.root,
            courses,
        };

        let outcome = LoadOutcome {
            corpus,
            diagnostics,
            files_read,
            duration: start.elapsed(),
        };

        info!(
            lessons = outcome.corpus.lesson_count(),
            rejected = outcome.diagnostics.len(),
            duration_ms = outcome.duration.as_millis(),
            "corpus loaded"
        );

        Ok(outcome)
    }

    /// Read every job concurrently, returning outcomes in job order.
    async fn read_all(&self, jobs: Vec<(PathBuf, FileKind)>) -> Result<Vec<FileOutcome>> {
        // LoaderConfig::validate rejects a concurrency of 0.
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut handles = Vec::with_capacity(jobs.len());

        for (path, kind) in jobs {
            let sem = semaphore.clone();
            handles.push(tokio::spawn(async move {
                let _permit = sem
                    .acquire_owned()
                    .await
                    .map_err(|e| CorpusLintError::validation(format!("loader stopped: {e}")))?;
                Ok::<_, CorpusLintError>(read_file(path, kind).await)
            }));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            let outcome = handle
                .await
                .map_err(|e| CorpusLintError::validation(format!("loader task failed: {e}")))??;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

fn push_jobs(jobs: &mut Vec<(PathBuf, FileKind)>, readme: Option<&PathBuf>, lessons: &[PathBuf]) {
    if let Some(readme) = readme {
        jobs.push((readme.clone(), FileKind::Readme));
    }
    jobs.extend(lessons.iter().map(|p| (p.clone(), FileKind::Lesson)));
}

async fn read_file(path: PathBuf, kind: FileKind) -> FileOutcome {
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable file, skipping");
            return FileOutcome::Rejected(StructureError {
                path,
                reason: format!("unreadable file: {e}"),
            });
        }
    };

    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(_) => {
            warn!(path = %path.display(), "file is not valid UTF-8, skipping");
            return FileOutcome::Rejected(StructureError {
                path,
                reason: "file is not valid UTF-8".into(),
            });
        }
    };

    match kind {
        FileKind::Readme => FileOutcome::Manifest(corpuslint_markdown::parse_manifest(path, &content)),
        FileKind::Lesson => match corpuslint_markdown::parse_lesson(&path, &content) {
            Ok(lesson) => {
                debug!(path = %path.display(), title = ?lesson.title, "lesson parsed");
                FileOutcome::Lesson(Box::new(lesson))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping lesson");
                FileOutcome::Rejected(StructureError {
                    path,
                    reason: e.to_string(),
                })
            }
        },
    }
}

/// Where loaded files of one directory end up.
#[derive(Default)]
struct DirContents {
    manifest: Option<Manifest>,
    lessons: Vec<Lesson>,
    rejected: Vec<PathBuf>,
}

/// Pull the outcomes for one directory off the ordered stream.
fn take_dir(
    has_readme: bool,
    lesson_count: usize,
    outcomes: &mut impl Iterator<Item = FileOutcome>,
    diagnostics: &mut Vec<Diagnostic>,
) -> DirContents {
    let mut contents = DirContents::default();
    let expected = usize::from(has_readme) + lesson_count;

    for (i, outcome) in outcomes.take(expected).enumerate() {
        let is_readme = has_readme && i == 0;
        match outcome {
            FileOutcome::Manifest(m) => contents.manifest = Some(m),
            FileOutcome::Lesson(l) => contents.lessons.push(*l),
            FileOutcome::Rejected(err) => {
                if !is_readme {
                    contents.rejected.push(err.path.clone());
                }
                diagnostics.push(err.into());
            }
        }
    }

    contents
}

fn assemble_course(
    plan: CoursePlan,
    outcomes: &mut impl Iterator<Item = FileOutcome>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Course {
    let own = take_dir(
        plan.readme.is_some(),
        plan.lesson_files.len(),
        outcomes,
        diagnostics,
    );

    let sections = plan
        .sections
        .into_iter()
        .map(|section| assemble_section(section, outcomes, diagnostics))
        .collect();

    Course {
        slug: plan.slug,
        path: plan.path,
        manifest: own.manifest,
        sections,
        lessons: own.lessons,
        rejected: own.rejected,
    }
}

fn assemble_section(
    plan: SectionPlan,
    outcomes: &mut impl Iterator<Item = FileOutcome>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Section {
    let contents = take_dir(
        plan.readme.is_some(),
        plan.lesson_files.len(),
        outcomes,
        diagnostics,
    );

    Section {
        dir_name: plan.dir_name,
        path: plan.path,
        number: plan.number,
        manifest: contents.manifest,
        lessons: contents.lessons,
        rejected: contents.rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn lesson(course: &str, slug: &str) -> String {
        format!("---\nsource_course: \"{course}\"\nsource_lesson: \"{slug}\"\n---\n\n# {slug}\n")
    }

    fn loader(concurrency: usize) -> Loader {
        Loader::new(LoaderConfig {
            concurrency,
            ..LoaderConfig::default()
        })
    }

    #[tokio::test]
    async fn loads_tree_with_manifests() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "redis/README.md", b"# \xF0\x9F\x9F\xA5 Redis\n\n8 lessons\n");
        write(root, "redis/01-basics/README.md", b"# Basics\n\n2 lessons\n");
        write(root, "redis/01-basics/01-strings.md", lesson("redis", "strings").as_bytes());
        write(root, "redis/01-basics/02-lists.md", lesson("redis", "lists").as_bytes());

        let outcome = loader(4).load(root).await.unwrap();
        assert!(outcome.diagnostics.is_empty());
        assert_eq!(outcome.files_read, 4);

        let course = &outcome.corpus.courses[0];
        assert_eq!(course.slug, "redis");
        assert_eq!(course.manifest.as_ref().unwrap().declared_lessons, Some(8));

        let section = &course.sections[0];
        assert_eq!(section.manifest.as_ref().unwrap().declared_lessons, Some(2));
        let titles: Vec<_> = section
            .lessons
            .iter()
            .map(|l| l.title.clone().unwrap())
            .collect();
        assert_eq!(titles, vec!["strings", "lists"]);
    }

    #[tokio::test]
    async fn broken_lessons_become_structure_errors() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "php/01-intro/01-ok.md", lesson("php", "ok").as_bytes());
        write(root, "php/01-intro/02-no-fm.md", b"# No front-matter\n");
        write(root, "php/01-intro/03-binary.md", &[0xff, 0xfe, 0x00]);
        write(root, "php/01-intro/README.md", &[0xc3, 0x28]);

        let outcome = loader(2).load(root).await.unwrap();
        let section = &outcome.corpus.courses[0].sections[0];

        assert_eq!(section.lessons.len(), 1);
        assert_eq!(section.rejected.len(), 2);
        assert_eq!(section.lesson_file_count(), 3);
        assert!(section.manifest.is_none());

        // README + two lessons
        assert_eq!(outcome.diagnostics.len(), 3);
        assert!(outcome.diagnostics.iter().all(Diagnostic::is_error));
        let missing = outcome
            .diagnostics
            .iter()
            .find(|d| d.path().ends_with("02-no-fm.md"))
            .unwrap();
        assert!(missing.message().contains("missing front-matter"));
    }

    #[tokio::test]
    async fn concurrency_does_not_change_the_result() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for s in 1..=3 {
            for l in 1..=6 {
                write(
                    root,
                    &format!("svelte/{s:02}-section/{l:02}-lesson.md"),
                    lesson("svelte", &format!("l{s}{l}")).as_bytes(),
                );
            }
        }

        let serial = loader(1).load(root).await.unwrap();
        let parallel = loader(16).load(root).await.unwrap();
        assert_eq!(serial.corpus, parallel.corpus);
        assert_eq!(serial.corpus.lesson_count(), 18);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unlistable_course_is_reported_and_others_still_load() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "go/01-intro/01-hello.md", lesson("go", "hello").as_bytes());
        write(root, "php/01-intro/01-hello.md", lesson("php", "hello").as_bytes());
        let locked = root.join("php");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let outcome = loader(4).load(root).await;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let outcome = outcome.unwrap();

        assert_eq!(outcome.corpus.courses.len(), 1);
        assert_eq!(outcome.corpus.courses[0].slug, "go");
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0].is_error());
        assert_eq!(outcome.diagnostics[0].path(), locked.as_path());
        assert!(outcome.diagnostics[0].message().contains("unreadable directory"));
    }

    #[tokio::test]
    async fn empty_root_loads_empty_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = loader(8).load(dir.path()).await.unwrap();
        assert!(outcome.corpus.courses.is_empty());
        assert!(outcome.diagnostics.is_empty());
    }
}
