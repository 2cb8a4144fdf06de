//! Directory walking.
//!
//! Layout: `<root>/<course>/<section>/<lesson>.md`. `README.md` files are
//! manifests; other `.md` files are lessons. Only the first three levels are
//! read.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use corpuslint_shared::{CorpusLintError, LoaderConfig, README_FILE_NAME, Result, StructureError};

/// Files to read for one section directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPlan {
    pub dir_name: String,
    pub path: PathBuf,
    pub number: Option<u32>,
    pub readme: Option<PathBuf>,
    pub lesson_files: Vec<PathBuf>,
}

/// Files to read for one course directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoursePlan {
    pub slug: String,
    pub path: PathBuf,
    pub readme: Option<PathBuf>,
    /// Lesson files directly inside the course directory.
    pub lesson_files: Vec<PathBuf>,
    pub sections: Vec<SectionPlan>,
}

/// Everything the loader will read, in output order.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusPlan {
    pub root: PathBuf,
    pub courses: Vec<CoursePlan>,
    /// Course or section directories that could not be listed.
    pub unreadable: Vec<StructureError>,
}

impl CorpusPlan {
    /// Number of files (lessons and READMEs) in the plan.
    pub fn file_count(&self) -> usize {
        self.courses
            .iter()
            .map(|c| {
                usize::from(c.readme.is_some())
                    + c.lesson_files.len()
                    + c.sections
                        .iter()
                        .map(|s| usize::from(s.readme.is_some()) + s.lesson_files.len())
                        .sum::<usize>()
            })
            .sum()
    }
}

/// Directory listing split into subdirectories and markdown files, each sorted.
struct Listing {
    dirs: Vec<PathBuf>,
    readme: Option<PathBuf>,
    markdown: Vec<PathBuf>,
}

/// Build the read plan for a corpus root.
#[instrument(skip_all, fields(root = %root.display()))]
pub async fn plan_corpus(root: &Path, config: &LoaderConfig) -> Result<CorpusPlan> {
    let meta = tokio::fs::metadata(root)
        .await
        .map_err(|e| CorpusLintError::io(root, e))?;
    if !meta.is_dir() {
        return Err(CorpusLintError::validation(format!(
            "corpus root {} is not a directory",
            root.display()
        )));
    }

    let top = list_dir(root, config)
        .await
        .map_err(|e| CorpusLintError::io(root, e))?;
    for stray in &top.markdown {
        debug!(path = %stray.display(), "skipping markdown file outside any course");
    }

    let mut courses = Vec::with_capacity(top.dirs.len());
    let mut unreadable = Vec::new();
    for course_dir in top.dirs {
        let Some(listing) = list_or_skip(&course_dir, config, &mut unreadable).await else {
            continue;
        };

        let mut sections = Vec::with_capacity(listing.dirs.len());
        for section_dir in listing.dirs {
            let Some(section) = list_or_skip(&section_dir, config, &mut unreadable).await else {
                continue;
            };
            for nested in &section.dirs {
                warn!(path = %nested.display(), "skipping directory nested below a section");
            }

            let dir_name = dir_name(&section_dir);
            sections.push(SectionPlan {
                number: section_number(&dir_name),
                dir_name,
                path: section_dir,
                readme: section.readme,
                lesson_files: section.markdown,
            });
        }

        sections.sort_by(|a, b| {
            (a.number.is_none(), a.number, &a.dir_name).cmp(&(b.number.is_none(), b.number, &b.dir_name))
        });

        courses.push(CoursePlan {
            slug: dir_name(&course_dir),
            path: course_dir,
            readme: listing.readme,
            lesson_files: listing.markdown,
            sections,
        });
    }

    let plan = CorpusPlan {
        root: root.to_path_buf(),
        courses,
        unreadable,
    };
    debug!(
        courses = plan.courses.len(),
        files = plan.file_count(),
        "corpus plan built"
    );
    Ok(plan)
}

/// Leading integer of a section directory name (`03-joins` → 3).
pub fn section_number(dir_name: &str) -> Option<u32> {
    let digits: String = dir_name.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_ignored(name: &str, config: &LoaderConfig) -> bool {
    name.starts_with('.') || config.ignore.iter().any(|i| i == name)
}

/// List a course or section directory. A failure skips the directory and
/// records a structure error instead of stopping the walk.
async fn list_or_skip(
    dir: &Path,
    config: &LoaderConfig,
    unreadable: &mut Vec<StructureError>,
) -> Option<Listing> {
    match list_dir(dir, config).await {
        Ok(listing) => Some(listing),
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "cannot list directory, skipping");
            unreadable.push(StructureError {
                path: dir.to_path_buf(),
                reason: format!("unreadable directory: {e}"),
            });
            None
        }
    }
}

async fn list_dir(dir: &Path, config: &LoaderConfig) -> std::io::Result<Listing> {
    let mut entries = tokio::fs::read_dir(dir).await?;

    let mut listing = Listing {
        dirs: Vec::new(),
        readme: None,
        markdown: Vec::new(),
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry.file_type().await?;

        if file_type.is_dir() {
            if is_ignored(&name, config) {
                debug!(path = %path.display(), "ignoring directory");
            } else {
                listing.dirs.push(path);
            }
        } else if name == README_FILE_NAME {
            listing.readme = Some(path);
        } else if path.extension().is_some_and(|ext| ext == "md") {
            listing.markdown.push(path);
        }
    }

    listing.dirs.sort();
    listing.markdown.sort();
    Ok(listing)
}
