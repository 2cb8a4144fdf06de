//! Relative link checking.
//!
//! Only `./*.md` and `../*.md` targets are checked. Every broken link is
//! collected; nothing here stops the run.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, instrument};

use corpuslint_markdown::{
    MarkdownLink, extract_links, is_relative_markdown_target, strip_suffix_params,
};
use corpuslint_shared::{BrokenLinkError, Corpus, Diagnostic, LinksConfig};

/// Check every relative markdown link in lessons (and READMEs, if enabled).
#[instrument(skip_all, fields(courses = corpus.courses.len()))]
pub fn check_links(corpus: &Corpus, config: &LinksConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut checked = 0usize;

    for (_, lesson) in corpus.lessons() {
        for link in extract_links(&lesson.body) {
            let line = lesson.body_start_line + link.line - 1;
            checked += usize::from(is_relative_markdown_target(&link.target));
            diagnostics.extend(check_link(&lesson.path, line, &link).map(Diagnostic::from));
        }
    }

    if config.check_readmes {
        for manifest in corpus.courses.iter().flat_map(|c| c.manifests()) {
            for link in extract_links(&manifest.content) {
                checked += usize::from(is_relative_markdown_target(&link.target));
                diagnostics
                    .extend(check_link(&manifest.path, link.line, &link).map(Diagnostic::from));
            }
        }
    }

    debug!(checked, broken = diagnostics.len(), "link check complete");
    diagnostics
}

/// Check one link found in `file`. Returns `None` for links that are fine or
/// out of scope.
pub fn check_link(file: &Path, line: usize, link: &MarkdownLink) -> Option<BrokenLinkError> {
    if !is_relative_markdown_target(&link.target) {
        return None;
    }

    let base = file.parent().unwrap_or_else(|| Path::new(""));
    let joined = base.join(strip_suffix_params(&link.target));

    // Existence follows the filesystem; the normalized path is for display.
    if joined.is_file() {
        return None;
    }

    Some(BrokenLinkError {
        file: file.to_path_buf(),
        line,
        target: link.target.clone(),
        resolved: normalize(&joined),
    })
}

/// Lexically remove `.` and `..` components. A `..` that climbs above the
/// start of a relative path is kept.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
