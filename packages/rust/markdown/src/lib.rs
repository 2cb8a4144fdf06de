//! Markdown parsing for lesson files and README manifests.
//!
//! Everything here is pure text processing: front-matter splitting, H1
//! extraction, link extraction, and manifest field parsing. No I/O.

mod frontmatter;
mod links;
mod manifest;

use std::sync::LazyLock;

use regex::Regex;

use corpuslint_shared::Lesson;

pub use frontmatter::{FrontMatterError, ParsedDocument, parse_front_matter};
pub use links::{
    MarkdownLink, extract_links, is_external_url, is_relative_markdown_target, strip_suffix_params,
};
pub use manifest::parse_manifest;

/// Parse a lesson file's full text into a [`Lesson`].
///
/// Fails only when the front-matter is missing or unparsable.
pub fn parse_lesson(
    path: impl Into<std::path::PathBuf>,
    content: &str,
) -> std::result::Result<Lesson, FrontMatterError> {
    let doc = parse_front_matter(content)?;
    let title = extract_title(doc.body);

    let resource_links = extract_links(doc.body)
        .into_iter()
        .filter(|l| is_external_url(&l.target))
        .map(|l| l.target)
        .collect();

    Ok(Lesson {
        path: path.into(),
        front_matter: doc.front_matter,
        title,
        body: doc.body.to_string(),
        body_start_line: doc.body_start_line,
        resource_links,
    })
}

/// Extract the first H1 outside fenced code blocks.
pub fn extract_title(md: &str) -> Option<String> {
    static H1_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^#[ \t]+(.+?)[ \t#]*$").expect("valid regex"));

    prose_lines(md)
        .find_map(|(_, line)| H1_RE.captures(line).map(|c| c[1].trim().to_string()))
        .filter(|t| !t.is_empty())
}

/// Iterate `(1-based line number, line)` pairs that sit outside fenced code blocks.
///
/// Fence lines themselves are skipped. A fence closes only with the same
/// marker character it was opened with.
pub(crate) fn prose_lines(md: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut fence: Option<char> = None;

    md.lines().enumerate().filter_map(move |(i, line)| {
        let trimmed = line.trim_start();
        let marker = if trimmed.starts_with("```") {
            Some('`')
        } else if trimmed.starts_with("~~~") {
            Some('~')
        } else {
            None
        };

        match (fence, marker) {
            (None, Some(m)) => {
                fence = Some(m);
                None
            }
            (Some(open), Some(m)) if open == m => {
                fence = None;
                None
            }
            (Some(_), _) => None,
            (None, None) => Some((i + 1, line)),
        }
    })
}
