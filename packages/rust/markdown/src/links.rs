//! Markdown link extraction and classification.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::prose_lines;

/// An inline `[text](target)` link found in prose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownLink {
    /// 1-based line number within the scanned text.
    pub line: usize,
    pub text: String,
    /// Target as written, without `<...>` wrapping or title.
    pub target: String,
}

/// Matches `[text](target)`, `[text](<target>)` and `[text](target "title")`.
/// Group 1 is `!` for images.
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(!?)\[([^\]]*)\]\(\s*(?:<([^>]*)>|([^)\s]+))(?:\s+(?:"[^"]*"|'[^']*'))?\s*\)"#)
        .expect("link regex")
});

/// Matches inline code spans.
static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`\n]*`").expect("inline code regex"));

/// Extract non-image links outside code blocks and inline code spans.
pub fn extract_links(md: &str) -> Vec<MarkdownLink> {
    let mut links = Vec::new();

    for (line_no, line) in prose_lines(md) {
        let line = INLINE_CODE_RE.replace_all(line, "");

        for caps in LINK_RE.captures_iter(&line) {
            if &caps[1] == "!" {
                continue;
            }
            let target = caps
                .get(3)
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().trim())
                .unwrap_or_default();
            if target.is_empty() {
                continue;
            }
            links.push(MarkdownLink {
                line: line_no,
                text: caps[2].to_string(),
                target: target.to_string(),
            });
        }
    }

    links
}

/// Drop a trailing `#fragment` or `?query` from a link target.
pub fn strip_suffix_params(target: &str) -> &str {
    let end = target.find(['#', '?']).unwrap_or(target.len());
    &target[..end]
}

/// Whether the link points to another markdown file by relative path
/// (`./x.md`, `../y/README.md`).
pub fn is_relative_markdown_target(target: &str) -> bool {
    let path = strip_suffix_params(target);
    (path.starts_with("./") || path.starts_with("../"))
        && path.len() > 3
        && path.to_ascii_lowercase().ends_with(".md")
}

/// Whether the target is an absolute `http(s)` URL.
pub fn is_external_url(target: &str) -> bool {
    Url::parse(target)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_links_with_line_numbers() {
        let md = "Intro\n\nSee [next](./02-next.md) and [docs](https://redis.io/docs/).\n";
        let links = extract_links(md);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].line, 3);
        assert_eq!(links[0].text, "next");
        assert_eq!(links[0].target, "./02-next.md");
        assert_eq!(links[1].target, "https://redis.io/docs/");
    }

    #[test]
    fn skips_images_code_blocks_and_inline_code() {
        let md = "![diagram](./img.md)\n\n```md\n[a](./a.md)\n```\n\nUse `[b](./b.md)` literally.\n";
        assert!(extract_links(md).is_empty());
    }

    #[test]
    fn handles_titles_and_angle_brackets() {
        let md = "[a](./a.md \"Lesson A\") [b](<../my lesson.md>)";
        let targets: Vec<_> = extract_links(md).into_iter().map(|l| l.target).collect();
        assert_eq!(targets, vec!["./a.md", "../my lesson.md"]);
    }

    #[test]
    fn table_links_are_found() {
        let md = "| # | Lesson |\n|---|---|\n| 1 | [Intro](./01-intro.md) |\n";
        let links = extract_links(md);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].line, 3);
    }

    #[test]
    fn relative_markdown_targets() {
        assert!(is_relative_markdown_target("./02-where.md"));
        assert!(is_relative_markdown_target("../README.md"));
        assert!(is_relative_markdown_target("./02-where.md#filtering"));
        assert!(is_relative_markdown_target("../02-section/01-a.MD"));

        assert!(!is_relative_markdown_target("02-where.md"));
        assert!(!is_relative_markdown_target("./image.png"));
        assert!(!is_relative_markdown_target("https://example.com/a.md"));
        assert!(!is_relative_markdown_target("#anchor"));
        assert!(!is_relative_markdown_target("./"));
    }

    #[test]
    fn fragments_and_queries_are_stripped() {
        assert_eq!(strip_suffix_params("./a.md#top"), "./a.md");
        assert_eq!(strip_suffix_params("./a.md?raw=1"), "./a.md");
        assert_eq!(strip_suffix_params("./a.md"), "./a.md");
        assert_eq!(strip_suffix_params("./a.md?raw=1#top"), "./a.md");
    }

    #[test]
    fn external_urls() {
        assert!(is_external_url("https://www.php.net/manual/en/"));
        assert!(is_external_url("http://localhost:3000"));
        assert!(!is_external_url("mailto:team@example.com"));
        assert!(!is_external_url("./local.md"));
    }
}
