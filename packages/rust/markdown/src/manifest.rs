//! README manifest parsing.
//!
//! Course and section READMEs carry a H1 (optionally prefixed by an emoji
//! icon), a short description, and phrases such as "5 lessons" or
//! "12 challenges". Table rows are ignored when looking for counts, since
//! course READMEs list per-section counts in tables.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use corpuslint_shared::{Manifest, ManifestField};

use crate::{extract_title, prose_lines};

/// Literal text left behind by a failed template substitution.
const PLACEHOLDER: &str = "undefined";

static LESSONS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+|undefined)\s+lessons?\b|\blessons?\s*:\s*\**\s*(\d+|undefined)\b")
        .expect("lessons regex")
});

static CHALLENGES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d+|undefined)\s+(?:coding\s+)?challenges?\b|\bchallenges?\s*:\s*\**\s*(\d+|undefined)\b",
    )
    .expect("challenges regex")
});

/// Outcome of looking for a count phrase.
enum Count {
    Absent,
    Placeholder,
    Value(u32),
}

/// Parse a README's text into a [`Manifest`].
pub fn parse_manifest(path: impl Into<PathBuf>, content: &str) -> Manifest {
    let path = path.into();
    let mut placeholders = Vec::new();

    let (icon, title) = match extract_title(content) {
        Some(heading) => split_icon(&heading),
        None => (None, None),
    };

    let icon = icon.filter(|i| {
        let undefined = i == PLACEHOLDER;
        if undefined {
            placeholders.push(ManifestField::Icon);
        }
        !undefined
    });

    let title = title.filter(|t| {
        let undefined = is_placeholder_title(t);
        if undefined {
            placeholders.push(ManifestField::Title);
        }
        !undefined
    });

    let description = extract_description(content).filter(|d| {
        let undefined = d == PLACEHOLDER;
        if undefined {
            placeholders.push(ManifestField::Description);
        }
        !undefined
    });

    let declared_lessons = match find_count(content, &LESSONS_RE) {
        Count::Value(n) => Some(n),
        Count::Placeholder => {
            placeholders.push(ManifestField::LessonCount);
            None
        }
        Count::Absent => None,
    };

    let declared_challenges = match find_count(content, &CHALLENGES_RE) {
        Count::Value(n) => Some(n),
        Count::Placeholder => {
            placeholders.push(ManifestField::ChallengeCount);
            None
        }
        Count::Absent => None,
    };

    debug!(
        path = %path.display(),
        ?title,
        ?declared_lessons,
        ?declared_challenges,
        placeholders = placeholders.len(),
        "parsed manifest"
    );

    Manifest {
        path,
        title,
        icon,
        description,
        declared_lessons,
        declared_challenges,
        placeholders,
        content: content.to_string(),
    }
}

/// Split a heading into a leading icon and the remaining title.
///
/// The icon is the run of non-ASCII, non-alphanumeric characters at the
/// start (emoji plus joiners/variation selectors), or a leading `undefined`
/// word when a title follows it.
fn split_icon(heading: &str) -> (Option<String>, Option<String>) {
    let icon_end = heading
        .char_indices()
        .find(|(_, c)| c.is_ascii() || c.is_alphanumeric())
        .map(|(i, _)| i)
        .unwrap_or(heading.len());

    let (icon, rest) = heading.split_at(icon_end);
    let icon = icon.trim();
    let rest = rest.trim();

    if !icon.is_empty() {
        return (Some(icon.to_string()), non_empty(rest));
    }

    if let Some(after) = rest.strip_prefix(PLACEHOLDER) {
        if after.starts_with(char::is_whitespace) && !after.trim().is_empty() {
            return (Some(PLACEHOLDER.to_string()), non_empty(after.trim()));
        }
    }

    (None, non_empty(rest))
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// `undefined` on its own or as the name part of `Section 2: undefined`.
fn is_placeholder_title(title: &str) -> bool {
    title == PLACEHOLDER
        || title
            .rsplit_once(':')
            .is_some_and(|(_, name)| name.trim() == PLACEHOLDER)
}

/// First prose paragraph or blockquote after the H1.
fn extract_description(md: &str) -> Option<String> {
    let mut seen_title = false;
    let mut parts: Vec<&str> = Vec::new();

    for (_, line) in prose_lines(md) {
        let trimmed = line.trim();

        if !seen_title {
            if trimmed.starts_with("# ") {
                seen_title = true;
            }
            continue;
        }

        if trimmed.is_empty() {
            if parts.is_empty() {
                continue;
            }
            break;
        }

        if is_structural_line(trimmed) {
            if parts.is_empty() {
                continue;
            }
            break;
        }

        parts.push(trimmed.trim_start_matches('>').trim());
    }

    let text = parts.join(" ").trim().to_string();
    non_empty(&text)
}

/// Lines that are markup rather than prose.
fn is_structural_line(line: &str) -> bool {
    line.starts_with('#')
        || line.starts_with('|')
        || line.starts_with("- ")
        || line.starts_with("* ")
        || line.starts_with('<')
        || line.starts_with("![")
        || line.starts_with("---")
        || line.starts_with("**")
}

fn find_count(md: &str, re: &Regex) -> Count {
    for (_, line) in prose_lines(md) {
        if line.trim_start().starts_with('|') {
            continue;
        }
        let Some(caps) = re.captures(line) else {
            continue;
        };
        let raw = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();

        if raw.eq_ignore_ascii_case(PLACEHOLDER) {
            return Count::Placeholder;
        }
        if let Ok(n) = raw.parse() {
            return Count::Value(n);
        }
    }
    Count::Absent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_section_readme() {
        let md = "# 🔍 Querying Data\n\nLearn to filter and sort rows.\n\n**5 lessons** · 12 challenges\n\n| # | Lesson |\n|---|---|\n| 1 | [SELECT](./01-select.md) |\n";
        let m = parse_manifest("c/01-querying/README.md", md);
        assert_eq!(m.icon.as_deref(), Some("🔍"));
        assert_eq!(m.title.as_deref(), Some("Querying Data"));
        assert_eq!(m.description.as_deref(), Some("Learn to filter and sort rows."));
        assert_eq!(m.declared_lessons, Some(5));
        assert_eq!(m.declared_challenges, Some(12));
        assert!(m.placeholders.is_empty());
        assert_eq!(m.content, md);
    }

    #[test]
    fn table_rows_do_not_count() {
        let md = "# Course\n\n| Section | Lessons |\n|---|---|\n| Basics | 5 lessons |\n| Joins | 3 lessons |\n\nThis course has 8 lessons in total.\n";
        let m = parse_manifest("README.md", md);
        assert_eq!(m.declared_lessons, Some(8));
    }

    #[test]
    fn label_form_counts() {
        let md = "# S\n\n- Lessons: 4\n- Challenges: **9**\n";
        let m = parse_manifest("README.md", md);
        assert_eq!(m.declared_lessons, Some(4));
        assert_eq!(m.declared_challenges, Some(9));
    }

    #[test]
    fn single_lesson_phrase() {
        let m = parse_manifest("README.md", "# S\n\n1 lesson\n");
        assert_eq!(m.declared_lessons, Some(1));
        assert_eq!(m.declared_challenges, None);
    }

    #[test]
    fn undefined_fields_become_placeholders() {
        let md = "# undefined Replication\n\nundefined\n\nundefined lessons · undefined challenges\n";
        let m = parse_manifest("README.md", md);
        assert_eq!(m.icon, None);
        assert_eq!(m.title.as_deref(), Some("Replication"));
        assert_eq!(m.description, None);
        assert_eq!(m.declared_lessons, None);
        assert_eq!(m.declared_challenges, None);
        assert_eq!(
            m.placeholders,
            vec![
                ManifestField::Icon,
                ManifestField::Description,
                ManifestField::LessonCount,
                ManifestField::ChallengeCount,
            ]
        );
    }

    #[test]
    fn undefined_section_title() {
        let m = parse_manifest("README.md", "# 📦 Section 3: undefined\n");
        assert_eq!(m.icon.as_deref(), Some("📦"));
        assert_eq!(m.title, None);
        assert_eq!(m.placeholders, vec![ManifestField::Title]);
    }

    #[test]
    fn plain_title_without_icon() {
        let m = parse_manifest("README.md", "# Redis Essentials\n\n> Fast in-memory data.\n");
        assert_eq!(m.icon, None);
        assert_eq!(m.title.as_deref(), Some("Redis Essentials"));
        assert_eq!(m.description.as_deref(), Some("Fast in-memory data."));
    }

    #[test]
    fn empty_readme() {
        let m = parse_manifest("README.md", "");
        assert_eq!(m.title, None);
        assert_eq!(m.description, None);
        assert_eq!(m.declared_lessons, None);
    }
}
