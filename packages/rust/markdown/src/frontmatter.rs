//! YAML front-matter splitting and parsing.
//!
//! A block opens with a first line of `---` and closes with the next `---`
//! or `...` line. Values follow the `key: "value"` pattern used by lessons.

use corpuslint_shared::FrontMatter;

/// Why a file's front-matter could not be used.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrontMatterError {
    #[error("missing front-matter: file does not start with a `---` line")]
    Missing,

    #[error("unterminated front-matter: no closing `---` line")]
    Unterminated,

    #[error("front-matter is not valid YAML: {0}")]
    Yaml(String),

    #[error("front-matter must be a YAML mapping")]
    NotAMapping,
}

/// A document split into front-matter and body.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument<'a> {
    pub front_matter: FrontMatter,
    /// Text after the closing delimiter.
    pub body: &'a str,
    /// 1-based line number where `body` starts.
    pub body_start_line: usize,
}

/// Split and parse the front-matter of `content`.
pub fn parse_front_matter(content: &str) -> Result<ParsedDocument<'_>, FrontMatterError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let (yaml, body, body_start_line) = split(content)?;

    let front_matter = if yaml.trim().is_empty() {
        FrontMatter::default()
    } else {
        parse_yaml(yaml)?
    };

    Ok(ParsedDocument {
        front_matter,
        body,
        body_start_line,
    })
}

/// Returns `(yaml, body, body_start_line)`.
fn split(content: &str) -> Result<(&str, &str, usize), FrontMatterError> {
    let mut lines = content.split_inclusive('\n');

    let first = lines.next().ok_or(FrontMatterError::Missing)?;
    if first.trim_end() != "---" {
        return Err(FrontMatterError::Missing);
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;

    for (i, line) in lines.enumerate() {
        let delimiter = line.trim_end();
        if delimiter == "---" || delimiter == "..." {
            let yaml = &content[yaml_start..offset];
            let body = &content[offset + line.len()..];
            // line 1 is the opening delimiter, this one is line i + 2
            return Ok((yaml, body, i + 3));
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated)
}

fn parse_yaml(yaml: &str) -> Result<FrontMatter, FrontMatterError> {
    let value: serde_yaml_ng::Value =
        serde_yaml_ng::from_str(yaml).map_err(|e| FrontMatterError::Yaml(e.to_string()))?;

    match value {
        serde_yaml_ng::Value::Null => Ok(FrontMatter::default()),
        mapping @ serde_yaml_ng::Value::Mapping(_) => serde_yaml_ng::from_value(mapping)
            .map_err(|e| FrontMatterError::Yaml(e.to_string())),
        _ => Err(FrontMatterError::NotAMapping),
    }
}
