//! Lint configuration for corpuslint.
//!
//! Config is read from `corpuslint.toml`. Lookup order: an explicit path,
//! then `<corpus-root>/corpuslint.toml`, then `~/.corpuslint/corpuslint.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CorpusLintError, Result};

/// Configuration file name, both in the corpus root and the user config dir.
pub const CONFIG_FILE_NAME: &str = "corpuslint.toml";

/// Config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".corpuslint";

// ---------------------------------------------------------------------------
// Config structs (matching corpuslint.toml schema)
// ---------------------------------------------------------------------------

/// Top-level lint config, deserialized from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LintConfig {
    /// Directory walking and file reading.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Front-matter rules.
    #[serde(default)]
    pub validator: ValidatorConfig,

    /// Relative link checking.
    #[serde(default)]
    pub links: LinksConfig,

    /// Output settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// `[loader]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Maximum lesson files read concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Directory names skipped while walking (hidden directories always are).
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            ignore: default_ignore(),
        }
    }
}

fn default_concurrency() -> usize {
    8
}
fn default_ignore() -> Vec<String> {
    vec!["node_modules".into(), "target".into()]
}

/// `[validator]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Front-matter keys every lesson must carry as non-empty strings.
    #[serde(default = "default_required_fields")]
    pub required_fields: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            required_fields: default_required_fields(),
        }
    }
}

fn default_required_fields() -> Vec<String> {
    vec!["source_course".into(), "source_lesson".into()]
}

/// `[links]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinksConfig {
    /// Also check links inside course and section READMEs.
    #[serde(default = "default_true")]
    pub check_readmes: bool,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            check_readmes: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Report output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// `[report]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: ReportFormat,

    /// Treat warnings as failures for the exit code.
    #[serde(default)]
    pub deny_warnings: bool,
}

impl LintConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.loader.concurrency == 0 {
            return Err(CorpusLintError::config(
                "loader.concurrency must be at least 1",
            ));
        }
        if let Some(blank) = self
            .validator
            .required_fields
            .iter()
            .find(|f| f.trim().is_empty())
        {
            return Err(CorpusLintError::config(format!(
                "validator.required_fields contains a blank entry: {blank:?}"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Path of the per-user config file (`~/.corpuslint/corpuslint.toml`).
pub fn user_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CorpusLintError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load a config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<LintConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CorpusLintError::io(path, e))?;

    let config: LintConfig = toml::from_str(&content).map_err(|e| {
        CorpusLintError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Resolve the config for a corpus.
///
/// An explicit path must exist. Otherwise the corpus-local file wins over the
/// user file, and defaults are used when neither exists.
pub fn resolve_config(explicit: Option<&Path>, corpus_root: &Path) -> Result<LintConfig> {
    if let Some(path) = explicit {
        tracing::debug!(?path, "loading explicit config");
        return load_config_from(path);
    }

    let local = corpus_root.join(CONFIG_FILE_NAME);
    if local.is_file() {
        tracing::debug!(path = ?local, "loading corpus config");
        return load_config_from(&local);
    }

    match user_config_path() {
        Ok(user) if user.is_file() => {
            tracing::debug!(path = ?user, "loading user config");
            load_config_from(&user)
        }
        _ => {
            tracing::debug!("no config file found, using defaults");
            Ok(LintConfig::default())
        }
    }
}
