//! Application configuration for threadkb.
//!
//! User config lives at `~/.threadkb/threadkb.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ThreadKbError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "threadkb.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".threadkb";

// ---------------------------------------------------------------------------
// Config structs (matching threadkb.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Knowledge-base layout and rendering.
    #[serde(default)]
    pub kb: KbConfig,

    /// Title matching policy.
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Branch and pull-request settings for the publishing hand-off.
    #[serde(default)]
    pub publish: PublishConfig,

    /// Conversation source settings.
    #[serde(default)]
    pub slack: SlackConfig,
}

/// `[kb]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbConfig {
    /// Subdirectory of the corpus holding the articles.
    #[serde(default = "default_kb_dir")]
    pub dir: String,

    /// Title used when a candidate has no usable heading.
    #[serde(default = "default_title")]
    pub default_title: String,

    /// Link text rendered for every entry in the sources block.
    #[serde(default = "default_source_label")]
    pub source_label: String,

    /// Maximum number of keywords kept on an article.
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,
}

impl Default for KbConfig {
    fn default() -> Self {
        Self {
            dir: default_kb_dir(),
            default_title: default_title(),
            source_label: default_source_label(),
            max_keywords: default_max_keywords(),
        }
    }
}

fn default_kb_dir() -> String {
    "kb".into()
}
fn default_title() -> String {
    "Thread Summary".into()
}
fn default_source_label() -> String {
    "Slack Thread".into()
}
fn default_max_keywords() -> usize {
    10
}

/// `[matching]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum length (in chars) for a slug token to count as significant.
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_token_len: default_min_token_len(),
        }
    }
}

fn default_min_token_len() -> usize {
    4
}

/// `[publish]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Prefix for the per-invocation branch name.
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,

    /// Revision the catalog is read from and pull requests target.
    #[serde(default = "default_base_ref")]
    pub base_ref: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            branch_prefix: default_branch_prefix(),
            base_ref: default_base_ref(),
        }
    }
}

fn default_branch_prefix() -> String {
    "kb/add-".into()
}
fn default_base_ref() -> String {
    "main".into()
}

/// `[slack]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Workspace (team) id; switches deep links to the `app_redirect` form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Reconcile config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime reconciliation settings, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Catalog subdirectory that is searched and written to.
    pub kb_dir: String,
    /// Fallback title for unnamed candidates.
    pub default_title: String,
    /// Link text for sources.
    pub source_label: String,
    /// Keyword cap.
    pub max_keywords: usize,
    /// Significant token length threshold.
    pub min_token_len: usize,
    /// Revision handed to `Catalog::read`.
    pub base_ref: Option<String>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ReconcileConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            kb_dir: config.kb.dir.clone(),
            default_title: config.kb.default_title.clone(),
            source_label: config.kb.source_label.clone(),
            max_keywords: config.kb.max_keywords,
            min_token_len: config.matching.min_token_len,
            base_ref: Some(config.publish.base_ref.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.threadkb/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ThreadKbError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.threadkb/threadkb.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ThreadKbError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        ThreadKbError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ThreadKbError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ThreadKbError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ThreadKbError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject configs the engine cannot work with.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.kb.max_keywords == 0 {
        return Err(ThreadKbError::config("kb.max_keywords must be at least 1"));
    }
    if config.kb.default_title.trim().is_empty() {
        return Err(ThreadKbError::config("kb.default_title must not be empty"));
    }
    let dir = config.kb.dir.trim_matches('/');
    if dir.is_empty() || dir.split('/').any(|part| part == "..") {
        return Err(ThreadKbError::config(format!(
            "kb.dir '{}' must be a relative path inside the corpus",
            config.kb.dir
        )));
    }
    Ok(())
}
