use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the repository root and the user config directory.
pub const CONFIG_FILE_NAME: &str = "bumprelease.toml";

/// Represents the complete configuration for bump-release.
///
/// Contains file locations, the secondary manifest setup, external program
/// names, and git/release options.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub secondary: SecondaryConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub release: ReleaseConfig,
}

fn default_manifest() -> PathBuf {
    PathBuf::from("Cargo.toml")
}

fn default_changelog() -> PathBuf {
    PathBuf::from("CHANGELOG.md")
}

fn default_cliff_config() -> PathBuf {
    PathBuf::from(".config/cliff.toml")
}

/// File locations, relative to the repository root.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PathsConfig {
    /// Primary manifest holding the `version = "..." # auto` line
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    #[serde(default = "default_changelog")]
    pub changelog: PathBuf,

    /// Configuration passed to the changelog generator
    #[serde(default = "default_cliff_config")]
    pub cliff_config: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            manifest: default_manifest(),
            changelog: default_changelog(),
            cliff_config: default_cliff_config(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_secondary_directory() -> PathBuf {
    PathBuf::from("bindings/node")
}

/// Secondary (node binding) manifests kept in step with the primary version.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SecondaryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_secondary_directory")]
    pub directory: PathBuf,
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        SecondaryConfig {
            enabled: true,
            directory: default_secondary_directory(),
        }
    }
}

fn default_cargo() -> String {
    "cargo".to_string()
}

fn default_yarn() -> String {
    "yarn".to_string()
}

fn default_napi() -> String {
    "napi".to_string()
}

fn default_git_cliff() -> String {
    "git-cliff".to_string()
}

fn default_git() -> String {
    "git".to_string()
}

fn default_gh() -> String {
    "gh".to_string()
}

/// Program names for the external tools.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ToolsConfig {
    #[serde(default = "default_cargo")]
    pub cargo: String,

    #[serde(default = "default_yarn")]
    pub yarn: String,

    #[serde(default = "default_napi")]
    pub napi: String,

    #[serde(default = "default_git_cliff")]
    pub git_cliff: String,

    #[serde(default = "default_git")]
    pub git: String,

    #[serde(default = "default_gh")]
    pub gh: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        ToolsConfig {
            cargo: default_cargo(),
            yarn: default_yarn(),
            napi: default_napi(),
            git_cliff: default_git_cliff(),
            git: default_git(),
            gh: default_gh(),
        }
    }
}

/// Options for the commit/push step.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct GitConfig {
    /// Remote passed to `git push`; unset pushes to the upstream of the current branch
    #[serde(default)]
    pub remote: Option<String>,
}

fn default_tag_prefix() -> String {
    "v".to_string()
}

/// Options for tagging and release creation.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            tag_prefix: default_tag_prefix(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ReleaseError::config(e.to_string()))
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `bumprelease.toml` in the repository root
/// 3. `.bumprelease.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
/// * `root` - Repository root searched for `bumprelease.toml`
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>, root: &Path) -> Result<Config> {
    let user_config = dirs::config_dir().map(|dir| dir.join(format!(".{}", CONFIG_FILE_NAME)));
    load_config_from(config_path, root, user_config.as_deref())
}

fn load_config_from(
    config_path: Option<&Path>,
    root: &Path,
    user_config: Option<&Path>,
) -> Result<Config> {
    let path = if let Some(path) = config_path {
        path.to_path_buf()
    } else if root.join(CONFIG_FILE_NAME).exists() {
        root.join(CONFIG_FILE_NAME)
    } else {
        match user_config {
            Some(path) if path.exists() => path.to_path_buf(),
            _ => return Ok(Config::default()),
        }
    };

    let text = fs::read_to_string(&path).map_err(|e| {
        ReleaseError::config(format!("cannot read {}: {}", path.display(), e))
    })?;
    toml::from_str(&text).map_err(|e| ReleaseError::config(format!("{}: {}", path.display(), e)))
}
