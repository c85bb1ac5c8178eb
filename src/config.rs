//! TOML configuration.
//!
//! Every section is optional; a missing file can be replaced with
//! [`Config::minimal`]. Relative paths are resolved against the working
//! directory.
//!
//! ```toml
//! [db]
//! path = "./data/dsakit.sqlite"
//!
//! [workspace]
//! root = "/Users/me/Documents/DSAKit"
//! template_archive = "./assets/Swift.zip"
//! template_root = "Swift"
//! target_file = "Source/Global.swift"
//!
//! [codegen]
//! model = "gemini-2.5-flash"
//! api_key_env = "GEMINI_API_KEY"
//!
//! [editor]
//! command = "code"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub codegen: CodegenConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Defaults for every section, used when no config file is present.
    pub fn minimal() -> Self {
        Self::default()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/dsakit.sqlite")
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkspaceConfig {
    /// Container directory holding one sub-directory per problem.
    #[serde(default = "default_workspace_root")]
    pub root: PathBuf,
    #[serde(default = "default_template_archive")]
    pub template_archive: PathBuf,
    /// Directory inside the archive that becomes the workspace. An empty
    /// string selects the archive's single top-level directory.
    #[serde(default = "default_template_root")]
    pub template_root: Option<String>,
    /// File overwritten with the generated code, relative to the workspace.
    #[serde(default = "default_target_file")]
    pub target_file: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_workspace_root(),
            template_archive: default_template_archive(),
            template_root: default_template_root(),
            target_file: default_target_file(),
        }
    }
}

/// `<documents>/DSAKit`, falling back to `~/Documents/DSAKit`.
fn default_workspace_root() -> PathBuf {
    let documents = dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .unwrap_or_else(|| PathBuf::from("Documents"));
    documents.join("DSAKit")
}

fn default_template_archive() -> PathBuf {
    PathBuf::from("./assets/Swift.zip")
}

fn default_template_root() -> Option<String> {
    Some("Swift".to_string())
}

fn default_target_file() -> PathBuf {
    PathBuf::from("Source/Global.swift")
}

#[derive(Debug, Deserialize, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_prompt_template")]
    pub template: PathBuf,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template: default_prompt_template(),
        }
    }
}

fn default_prompt_template() -> PathBuf {
    PathBuf::from("./assets/Prompt.md")
}

#[derive(Debug, Deserialize, Clone)]
pub struct CodegenConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_codegen_timeout_secs")]
    pub timeout_secs: u64,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_codegen_timeout_secs(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl CodegenConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key_from_env(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok()
    }
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1".to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_temperature() -> f64 {
    0.2
}
fn default_codegen_timeout_secs() -> u64 {
    120
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) \
     Version/17.0 Safari/605.1.15"
        .to_string()
}
fn default_fetch_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// URL prefixes accepted by the validation gate.
    #[serde(default = "default_allowed_prefixes")]
    pub allowed_prefixes: Vec<String>,
    /// Fail with `ProblemNotFound` instead of continuing with empty metadata.
    #[serde(default)]
    pub require_problem_data: bool,
    #[serde(default = "default_true")]
    pub launch_editor: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            allowed_prefixes: default_allowed_prefixes(),
            require_problem_data: false,
            launch_editor: true,
        }
    }
}

fn default_allowed_prefixes() -> Vec<String> {
    vec!["https://leetcode.com/problems/".to_string()]
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditorConfig {
    /// Executable to run; empty falls back to the platform opener.
    #[serde(default = "default_editor_command")]
    pub command: String,
    /// Arguments placed before the workspace path.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            command: default_editor_command(),
            args: Vec::new(),
        }
    }
}

fn default_editor_command() -> String {
    "code".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Browser origins allowed to call the API cross-origin, e.g.
    /// `"http://localhost:5173"`. Empty disables CORS entirely.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_origins: Vec::new(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.pipeline.allowed_prefixes.is_empty() {
        anyhow::bail!("pipeline.allowed_prefixes must not be empty");
    }

    if !(0.0..=2.0).contains(&config.codegen.temperature) {
        anyhow::bail!("codegen.temperature must be in [0.0, 2.0]");
    }

    if config.codegen.model.trim().is_empty() {
        anyhow::bail!("codegen.model must not be empty");
    }

    if let Some(origin) = config
        .server
        .allowed_origins
        .iter()
        .find(|o| o.trim() == "*" || !o.contains("://"))
    {
        anyhow::bail!(
            "server.allowed_origins entries must be full origins like http://localhost:5173, got '{}'",
            origin
        );
    }

    if config.workspace.target_file.is_absolute() {
        anyhow::bail!(
            "workspace.target_file must be relative to the workspace: {}",
            config.workspace.target_file.display()
        );
    }

    Ok(())
}
