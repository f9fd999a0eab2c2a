//! Layered configuration for Aether.
//!
//! Settings are read from `.aether/aether.toml` in the project directory,
//! falling back to `<user config dir>/aether/aether.toml`, then to built-in
//! defaults. Environment variables override the file and CLI flags override
//! both (file → environment → CLI).
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! base_url = "http://127.0.0.1:4040"
//! timeout_secs = 15
//! generation_timeout_secs = 120
//!
//! [board]
//! org_id = "acme"
//! include_done = false
//! notice_ttl_ms = 3000
//!
//! [user]
//! id = 7
//! name = "Dana"
//! role = "member"
//!
//! [ai]
//! language = "en"
//! depth = "standard"
//! progress_interval_ms = 2500
//!
//! [export]
//! output_dir = "exports"
//! author = "Dana"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 4040
//! cors = false
//! seed_demo = false
//! ```

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::artifact::card::CardOptions;
use crate::artifact::models::AnalysisDepth;
use crate::board::models::{Role, User, UserId};
use crate::client::ClientConfig;
use crate::server::ServerConfig;

pub const CONFIG_DIR: &str = ".aether";
pub const CONFIG_FILE: &str = "aether.toml";

static LANGUAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,3}(-[A-Za-z0-9]{2,8})?$").unwrap());

/// Remote store endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for every ordinary request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Timeout for AI generation requests
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:4040".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_generation_timeout_secs() -> u64 {
    120
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            generation_timeout_secs: default_generation_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSection {
    #[serde(default = "default_org_id")]
    pub org_id: String,
    /// Show the Done column
    #[serde(default)]
    pub include_done: bool,
    /// How long a banner stays visible
    #[serde(default = "default_notice_ttl_ms")]
    pub notice_ttl_ms: u64,
}

fn default_org_id() -> String {
    "default".to_string()
}

fn default_notice_ttl_ms() -> u64 {
    3000
}

impl Default for BoardSection {
    fn default() -> Self {
        Self {
            org_id: default_org_id(),
            include_done: false,
            notice_ttl_ms: default_notice_ttl_ms(),
        }
    }
}

/// The acting user. Without an id, board mutations are refused locally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSection {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSection {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub depth: AnalysisDepth,
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_progress_interval_ms() -> u64 {
    2500
}

impl Default for AiSection {
    fn default() -> Self {
        Self {
            language: default_language(),
            depth: AnalysisDepth::default(),
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSection {
    /// Relative paths resolve against the project directory
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub author: Option<String>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("exports")
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            author: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors: bool,
    /// Fill the configured org with demo tasks on startup
    #[serde(default)]
    pub seed_demo: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4040
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: false,
            seed_demo: false,
        }
    }
}

/// Contents of `aether.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AetherToml {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub board: BoardSection,
    #[serde(default)]
    pub user: UserSection,
    #[serde(default)]
    pub ai: AiSection,
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub server: ServerSection,
}

impl AetherToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse aether.toml")
    }

    /// Load `aether.toml` from `dir`, or defaults if the file doesn't exist.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize aether.toml")?;
        std::fs::write(path, content).with_context(|| {
            format!("Failed to write config file: {}", path.display())
        })?;
        Ok(())
    }

    /// Apply `AETHER_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup. Unparseable values
    /// are logged and ignored.
    pub fn apply_env_with(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(url) = get("AETHER_API_URL") {
            self.api.base_url = url;
        }
        if let Some(org) = get("AETHER_ORG") {
            self.board.org_id = org;
        }
        if let Some(id) = get("AETHER_USER_ID") {
            match id.trim().parse::<UserId>() {
                Ok(id) => self.user.id = Some(id),
                Err(_) => tracing::warn!(value = %id, "ignoring invalid AETHER_USER_ID"),
            }
        }
        if let Some(role) = get("AETHER_ROLE") {
            match role.parse::<Role>() {
                Ok(role) => self.user.role = role,
                Err(e) => tracing::warn!(error = %e, "ignoring invalid AETHER_ROLE"),
            }
        }
        if let Some(language) = get("AETHER_LANGUAGE") {
            self.ai.language = language;
        }
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"))
        {
            warnings.push(format!(
                "Invalid api.base_url '{}': must start with http:// or https://",
                self.api.base_url
            ));
        }
        if self.api.timeout_secs == 0 {
            warnings.push("api.timeout_secs must be greater than 0".to_string());
        }
        if self.api.generation_timeout_secs == 0 {
            warnings.push(
                "api.generation_timeout_secs must be greater than 0".to_string(),
            );
        } else if self.api.generation_timeout_secs < self.api.timeout_secs {
            warnings.push(format!(
                "api.generation_timeout_secs ({}) is shorter than api.timeout_secs ({})",
                self.api.generation_timeout_secs, self.api.timeout_secs
            ));
        }
        if self.board.org_id.trim().is_empty() {
            warnings.push("board.org_id must not be empty".to_string());
        }
        if self.board.notice_ttl_ms == 0 {
            warnings.push("board.notice_ttl_ms must be greater than 0".to_string());
        }
        if !LANGUAGE_RE.is_match(&self.ai.language) {
            warnings.push(format!(
                "Invalid ai.language '{}': expected a language code such as 'en' or 'pt-BR'",
                self.ai.language
            ));
        }
        if self.ai.progress_interval_ms == 0 {
            warnings.push("ai.progress_interval_ms must be greater than 0".to_string());
        }
        if self.user.id.is_none() {
            warnings.push(
                "user.id is not set; board changes will be refused".to_string(),
            );
        }

        warnings
    }
}

/// Where the active configuration file came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Project(PathBuf),
    User(PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Project(p) | ConfigSource::User(p) => write!(f, "{}", p.display()),
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Flags that take precedence over file and environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_url: Option<String>,
    pub verbose: bool,
    pub yes: bool,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AetherConfig {
    pub project_dir: PathBuf,
    pub source: ConfigSource,
    pub toml: AetherToml,
    pub verbose: bool,
    pub yes: bool,
}

impl AetherConfig {
    /// Resolve configuration for `project_dir` from file and environment.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let user_dir = dirs::config_dir().map(|d| d.join("aether"));
        let env = |name: &str| std::env::var(name).ok();
        Self::resolve(project_dir, user_dir.as_deref(), env)
    }

    /// Resolve configuration and apply CLI overrides.
    pub fn with_cli_args(project_dir: PathBuf, cli: CliOverrides) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        if let Some(url) = cli.api_url {
            config.toml.api.base_url = url;
        }
        config.verbose = cli.verbose;
        config.yes = cli.yes;
        Ok(config)
    }

    fn resolve(
        project_dir: PathBuf,
        user_dir: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let project_file = project_dir.join(CONFIG_DIR).join(CONFIG_FILE);
        let user_file = user_dir.map(|d| d.join(CONFIG_FILE));

        let (mut toml, source) = if project_file.exists() {
            (
                AetherToml::load(&project_file)?,
                ConfigSource::Project(project_file),
            )
        } else if let Some(user_file) = user_file.filter(|p| p.exists()) {
            (AetherToml::load(&user_file)?, ConfigSource::User(user_file))
        } else {
            (AetherToml::default(), ConfigSource::Defaults)
        };
        toml.apply_env_with(env);
        tracing::debug!(source = %source, "configuration loaded");

        Ok(Self {
            project_dir,
            source,
            toml,
            verbose: false,
            yes: false,
        })
    }

    /// Path of the project-level configuration file.
    pub fn project_config_path(&self) -> PathBuf {
        self.project_dir.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    pub fn org_id(&self) -> &str {
        &self.toml.board.org_id
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.toml.api.base_url.clone(),
            timeout: Duration::from_secs(self.toml.api.timeout_secs),
            generation_timeout: Duration::from_secs(self.toml.api.generation_timeout_secs),
        }
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.toml.board.notice_ttl_ms)
    }

    /// The acting user, if an id is configured.
    pub fn user(&self) -> Option<User> {
        self.toml.user.id.map(|id| User {
            id,
            name: self.toml.user.name.clone().unwrap_or_default(),
            role: self.toml.user.role,
        })
    }

    pub fn card_options(&self) -> CardOptions {
        CardOptions {
            language: self.toml.ai.language.clone(),
            depth: self.toml.ai.depth,
            progress_interval: Duration::from_millis(self.toml.ai.progress_interval_ms),
        }
    }

    /// Export directory, resolved against the project directory.
    pub fn export_dir(&self) -> PathBuf {
        let dir = &self.toml.export.output_dir;
        if dir.is_absolute() {
            dir.clone()
        } else {
            self.project_dir.join(dir)
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        let server = &self.toml.server;
        ServerConfig {
            host: server.host.clone(),
            port: server.port,
            cors: server.cors,
            seed_org: server.seed_demo.then(|| self.toml.board.org_id.clone()),
        }
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let toml = AetherToml::parse("").unwrap();
        assert_eq!(toml.api.base_url, "http://127.0.0.1:4040");
        assert_eq!(toml.api.timeout_secs, 15);
        assert_eq!(toml.api.generation_timeout_secs, 120);
        assert_eq!(toml.board.notice_ttl_ms, 3000);
        assert_eq!(toml.ai.language, "en");
        assert_eq!(toml.ai.depth, AnalysisDepth::Standard);
        assert_eq!(toml.user.role, Role::Member);
    }

    #[test]
    fn test_parse_sections() {
        let content = r#"
[board]
org_id = "acme"
include_done = true

[user]
id = 7
role = "manager"

[ai]
language = "fr"
depth = "deep"
"#;
        let toml = AetherToml::parse(content).unwrap();
        assert_eq!(toml.board.org_id, "acme");
        assert!(toml.board.include_done);
        assert_eq!(toml.user.id, Some(7));
        assert_eq!(toml.user.role, Role::Manager);
        assert_eq!(toml.ai.depth, AnalysisDepth::Deep);
        assert_eq!(toml.api.timeout_secs, 15);
    }

    #[test]
    fn test_parse_rejects_bad_role() {
        assert!(AetherToml::parse("[user]\nrole = \"owner\"\n").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("AETHER_API_URL", "https://tasks.example.com"),
            ("AETHER_ORG", "beta"),
            ("AETHER_USER_ID", "12"),
            ("AETHER_ROLE", "Admin"),
            ("AETHER_LANGUAGE", "de"),
        ]
        .into_iter()
        .collect();
        let mut toml = AetherToml::default();
        toml.apply_env_with(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(toml.api.base_url, "https://tasks.example.com");
        assert_eq!(toml.board.org_id, "beta");
        assert_eq!(toml.user.id, Some(12));
        assert_eq!(toml.user.role, Role::Admin);
        assert_eq!(toml.ai.language, "de");
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let mut toml = AetherToml::default();
        toml.user.id = Some(3);
        toml.apply_env_with(|k| match k {
            "AETHER_USER_ID" => Some("not-a-number".into()),
            "AETHER_ROLE" => Some("owner".into()),
            _ => None,
        });
        assert_eq!(toml.user.id, Some(3));
        assert_eq!(toml.user.role, Role::Member);
    }

    #[test]
    fn test_validate_defaults_only_warns_about_user() {
        let warnings = AetherToml::default().validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("user.id"));
    }

    #[test]
    fn test_validate_flags_bad_values() {
        let mut toml = AetherToml::default();
        toml.user.id = Some(1);
        toml.api.base_url = "ftp://tasks".into();
        toml.api.timeout_secs = 0;
        toml.board.notice_ttl_ms = 0;
        toml.ai.language = "English".into();
        let warnings = toml.validate();
        assert!(warnings.iter().any(|w| w.contains("api.base_url")));
        assert!(warnings.iter().any(|w| w.contains("api.timeout_secs")));
        assert!(warnings.iter().any(|w| w.contains("notice_ttl_ms")));
        assert!(warnings.iter().any(|w| w.contains("ai.language")));
    }

    #[test]
    fn test_language_codes() {
        for ok in ["en", "fr", "pt-BR", "zh-Hant"] {
            assert!(LANGUAGE_RE.is_match(ok), "{}", ok);
        }
        for bad in ["", "e", "EN", "english", "en_US"] {
            assert!(!LANGUAGE_RE.is_match(bad), "{}", bad);
        }
    }

    #[test]
    fn test_load_and_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_DIR).join(CONFIG_FILE);

        let mut toml = AetherToml::default();
        toml.board.org_id = "acme".into();
        toml.user.id = Some(4);
        toml.save(&path).unwrap();

        let loaded = AetherToml::load(&path).unwrap();
        assert_eq!(loaded.board.org_id, "acme");
        assert_eq!(loaded.user.id, Some(4));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let toml = AetherToml::load_or_default(dir.path()).unwrap();
        assert_eq!(toml.board.org_id, "default");
    }

    #[test]
    fn test_resolve_prefers_project_over_user() {
        let project = tempdir().unwrap();
        let user = tempdir().unwrap();
        std::fs::write(
            user.path().join(CONFIG_FILE),
            "[board]\norg_id = \"user-org\"\n",
        )
        .unwrap();

        let config =
            AetherConfig::resolve(project.path().to_path_buf(), Some(user.path()), no_env).unwrap();
        assert_eq!(config.org_id(), "user-org");
        assert!(matches!(config.source, ConfigSource::User(_)));

        std::fs::create_dir_all(project.path().join(CONFIG_DIR)).unwrap();
        std::fs::write(
            project.path().join(CONFIG_DIR).join(CONFIG_FILE),
            "[board]\norg_id = \"project-org\"\n",
        )
        .unwrap();
        let config =
            AetherConfig::resolve(project.path().to_path_buf(), Some(user.path()), no_env).unwrap();
        assert_eq!(config.org_id(), "project-org");
        assert!(matches!(config.source, ConfigSource::Project(_)));
    }

    #[test]
    fn test_resolve_defaults_then_env() {
        let project = tempdir().unwrap();
        let config = AetherConfig::resolve(project.path().to_path_buf(), None, |k| {
            (k == "AETHER_ORG").then(|| "env-org".to_string())
        })
        .unwrap();
        assert_eq!(config.source, ConfigSource::Defaults);
        assert_eq!(config.org_id(), "env-org");
    }

    #[test]
    fn test_derived_views() {
        let project = tempdir().unwrap();
        let mut config = AetherConfig::resolve(project.path().to_path_buf(), None, no_env).unwrap();
        assert!(config.user().is_none());

        config.toml.user.id = Some(9);
        config.toml.user.role = Role::Admin;
        config.toml.server.seed_demo = true;
        config.toml.api.generation_timeout_secs = 300;

        assert_eq!(config.user().unwrap().role, Role::Admin);
        assert_eq!(
            config.client_config().generation_timeout,
            Duration::from_secs(300)
        );
        assert_eq!(config.notice_ttl(), Duration::from_secs(3));
        assert_eq!(
            config.card_options().progress_interval,
            Duration::from_millis(2500)
        );
        assert_eq!(config.export_dir(), project.path().join("exports"));
        assert_eq!(config.server_config().seed_org.as_deref(), Some("default"));
    }
}
