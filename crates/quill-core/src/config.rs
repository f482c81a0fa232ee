//! Configuration management for quill.
//!
//! Configuration is loaded from multiple sources and merged:
//! 1. Global config: `~/.config/quill/config.json`
//! 2. Project config: `quill.json` or `quill.jsonc` in the repository root
//! 3. Environment overrides: `QUILL_*` variables
//!
//! Project files may contain `//` and `/* */` comments.

use crate::error::{ConfigError, RepoResult};
use crate::staging::DEFAULT_STAGING_CAPACITY;
use crate::undo::DEFAULT_UNDO_CAPACITY;
use quill_util::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Directory inside the repository root holding quill's own files.
pub const QUILL_DIR: &str = ".quill";

/// Project config file names, in lookup order.
const PROJECT_FILES: [&str; 2] = ["quill.jsonc", "quill.json"];

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,

    /// Maximum number of staged entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_capacity: Option<usize>,

    /// Maximum number of undoable commits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undo_capacity: Option<usize>,

    /// Snapshot directory, relative to the repository root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_dir: Option<PathBuf>,

    /// Keep history across processes in `.quill/state.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist: Option<bool>,
}

impl Config {
    /// Load configuration from all sources.
    pub async fn load(project_dir: Option<&Path>) -> RepoResult<(Self, Vec<PathBuf>)> {
        Self::load_with(
            Self::global_config_dir().as_deref(),
            project_dir,
            |name| std::env::var(name).ok(),
        )
        .await
    }

    /// Load from explicit sources. `env` resolves `QUILL_*` overrides.
    pub async fn load_with<F>(
        global_dir: Option<&Path>,
        project_dir: Option<&Path>,
        env: F,
    ) -> RepoResult<(Self, Vec<PathBuf>)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let mut sources = Vec::new();

        if let Some(dir) = global_dir {
            let path = dir.join("config.json");
            if path.exists() {
                config = config.merge(Self::load_file(&path).await?);
                sources.push(path);
            }
        }

        if let Some(dir) = project_dir {
            for name in PROJECT_FILES {
                let path = dir.join(name);
                if path.exists() {
                    config = config.merge(Self::load_file(&path).await?);
                    sources.push(path);
                    break;
                }
            }
        }

        let config = config.apply_env(env)?;
        config.validate()?;
        Ok((config, sources))
    }

    /// Get the global config directory.
    pub fn global_config_dir() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            if let Some(home) = dirs::home_dir() {
                let xdg_config = home.join(".config").join("quill");
                if xdg_config.exists() {
                    return Some(xdg_config);
                }
            }
        }

        dirs::config_dir().map(|d| d.join("quill"))
    }

    /// Load configuration from a file.
    pub async fn load_file(path: &Path) -> RepoResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse_jsonc(&content, &path.display().to_string())
    }

    /// Save to `{project_dir}/quill.json`, or the global config when `None`.
    pub async fn save(&self, project_dir: Option<&Path>) -> RepoResult<PathBuf> {
        let path = match project_dir {
            Some(dir) => dir.join("quill.json"),
            None => {
                let global_dir = Self::global_config_dir().ok_or_else(|| {
                    ConfigError::InvalidPath("could not determine config directory".to_string())
                })?;
                tokio::fs::create_dir_all(&global_dir).await?;
                global_dir.join("config.json")
            }
        };

        let content = serde_json::to_string_pretty(self).map_err(|e| ConfigError::InvalidJson {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        quill_util::atomic_write(&path, content.as_bytes()).await?;
        tracing::info!("Saved configuration to {}", path.display());
        Ok(path)
    }

    /// Apply `QUILL_*` environment overrides.
    pub fn apply_env<F>(mut self, env: F) -> RepoResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = env("QUILL_LOG_LEVEL") {
            let level = LogLevel::parse(value.trim()).ok_or_else(|| ConfigError::Validation {
                message: format!("QUILL_LOG_LEVEL: unknown level {value:?}"),
            })?;
            self.log_level = Some(level);
        }
        if let Some(value) = env("QUILL_STAGING_CAPACITY") {
            self.staging_capacity = Some(parse_env("QUILL_STAGING_CAPACITY", &value)?);
        }
        if let Some(value) = env("QUILL_UNDO_CAPACITY") {
            self.undo_capacity = Some(parse_env("QUILL_UNDO_CAPACITY", &value)?);
        }
        if let Some(value) = env("QUILL_PERSIST") {
            self.persist = Some(parse_env("QUILL_PERSIST", &value)?);
        }
        Ok(self)
    }

    /// Reject settings the engine cannot honour.
    pub fn validate(&self) -> RepoResult<()> {
        if self.staging_capacity == Some(0) {
            return Err(ConfigError::Validation {
                message: "staging_capacity must be at least 1".to_string(),
            }
            .into());
        }
        if self.undo_capacity == Some(0) {
            return Err(ConfigError::Validation {
                message: "undo_capacity must be at least 1".to_string(),
            }
            .into());
        }
        if let Some(dir) = &self.snapshot_dir {
            let escapes = dir
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
            if escapes || inside_root(dir).as_os_str().is_empty() {
                return Err(ConfigError::Validation {
                    message: format!(
                        "snapshot_dir must name a directory inside the repository: {:?}",
                        dir
                    ),
                }
                .into());
            }
        }
        Ok(())
    }

    pub fn staging_capacity(&self) -> usize {
        self.staging_capacity.unwrap_or(DEFAULT_STAGING_CAPACITY)
    }

    pub fn undo_capacity(&self) -> usize {
        self.undo_capacity.unwrap_or(DEFAULT_UNDO_CAPACITY)
    }

    pub fn persist(&self) -> bool {
        self.persist.unwrap_or(true)
    }

    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level
    }

    /// Snapshot directory relative to the repository root, with `.`
    /// components dropped.
    pub fn snapshot_dir(&self) -> PathBuf {
        match &self.snapshot_dir {
            Some(dir) => inside_root(dir),
            None => Path::new(QUILL_DIR).join("snapshots"),
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(self, other: Self) -> Self {
        Self {
            log_level: other.log_level.or(self.log_level),
            staging_capacity: other.staging_capacity.or(self.staging_capacity),
            undo_capacity: other.undo_capacity.or(self.undo_capacity),
            snapshot_dir: other.snapshot_dir.or(self.snapshot_dir),
            persist: other.persist.or(self.persist),
        }
    }

    /// Parse JSONC (JSON with comments).
    fn parse_jsonc(content: &str, source: &str) -> RepoResult<Self> {
        let stripped = strip_comments(content);
        serde_json::from_str(&stripped).map_err(|e| {
            ConfigError::InvalidJson {
                path: source.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

/// The normal components of a root-relative path.
fn inside_root(dir: &Path) -> PathBuf {
    dir.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> RepoResult<T> {
    value.trim().parse().map_err(|_| {
        ConfigError::Validation {
            message: format!("{name}: cannot parse {value:?}"),
        }
        .into()
    })
}

/// Remove `//` and `/* */` comments outside string literals. Newlines
/// inside comments are kept so parse errors report the right line.
fn strip_comments(input: &str) -> String {
    enum Mode {
        Code,
        Str,
        StrEscape,
        Line,
        Block,
    }

    let mut out = String::with_capacity(input.len());
    let mut mode = Mode::Code;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        let next = chars.peek().copied();
        match mode {
            Mode::Code => match (c, next) {
                ('/', Some('/')) => {
                    chars.next();
                    mode = Mode::Line;
                }
                ('/', Some('*')) => {
                    chars.next();
                    mode = Mode::Block;
                }
                ('"', _) => {
                    out.push(c);
                    mode = Mode::Str;
                }
                _ => out.push(c),
            },
            Mode::Str => {
                out.push(c);
                mode = match c {
                    '\\' => Mode::StrEscape,
                    '"' => Mode::Code,
                    _ => Mode::Str,
                };
            }
            Mode::StrEscape => {
                out.push(c);
                mode = Mode::Str;
            }
            Mode::Line => {
                if c == '\n' {
                    out.push(c);
                    mode = Mode::Code;
                }
            }
            Mode::Block => {
                if c == '\n' {
                    out.push(c);
                } else if c == '*' && next == Some('/') {
                    chars.next();
                    mode = Mode::Code;
                }
            }
        }
    }

    out
}
