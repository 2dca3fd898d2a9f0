//! Configuration loading and management

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::language::Language;
use crate::output::Prosody;

/// Environment variable overriding the configured language
pub const LANGUAGE_ENV: &str = "SAVINGS_VOICE_LANG";

const CONFIG_FILE: &str = "config.toml";

/// Daemon configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data and the config file
    pub data_dir: PathBuf,

    /// Initial interface language
    pub language: Language,

    pub prosody: Prosody,

    /// Delay before a mounted screen's guide is spoken
    pub guide_delay_ms: u64,

    /// Cancel in-flight speech when listening starts
    pub interrupt_speech_on_listen: bool,

    /// Optional TOML file with extra command phrases
    pub grammar_path: Option<PathBuf>,
}

/// On-disk shape of `config.toml`; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    socket_path: Option<PathBuf>,
    language: Option<String>,
    prosody: Option<Prosody>,
    guide_delay_ms: Option<u64>,
    interrupt_speech_on_listen: Option<bool>,
    grammar_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment, config file and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::NoHome)?;
        let env_language = std::env::var(LANGUAGE_ENV).ok();

        let config = Self::load_from(Path::new(&home), env_language.as_deref())
            .context("failed to load configuration")?;
        Ok(config)
    }

    /// Load using an explicit home directory and language override
    pub fn load_from(home: &Path, env_language: Option<&str>) -> Result<Self, ConfigError> {
        let data_dir = home.join(".local").join("share").join("savings-voice");
        let mut config = Self::defaults(data_dir);

        let path = config.config_path();
        if path.exists() {
            let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            let file: FileConfig = toml::from_str(&text)?;
            debug!(path = %path.display(), "config file loaded");
            config.apply(file)?;
        }

        if let Some(code) = env_language.filter(|c| !c.trim().is_empty()) {
            config.language = code.parse()?;
            debug!(language = %config.language, "language overridden from environment");
        }

        Ok(config)
    }

    fn defaults(data_dir: PathBuf) -> Self {
        Self {
            socket_path: data_dir.join("voice.sock"),
            data_dir,
            language: Language::default(),
            prosody: Prosody::default(),
            guide_delay_ms: 1000,
            interrupt_speech_on_listen: true,
            grammar_path: None,
        }
    }

    fn apply(&mut self, file: FileConfig) -> Result<(), ConfigError> {
        if let Some(socket_path) = file.socket_path {
            self.socket_path = socket_path;
        }
        if let Some(code) = file.language {
            self.language = code.parse()?;
        }
        if let Some(prosody) = file.prosody {
            self.prosody = prosody;
        }
        if let Some(delay) = file.guide_delay_ms {
            self.guide_delay_ms = delay;
        }
        if let Some(interrupt) = file.interrupt_speech_on_listen {
            self.interrupt_speech_on_listen = interrupt;
        }
        // relative grammar paths resolve against the data dir
        self.grammar_path = file.grammar_path.map(|p| {
            if p.is_relative() {
                self.data_dir.join(p)
            } else {
                p
            }
        });
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}
