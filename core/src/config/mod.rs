use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use ghsh_utils_home_dir::GhshDirs;
use serde::Deserialize;

use crate::ghost::prompts::SYSTEM_PROMPT;

pub const CONFIG_TOML_FILE: &str = "config.toml";

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_MAX_HISTORY_MESSAGES: usize = 20;
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 8192;
pub const DEFAULT_MAX_FOLLOWUP_ATTEMPTS: u32 = 50;
pub const DEFAULT_PREVIEW_WINDOW_MS: u64 = 1500;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// File under the user's home directory that keeps interactive command
/// history.
pub const HISTORY_FILENAME: &str = ".ghost_history";

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Model requested from the completion service.
    pub model: String,

    /// Chat Completions base URL. `None` uses the public OpenAI endpoint.
    pub base_url: Option<String>,

    /// Name of the environment variable holding the API key.
    pub api_key_env: String,

    /// System instructions sent ahead of every AI request.
    pub system_prompt: String,

    pub max_history_messages: usize,
    pub max_message_bytes: usize,

    /// Ceiling on analyse/follow-up cycles for one `call`.
    pub max_followup_attempts: u32,

    /// How long an AI-suggested command stays editable before it runs.
    pub preview_window: Duration,

    pub request_timeout: Option<Duration>,

    /// Persisted command history. `None` disables persistence.
    pub history_file: Option<PathBuf>,

    /// Directory containing `config.toml` and `log/`.
    pub ghsh_home: PathBuf,
}

/// Base config deserialized from `<ghsh_home>/config.toml`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key_env: Option<String>,
    pub system_prompt: Option<String>,
    pub max_history_messages: Option<usize>,
    pub max_message_bytes: Option<usize>,
    pub max_followup_attempts: Option<u32>,
    pub preview_window_ms: Option<u64>,
    /// `0` disables the client-side timeout.
    pub request_timeout_secs: Option<u64>,
    pub history_file: Option<PathBuf>,
}

/// Optional overrides supplied on the command line.
#[derive(Default, Debug, Clone)]
pub struct ConfigOverrides {
    pub model: Option<String>,
}

impl Config {
    /// Loads `config.toml` from the ghsh home directory and applies
    /// `overrides`. A missing file yields the defaults.
    pub fn load_with_overrides(overrides: ConfigOverrides) -> std::io::Result<Self> {
        let dirs = GhshDirs::discover()?;
        let mut cfg = load_config_as_toml(dirs.config_home())?;
        if cfg.history_file.is_none() {
            cfg.history_file = dirs.dotfile(HISTORY_FILENAME);
        }
        Ok(Self::load_from_base_config_with_overrides(
            cfg,
            overrides,
            dirs.config_home().to_path_buf(),
        ))
    }

    pub fn load_from_base_config_with_overrides(
        cfg: ConfigToml,
        overrides: ConfigOverrides,
        ghsh_home: PathBuf,
    ) -> Self {
        let ConfigOverrides { model } = overrides;

        let request_timeout = match cfg
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
        {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Self {
            model: model
                .or(cfg.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: cfg.base_url,
            api_key_env: cfg
                .api_key_env
                .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string()),
            system_prompt: cfg
                .system_prompt
                .unwrap_or_else(|| SYSTEM_PROMPT.to_string()),
            max_history_messages: cfg
                .max_history_messages
                .unwrap_or(DEFAULT_MAX_HISTORY_MESSAGES)
                .max(1),
            max_message_bytes: cfg
                .max_message_bytes
                .unwrap_or(DEFAULT_MAX_MESSAGE_BYTES)
                .max(1),
            max_followup_attempts: cfg
                .max_followup_attempts
                .unwrap_or(DEFAULT_MAX_FOLLOWUP_ATTEMPTS),
            preview_window: Duration::from_millis(
                cfg.preview_window_ms.unwrap_or(DEFAULT_PREVIEW_WINDOW_MS),
            ),
            request_timeout,
            history_file: cfg.history_file,
            ghsh_home,
        }
    }
}

/// Reads `config.toml` from `ghsh_home`. A missing file is not an error; a
/// malformed one is reported as `InvalidData` naming the file.
pub fn load_config_as_toml(ghsh_home: &Path) -> std::io::Result<ConfigToml> {
    let path = ghsh_home.join(CONFIG_TOML_FILE);
    match std::fs::read_to_string(&path) {
        Ok(contents) => toml::from_str::<ConfigToml>(&contents).map_err(|err| {
            tracing::error!("Failed to parse {}: {err}", path.display());
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{}: {err}", path.display()),
            )
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("{} not found, using defaults", path.display());
            Ok(ConfigToml::default())
        }
        Err(err) => {
            tracing::error!("Failed to read {}: {err}", path.display());
            Err(err)
        }
    }
}

/// Returns the path to the folder where ghsh logs are stored. Does not verify
/// that the directory exists.
pub fn log_dir(cfg: &Config) -> PathBuf {
    cfg.ghsh_home.join("log")
}
