//! Client settings: where the remote store lives and how to reach it.
//!
//! Settings come from an optional `plansync.yaml`, then environment variables
//! (including a `.env` file next to the settings file) override them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ConfigError, PlanSyncError, Result};
use crate::remote::{BearerToken, DEFAULT_TIMEOUT_SECS};

/// Default remote store URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Settings file names to search for.
pub const DEFAULT_SETTINGS_FILES: &[&str] = &["plansync.yaml", "plansync.yml"];

/// Environment variable overriding the API base URL.
pub const ENV_API_BASE_URL: &str = "PLANSYNC_API_BASE_URL";

/// Environment variable overriding the request timeout.
pub const ENV_TIMEOUT_SECS: &str = "PLANSYNC_TIMEOUT_SECS";

/// Environment variable holding the bearer credential.
pub const ENV_TOKEN: &str = "PLANSYNC_TOKEN";

/// Remote store client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the remote plan store.
    pub api_base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: String::from(DEFAULT_API_BASE_URL),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Loader for [`Settings`].
#[derive(Debug, Default)]
pub struct SettingsLoader {
    /// Directory searched for the settings file and `.env`.
    base_path: Option<PathBuf>,
}

impl SettingsLoader {
    /// Creates a loader rooted at the working directory.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the directory to search from.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads settings from `explicit`, or from the first settings file found.
    ///
    /// Falls back to defaults when no file exists, then applies environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if `explicit` does not exist, a file cannot be parsed,
    /// or an override holds an invalid value.
    pub fn load(&self, explicit: Option<&Path>) -> Result<Settings> {
        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(PlanSyncError::Config(ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                }));
            }
            Some(path) => Some(path.to_path_buf()),
            None => find_settings_file(self.start_dir()).or_else(user_settings_file),
        };

        let env_dir = path
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| self.start_dir(), Path::to_path_buf);
        load_dotenv(&env_dir)?;

        let mut settings = match &path {
            Some(path) => self.load_file(path)?,
            None => {
                debug!("No settings file found, using defaults");
                Settings::default()
            }
        };

        apply_env_overrides(&mut settings, |name| std::env::var(name).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a YAML file without overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Settings> {
        let path = path.as_ref();
        info!("Loading settings from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            PlanSyncError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: path.display().to_string(),
            })
        })?;

        parse_settings(&content, &path.display().to_string())
    }

    fn start_dir(&self) -> PathBuf {
        self.base_path.clone().unwrap_or_else(|| {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        })
    }
}

impl Settings {
    /// Checks the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not HTTP(S) or the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(invalid_value(
                "api_base_url",
                format!("'{}' is not an http(s) URL", self.api_base_url),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(invalid_value("timeout_secs", "must be greater than zero"));
        }
        Ok(())
    }
}

/// Parses settings from YAML.
///
/// # Errors
///
/// Returns an error if the YAML is invalid.
pub fn parse_settings(content: &str, location: &str) -> Result<Settings> {
    debug!("Parsing settings YAML");
    serde_yaml::from_str(content).map_err(|e| {
        PlanSyncError::Config(ConfigError::ParseError {
            message: format!("YAML parse error: {e}"),
            location: location.to_string(),
        })
    })
}

/// Applies environment overrides read through `lookup`.
///
/// # Errors
///
/// Returns an error if the timeout override is not a number.
pub fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(url) = lookup(ENV_API_BASE_URL) {
        debug!("Overriding api_base_url from environment");
        settings.api_base_url = url;
    }

    if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
        debug!("Overriding timeout_secs from environment");
        settings.timeout_secs = raw
            .trim()
            .parse()
            .map_err(|e| invalid_value(ENV_TIMEOUT_SECS, format!("'{raw}': {e}")))?;
    }

    Ok(())
}

/// Resolves the bearer credential: `explicit` first, then `PLANSYNC_TOKEN`.
///
/// # Errors
///
/// Returns an error if neither is set.
pub fn resolve_token(
    explicit: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<BearerToken> {
    explicit
        .or_else(|| lookup(ENV_TOKEN))
        .filter(|token| !token.trim().is_empty())
        .map(BearerToken::new)
        .ok_or_else(|| {
            PlanSyncError::Config(ConfigError::MissingEnvVar {
                name: String::from(ENV_TOKEN),
            })
        })
}

/// Finds a settings file in `start_dir` or any of its parents.
#[must_use]
pub fn find_settings_file(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let mut current = start_dir.as_ref().to_path_buf();

    loop {
        for filename in DEFAULT_SETTINGS_FILES {
            let candidate = current.join(filename);
            if candidate.exists() {
                info!("Found settings file: {}", candidate.display());
                return Some(candidate);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Returns the per-user settings file, if it exists.
#[must_use]
pub fn user_settings_file() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("plansync").join(DEFAULT_SETTINGS_FILES[0]))
        .filter(|path| path.exists())
}

/// Loads `.env` from `dir` if present.
fn load_dotenv(dir: &Path) -> Result<()> {
    let env_path = dir.join(".env");

    if env_path.exists() {
        info!("Loading environment from: {}", env_path.display());
        dotenvy::from_path(&env_path).map_err(|e| {
            PlanSyncError::Config(ConfigError::ParseError {
                message: format!("Failed to load .env file: {e}"),
                location: env_path.display().to_string(),
            })
        })?;
    } else {
        debug!(".env file not found at: {}", env_path.display());
    }

    Ok(())
}

fn invalid_value(field: &str, message: impl Into<String>) -> PlanSyncError {
    PlanSyncError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    })
}
