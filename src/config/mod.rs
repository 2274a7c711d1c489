use crate::models::UserConfig;
use ::config::{Config, Environment, File, FileFormat};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Name of the settings file inside the config directory.
pub const USER_CONFIG_FILE: &str = "imgrename.yaml";

/// Prefix of environment variables overriding settings, e.g. `IMGRENAME_ON_ERROR=abort`.
pub const ENV_PREFIX: &str = "IMGRENAME";

/// Resolve the per-user configuration directory (`<config>/imgrename`).
///
/// Falls back to the working directory when the platform has no config
/// directory or it is not valid UTF-8.
pub fn default_config_dir() -> Utf8PathBuf {
    dirs::config_dir()
        .and_then(|dir| Utf8PathBuf::from_path_buf(dir.join(crate::APP_NAME)).ok())
        .unwrap_or_else(|| Utf8PathBuf::from("."))
}

/// Configuration manager for loading and saving the user settings file.
///
/// Settings are read as layers: the YAML file (optional) first, then
/// `IMGRENAME_*` environment variables on top.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    user_config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager, creating `config_dir` if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            user_config_path: config_dir.join(USER_CONFIG_FILE),
            config_dir,
        })
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn user_config_path(&self) -> &Utf8Path {
        &self.user_config_path
    }

    /// Load the user configuration.
    ///
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load_user_config(&self) -> Result<UserConfig> {
        self.load_with_environment(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn load_with_environment(&self, environment: Environment) -> Result<UserConfig> {
        if !self.user_config_path.exists() {
            tracing::info!(
                "User config file not found at {}, using defaults",
                self.user_config_path
            );
        }

        let settings = Config::builder()
            .add_source(File::new(self.user_config_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(environment)
            .build()
            .with_context(|| format!("Failed to read user config: {}", self.user_config_path))?;

        let config: UserConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse user config: {}", self.user_config_path))?;

        tracing::debug!("Loaded user config from {}", self.user_config_path);
        Ok(config)
    }

    /// Load the user configuration, logging and falling back to defaults on error.
    pub fn load_user_config_or_default(&self) -> UserConfig {
        self.load_user_config().unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable user config: {:#}", e);
            UserConfig::default()
        })
    }

    /// Save the user configuration file.
    pub fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize user config to YAML")?;

        fs::write(&self.user_config_path, yaml_string)
            .with_context(|| format!("Failed to write user config: {}", self.user_config_path))?;

        tracing::info!("Saved user config to {}", self.user_config_path);
        Ok(())
    }

    /// Persist `directory` as the last used one. Failures are logged only.
    pub fn remember_directory(&self, directory: &Utf8Path) {
        let mut config = self.load_user_config_or_default();
        if config.last_directory.as_deref() == Some(directory) {
            return;
        }

        config.last_directory = Some(directory.to_path_buf());
        if let Err(e) = self.save_user_config(&config) {
            tracing::warn!("Could not remember directory {}: {:#}", directory, e);
        }
    }
}
