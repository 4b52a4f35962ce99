//! Configuration file handling.
//!
//! The configuration file is stored at `$DAILY_HOME/config.json` and holds the record schema chosen
//! when the data directory was created, the display-only user id, backup settings, the
//! generative model to use and the weather location.

use crate::backup::Backup;
use crate::error::{ErrorType, IntoResult};
use crate::model::SchemaVariant;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "daily-tools";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const SECRETS: &str = ".secrets";
const BACKUPS: &str = ".backups";
const API_KEY: &str = "api_key";
const CONFIG_JSON: &str = "config.json";
const RECORDS_JSON: &str = "records.json";

/// Environment variable that takes precedence over the API key file.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$DAILY_HOME` and from there it loads `$DAILY_HOME/config.json`. It provides paths
/// to the other items that are expected in a certain location within the data directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    records_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the data directory and its subdirectories, then writes an initial `config.json`
    /// using `schema` along with default settings.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the data directory, e.g. `$HOME/daily-tools`
    /// - `schema` - The daily record schema. It cannot be changed later.
    ///
    /// # Errors
    /// - Returns an error if the directory already holds a configuration file.
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, schema: SchemaVariant) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the data directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A configuration file already exists at '{}'",
                config_path.display()
            );
        }

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;
        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        let config_file = ConfigFile {
            schema,
            user_id: utils::generate_user_id(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            records_path: root.join(RECORDS_JSON),
            root,
            backups,
            secrets,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that the data directory exists and that the config file exists
    /// - load the config file
    /// - validate that the backups and secrets directories exist
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(home.into())
            .await
            .context("Run 'daily init' to create the data directory")
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(home: PathBuf) -> Result<Self> {
        let root = utils::canonicalize(&home)
            .await
            .context("The data directory is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let config = Self {
            backups: root.join(BACKUPS),
            secrets: root.join(SECRETS),
            records_path: root.join(RECORDS_JSON),
            root,
            config_path,
            config_file,
        };
        if !config.backups.is_dir() {
            bail!(
                "The backups directory is missing '{}'",
                config.backups.display()
            )
        }
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The durable storage slot holding the record snapshot.
    pub fn records_path(&self) -> &Path {
        &self.records_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn schema(&self) -> SchemaVariant {
        self.config_file.schema
    }

    pub fn user_id(&self) -> &str {
        &self.config_file.user_id
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    pub fn model(&self) -> &str {
        &self.config_file.model
    }

    pub fn weather(&self) -> &WeatherSettings {
        &self.config_file.weather
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }

    /// Returns the stored `api_key_path` if it is absolute, otherwise resolves it against the
    /// data directory.
    pub fn api_key_path(&self) -> PathBuf {
        let p = self.config_file.api_key_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// Returns the generative backend API key from `GEMINI_API_KEY`, or from the key file.
    pub async fn api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(key.trim().to_string());
            }
        }
        let path = self.api_key_path();
        let key = utils::read(&path).await.with_context(|| {
            format!(
                "No API key found. Set {API_KEY_ENV} or write the key to '{}'",
                path.display()
            )
        })?;
        let key = key.trim();
        anyhow::ensure!(!key.is_empty(), "The API key file '{}' is empty", path.display());
        Ok(key.to_string())
    }
}

/// The fixed location and refresh interval of the weather widget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSettings {
    pub latitude: f64,
    pub longitude: f64,
    /// IANA timezone used for the hourly forecast.
    pub timezone: String,
    pub refresh_minutes: u32,
}

impl Default for WeatherSettings {
    /// Bangkok.
    fn default() -> Self {
        Self {
            latitude: 13.7563,
            longitude: 100.5018,
            timezone: "Asia/Bangkok".to_string(),
            refresh_minutes: 30,
        }
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "daily-tools",
///   "config_version": 1,
///   "schema": "fixed_fields",
///   "user_id": "user_k3x9a0qz",
///   "backup_copies": 5,
///   "model": "gemini-2.0-flash",
///   "weather": {
///     "latitude": 13.7563,
///     "longitude": 100.5018,
///     "timezone": "Asia/Bangkok",
///     "refresh_minutes": 30
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "daily-tools"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The record schema of this data directory
    schema: SchemaVariant,

    /// Display-only user token
    user_id: String,

    /// Number of backup copies to keep
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,

    /// Generative model name
    #[serde(default = "default_model")]
    model: String,

    /// Path to the API key file (optional, relative to the data directory or absolute)
    /// Defaults to $DAILY_HOME/.secrets/api_key if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key_path: Option<PathBuf>,

    #[serde(default)]
    weather: WeatherSettings,
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            schema: SchemaVariant::default(),
            user_id: String::new(),
            backup_copies: BACKUP_COPIES,
            model: DEFAULT_MODEL.to_string(),
            api_key_path: None,
            weather: WeatherSettings::default(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version == CONFIG_VERSION,
            "Unsupported config_version {} in config file, expected {}",
            config.config_version,
            CONFIG_VERSION
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the API key path.
    ///
    /// If the path is relative, it should be interpreted as relative to the data directory.
    /// If None, defaults to $DAILY_HOME/.secrets/api_key
    fn api_key_path(&self) -> PathBuf {
        self.api_key_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(API_KEY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_type;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("daily");
        let created = Config::create(&home, SchemaVariant::FixedFields)
            .await
            .unwrap();
        assert!(created.backups().is_dir());
        assert!(created.secrets().is_dir());
        assert!(created.user_id().starts_with("user_"));

        let loaded = Config::load(&home).await.unwrap();
        assert_eq!(loaded.schema(), SchemaVariant::FixedFields);
        assert_eq!(loaded.user_id(), created.user_id());
        assert_eq!(loaded.model(), DEFAULT_MODEL);
        assert_eq!(loaded.backup_copies(), BACKUP_COPIES);
        assert_eq!(loaded.records_path(), loaded.root().join(RECORDS_JSON));
        assert_eq!(
            loaded.api_key_path(),
            loaded.root().join(SECRETS).join(API_KEY)
        );
    }

    #[tokio::test]
    async fn test_create_twice_fails() {
        let dir = TempDir::new().unwrap();
        Config::create(dir.path(), SchemaVariant::Ledger)
            .await
            .unwrap();
        assert!(Config::create(dir.path(), SchemaVariant::Ledger)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_load_missing_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Config));
    }

    #[tokio::test]
    async fn test_load_rejects_wrong_app_name() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), SchemaVariant::Ledger)
            .await
            .unwrap();
        let mut file = config.config_file.clone();
        file.app_name = "other-app".to_string();
        file.save(config.config_path()).await.unwrap();
        assert!(Config::load(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_api_key_from_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), SchemaVariant::Ledger)
            .await
            .unwrap();
        utils::write(config.api_key_path(), "  secret-key\n")
            .await
            .unwrap();
        // The environment variable wins when set; only assert the file path when it is not.
        if std::env::var(API_KEY_ENV).is_err() {
            assert_eq!(config.api_key().await.unwrap(), "secret-key");
        }
    }

    #[test]
    fn test_config_file_defaults_for_optional_fields() {
        let json = r#"{
            "app_name": "daily-tools",
            "config_version": 1,
            "schema": "ledger",
            "user_id": "user_abcdefgh"
        }"#;
        let file: ConfigFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.backup_copies, BACKUP_COPIES);
        assert_eq!(file.model, DEFAULT_MODEL);
        assert_eq!(file.weather, WeatherSettings::default());
    }
}
