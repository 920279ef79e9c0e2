//! TOML configuration at `~/.streamsage/config.toml`.

use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::dispatch::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, MAX_TOKENS_RANGE, TEMPERATURE_RANGE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Computed at load time, never serialized.
    #[serde(skip)]
    pub config_path: PathBuf,

    /// API key, encrypted at rest when `secrets.encrypt` is on.
    pub api_key: Option<String>,
    pub default_model: String,
    pub default_temperature: f64,
    pub default_max_tokens: u32,
    /// Path to the release-note JSON document. `None` means the bundled
    /// `data/streamlit_updates.json` next to the working directory.
    pub updates_path: Option<PathBuf>,

    #[serde(default)]
    pub secrets: SecretsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Encrypt the stored API key with the local secret store.
    pub encrypt: bool,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self { encrypt: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
        let streamsage_dir = home.join(".streamsage");

        Self {
            config_path: streamsage_dir.join("config.toml"),
            api_key: None,
            default_model: DEFAULT_MODEL.to_string(),
            default_temperature: DEFAULT_TEMPERATURE,
            default_max_tokens: DEFAULT_MAX_TOKENS,
            updates_path: None,
            secrets: SecretsConfig::default(),
        }
    }
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("could not find home directory")?;
        let streamsage_dir = home.join(".streamsage");
        let config_path = streamsage_dir.join("config.toml");

        if !streamsage_dir.exists() {
            fs::create_dir_all(&streamsage_dir)
                .context("failed to create .streamsage directory")?;
        }

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("failed to parse config file")?;
            // Computed path is skipped during serialization
            config.config_path = config_path;
            config.apply_env_overrides();
            Ok(config)
        } else {
            let mut config = Config::default();
            config.config_path = config_path;
            config.save()?;
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// The directory holding the config file and the secret key.
    pub fn config_dir(&self) -> &Path {
        self.config_path.parent().unwrap_or(Path::new("."))
    }

    /// Apply environment variable overrides. `OPENAI_API_KEY` is not
    /// handled here — the key resolver consults it directly so the
    /// source priority stays in one place.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("STREAMSAGE_MODEL") {
            if !model.is_empty() {
                self.default_model = model;
            }
        }

        if let Ok(temp_str) = std::env::var("STREAMSAGE_TEMPERATURE") {
            if let Ok(temp) = temp_str.parse::<f64>() {
                if TEMPERATURE_RANGE.contains(&temp) {
                    self.default_temperature = temp;
                }
            }
        }

        if let Ok(tokens_str) = std::env::var("STREAMSAGE_MAX_TOKENS") {
            if let Ok(tokens) = tokens_str.parse::<u32>() {
                if MAX_TOKENS_RANGE.contains(&tokens) {
                    self.default_max_tokens = tokens;
                }
            }
        }

        if let Ok(data) = std::env::var("STREAMSAGE_DATA") {
            if !data.is_empty() {
                self.updates_path = Some(PathBuf::from(data));
            }
        }
    }

    /// Atomic save: write a temp file, fsync, rename over the target, with
    /// a backup of any existing config restored on rename failure.
    pub fn save(&self) -> Result<()> {
        // Encrypt the API key before serialization
        let mut config_to_save = self.clone();
        let config_dir = self
            .config_path
            .parent()
            .context("config path must have a parent directory")?;
        let store = crate::security::SecretStore::new(config_dir, self.secrets.encrypt);
        if let Some(key) = &self.api_key {
            if !crate::security::SecretStore::is_encrypted(key) {
                config_to_save.api_key = Some(store.encrypt(key)?);
            }
        }

        let toml_str =
            toml::to_string_pretty(&config_to_save).context("failed to serialize config")?;

        fs::create_dir_all(config_dir).with_context(|| {
            format!("failed to create config directory: {}", config_dir.display())
        })?;

        let file_name = self
            .config_path
            .file_name()
            .and_then(|v| v.to_str())
            .unwrap_or("config.toml");
        let temp_path = config_dir.join(format!(".{file_name}.tmp-{}", uuid::Uuid::new_v4()));
        let backup_path = config_dir.join(format!("{file_name}.bak"));

        let mut temp_file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .with_context(|| {
                format!(
                    "failed to create temporary config file: {}",
                    temp_path.display()
                )
            })?;
        temp_file
            .write_all(toml_str.as_bytes())
            .context("failed to write temporary config contents")?;
        temp_file
            .sync_all()
            .context("failed to fsync temporary config file")?;
        drop(temp_file);

        let had_existing_config = self.config_path.exists();
        if had_existing_config {
            fs::copy(&self.config_path, &backup_path).with_context(|| {
                format!("failed to back up config: {}", backup_path.display())
            })?;
        }

        if let Err(e) = fs::rename(&temp_path, &self.config_path) {
            let _ = fs::remove_file(&temp_path);
            if had_existing_config && backup_path.exists() {
                let _ = fs::copy(&backup_path, &self.config_path);
            }
            anyhow::bail!("failed to atomically replace config file: {e}");
        }

        sync_directory(config_dir)?;

        if had_existing_config {
            let _ = fs::remove_file(&backup_path);
        }

        Ok(())
    }
}

#[cfg(unix)]
fn sync_directory(path: &Path) -> Result<()> {
    let dir = File::open(path)
        .with_context(|| format!("failed to open directory for fsync: {}", path.display()))?;
    dir.sync_all()
        .with_context(|| format!("failed to fsync directory metadata: {}", path.display()))?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_directory(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        Config {
            config_path: dir.path().join("config.toml"),
            ..Config::default()
        }
    }

    // ── Defaults ─────────────────────────────────────────────

    #[test]
    fn default_has_sane_values() {
        let c = Config::default();
        assert_eq!(c.default_model, "gpt-4o-mini");
        assert!((c.default_temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(c.default_max_tokens, 2000);
        assert!(c.api_key.is_none());
        assert!(c.updates_path.is_none());
        assert!(c.secrets.encrypt);
    }

    // ── Save / reload ────────────────────────────────────────

    #[test]
    fn save_and_reload_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let mut config = config_in(&tmp);
        config.default_model = "gpt-4o".to_string();
        config.default_temperature = 0.3;
        config.save().unwrap();

        let contents = fs::read_to_string(&config.config_path).unwrap();
        let parsed: Config = toml::from_str(&contents).unwrap();
        assert_eq!(parsed.default_model, "gpt-4o");
        assert!((parsed.default_temperature - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn save_encrypts_api_key_at_rest() {
        let tmp = TempDir::new().unwrap();
        let mut config = config_in(&tmp);
        config.api_key = Some("sk-plaintext-secret".to_string());
        config.save().unwrap();

        let contents = fs::read_to_string(&config.config_path).unwrap();
        assert!(!contents.contains("sk-plaintext-secret"));
        assert!(contents.contains("enc:"));

        // And the store can recover it
        let store = crate::security::SecretStore::new(tmp.path(), true);
        let parsed: Config = toml::from_str(&contents).unwrap();
        let decrypted = store.decrypt(&parsed.api_key.unwrap()).unwrap();
        assert_eq!(decrypted, "sk-plaintext-secret");
    }

    #[test]
    fn save_plaintext_when_encryption_disabled() {
        let tmp = TempDir::new().unwrap();
        let mut config = config_in(&tmp);
        config.secrets.encrypt = false;
        config.api_key = Some("sk-plaintext-secret".to_string());
        config.save().unwrap();

        let contents = fs::read_to_string(&config.config_path).unwrap();
        assert!(contents.contains("sk-plaintext-secret"));
    }

    #[test]
    fn save_replaces_existing_config_atomically() {
        let tmp = TempDir::new().unwrap();
        let mut config = config_in(&tmp);
        config.save().unwrap();

        config.default_model = "gpt-4o".to_string();
        config.save().unwrap();

        let contents = fs::read_to_string(&config.config_path).unwrap();
        assert!(contents.contains("gpt-4o"));
        // No stray temp or backup files left behind
        let leftovers: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| {
                let name = e.file_name();
                let name = name.to_string_lossy().into_owned();
                name.contains(".tmp-") || name.ends_with(".bak")
            })
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn parses_minimal_config() {
        let contents = r#"
default_model = "gpt-4o-mini"
default_temperature = 0.7
default_max_tokens = 2000
"#;
        let parsed: Config = toml::from_str(contents).unwrap();
        assert!(parsed.secrets.encrypt, "secrets section defaults on");
        assert!(parsed.api_key.is_none());
    }
}
