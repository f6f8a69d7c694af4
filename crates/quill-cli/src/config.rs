use anyhow::{anyhow, Context, Result};
use console::style;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use quill::key_manager::{
    get_api_key_default, save_to_keyring, KeyRetrievalStrategy, API_KEY_ENV,
};

const SETTINGS_FILE: &str = "settings.json";
const MIN_KEY_LENGTH: usize = 10;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_key_set: bool,
}

/// Settings live in a JSON file under the platform config directory; the
/// API key itself lives in the keyring (or the environment).
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let base = dirs::config_dir().ok_or_else(|| anyhow!("Could not find config directory"))?;
        Self::at(base.join("quill"))
    }

    pub fn at(config_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Could not create config directory {config_dir:?}"))?;
        Ok(Self { config_dir })
    }

    fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    /// A missing or unreadable settings file means defaults.
    pub fn load(&self) -> Settings {
        std::fs::read_to_string(self.settings_path())
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        let text = serde_json::to_string_pretty(settings)?;
        std::fs::write(self.settings_path(), text)
            .with_context(|| format!("Could not write {:?}", self.settings_path()))?;
        Ok(())
    }

    /// Environment variable first, keyring second.
    pub fn api_key(&self) -> Result<String> {
        get_api_key_default(API_KEY_ENV, KeyRetrievalStrategy::Both).map_err(Into::into)
    }

    /// Interactive setup: prompt for the key and store it in the keyring.
    pub fn setup_api_key(&self) -> Result<()> {
        cliclack::intro(style(" quill setup ").on_cyan().black())?;

        let key: String = cliclack::password("Enter your Groq API key")
            .mask('▪')
            .interact()?;
        let key = key.trim();

        if key.len() < MIN_KEY_LENGTH {
            cliclack::outro(style("That does not look like a valid API key").red())?;
            return Err(anyhow!("API key too short"));
        }

        save_to_keyring(API_KEY_ENV, key)?;

        let mut settings = self.load();
        settings.api_key_set = true;
        self.save(&settings)?;

        cliclack::outro("API key saved to your keyring")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_settings_is_default() {
        let dir = tempdir().unwrap();
        let config = ConfigManager::at(dir.path().join("quill")).unwrap();

        let settings = config.load();
        assert!(!settings.api_key_set);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let config = ConfigManager::at(dir.path().join("quill")).unwrap();

        config
            .save(&Settings { api_key_set: true })
            .unwrap();

        let settings = config.load();
        assert!(settings.api_key_set);
    }

    #[test]
    fn test_load_corrupt_settings_is_default() {
        let dir = tempdir().unwrap();
        let config = ConfigManager::at(dir.path().join("quill")).unwrap();
        std::fs::write(dir.path().join("quill").join(SETTINGS_FILE), "not json").unwrap();

        let settings = config.load();
        assert!(!settings.api_key_set);
    }
}
