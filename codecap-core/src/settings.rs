//! User settings persistence.
//!
//! Stored as `~/.config/codecap/settings.json` (platform config dir).
//! Environment variables override the file so `.env.local` can pin a
//! hotkey or OCR language set during development.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const DEFAULT_HOTKEY: &str = "CommandOrControl+Shift+2";
pub const DEFAULT_OCR_LANGUAGES: &str = "eng";

const HOTKEY_ENV: &str = "CODECAP_HOTKEY";
const OCR_LANGUAGES_ENV: &str = "CODECAP_OCR_LANGUAGES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Global accelerator that starts a capture.
    pub hotkey: String,
    /// Tesseract language codes joined with `+`, e.g. `eng+deu`.
    pub ocr_languages: String,
    /// Whether the review form asks for a summary and tags.
    pub ai_enrichment: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hotkey: DEFAULT_HOTKEY.to_string(),
            ocr_languages: DEFAULT_OCR_LANGUAGES.to_string(),
            ai_enrichment: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid OCR languages '{0}': use codes like eng or eng+deu")]
    InvalidLanguages(String),

    #[error("Hotkey must not be empty")]
    EmptyHotkey,

    #[error("Failed to write settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Directory holding `settings.json`.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("codecap")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

impl Settings {
    /// Loads the user's settings file and applies environment overrides.
    pub fn load() -> Self {
        Self::load_from(&settings_path()).with_env_overrides()
    }

    /// Missing file → defaults. Unparseable file → defaults plus a warning.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("[SETTINGS] Ignoring invalid {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(&settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        self.validate()?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("[SETTINGS] Saved to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        static LANGS: OnceLock<Regex> = OnceLock::new();
        let langs = LANGS.get_or_init(|| Regex::new(r"^[a-z_]{3,}(\+[a-z_]{3,})*$").expect("static regex"));

        if self.hotkey.trim().is_empty() {
            return Err(SettingsError::EmptyHotkey);
        }
        if !langs.is_match(&self.ocr_languages) {
            return Err(SettingsError::InvalidLanguages(self.ocr_languages.clone()));
        }
        Ok(())
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(hotkey) = lookup(HOTKEY_ENV).filter(|v| !v.trim().is_empty()) {
            log::info!("[SETTINGS] Hotkey override: {}", hotkey);
            self.hotkey = hotkey;
        }
        if let Some(langs) = lookup(OCR_LANGUAGES_ENV).filter(|v| !v.trim().is_empty()) {
            log::info!("[SETTINGS] OCR languages override: {}", langs);
            self.ocr_languages = langs;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("codecap-settings-{}-{}", name, std::process::id()))
            .join("settings.json")
    }

    #[test]
    fn missing_file_gives_defaults() {
        let settings = Settings::load_from(&temp_path("missing"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.hotkey, "CommandOrControl+Shift+2");
    }

    #[test]
    fn save_and_load_roundtrip() {
        let path = temp_path("roundtrip");
        let settings = Settings {
            hotkey: "Alt+Shift+S".to_string(),
            ocr_languages: "eng+deu".to_string(),
            ai_enrichment: false,
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);

        // Cleanup
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let path = temp_path("partial");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"ocrLanguages":"fra"}"#).unwrap();
        let settings = Settings::load_from(&path);
        assert_eq!(settings.ocr_languages, "fra");
        assert_eq!(settings.hotkey, DEFAULT_HOTKEY);
        assert!(settings.ai_enrichment);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn invalid_languages_rejected() {
        let settings = Settings {
            ocr_languages: "eng; rm -rf".to_string(),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidLanguages(_))));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let settings = Settings::default().with_overrides(|key| match key {
            "CODECAP_HOTKEY" => Some("Ctrl+Alt+C".to_string()),
            "CODECAP_OCR_LANGUAGES" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(settings.hotkey, "Ctrl+Alt+C");
        assert_eq!(settings.ocr_languages, DEFAULT_OCR_LANGUAGES);
    }
}
