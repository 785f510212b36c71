//! Settings panel Tauri commands.
//!
//! Handles:
//! - Loading/saving `settings.json` (hotkey, OCR languages, enrichment toggle)
//! - Re-registering the global hotkey when it changes
//! - GitHub token storage (OS keychain via keyring crate + env var)
//! - OCR backend status

use crate::gist;
use crate::ocr::OcrEngine;
use codecap_core::settings::Settings;
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Managed state holding the settings the app is running with.
pub struct SettingsState {
    settings: Mutex<Settings>,
}

impl SettingsState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }

    pub fn current(&self) -> Result<Settings, String> {
        self.settings
            .lock()
            .map(|s| s.clone())
            .map_err(|e| e.to_string())
    }

    fn replace(&self, settings: Settings) -> Result<(), String> {
        *self.settings.lock().map_err(|e| e.to_string())? = settings;
        Ok(())
    }
}

// ── Tauri commands ───────────────────────────────────────────────────

#[tauri::command]
pub fn get_settings(state: tauri::State<'_, SettingsState>) -> Result<Settings, String> {
    state.current()
}

/// Tauri command: validate and persist settings, then apply them.
///
/// A hotkey that fails to register is reported and the previous one is
/// restored; nothing is written in that case.
#[tauri::command]
pub fn save_settings(
    app: tauri::AppHandle,
    state: tauri::State<'_, SettingsState>,
    ocr: tauri::State<'_, Arc<OcrEngine>>,
    settings: Settings,
) -> Result<Settings, String> {
    settings.validate().map_err(|e| e.to_string())?;
    let previous = state.current()?;

    if settings.hotkey != previous.hotkey {
        if let Err(e) = crate::register_hotkey(&app, &settings.hotkey) {
            log::warn!("[SETTINGS] Hotkey '{}' rejected: {}", settings.hotkey, e);
            if let Err(restore) = crate::register_hotkey(&app, &previous.hotkey) {
                log::error!("[SETTINGS] Failed to restore hotkey '{}': {}", previous.hotkey, restore);
            }
            return Err(e);
        }
    }

    settings.save().map_err(|e| e.to_string())?;
    if settings.ocr_languages != previous.ocr_languages {
        ocr.set_languages(&settings.ocr_languages);
    }
    state.replace(settings.clone())?;

    log::info!(
        "[SETTINGS] Saved (hotkey={}, ocr={}, enrichment={})",
        settings.hotkey,
        settings.ocr_languages,
        settings.ai_enrichment
    );
    Ok(settings)
}

/// Tauri command: save (or, when empty, remove) the GitHub token.
#[tauri::command]
pub fn save_github_token(token: String) -> Result<(), String> {
    gist::save_token(&token).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn has_github_token() -> bool {
    gist::has_token()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrStatus {
    pub backend: &'static str,
    pub languages: String,
}

/// Tauri command: which OCR backend captures will use.
#[tauri::command]
pub fn ocr_status(ocr: tauri::State<'_, Arc<OcrEngine>>) -> OcrStatus {
    OcrStatus {
        backend: ocr.backend(),
        languages: ocr.languages(),
    }
}
