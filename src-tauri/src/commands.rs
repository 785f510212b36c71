//! Tauri command handlers.
//!
//! Thin bridges from frontend invoke() calls to the session controller
//! and the snippet store. Errors cross the IPC boundary as strings.
//!
//! Settings and the GitHub token live in settings_commands.rs instead.

use crate::capture::{self, CaptureState};
use crate::gist::{self, GistCreated};
use crate::settings_commands::SettingsState;
use base64::Engine as _;
use codecap_core::enrich::{Enrichment, HeuristicEnricher};
use codecap_core::geometry::CropRect;
use codecap_core::ports::{Enricher, SnippetStore};
use codecap_core::session::{OverlayEvent, OverlayOutcome, ReviewForm, SessionSnapshot, StartOutcome};
use codecap_core::share::{self, ShareOptions, ShareOutput};
use codecap_core::store::{JsonSnippetStore, Snippet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path};
use std::sync::Arc;

fn encode_png(png: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(png)
}

// ── Session ──────────────────────────────────────────────────────────

/// Tauri command: start a capture (toolbar button).
#[tauri::command]
pub async fn start_capture(app: tauri::AppHandle) -> Result<StartOutcome, String> {
    capture::start_capture(&app).await
}

/// Tauri command: show the toolbar (emblem click).
#[tauri::command]
pub async fn show_toolbar(state: tauri::State<'_, CaptureState>) -> Result<bool, String> {
    let mut controller = state.controller.lock().await;
    controller.show_toolbar().map_err(|e| e.to_string())
}

/// Tauri command: feed one pointer/keyboard event from the overlay.
///
/// A `pointerUp` that completes a selection holds the session through
/// capture and recognition, so this can take a while to resolve.
#[tauri::command]
pub async fn overlay_event(
    state: tauri::State<'_, CaptureState>,
    event: OverlayEvent,
) -> Result<OverlayOutcome, String> {
    let mut controller = state.controller.lock().await;
    controller
        .handle_overlay_event(event)
        .await
        .map_err(|e| e.to_string())
}

/// Tauri command: current phase, target display and live selection.
///
/// Called by the overlay on load and whenever it is re-armed.
#[tauri::command]
pub async fn get_session(state: tauri::State<'_, CaptureState>) -> Result<SessionSnapshot, String> {
    Ok(state.controller.lock().await.snapshot())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPayload {
    pub text: String,
    /// Base64 PNG of the crop.
    pub image: String,
    pub crop: CropRect,
    pub display_id: String,
    pub recognition_error: Option<String>,
    pub degraded: bool,
    pub save_error: Option<String>,
    /// Whether the form should ask for a summary and tags.
    pub ai_enrichment: bool,
}

/// Tauri command: the recognized text and crop for the review form.
#[tauri::command]
pub async fn get_review(
    state: tauri::State<'_, CaptureState>,
    settings: tauri::State<'_, SettingsState>,
) -> Result<ReviewPayload, String> {
    let ai_enrichment = settings.current()?.ai_enrichment;
    let controller = state.controller.lock().await;
    let review = controller
        .review()
        .ok_or("No capture result to review")?;
    Ok(ReviewPayload {
        text: review.text.clone(),
        image: encode_png(&review.png),
        crop: review.crop,
        display_id: review.display_id.to_string(),
        recognition_error: review.recognition_error.clone(),
        degraded: review.degraded,
        save_error: review.save_error.clone(),
        ai_enrichment,
    })
}

/// Tauri command: persist the edited review and return to the toolbar.
#[tauri::command]
pub async fn save_review(
    state: tauri::State<'_, CaptureState>,
    form: ReviewForm,
) -> Result<Snippet, String> {
    let mut controller = state.controller.lock().await;
    controller.save(form).map_err(|e| e.to_string())
}

/// Tauri command: discard the review (or armed overlay) and show the toolbar.
#[tauri::command]
pub async fn cancel_capture(state: tauri::State<'_, CaptureState>) -> Result<bool, String> {
    let mut controller = state.controller.lock().await;
    controller.cancel().map_err(|e| e.to_string())
}

/// Tauri command: close the overlay without bringing the toolbar back.
#[tauri::command]
pub async fn close_overlay(state: tauri::State<'_, CaptureState>) -> Result<bool, String> {
    let mut controller = state.controller.lock().await;
    controller.dismiss_overlay().map_err(|e| e.to_string())
}

// ── Snippets ─────────────────────────────────────────────────────────

/// Tauri command: summary, suggested tags and content kind for `text`.
#[tauri::command]
pub fn enrich_text(text: String) -> Enrichment {
    HeuristicEnricher.enrich(&text)
}

#[tauri::command]
pub fn get_snippets(store: tauri::State<'_, Arc<JsonSnippetStore>>) -> Result<Vec<Snippet>, String> {
    store.list_all().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn search_snippets(
    store: tauri::State<'_, Arc<JsonSnippetStore>>,
    query: String,
) -> Result<Vec<Snippet>, String> {
    if query.trim().is_empty() {
        return store.list_all().map_err(|e| e.to_string());
    }
    store.search(query.trim()).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_snippet(store: tauri::State<'_, Arc<JsonSnippetStore>>, id: String) -> Result<(), String> {
    store.delete(&id).map_err(|e| e.to_string())
}

/// Tauri command: a saved snippet's crop as base64 PNG, if it has one.
#[tauri::command]
pub fn get_snippet_image(
    store: tauri::State<'_, Arc<JsonSnippetStore>>,
    id: String,
) -> Result<Option<String>, String> {
    let snippet = store.get(&id).map_err(|e| e.to_string())?;
    let Some(path) = store.image_path(&snippet) else {
        return Ok(None);
    };
    match std::fs::read(&path) {
        Ok(png) => Ok(Some(encode_png(&png))),
        Err(e) => {
            log::warn!("[STORE] Missing image {} for snippet {}: {}", path.display(), id, e);
            Ok(None)
        }
    }
}

// ── Output ───────────────────────────────────────────────────────────

/// Tauri command: copy text to the system clipboard.
///
/// Uses arboard for native clipboard access — works reliably
/// unlike navigator.clipboard in transparent webview windows.
#[tauri::command]
pub fn copy_to_clipboard(text: String) -> Result<(), String> {
    let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
    clipboard.set_text(&text).map_err(|e| e.to_string())?;
    log::info!("[SHARE] Copied {} chars to clipboard", text.len());
    Ok(())
}

fn selected_snippets(store: &JsonSnippetStore, ids: &[String]) -> Result<Vec<Snippet>, String> {
    if ids.is_empty() {
        return Err("No snippets selected".to_string());
    }
    ids.iter()
        .map(|id| store.get(id).map_err(|e| e.to_string()))
        .collect()
}

/// Tauri command: render the selected snippets for copy/export.
#[tauri::command]
pub fn share_snippets(
    store: tauri::State<'_, Arc<JsonSnippetStore>>,
    ids: Vec<String>,
    options: Option<ShareOptions>,
) -> Result<ShareOutput, String> {
    let snippets = selected_snippets(&store, &ids)?;
    share::format_for_share(&snippets, &options.unwrap_or_default()).map_err(|e| e.to_string())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GistRequest {
    pub ids: Vec<String>,
    pub options: ShareOptions,
    pub description: Option<String>,
    pub public: bool,
}

/// Tauri command: upload the selected snippets as a GitHub Gist.
#[tauri::command]
pub async fn create_gist(
    store: tauri::State<'_, Arc<JsonSnippetStore>>,
    request: GistRequest,
) -> Result<GistCreated, String> {
    let token = gist::load_token().ok_or_else(|| gist::GistError::MissingToken.to_string())?;
    let snippets = selected_snippets(&store, &request.ids)?;
    let files = match share::format_for_share(&snippets, &request.options).map_err(|e| e.to_string())? {
        ShareOutput::Single { content, default_name } => BTreeMap::from([(default_name, content)]),
        ShareOutput::Files { files } => files,
    };
    gist::create_gist(&files, request.description.as_deref(), request.public, &token)
        .await
        .map_err(|e| e.to_string())
}

/// Absolute, no `..` components, and not a directory.
fn is_path_writable(path: &Path) -> bool {
    path.is_absolute()
        && path.file_name().is_some()
        && !path.components().any(|c| matches!(c, Component::ParentDir))
        && !path.is_dir()
}

/// Tauri command: write file to a user-chosen path (from save dialog).
///
/// The frontend shows a native save-file picker and passes the chosen path here.
#[tauri::command]
pub fn write_file_to_path(file_path: String, content: String) -> Result<String, String> {
    if !is_path_writable(Path::new(&file_path)) {
        return Err("Unsafe file path".to_string());
    }

    std::fs::write(&file_path, &content).map_err(|e| format!("Failed to write file: {}", e))?;

    log::info!("[SHARE] Wrote file: {}", file_path);
    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_relative_and_traversing_paths() {
        assert!(!is_path_writable(Path::new("notes.md")));
        assert!(!is_path_writable(Path::new("/tmp/../etc/passwd")));
        assert!(!is_path_writable(&std::env::temp_dir()));
    }

    #[test]
    fn accepts_plain_absolute_file() {
        let path = std::env::temp_dir().join("codecap-export-test.md");
        assert!(is_path_writable(&path));
    }

    #[test]
    fn selecting_nothing_is_an_error() {
        let dir = std::env::temp_dir().join(format!("codecap-cmd-test-{}", std::process::id()));
        let store = JsonSnippetStore::open(&dir).unwrap();
        assert!(selected_snippets(&store, &[]).is_err());
        assert!(selected_snippets(&store, &["missing".to_string()]).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
