//! Screen capture domain: platform adapters and the shared session.
//!
//! The session controller lives in `codecap-core`; this module plugs in
//! Tauri monitors, xcap frames, webview surfaces and the OCR engine, and
//! owns the single async mutex every transition goes through.

mod displays;
mod screenshot;

pub use displays::{current_displays, cursor_position, MonitorDisplays};
pub use screenshot::XcapFrames;

use crate::ocr::OcrEngine;
use crate::surfaces::WindowFactory;
use codecap_core::session::{SessionController, StartOutcome, SurfaceKind};
use codecap_core::store::JsonSnippetStore;
use std::sync::Arc;
use tauri::{AppHandle, Manager};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};

pub type AppController =
    SessionController<WindowFactory, MonitorDisplays, XcapFrames, Arc<OcrEngine>, Arc<JsonSnippetStore>>;

/// Managed state holding the one controller.
pub struct CaptureState {
    pub controller: tokio::sync::Mutex<AppController>,
}

impl CaptureState {
    pub fn new(controller: AppController) -> Self {
        Self {
            controller: tokio::sync::Mutex::new(controller),
        }
    }
}

/// Arms the overlay on the display under the cursor.
///
/// Uses `try_lock`: the lock is only held for long while a capture is
/// processing, and a trigger during processing must be dropped rather
/// than queued behind it.
pub async fn start_capture(app: &AppHandle) -> Result<StartOutcome, String> {
    let cursor = cursor_position(app);
    let state = app.state::<CaptureState>();
    let Ok(mut controller) = state.controller.try_lock() else {
        log::info!("[CAPTURE] Session busy, ignoring start trigger");
        return Ok(StartOutcome::Ignored);
    };
    controller.start_capture(cursor).map_err(|e| e.to_string())
}

/// Hotkey / tray entry point. Failures are shown in a native dialog since
/// there may be no surface on screen to report them.
pub fn trigger_capture(app: &AppHandle) {
    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        match start_capture(&app).await {
            Ok(outcome) => log::info!("[CAPTURE] Start trigger: {:?}", outcome),
            Err(e) => {
                log::error!("[CAPTURE] Failed to start capture: {}", e);
                app.dialog()
                    .message(e)
                    .title("CodeCap capture failed")
                    .kind(MessageDialogKind::Error)
                    .show(|_| {});
            }
        }
    });
}

/// Tray left-click: toggle the emblem at the cursor.
pub fn toggle_emblem(app: &AppHandle) {
    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        let cursor = cursor_position(&app);
        let state = app.state::<CaptureState>();
        let mut controller = state.controller.lock().await;
        if let Err(e) = controller.toggle_emblem(cursor) {
            log::error!("[CAPTURE] Emblem toggle failed: {}", e);
        }
    });
}

pub fn show_toolbar(app: &AppHandle) {
    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        let state = app.state::<CaptureState>();
        let mut controller = state.controller.lock().await;
        if let Err(e) = controller.show_toolbar() {
            log::error!("[CAPTURE] Failed to show toolbar: {}", e);
        }
    });
}

/// Folds a window focus loss into the session.
pub fn handle_blur(app: &AppHandle, kind: SurfaceKind) {
    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        let state = app.state::<CaptureState>();
        let mut controller = state.controller.lock().await;
        if let Err(e) = controller.handle_blur(kind) {
            log::warn!("[CAPTURE] Blur handling for {} failed: {}", kind, e);
        }
    });
}
