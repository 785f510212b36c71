//! CodeCap — Tauri application entry point.
//!
//! This is the app shell that wires the desktop adapters into the core
//! session controller. No business logic lives here — only module
//! declarations, plugin registration, state management, the global
//! hotkey, and the command registry.
//!
//! Commands are split across:
//!   - commands.rs           — session, snippet and share/export commands
//!   - settings_commands.rs  — settings panel, GitHub token, OCR status

mod capture;
mod commands;
pub mod gist;
mod ocr;
mod settings_commands;
mod surfaces;
mod tray;

use capture::{CaptureState, MonitorDisplays, XcapFrames};
use codecap_core::session::{SessionController, SurfaceKind};
use codecap_core::settings::Settings;
use codecap_core::store::JsonSnippetStore;
use ocr::OcrEngine;
use settings_commands::SettingsState;
use std::sync::Arc;
use surfaces::WindowFactory;
use tauri::{Manager, WindowEvent};
use tauri_plugin_global_shortcut::{GlobalShortcutExt, Shortcut, ShortcutState};

/// Entry point — called by Tauri runtime.
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Load .env.local → .env from project root.
    // Uses CARGO_MANIFEST_DIR (compile-time path to src-tauri/) to reliably
    // find the project root regardless of the binary's working directory.
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let project_root = manifest_dir.parent().unwrap_or(manifest_dir);

    'env_load: for env_file in [".env.local", ".env"] {
        let path = project_root.join(env_file);
        if path.exists() {
            match dotenvy::from_path(&path) {
                Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
            }
            break 'env_load;
        }
    }

    env_logger::init();

    let settings = Settings::load();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_global_shortcut::Builder::new().build())
        .manage(SettingsState::new(settings.clone()))
        .on_window_event(|window, event| {
            if let WindowEvent::Focused(false) = event {
                if let Some(kind) = SurfaceKind::from_label(window.label()) {
                    capture::handle_blur(window.app_handle(), kind);
                }
            }
        })
        .invoke_handler(tauri::generate_handler![
            // Session + snippet commands (commands.rs)
            commands::start_capture,
            commands::show_toolbar,
            commands::overlay_event,
            commands::get_session,
            commands::get_review,
            commands::save_review,
            commands::cancel_capture,
            commands::close_overlay,
            commands::enrich_text,
            commands::get_snippets,
            commands::search_snippets,
            commands::delete_snippet,
            commands::get_snippet_image,
            commands::copy_to_clipboard,
            commands::share_snippets,
            commands::create_gist,
            commands::write_file_to_path,
            // Settings commands (settings_commands.rs)
            settings_commands::get_settings,
            settings_commands::save_settings,
            settings_commands::save_github_token,
            settings_commands::has_github_token,
            settings_commands::ocr_status,
        ])
        .setup(move |app| {
            log::info!("CodeCap starting up");

            // Tray-only app: no dock icon.
            #[cfg(target_os = "macos")]
            app.set_activation_policy(tauri::ActivationPolicy::Accessory);

            let store = Arc::new(JsonSnippetStore::open_default()?);

            let warm_start = std::time::Instant::now();
            let ocr = Arc::new(OcrEngine::new(&settings.ocr_languages));
            ocr.warm_up();
            log::info!("[OCR] Warm-up complete in {}ms", warm_start.elapsed().as_millis());

            let handle = app.handle().clone();
            let controller = SessionController::new(
                WindowFactory::new(handle.clone()),
                MonitorDisplays::new(handle.clone()),
                XcapFrames,
                Arc::clone(&ocr),
                Arc::clone(&store),
            );
            app.manage(CaptureState::new(controller));
            app.manage(store);
            app.manage(ocr);

            tray::setup_tray(&handle)?;

            if let Err(e) = register_hotkey(&handle, &settings.hotkey) {
                // The tray still works; the user can pick another hotkey in settings.
                log::error!("[STARTUP] {}", e);
            }

            log::info!("System tray initialized — ready for captures");
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("Error running CodeCap");
}

/// Binds `accelerator` as the one global capture hotkey, replacing any
/// previous binding.
pub(crate) fn register_hotkey(app: &tauri::AppHandle, accelerator: &str) -> Result<(), String> {
    let shortcut: Shortcut = accelerator
        .parse()
        .map_err(|e| format!("Invalid hotkey '{}': {}", accelerator, e))?;

    let shortcuts = app.global_shortcut();
    shortcuts.unregister_all().map_err(|e| e.to_string())?;
    shortcuts
        .on_shortcut(shortcut, |app, _shortcut, event| {
            if event.state() == ShortcutState::Pressed {
                capture::trigger_capture(app);
            }
        })
        .map_err(|e| format!("Failed to register hotkey '{}': {}", accelerator, e))?;

    log::info!("[STARTUP] Capture hotkey: {}", accelerator);
    Ok(())
}
