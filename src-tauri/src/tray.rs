//! System tray setup and click handler.
//!
//! Left-click toggles the emblem at the cursor. The context menu starts a
//! capture, shows the toolbar, or quits.

use crate::capture;
use tauri::{
    image::Image as TauriImage,
    menu::{MenuBuilder, MenuItemBuilder, PredefinedMenuItem},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    AppHandle, Manager,
};

pub fn setup_tray(app: &AppHandle) -> Result<(), Box<dyn std::error::Error>> {
    let capture_item = MenuItemBuilder::with_id("capture", "Capture Region").build(app)?;
    let toolbar_item = MenuItemBuilder::with_id("toolbar", "Show Toolbar").build(app)?;
    let quit_item = MenuItemBuilder::with_id("quit", "Quit CodeCap").build(app)?;
    let menu = MenuBuilder::new(app)
        .item(&capture_item)
        .item(&toolbar_item)
        .item(&PredefinedMenuItem::separator(app)?)
        .item(&quit_item)
        .build()?;

    // Decode the PNG icon to RGBA for Tauri's Image type
    let icon_bytes = include_bytes!("../icons/32x32.png");
    let icon_img = image::load_from_memory(icon_bytes)
        .map_err(|e| format!("Failed to decode tray icon: {}", e))?;
    let rgba = icon_img.to_rgba8();
    let (w, h) = (rgba.width(), rgba.height());
    let tray_icon = TauriImage::new_owned(rgba.into_raw(), w, h);

    let _tray = TrayIconBuilder::with_id("codecap")
        .icon(tray_icon)
        .tooltip("CodeCap")
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_tray_icon_event(|tray_icon, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                capture::toggle_emblem(tray_icon.app_handle());
            }
        })
        .on_menu_event(|app, event| match event.id().as_ref() {
            "capture" => capture::trigger_capture(app),
            "toolbar" => capture::show_toolbar(app),
            "quit" => {
                log::info!("Quit requested from tray menu");
                app.exit(0);
            }
            _ => {}
        })
        .build(app)?;

    Ok(())
}
