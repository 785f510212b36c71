//! Webview windows as session surfaces.
//!
//! Each surface kind maps to one borderless, always-on-top window whose
//! label is the kind's label. Windows are built hidden and never closed;
//! the controller only shows, hides and moves them.
//!
//! Placement goes through physical pixels. A logical position would be
//! scaled by the monitor the window currently sits on, not the one it is
//! headed for.

use crate::capture::current_displays;
use codecap_core::display::{desktop_rect_to_physical, desktop_to_physical, physical_to_desktop, Display};
use codecap_core::geometry::{Point, Rect};
use codecap_core::session::{
    SurfaceError, SurfaceFactory, SurfaceHandle, SurfaceKind, SurfaceSignal, EMBLEM_SIZE, TOOLBAR_SIZE,
};
use tauri::{
    AppHandle, Emitter, EventTarget, Manager, PhysicalPosition, PhysicalSize, WebviewUrl, WebviewWindow,
    WebviewWindowBuilder,
};

/// Event carrying a `SurfaceSignal` to a surface's page.
pub const SIGNAL_EVENT: &str = "surface-signal";

fn page(kind: SurfaceKind) -> &'static str {
    match kind {
        SurfaceKind::Emblem => "emblem.html",
        SurfaceKind::Toolbar => "toolbar.html",
        SurfaceKind::Overlay => "overlay.html",
    }
}

pub struct WindowFactory {
    app: AppHandle,
}

impl WindowFactory {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl SurfaceFactory for WindowFactory {
    type Surface = WindowSurface;

    fn create(&mut self, kind: SurfaceKind) -> Result<WindowSurface, SurfaceError> {
        if let Some(window) = self.app.get_webview_window(kind.label()) {
            log::debug!("[SURFACE] Reusing existing {} window", kind);
            return Ok(WindowSurface { kind, window });
        }

        let (width, height) = match kind {
            SurfaceKind::Emblem => EMBLEM_SIZE,
            SurfaceKind::Toolbar => TOOLBAR_SIZE,
            // Resized onto the target display when armed.
            SurfaceKind::Overlay => (800.0, 600.0),
        };

        let window = WebviewWindowBuilder::new(&self.app, kind.label(), WebviewUrl::App(page(kind).into()))
            .title(format!("CodeCap {}", kind))
            .inner_size(width, height)
            .decorations(false)
            .transparent(true)
            .shadow(false)
            .always_on_top(true)
            .skip_taskbar(true)
            .resizable(false)
            .visible(false)
            .build()
            .map_err(|e| SurfaceError::Create {
                kind,
                reason: e.to_string(),
            })?;

        Ok(WindowSurface { kind, window })
    }
}

pub struct WindowSurface {
    kind: SurfaceKind,
    window: WebviewWindow,
}

impl WindowSurface {
    fn check(&self, result: tauri::Result<()>) -> Result<(), SurfaceError> {
        result.map_err(|e| SurfaceError::Operation {
            kind: self.kind,
            reason: e.to_string(),
        })
    }

    fn layout(&self) -> Result<Vec<Display>, SurfaceError> {
        current_displays(self.window.app_handle()).map_err(|e| SurfaceError::Operation {
            kind: self.kind,
            reason: e.to_string(),
        })
    }

    fn off_screen(&self) -> SurfaceError {
        SurfaceError::Operation {
            kind: self.kind,
            reason: "no display to place the window on".to_string(),
        }
    }
}

impl SurfaceHandle for WindowSurface {
    fn show(&mut self) -> Result<(), SurfaceError> {
        self.check(self.window.show())
    }

    fn hide(&mut self) -> Result<(), SurfaceError> {
        self.check(self.window.hide())
    }

    fn focus(&mut self) -> Result<(), SurfaceError> {
        self.check(self.window.set_focus())
    }

    fn set_bounds(&mut self, bounds: Rect) -> Result<(), SurfaceError> {
        let placed = desktop_rect_to_physical(bounds, &self.layout()?).ok_or_else(|| self.off_screen())?;
        log::debug!("[SURFACE] {} placed at physical {}", self.kind, placed.key());
        self.check(self.window.set_position(PhysicalPosition::new(placed.x, placed.y)))?;
        self.check(self.window.set_size(PhysicalSize::new(placed.width, placed.height)))
    }

    fn move_to(&mut self, origin: Point) -> Result<(), SurfaceError> {
        let (x, y) = desktop_to_physical(origin, &self.layout()?).ok_or_else(|| self.off_screen())?;
        self.check(self.window.set_position(PhysicalPosition::new(x, y)))
    }

    fn position(&self) -> Option<Point> {
        let physical = self.window.outer_position().ok()?;
        let displays = self.layout().ok()?;
        physical_to_desktop(f64::from(physical.x), f64::from(physical.y), &displays)
    }

    fn signal(&mut self, signal: SurfaceSignal) -> Result<(), SurfaceError> {
        let target = EventTarget::webview_window(self.kind.label());
        self.check(self.window.emit_to(target, SIGNAL_EVENT, signal))
    }
}
