//! Display enumeration and cursor position from Tauri's monitor API.
//!
//! Tauri reports monitor placement in physical pixels. Each display is
//! identified by that placement, which xcap reports too; monitor names
//! differ between the two and repeat across identical models.

use codecap_core::display::{physical_to_desktop, Display, DisplayProvider, PhysicalRect, ResolveError};
use codecap_core::geometry::Point;
use tauri::{AppHandle, Monitor};

pub struct MonitorDisplays {
    app: AppHandle,
}

impl MonitorDisplays {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

/// A monitor as the platform reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorPlacement {
    pub name: Option<String>,
    pub physical: PhysicalRect,
    pub scale: f64,
}

impl MonitorPlacement {
    fn of(monitor: &Monitor) -> Self {
        let position = monitor.position();
        let size = monitor.size();
        Self {
            name: monitor.name().cloned(),
            physical: PhysicalRect::new(position.x, position.y, size.width, size.height),
            scale: monitor.scale_factor(),
        }
    }
}

pub fn to_display(placement: &MonitorPlacement, primary: Option<&PhysicalRect>) -> Display {
    let display = Display::from_physical(placement.physical, placement.scale);
    log::trace!(
        "[DISPLAY] {} is '{}' @{}x",
        display.id,
        placement.name.as_deref().unwrap_or("unnamed"),
        placement.scale
    );
    if primary == Some(&placement.physical) {
        display.primary()
    } else {
        display
    }
}

/// Every connected monitor, freshly enumerated.
pub fn current_displays(app: &AppHandle) -> Result<Vec<Display>, ResolveError> {
    let monitors = app
        .available_monitors()
        .map_err(|e| ResolveError::Enumeration(e.to_string()))?;
    let primary = app
        .primary_monitor()
        .ok()
        .flatten()
        .map(|m| MonitorPlacement::of(&m).physical);

    Ok(monitors
        .iter()
        .map(|m| to_display(&MonitorPlacement::of(m), primary.as_ref()))
        .collect())
}

impl DisplayProvider for MonitorDisplays {
    fn displays(&self) -> Result<Vec<Display>, ResolveError> {
        current_displays(&self.app)
    }
}

/// Current cursor position in desktop space. Falls back to the origin when
/// the platform cannot report it, which resolves to the top-left display.
pub fn cursor_position(app: &AppHandle) -> Point {
    let physical = match app.cursor_position() {
        Ok(p) => p,
        Err(e) => {
            log::warn!("[DISPLAY] Cursor position unavailable: {}", e);
            return Point::new(0.0, 0.0);
        }
    };

    let displays = current_displays(app).unwrap_or_default();
    physical_to_desktop(physical.x, physical.y, &displays).unwrap_or(Point::new(physical.x, physical.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use codecap_core::display::{desktop_rect_to_physical, resolve_target_display, DisplayId};

    fn placement(name: &str, x: i32, width: u32, height: u32, scale: f64) -> MonitorPlacement {
        MonitorPlacement {
            name: Some(name.to_string()),
            physical: PhysicalRect::new(x, 0, width, height),
            scale,
        }
    }

    fn layout(placements: &[MonitorPlacement]) -> Vec<Display> {
        let primary = placements[0].physical;
        placements.iter().map(|p| to_display(p, Some(&primary))).collect()
    }

    #[test]
    fn same_model_monitors_get_distinct_ids() {
        let displays = layout(&[
            placement("DELL U2720Q", 0, 1920, 1080, 1.0),
            placement("DELL U2720Q", 1920, 1920, 1080, 1.0),
        ]);
        assert_eq!(displays[0].id, DisplayId::new("0,0:1920x1080"));
        assert_eq!(displays[1].id, DisplayId::new("1920,0:1920x1080"));
        assert!(displays[0].is_primary && !displays[1].is_primary);

        let target = resolve_target_display(&displays, Point::new(2500.0, 500.0)).unwrap();
        assert_eq!(target.id, displays[1].id);
    }

    #[test]
    fn overlay_lands_on_the_1x_monitor_beside_a_retina_panel() {
        let displays = layout(&[
            placement("Built-in Retina Display", 0, 3024, 1964, 2.0),
            placement("LG HDR 4K", 3024, 1920, 1080, 1.0),
        ]);
        let placed = desktop_rect_to_physical(displays[1].bounds, &displays).unwrap();
        assert_eq!(placed, PhysicalRect::new(3024, 0, 1920, 1080));

        let placed = desktop_rect_to_physical(displays[0].bounds, &displays).unwrap();
        assert_eq!(placed, PhysicalRect::new(0, 0, 3024, 1964));
    }

    #[test]
    fn overlay_lands_on_the_retina_monitor_beside_a_1x_panel() {
        let displays = layout(&[
            placement("HP E24", 0, 1920, 1080, 1.0),
            placement("Studio Display", 1920, 3840, 2160, 2.0),
        ]);
        let placed = desktop_rect_to_physical(displays[1].bounds, &displays).unwrap();
        assert_eq!(placed, PhysicalRect::new(1920, 0, 3840, 2160));
    }

    #[test]
    fn cursor_on_each_monitor_resolves_to_that_monitor() {
        let displays = layout(&[
            placement("HP E24", 0, 1920, 1080, 1.0),
            placement("Studio Display", 1920, 3840, 2160, 2.0),
        ]);
        for (x, expected) in [(1500.0, 0), (1919.0, 0), (1920.0, 1), (5000.0, 1)] {
            let cursor = physical_to_desktop(x, 300.0, &displays).unwrap();
            let target = resolve_target_display(&displays, cursor).unwrap();
            assert_eq!(target.id, displays[expected].id, "physical x={}", x);
        }
    }
}
