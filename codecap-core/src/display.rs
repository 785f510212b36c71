//! Display resolution: which physical display receives the capture.
//!
//! Displays are enumerated fresh for every capture. Monitors come and go
//! between sessions, so nothing here is cached.

use crate::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable display identity as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayId(pub String);

impl DisplayId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A monitor's placement in physical desktop pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhysicalRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PhysicalRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Identity key for the monitor at this placement. Windowing and
    /// capture APIs both report placement in physical pixels, and two
    /// monitors never share one, so the key works across both where
    /// monitor names do not.
    pub fn key(&self) -> String {
        format!("{},{}:{}x{}", self.x, self.y, self.width, self.height)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (left, top) = (f64::from(self.x), f64::from(self.y));
        x >= left && x < left + f64::from(self.width) && y >= top && y < top + f64::from(self.height)
    }

    fn distance_to(&self, x: f64, y: f64) -> f64 {
        let (left, top) = (f64::from(self.x), f64::from(self.y));
        let dx = (left - x).max(x - (left + f64::from(self.width))).max(0.0);
        let dy = (top - y).max(y - (top + f64::from(self.height))).max(0.0);
        dx.hypot(dy)
    }
}

/// A connected display.
///
/// `bounds` live in desktop space: the origin is the monitor's physical
/// origin and the extent is in DIP. Neighbouring rects never overlap
/// whatever their scale factors, so a desktop point belongs to exactly
/// one monitor. `scale_factor` is physical pixels per DIP for this
/// display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Display {
    pub id: DisplayId,
    pub bounds: Rect,
    pub scale_factor: f64,
    #[serde(default)]
    pub physical: PhysicalRect,
    #[serde(default)]
    pub is_primary: bool,
}

impl Display {
    pub fn new(id: impl Into<String>, bounds: Rect, scale_factor: f64) -> Self {
        let scale_factor = scale_factor.max(1.0);
        let physical = PhysicalRect::new(
            bounds.x.round() as i32,
            bounds.y.round() as i32,
            (bounds.width * scale_factor).floor() as u32,
            (bounds.height * scale_factor).floor() as u32,
        );
        Self {
            id: DisplayId::new(id),
            bounds,
            scale_factor,
            physical,
            is_primary: false,
        }
    }

    /// A display built from its physical placement, identified by
    /// [`PhysicalRect::key`].
    pub fn from_physical(physical: PhysicalRect, scale_factor: f64) -> Self {
        let scale_factor = scale_factor.max(1.0);
        Self {
            id: DisplayId::new(physical.key()),
            bounds: Rect::new(
                f64::from(physical.x),
                f64::from(physical.y),
                f64::from(physical.width) / scale_factor,
                f64::from(physical.height) / scale_factor,
            ),
            scale_factor,
            physical,
            is_primary: false,
        }
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    /// Native framebuffer size: bounds scaled by this display's own factor.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.bounds.width * self.scale_factor).floor() as u32,
            (self.bounds.height * self.scale_factor).floor() as u32,
        )
    }

    pub fn point_to_physical(&self, p: Point) -> (i32, i32) {
        let x = f64::from(self.physical.x) + (p.x - self.bounds.x) * self.scale_factor;
        let y = f64::from(self.physical.y) + (p.y - self.bounds.y) * self.scale_factor;
        (x.round() as i32, y.round() as i32)
    }

    pub fn point_from_physical(&self, x: f64, y: f64) -> Point {
        Point::new(
            self.bounds.x + (x - f64::from(self.physical.x)) / self.scale_factor,
            self.bounds.y + (y - f64::from(self.physical.y)) / self.scale_factor,
        )
    }

    pub fn rect_to_physical(&self, r: Rect) -> PhysicalRect {
        let (x, y) = self.point_to_physical(r.origin());
        PhysicalRect::new(
            x,
            y,
            (r.width * self.scale_factor).round() as u32,
            (r.height * self.scale_factor).round() as u32,
        )
    }
}

/// The display owning desktop point `p`, else the nearest one.
fn owner_of(displays: &[Display], p: Point) -> Option<&Display> {
    displays.iter().find(|d| d.bounds.contains(p)).or_else(|| {
        displays
            .iter()
            .min_by(|a, b| a.bounds.distance_to(p).total_cmp(&b.bounds.distance_to(p)))
    })
}

/// Window placement for a desktop point, in physical pixels. Each point is
/// scaled by the display it lands on, not by the one a window is
/// currently sitting on.
pub fn desktop_to_physical(p: Point, displays: &[Display]) -> Option<(i32, i32)> {
    owner_of(displays, p).map(|d| d.point_to_physical(p))
}

pub fn desktop_rect_to_physical(r: Rect, displays: &[Display]) -> Option<PhysicalRect> {
    owner_of(displays, r.origin()).map(|d| d.rect_to_physical(r))
}

/// Desktop point for a physical coordinate, e.g. the cursor or a window's
/// outer position.
pub fn physical_to_desktop(x: f64, y: f64, displays: &[Display]) -> Option<Point> {
    displays
        .iter()
        .find(|d| d.physical.contains(x, y))
        .or_else(|| {
            displays
                .iter()
                .min_by(|a, b| a.physical.distance_to(x, y).total_cmp(&b.physical.distance_to(x, y)))
        })
        .map(|d| d.point_from_physical(x, y))
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("No displays available")]
    NoDisplays,

    #[error("Failed to enumerate displays: {0}")]
    Enumeration(String),
}

/// Platform display enumeration.
pub trait DisplayProvider {
    fn displays(&self) -> Result<Vec<Display>, ResolveError>;
}

/// A fixed topology, e.g. a snapshot taken by the caller.
impl DisplayProvider for Vec<Display> {
    fn displays(&self) -> Result<Vec<Display>, ResolveError> {
        Ok(self.clone())
    }
}

/// Returns the display containing `point`, or the nearest one when the
/// point falls in a gap between monitors. Ties go to enumeration order.
pub fn resolve_target_display<P>(provider: &P, point: Point) -> Result<Display, ResolveError>
where
    P: DisplayProvider + ?Sized,
{
    let displays = provider.displays()?;

    if let Some(hit) = displays.iter().find(|d| d.bounds.contains(point)) {
        log::debug!("[DISPLAY] ({:.0},{:.0}) inside {}", point.x, point.y, hit.id);
        return Ok(hit.clone());
    }

    let nearest = displays
        .into_iter()
        .map(|d| (d.bounds.distance_to(point), d))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, d)| d)
        .ok_or(ResolveError::NoDisplays)?;

    log::debug!(
        "[DISPLAY] ({:.0},{:.0}) outside all displays, nearest is {}",
        point.x,
        point.y,
        nearest.id
    );
    Ok(nearest)
}
