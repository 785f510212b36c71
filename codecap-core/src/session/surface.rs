//! UI surfaces as explicit handles.
//!
//! Each surface kind (emblem, toolbar, overlay) is created lazily, at most
//! once per process, and afterwards only shown, hidden and moved. The
//! desktop shell implements these traits over webview windows; tests use
//! in-memory fakes.

use crate::display::DisplayId;
use crate::geometry::{Point, Rect};
use serde::Serialize;
use std::fmt;

/// Emblem launcher size in DIP.
pub const EMBLEM_SIZE: (f64, f64) = (80.0, 40.0);
/// Toolbar size in DIP.
pub const TOOLBAR_SIZE: (f64, f64) = (320.0, 600.0);
/// Where the toolbar opens when no emblem position is known.
pub const DEFAULT_TOOLBAR_ORIGIN: Point = Point { x: 100.0, y: 100.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    Emblem,
    Toolbar,
    Overlay,
}

impl SurfaceKind {
    pub const ALL: [SurfaceKind; 3] = [SurfaceKind::Emblem, SurfaceKind::Toolbar, SurfaceKind::Overlay];

    /// Window label used by the desktop shell.
    pub fn label(&self) -> &'static str {
        match self {
            SurfaceKind::Emblem => "emblem",
            SurfaceKind::Toolbar => "toolbar",
            SurfaceKind::Overlay => "overlay",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.label() == label)
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Notifications pushed to a surface's content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SurfaceSignal {
    /// The overlay was (re)armed on a display; clear any previous drag or form.
    #[serde(rename_all = "camelCase")]
    Armed { display_id: DisplayId },
    /// The overlay was hidden; reset for reuse.
    Dismissed,
}

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("Failed to create {kind} surface: {reason}")]
    Create { kind: SurfaceKind, reason: String },

    #[error("{kind} surface operation failed: {reason}")]
    Operation { kind: SurfaceKind, reason: String },

    #[error("{0} surface is not available")]
    Unavailable(SurfaceKind),
}

pub trait SurfaceHandle: Send {
    fn show(&mut self) -> Result<(), SurfaceError>;
    fn hide(&mut self) -> Result<(), SurfaceError>;
    fn focus(&mut self) -> Result<(), SurfaceError>;
    /// Position and size in desktop space (see [`crate::display::Display`]).
    /// Used to lay the overlay over a display.
    fn set_bounds(&mut self, bounds: Rect) -> Result<(), SurfaceError>;
    /// Top-left corner in desktop space.
    fn move_to(&mut self, origin: Point) -> Result<(), SurfaceError>;
    /// Current top-left corner, when the platform can report it.
    fn position(&self) -> Option<Point>;
    fn signal(&mut self, signal: SurfaceSignal) -> Result<(), SurfaceError>;
}

pub trait SurfaceFactory: Send {
    type Surface: SurfaceHandle;

    /// Creates a hidden surface of `kind`.
    fn create(&mut self, kind: SurfaceKind) -> Result<Self::Surface, SurfaceError>;
}

/// Lazily created surface handles, one slot per kind.
pub struct Surfaces<F: SurfaceFactory> {
    factory: F,
    emblem: Option<F::Surface>,
    toolbar: Option<F::Surface>,
    overlay: Option<F::Surface>,
}

impl<F: SurfaceFactory> Surfaces<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            emblem: None,
            toolbar: None,
            overlay: None,
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// The handle for `kind`, if it was ever created.
    pub fn get(&mut self, kind: SurfaceKind) -> Option<&mut F::Surface> {
        match kind {
            SurfaceKind::Emblem => self.emblem.as_mut(),
            SurfaceKind::Toolbar => self.toolbar.as_mut(),
            SurfaceKind::Overlay => self.overlay.as_mut(),
        }
    }

    pub fn position(&self, kind: SurfaceKind) -> Option<Point> {
        let slot = match kind {
            SurfaceKind::Emblem => &self.emblem,
            SurfaceKind::Toolbar => &self.toolbar,
            SurfaceKind::Overlay => &self.overlay,
        };
        slot.as_ref().and_then(|s| s.position())
    }

    /// The handle for `kind`, creating it on first use.
    pub fn get_or_create(&mut self, kind: SurfaceKind) -> Result<&mut F::Surface, SurfaceError> {
        let Self {
            factory,
            emblem,
            toolbar,
            overlay,
        } = self;
        let slot = match kind {
            SurfaceKind::Emblem => emblem,
            SurfaceKind::Toolbar => toolbar,
            SurfaceKind::Overlay => overlay,
        };
        if slot.is_none() {
            log::info!("[SURFACE] Creating {} surface", kind);
            *slot = Some(factory.create(kind)?);
        }
        slot.as_mut().ok_or(SurfaceError::Unavailable(kind))
    }
}

/// Which surfaces are currently on screen.
///
/// Emblem and toolbar are mutually exclusive; the overlay is only visible
/// while a capture session is live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowVisibility {
    pub emblem: bool,
    pub toolbar: bool,
    pub overlay: bool,
}

impl WindowVisibility {
    pub fn is_visible(&self, kind: SurfaceKind) -> bool {
        match kind {
            SurfaceKind::Emblem => self.emblem,
            SurfaceKind::Toolbar => self.toolbar,
            SurfaceKind::Overlay => self.overlay,
        }
    }

    pub(crate) fn set(&mut self, kind: SurfaceKind, visible: bool) {
        match kind {
            SurfaceKind::Emblem => self.emblem = visible,
            SurfaceKind::Toolbar => self.toolbar = visible,
            SurfaceKind::Overlay => self.overlay = visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingFactory {
        created: Vec<SurfaceKind>,
    }

    struct NullSurface;

    impl SurfaceHandle for NullSurface {
        fn show(&mut self) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn hide(&mut self) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn focus(&mut self) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn set_bounds(&mut self, _bounds: Rect) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn move_to(&mut self, _origin: Point) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn position(&self) -> Option<Point> {
            None
        }
        fn signal(&mut self, _signal: SurfaceSignal) -> Result<(), SurfaceError> {
            Ok(())
        }
    }

    impl SurfaceFactory for CountingFactory {
        type Surface = NullSurface;

        fn create(&mut self, kind: SurfaceKind) -> Result<NullSurface, SurfaceError> {
            self.created.push(kind);
            Ok(NullSurface)
        }
    }

    #[test]
    fn surfaces_are_created_once_per_kind() {
        let mut surfaces = Surfaces::new(CountingFactory { created: Vec::new() });
        assert!(surfaces.get(SurfaceKind::Overlay).is_none());
        for _ in 0..3 {
            surfaces.get_or_create(SurfaceKind::Overlay).unwrap();
        }
        surfaces.get_or_create(SurfaceKind::Toolbar).unwrap();
        assert_eq!(
            surfaces.factory().created,
            vec![SurfaceKind::Overlay, SurfaceKind::Toolbar]
        );
        assert!(surfaces.get(SurfaceKind::Overlay).is_some());
    }

    #[test]
    fn labels_roundtrip() {
        for kind in SurfaceKind::ALL {
            assert_eq!(SurfaceKind::from_label(kind.label()), Some(kind));
        }
        assert_eq!(SurfaceKind::from_label("settings"), None);
    }
}
