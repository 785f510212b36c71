use super::surface::WindowVisibility;
use crate::display::{Display, DisplayId};
use crate::geometry::{CropRect, Point, SelectionRect};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Idle,
    ToolbarVisible,
    /// Overlay shown on the target display, waiting for a drag.
    OverlayArmed,
    /// Drag in progress.
    Selecting,
    /// Frame capture, crop and recognition in flight.
    Processing,
    /// Recognized text shown in the editable form.
    Reviewing,
}

impl Phase {
    /// True while a capture session owns the overlay.
    pub fn is_capturing(&self) -> bool {
        matches!(
            self,
            Phase::OverlayArmed | Phase::Selecting | Phase::Processing | Phase::Reviewing
        )
    }
}

/// Result of one crop + recognition pass, kept until save or cancel.
#[derive(Debug, Clone)]
pub struct Review {
    pub text: String,
    /// Encoded PNG of the crop; attached to the saved snippet.
    pub png: Vec<u8>,
    pub crop: CropRect,
    pub display_id: DisplayId,
    /// Set when recognition failed; `text` is empty in that case.
    pub recognition_error: Option<String>,
    /// The frame came from a fallback source rather than the target display.
    pub degraded: bool,
    /// Last failed save attempt, cleared on the next attempt.
    pub save_error: Option<String>,
}

/// A live capture. Exists from arming the overlay until it is dismissed.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    /// Resolved once when the overlay is armed and never re-resolved.
    pub display: Display,
    /// Pointer-down position of the drag in progress.
    pub anchor: Option<Point>,
    pub selection: Option<SelectionRect>,
    /// Error from the last failed capture attempt, shown on the overlay.
    pub last_error: Option<String>,
    pub review: Option<Review>,
}

impl CaptureSession {
    pub fn new(display: Display) -> Self {
        Self {
            display,
            anchor: None,
            selection: None,
            last_error: None,
            review: None,
        }
    }
}

/// Everything the controller knows, in one owned value.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub phase: Phase,
    pub visibility: WindowVisibility,
    pub session: Option<CaptureSession>,
}

impl SessionState {
    /// Emblem and toolbar are never both up, the overlay only shows for a
    /// live session, and a live session always has the overlay up.
    pub fn is_consistent(&self) -> bool {
        let v = self.visibility;
        !(v.emblem && v.toolbar)
            && v.overlay == self.session.is_some()
            && self.session.is_some() == self.phase.is_capturing()
            && (self.phase != Phase::ToolbarVisible || v.toolbar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    #[test]
    fn default_state_is_idle_and_consistent() {
        let state = SessionState::default();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.is_consistent());
    }

    #[test]
    fn overlay_without_session_is_inconsistent() {
        let mut state = SessionState::default();
        state.visibility.overlay = true;
        assert!(!state.is_consistent());

        state.phase = Phase::OverlayArmed;
        state.session = Some(CaptureSession::new(Display::new(
            "main",
            Rect::new(0.0, 0.0, 800.0, 600.0),
            1.0,
        )));
        assert!(state.is_consistent());
    }

    #[test]
    fn emblem_and_toolbar_are_exclusive() {
        let mut state = SessionState::default();
        state.visibility.emblem = true;
        state.visibility.toolbar = true;
        state.phase = Phase::ToolbarVisible;
        assert!(!state.is_consistent());
    }
}
