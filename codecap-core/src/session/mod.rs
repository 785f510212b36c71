//! Capture session controller.
//!
//! Owns the surfaces (emblem, toolbar, overlay) and the single live
//! capture, and folds UI input into state transitions:
//!
//!   Idle / ToolbarVisible → OverlayArmed → Selecting → Processing → Reviewing
//!
//! All methods take `&mut self`; the desktop shell keeps the controller
//! behind one async mutex, so transitions never interleave. The only
//! suspension points are frame capture and recognition.

mod state;
mod surface;

pub use state::{CaptureSession, Phase, Review, SessionState};
pub use surface::{
    SurfaceError, SurfaceFactory, SurfaceHandle, SurfaceKind, SurfaceSignal, Surfaces, WindowVisibility,
    DEFAULT_TOOLBAR_ORIGIN, EMBLEM_SIZE, TOOLBAR_SIZE,
};

use crate::capture::{crop_to_png_bytes, map_to_crop_rect, CropError, FrameError, FrameGrabber, FrameSource};
use crate::display::{resolve_target_display, Display, DisplayId, DisplayProvider, ResolveError};
use crate::enrich::Enrichment;
use crate::geometry::{CropRect, Point, SelectionRect};
use crate::ports::{Recognizer, SnippetStore};
use crate::store::{Snippet, SnippetDraft, StoreError};
use serde::{Deserialize, Serialize};

/// Drags smaller than this (DIP, either side) are treated as a click.
pub const MIN_SELECTION_DIP: f64 = 5.0;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Display(#[from] ResolveError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Crop(#[from] CropError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error("No capture result to save")]
    NoReview,
}

/// Pointer input from the overlay, in the overlay's local DIP space.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OverlayEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    /// Escape: abandons a drag, or closes the overlay when none is active.
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OverlayOutcome {
    Ignored,
    SelectionStarted,
    SelectionUpdated(SelectionRect),
    /// Sub-threshold drag or escape mid-drag; still armed.
    GestureCancelled,
    ReviewReady,
    Dismissed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StartOutcome {
    /// A capture is processing; the trigger was dropped.
    Ignored,
    Armed,
    /// An existing session was replaced by a fresh one.
    Reset,
}

/// The edited review form submitted on save.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewForm {
    pub title: Option<String>,
    pub body: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub enrichment: Option<Enrichment>,
}

/// What the overlay needs to render the current session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub visibility: WindowVisibility,
    pub display: Option<Display>,
    pub selection: Option<SelectionRect>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterSession {
    Idle,
    Toolbar,
}

struct CapturedRegion {
    png: Vec<u8>,
    crop: CropRect,
    degraded: bool,
}

async fn capture_region<S: FrameSource>(
    grabber: &FrameGrabber<S>,
    display: &Display,
    selection: &SelectionRect,
) -> Result<CapturedRegion, SessionError> {
    let frame = grabber.capture_frame(display).await?;
    let crop = map_to_crop_rect(selection, display, frame.size())?;
    let png = crop_to_png_bytes(&frame.image, crop)?;
    log::info!(
        "[SESSION] Cropped {}x{} at ({},{}) from {} → {} bytes",
        crop.width,
        crop.height,
        crop.x,
        crop.y,
        frame.display_id,
        png.len()
    );
    Ok(CapturedRegion {
        png,
        crop,
        degraded: frame.degraded,
    })
}

pub struct SessionController<F, D, S, R, P>
where
    F: SurfaceFactory,
{
    surfaces: Surfaces<F>,
    displays: D,
    grabber: FrameGrabber<S>,
    recognizer: R,
    store: P,
    state: SessionState,
    min_selection: f64,
}

impl<F, D, S, R, P> SessionController<F, D, S, R, P>
where
    F: SurfaceFactory,
    D: DisplayProvider,
    S: FrameSource,
    R: Recognizer,
    P: SnippetStore,
{
    pub fn new(factory: F, displays: D, frames: S, recognizer: R, store: P) -> Self {
        Self {
            surfaces: Surfaces::new(factory),
            displays,
            grabber: FrameGrabber::new(frames),
            recognizer,
            store,
            state: SessionState::default(),
            min_selection: MIN_SELECTION_DIP,
        }
    }

    pub fn with_min_selection(mut self, min: f64) -> Self {
        self.min_selection = min;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn surfaces(&self) -> &Surfaces<F> {
        &self.surfaces
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    pub fn review(&self) -> Option<&Review> {
        self.state.session.as_ref().and_then(|s| s.review.as_ref())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.state.session.as_ref();
        SessionSnapshot {
            phase: self.state.phase,
            visibility: self.state.visibility,
            display: session.map(|s| s.display.clone()),
            selection: session.and_then(|s| s.selection),
            last_error: session.and_then(|s| s.last_error.clone()),
        }
    }

    // ── Emblem / toolbar ────────────────────────────────────────────

    /// Tray click: shows the emblem centred on `cursor`, or hides it.
    /// Returns whether the emblem is now visible.
    pub fn toggle_emblem(&mut self, cursor: Point) -> Result<bool, SessionError> {
        if self.state.phase.is_capturing() {
            log::debug!("[SESSION] Emblem toggle ignored during capture");
            return Ok(false);
        }
        if self.state.visibility.emblem {
            self.hide_surface(SurfaceKind::Emblem)?;
            return Ok(false);
        }
        if self.state.visibility.toolbar {
            self.hide_surface(SurfaceKind::Toolbar)?;
            self.state.phase = Phase::Idle;
        }
        let origin = cursor.offset(-EMBLEM_SIZE.0 / 2.0, -EMBLEM_SIZE.1 / 2.0);
        self.show_surface_at(SurfaceKind::Emblem, origin, true)?;
        Ok(true)
    }

    /// Opens the toolbar where the emblem was. Ignored while capturing.
    pub fn show_toolbar(&mut self) -> Result<bool, SessionError> {
        if self.state.phase.is_capturing() {
            log::debug!("[SESSION] Toolbar request ignored during capture");
            return Ok(false);
        }
        let from_emblem = if self.state.visibility.emblem {
            self.surfaces.position(SurfaceKind::Emblem)
        } else {
            None
        };
        let origin = from_emblem
            .or_else(|| self.surfaces.position(SurfaceKind::Toolbar))
            .unwrap_or(DEFAULT_TOOLBAR_ORIGIN);

        self.hide_surface(SurfaceKind::Emblem)?;
        self.show_surface_at(SurfaceKind::Toolbar, origin, true)?;
        self.state.phase = Phase::ToolbarVisible;
        Ok(true)
    }

    /// A surface lost focus.
    pub fn handle_blur(&mut self, kind: SurfaceKind) -> Result<(), SessionError> {
        if !self.state.visibility.is_visible(kind) {
            return Ok(());
        }
        match kind {
            SurfaceKind::Emblem => self.hide_surface(SurfaceKind::Emblem)?,
            SurfaceKind::Toolbar => {
                let origin = self
                    .surfaces
                    .position(SurfaceKind::Toolbar)
                    .unwrap_or(DEFAULT_TOOLBAR_ORIGIN);
                self.hide_surface(SurfaceKind::Toolbar)?;
                if self.state.phase == Phase::ToolbarVisible {
                    self.state.phase = Phase::Idle;
                }
                // Not focused: the user just clicked somewhere else.
                self.show_surface_at(SurfaceKind::Emblem, origin, false)?;
            }
            SurfaceKind::Overlay => {
                if self.state.phase == Phase::OverlayArmed {
                    log::info!("[SESSION] Overlay lost focus, hiding");
                    self.end_session(AfterSession::Idle)?;
                } else {
                    log::debug!("[SESSION] Overlay blur ignored in {:?}", self.state.phase);
                }
            }
        }
        Ok(())
    }

    // ── Capture session ─────────────────────────────────────────────

    /// Hotkey or capture button: arm the overlay on the display under
    /// `cursor`. Replaces a live session; ignored while processing.
    pub fn start_capture(&mut self, cursor: Point) -> Result<StartOutcome, SessionError> {
        if self.state.phase == Phase::Processing {
            log::info!("[SESSION] Capture in flight, ignoring start trigger");
            return Ok(StartOutcome::Ignored);
        }
        let was_live = self.state.session.is_some();

        let display = match resolve_target_display(&self.displays, cursor) {
            Ok(display) => display,
            Err(e) => {
                log::error!("[SESSION] Cannot start capture: {}", e);
                if was_live {
                    self.end_session(AfterSession::Idle)?;
                } else {
                    self.hide_surface(SurfaceKind::Toolbar)?;
                    self.hide_surface(SurfaceKind::Emblem)?;
                    self.state.phase = Phase::Idle;
                }
                return Err(e.into());
            }
        };

        self.hide_surface(SurfaceKind::Toolbar)?;
        self.hide_surface(SurfaceKind::Emblem)?;

        let overlay = self.surfaces.get_or_create(SurfaceKind::Overlay)?;
        overlay.set_bounds(display.bounds)?;
        overlay.signal(SurfaceSignal::Armed {
            display_id: display.id.clone(),
        })?;
        overlay.show()?;
        overlay.focus()?;

        log::info!(
            "[SESSION] Overlay armed on {} ({}x{} @{}x){}",
            display.id,
            display.bounds.width,
            display.bounds.height,
            display.scale_factor,
            if was_live { ", replacing live session" } else { "" }
        );

        self.state.visibility.overlay = true;
        self.state.session = Some(CaptureSession::new(display));
        self.state.phase = Phase::OverlayArmed;

        Ok(if was_live {
            StartOutcome::Reset
        } else {
            StartOutcome::Armed
        })
    }

    pub async fn handle_overlay_event(&mut self, event: OverlayEvent) -> Result<OverlayOutcome, SessionError> {
        match event {
            OverlayEvent::PointerDown(p) => Ok(self.begin_selection(p)),
            OverlayEvent::PointerMove(p) => Ok(self.update_selection(p)),
            OverlayEvent::PointerUp(p) => self.finish_selection(p).await,
            OverlayEvent::Cancel => {
                if self.state.phase == Phase::Selecting {
                    self.abandon_gesture();
                    Ok(OverlayOutcome::GestureCancelled)
                } else if self.dismiss_overlay()? {
                    Ok(OverlayOutcome::Dismissed)
                } else {
                    Ok(OverlayOutcome::Ignored)
                }
            }
        }
    }

    /// A second pointer-down while selecting means the previous pointer-up
    /// never arrived; the new press re-anchors the drag.
    fn begin_selection(&mut self, p: Point) -> OverlayOutcome {
        match self.state.phase {
            Phase::OverlayArmed => {}
            Phase::Selecting => log::debug!("[SESSION] Pointer down while selecting, re-anchoring"),
            _ => return OverlayOutcome::Ignored,
        }
        let Some(session) = self.state.session.as_mut() else {
            return OverlayOutcome::Ignored;
        };
        session.anchor = Some(p);
        session.selection = None;
        session.last_error = None;
        self.state.phase = Phase::Selecting;
        OverlayOutcome::SelectionStarted
    }

    fn update_selection(&mut self, p: Point) -> OverlayOutcome {
        if self.state.phase != Phase::Selecting {
            return OverlayOutcome::Ignored;
        }
        match self.state.session.as_mut() {
            Some(session) => match session.anchor {
                Some(anchor) => {
                    let rect = SelectionRect::from_points(anchor, p);
                    session.selection = Some(rect);
                    OverlayOutcome::SelectionUpdated(rect)
                }
                None => OverlayOutcome::Ignored,
            },
            None => OverlayOutcome::Ignored,
        }
    }

    fn abandon_gesture(&mut self) {
        if let Some(session) = self.state.session.as_mut() {
            session.anchor = None;
            session.selection = None;
        }
        self.state.phase = Phase::OverlayArmed;
    }

    async fn finish_selection(&mut self, p: Point) -> Result<OverlayOutcome, SessionError> {
        if self.state.phase != Phase::Selecting {
            return Ok(OverlayOutcome::Ignored);
        }
        let Some(session) = self.state.session.as_mut() else {
            return Ok(OverlayOutcome::Ignored);
        };
        let Some(anchor) = session.anchor.take() else {
            self.state.phase = Phase::OverlayArmed;
            return Ok(OverlayOutcome::Ignored);
        };

        let rect = SelectionRect::from_points(anchor, p);
        if !rect.meets_minimum(self.min_selection) {
            log::debug!(
                "[SESSION] Selection {:.1}x{:.1} below {} DIP, treating as click",
                rect.width(),
                rect.height(),
                self.min_selection
            );
            self.abandon_gesture();
            return Ok(OverlayOutcome::GestureCancelled);
        }

        session.selection = Some(rect);
        let display = session.display.clone();
        self.state.phase = Phase::Processing;

        let captured = match capture_region(&self.grabber, &display, &rect).await {
            Ok(captured) => captured,
            Err(e) => {
                log::error!("[SESSION] Capture failed, overlay stays armed: {}", e);
                if let Some(session) = self.state.session.as_mut() {
                    session.selection = None;
                    session.last_error = Some(e.to_string());
                }
                self.state.phase = Phase::OverlayArmed;
                return Err(e);
            }
        };

        let start = std::time::Instant::now();
        let (text, recognition_error) = match self.recognizer.recognize(&captured.png).await {
            Ok(text) => {
                log::info!(
                    "[SESSION] Recognized {} chars in {}ms",
                    text.len(),
                    start.elapsed().as_millis()
                );
                (text, None)
            }
            Err(e) => {
                log::warn!("[SESSION] Recognition failed, reviewing empty text: {}", e);
                (String::new(), Some(e.to_string()))
            }
        };

        let review = Review {
            text,
            png: captured.png,
            crop: captured.crop,
            display_id: display.id,
            recognition_error,
            degraded: captured.degraded,
            save_error: None,
        };
        if let Some(session) = self.state.session.as_mut() {
            session.review = Some(review);
        }
        self.state.phase = Phase::Reviewing;
        Ok(OverlayOutcome::ReviewReady)
    }

    // ── Review ──────────────────────────────────────────────────────

    /// Persists the edited review with its crop, then hides the overlay
    /// and shows the toolbar. On a store error the review stays open.
    pub fn save(&mut self, form: ReviewForm) -> Result<Snippet, SessionError> {
        if self.state.phase != Phase::Reviewing {
            return Err(SessionError::NoReview);
        }
        let review = self
            .state
            .session
            .as_mut()
            .and_then(|s| s.review.as_mut())
            .ok_or(SessionError::NoReview)?;
        review.save_error = None;

        let draft = SnippetDraft {
            id: None,
            title: form.title.filter(|t| !t.trim().is_empty()),
            body: Some(form.body),
            category: form.category.filter(|c| !c.trim().is_empty()),
            tags: Some(form.tags),
            enrichment: form.enrichment,
            image_png: Some(review.png.clone()),
        };

        match self.store.save(draft) {
            Ok(snippet) => {
                self.end_session(AfterSession::Toolbar)?;
                Ok(snippet)
            }
            Err(e) => {
                log::error!("[SESSION] Save failed, review kept open: {}", e);
                review.save_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Discards the session and returns to the toolbar. Returns false when
    /// there was nothing to cancel.
    pub fn cancel(&mut self) -> Result<bool, SessionError> {
        if !self.state.phase.is_capturing() || self.state.phase == Phase::Processing {
            return Ok(false);
        }
        log::info!("[SESSION] Capture cancelled");
        self.end_session(AfterSession::Toolbar)?;
        Ok(true)
    }

    /// Closes the overlay without bringing the toolbar back.
    pub fn dismiss_overlay(&mut self) -> Result<bool, SessionError> {
        if !self.state.phase.is_capturing() || self.state.phase == Phase::Processing {
            return Ok(false);
        }
        log::info!("[SESSION] Overlay dismissed");
        self.end_session(AfterSession::Idle)?;
        Ok(true)
    }

    /// Which display the live session targets.
    pub fn target_display(&self) -> Option<&DisplayId> {
        self.state.session.as_ref().map(|s| &s.display.id)
    }

    // ── Internals ───────────────────────────────────────────────────

    fn end_session(&mut self, next: AfterSession) -> Result<(), SessionError> {
        self.state.session = None;
        self.state.visibility.overlay = false;
        self.state.phase = Phase::Idle;

        if let Some(overlay) = self.surfaces.get(SurfaceKind::Overlay) {
            overlay.signal(SurfaceSignal::Dismissed)?;
            overlay.hide()?;
        }

        if next == AfterSession::Toolbar {
            let origin = self
                .surfaces
                .position(SurfaceKind::Toolbar)
                .unwrap_or(DEFAULT_TOOLBAR_ORIGIN);
            self.hide_surface(SurfaceKind::Emblem)?;
            self.show_surface_at(SurfaceKind::Toolbar, origin, true)?;
            self.state.phase = Phase::ToolbarVisible;
        }
        Ok(())
    }

    fn hide_surface(&mut self, kind: SurfaceKind) -> Result<(), SurfaceError> {
        if !self.state.visibility.is_visible(kind) {
            return Ok(());
        }
        self.state.visibility.set(kind, false);
        if let Some(surface) = self.surfaces.get(kind) {
            surface.hide()?;
        }
        Ok(())
    }

    fn show_surface_at(&mut self, kind: SurfaceKind, origin: Point, focus: bool) -> Result<(), SurfaceError> {
        let surface = self.surfaces.get_or_create(kind)?;
        surface.move_to(origin)?;
        surface.show()?;
        if focus {
            surface.focus()?;
        }
        self.state.visibility.set(kind, true);
        Ok(())
    }
}
