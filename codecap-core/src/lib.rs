//! CodeCap core — capture session state machine, multi-display region
//! mapping, and the local collaborators (snippet store, enrichment,
//! share formatting, settings).
//!
//! Platform access sits behind traits (`DisplayProvider`, `FrameSource`,
//! `SurfaceFactory`, `Recognizer`) so everything here runs without a
//! window system.

pub mod capture;
pub mod display;
pub mod enrich;
pub mod geometry;
pub mod ports;
pub mod session;
pub mod settings;
pub mod share;
pub mod store;

pub use display::{resolve_target_display, Display, DisplayId, DisplayProvider};
pub use geometry::{CropRect, Point, Rect, SelectionRect};
pub use session::{OverlayEvent, OverlayOutcome, Phase, SessionController, SessionError};
