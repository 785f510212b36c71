//! Screen capture domain — frame grabbing and region cropping.
//!
//! `FrameSource` is the platform seam (the desktop shell backs it with
//! xcap). `FrameGrabber` owns the policy on top: request the target
//! display's native size and pick the source that belongs to it.

mod region;

pub use region::{crop_to_png_bytes, map_to_crop_rect, CropError, EDGE_PADDING_PX};

use crate::display::{Display, DisplayId};
use image::RgbaImage;
use std::future::Future;

/// Requested frame dimensions in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The native size of `display`, using that display's own scale factor.
    pub fn for_display(display: &Display) -> Self {
        let (width, height) = display.pixel_size();
        Self { width, height }
    }
}

/// One capturable screen as listed by the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    /// Display this source mirrors, when the platform can tell.
    pub display_id: Option<DisplayId>,
    pub name: String,
}

/// A full captured frame for one display.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pub display_id: DisplayId,
    pub image: RgbaImage,
    /// Set when no single source matched the target display and the first
    /// candidate was used instead. The crop may come from the wrong monitor.
    pub degraded: bool,
}

impl FrameBuffer {
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.image.width(), self.image.height())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("No screen sources available")]
    NoFrameSource,

    #[error("Failed to enumerate screen sources: {0}")]
    Enumeration(String),

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),
}

/// Platform screen-capture source enumeration.
pub trait FrameSource: Send + Sync {
    fn sources(&self) -> impl Future<Output = Result<Vec<SourceInfo>, FrameError>> + Send;

    /// Capture `source`, scaled to `size` when the platform supports it.
    fn grab(
        &self,
        source: &SourceInfo,
        size: FrameSize,
    ) -> impl Future<Output = Result<RgbaImage, FrameError>> + Send;
}

/// Picks the source belonging to `target`. Falls back to the first source
/// when none matches; the bool reports whether the match was exact. Two
/// sources claiming the same display cannot be told apart, so that match
/// is not exact either.
pub fn select_source<'a>(sources: &'a [SourceInfo], target: &DisplayId) -> Option<(&'a SourceInfo, bool)> {
    let mut claims = sources.iter().filter(|s| s.display_id.as_ref() == Some(target));
    match (claims.next(), claims.next()) {
        (Some(only), None) => return Some((only, true)),
        (Some(first), Some(_)) => {
            log::warn!("[CAPTURE] Several sources claim display {}", target);
            return Some((first, false));
        }
        _ => {}
    }
    sources.first().map(|s| (s, false))
}

pub struct FrameGrabber<S> {
    source: S,
}

impl<S: FrameSource> FrameGrabber<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Captures a full frame of `display` at its native resolution.
    pub async fn capture_frame(&self, display: &Display) -> Result<FrameBuffer, FrameError> {
        let start = std::time::Instant::now();
        let sources = self.source.sources().await?;

        let (source, exact) = select_source(&sources, &display.id).ok_or(FrameError::NoFrameSource)?;
        if !exact {
            log::warn!(
                "[CAPTURE] No unique source for display {} ({} candidates), using '{}'; the crop may come from another monitor",
                display.id,
                sources.len(),
                source.name
            );
        }

        let size = FrameSize::for_display(display);
        let image = self.source.grab(source, size).await?;

        log::info!(
            "[CAPTURE] Frame {}x{} (requested {}x{}) from '{}' in {}ms",
            image.width(),
            image.height(),
            size.width,
            size.height,
            source.name,
            start.elapsed().as_millis()
        );

        Ok(FrameBuffer {
            display_id: display.id.clone(),
            image,
            degraded: !exact,
        })
    }
}
