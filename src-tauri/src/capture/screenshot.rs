//! Full-frame capture using the `xcap` crate.
//!
//! Infrastructure layer: talks to the OS. xcap calls
//! block, so both enumeration and capture run on the blocking pool.

use codecap_core::capture::{FrameError, FrameSize, FrameSource, SourceInfo};
use codecap_core::display::{DisplayId, PhysicalRect};
use image::RgbaImage;
use std::future::Future;
use xcap::Monitor;

/// Screen sources backed by xcap, one per monitor.
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapFrames;

/// Placement as xcap reports it. On macOS xcap returns points rather than
/// pixels, so those are scaled up to match the windowing side.
pub fn xcap_placement(x: i32, y: i32, width: u32, height: u32, scale: f64, in_points: bool) -> PhysicalRect {
    if !in_points || scale <= 1.0 {
        return PhysicalRect::new(x, y, width, height);
    }
    PhysicalRect::new(
        (f64::from(x) * scale).round() as i32,
        (f64::from(y) * scale).round() as i32,
        (f64::from(width) * scale).round() as u32,
        (f64::from(height) * scale).round() as u32,
    )
}

fn placement_of(monitor: &Monitor) -> Result<PhysicalRect, FrameError> {
    let failed = |e: xcap::XCapError| FrameError::Enumeration(e.to_string());
    let scale = monitor.scale_factor().map_err(failed)?;
    Ok(xcap_placement(
        monitor.x().map_err(failed)?,
        monitor.y().map_err(failed)?,
        monitor.width().map_err(failed)?,
        monitor.height().map_err(failed)?,
        f64::from(scale),
        cfg!(target_os = "macos"),
    ))
}

fn list_sources() -> Result<Vec<SourceInfo>, FrameError> {
    let monitors = Monitor::all().map_err(|e| FrameError::Enumeration(e.to_string()))?;
    let mut sources = Vec::with_capacity(monitors.len());
    for monitor in &monitors {
        let key = placement_of(monitor)?.key();
        log::trace!(
            "[CAPTURE] Source {} is '{}'",
            key,
            monitor.name().unwrap_or_default()
        );
        sources.push(SourceInfo {
            display_id: Some(DisplayId::new(key.clone())),
            name: key,
        });
    }
    Ok(sources)
}

fn capture_source(key: &str, requested: FrameSize) -> Result<RgbaImage, FrameError> {
    let monitors = Monitor::all().map_err(|e| FrameError::Enumeration(e.to_string()))?;
    let monitor = monitors
        .iter()
        .find(|m| placement_of(m).is_ok_and(|p| p.key() == key))
        .ok_or_else(|| FrameError::CaptureFailed(format!("monitor at {} disappeared", key)))?;

    let image = monitor
        .capture_image()
        .map_err(|e| FrameError::CaptureFailed(e.to_string()))?;

    // xcap always captures at native resolution. Crop mapping derives its
    // scale from the actual frame, so a mismatch is only worth a note.
    if image.width() != requested.width || image.height() != requested.height {
        log::debug!(
            "[CAPTURE] {} returned {}x{}, expected {}x{}",
            key,
            image.width(),
            image.height(),
            requested.width,
            requested.height
        );
    }
    Ok(image)
}

impl FrameSource for XcapFrames {
    fn sources(&self) -> impl Future<Output = Result<Vec<SourceInfo>, FrameError>> + Send {
        async {
            tauri::async_runtime::spawn_blocking(list_sources)
                .await
                .map_err(|e| FrameError::Enumeration(e.to_string()))?
        }
    }

    fn grab(&self, source: &SourceInfo, size: FrameSize) -> impl Future<Output = Result<RgbaImage, FrameError>> + Send {
        let key = source.name.clone();
        async move {
            tauri::async_runtime::spawn_blocking(move || capture_source(&key, size))
                .await
                .map_err(|e| FrameError::CaptureFailed(e.to_string()))?
        }
    }
}
