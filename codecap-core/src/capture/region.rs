//! Pure region mapping and cropping logic.
//!
//! Zero infrastructure dependencies: a selection and a frame go in, a
//! pixel rectangle or PNG bytes come out.

use super::FrameSize;
use crate::display::Display;
use crate::geometry::{CropRect, SelectionRect};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;

/// Pixels added on every side of the mapped selection. Rounding at the
/// selection boundary can shave off the edge of a glyph.
pub const EDGE_PADDING_PX: i64 = 2;

/// Maps a selection in overlay DIP space to a pixel crop of `frame`.
///
/// The scale is derived from the actual frame size rather than the
/// display's nominal factor, since captured frames are sometimes a pixel
/// or two off the theoretical resolution.
pub fn map_to_crop_rect(
    selection: &SelectionRect,
    display: &Display,
    frame: FrameSize,
) -> Result<CropRect, CropError> {
    map_with_padding(selection, display, frame, EDGE_PADDING_PX)
}

pub(crate) fn map_with_padding(
    selection: &SelectionRect,
    display: &Display,
    frame: FrameSize,
    pad: i64,
) -> Result<CropRect, CropError> {
    if display.bounds.width <= 0.0 || display.bounds.height <= 0.0 {
        return Err(CropError::EmptyDisplay);
    }

    let scale_x = f64::from(frame.width) / display.bounds.width;
    let scale_y = f64::from(frame.height) / display.bounds.height;

    // Float-to-int casts saturate; keep the padding from wrapping past them.
    let x = ((selection.x() * scale_x).round() as i64).saturating_sub(pad);
    let y = ((selection.y() * scale_y).round() as i64).saturating_sub(pad);
    let width = ((selection.width() * scale_x).round() as i64).saturating_add(pad.saturating_mul(2));
    let height = ((selection.height() * scale_y).round() as i64).saturating_add(pad.saturating_mul(2));

    let frame_w = i64::from(frame.width);
    let frame_h = i64::from(frame.height);

    let x = x.clamp(0, frame_w);
    let y = y.clamp(0, frame_h);
    let width = width.min(frame_w - x);
    let height = height.min(frame_h - y);

    if width <= 0 || height <= 0 {
        return Err(CropError::ZeroDimension);
    }

    Ok(CropRect {
        x: x as u32,
        y: y as u32,
        width: width as u32,
        height: height as u32,
    })
}

/// Crops `image` to `rect` and returns PNG bytes.
pub fn crop_to_png_bytes(image: &RgbaImage, rect: CropRect) -> Result<Vec<u8>, CropError> {
    if rect.width == 0 || rect.height == 0 {
        return Err(CropError::ZeroDimension);
    }

    let (img_width, img_height) = image.dimensions();
    if !rect.fits_within(img_width, img_height) {
        return Err(CropError::OutOfBounds {
            requested: rect,
            image_size: (img_width, img_height),
        });
    }

    let cropped = image::imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image();

    let mut png_bytes: Vec<u8> = Vec::new();
    DynamicImage::ImageRgba8(cropped)
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| CropError::EncodingFailed(e.to_string()))?;

    Ok(png_bytes)
}

#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("Crop rectangle has zero width or height")]
    ZeroDimension,

    #[error("Display reports empty bounds")]
    EmptyDisplay,

    #[error(
        "Crop rectangle ({},{},{},{}) exceeds image bounds ({}x{})",
        requested.x, requested.y, requested.width, requested.height,
        image_size.0, image_size.1
    )]
    OutOfBounds {
        requested: CropRect,
        image_size: (u32, u32),
    },

    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn retina_1080p() -> Display {
        Display::new("main", Rect::new(0.0, 0.0, 1920.0, 1080.0), 2.0)
    }

    const FRAME_4K: FrameSize = FrameSize {
        width: 3840,
        height: 2160,
    };

    #[test]
    fn maps_interior_selection_with_padding() {
        let sel = SelectionRect::new(100.0, 100.0, 200.0, 150.0);
        let crop = map_to_crop_rect(&sel, &retina_1080p(), FRAME_4K).unwrap();
        assert_eq!(
            crop,
            CropRect {
                x: 198,
                y: 198,
                width: 404,
                height: 304
            }
        );
    }

    #[test]
    fn top_left_corner_clamps_to_origin() {
        let sel = SelectionRect::new(0.0, 0.0, 50.0, 50.0);
        let crop = map_to_crop_rect(&sel, &retina_1080p(), FRAME_4K).unwrap();
        assert_eq!((crop.x, crop.y), (0, 0));
        assert_eq!((crop.width, crop.height), (104, 104));
        assert!(crop.fits_within(3840, 2160));
    }

    #[test]
    fn bottom_right_corner_is_trimmed_to_frame() {
        let sel = SelectionRect::new(1820.0, 1000.0, 100.0, 80.0);
        let crop = map_to_crop_rect(&sel, &retina_1080p(), FRAME_4K).unwrap();
        assert_eq!(crop.x + crop.width, 3840);
        assert_eq!(crop.y + crop.height, 2160);
    }

    #[test]
    fn scale_comes_from_actual_frame_size() {
        // Nominal factor says 2.0, but the platform handed back a 1x frame.
        let sel = SelectionRect::new(100.0, 100.0, 200.0, 150.0);
        let crop = map_to_crop_rect(&sel, &retina_1080p(), FrameSize::new(1920, 1080)).unwrap();
        assert_eq!(
            crop,
            CropRect {
                x: 98,
                y: 98,
                width: 204,
                height: 154
            }
        );
    }

    #[test]
    fn fractional_scale_rounds_to_nearest_pixel() {
        let display = Display::new("laptop", Rect::new(0.0, 0.0, 1280.0, 800.0), 1.5);
        let sel = SelectionRect::new(10.5, 33.3, 101.0, 7.0);
        let crop = map_with_padding(&sel, &display, FrameSize::new(1920, 1200), 0).unwrap();
        // 10.5*1.5=15.75→16, 33.3*1.5=49.95→50, 101*1.5=151.5→152, 7*1.5=10.5→11
        assert_eq!(
            crop,
            CropRect {
                x: 16,
                y: 50,
                width: 152,
                height: 11
            }
        );
    }

    #[test]
    fn every_valid_selection_stays_inside_frame() {
        let display = retina_1080p();
        let steps: [f64; 8] = [0.0, 1.0, 5.0, 333.3, 959.5, 1500.0, 1914.0, 1915.0];
        for &x in &steps {
            for &y in &[0.0_f64, 2.5, 540.0, 1074.0, 1075.0] {
                let w = (1920.0 - x).max(5.0);
                let h = (1080.0 - y).max(5.0);
                let sel = SelectionRect::new(x, y, w, h);
                let crop = map_to_crop_rect(&sel, &display, FRAME_4K).unwrap();
                assert!(crop.fits_within(3840, 2160), "{:?} -> {:?}", sel, crop);
                assert!(crop.width > 0 && crop.height > 0);
            }
        }
    }

    #[test]
    fn selection_outside_frame_is_rejected() {
        let sel = SelectionRect::new(5000.0, 10.0, 50.0, 50.0);
        let result = map_to_crop_rect(&sel, &retina_1080p(), FRAME_4K);
        assert!(matches!(result, Err(CropError::ZeroDimension)));
    }

    #[test]
    fn huge_coordinates_clamp_instead_of_overflowing() {
        let far = SelectionRect::new(1e300, 1e300, 50.0, 50.0);
        assert!(matches!(
            map_to_crop_rect(&far, &retina_1080p(), FRAME_4K),
            Err(CropError::ZeroDimension)
        ));

        let everything = SelectionRect::new(-1e300, -1e300, 1e300, 1e300);
        let crop = map_to_crop_rect(&everything, &retina_1080p(), FRAME_4K).unwrap();
        assert!(crop.fits_within(3840, 2160));
    }

    #[test]
    fn crop_valid_region() {
        let img = RgbaImage::new(100, 100);
        let rect = CropRect {
            x: 10,
            y: 10,
            width: 50,
            height: 50,
        };
        let bytes = crop_to_png_bytes(&img, rect).unwrap();
        // PNG magic bytes
        assert_eq!(&bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (50, 50));
    }

    #[test]
    fn crop_zero_dimension_fails() {
        let img = RgbaImage::new(100, 100);
        let rect = CropRect {
            x: 0,
            y: 0,
            width: 0,
            height: 50,
        };
        assert!(matches!(crop_to_png_bytes(&img, rect), Err(CropError::ZeroDimension)));
    }

    #[test]
    fn crop_out_of_bounds_fails() {
        let img = RgbaImage::new(100, 100);
        let rect = CropRect {
            x: 80,
            y: 80,
            width: 30,
            height: 30,
        };
        assert!(matches!(
            crop_to_png_bytes(&img, rect),
            Err(CropError::OutOfBounds { .. })
        ));
    }
}
