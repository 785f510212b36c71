//! Windows OCR via Windows.Media.Ocr (WinRT).
//!
//! Only compiled on Windows. Uses the languages installed in the user's
//! profile; the tesseract language setting does not apply here.

use codecap_core::ports::RecognitionError;
use windows::{
    Graphics::Imaging::BitmapDecoder,
    Media::Ocr::OcrEngine,
    Storage::Streams::{DataWriter, InMemoryRandomAccessStream},
};

/// Blocking. Run on the blocking pool.
pub fn recognize(png: &[u8]) -> Result<String, RecognitionError> {
    recognize_inner(png).map_err(|e| RecognitionError::Failed(format!("Windows OCR: {}", e)))
}

// PNG bytes → InMemoryRandomAccessStream → BitmapDecoder → SoftwareBitmap
// → OcrEngine::RecognizeAsync → text
fn recognize_inner(png: &[u8]) -> windows::core::Result<String> {
    let stream = InMemoryRandomAccessStream::new()?;
    let writer = DataWriter::CreateDataWriter(&stream)?;
    writer.WriteBytes(png)?;
    writer.StoreAsync()?.get()?;
    writer.FlushAsync()?.get()?;
    writer.DetachStream()?;
    stream.Seek(0)?;

    let decoder = BitmapDecoder::CreateAsync(&stream)?.get()?;
    let bitmap = decoder.GetSoftwareBitmapAsync()?.get()?;

    let engine = OcrEngine::TryCreateFromUserProfileLanguages()?;
    let result = engine.RecognizeAsync(&bitmap)?.get()?;
    Ok(result.Text()?.to_string().trim().to_string())
}

pub fn warm_up() {
    match OcrEngine::TryCreateFromUserProfileLanguages() {
        Ok(_) => log::info!("[OCR] tesseract not found, using Windows OCR"),
        Err(e) => log::warn!("[OCR] No tesseract and Windows OCR unavailable: {}", e),
    }
}
