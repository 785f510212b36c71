//! OCR domain: the session's recognition port.
//!
//! Prefers the tesseract CLI (honours the configured language set). On
//! Windows, falls back to the built-in Windows.Media.Ocr engine when
//! tesseract is not installed.

mod tesseract;
#[cfg(target_os = "windows")]
mod windows_ocr;

use codecap_core::ports::{RecognitionError, Recognizer};
use std::future::Future;
use std::sync::RwLock;
use std::time::Instant;

pub struct OcrEngine {
    languages: RwLock<String>,
}

impl OcrEngine {
    pub fn new(languages: &str) -> Self {
        Self {
            languages: RwLock::new(languages.to_string()),
        }
    }

    pub fn languages(&self) -> String {
        match self.languages.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_languages(&self, languages: &str) {
        match self.languages.write() {
            Ok(mut guard) => *guard = languages.to_string(),
            Err(poisoned) => *poisoned.into_inner() = languages.to_string(),
        }
        log::info!("[OCR] Languages set to {}", languages);
    }

    /// Name of the backend a capture would use right now.
    pub fn backend(&self) -> &'static str {
        if tesseract::locate().is_some() {
            "tesseract"
        } else if cfg!(target_os = "windows") {
            "windows"
        } else {
            "none"
        }
    }

    /// Logs which backend is available so a missing engine shows up at
    /// startup rather than on the first capture.
    pub fn warm_up(&self) {
        match tesseract::locate() {
            Some(path) => log::info!("[OCR] Using tesseract at {} ({})", path.display(), self.languages()),
            None => {
                #[cfg(target_os = "windows")]
                windows_ocr::warm_up();
                #[cfg(not(target_os = "windows"))]
                log::warn!("[OCR] tesseract not found on PATH, captures will review with empty text");
            }
        }
    }
}

#[cfg(target_os = "windows")]
async fn platform_fallback(png: Vec<u8>) -> Result<String, RecognitionError> {
    tauri::async_runtime::spawn_blocking(move || windows_ocr::recognize(&png))
        .await
        .map_err(|e| RecognitionError::Failed(e.to_string()))?
}

#[cfg(not(target_os = "windows"))]
async fn platform_fallback(_png: Vec<u8>) -> Result<String, RecognitionError> {
    Err(RecognitionError::Unavailable(
        "tesseract not found on PATH".to_string(),
    ))
}

impl Recognizer for OcrEngine {
    fn recognize(&self, png: &[u8]) -> impl Future<Output = Result<String, RecognitionError>> + Send {
        let png = png.to_vec();
        let languages = self.languages();
        async move {
            let start = Instant::now();
            let result = match tesseract::locate() {
                Some(binary) => tesseract::recognize(&binary, &png, &languages).await,
                None => platform_fallback(png).await,
            };
            match &result {
                Ok(text) => log::info!(
                    "[OCR] {} chars in {}ms",
                    text.chars().count(),
                    start.elapsed().as_millis()
                ),
                Err(e) => log::error!("[OCR] {}", e),
            }
            result
        }
    }
}
