//! tesseract CLI backend.
//!
//! Pipes the PNG crop through `tesseract stdin stdout -l <langs>`; no temp
//! files are written.

use codecap_core::ports::RecognitionError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const OCR_TIMEOUT: Duration = Duration::from_secs(30);

pub fn locate() -> Option<PathBuf> {
    which::which("tesseract").ok()
}

pub async fn recognize(binary: &Path, png: &[u8], languages: &str) -> Result<String, RecognitionError> {
    let mut child = Command::new(binary)
        .args(["stdin", "stdout", "-l", languages])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| RecognitionError::Unavailable(format!("{}: {}", binary.display(), e)))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| RecognitionError::Failed("tesseract stdin unavailable".to_string()))?;
    stdin
        .write_all(png)
        .await
        .map_err(|e| RecognitionError::Failed(format!("Failed to send image: {}", e)))?;
    drop(stdin);

    let output = tokio::time::timeout(OCR_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| RecognitionError::Failed(format!("tesseract timed out after {}s", OCR_TIMEOUT.as_secs())))?
        .map_err(|e| RecognitionError::Failed(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RecognitionError::Failed(format!(
            "tesseract exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let err = recognize(Path::new("/nonexistent/tesseract"), &[0x89, 0x50], "eng")
            .await
            .unwrap_err();
        assert!(matches!(err, RecognitionError::Unavailable(_)));
    }
}
