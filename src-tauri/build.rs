//! Build script for the CodeCap Tauri app.
//!
//! Only the Tauri codegen step: OCR goes through the tesseract CLI or
//! WinRT at runtime, so there is no native bridge to compile.

fn main() {
    tauri_build::build();
}
