//! PDF text extraction
//!
//! Shells out to `pdftotext` (poppler-utils), writing to stdout. Keeping
//! extraction out of process avoids carrying a PDF parser; the binary is a
//! standard dependency on any machine running this service.

use std::path::Path;
use tokio::process::Command;

/// Extraction errors
#[derive(Debug)]
pub enum PdfError {
    /// pdftotext missing from PATH
    ToolMissing,
    /// pdftotext exited non-zero
    ExtractionFailed(String),
    /// Extracted output was not valid UTF-8
    BadOutput,
    Io(std::io::Error),
}

impl std::fmt::Display for PdfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PdfError::ToolMissing => write!(f, "pdftotext not found in PATH"),
            PdfError::ExtractionFailed(msg) => write!(f, "pdftotext failed: {}", msg),
            PdfError::BadOutput => write!(f, "pdftotext produced non-UTF-8 output"),
            PdfError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for PdfError {}

/// Check whether pdftotext can be spawned
pub fn pdftotext_available() -> bool {
    std::process::Command::new("pdftotext")
        .arg("-v")
        .output()
        .is_ok()
}

/// Extract the full text of a PDF file
pub async fn extract_text(path: &Path) -> Result<String, PdfError> {
    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg(path)
        .arg("-") // stdout
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PdfError::ToolMissing
            } else {
                PdfError::Io(e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(PdfError::ExtractionFailed(stderr));
    }

    String::from_utf8(output.stdout).map_err(|_| PdfError::BadOutput)
}
