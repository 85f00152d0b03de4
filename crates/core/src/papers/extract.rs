//! PDF text extraction through the `pdftotext` command.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::PaperError;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<String, PaperError>;
}

/// Runs poppler's `pdftotext`, writing the text to stdout
pub struct PdfToText {
    program: String,
}

impl PdfToText {
    pub fn new() -> Self {
        Self {
            program: "pdftotext".to_string(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for PdfToText {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for PdfToText {
    async fn extract(&self, path: &Path) -> Result<String, PaperError> {
        let output = Command::new(&self.program)
            .args(["-enc", "UTF-8", "-layout"])
            .arg(path)
            .arg("-")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| PaperError::Extraction {
                path: path.display().to_string(),
                reason: format!("could not run {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            return Err(PaperError::Extraction {
                path: path.display().to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_extraction_error() {
        let extractor = PdfToText::new().with_program("definitely-not-a-real-pdftotext");
        let err = extractor.extract(Path::new("paper.pdf")).await.unwrap_err();
        match err {
            PaperError::Extraction { path, reason } => {
                assert_eq!(path, "paper.pdf");
                assert!(reason.contains("could not run"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
