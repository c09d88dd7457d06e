use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use super::traits::{ConversionTarget, ConvertedFile, ConverterInfo, OfficeConverter};
use crate::asset::InputAsset;
use crate::error::{Error, Result};

/// Local conversion with a headless LibreOffice (`soffice`) process.
///
/// Each conversion runs in its own temporary directory, removed when the
/// conversion returns.
pub struct LibreOfficeConverter {
    /// Executable name or path
    pub soffice_path: PathBuf,
    /// Upper bound for one `soffice` run
    pub timeout: Duration,
}

impl LibreOfficeConverter {
    pub const fn new(soffice_path: PathBuf, timeout: Duration) -> Self {
        Self {
            soffice_path,
            timeout,
        }
    }

    /// Arguments for converting `input` into `out_dir`.
    fn arguments(input: &Path, out_dir: &Path, target: ConversionTarget) -> Vec<String> {
        let mut args = vec!["--headless".to_string()];
        if target == ConversionTarget::Docx {
            // PDFs open in Draw by default, which can't export Word
            args.push("--infilter=writer_pdf_import".to_string());
        }
        args.extend([
            "--convert-to".to_string(),
            target.extension().to_string(),
            "--outdir".to_string(),
            out_dir.display().to_string(),
            input.display().to_string(),
        ]);
        args
    }
}

#[async_trait]
impl OfficeConverter for LibreOfficeConverter {
    fn info(&self) -> ConverterInfo {
        ConverterInfo {
            name: "LibreOffice",
        }
    }

    /// A bare command name is assumed to be on `PATH`; a path must exist.
    fn is_available(&self) -> bool {
        if self.soffice_path.components().count() > 1 {
            self.soffice_path.exists()
        } else {
            !self.soffice_path.as_os_str().is_empty()
        }
    }

    async fn convert(&self, asset: &InputAsset, target: ConversionTarget) -> Result<ConvertedFile> {
        target.check_source(asset)?;

        let ext = asset
            .extension()
            .ok_or_else(|| Error::InvalidInput(format!("{} has no extension", asset.filename)))?;

        let work_dir = tempfile::tempdir()?;
        // Fixed stem keeps client-supplied names off the filesystem
        let input = work_dir.path().join(format!("input.{ext}"));
        let output = work_dir.path().join(format!("input.{}", target.extension()));
        tokio::fs::write(&input, &asset.bytes).await?;

        let args = Self::arguments(&input, work_dir.path(), target);
        debug!("Running {} {}", self.soffice_path.display(), args.join(" "));

        let run = Command::new(&self.soffice_path)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let result = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                Error::CollaboratorFailure(format!(
                    "LibreOffice timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                Error::CollaboratorFailure(format!(
                    "Failed to run {}: {e}",
                    self.soffice_path.display()
                ))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            warn!("LibreOffice exited with {}: {}", result.status, stderr.trim());
            return Err(Error::CollaboratorFailure(format!(
                "LibreOffice exited with {}",
                result.status
            )));
        }

        let bytes = tokio::fs::read(&output).await.map_err(|e| {
            Error::CollaboratorFailure(format!("LibreOffice produced no output: {e}"))
        })?;

        Ok(ConvertedFile {
            bytes,
            filename: target.output_filename(asset),
            content_type: target.content_type(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments_for_pdf() {
        let args = LibreOfficeConverter::arguments(
            Path::new("/tmp/x/input.docx"),
            Path::new("/tmp/x"),
            ConversionTarget::Pdf,
        );
        assert_eq!(
            args,
            vec!["--headless", "--convert-to", "pdf", "--outdir", "/tmp/x", "/tmp/x/input.docx"]
        );
    }

    #[test]
    fn test_arguments_for_docx_use_writer_import() {
        let args = LibreOfficeConverter::arguments(
            Path::new("/tmp/x/input.pdf"),
            Path::new("/tmp/x"),
            ConversionTarget::Docx,
        );
        assert!(args.contains(&"--infilter=writer_pdf_import".to_string()));
        assert!(args.contains(&"docx".to_string()));
    }

    #[test]
    fn test_availability() {
        let on_path = LibreOfficeConverter::new(PathBuf::from("soffice"), Duration::from_secs(5));
        assert!(on_path.is_available());

        let missing = LibreOfficeConverter::new(
            PathBuf::from("/definitely/not/here/soffice"),
            Duration::from_secs(5),
        );
        assert!(!missing.is_available());
    }

    #[tokio::test]
    async fn test_missing_binary_is_collaborator_failure() {
        let converter = LibreOfficeConverter::new(
            PathBuf::from("/definitely/not/here/soffice"),
            Duration::from_secs(5),
        );
        let asset = InputAsset::new(b"PK".to_vec(), "report.docx");
        let err = converter.convert(&asset, ConversionTarget::Pdf).await.unwrap_err();
        assert!(matches!(err, Error::CollaboratorFailure(_)));
    }

    #[tokio::test]
    async fn test_wrong_kind_is_rejected() {
        let converter = LibreOfficeConverter::new(PathBuf::from("soffice"), Duration::from_secs(5));
        let asset = InputAsset::new(b"x".to_vec(), "photo.png");
        let err = converter.convert(&asset, ConversionTarget::Pdf).await.unwrap_err();
        assert!(err.is_client_error());
    }
}
