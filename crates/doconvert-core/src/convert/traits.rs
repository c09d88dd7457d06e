use async_trait::async_trait;

use crate::asset::{AssetKind, InputAsset};
use crate::error::{Error, Result};
use crate::util::output_filename;

/// Content type of `.docx` output
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Output format requested from an office converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionTarget {
    /// Word or presentation → PDF
    Pdf,
    /// PDF → Word
    Docx,
}

impl ConversionTarget {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => DOCX_CONTENT_TYPE,
        }
    }

    /// Whether an input of this kind can be converted to this target.
    pub const fn accepts(self, kind: AssetKind) -> bool {
        match self {
            Self::Pdf => matches!(kind, AssetKind::Word | AssetKind::Presentation),
            Self::Docx => matches!(kind, AssetKind::Pdf),
        }
    }

    /// Download name for the converted file, derived from the upload name.
    pub fn output_filename(self, source: &InputAsset) -> String {
        match (self, source.kind) {
            (Self::Pdf, AssetKind::Presentation) => {
                output_filename(&source.filename, &["pptx", "ppt"], "presentation", "pdf")
            }
            (Self::Pdf, _) => {
                output_filename(&source.filename, &["docx", "doc"], "document", "pdf")
            }
            (Self::Docx, _) => output_filename(&source.filename, &["pdf"], "document", "docx"),
        }
    }

    /// Check that `asset` is something this target can be produced from.
    pub fn check_source(self, asset: &InputAsset) -> Result<()> {
        if self.accepts(asset.kind) {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "{} is a {}, which cannot be converted to {}",
                asset.filename,
                asset.kind.label(),
                self.extension().to_uppercase()
            )))
        }
    }
}

/// A converted file ready to be relayed to the client.
#[derive(Debug, Clone)]
pub struct ConvertedFile {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
}

/// Information about a converter backend
#[derive(Debug, Clone)]
pub struct ConverterInfo {
    /// Human-readable name
    pub name: &'static str,
}

/// Trait for office-conversion backends
#[async_trait]
pub trait OfficeConverter: Send + Sync {
    /// Get information about this converter
    fn info(&self) -> ConverterInfo;

    /// Get the converter name (convenience method)
    fn name(&self) -> &'static str {
        self.info().name
    }

    /// Whether the converter is configured well enough to attempt a conversion
    fn is_available(&self) -> bool {
        true
    }

    /// Convert `asset` to `target`.
    async fn convert(&self, asset: &InputAsset, target: ConversionTarget) -> Result<ConvertedFile>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts() {
        assert!(ConversionTarget::Pdf.accepts(AssetKind::Word));
        assert!(ConversionTarget::Pdf.accepts(AssetKind::Presentation));
        assert!(!ConversionTarget::Pdf.accepts(AssetKind::Pdf));
        assert!(ConversionTarget::Docx.accepts(AssetKind::Pdf));
        assert!(!ConversionTarget::Docx.accepts(AssetKind::Jpeg));
    }

    #[test]
    fn test_output_filename() {
        let word = InputAsset::new(Vec::<u8>::new(), "Thesis.DOCX");
        assert_eq!(ConversionTarget::Pdf.output_filename(&word), "Thesis.pdf");

        let slides = InputAsset::new(Vec::<u8>::new(), "deck.ppt");
        assert_eq!(ConversionTarget::Pdf.output_filename(&slides), "deck.pdf");

        let pdf = InputAsset::new(Vec::<u8>::new(), "scan.pdf");
        assert_eq!(ConversionTarget::Docx.output_filename(&pdf), "scan.docx");
    }

    #[test]
    fn test_check_source_rejects_wrong_kind() {
        let image = InputAsset::new(Vec::<u8>::new(), "photo.jpg");
        let err = ConversionTarget::Docx.check_source(&image).unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("photo.jpg"));
    }
}
