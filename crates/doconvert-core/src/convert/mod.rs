//! Office-format conversion pass-through.
//!
//! The actual conversion happens elsewhere (a hosted API or a local office
//! suite). This module only ships the file out, waits, and hands the bytes
//! back with a recomputed filename.

mod convertapi;
mod libreoffice;
mod traits;

pub use convertapi::ConvertApiConverter;
pub use libreoffice::LibreOfficeConverter;
pub use traits::{
    ConversionTarget, ConvertedFile, ConverterInfo, DOCX_CONTENT_TYPE, OfficeConverter,
};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::asset::InputAsset;
use crate::config::{ConverterBackend, ConverterConfig};
use crate::error::{Error, Result};

/// Converter used when no backend is configured.
pub struct DisabledConverter;

#[async_trait]
impl OfficeConverter for DisabledConverter {
    fn info(&self) -> ConverterInfo {
        ConverterInfo {
            name: "disabled",
        }
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn convert(
        &self,
        _asset: &InputAsset,
        _target: ConversionTarget,
    ) -> Result<ConvertedFile> {
        Err(Error::CollaboratorFailure(
            "office conversion is not configured".to_string(),
        ))
    }
}

/// Create a converter from configuration
pub fn create_converter(config: &ConverterConfig) -> Result<Arc<dyn OfficeConverter>> {
    let timeout = Duration::from_secs(config.timeout_secs);

    let converter: Arc<dyn OfficeConverter> = match config.effective_backend() {
        ConverterBackend::ConvertApi => Arc::new(ConvertApiConverter::new(
            config.api_base.clone(),
            config.api_secret.clone(),
            timeout,
            config.retry_count,
            config.retry_delay_ms,
        )?),
        ConverterBackend::LibreOffice => Arc::new(LibreOfficeConverter::new(
            config.soffice_path.clone(),
            timeout,
        )),
        ConverterBackend::Disabled => Arc::new(DisabledConverter),
    };

    Ok(converter)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_converter_picks_backend() {
        let disabled = create_converter(&ConverterConfig::default()).unwrap();
        assert_eq!(disabled.name(), "disabled");
        assert!(!disabled.is_available());

        let hosted = create_converter(&ConverterConfig {
            api_secret: Some("secret".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(hosted.name(), "ConvertAPI");
        assert!(hosted.is_available());

        let local = create_converter(&ConverterConfig {
            backend: Some(ConverterBackend::LibreOffice),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(local.name(), "LibreOffice");
    }

    #[tokio::test]
    async fn test_disabled_converter_fails() {
        let asset = InputAsset::new(b"PK".to_vec(), "a.docx");
        let err = DisabledConverter
            .convert(&asset, ConversionTarget::Pdf)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CollaboratorFailure(_)));
    }
}
