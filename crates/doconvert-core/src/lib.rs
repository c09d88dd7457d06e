//! doconvert Core Library
//!
//! This library provides the document operations behind the doconvert tools:
//! - Images-to-PDF assembly (one page per image, scaled and centered)
//! - PDF merging (pages concatenated in input order)
//! - Office-format conversion relayed to an external backend
//! - Configuration and error types shared by the CLI and web server

pub mod asset;
pub mod config;
pub mod convert;
pub mod error;
pub mod pdf;
pub mod util;

pub use asset::{AssetKind, InputAsset};
pub use config::{AppConfig, ConverterBackend, ConverterConfig, ServerConfig};
pub use convert::{
    ConversionTarget, ConvertedFile, ConverterInfo, OfficeConverter, create_converter,
};
pub use error::{Error, Result};
pub use pdf::{
    AssemblyOutcome, ImageAssembler, ImageKind, MARGIN, MergeOutcome, Orientation, PageSize,
    Placement, SkippedImage, assemble_images, merge_pdfs,
};

use tracing::info;

/// Check that every asset is acceptable as an image for assembly.
///
/// Unknown extensions are let through (they take the JPEG path); files that
/// are clearly documents are rejected.
pub fn check_image_inputs(assets: &[InputAsset]) -> Result<()> {
    if assets.is_empty() {
        return Err(Error::InvalidInput("No images uploaded".to_string()));
    }
    if let Some(asset) = assets.iter().find(|a| a.kind.is_document()) {
        return Err(Error::InvalidInput(format!(
            "{} is a {}, not an image",
            asset.filename,
            asset.kind.label()
        )));
    }
    Ok(())
}

/// Check that every asset is acceptable as a merge input.
///
/// Files with a recognized non-PDF kind are rejected; unrecognized names are
/// left for the parser to judge.
pub fn check_pdf_inputs(assets: &[InputAsset]) -> Result<()> {
    if assets.is_empty() {
        return Err(Error::InvalidInput("No PDFs uploaded".to_string()));
    }
    if let Some(asset) = assets
        .iter()
        .find(|a| !matches!(a.kind, AssetKind::Pdf | AssetKind::Unknown))
    {
        return Err(Error::InvalidInput(format!(
            "{} is a {}, not a PDF",
            asset.filename,
            asset.kind.label()
        )));
    }
    Ok(())
}

/// Validate uploaded images and assemble them into a PDF.
pub fn images_to_pdf(
    assets: &[InputAsset],
    page_size: PageSize,
    orientation: Orientation,
) -> Result<AssemblyOutcome> {
    check_image_inputs(assets)?;
    info!("Assembling {} image(s) into a PDF", assets.len());
    assemble_images(
        assets.iter().map(|a| (&a.bytes, a.filename.as_str())),
        page_size,
        orientation,
    )
}

/// Validate uploaded PDFs and merge them.
pub fn merge_uploaded_pdfs(assets: &[InputAsset]) -> Result<MergeOutcome> {
    check_pdf_inputs(assets)?;
    info!("Merging {} PDF(s)", assets.len());
    merge_pdfs(assets.iter().map(|a| &a.bytes))
}
