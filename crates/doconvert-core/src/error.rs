use thiserror::Error;

/// Unified error type for doconvert-core
///
/// Covers the request-level failures of the assembly components and the
/// office-conversion pass-through, plus configuration and I/O errors.
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Request Errors
    // ==========================================================================
    /// No files supplied, or a file of the wrong kind for the operation
    #[error("{0}")]
    InvalidInput(String),

    // ==========================================================================
    // Assembly Errors
    // ==========================================================================
    /// A single image could not be decoded or embedded.
    ///
    /// Non-fatal: the assembler records it and moves on to the next image.
    #[error("failed to decode image {filename}: {reason}")]
    DecodeFailure { filename: String, reason: String },

    /// Every image in the batch failed to decode
    #[error("No valid images to convert")]
    EmptyOutput,

    /// An input PDF could not be parsed, so nothing was merged
    #[error("failed to merge PDFs: input {index} could not be parsed: {reason}")]
    MergeFailed { index: usize, reason: String },

    /// Failed to build a PDF object (content stream encoding etc.)
    #[error("failed to build PDF: {0}")]
    PdfBuild(String),

    /// Failed to serialize a PDF
    #[error("failed to save PDF: {0}")]
    PdfSave(String),

    // ==========================================================================
    // Office Conversion Errors
    // ==========================================================================
    /// The external converter is missing, misconfigured or failed
    #[error("{0}")]
    CollaboratorFailure(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error was caused by the caller's input rather than by the
    /// service or one of its collaborators.
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
