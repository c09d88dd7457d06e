//! Uploaded input files and their inferred kinds.

use bytes::Bytes;

/// Coarse file kind, inferred from the uploaded filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Jpeg,
    Png,
    Pdf,
    /// `.doc` / `.docx`
    Word,
    /// `.ppt` / `.pptx`
    Presentation,
    Unknown,
}

impl AssetKind {
    /// Infer the kind from a filename's extension.
    pub fn from_filename(filename: &str) -> Self {
        let Some(mime) = mime_guess::from_path(filename).first() else {
            return Self::Unknown;
        };

        match mime.essence_str() {
            "image/jpeg" => Self::Jpeg,
            "image/png" => Self::Png,
            "application/pdf" => Self::Pdf,
            "application/msword"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Self::Word
            }
            "application/vnd.ms-powerpoint"
            | "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
                Self::Presentation
            }
            _ => Self::Unknown,
        }
    }

    /// Whether this is a document kind (PDF or office) rather than an image
    /// or something unrecognized.
    pub const fn is_document(self) -> bool {
        matches!(self, Self::Pdf | Self::Word | Self::Presentation)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG image",
            Self::Png => "PNG image",
            Self::Pdf => "PDF",
            Self::Word => "Word document",
            Self::Presentation => "presentation",
            Self::Unknown => "unknown file",
        }
    }
}

/// One uploaded file: raw bytes plus the name the client gave it.
#[derive(Debug, Clone)]
pub struct InputAsset {
    pub bytes: Bytes,
    pub filename: String,
    pub kind: AssetKind,
}

impl InputAsset {
    pub fn new(bytes: impl Into<Bytes>, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            bytes: bytes.into(),
            kind: AssetKind::from_filename(&filename),
            filename,
        }
    }

    /// Lowercased extension of the original filename.
    pub fn extension(&self) -> Option<String> {
        crate::util::extension(&self.filename)
    }
}
