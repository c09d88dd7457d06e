mod images;
mod layout;
mod merge;

pub use images::{AssemblyOutcome, ImageAssembler, ImageKind, SkippedImage, assemble_images};
pub use layout::{MARGIN, Orientation, PageSize, Placement};
pub use merge::{MergeOutcome, merge_pdfs};
