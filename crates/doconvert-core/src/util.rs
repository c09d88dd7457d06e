//! Utility functions shared across the crate.

use std::path::PathBuf;

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Lowercased extension of a filename, without the dot.
pub fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.contains(['/', '\\']) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Derive a download name from an uploaded filename.
///
/// Strips the first matching extension in `strip` (case-insensitive) and
/// appends `new_ext`. An empty name falls back to `default_stem`.
pub fn output_filename(
    original: &str,
    strip: &[&str],
    default_stem: &str,
    new_ext: &str,
) -> String {
    let name = original.trim();
    let name = if name.is_empty() { default_stem } else { name };

    let stem = strip
        .iter()
        .find_map(|ext| {
            let suffix_len = ext.len() + 1;
            let split = name.len().checked_sub(suffix_len)?;
            let (head, tail) = (name.get(..split)?, name.get(split..)?);
            (tail.starts_with('.') && tail[1..].eq_ignore_ascii_case(ext)).then_some(head)
        })
        .unwrap_or(name);

    format!("{stem}.{new_ext}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(extension("photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension("README"), None);
        assert_eq!(extension(".bashrc"), None);
        assert_eq!(extension("trailing."), None);
    }

    #[test]
    fn test_output_filename_strips_matching_extension() {
        assert_eq!(
            output_filename("report.docx", &["docx", "doc"], "document", "pdf"),
            "report.pdf"
        );
        assert_eq!(
            output_filename("Report.DOC", &["docx", "doc"], "document", "pdf"),
            "Report.pdf"
        );
        assert_eq!(output_filename("scan.pdf", &["pdf"], "document", "docx"), "scan.docx");
    }

    #[test]
    fn test_output_filename_keeps_other_extensions() {
        assert_eq!(
            output_filename("notes.txt", &["docx", "doc"], "document", "pdf"),
            "notes.txt.pdf"
        );
    }

    #[test]
    fn test_output_filename_default_stem() {
        assert_eq!(
            output_filename("", &["pptx", "ppt"], "presentation", "pdf"),
            "presentation.pdf"
        );
        assert_eq!(output_filename("   ", &["pdf"], "document", "docx"), "document.docx");
    }
}
