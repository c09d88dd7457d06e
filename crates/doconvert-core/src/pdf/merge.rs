//! PDF merging.
//!
//! Inputs are concatenated in the order given, each contributing all of its
//! pages in its own page order. The merge is all-or-nothing: if any input
//! fails to parse, nothing is returned.
//!
//! Every source is renumbered past the objects already collected, so its
//! references stay internally consistent. Source page trees, catalogs and
//! outlines are dropped and a single new page tree is built. Attributes a
//! page inherits from its old page tree (`Resources`, `MediaBox`, `CropBox`,
//! `Rotate`) are copied onto the page first so the page renders the same
//! without its old parents.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Page attributes that may be inherited from ancestor `Pages` nodes.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// Result of a successful merge.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Serialized PDF
    pub pdf: Vec<u8>,
    /// Total pages across all inputs
    pub pages: usize,
}

/// Look up `key` on the page's ancestors, nearest first.
fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    None
}

/// Accumulates pages and objects from successive source documents.
struct MergeBuilder {
    document: Document,
    /// Output pages in final order
    pages: Vec<(ObjectId, Dictionary)>,
    objects: BTreeMap<ObjectId, Object>,
    next_id: u32,
}

impl MergeBuilder {
    fn new() -> Self {
        Self {
            document: Document::with_version("1.5"),
            pages: Vec::new(),
            objects: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Append every page of `doc`, in page order.
    fn append(&mut self, mut doc: Document) -> usize {
        doc.renumber_objects_with(self.next_id);
        self.next_id = doc.max_id + 1;

        // get_pages is keyed by 1-based page number, so values come out in order
        let source_pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let count = source_pages.len();

        for page_id in source_pages {
            let Ok(page) = doc.get_dictionary(page_id) else {
                continue;
            };
            let mut page = page.clone();
            for key in INHERITABLE_KEYS {
                if !page.has(key)
                    && let Some(value) = inherited_attribute(&doc, &page, key)
                {
                    page.set(key, value);
                }
            }
            self.pages.push((page_id, page));
        }

        for (object_id, object) in doc.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
                _ => {
                    self.objects.insert(object_id, object);
                }
            }
        }

        count
    }

    fn finish(self) -> Result<MergeOutcome> {
        let Self {
            mut document,
            pages,
            objects,
            next_id,
        } = self;

        document.objects.extend(objects);
        document.max_id = next_id.saturating_sub(1);

        let pages_id = document.new_object_id();
        let page_count = pages.len();
        let mut kids = Vec::with_capacity(page_count);

        for (page_id, mut page) in pages {
            page.set("Parent", Object::Reference(pages_id));
            document.objects.insert(page_id, Object::Dictionary(page));
            kids.push(Object::Reference(page_id));
        }

        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => i64::try_from(page_count).unwrap_or(i64::MAX),
            }),
        );

        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", Object::Reference(catalog_id));

        document.renumber_objects();
        document.compress();

        let mut pdf = Vec::new();
        document
            .save_to(&mut pdf)
            .map_err(|e| Error::PdfSave(format!("Failed to save merged PDF: {e}")))?;

        Ok(MergeOutcome {
            pdf,
            pages: page_count,
        })
    }
}

/// Concatenate PDFs into one document.
///
/// Fails with [`Error::MergeFailed`] (1-based `index`) on the first input that
/// cannot be parsed. Asking to merge nothing is an [`Error::InvalidInput`].
pub fn merge_pdfs<I, B>(pdfs: I) -> Result<MergeOutcome>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut builder = MergeBuilder::new();
    let mut inputs = 0usize;

    for (i, bytes) in pdfs.into_iter().enumerate() {
        let doc = Document::load_mem(bytes.as_ref()).map_err(|e| Error::MergeFailed {
            index: i + 1,
            reason: e.to_string(),
        })?;

        let count = builder.append(doc);
        debug!("Input {} contributed {} page(s)", i + 1, count);
        inputs += 1;
    }

    if inputs == 0 {
        return Err(Error::InvalidInput("No PDFs uploaded".to_string()));
    }

    let outcome = builder.finish()?;
    info!("Merged {} PDF(s) into {} page(s)", inputs, outcome.pages);
    Ok(outcome)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use lopdf::Stream;
    use lopdf::content::{Content, Operation};

    /// Build a PDF whose page tree carries `Resources` and `MediaBox` on the
    /// `Pages` node only, so pages depend on inheritance.
    fn pdf_with_inherited_attributes(labels: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut kids = Vec::new();
        for label in labels {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*label)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = i64::try_from(kids.len()).unwrap();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 300.into(), 400.into()],
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_merge_nothing_is_invalid_input() {
        let result = merge_pdfs(Vec::<Vec<u8>>::new());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_inherited_attributes_are_copied_onto_pages() {
        let source = pdf_with_inherited_attributes(&["one", "two"]);
        let outcome = merge_pdfs([&source]).unwrap();
        assert_eq!(outcome.pages, 2);

        let merged = Document::load_mem(&outcome.pdf).unwrap();
        for page_id in merged.get_pages().values() {
            let page = merged.get_dictionary(*page_id).unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            assert_eq!(media_box.len(), 4);
            assert!(page.has(b"Resources"), "page lost its inherited resources");
        }
    }

    #[test]
    fn test_corrupt_input_reports_its_position() {
        let good = pdf_with_inherited_attributes(&["a"]);
        let result = merge_pdfs([good.clone(), b"%PDF-1.5 garbage".to_vec(), good]);
        match result {
            Err(Error::MergeFailed { index, .. }) => assert_eq!(index, 2),
            other => panic!("expected MergeFailed, got {other:?}"),
        }
    }
}
