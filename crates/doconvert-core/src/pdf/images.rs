//! Images-to-PDF assembly.
//!
//! Each input image becomes one page. The page is sized from the requested
//! [`PageSize`] and [`Orientation`], and the image is scaled uniformly to fit
//! inside the [`MARGIN`](super::layout::MARGIN) box and centered.
//!
//! Assembly is best-effort: an image that fails to decode is logged,
//! recorded in [`AssemblyOutcome::skipped`] and left out. Only when nothing
//! at all could be embedded does the batch fail, with [`Error::EmptyOutput`].
//!
//! # Decoder selection
//!
//! The decoder is picked from the filename alone: `.png` goes to the PNG
//! decoder, everything else to the JPEG decoder. There is no sniffing of
//! magic bytes, so a PNG uploaded as `photo.jpg` (or the other way round)
//! fails to decode and is skipped.

use std::io::Cursor;

use image::codecs::jpeg::JpegDecoder;
use image::{GenericImageView, ImageDecoder, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, info, warn};

use super::layout::{Orientation, PageSize, Placement};
use crate::error::{Error, Result};

/// Decoder choice, made once from the filename suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn from_filename(filename: &str) -> Self {
        if filename.to_lowercase().ends_with(".png") {
            Self::Png
        } else {
            Self::Jpeg
        }
    }
}

/// An image that was left out of the output, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedImage {
    pub filename: String,
    pub reason: String,
}

/// Result of a successful assembly.
#[derive(Debug, Clone)]
pub struct AssemblyOutcome {
    /// Serialized PDF
    pub pdf: Vec<u8>,
    /// Number of pages (one per embedded image)
    pub pages: usize,
    /// Images that failed to decode, in input order
    pub skipped: Vec<SkippedImage>,
}

/// Number of color components declared in the JPEG frame header (SOFn).
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    if bytes.get(..2)? != [0xFF, 0xD8] {
        return None;
    }

    let mut pos = 2;
    loop {
        if *bytes.get(pos)? != 0xFF {
            return None;
        }
        // Markers may be preceded by any number of fill bytes
        while *bytes.get(pos + 1)? == 0xFF {
            pos += 1;
        }
        let marker = *bytes.get(pos + 1)?;
        pos += 2;

        match marker {
            // Standalone markers carry no length
            0x01 | 0xD0..=0xD7 => continue,
            // Start of scan without a frame header
            0xD9 | 0xDA => return None,
            _ => {}
        }

        let length = usize::from(u16::from_be_bytes([*bytes.get(pos)?, *bytes.get(pos + 1)?]));
        // SOF0..SOF15, except DHT (C4), JPG (C8) and DAC (CC)
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            // length(2) precision(1) height(2) width(2) components(1)
            return bytes.get(pos + 7).copied();
        }
        pos += length;
    }
}

/// Image XObject ready to be added to a document.
struct EmbeddedImage {
    width: u32,
    height: u32,
    stream: Stream,
    /// Alpha channel for PNGs that have one
    soft_mask: Option<Stream>,
}

impl EmbeddedImage {
    fn decode(kind: ImageKind, bytes: &[u8]) -> std::result::Result<Self, String> {
        match kind {
            ImageKind::Jpeg => Self::from_jpeg(bytes),
            ImageKind::Png => Self::from_png(bytes),
        }
    }

    /// JPEG data is embedded as-is with `DCTDecode`; only the header is
    /// parsed to learn the size and component count.
    fn from_jpeg(bytes: &[u8]) -> std::result::Result<Self, String> {
        let decoder = JpegDecoder::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
        let (width, height) = decoder.dimensions();
        if width == 0 || height == 0 {
            return Err("image has zero width or height".to_string());
        }

        let components =
            jpeg_components(bytes).ok_or_else(|| "missing JPEG frame header".to_string())?;

        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        };
        match components {
            1 => dict.set("ColorSpace", "DeviceGray"),
            3 => dict.set("ColorSpace", "DeviceRGB"),
            4 => {
                dict.set("ColorSpace", "DeviceCMYK");
                // Adobe writes CMYK JPEGs with inverted samples
                dict.set(
                    "Decode",
                    [1, 0, 1, 0, 1, 0, 1, 0]
                        .into_iter()
                        .map(Object::Integer)
                        .collect::<Vec<_>>(),
                );
            }
            n => return Err(format!("unsupported JPEG with {n} color components")),
        }

        let stream = Stream::new(dict, bytes.to_vec()).with_compression(false);

        Ok(Self {
            width,
            height,
            stream,
            soft_mask: None,
        })
    }

    /// PNG data is decoded to 8-bit RGB samples (Flate-compressed on save)
    /// plus a gray soft mask when the image has alpha.
    fn from_png(bytes: &[u8]) -> std::result::Result<Self, String> {
        let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .map_err(|e| e.to_string())?;
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err("image has zero width or height".to_string());
        }

        let soft_mask = img.color().has_alpha().then(|| {
            let alpha: Vec<u8> = img.to_rgba8().pixels().map(|p| p[3]).collect();
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(width),
                    "Height" => i64::from(height),
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha,
            )
        });

        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            img.to_rgb8().into_raw(),
        );

        Ok(Self {
            width,
            height,
            stream,
            soft_mask,
        })
    }
}

/// Builder that turns images into pages of a new PDF.
///
/// Owns the document while pages are added; [`finish`](Self::finish)
/// serializes it exactly once.
pub struct ImageAssembler {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    page_size: PageSize,
    orientation: Orientation,
    skipped: Vec<SkippedImage>,
}

impl ImageAssembler {
    pub fn new(page_size: PageSize, orientation: Orientation) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            page_size,
            orientation,
            skipped: Vec::new(),
        }
    }

    /// Number of pages embedded so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Decode one image and append it as a new page.
    ///
    /// A decode failure returns [`Error::DecodeFailure`] and is also recorded
    /// in the skipped list; the assembler stays usable for the next image.
    pub fn add_image(&mut self, bytes: &[u8], filename: &str) -> Result<Placement> {
        let kind = ImageKind::from_filename(filename);

        let image = match EmbeddedImage::decode(kind, bytes) {
            Ok(image) => image,
            Err(reason) => {
                warn!("Skipping image {} ({:?}): {}", filename, kind, reason);
                self.skipped.push(SkippedImage {
                    filename: filename.to_string(),
                    reason: reason.clone(),
                });
                return Err(Error::DecodeFailure {
                    filename: filename.to_string(),
                    reason,
                });
            }
        };

        let (pixel_width, pixel_height) = (image.width, image.height);
        let placement =
            Placement::for_image(self.page_size, self.orientation, pixel_width, pixel_height);
        self.push_page(image, &placement)?;

        debug!(
            "Embedded {} ({}x{} px) on {}x{} pt page",
            filename, pixel_width, pixel_height, placement.page_width, placement.page_height
        );

        Ok(placement)
    }

    fn push_page(&mut self, image: EmbeddedImage, placement: &Placement) -> Result<()> {
        let EmbeddedImage {
            mut stream,
            soft_mask,
            ..
        } = image;

        if let Some(mask) = soft_mask {
            let mask_id = self.doc.add_object(mask);
            stream.dict.set("SMask", Object::Reference(mask_id));
        }
        let image_id = self.doc.add_object(stream);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        placement.width.into(),
                        0.into(),
                        0.into(),
                        placement.height.into(),
                        placement.x.into(),
                        placement.y.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_bytes = content
            .encode()
            .map_err(|e| Error::PdfBuild(format!("Failed to encode page content: {e}")))?;
        let content_id = self
            .doc
            .add_object(Stream::new(lopdf::Dictionary::new(), content_bytes));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                placement.page_width.into(),
                placement.page_height.into(),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });

        self.kids.push(page_id);
        Ok(())
    }

    /// Close the page tree and serialize the document.
    ///
    /// Fails with [`Error::EmptyOutput`] when no image was embedded.
    pub fn finish(self) -> Result<AssemblyOutcome> {
        let Self {
            mut doc,
            pages_id,
            kids,
            skipped,
            ..
        } = self;

        if kids.is_empty() {
            return Err(Error::EmptyOutput);
        }

        let pages = kids.len();
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
            "Count" => i64::try_from(pages).unwrap_or(i64::MAX),
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        doc.compress();

        let mut pdf = Vec::new();
        doc.save_to(&mut pdf)
            .map_err(|e| Error::PdfSave(format!("Failed to save PDF: {e}")))?;

        Ok(AssemblyOutcome {
            pdf,
            pages,
            skipped,
        })
    }
}

/// Build a PDF with one page per image, in input order.
///
/// Images that fail to decode are skipped; see the module docs.
pub fn assemble_images<I, B, S>(
    images: I,
    page_size: PageSize,
    orientation: Orientation,
) -> Result<AssemblyOutcome>
where
    I: IntoIterator<Item = (B, S)>,
    B: AsRef<[u8]>,
    S: AsRef<str>,
{
    let mut assembler = ImageAssembler::new(page_size, orientation);

    for (bytes, filename) in images {
        // Failures are recorded by the assembler
        let _ = assembler.add_image(bytes.as_ref(), filename.as_ref());
    }

    let outcome = assembler.finish()?;
    info!(
        "Assembled {} page(s) ({}, {}), skipped {}",
        outcome.pages,
        page_size,
        orientation,
        outcome.skipped.len()
    );
    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg).unwrap();
        buf
    }

    fn gray_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = GrayImage::from_pixel(width, height, Luma([90]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg).unwrap();
        buf
    }

    fn cmyk_jpeg(width: u16, height: u16) -> Vec<u8> {
        let pixels = vec![[0u8, 160, 160, 20]; usize::from(width) * usize::from(height)];
        let mut buf = Vec::new();
        jpeg_encoder::Encoder::new(&mut buf, 90)
            .encode(
                pixels.as_flattened(),
                width,
                height,
                jpeg_encoder::ColorType::Cmyk,
            )
            .unwrap();
        buf
    }

    fn color_space(stream: &Stream) -> Vec<u8> {
        stream.dict.get(b"ColorSpace").unwrap().as_name().unwrap().to_vec()
    }

    fn png_with_alpha(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 255, 128]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn test_image_kind_from_filename() {
        assert_eq!(ImageKind::from_filename("scan.png"), ImageKind::Png);
        assert_eq!(ImageKind::from_filename("SCAN.PNG"), ImageKind::Png);
        assert_eq!(ImageKind::from_filename("photo.jpg"), ImageKind::Jpeg);
        assert_eq!(ImageKind::from_filename("photo.webp"), ImageKind::Jpeg);
        assert_eq!(ImageKind::from_filename("png"), ImageKind::Jpeg);
    }

    #[test]
    fn test_jpeg_is_embedded_unchanged() {
        let bytes = jpeg(40, 20);
        let image = EmbeddedImage::decode(ImageKind::Jpeg, &bytes).unwrap();
        assert_eq!((image.width, image.height), (40, 20));
        assert_eq!(image.stream.content, bytes);
        assert_eq!(color_space(&image.stream), b"DeviceRGB");
        assert!(image.stream.dict.get(b"Decode").is_err());
        assert!(image.soft_mask.is_none());
    }

    #[test]
    fn test_gray_jpeg_uses_device_gray() {
        let image = EmbeddedImage::decode(ImageKind::Jpeg, &gray_jpeg(8, 8)).unwrap();
        assert_eq!(color_space(&image.stream), b"DeviceGray");
    }

    #[test]
    fn test_cmyk_jpeg_uses_device_cmyk_with_inverted_decode() {
        let bytes = cmyk_jpeg(16, 16);
        assert_eq!(jpeg_components(&bytes), Some(4));

        let image = EmbeddedImage::decode(ImageKind::Jpeg, &bytes).unwrap();
        assert_eq!(color_space(&image.stream), b"DeviceCMYK");
        let decode: Vec<i64> = image
            .stream
            .dict
            .get(b"Decode")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect();
        assert_eq!(decode, vec![1, 0, 1, 0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_cmyk_jpeg_survives_assembly() {
        let bytes = cmyk_jpeg(16, 16);
        let outcome =
            assemble_images([(bytes.as_slice(), "c.jpg")], PageSize::A4, Orientation::Auto)
                .unwrap();

        let doc = Document::load_mem(&outcome.pdf).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let image_id = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Resources")
            .and_then(Object::as_dict)
            .and_then(|r| r.get(b"XObject"))
            .and_then(Object::as_dict)
            .and_then(|x| x.get(b"Im0"))
            .and_then(Object::as_reference)
            .unwrap();
        let stream = doc.get_object(image_id).and_then(Object::as_stream).unwrap();
        assert_eq!(color_space(stream), b"DeviceCMYK");
        assert!(stream.dict.has(b"Decode"));
    }

    #[test]
    fn test_jpeg_components_rejects_malformed_headers() {
        assert_eq!(jpeg_components(b""), None);
        assert_eq!(jpeg_components(b"not a jpeg"), None);
        // SOI then a truncated segment
        assert_eq!(jpeg_components(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), None);
        // SOI then start of scan with no frame header
        assert_eq!(jpeg_components(&[0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02]), None);
        assert_eq!(jpeg_components(&gray_jpeg(4, 4)), Some(1));
        assert_eq!(jpeg_components(&jpeg(4, 4)), Some(3));
    }

    #[test]
    fn test_png_alpha_becomes_soft_mask() {
        let image = EmbeddedImage::decode(ImageKind::Png, &png_with_alpha(3, 2)).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image.stream.content.len(), 3 * 2 * 3);
        let mask = image.soft_mask.unwrap();
        assert_eq!(mask.content, vec![128; 6]);
    }

    #[test]
    fn test_extension_mismatch_fails_decode() {
        let mut assembler = ImageAssembler::new(PageSize::A4, Orientation::Auto);
        let result = assembler.add_image(&png_with_alpha(4, 4), "really-a-png.jpg");
        assert!(matches!(result, Err(Error::DecodeFailure { .. })));
        assert_eq!(assembler.page_count(), 0);

        assembler.add_image(&jpeg(4, 4), "fine.jpg").unwrap();
        let outcome = assembler.finish().unwrap();
        assert_eq!(outcome.pages, 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].filename, "really-a-png.jpg");
    }

    #[test]
    fn test_finish_without_pages_is_empty_output() {
        let assembler = ImageAssembler::new(PageSize::Letter, Orientation::Portrait);
        assert!(matches!(assembler.finish(), Err(Error::EmptyOutput)));
    }

    #[test]
    fn test_assemble_skips_corrupt_images() {
        let images = vec![
            (b"not an image".to_vec(), "broken.jpg"),
            (jpeg(16, 16), "ok.jpg"),
        ];
        let outcome = assemble_images(images, PageSize::A4, Orientation::Auto).unwrap();
        assert_eq!(outcome.pages, 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].filename, "broken.jpg");

        let doc = Document::load_mem(&outcome.pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }
}
