//! Page geometry for image pages.
//!
//! All values are PDF points (1/72 inch) with the origin at the bottom-left
//! corner of the page.

use serde::{Deserialize, Serialize};

/// Inset applied to all four sides of a generated page (0.5 inch).
pub const MARGIN: f32 = 36.0;

/// Named output page size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageSize {
    /// 595 x 842 pt
    #[default]
    A4,
    /// 612 x 792 pt
    Letter,
}

impl PageSize {
    /// Parse a page size name. Unrecognized names fall back to A4.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_uppercase().as_str() {
            "LETTER" => Self::Letter,
            _ => Self::A4,
        }
    }

    /// Portrait `(width, height)` in points.
    pub const fn dimensions(self) -> (f32, f32) {
        match self {
            Self::A4 => (595.0, 842.0),
            Self::Letter => (612.0, 792.0),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A4 => "A4",
            Self::Letter => "LETTER",
        }
    }
}

impl std::fmt::Display for PageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page orientation for image pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
    /// Landscape for images wider than tall, portrait otherwise
    #[default]
    Auto,
}

impl Orientation {
    /// Parse an orientation name. Unrecognized names fall back to `Auto`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "portrait" => Self::Portrait,
            "landscape" => Self::Landscape,
            _ => Self::Auto,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
            Self::Auto => "auto",
        }
    }

    /// Whether a page holding an image of the given pixel size is landscape.
    pub const fn is_landscape_for(self, image_width: u32, image_height: u32) -> bool {
        match self {
            Self::Portrait => false,
            Self::Landscape => true,
            Self::Auto => image_width > image_height,
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an image lands on its page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub page_width: f32,
    pub page_height: f32,
    /// Lower-left corner of the drawn image
    pub x: f32,
    pub y: f32,
    /// Drawn size
    pub width: f32,
    pub height: f32,
}

impl Placement {
    /// Compute the page and image rectangle for one image.
    ///
    /// The page is `page_size`, swapped to landscape when `orientation`
    /// calls for it. The image gets the largest uniform scale that fits
    /// inside the margin box and is centered on the page.
    #[allow(clippy::cast_precision_loss)]
    pub fn for_image(
        page_size: PageSize,
        orientation: Orientation,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        let (mut page_width, mut page_height) = page_size.dimensions();
        if orientation.is_landscape_for(image_width, image_height) {
            std::mem::swap(&mut page_width, &mut page_height);
        }

        // Pixel dimensions are well below f32's exact integer range in practice
        let (iw, ih) = (image_width.max(1) as f32, image_height.max(1) as f32);

        let max_width = 2.0f32.mul_add(-MARGIN, page_width);
        let max_height = 2.0f32.mul_add(-MARGIN, page_height);
        let scale = (max_width / iw).min(max_height / ih);

        let width = iw * scale;
        let height = ih * scale;

        Self {
            page_width,
            page_height,
            x: (page_width - width) / 2.0,
            y: (page_height - height) / 2.0,
            width,
            height,
        }
    }

    pub fn is_landscape(&self) -> bool {
        self.page_width > self.page_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn assert_inside_margins(p: &Placement) {
        assert!(p.width <= p.page_width - 2.0 * MARGIN + EPS);
        assert!(p.height <= p.page_height - 2.0 * MARGIN + EPS);
        assert!(p.x >= MARGIN - EPS);
        assert!(p.y >= MARGIN - EPS);
        assert!(p.x + p.width <= p.page_width - MARGIN + EPS);
        assert!(p.y + p.height <= p.page_height - MARGIN + EPS);
    }

    #[test]
    fn test_page_size_from_name() {
        assert_eq!(PageSize::from_name("A4"), PageSize::A4);
        assert_eq!(PageSize::from_name("letter"), PageSize::Letter);
        assert_eq!(PageSize::from_name("LETTER"), PageSize::Letter);
        assert_eq!(PageSize::from_name("tabloid"), PageSize::A4);
        assert_eq!(PageSize::from_name(""), PageSize::A4);
    }

    #[test]
    fn test_orientation_from_name() {
        assert_eq!(Orientation::from_name("Portrait"), Orientation::Portrait);
        assert_eq!(Orientation::from_name("landscape"), Orientation::Landscape);
        assert_eq!(Orientation::from_name("auto"), Orientation::Auto);
        assert_eq!(Orientation::from_name("sideways"), Orientation::Auto);
    }

    #[test]
    fn test_auto_orientation_follows_image() {
        let wide = Placement::for_image(PageSize::A4, Orientation::Auto, 800, 600);
        assert!((wide.page_width - 842.0).abs() < EPS);
        assert!((wide.page_height - 595.0).abs() < EPS);

        let tall = Placement::for_image(PageSize::A4, Orientation::Auto, 600, 800);
        assert!((tall.page_width - 595.0).abs() < EPS);
        assert!((tall.page_height - 842.0).abs() < EPS);

        // Square images stay portrait
        let square = Placement::for_image(PageSize::Letter, Orientation::Auto, 500, 500);
        assert!(!square.is_landscape());
    }

    #[test]
    fn test_forced_orientation_ignores_image() {
        let p = Placement::for_image(PageSize::Letter, Orientation::Landscape, 100, 400);
        assert!((p.page_width - 792.0).abs() < EPS);
        assert!((p.page_height - 612.0).abs() < EPS);

        let p = Placement::for_image(PageSize::Letter, Orientation::Portrait, 400, 100);
        assert!((p.page_width - 612.0).abs() < EPS);
        assert!((p.page_height - 792.0).abs() < EPS);
    }

    #[test]
    fn test_scale_and_centering() {
        // 842x595 page, box 770x523: height-bound, scale = 523/600
        let p = Placement::for_image(PageSize::A4, Orientation::Auto, 800, 600);
        let scale = 523.0 / 600.0;
        assert!((p.width - 800.0 * scale).abs() < EPS);
        assert!((p.height - 523.0).abs() < EPS);
        assert!((p.x - (842.0 - p.width) / 2.0).abs() < EPS);
        assert!((p.y - MARGIN).abs() < EPS);
        assert_inside_margins(&p);
    }

    #[test]
    fn test_small_images_are_scaled_up() {
        let p = Placement::for_image(PageSize::A4, Orientation::Portrait, 10, 10);
        assert!((p.width - 523.0).abs() < EPS);
        assert!((p.height - 523.0).abs() < EPS);
        assert_inside_margins(&p);
    }

    #[test]
    fn test_aspect_ratio_preserved() {
        let sizes = [(1, 1), (3000, 20), (20, 3000), (1920, 1080), (1080, 1920), (4961, 7016)];
        for page_size in [PageSize::A4, PageSize::Letter] {
            for orientation in [Orientation::Portrait, Orientation::Landscape, Orientation::Auto] {
                for (w, h) in sizes {
                    let p = Placement::for_image(page_size, orientation, w, h);
                    #[allow(clippy::cast_precision_loss)]
                    let expected = w as f32 / h as f32;
                    let actual = p.width / p.height;
                    assert!(
                        (actual - expected).abs() / expected < 1e-4,
                        "{w}x{h} on {page_size} {orientation}: {actual} vs {expected}"
                    );
                    assert!(p.page_width > 0.0 && p.page_height > 0.0);
                    assert_inside_margins(&p);
                }
            }
        }
    }
}
