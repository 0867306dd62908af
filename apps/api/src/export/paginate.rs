//! Pagination of one captured raster onto fixed-size pages.
//!
//! The image is mapped to the full page width, which fixes its physical height. Short
//! content gets one page. Taller content is either shrunk onto one page or cut into
//! page-height bands, one page per band; every page reuses the same image shifted up by
//! a whole number of page heights.

use serde::{Deserialize, Serialize};

use crate::layout::page::PageGeometry;

/// Rounding slack when deciding whether mapped content fits on one page.
pub const PAGE_TOLERANCE_MM: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PagePolicy {
    /// Scale the whole image down so it never spills past one page.
    FitToOnePage,
    /// Cut the image into successive page-height bands.
    Slice,
}

/// Where the image goes on one page, in millimetres from the page's top-left corner.
/// `y_mm` is negative for every band after the first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePlacement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

/// Height of the image once its width is mapped to the page width.
pub fn mapped_height_mm(image_width_px: u32, image_height_px: u32, page: &PageGeometry) -> f32 {
    if image_width_px == 0 {
        return 0.0;
    }
    page.width_mm * image_height_px as f32 / image_width_px as f32
}

/// Lays out an image of the given pixel size. Returns one placement per page, never empty
/// for a non-empty image.
pub fn plan_pages(
    image_width_px: u32,
    image_height_px: u32,
    page: &PageGeometry,
    policy: PagePolicy,
) -> Vec<PagePlacement> {
    if image_width_px == 0 || image_height_px == 0 {
        return Vec::new();
    }

    let mapped = mapped_height_mm(image_width_px, image_height_px, page);
    let full_width = PagePlacement {
        x_mm: 0.0,
        y_mm: 0.0,
        width_mm: page.width_mm,
        height_mm: mapped,
    };

    if mapped <= page.height_mm + PAGE_TOLERANCE_MM {
        return vec![full_width];
    }

    match policy {
        PagePolicy::FitToOnePage => {
            let shrink = page.height_mm / mapped;
            let width_mm = page.width_mm * shrink;
            vec![PagePlacement {
                x_mm: (page.width_mm - width_mm) / 2.0,
                y_mm: 0.0,
                width_mm,
                height_mm: page.height_mm,
            }]
        }
        PagePolicy::Slice => {
            let pages = (mapped / page.height_mm).ceil().max(1.0) as usize;
            (0..pages)
                .map(|i| PagePlacement {
                    y_mm: -(i as f32) * page.height_mm,
                    ..full_width
                })
                .collect()
        }
    }
}
