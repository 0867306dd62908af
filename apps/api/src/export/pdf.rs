//! Image-based PDF assembly with `lopdf`.
//!
//! The capture is flattened onto white, JPEG-encoded once, and stored as a single image
//! XObject. Every page draws that same object at its own placement, so a sliced CV
//! costs one image regardless of page count.

use image::{codecs::jpeg::JpegEncoder, Rgb, RgbImage, RgbaImage};
use lopdf::{
    content::{Content, Operation},
    dictionary, Dictionary, Document, Object, Stream,
};

use crate::export::paginate::PagePlacement;
use crate::export::ExportError;
use crate::layout::page::PageGeometry;

const PT_PER_MM: f32 = 72.0 / 25.4;
const JPEG_QUALITY: u8 = 92;
const IMAGE_NAME: &[u8] = b"Im0";

/// Builds the whole PDF in memory. `placements` must be non-empty.
pub fn render_pdf(
    image: &RgbaImage,
    placements: &[PagePlacement],
    page: &PageGeometry,
) -> Result<Vec<u8>, ExportError> {
    if placements.is_empty() {
        return Err(ExportError::CaptureFailed("nothing to place on a page".to_string()));
    }
    let jpeg = encode_jpeg(image)?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width() as i64,
            "Height" => image.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    )
    .with_compression(false);
    let image_id = doc.add_object(image_stream);
    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! {
            "Im0" => image_id,
        },
    });

    let page_width_pt = page.width_mm * PT_PER_MM;
    let page_height_pt = page.height_mm * PT_PER_MM;

    let mut kids: Vec<Object> = Vec::with_capacity(placements.len());
    for placement in placements {
        let content = draw_image(placement, page_height_pt);
        let encoded = content
            .encode()
            .map_err(|e| ExportError::Encode(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as i64,
        "Kids" => kids,
        "MediaBox" => vec![
            Object::Real(0.0),
            Object::Real(0.0),
            Object::Real(page_width_pt),
            Object::Real(page_height_pt),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// PDF space has its origin bottom-left; placements are measured from the top-left.
fn draw_image(placement: &PagePlacement, page_height_pt: f32) -> Content {
    let width = placement.width_mm * PT_PER_MM;
    let height = placement.height_mm * PT_PER_MM;
    let x = placement.x_mm * PT_PER_MM;
    let y = page_height_pt - (placement.y_mm * PT_PER_MM + height);

    Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(width),
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(height),
                    Object::Real(x),
                    Object::Real(y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.to_vec())]),
            Operation::new("Q", vec![]),
        ],
    }
}

/// JPEG has no alpha channel, so transparent pixels are composited onto white first.
fn encode_jpeg(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let flattened = RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = a as u16;
        let over_white = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([over_white(r), over_white(g), over_white(b)])
    });

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
        .encode_image(&flattened)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::paginate::{plan_pages, PagePolicy};
    use crate::layout::page::A4;
    use image::Rgba;

    fn make_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))
    }

    #[test]
    fn test_single_page_pdf() {
        let image = make_image(210, 200);
        let plan = plan_pages(210, 200, &A4, PagePolicy::Slice);
        let bytes = render_pdf(&image, &plan, &A4).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_sliced_pdf_has_one_page_per_band() {
        let image = make_image(210, 700);
        let plan = plan_pages(210, 700, &A4, PagePolicy::Slice);
        assert_eq!(plan.len(), 3);

        let bytes = render_pdf(&image, &plan, &A4).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_empty_plan_is_rejected() {
        let image = make_image(10, 10);
        assert!(matches!(
            render_pdf(&image, &[], &A4),
            Err(ExportError::CaptureFailed(_))
        ));
    }

    #[test]
    fn test_transparency_flattens_to_white() {
        let image = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
        let jpeg = encode_jpeg(&image).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap().to_rgb8();
        let [r, g, b] = decoded.get_pixel(4, 4).0;
        assert!(r > 245 && g > 245 && b > 245);
    }

    #[test]
    fn test_slice_offsets_shift_by_page_height() {
        let page_height_pt = A4.height_mm * PT_PER_MM;
        let first = PagePlacement {
            x_mm: 0.0,
            y_mm: 0.0,
            width_mm: 210.0,
            height_mm: 400.0,
        };
        let second = PagePlacement {
            y_mm: -A4.height_mm,
            ..first
        };
        let y_of = |content: Content| match &content.operations[1].operands[5] {
            Object::Real(y) => *y,
            other => panic!("unexpected operand {other:?}"),
        };
        let shift = y_of(draw_image(&second, page_height_pt)) - y_of(draw_image(&first, page_height_pt));
        assert!((shift - page_height_pt).abs() < 1e-2);
    }
}
