use async_trait::async_trait;
use image::RgbaImage;
use tracing::{debug, warn};

use crate::export::ExportError;

/// Pixel density multiplier applied when rasterising, relative to CSS pixels.
pub const CAPTURE_MULTIPLIER: f32 = 2.0;

/// Something that can rasterise the mounted export target.
///
/// Returns `TargetNotFound` when nothing is mounted. A zero-sized image is not an error
/// here; the orchestrator reports it as a capture failure.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    async fn capture(&self, multiplier: f32) -> Result<RgbaImage, ExportError>;
}

/// A raster the browser already produced and uploaded.
pub struct UploadedCapture {
    bytes: Option<Vec<u8>>,
    /// CSS width of the rendered target, when the client reports it.
    css_width_px: Option<f32>,
}

impl UploadedCapture {
    pub fn new(bytes: Option<Vec<u8>>, css_width_px: Option<f32>) -> Self {
        Self {
            bytes: bytes.filter(|b| !b.is_empty()),
            css_width_px,
        }
    }
}

#[async_trait]
impl RenderSurface for UploadedCapture {
    async fn capture(&self, multiplier: f32) -> Result<RgbaImage, ExportError> {
        let bytes = self.bytes.as_deref().ok_or(ExportError::TargetNotFound)?;
        let image = image::load_from_memory(bytes)
            .map_err(|e| ExportError::CaptureFailed(format!("unreadable capture: {e}")))?
            .to_rgba8();

        if let Some(css_width) = self.css_width_px {
            let expected = css_width * multiplier;
            if (image.width() as f32 - expected).abs() > multiplier {
                warn!(
                    width = image.width(),
                    expected, "Capture was not taken at the expected density"
                );
            }
        }
        debug!(
            width = image.width(),
            height = image.height(),
            "Decoded uploaded capture"
        );
        Ok(image)
    }
}
