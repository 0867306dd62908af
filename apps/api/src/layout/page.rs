use serde::Serialize;

/// CSS reference density: 96 px per inch.
pub const CSS_PX_PER_MM: f32 = 96.0 / 25.4;

/// Physical page size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
}

/// A4 portrait, the only page size documents are rendered on.
pub const A4: PageGeometry = PageGeometry {
    width_mm: 210.0,
    height_mm: 297.0,
};

impl PageGeometry {
    pub fn height_px(&self) -> f32 {
        self.height_mm * CSS_PX_PER_MM
    }

    pub fn width_px(&self) -> f32 {
        self.width_mm * CSS_PX_PER_MM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_in_css_pixels() {
        assert!((A4.height_px() - 1122.52).abs() < 0.01);
        assert!((A4.width_px() - 793.7).abs() < 0.01);
    }
}
