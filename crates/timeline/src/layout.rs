use serde::{Deserialize, Serialize};

use crate::{Placement, Position};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Fit natural media dimensions into `bounds`, width first, preserving aspect.
///
/// The width is pinned to the box width; if the resulting height overflows
/// the box, the height is pinned instead. Degenerate inputs fall back to
/// the box itself.
pub fn fit_to_box(natural_width: u32, natural_height: u32, bounds: Size) -> (u32, u32) {
    if natural_width == 0 || natural_height == 0 {
        return (bounds.width.round() as u32, bounds.height.round() as u32);
    }
    let aspect = natural_width as f64 / natural_height as f64;
    let mut width = bounds.width;
    let mut height = width / aspect;
    if height > bounds.height {
        height = bounds.height;
        width = height * aspect;
    }
    (width.round().max(1.0) as u32, height.round().max(1.0) as u32)
}

/// Placement for freshly decoded media: fitted and centered in the preview.
pub fn initial_placement(
    natural_width: u32,
    natural_height: u32,
    fit_box: Size,
    preview: Size,
) -> Placement {
    let (width, height) = fit_to_box(natural_width, natural_height, fit_box);
    Placement {
        position: Position::new(
            (preview.width - width as f64) / 2.0,
            (preview.height - height as f64) / 2.0,
        ),
        width,
        height,
    }
}

/// Clamp a typed dimension into `[1, max]`.
pub fn clamp_dimension(value: i64, max: u32) -> u32 {
    value.clamp(1, max.max(1) as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOX: Size = Size::new(320.0, 240.0);

    #[test]
    fn landscape_pins_width() {
        assert_eq!(fit_to_box(1920, 1080, BOX), (320, 180));
    }

    #[test]
    fn portrait_pins_height() {
        assert_eq!(fit_to_box(1080, 1920, BOX), (135, 240));
    }

    #[test]
    fn four_by_three_fills_box() {
        assert_eq!(fit_to_box(640, 480, BOX), (320, 240));
    }

    #[test]
    fn zero_dimensions_fall_back_to_box() {
        assert_eq!(fit_to_box(0, 480, BOX), (320, 240));
    }

    #[test]
    fn placement_is_centered() {
        let p = initial_placement(1920, 1080, BOX, Size::new(640.0, 360.0));
        assert_eq!(p.width, 320);
        assert_eq!(p.height, 180);
        assert_eq!(p.position, Position::new(160.0, 90.0));
    }

    #[test]
    fn dimensions_clamp() {
        assert_eq!(clamp_dimension(0, 1920), 1);
        assert_eq!(clamp_dimension(-5, 1920), 1);
        assert_eq!(clamp_dimension(4000, 1920), 1920);
        assert_eq!(clamp_dimension(800, 1080), 800);
    }
}
