//! Viewport record and coordinate-space conversion.

use serde::Serialize;

use crate::script::{CoordSpace, InputStep};

/// Fixed logical screen size and pixel density for one run.
///
/// Process-wide constant for the lifetime of a run; used only to bound
/// pixel-space input positions at parse time and to scale normalized
/// positions into client pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    /// Logical width in client pixels.
    pub width: f64,
    /// Logical height in client pixels.
    pub height: f64,
    /// Device pixel ratio.
    pub dpr: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 360.0,
            height: 640.0,
            dpr: 1.0,
        }
    }
}

/// Translate an input step's declared position into absolute client pixels.
///
/// Pixel-space positions pass through unchanged; normalized positions are
/// scaled by the viewport size. Pure and infallible: positions reaching
/// this function were already range-validated by the parser.
pub fn to_client_position(input: &InputStep, viewport: &Viewport) -> (f64, f64) {
    match input.space {
        CoordSpace::Pixels => (input.x, input.y),
        CoordSpace::Norm01 => (input.x * viewport.width, input.y * viewport.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{EmitMode, PointerAction};

    fn input(x: f64, y: f64, space: CoordSpace) -> InputStep {
        InputStep {
            action: PointerAction::Down,
            pointer_id: 0,
            x,
            y,
            space,
            emit: EmitMode::Both,
        }
    }

    #[test]
    fn scales_normalized_positions() {
        let viewport = Viewport::default();
        let (x, y) = to_client_position(&input(0.5, 0.25, CoordSpace::Norm01), &viewport);
        assert_eq!(x, 180.0);
        assert_eq!(y, 160.0);
    }

    #[test]
    fn passes_pixel_positions_through() {
        let viewport = Viewport::default();
        let (x, y) = to_client_position(&input(12.0, 599.5, CoordSpace::Pixels), &viewport);
        assert_eq!(x, 12.0);
        assert_eq!(y, 599.5);
    }
}
