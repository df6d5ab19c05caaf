//! Pointer hit-testing against the scene's layers.

use crate::{
    foundation::core::{CanvasSize, Point, Rect},
    render::text::TextMeasure,
    scene::model::Layer,
};

/// Axis-aligned box of a layer, centered on its position.
///
/// Text boxes are `measured width x font size`; image boxes are `width x height`.
pub fn layer_bounds(layer: &Layer, measure: &mut dyn TextMeasure) -> Rect {
    let (center, w, h) = match layer {
        Layer::Text(t) => (
            Point::new(t.x, t.y),
            measure.text_width(t),
            t.font.size,
        ),
        Layer::Image(i) => (Point::new(i.x, i.y), i.width, i.height),
    };
    Rect::from_center_size(center, (w, h))
}

/// Index of the topmost layer whose box contains `point` (edges inclusive).
pub fn hit_test(point: Point, layers: &[Layer], measure: &mut dyn TextMeasure) -> Option<usize> {
    layers.iter().enumerate().rev().find_map(|(i, layer)| {
        let r = layer_bounds(layer, measure);
        let inside = point.x >= r.x0 && point.x <= r.x1 && point.y >= r.y0 && point.y <= r.y1;
        inside.then_some(i)
    })
}

/// Where the canvas is shown on screen.
///
/// Pointer events arrive in display coordinates; `display` is the on-screen rectangle the
/// canvas is scaled into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub display: Rect,
    pub canvas: CanvasSize,
}

impl Viewport {
    /// Unscaled: display coordinates equal canvas coordinates.
    pub fn identity(canvas: CanvasSize) -> Self {
        Self {
            display: canvas.rect(),
            canvas,
        }
    }

    pub fn to_canvas(&self, display_point: Point) -> Point {
        let dw = self.display.width();
        let dh = self.display.height();
        let sx = if dw > 0.0 {
            f64::from(self.canvas.width) / dw
        } else {
            1.0
        };
        let sy = if dh > 0.0 {
            f64::from(self.canvas.height) / dh
        } else {
            1.0
        };
        Point::new(
            (display_point.x - self.display.x0) * sx,
            (display_point.y - self.display.y0) * sy,
        )
    }
}

#[cfg(test)]
#[path = "../tests/unit/hit.rs"]
mod tests;
