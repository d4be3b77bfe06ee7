use crate::brush::raster::{Raster, Rgba};
use crate::brush::state::BrushState;
use crate::config::types::CanvasConfig;

/// The accumulated painting plus the frame that is presented on screen.
pub struct Scene {
    background: Rgba,
    brush_color: Rgba,
    brush_radius: u32,
    indicator_radius: u32,
    // never cleared during a run
    canvas: Raster,
    frame: Raster,
}

impl Scene {
    pub fn new(config: &CanvasConfig) -> Self {
        let background = Rgba::from(config.background);

        Scene {
            background,
            brush_color: Rgba::from(config.brush_color),
            brush_radius: config.brush_radius,
            indicator_radius: config.indicator_radius,
            canvas: Raster::new(config.width, config.height, Rgba::TRANSPARENT),
            frame: Raster::new(config.width, config.height, background),
        }
    }

    pub fn canvas(&self) -> &Raster {
        &self.canvas
    }

    /// Stamps the brush when it is painting, then composes the frame: background, canvas, and
    /// the brush indicator on top.
    pub fn render(&mut self, brush: &BrushState) -> &Raster {
        if brush.painting {
            self.canvas.stamp_circle(brush.x, brush.y, self.brush_radius, self.brush_color);
        }

        self.frame.fill(self.background);
        self.frame.blend_over(&self.canvas);
        self.frame.stamp_circle(brush.x, brush.y, self.indicator_radius, self.brush_color);
        &self.frame
    }
}
