/// Position of the brush on the canvas and whether it is laying down paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushState {
    pub x: i32,
    pub y: i32,
    pub painting: bool,
}

impl BrushState {
    pub fn centered(width: u32, height: u32) -> Self {
        BrushState {
            x: (width / 2) as i32,
            y: (height / 2) as i32,
            painting: false,
        }
    }

    /// Moves the brush, keeping it inside [0, width] x [0, height], and replaces the painting
    /// flag. The flag is level triggered: it only reflects the latest sample.
    pub fn apply(&mut self, delta: (i32, i32), painting: bool, width: u32, height: u32) {
        let max_x = i32::try_from(width).unwrap_or(i32::MAX);
        let max_y = i32::try_from(height).unwrap_or(i32::MAX);

        self.x = self.x.saturating_add(delta.0).clamp(0, max_x);
        self.y = self.y.saturating_add(delta.1).clamp(0, max_y);
        self.painting = painting;
    }
}
