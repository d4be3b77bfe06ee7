use crate::device::constants::{AXIS_MAX, AXIS_SPAN_DIVISOR, PAINT_BUTTON_MASK, SAMPLE_LEN};

/// One report of the gamepad.
///
/// ```text
/// [0-1] : X axis (i16 little-endian)
/// [2-3] : Y axis (i16 little-endian)
/// [4]   : Button flags (i8), bit 0 is the trigger
/// [5]   : Padding
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub x_axis: i16,
    pub y_axis: i16,
    pub buttons: i8,
}

fn axis_delta(axis: i16, dimension: u32) -> i32 {
    // i16::MIN is one step past full deflection
    let factor = (axis as f64 / AXIS_MAX).clamp(-1.0, 1.0);
    (factor * (dimension as f64 / AXIS_SPAN_DIVISOR)).round() as i32
}

impl Sample {
    /// Returns `None` for payloads shorter than a full report. Extra bytes are ignored.
    pub fn parse(data: &[u8]) -> Option<Sample> {
        if data.len() < SAMPLE_LEN {
            return None;
        }

        Some(Sample {
            x_axis: i16::from_le_bytes([data[0], data[1]]),
            y_axis: i16::from_le_bytes([data[2], data[3]]),
            buttons: data[4] as i8,
        })
    }

    /// Brush movement in canvas pixels for a canvas of the given size.
    pub fn delta(&self, width: u32, height: u32) -> (i32, i32) {
        (axis_delta(self.x_axis, width), axis_delta(self.y_axis, height))
    }

    pub fn painting(&self) -> bool {
        self.buttons & PAINT_BUTTON_MASK != 0
    }
}
