use crate::config::types::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba(0, 0, 0, 0);
}

impl From<Rgb> for Rgba {
    fn from(color: Rgb) -> Self {
        Rgba(color.0, color.1, color.2, 255)
    }
}

/// An RGBA8 pixel surface, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32, color: Rgba) -> Self {
        let mut raster = Raster {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        };
        raster.fill(color);
        raster
    }

    pub fn width(&self) -> u32 { self.width }

    pub fn height(&self) -> u32 { self.height }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let i = (y as usize * self.width as usize + x as usize) * 4;
        let p = &self.pixels[i..i + 4];
        Some(Rgba(p[0], p[1], p[2], p[3]))
    }

    pub fn fill(&mut self, color: Rgba) {
        for p in self.pixels.chunks_exact_mut(4) {
            p.copy_from_slice(&[color.0, color.1, color.2, color.3]);
        }
    }

    /// Draws a filled disc; everything outside the raster is clipped.
    pub fn stamp_circle(&mut self, cx: i32, cy: i32, radius: u32, color: Rgba) {
        let r = radius as i64;
        let (cx, cy) = (cx as i64, cy as i64);
        let r_squared = r.saturating_mul(r);

        let min_x = (cx - r).max(0);
        let max_x = (cx + r).min(self.width as i64 - 1);
        let min_y = (cy - r).max(0);
        let max_y = (cy + r).min(self.height as i64 - 1);

        for y in min_y..=max_y {
            let dy = y - cy;
            for x in min_x..=max_x {
                let dx = x - cx;
                if dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy)) <= r_squared {
                    let i = (y as usize * self.width as usize + x as usize) * 4;
                    self.pixels[i..i + 4].copy_from_slice(&[color.0, color.1, color.2, color.3]);
                }
            }
        }
    }

    /// Composes `source` on top of this raster (source-over). Both must have the same size.
    pub fn blend_over(&mut self, source: &Raster) {
        debug_assert_eq!((self.width, self.height), (source.width, source.height));

        for (dst, src) in self.pixels.chunks_exact_mut(4).zip(source.pixels.chunks_exact(4)) {
            match src[3] {
                0 => {},
                255 => dst.copy_from_slice(src),
                alpha => {
                    let a = alpha as u32;
                    for c in 0..3 {
                        dst[c] = ((src[c] as u32 * a + dst[c] as u32 * (255 - a) + 127) / 255) as u8;
                    }
                    dst[3] = (a + dst[3] as u32 * (255 - a) / 255).min(255) as u8;
                },
            }
        }
    }
}
