//! Generated pixel frames
//!
//! Pixels are `0x00RRGGBB` words, so in memory each one reads B, G, R, X.
//! The gradient takes blue from the column and green from the row, shifted
//! by the frame's offset and wrapping every 256 pixels.

/// CPU-side frame handed to the host window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFrame {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PixelFrame {
    /// Black frame of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    /// Renders a fresh gradient frame.
    pub fn render(width: u32, height: u32, offset_x: i32, offset_y: i32) -> Self {
        let mut frame = Self::new(width, height);
        frame.render_into(offset_x, offset_y);
        frame
    }

    /// Redraws the gradient in place.
    pub fn render_into(&mut self, offset_x: i32, offset_y: i32) {
        let width = self.width as usize;
        if width == 0 {
            return;
        }
        for (y, row) in self.pixels.chunks_exact_mut(width).enumerate() {
            let green = (y as i32).wrapping_add(offset_y) as u8;
            for (x, pixel) in row.iter_mut().enumerate() {
                let blue = (x as i32).wrapping_add(offset_x) as u8;
                *pixel = ((green as u32) << 8) | blue as u32;
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pitch in bytes
    pub fn stride(&self) -> u32 {
        self.width * 4
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixel at `(x, y)`, if in bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Raw little-endian bytes for texture upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}
