use glam::Vec4;

/// Shaded output image, linear RGBA32F, one pixel per kernel invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl Frame {
    pub(crate) fn from_pixels(width: u32, height: u32, pixels: Vec<[f32; 4]>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height) as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Vec4 {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        Vec4::from_array(self.pixels[(y * self.width + x) as usize])
    }

    /// Flat view of the pixel data, four floats per pixel.
    pub fn as_raw(&self) -> &[f32] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Converts to 8-bit RGBA for display or export, clamping each channel
    /// into `[0, 1]`.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            for channel in pixel {
                bytes.push((channel.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
        }
        bytes
    }
}
