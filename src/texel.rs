use glam::{Vec2, Vec4};

use crate::error::LayoutError;

/// Four-channel float image sampled by normalized coordinates, the substrate
/// every packed buffer in the pipeline is encoded into.
///
/// Sampling is nearest-with-edge-clamp, matching the point-sampled data
/// textures the layouts were designed for.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatTexture {
    width: usize,
    height: usize,
    texels: Vec<[f32; 4]>,
}

impl FloatTexture {
    /// Creates a zero-filled texture.
    pub fn new(width: usize, height: usize) -> Result<Self, LayoutError> {
        if width == 0 || height == 0 {
            return Err(LayoutError::EmptyTexture);
        }
        Ok(Self {
            width,
            height,
            texels: vec![[0.0; 4]; width * height],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Resolves normalized coordinates to a texel index, nearest filtering
    /// with clamp-to-edge semantics.
    fn texel_at(&self, uv: Vec2) -> (usize, usize) {
        let x = (uv.x * self.width as f32).floor() as isize;
        let y = (uv.y * self.height as f32).floor() as isize;
        (
            x.clamp(0, self.width as isize - 1) as usize,
            y.clamp(0, self.height as isize - 1) as usize,
        )
    }

    /// Samples the texture at normalized coordinates.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let (x, y) = self.texel_at(uv);
        Vec4::from_array(self.texels[y * self.width + x])
    }

    /// Reads one texel by integer coordinates. Panics outside the image.
    pub fn texel(&self, x: usize, y: usize) -> Vec4 {
        assert!(x < self.width && y < self.height, "texel out of bounds");
        Vec4::from_array(self.texels[y * self.width + x])
    }

    /// Overwrites one texel by integer coordinates. Panics outside the image.
    pub fn set_texel(&mut self, x: usize, y: usize, value: Vec4) {
        assert!(x < self.width && y < self.height, "texel out of bounds");
        self.texels[y * self.width + x] = value.to_array();
    }
}

/// Reads one scalar from a texture addressed as a structured buffer of
/// `item_count` records, each spread over `row_count` four-channel rows.
///
/// Logical address `(item, component)` maps to the normalized coordinate
/// `((item + 1) / (item_count + 1), (component / 4 + 1) / (row_count + 1))`.
/// The `+1 / (n + 1)` offset centers the sample strictly inside its cell so
/// edge clamping can never pull in a neighboring record.
pub fn extract_float(
    texture: &FloatTexture,
    item_count: usize,
    row_count: usize,
    item: usize,
    component: usize,
) -> f32 {
    let u = (item + 1) as f32 / (item_count + 1) as f32;
    let pixel = component / 4;
    let v = (pixel + 1) as f32 / (row_count + 1) as f32;
    let texel = texture.sample(Vec2::new(u, v));
    // component % 4 < 4, so the channel lookup is total.
    texel.to_array()[component % 4]
}

/// Writes one scalar at the address `extract_float` reads it from. Producer
/// half of the codec; the pair is what tests round-trip.
pub fn insert_float(
    texture: &mut FloatTexture,
    item_count: usize,
    row_count: usize,
    item: usize,
    component: usize,
    value: f32,
) {
    let u = (item + 1) as f32 / (item_count + 1) as f32;
    let pixel = component / 4;
    let v = (pixel + 1) as f32 / (row_count + 1) as f32;
    let (x, y) = texture.texel_at(Vec2::new(u, v));
    let mut texel = texture.texel(x, y).to_array();
    texel[component % 4] = value;
    texture.set_texel(x, y, Vec4::from_array(texel));
}
