use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::texel::{extract_float, FloatTexture};

/// Point light as the shading kernel consumes it. Influence is bounded to
/// exactly `radius` by [`falloff`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: Vec3,
    pub radius: f32,
    pub color: Vec3,
}

/// Cubic approximation of a gaussian falloff that reaches exactly zero at the
/// light radius, so a light can never contribute outside the sphere the
/// clustering pass accounted for.
///
/// Evaluated on `h = 2 * distance / radius`:
/// `0.25 * (2 - h)^3 - (1 - h)^3` below 1, `0.25 * (2 - h)^3` below 2, then 0.
pub fn falloff(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    let h = 2.0 * distance / radius;
    if h < 1.0 {
        0.25 * (2.0 - h).powi(3) - (1.0 - h).powi(3)
    } else if h < 2.0 {
        0.25 * (2.0 - h).powi(3)
    } else {
        0.0
    }
}

/// Read-only table of light records. The kernel only ever looks lights up by
/// index; backends are free to hold them in plain memory or decode them from
/// a packed texture.
pub trait LightStore: Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes the record at `index`. `index` must be below `len`.
    fn unpack(&self, index: usize) -> Light;
}

/// Native backend: lights resident in memory, no decoding.
#[derive(Debug, Clone, Default)]
pub struct LightTable {
    lights: Vec<Light>,
}

impl LightTable {
    pub fn new(lights: Vec<Light>) -> Self {
        Self { lights }
    }
}

impl LightStore for LightTable {
    fn len(&self) -> usize {
        self.lights.len()
    }

    fn unpack(&self, index: usize) -> Light {
        self.lights[index]
    }
}

/// Row coordinate of the position/radius row in the packed light image.
const ROW_A_V: f32 = 0.3;
/// Row coordinate of the color row.
const ROW_B_V: f32 = 0.6;

/// Texture backend: one column per light, two rows of four channels.
/// Row A holds `(position.xyz, radius)`, row B holds `(color.rgb, unused)`.
#[derive(Debug, Clone)]
pub struct LightTexture {
    texture: FloatTexture,
    len: usize,
}

impl LightTexture {
    /// Wraps an externally produced light image, checking that its dimensions
    /// match the layout the decoder assumes.
    pub fn from_texture(texture: FloatTexture, lights: usize) -> Result<Self, LayoutError> {
        if texture.width() != lights || texture.height() != 2 {
            return Err(LayoutError::LightBuffer {
                lights,
                got_width: texture.width(),
                got_height: texture.height(),
            });
        }
        Ok(Self {
            texture,
            len: lights,
        })
    }

    /// Encodes a light list into the packed layout.
    pub fn from_lights(lights: &[Light]) -> Result<Self, LayoutError> {
        let mut texture = FloatTexture::new(lights.len(), 2)?;
        for (index, light) in lights.iter().enumerate() {
            texture.set_texel(index, 0, light.position.extend(light.radius));
            texture.set_texel(index, 1, light.color.extend(0.0));
        }
        Self::from_texture(texture, lights.len())
    }

    pub fn texture(&self) -> &FloatTexture {
        &self.texture
    }
}

impl LightStore for LightTexture {
    fn len(&self) -> usize {
        self.len
    }

    fn unpack(&self, index: usize) -> Light {
        let u = (index + 1) as f32 / (self.len + 1) as f32;
        let row_a = self.texture.sample(Vec2::new(u, ROW_A_V));
        let row_b = self.texture.sample(Vec2::new(u, ROW_B_V));
        // The radius sits in row A's fourth channel, but is read through the
        // generic codec: the two access paths must agree on the same texel,
        // and this keeps the slower path exercised.
        let radius = extract_float(&self.texture, self.len, 2, index, 3);
        Light {
            position: row_a.truncate(),
            radius,
            color: row_b.truncate(),
        }
    }
}
