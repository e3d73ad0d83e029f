use glam::{Vec2, Vec3, Vec4};

use crate::error::LayoutError;
use crate::normal::{decode_normal, encode_normal};
use crate::texel::FloatTexture;

/// Per-pixel surface attributes decoded from the geometry buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometrySample {
    /// Surface position in the space lights are expressed in.
    pub position: Vec3,
    pub albedo: Vec3,
    pub encoded_normal: Vec2,
}

impl GeometrySample {
    pub fn normal(&self) -> Vec3 {
        decode_normal(self.encoded_normal)
    }
}

/// The two-image geometry buffer. Position, albedo and the compressed normal
/// are packed across eight channels:
/// layer 0 carries `(position.xyz, albedo.r)`,
/// layer 1 carries `(albedo.gb, encoded_normal.xy)`.
///
/// Both layers must always be addressed at the same coordinates; [`sample`]
/// is the only read path, so the pairing cannot drift.
///
/// [`sample`]: Self::sample
#[derive(Debug, Clone)]
pub struct GeometryBuffers {
    layer0: FloatTexture,
    layer1: FloatTexture,
}

impl GeometryBuffers {
    /// Creates a zero-filled geometry buffer for a `width` x `height` screen.
    pub fn new(width: usize, height: usize) -> Result<Self, LayoutError> {
        Ok(Self {
            layer0: FloatTexture::new(width, height)?,
            layer1: FloatTexture::new(width, height)?,
        })
    }

    /// Adopts two externally rendered layers, which must agree in size.
    pub fn from_layers(layer0: FloatTexture, layer1: FloatTexture) -> Result<Self, LayoutError> {
        if layer0.width() != layer1.width() || layer0.height() != layer1.height() {
            return Err(LayoutError::GeometryLayers {
                width0: layer0.width(),
                height0: layer0.height(),
                width1: layer1.width(),
                height1: layer1.height(),
            });
        }
        Ok(Self { layer0, layer1 })
    }

    pub fn width(&self) -> usize {
        self.layer0.width()
    }

    pub fn height(&self) -> usize {
        self.layer0.height()
    }

    /// Decodes the surface attributes at normalized coordinates `uv`.
    pub fn sample(&self, uv: Vec2) -> GeometrySample {
        let gb0 = self.layer0.sample(uv);
        let gb1 = self.layer1.sample(uv);
        GeometrySample {
            position: gb0.truncate(),
            albedo: Vec3::new(gb0.w, gb1.x, gb1.y),
            encoded_normal: Vec2::new(gb1.z, gb1.w),
        }
    }

    /// Writes one pixel the way the geometry pass would, compressing the
    /// normal on the way in.
    pub fn write_pixel(&mut self, x: usize, y: usize, position: Vec3, albedo: Vec3, normal: Vec3) {
        let encoded = encode_normal(normal.normalize());
        self.layer0.set_texel(x, y, position.extend(albedo.x));
        self.layer1
            .set_texel(x, y, Vec4::new(albedo.y, albedo.z, encoded.x, encoded.y));
    }
}
