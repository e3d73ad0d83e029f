use std::marker::PhantomData;

use glam::{Vec2, Vec3, Vec4};
use log::debug;
use rayon::prelude::*;

use crate::cluster::{ClusterGrid, ClusterStore};
use crate::error::LayoutError;
use crate::frame::Frame;
use crate::gbuffer::GeometryBuffers;
use crate::light::{falloff, LightStore};

/// Flat ambient term added after light accumulation.
pub const AMBIENT_LIGHT: Vec3 = Vec3::splat(0.025);

/// Below this distance a light coincides with the fragment; its direction is
/// undefined and the light is skipped instead of dividing by zero.
const MIN_LIGHT_DISTANCE: f32 = 1e-6;

/// Parameters baked into a kernel variant. Each configuration tuple is its
/// own implementing type, so changing a count means compiling a new variant
/// rather than branching at shading time.
pub trait KernelSpec {
    const NUM_LIGHTS: usize;
    const X_SLICES: usize;
    const Y_SLICES: usize;
    const Z_SLICES: usize;
    const MAX_LIGHTS_PER_CLUSTER: usize;

    fn grid() -> ClusterGrid {
        ClusterGrid::new(Self::X_SLICES, Self::Y_SLICES, Self::Z_SLICES)
    }
}

/// Per-frame uniforms: everything that changes without recompiling the
/// kernel variant.
#[derive(Debug, Clone, Copy)]
pub struct FrameParams {
    pub view_matrix: glam::Mat4,
    pub screen_width: u32,
    pub screen_height: u32,
    pub near: f32,
    pub far: f32,
}

/// The three immutable images a frame is shaded from. Upstream passes must
/// have finished writing all of them before shading starts; nothing here is
/// mutated for the duration of the frame.
#[derive(Clone, Copy)]
pub struct FrameInputs<'a> {
    pub gbuffer: &'a GeometryBuffers,
    pub lights: &'a dyn LightStore,
    pub clusters: &'a dyn ClusterStore,
}

/// The per-fragment lighting evaluator. Pure: every fragment is shaded
/// independently from the same read-only inputs, so evaluation order never
/// affects the output.
pub struct ShadeKernel<S: KernelSpec> {
    params: FrameParams,
    _spec: PhantomData<fn() -> S>,
}

impl<S: KernelSpec> ShadeKernel<S> {
    pub fn new(params: FrameParams) -> Self {
        Self {
            params,
            _spec: PhantomData,
        }
    }

    pub fn params(&self) -> &FrameParams {
        &self.params
    }

    /// Checks the inputs against the counts baked into the variant. A
    /// mismatch would silently corrupt every decoded value, so it is caught
    /// here, at wiring time, rather than inside the per-fragment path.
    pub fn validate(&self, inputs: &FrameInputs<'_>) -> Result<(), LayoutError> {
        if inputs.lights.len() != S::NUM_LIGHTS {
            return Err(LayoutError::LightCount {
                expected: S::NUM_LIGHTS,
                got: inputs.lights.len(),
            });
        }
        let expected_clusters = S::grid().cluster_count();
        if inputs.clusters.cluster_count() != expected_clusters {
            return Err(LayoutError::ClusterCount {
                expected: expected_clusters,
                got: inputs.clusters.cluster_count(),
            });
        }
        let (width, height) = (
            self.params.screen_width as usize,
            self.params.screen_height as usize,
        );
        if inputs.gbuffer.width() != width || inputs.gbuffer.height() != height {
            return Err(LayoutError::ScreenSize {
                width,
                height,
                got_width: inputs.gbuffer.width(),
                got_height: inputs.gbuffer.height(),
            });
        }
        Ok(())
    }

    /// Shades one fragment. `frag_coord` is in pixels, at the pixel center
    /// for rasterized fragments.
    pub fn shade_fragment(&self, frag_coord: Vec2, inputs: &FrameInputs<'_>) -> Vec4 {
        let uv = frag_coord
            / Vec2::new(
                self.params.screen_width as f32,
                self.params.screen_height as f32,
            );
        let surface = inputs.gbuffer.sample(uv);
        let normal = surface.normal();

        // Cluster lookup wants forward-positive view depth; lighting itself
        // stays in the space the geometry pass wrote positions in.
        let view_pos = self.params.view_matrix * surface.position.extend(1.0);
        let view_z = -view_pos.z;
        let cluster = S::grid().cluster_of(
            frag_coord,
            view_z,
            self.params.screen_width,
            self.params.screen_height,
            self.params.near,
            self.params.far,
        );

        let count = inputs
            .clusters
            .light_count(cluster)
            .min(S::MAX_LIGHTS_PER_CLUSTER)
            .min(S::NUM_LIGHTS);

        let mut color = Vec3::ZERO;
        for slot in 0..count {
            let light = inputs.lights.unpack(inputs.clusters.light_index(cluster, slot));
            let distance = light.position.distance(surface.position);
            if distance < MIN_LIGHT_DISTANCE {
                continue;
            }
            let direction = (light.position - surface.position) / distance;
            let lambert = direction.dot(normal).max(0.0);
            let intensity = falloff(distance, light.radius);
            color += surface.albedo * lambert * light.color * intensity;
        }
        color += surface.albedo * AMBIENT_LIGHT;

        color.extend(1.0)
    }

    /// Shades the whole frame, rows in parallel. Safe because fragments
    /// share nothing but the read-only inputs.
    pub fn shade_frame(&self, inputs: &FrameInputs<'_>) -> Frame {
        let width = self.params.screen_width;
        let height = self.params.screen_height;
        debug!(
            "shading {width}x{height} frame, {} lights across {} clusters",
            inputs.lights.len(),
            inputs.clusters.cluster_count()
        );
        let pixels: Vec<[f32; 4]> = (0..height)
            .into_par_iter()
            .flat_map_iter(|y| {
                (0..width).map(move |x| {
                    let frag_coord = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                    self.shade_fragment(frag_coord, inputs).to_array()
                })
            })
            .collect();
        Frame::from_pixels(width, height, pixels)
    }
}
