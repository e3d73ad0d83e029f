//! Per-fragment lighting evaluator for a clustered deferred shading
//! pipeline, rewritten in Rust as a CPU reference.
//!
//! The crate decodes a packed two-image geometry buffer, maps each fragment
//! to its light-cluster cell, walks that cell's light list and accumulates a
//! distance-bounded Lambertian contribution per light. Light and cluster data
//! arrive either as plain in-memory tables or packed into float textures the
//! way a GPU pipeline would feed them; both backends sit behind the same
//! store traits so the kernel never knows the difference.
//!
//! Producing the inputs (the geometry pass, the light-to-cluster assignment)
//! is intentionally kept outside of the crate; only the encoders needed to
//! round-trip the packed layouts are provided.

pub mod cluster;
pub mod error;
pub mod frame;
pub mod gbuffer;
pub mod kernel;
pub mod light;
pub mod normal;
pub mod texel;

pub use cluster::{ClusterGrid, ClusterStore, ClusterTable, ClusterTexture};
pub use error::LayoutError;
pub use frame::Frame;
pub use gbuffer::{GeometryBuffers, GeometrySample};
pub use kernel::{FrameInputs, FrameParams, KernelSpec, ShadeKernel, AMBIENT_LIGHT};
pub use light::{falloff, Light, LightStore, LightTable, LightTexture};
pub use normal::{decode_normal, encode_normal};
pub use texel::{extract_float, insert_float, FloatTexture};
