use std::env;
use std::fs;

use anyhow::{anyhow, Context, Result};
use glam::{Mat4, Vec2, Vec3};
use log::info;
use serde::{Deserialize, Serialize};

use cluster_shade::{
    ClusterGrid, ClusterTexture, FrameInputs, FrameParams, GeometryBuffers, KernelSpec, Light,
    LightTexture, ShadeKernel,
};

/// Configuration this binary is compiled for. Changing any of these counts
/// means building a new kernel variant.
struct DemoSpec;

impl KernelSpec for DemoSpec {
    const NUM_LIGHTS: usize = 12;
    const X_SLICES: usize = 8;
    const Y_SLICES: usize = 8;
    const Z_SLICES: usize = 8;
    const MAX_LIGHTS_PER_CLUSTER: usize = 32;
}

const SCREEN_WIDTH: u32 = 800;
const SCREEN_HEIGHT: u32 = 600;
const NEAR: f32 = 0.1;
const FAR: f32 = 60.0;
const FOV_Y_DEGREES: f32 = 60.0;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let scene = match &options.scene {
        Some(path) => {
            let json =
                fs::read_to_string(path).with_context(|| format!("failed to read scene {path}"))?;
            let scene: DemoScene =
                serde_json::from_str(&json).with_context(|| format!("invalid scene {path}"))?;
            if scene.lights.len() != DemoSpec::NUM_LIGHTS {
                return Err(anyhow!(
                    "scene holds {} lights but this binary is compiled for {}",
                    scene.lights.len(),
                    DemoSpec::NUM_LIGHTS
                ));
            }
            scene
        }
        None => DemoScene::default(),
    };

    println!(
        "Shading {SCREEN_WIDTH}x{SCREEN_HEIGHT} frame with {} lights in a {}x{}x{} cluster grid",
        scene.lights.len(),
        DemoSpec::X_SLICES,
        DemoSpec::Y_SLICES,
        DemoSpec::Z_SLICES,
    );

    let gbuffer = synthesize_gbuffer();
    let lights = LightTexture::from_lights(&scene.lights).context("failed to pack lights")?;
    let lists = assign_lights_to_clusters(&scene.lights, DemoSpec::grid());
    let clusters = ClusterTexture::from_lists(&lists, DemoSpec::MAX_LIGHTS_PER_CLUSTER)
        .context("failed to pack cluster lists")?;
    let listed: usize = lists.iter().map(Vec::len).sum();
    println!(
        "Assigned {} light references across {} clusters",
        listed,
        lists.len()
    );

    let kernel = ShadeKernel::<DemoSpec>::new(FrameParams {
        view_matrix: Mat4::IDENTITY,
        screen_width: SCREEN_WIDTH,
        screen_height: SCREEN_HEIGHT,
        near: NEAR,
        far: FAR,
    });
    let inputs = FrameInputs {
        gbuffer: &gbuffer,
        lights: &lights,
        clusters: &clusters,
    };
    kernel
        .validate(&inputs)
        .context("frame inputs do not match the compiled kernel variant")?;

    let frame = kernel.shade_frame(&inputs);
    let mean = frame.as_raw().iter().sum::<f32>() / frame.as_raw().len() as f32;
    info!("mean output channel value {mean:.4}");

    let png = image::RgbaImage::from_raw(frame.width(), frame.height(), frame.to_rgba8())
        .ok_or_else(|| anyhow!("frame size does not match its pixel data"))?;
    png.save(&options.output)
        .with_context(|| format!("failed to write {}", options.output))?;
    println!("Wrote {}", options.output);
    Ok(())
}

/// Scene description consumed from JSON, or synthesized by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DemoScene {
    lights: Vec<Light>,
}

impl Default for DemoScene {
    /// A ring of colored lights hovering over the floor.
    fn default() -> Self {
        let lights = (0..DemoSpec::NUM_LIGHTS)
            .map(|i| {
                let angle = i as f32 / DemoSpec::NUM_LIGHTS as f32 * std::f32::consts::TAU;
                let hue = i as f32 / DemoSpec::NUM_LIGHTS as f32;
                Light {
                    position: Vec3::new(angle.cos() * 8.0, 1.0, -14.0 + angle.sin() * 8.0),
                    radius: 9.0,
                    color: Vec3::new(
                        (hue * std::f32::consts::TAU).cos() * 0.5 + 0.5,
                        ((hue + 1.0 / 3.0) * std::f32::consts::TAU).cos() * 0.5 + 0.5,
                        ((hue + 2.0 / 3.0) * std::f32::consts::TAU).cos() * 0.5 + 0.5,
                    ),
                }
            })
            .collect();
        Self { lights }
    }
}

/// Renders a stand-in geometry pass: a checkered floor with a back wall,
/// viewed from the origin down -Z.
fn synthesize_gbuffer() -> GeometryBuffers {
    let width = SCREEN_WIDTH as usize;
    let height = SCREEN_HEIGHT as usize;
    let mut gbuffer = GeometryBuffers::new(width, height).expect("screen size is nonzero");

    let tan_half_fov = (FOV_Y_DEGREES.to_radians() * 0.5).tan();
    let aspect = SCREEN_WIDTH as f32 / SCREEN_HEIGHT as f32;
    const FLOOR_Y: f32 = -2.0;
    const WALL_Z: f32 = -28.0;

    for y in 0..height {
        for x in 0..width {
            let ndc = Vec2::new(
                (x as f32 + 0.5) / SCREEN_WIDTH as f32 * 2.0 - 1.0,
                1.0 - (y as f32 + 0.5) / SCREEN_HEIGHT as f32 * 2.0,
            );
            let ray = Vec3::new(ndc.x * tan_half_fov * aspect, ndc.y * tan_half_fov, -1.0)
                .normalize();

            let floor_t = if ray.y < 0.0 {
                FLOOR_Y / ray.y
            } else {
                f32::INFINITY
            };
            let wall_t = WALL_Z / ray.z;
            let (t, normal) = if floor_t < wall_t {
                (floor_t, Vec3::Y)
            } else {
                (wall_t, Vec3::Z)
            };
            let position = ray * t;
            let checker = ((position.x.floor() + position.z.floor()) as i64).rem_euclid(2);
            let albedo = if checker == 0 {
                Vec3::new(0.8, 0.8, 0.75)
            } else {
                Vec3::new(0.35, 0.35, 0.4)
            };
            gbuffer.write_pixel(x, y, position, albedo, normal);
        }
    }
    gbuffer
}

/// Fixture-quality light assignment: a light lands in every cluster whose
/// conservative view-space bounding box its sphere touches. Stands in for
/// the real clustering pass, which lives upstream of this crate.
fn assign_lights_to_clusters(lights: &[Light], grid: ClusterGrid) -> Vec<Vec<u32>> {
    let tan_half_fov = (FOV_Y_DEGREES.to_radians() * 0.5).tan();
    let aspect = SCREEN_WIDTH as f32 / SCREEN_HEIGHT as f32;
    let z_stride = (FAR - NEAR) / grid.z_slices as f32;

    let mut lists = vec![Vec::new(); grid.cluster_count()];
    for zc in 0..grid.z_slices {
        let z_min = NEAR + zc as f32 * z_stride;
        let z_max = z_min + z_stride;
        // Frustum cells widen with depth; bound the cell at its far plane.
        let half_height = z_max * tan_half_fov;
        let half_width = half_height * aspect;
        let cell_height = 2.0 * half_height / grid.y_slices as f32;
        let cell_width = 2.0 * half_width / grid.x_slices as f32;
        for yc in 0..grid.y_slices {
            // Screen rows run top-down, so slice 0 is the top of the frustum.
            let y_max = half_height - yc as f32 * cell_height;
            let y_min = y_max - cell_height;
            for xc in 0..grid.x_slices {
                let x_min = -half_width + xc as f32 * cell_width;
                let x_max = x_min + cell_width;
                let cluster = grid.linear_index(xc, yc, zc);
                for (index, light) in lights.iter().enumerate() {
                    // Light positions use -Z forward; the grid depth axis is
                    // forward-positive.
                    let center = Vec3::new(light.position.x, light.position.y, -light.position.z);
                    let closest = Vec3::new(
                        center.x.clamp(x_min, x_max),
                        center.y.clamp(y_min, y_max),
                        center.z.clamp(z_min, z_max),
                    );
                    if center.distance_squared(closest) <= light.radius * light.radius {
                        lists[cluster].push(index as u32);
                    }
                }
                lists[cluster].truncate(DemoSpec::MAX_LIGHTS_PER_CLUSTER);
            }
        }
    }
    lists
}

struct CliOptions {
    output: String,
    scene: Option<String>,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(output) = args.next() else {
            return Err(anyhow!(
                "Usage: cluster-shade <output.png> [--scene <scene.json>]"
            ));
        };
        let mut scene = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--scene" => {
                    scene = Some(
                        args.next()
                            .ok_or_else(|| anyhow!("--scene expects a path"))?,
                    );
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --scene <path>"
                    ));
                }
            }
        }
        Ok(Self { output, scene })
    }
}
