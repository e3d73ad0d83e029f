use glam::{Mat4, Vec2, Vec3, Vec4};
use once_cell::sync::Lazy;

use cluster_shade::{
    ClusterTable, ClusterTexture, FrameInputs, FrameParams, GeometryBuffers, KernelSpec, Light,
    LightTable, LightTexture, ShadeKernel, AMBIENT_LIGHT,
};

/// Single-cluster variant used by the scenario tests.
struct OneClusterSpec;

impl KernelSpec for OneClusterSpec {
    const NUM_LIGHTS: usize = 1;
    const X_SLICES: usize = 1;
    const Y_SLICES: usize = 1;
    const Z_SLICES: usize = 1;
    const MAX_LIGHTS_PER_CLUSTER: usize = 4;
}

const SCREEN: u32 = 4;

fn params() -> FrameParams {
    FrameParams {
        view_matrix: Mat4::IDENTITY,
        screen_width: SCREEN,
        screen_height: SCREEN,
        near: 0.1,
        far: 60.0,
    }
}

/// Every pixel sits at the same point so any fragment probes the same setup.
fn uniform_gbuffer(position: Vec3, albedo: Vec3, normal: Vec3) -> GeometryBuffers {
    let mut gbuffer = GeometryBuffers::new(SCREEN as usize, SCREEN as usize).unwrap();
    for y in 0..SCREEN as usize {
        for x in 0..SCREEN as usize {
            gbuffer.write_pixel(x, y, position, albedo, normal);
        }
    }
    gbuffer
}

fn shade_center(
    gbuffer: &GeometryBuffers,
    lights: &[Light],
    lists: &[Vec<u32>],
) -> Vec4 {
    let lights = LightTexture::from_lights(lights).unwrap();
    let clusters =
        ClusterTexture::from_lists(lists, OneClusterSpec::MAX_LIGHTS_PER_CLUSTER).unwrap();
    let kernel = ShadeKernel::<OneClusterSpec>::new(params());
    let inputs = FrameInputs {
        gbuffer,
        lights: &lights,
        clusters: &clusters,
    };
    kernel.validate(&inputs).unwrap();
    kernel.shade_fragment(Vec2::new(2.0, 2.0), &inputs)
}

#[test]
fn overhead_light_saturates_to_full_color_plus_ambient() {
    let surface = Vec3::new(0.0, 0.0, -10.0);
    let gbuffer = uniform_gbuffer(surface, Vec3::ONE, Vec3::Y);
    // Directly overhead and nearly touching: lambert is 1 and the falloff is
    // effectively 1, so the light contributes its full color.
    let lights = [Light {
        position: surface + Vec3::Y * 1e-3,
        radius: 10.0,
        color: Vec3::ONE,
    }];
    let color = shade_center(&gbuffer, &lights, &[vec![0]]);
    let expected = Vec3::ONE + AMBIENT_LIGHT;
    assert!(
        (color.truncate() - expected).length() < 1e-2,
        "got {color:?}"
    );
    assert_eq!(color.w, 1.0);
}

#[test]
fn empty_cluster_leaves_only_the_ambient_term() {
    let albedo = Vec3::new(0.5, 0.25, 1.0);
    let gbuffer = uniform_gbuffer(Vec3::new(0.0, 0.0, -10.0), albedo, Vec3::Y);
    let lights = [Light {
        position: Vec3::new(50.0, 50.0, 50.0),
        radius: 1.0,
        color: Vec3::ONE,
    }];
    let color = shade_center(&gbuffer, &lights, &[vec![]]);
    assert_eq!(color, (albedo * AMBIENT_LIGHT).extend(1.0));
}

#[test]
fn light_at_exact_radius_contributes_nothing() {
    let surface = Vec3::new(0.0, 0.0, -10.0);
    let albedo = Vec3::new(0.9, 0.9, 0.9);
    let gbuffer = uniform_gbuffer(surface, albedo, Vec3::Y);
    // Distance to the surface is exactly the radius; the falloff must cut
    // the contribution to zero no matter how bright the light is.
    let lights = [Light {
        position: surface + Vec3::Y * 5.0,
        radius: 5.0,
        color: Vec3::new(100.0, 100.0, 100.0),
    }];
    let listed = shade_center(&gbuffer, &lights, &[vec![0]]);
    let unlisted = shade_center(&gbuffer, &lights, &[vec![]]);
    assert_eq!(listed, unlisted);
    assert_eq!(listed, (albedo * AMBIENT_LIGHT).extend(1.0));
}

/// Multi-cluster variant for the backend comparison.
struct GridSpec;

impl KernelSpec for GridSpec {
    const NUM_LIGHTS: usize = 3;
    const X_SLICES: usize = 2;
    const Y_SLICES: usize = 2;
    const Z_SLICES: usize = 2;
    const MAX_LIGHTS_PER_CLUSTER: usize = 4;
}

static GRID_LIGHTS: Lazy<Vec<Light>> = Lazy::new(|| {
    vec![
        Light {
            position: Vec3::new(-2.0, 1.0, -8.0),
            radius: 12.0,
            color: Vec3::new(1.0, 0.2, 0.2),
        },
        Light {
            position: Vec3::new(3.0, -1.0, -15.0),
            radius: 9.0,
            color: Vec3::new(0.2, 1.0, 0.2),
        },
        Light {
            position: Vec3::new(0.0, 4.0, -20.0),
            radius: 15.0,
            color: Vec3::new(0.3, 0.3, 1.0),
        },
    ]
});

static GRID_LISTS: Lazy<Vec<Vec<u32>>> = Lazy::new(|| {
    vec![
        vec![0],
        vec![0, 1],
        vec![],
        vec![1],
        vec![2],
        vec![0, 1, 2],
        vec![2, 0],
        vec![1, 2],
    ]
});

fn varied_gbuffer() -> GeometryBuffers {
    let mut gbuffer = GeometryBuffers::new(SCREEN as usize, SCREEN as usize).unwrap();
    for y in 0..SCREEN as usize {
        for x in 0..SCREEN as usize {
            let position = Vec3::new(x as f32 - 2.0, y as f32 - 2.0, -4.0 * (1 + x + y) as f32);
            let albedo = Vec3::new(0.2 + 0.1 * x as f32, 0.8 - 0.1 * y as f32, 0.5);
            let normal = Vec3::new(0.3, 0.5, 1.0).normalize();
            gbuffer.write_pixel(x, y, position, albedo, normal);
        }
    }
    gbuffer
}

#[test]
fn texture_and_table_backends_shade_identically() {
    let gbuffer = varied_gbuffer();
    let kernel = ShadeKernel::<GridSpec>::new(params());

    let light_texture = LightTexture::from_lights(&GRID_LIGHTS).unwrap();
    let cluster_texture =
        ClusterTexture::from_lists(&GRID_LISTS, GridSpec::MAX_LIGHTS_PER_CLUSTER).unwrap();
    let texture_inputs = FrameInputs {
        gbuffer: &gbuffer,
        lights: &light_texture,
        clusters: &cluster_texture,
    };
    kernel.validate(&texture_inputs).unwrap();

    let light_table = LightTable::new(GRID_LIGHTS.clone());
    let cluster_table = ClusterTable::new(GRID_LISTS.clone());
    let table_inputs = FrameInputs {
        gbuffer: &gbuffer,
        lights: &light_table,
        clusters: &cluster_table,
    };
    kernel.validate(&table_inputs).unwrap();

    let from_textures = kernel.shade_frame(&texture_inputs);
    let from_tables = kernel.shade_frame(&table_inputs);
    assert_eq!(from_textures.as_raw(), from_tables.as_raw());
}

#[test]
fn shaded_output_stays_finite_and_opaque() {
    let gbuffer = varied_gbuffer();
    let kernel = ShadeKernel::<GridSpec>::new(params());
    let lights = LightTable::new(GRID_LIGHTS.clone());
    let clusters = ClusterTable::new(GRID_LISTS.clone());
    let inputs = FrameInputs {
        gbuffer: &gbuffer,
        lights: &lights,
        clusters: &clusters,
    };
    let frame = kernel.shade_frame(&inputs);
    for y in 0..frame.height() {
        for x in 0..frame.width() {
            let pixel = frame.pixel(x, y);
            assert!(pixel.is_finite(), "pixel ({x}, {y}) is {pixel:?}");
            assert_eq!(pixel.w, 1.0);
        }
    }
}
