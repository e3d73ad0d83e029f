use thiserror::Error;

/// Mismatch between a buffer's actual layout and the layout the decoder
/// assumes. The shading kernel itself has no error channel, so every one of
/// these would otherwise degrade into silently corrupted reads; they are
/// checked once when the inputs are wired together.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("texture must have a nonzero width and height")]
    EmptyTexture,

    #[error("light buffer is {got_width}x{got_height}, expected {lights}x2 for {lights} lights")]
    LightBuffer {
        lights: usize,
        got_width: usize,
        got_height: usize,
    },

    #[error(
        "cluster buffer is {got_width}x{got_height}, expected {clusters}x{rows} \
         for {clusters} clusters holding up to {max_lights} lights each"
    )]
    ClusterBuffer {
        clusters: usize,
        max_lights: usize,
        rows: usize,
        got_width: usize,
        got_height: usize,
    },

    #[error("cluster {cluster} lists {listed} lights, but the layout allows at most {max_lights}")]
    ClusterOverflow {
        cluster: usize,
        listed: usize,
        max_lights: usize,
    },

    #[error("geometry buffer layers differ in size: {width0}x{height0} vs {width1}x{height1}")]
    GeometryLayers {
        width0: usize,
        height0: usize,
        width1: usize,
        height1: usize,
    },

    #[error("kernel expects {expected} lights but the light store holds {got}")]
    LightCount { expected: usize, got: usize },

    #[error("kernel expects {expected} clusters but the cluster store holds {got}")]
    ClusterCount { expected: usize, got: usize },

    #[error("kernel shades a {width}x{height} screen but the geometry buffer is {got_width}x{got_height}")]
    ScreenSize {
        width: usize,
        height: usize,
        got_width: usize,
        got_height: usize,
    },
}
