use glam::Vec2;

use crate::error::LayoutError;
use crate::texel::{extract_float, insert_float, FloatTexture};

/// Axis-aligned subdivision of the view frustum into `x * y * z` cells.
/// Screen space is sliced uniformly in x and y, view depth uniformly between
/// the near and far planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterGrid {
    pub x_slices: usize,
    pub y_slices: usize,
    pub z_slices: usize,
}

impl ClusterGrid {
    pub const fn new(x_slices: usize, y_slices: usize, z_slices: usize) -> Self {
        Self {
            x_slices,
            y_slices,
            z_slices,
        }
    }

    pub const fn cluster_count(&self) -> usize {
        self.x_slices * self.y_slices * self.z_slices
    }

    /// Linearizes a cell address, x fastest, z slowest.
    pub const fn linear_index(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.x_slices + z * self.x_slices * self.y_slices
    }

    /// Cell holding a fragment at screen position `frag_coord` with
    /// forward-positive view depth `view_z`.
    ///
    /// Cells are clamped to the grid, so fragments outside the screen rect or
    /// the `[near, far)` depth range land in the nearest edge cell instead of
    /// addressing past the cluster buffer.
    pub fn cell_of(
        &self,
        frag_coord: Vec2,
        view_z: f32,
        screen_width: u32,
        screen_height: u32,
        near: f32,
        far: f32,
    ) -> (usize, usize, usize) {
        let x_stride = screen_width as f32 / self.x_slices as f32;
        let y_stride = screen_height as f32 / self.y_slices as f32;
        let z_stride = (far - near) / self.z_slices as f32;
        let clamp_slice = |value: f32, slices: usize| -> usize {
            value.floor().clamp(0.0, (slices - 1) as f32) as usize
        };
        (
            clamp_slice(frag_coord.x / x_stride, self.x_slices),
            clamp_slice(frag_coord.y / y_stride, self.y_slices),
            clamp_slice((view_z - near) / z_stride, self.z_slices),
        )
    }

    /// [`cell_of`](Self::cell_of) followed by [`linear_index`](Self::linear_index).
    pub fn cluster_of(
        &self,
        frag_coord: Vec2,
        view_z: f32,
        screen_width: u32,
        screen_height: u32,
        near: f32,
        far: f32,
    ) -> usize {
        let (x, y, z) = self.cell_of(frag_coord, view_z, screen_width, screen_height, near, far);
        self.linear_index(x, y, z)
    }
}

/// Rows a packed cluster image needs for a count plus up to `max_lights`
/// indices, four scalars per row.
pub const fn list_rows(max_lights: usize) -> usize {
    (max_lights + 1 + 3) / 4
}

/// Per-cluster light lists as the kernel consumes them: a count and an
/// indexable list of light indices, both bounded by the layout's
/// `max_lights` at decode time.
pub trait ClusterStore: Sync {
    fn cluster_count(&self) -> usize;

    /// Number of lights listed for `cluster`, never above the layout bound.
    fn light_count(&self, cluster: usize) -> usize;

    /// `slot`-th light index of `cluster`. `slot` must be below
    /// [`light_count`](Self::light_count).
    fn light_index(&self, cluster: usize, slot: usize) -> usize;
}

/// Native backend: one index list per cluster, resident in memory.
#[derive(Debug, Clone, Default)]
pub struct ClusterTable {
    lists: Vec<Vec<u32>>,
}

impl ClusterTable {
    pub fn new(lists: Vec<Vec<u32>>) -> Self {
        Self { lists }
    }
}

impl ClusterStore for ClusterTable {
    fn cluster_count(&self) -> usize {
        self.lists.len()
    }

    fn light_count(&self, cluster: usize) -> usize {
        self.lists[cluster].len()
    }

    fn light_index(&self, cluster: usize, slot: usize) -> usize {
        self.lists[cluster][slot] as usize
    }
}

/// Texture backend: one column per cluster; scalar 0 is the light count,
/// scalars `1..=count` are light indices, all read through the float codec.
#[derive(Debug, Clone)]
pub struct ClusterTexture {
    texture: FloatTexture,
    clusters: usize,
    max_lights: usize,
    rows: usize,
}

impl ClusterTexture {
    /// Wraps an externally produced cluster image, checking that its
    /// dimensions match the layout the decoder assumes.
    pub fn from_texture(
        texture: FloatTexture,
        clusters: usize,
        max_lights: usize,
    ) -> Result<Self, LayoutError> {
        let rows = list_rows(max_lights);
        if texture.width() != clusters || texture.height() != rows {
            return Err(LayoutError::ClusterBuffer {
                clusters,
                max_lights,
                rows,
                got_width: texture.width(),
                got_height: texture.height(),
            });
        }
        Ok(Self {
            texture,
            clusters,
            max_lights,
            rows,
        })
    }

    /// Encodes per-cluster index lists into the packed layout. Fails if any
    /// list exceeds `max_lights`.
    pub fn from_lists(lists: &[Vec<u32>], max_lights: usize) -> Result<Self, LayoutError> {
        let clusters = lists.len();
        let rows = list_rows(max_lights);
        let mut texture = FloatTexture::new(clusters, rows)?;
        for (cluster, list) in lists.iter().enumerate() {
            if list.len() > max_lights {
                return Err(LayoutError::ClusterOverflow {
                    cluster,
                    listed: list.len(),
                    max_lights,
                });
            }
            insert_float(&mut texture, clusters, rows, cluster, 0, list.len() as f32);
            for (slot, light) in list.iter().enumerate() {
                insert_float(&mut texture, clusters, rows, cluster, slot + 1, *light as f32);
            }
        }
        Self::from_texture(texture, clusters, max_lights)
    }

    pub fn texture(&self) -> &FloatTexture {
        &self.texture
    }
}

impl ClusterStore for ClusterTexture {
    fn cluster_count(&self) -> usize {
        self.clusters
    }

    fn light_count(&self, cluster: usize) -> usize {
        let count = extract_float(&self.texture, self.clusters, self.rows, cluster, 0);
        // Clamp keeps the kernel's light loop bounded even against a
        // producer that wrote a bogus count.
        (count.round().max(0.0) as usize).min(self.max_lights)
    }

    fn light_index(&self, cluster: usize, slot: usize) -> usize {
        let index = extract_float(&self.texture, self.clusters, self.rows, cluster, slot + 1);
        index.round().max(0.0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_index_matches_the_grid_layout() {
        let grid = ClusterGrid::new(4, 4, 4);
        assert_eq!(grid.linear_index(2, 1, 3), 54);
        assert_eq!(grid.cluster_count(), 64);
    }

    #[test]
    fn interior_point_maps_to_its_cell() {
        let grid = ClusterGrid::new(4, 4, 4);
        // 800x600 screen, depth 1..101: cell (2, 1, 3) spans
        // x in [400, 600), y in [150, 300), z in [76, 101).
        let cluster = grid.cluster_of(Vec2::new(450.0, 200.0), 80.0, 800, 600, 1.0, 101.0);
        assert_eq!(cluster, 54);
    }

    #[test]
    fn out_of_range_fragments_clamp_to_edge_cells() {
        let grid = ClusterGrid::new(4, 4, 4);
        let near = grid.cluster_of(Vec2::new(-10.0, -10.0), -5.0, 800, 600, 1.0, 101.0);
        assert_eq!(near, 0);
        let far = grid.cluster_of(Vec2::new(9000.0, 9000.0), 1e6, 800, 600, 1.0, 101.0);
        assert_eq!(far, grid.cluster_count() - 1);
    }

    #[test]
    fn list_rows_covers_count_plus_indices() {
        assert_eq!(list_rows(3), 1);
        assert_eq!(list_rows(4), 2);
        assert_eq!(list_rows(100), 26);
    }

    #[test]
    fn texture_backend_round_trips_lists() {
        let lists = vec![vec![], vec![5], vec![0, 2, 9, 4, 7]];
        let store = ClusterTexture::from_lists(&lists, 6).unwrap();
        assert_eq!(store.cluster_count(), 3);
        for (cluster, list) in lists.iter().enumerate() {
            assert_eq!(store.light_count(cluster), list.len());
            for (slot, light) in list.iter().enumerate() {
                assert_eq!(store.light_index(cluster, slot), *light as usize);
            }
        }
    }

    #[test]
    fn overlong_lists_are_rejected_at_encode_time() {
        let lists = vec![vec![1, 2, 3]];
        let err = ClusterTexture::from_lists(&lists, 2).unwrap_err();
        assert_eq!(
            err,
            LayoutError::ClusterOverflow {
                cluster: 0,
                listed: 3,
                max_lights: 2,
            }
        );
    }

    #[test]
    fn wrapping_a_mismatched_texture_fails() {
        let texture = FloatTexture::new(8, 1).unwrap();
        assert!(ClusterTexture::from_texture(texture, 8, 8).is_err());
    }
}
