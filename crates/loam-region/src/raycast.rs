//! Voxel traversal using the DDA (Amanatides & Woo) algorithm, and the
//! region queries and edits built on it.

use glam::{IVec3, Vec3};

use loam_voxel::{VoxelCode, chunk_coord_of};

use crate::region::RegionStore;

/// Walks the voxel grid from `origin` along `dir`.
///
/// Returns the voxel containing `origin` followed by up to `max_steps` further
/// voxels in traversal order. When two axes reach a boundary at the same
/// parametric distance the lower axis (x, then y, then z) steps first. A zero
/// direction yields only the origin voxel.
pub fn raycast(origin: Vec3, dir: Vec3, max_steps: usize) -> Vec<IVec3> {
    let mut voxel = origin.floor().as_ivec3();
    let mut path = Vec::with_capacity(max_steps + 1);
    path.push(voxel);

    let step = IVec3::new(step_of(dir.x), step_of(dir.y), step_of(dir.z));
    let t_delta = Vec3::new(safe_inv(dir.x.abs()), safe_inv(dir.y.abs()), safe_inv(dir.z.abs()));
    let sub = origin - voxel.as_vec3();
    let mut t_max = Vec3::new(
        initial_t_max(sub.x, dir.x, t_delta.x),
        initial_t_max(sub.y, dir.y, t_delta.y),
        initial_t_max(sub.z, dir.z, t_delta.z),
    );

    for _ in 0..max_steps {
        let axis = if t_max.x <= t_max.y && t_max.x <= t_max.z {
            0
        } else if t_max.y <= t_max.z {
            1
        } else {
            2
        };
        if step[axis] == 0 {
            break;
        }
        voxel[axis] += step[axis];
        t_max[axis] += t_delta[axis];
        path.push(voxel);
    }
    path
}

fn step_of(component: f32) -> i32 {
    if component > 0.0 {
        1
    } else if component < 0.0 {
        -1
    } else {
        0
    }
}

/// Safely compute 1.0 / x, returning infinity when x ≈ 0.
fn safe_inv(x: f32) -> f32 {
    if x.abs() < f32::EPSILON {
        f32::INFINITY
    } else {
        1.0 / x
    }
}

/// Parametric distance to the first voxel boundary on one axis.
fn initial_t_max(sub: f32, dir_component: f32, t_delta: f32) -> f32 {
    if dir_component > 0.0 {
        (1.0 - sub) * t_delta
    } else if dir_component < 0.0 {
        sub * t_delta
    } else {
        f32::INFINITY
    }
}

impl RegionStore {
    /// Returns the first voxel along the ray matching `kind`.
    ///
    /// Stops with `None` at the first voxel matching `obstruction`, or as soon
    /// as the ray enters a missing or tombstoned chunk.
    pub fn get_first_of_kind_without_obstruction<K, O>(
        &self,
        pos: Vec3,
        dir: Vec3,
        max_steps: usize,
        kind: K,
        obstruction: O,
    ) -> Option<IVec3>
    where
        K: Fn(VoxelCode) -> bool,
        O: Fn(VoxelCode) -> bool,
    {
        for cell in raycast(pos, dir, max_steps) {
            let voxel = self.get_voxel(cell)?;
            if kind(voxel) {
                return Some(cell);
            }
            if obstruction(voxel) {
                return None;
            }
        }
        None
    }

    /// Returns the traversed path up to and including the first voxel matching
    /// `kind`. `None` if nothing matches or the ray leaves resident chunks.
    pub fn get_until_kind<K>(&self, pos: Vec3, dir: Vec3, max_steps: usize, kind: K) -> Option<Vec<IVec3>>
    where
        K: Fn(VoxelCode) -> bool,
    {
        let mut path = Vec::new();
        for cell in raycast(pos, dir, max_steps) {
            let voxel = self.get_voxel(cell)?;
            path.push(cell);
            if kind(voxel) {
                return Some(path);
            }
        }
        None
    }

    /// Places `voxel` in the cell just before the first non-empty voxel hit.
    ///
    /// The target chunk must have all six neighbors resident and must not be
    /// tombstoned. Returns the edited global coordinate.
    pub fn raycast_place(&mut self, pos: Vec3, dir: Vec3, max_steps: usize, voxel: VoxelCode) -> Option<IVec3> {
        if voxel.is_empty() || voxel.is_sentinel() {
            return None;
        }
        let path = self.get_until_kind(pos, dir, max_steps, |v| !v.is_empty())?;
        let target = *path.iter().rev().nth(1)?;
        let coord = chunk_coord_of(target, self.dims());
        if !self.is_fully_loaded(coord) {
            tracing::warn!("placement rejected: chunk {:?} is not fully loaded", coord);
            return None;
        }
        self.set_voxel(target, voxel).then_some(target)
    }

    /// Clears the first non-empty voxel hit. Returns the edited global coordinate.
    pub fn raycast_remove(&mut self, pos: Vec3, dir: Vec3, max_steps: usize) -> Option<IVec3> {
        let path = self.get_until_kind(pos, dir, max_steps, |v| !v.is_empty())?;
        let hit = *path.last()?;
        self.set_voxel(hit, VoxelCode::Empty).then_some(hit)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{DiffKind, RegionConfig};
    use loam_voxel::{Chunk, ChunkCoord, ChunkDims};

    const DIMS: ChunkDims = ChunkDims::cubic(4);

    fn region() -> RegionStore {
        RegionStore::new(RegionConfig {
            dims: DIMS,
            max_visible: 64,
            max_resident: 256,
        })
    }

    /// Loads the chunk at the origin and its six neighbors, all air.
    fn loaded_block() -> RegionStore {
        let mut store = region();
        let center = ChunkCoord::new(0, 0, 0);
        store.add_chunk(Chunk::new(center, DIMS));
        for n in center.neighbors() {
            store.add_chunk(Chunk::new(n, DIMS));
        }
        store
    }

    #[test]
    fn test_axis_aligned_ray_visits_consecutive_cells() {
        let path = raycast(Vec3::new(0.5, 0.5, 0.5), Vec3::X, 3);
        assert_eq!(
            path,
            vec![IVec3::new(0, 0, 0), IVec3::new(1, 0, 0), IVec3::new(2, 0, 0), IVec3::new(3, 0, 0)]
        );
        let back = raycast(Vec3::new(0.5, 0.5, 0.5), Vec3::NEG_Y, 2);
        assert_eq!(back, vec![IVec3::ZERO, IVec3::new(0, -1, 0), IVec3::new(0, -2, 0)]);
    }

    #[test]
    fn test_zero_direction_yields_origin_only() {
        assert_eq!(raycast(Vec3::new(-0.5, 2.2, 7.9), Vec3::ZERO, 10), vec![IVec3::new(-1, 2, 7)]);
    }

    #[test]
    fn test_diagonal_tie_steps_lowest_axis_first() {
        let path = raycast(Vec3::new(0.5, 0.5, 0.5), Vec3::new(1.0, 1.0, 0.0), 2);
        assert_eq!(path, vec![IVec3::ZERO, IVec3::new(1, 0, 0), IVec3::new(1, 1, 0)]);
    }

    #[test]
    fn test_path_cells_are_face_adjacent() {
        let path = raycast(Vec3::new(0.3, 1.7, -2.2), Vec3::new(0.4, -0.7, 0.9), 40);
        assert_eq!(path.len(), 41);
        for pair in path.windows(2) {
            let d = (pair[1] - pair[0]).abs();
            assert_eq!(d.x + d.y + d.z, 1);
        }
    }

    #[test]
    fn test_ray_into_unloaded_neighbor_yields_none() {
        let mut store = region();
        store.add_chunk(Chunk::new(ChunkCoord::new(0, 0, 0), DIMS));
        let hit = store.get_first_of_kind_without_obstruction(
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::X,
            5,
            VoxelCode::is_opaque,
            |_| false,
        );
        assert_eq!(hit, None);
        assert_eq!(store.get_until_kind(Vec3::new(0.5, 0.5, 0.5), Vec3::X, 5, |_| false), None);
    }

    #[test]
    fn test_obstruction_stops_the_scan() {
        let mut store = loaded_block();
        store.set_voxel(IVec3::new(2, 0, 0), VoxelCode::Glass);
        store.set_voxel(IVec3::new(3, 0, 0), VoxelCode::Stone);
        let pos = Vec3::new(0.5, 0.5, 0.5);
        assert_eq!(
            store.get_first_of_kind_without_obstruction(pos, Vec3::X, 5, VoxelCode::is_opaque, |_| false),
            Some(IVec3::new(3, 0, 0))
        );
        assert_eq!(
            store.get_first_of_kind_without_obstruction(pos, Vec3::X, 5, VoxelCode::is_opaque, VoxelCode::is_cube),
            None
        );
    }

    #[test]
    fn test_get_until_kind_includes_match() {
        let mut store = loaded_block();
        store.set_voxel(IVec3::new(2, 0, 0), VoxelCode::Dirt);
        let path = store
            .get_until_kind(Vec3::new(0.5, 0.5, 0.5), Vec3::X, 5, |v| !v.is_empty())
            .expect("dirt is within reach");
        assert_eq!(path, vec![IVec3::new(0, 0, 0), IVec3::new(1, 0, 0), IVec3::new(2, 0, 0)]);
    }

    #[test]
    fn test_place_then_remove() {
        let mut store = loaded_block();
        store.set_voxel(IVec3::new(3, 1, 1), VoxelCode::Stone);
        store.consume_diffs(|_, _| {});
        let pos = Vec3::new(0.5, 1.5, 1.5);

        let placed = store.raycast_place(pos, Vec3::X, 6, VoxelCode::Sand);
        assert_eq!(placed, Some(IVec3::new(2, 1, 1)));
        assert_eq!(store.get_voxel(IVec3::new(2, 1, 1)), Some(VoxelCode::Sand));
        assert!(store.is_visible(ChunkCoord::new(0, 0, 0)));

        let removed = store.raycast_remove(pos, Vec3::X, 6);
        assert_eq!(removed, Some(IVec3::new(2, 1, 1)));
        assert_eq!(store.get_voxel(IVec3::new(2, 1, 1)), Some(VoxelCode::Empty));
        assert!(
            store
                .pending_diffs()
                .iter()
                .all(|d| d.kind == DiffKind::Creation && d.coord == ChunkCoord::new(0, 0, 0))
        );
    }

    #[test]
    fn test_place_requires_fully_loaded_chunk() {
        let mut store = region();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0, 0), DIMS);
        chunk.set_voxel(3, 0, 0, VoxelCode::Stone);
        chunk.refresh_empty();
        store.add_chunk(chunk);
        let placed = store.raycast_place(Vec3::new(0.5, 0.5, 0.5), Vec3::X, 5, VoxelCode::Sand);
        assert_eq!(placed, None);
        assert_eq!(store.get_voxel(IVec3::new(2, 0, 0)), Some(VoxelCode::Empty));
    }

    #[test]
    fn test_place_into_origin_cell_is_rejected() {
        let mut store = loaded_block();
        store.set_voxel(IVec3::new(0, 0, 0), VoxelCode::Stone);
        assert_eq!(store.raycast_place(Vec3::new(0.5, 0.5, 0.5), Vec3::X, 5, VoxelCode::Sand), None);
        assert_eq!(store.raycast_place(Vec3::new(0.5, 0.5, 0.5), Vec3::X, 5, VoxelCode::Empty), None);
    }
}
