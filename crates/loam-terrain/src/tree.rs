//! Tree features built from trunk, leaf layers, and a leaf cap.

use glam::IVec3;
use loam_voxel::{ColumnCoord, VoxelCode};
use rand::Rng;

use crate::feature::FeatureVoxel;
use crate::seed::tree_rng;

/// Builds the voxels of a tree whose trunk starts at `root`.
///
/// The trunk is `height` voxels of wood. Leaf layers run from `leafless`
/// voxels above the root up to the trunk top: the lower half of those layers
/// spans 5×5, the upper half 3×3. A cross of five leaves caps the trunk.
pub fn build_tree(root: IVec3, height: i32, leafless: i32) -> Vec<FeatureVoxel> {
    let mut voxels = Vec::new();
    let top = root.y + height - 1;

    let layers = (top - (root.y + leafless) + 1).max(0);
    let wide_layers = (layers + 1) / 2;
    for (i, y) in (root.y + leafless..=top).enumerate() {
        let half_width = if (i as i32) < wide_layers { 2 } else { 1 };
        for dz in -half_width..=half_width {
            for dx in -half_width..=half_width {
                if dx == 0 && dz == 0 {
                    continue;
                }
                voxels.push(FeatureVoxel::new(
                    IVec3::new(root.x + dx, y, root.z + dz),
                    VoxelCode::Leaves,
                ));
            }
        }
    }

    for y in root.y..=top {
        voxels.push(FeatureVoxel::new(IVec3::new(root.x, y, root.z), VoxelCode::Wood));
    }

    let cap = root.y + height;
    for (dx, dz) in [(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)] {
        voxels.push(FeatureVoxel::new(
            IVec3::new(root.x + dx, cap, root.z + dz),
            VoxelCode::Leaves,
        ));
    }
    voxels
}

/// Plants a tree at `root`. Height is drawn from `[5, 8]` and the leafless
/// base from `[2, 3]`, seeded by the world seed and root column.
pub fn plant_tree(world_seed: u64, root: IVec3) -> Vec<FeatureVoxel> {
    let mut rng = tree_rng(world_seed, ColumnCoord::new(root.x, root.z));
    let height = rng.random_range(5..=8);
    let leafless = rng.random_range(2..=3);
    build_tree(root, height, leafless)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
