//! Per-chunk mesh generation.
//!
//! Every non-empty voxel looks at its six face-adjacent codes, reading across
//! the chunk boundary through [`Neighbors`], and contributes geometry by class:
//!
//! - water emits its top face only, lowered by `water_delta` unless more
//!   water sits on top;
//! - decorative voxels emit two crossed double-sided quads, nudged in x/z by a
//!   jitter hashed from the global coordinate;
//! - cubes emit one quad per exposed face. Opaque cubes hide faces against
//!   opaque neighbors; other cubes show every face.

use glam::IVec3;
use loam_voxel::mix::mix_values;
use loam_voxel::{Chunk, ChunkCoord, VoxelCode, global_of};

use crate::face_direction::FaceDirection;
use crate::texture::texture_layer;
use crate::vertex::{FreeVertex, MAX_PACKED_COORD, PackedVertex};

/// Face-adjacent chunks in [`FaceDirection`] order. Missing neighbors read as air.
pub type Neighbors<'a> = [Option<&'a Chunk>; 6];

/// Two triangles per quad: `0,1,2` and `0,2,3`.
const QUAD_ORDER: [usize; 6] = [0, 1, 2, 0, 2, 3];
/// Back side of a double-sided quad.
const QUAD_ORDER_BACK: [usize; 6] = [0, 2, 1, 0, 3, 2];
const UV_CORNERS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Tunables for mesh generation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshParams {
    /// How far a water surface sits below the top of its voxel.
    pub water_delta: f32,
    /// Maximum x/z displacement of a billboard, in voxels.
    pub billboard_jitter: f32,
}

impl Default for MeshParams {
    fn default() -> Self {
        Self {
            water_delta: 0.06,
            billboard_jitter: 0.15,
        }
    }
}

/// The three vertex buffers of one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMeshes {
    /// Chunk these buffers belong to.
    pub coord: ChunkCoord,
    /// Cube faces.
    pub cubes: Vec<PackedVertex>,
    /// Billboards.
    pub irregular: Vec<FreeVertex>,
    /// Water surfaces.
    pub water: Vec<FreeVertex>,
}

impl ChunkMeshes {
    /// Creates empty buffers for `coord`.
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            ..Self::default()
        }
    }

    /// Total vertex count across all buffers.
    pub fn vertex_count(&self) -> usize {
        self.cubes.len() + self.irregular.len() + self.water.len()
    }

    /// Returns `true` if no buffer holds a vertex.
    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0
    }
}

/// Builds the meshes of `chunk`.
pub fn build_chunk_mesh(chunk: &Chunk, neighbors: &Neighbors<'_>, params: &MeshParams) -> ChunkMeshes {
    let dims = chunk.dims();
    let mut meshes = ChunkMeshes::new(chunk.coord());
    if chunk.is_empty() {
        return meshes;
    }
    debug_assert!(
        [dims.x, dims.y, dims.z].iter().all(|&d| d as u32 <= MAX_PACKED_COORD),
        "chunk dims {dims:?} exceed packed vertex range"
    );

    for z in 0..dims.z {
        for y in 0..dims.y {
            for x in 0..dims.x {
                let voxel = chunk.get_index(dims.index(x, y, z));
                if voxel.is_empty() {
                    continue;
                }
                let adjacent = FaceDirection::ALL.map(|face| adjacent_voxel(chunk, neighbors, x, y, z, face));
                if voxel.is_water() {
                    push_water(&mut meshes.water, [x, y, z], adjacent, params.water_delta);
                } else if voxel.is_non_cube() {
                    let global = global_of(chunk.coord(), IVec3::new(x as i32, y as i32, z as i32), dims);
                    push_billboard(&mut meshes.irregular, [x, y, z], voxel, jitter(global, params.billboard_jitter));
                } else if voxel.is_cube() {
                    push_cube(&mut meshes.cubes, [x, y, z], voxel, adjacent);
                }
            }
        }
    }
    meshes
}

/// Reads the code across `face`, stepping into the neighbor chunk when needed.
fn adjacent_voxel(chunk: &Chunk, neighbors: &Neighbors<'_>, x: usize, y: usize, z: usize, face: FaceDirection) -> VoxelCode {
    let dims = chunk.dims();
    let (nx, ny, nz) = face.offset(x as i32, y as i32, z as i32);
    if dims.contains(nx, ny, nz) {
        return chunk.get_index(dims.index(nx as usize, ny as usize, nz as usize));
    }
    let size = dims.as_ivec3();
    match neighbors[face.index()] {
        Some(neighbor) => neighbor.get_voxel(
            nx.rem_euclid(size.x) as usize,
            ny.rem_euclid(size.y) as usize,
            nz.rem_euclid(size.z) as usize,
        ),
        None => VoxelCode::Empty,
    }
}

fn push_cube(out: &mut Vec<PackedVertex>, pos: [usize; 3], voxel: VoxelCode, adjacent: [VoxelCode; 6]) {
    for face in FaceDirection::ALL {
        if voxel.is_opaque() && adjacent[face.index()].is_opaque() {
            continue;
        }
        let corners = face.corners();
        let layer = texture_layer(voxel, face);
        for corner in QUAD_ORDER {
            let c = corners[corner];
            out.push(PackedVertex::new(
                [
                    (pos[0] + c[0] as usize) as u32,
                    (pos[1] + c[1] as usize) as u32,
                    (pos[2] + c[2] as usize) as u32,
                ],
                face,
                corner as u32,
                layer,
            ));
        }
    }
}

fn push_water(out: &mut Vec<FreeVertex>, pos: [usize; 3], adjacent: [VoxelCode; 6], water_delta: f32) {
    let height = if adjacent[FaceDirection::PosY.index()].is_water() {
        1.0
    } else {
        1.0 - water_delta
    };
    let layer = texture_layer(VoxelCode::Water, FaceDirection::PosY);
    let corners = FaceDirection::PosY.corners();
    for corner in QUAD_ORDER {
        let c = corners[corner];
        out.push(FreeVertex {
            position: [
                pos[0] as f32 + c[0] as f32,
                pos[1] as f32 + height,
                pos[2] as f32 + c[2] as f32,
            ],
            uv: UV_CORNERS[corner],
            layer,
        });
    }
}

fn push_billboard(out: &mut Vec<FreeVertex>, pos: [usize; 3], voxel: VoxelCode, offset: (f32, f32)) {
    let layer = texture_layer(voxel, FaceDirection::PosX);
    let base = [pos[0] as f32 + offset.0, pos[1] as f32, pos[2] as f32 + offset.1];
    // Two vertical quads along the cell diagonals.
    let diagonals = [([0.0, 0.0], [1.0, 1.0]), ([1.0, 0.0], [0.0, 1.0])];
    for (a, b) in diagonals {
        let quad = [
            [base[0] + a[0], base[1], base[2] + a[1]],
            [base[0] + b[0], base[1], base[2] + b[1]],
            [base[0] + b[0], base[1] + 1.0, base[2] + b[1]],
            [base[0] + a[0], base[1] + 1.0, base[2] + a[1]],
        ];
        for order in [QUAD_ORDER, QUAD_ORDER_BACK] {
            for corner in order {
                out.push(FreeVertex {
                    position: quad[corner],
                    uv: UV_CORNERS[corner],
                    layer,
                });
            }
        }
    }
}

/// Stable x/z displacement in `[-amount, amount]` for a global voxel coordinate.
fn jitter(global: IVec3, amount: f32) -> (f32, f32) {
    let bits = mix_values(0, &[global.x as i64, global.y as i64, global.z as i64]);
    let unit = |v: u64| (v & 0xFFFF) as f32 / 65_535.0 * 2.0 - 1.0;
    (unit(bits) * amount, unit(bits >> 16) * amount)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use loam_voxel::ChunkDims;

    const DIMS: ChunkDims = ChunkDims::cubic(4);

    fn chunk_with(voxels: &[([usize; 3], VoxelCode)]) -> Chunk {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0, 0), DIMS);
        for &(p, v) in voxels {
            chunk.set_voxel(p[0], p[1], p[2], v);
        }
        chunk.refresh_empty();
        chunk
    }

    fn faces_of(meshes: &ChunkMeshes, face: FaceDirection) -> usize {
        meshes.cubes.iter().filter(|v| v.face() == Some(face)).count() / 6
    }

    #[test]
    fn test_lone_opaque_cube_emits_six_faces() {
        let chunk = chunk_with(&[([1, 1, 1], VoxelCode::Stone)]);
        let meshes = build_chunk_mesh(&chunk, &[None; 6], &MeshParams::default());
        assert_eq!(meshes.cubes.len(), 36);
        for face in FaceDirection::ALL {
            assert_eq!(faces_of(&meshes, face), 1);
        }
        assert!(meshes.irregular.is_empty());
        assert!(meshes.water.is_empty());
    }

    #[test]
    fn test_adjacent_opaque_pair_shares_no_face() {
        let chunk = chunk_with(&[([1, 1, 1], VoxelCode::Stone), ([2, 1, 1], VoxelCode::Dirt)]);
        let meshes = build_chunk_mesh(&chunk, &[None; 6], &MeshParams::default());
        assert_eq!(meshes.cubes.len(), 10 * 6);
        assert_eq!(faces_of(&meshes, FaceDirection::PosX), 1);
        assert_eq!(faces_of(&meshes, FaceDirection::NegX), 1);
        // The surviving +X face belongs to the dirt voxel, on the x = 3 plane.
        assert!(
            meshes
                .cubes
                .iter()
                .filter(|v| v.face() == Some(FaceDirection::PosX))
                .all(|v| v.position()[0] == 3)
        );
    }

    #[test]
    fn test_glass_never_culls() {
        let chunk = chunk_with(&[([1, 1, 1], VoxelCode::Glass), ([2, 1, 1], VoxelCode::Stone)]);
        let meshes = build_chunk_mesh(&chunk, &[None; 6], &MeshParams::default());
        // Glass shows all 6 faces; stone keeps its face toward the glass.
        assert_eq!(meshes.cubes.len(), 12 * 6);
    }

    #[test]
    fn test_neighbor_chunk_culls_boundary_face() {
        let chunk = chunk_with(&[([3, 0, 0], VoxelCode::Stone)]);
        let mut east = Chunk::new(ChunkCoord::new(1, 0, 0), DIMS);
        east.set_voxel(0, 0, 0, VoxelCode::Stone);
        east.refresh_empty();
        let mut neighbors: Neighbors<'_> = [None; 6];
        neighbors[FaceDirection::PosX.index()] = Some(&east);
        let meshes = build_chunk_mesh(&chunk, &neighbors, &MeshParams::default());
        assert_eq!(faces_of(&meshes, FaceDirection::PosX), 0);
        assert_eq!(meshes.cubes.len(), 30);
    }

    #[test]
    fn test_water_emits_top_face_only() {
        let chunk = chunk_with(&[([0, 0, 0], VoxelCode::Water), ([0, 1, 0], VoxelCode::Water)]);
        let meshes = build_chunk_mesh(&chunk, &[None; 6], &MeshParams::default());
        assert_eq!(meshes.water.len(), 12);
        assert!(meshes.cubes.is_empty());
        // Lower voxel has water above: full height.
        assert!(meshes.water[..6].iter().all(|v| (v.position[1] - 1.0).abs() < 1e-6));
        // Upper voxel is the surface.
        assert!(meshes.water[6..].iter().all(|v| (v.position[1] - 1.94).abs() < 1e-5));
    }

    #[test]
    fn test_billboard_is_two_double_sided_quads() {
        let chunk = chunk_with(&[([2, 0, 2], VoxelCode::Roses)]);
        let params = MeshParams::default();
        let meshes = build_chunk_mesh(&chunk, &[None; 6], &params);
        assert_eq!(meshes.irregular.len(), 24);
        for v in &meshes.irregular {
            assert!(v.position[0] >= 2.0 - params.billboard_jitter - 1e-6);
            assert!(v.position[0] <= 3.0 + params.billboard_jitter + 1e-6);
            assert!(v.position[1] == 0.0 || v.position[1] == 1.0);
        }
        // Remeshing yields identical vertices.
        assert_eq!(build_chunk_mesh(&chunk, &[None; 6], &params), meshes);
    }

    #[test]
    fn test_jitter_is_bounded() {
        for x in -20..20 {
            let (dx, dz) = jitter(IVec3::new(x, 7, -x), 0.25);
            assert!(dx.abs() <= 0.25 && dz.abs() <= 0.25);
        }
        assert_eq!(jitter(IVec3::new(1, 2, 3), 0.0), (0.0, 0.0));
    }

    #[test]
    fn test_empty_chunk_builds_nothing() {
        let chunk = Chunk::new(ChunkCoord::new(0, 0, 0), DIMS);
        assert!(build_chunk_mesh(&chunk, &[None; 6], &MeshParams::default()).is_empty());
    }
}
