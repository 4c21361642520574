//! Chunk filling from resident sections.
//!
//! Filling a chunk needs the 5×5 window of sections around the chunk's own
//! section: the 3×3 inner ring is smoothed and receives features, and
//! smoothing each of those reads its own 3×3 neighbors.

use glam::IVec3;
use rand::Rng;
use thiserror::Error;

use loam_voxel::{Chunk, ChunkCoord, ChunkDims, ColumnCoord, VoxelCode, local_of};

use crate::feature::{FeatureVoxel, poisson_disk_elimination};
use crate::heightmap::{HeightmapParams, HeightmapSampler};
use crate::section::{Landcover, SectionMap};
use crate::seed::{noise_seed, section_rng};
use crate::tree::plant_tree;

/// Errors produced by terrain generation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TerrainError {
    /// Some sections of the chunk's window are not resident yet.
    #[error("chunk {coord:?} not ready: {missing} sections missing")]
    NotReady {
        /// The chunk that was requested.
        coord: ChunkCoord,
        /// Number of absent sections.
        missing: usize,
    },
}

/// Frequencies and thresholds of the decoration noise fields.
#[derive(Clone, Debug, PartialEq)]
pub struct DecorationParams {
    /// Sunflower field frequency.
    pub sunflower_frequency: f64,
    /// Sunflowers grow where the field exceeds this.
    pub sunflower_threshold: f64,
    /// Rose field frequency.
    pub roses_frequency: f64,
    /// Roses grow where the field exceeds this.
    pub roses_threshold: f64,
    /// Tall grass field frequency.
    pub tall_grass_frequency: f64,
    /// Tall grass grows where the field exceeds this.
    pub tall_grass_threshold: f64,
    /// Eliminated tree candidates become tall grass above this.
    pub scatter_grass_threshold: f64,
    /// Eliminated tree candidates become roses above this.
    pub scatter_roses_threshold: f64,
}

impl Default for DecorationParams {
    fn default() -> Self {
        Self {
            sunflower_frequency: 0.09,
            sunflower_threshold: 0.55,
            roses_frequency: 0.07,
            roses_threshold: 0.5,
            tall_grass_frequency: 0.05,
            tall_grass_threshold: 0.25,
            scatter_grass_threshold: -0.2,
            scatter_roses_threshold: 0.4,
        }
    }
}

/// Everything that shapes generated terrain.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainParams {
    /// World seed.
    pub seed: u64,
    /// Dimensions of generated chunks.
    pub chunk_dims: ChunkDims,
    /// Section side length in columns; a multiple of the chunk's x and z size.
    pub section_size: usize,
    /// Half-width of the elevation box filter.
    pub smoothing_radius: usize,
    /// Columns below this are water, filled up to it.
    pub sea_level: i32,
    /// Columns above this are bare rock.
    pub snow_line: i32,
    /// Elevation added to the noise before classification.
    pub ground_offset: i32,
    /// Elevation noise. Its seed is derived from `seed`.
    pub elevation: HeightmapParams,
    /// Moisture field frequency.
    pub moisture_frequency: f64,
    /// Vegetated columns become forest above this moisture.
    pub forest_threshold: f64,
    /// Decoration noise fields.
    pub decoration: DecorationParams,
    /// Expected trees per forest column.
    pub forest_tree_density: f64,
    /// Expected trees per grassland column.
    pub grassland_tree_density: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 0,
            chunk_dims: ChunkDims::DEFAULT,
            section_size: 64,
            smoothing_radius: 2,
            sea_level: 0,
            snow_line: 40,
            ground_offset: 6,
            elevation: HeightmapParams::default(),
            moisture_frequency: 0.003,
            forest_threshold: 0.15,
            decoration: DecorationParams::default(),
            forest_tree_density: 0.02,
            grassland_tree_density: 0.002,
        }
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 { a } else { gcd(b, a % b) }
}

impl TerrainParams {
    /// Rounds `section_size` up to a multiple of the chunk's x and z size so
    /// every chunk lies inside a single section.
    pub fn normalized(mut self) -> Self {
        let (dx, dz) = (self.chunk_dims.x.max(1), self.chunk_dims.z.max(1));
        let step = dx / gcd(dx, dz) * dz;
        let aligned = self.section_size.max(1).div_ceil(step) * step;
        if aligned != self.section_size {
            tracing::warn!("section_size {} rounded up to {}", self.section_size, aligned);
            self.section_size = aligned;
        }
        self
    }

    fn tree_density(&self, landcover: Landcover) -> f64 {
        match landcover {
            Landcover::Forest => self.forest_tree_density,
            Landcover::Grassland => self.grassland_tree_density,
            Landcover::Water | Landcover::Bare => 0.0,
        }
    }
}

/// Fills chunks from sections and places section features.
pub struct TerrainGenerator {
    params: TerrainParams,
    sunflower: HeightmapSampler,
    roses: HeightmapSampler,
    tall_grass: HeightmapSampler,
    scatter_grass: HeightmapSampler,
    scatter_roses: HeightmapSampler,
}

fn field(seed: u64, index: u32, frequency: f64) -> HeightmapSampler {
    HeightmapSampler::new(HeightmapParams {
        seed: noise_seed(seed, index),
        octaves: 3,
        lacunarity: 2.0,
        persistence: 0.5,
        base_frequency: frequency,
        amplitude: 1.0,
    })
}

impl TerrainGenerator {
    /// Creates a generator. `params` is normalized first.
    pub fn new(params: TerrainParams) -> Self {
        let params = params.normalized();
        let d = &params.decoration;
        let seed = params.seed;
        Self {
            sunflower: field(seed, 2, d.sunflower_frequency),
            roses: field(seed, 3, d.roses_frequency),
            tall_grass: field(seed, 4, d.tall_grass_frequency),
            scatter_grass: field(seed, 5, d.tall_grass_frequency),
            scatter_roses: field(seed, 6, d.roses_frequency),
            params,
        }
    }

    /// The normalized parameters in use.
    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Sections a chunk needs before it can be filled.
    pub fn window(&self, loc: ChunkCoord, sections: &SectionMap) -> Vec<ColumnCoord> {
        let center = sections.section_of_chunk(loc, self.params.chunk_dims);
        let mut window = Vec::with_capacity(25);
        for dz in -2..=2 {
            for dx in -2..=2 {
                window.push(ColumnCoord::new(center.x + dx, center.z + dz));
            }
        }
        window
    }

    /// Sections of the chunk's window that are not resident.
    pub fn missing_sections(&self, loc: ChunkCoord, sections: &SectionMap) -> Vec<ColumnCoord> {
        self.window(loc, sections)
            .into_iter()
            .filter(|c| !sections.contains(*c))
            .collect()
    }

    /// Returns `true` when the whole window is resident.
    pub fn ready_to_fill(&self, loc: ChunkCoord, sections: &SectionMap) -> bool {
        self.window(loc, sections).into_iter().all(|c| sections.contains(c))
    }

    /// Generates the chunk at `loc`.
    ///
    /// Smooths and places features for the 3×3 sections around the chunk's
    /// section when that has not happened yet. The result is flagged `EMPTY`
    /// when no voxel was written.
    pub fn fill_chunk(&self, loc: ChunkCoord, sections: &mut SectionMap) -> Result<Chunk, TerrainError> {
        let missing = self.missing_sections(loc, sections).len();
        if missing > 0 {
            return Err(TerrainError::NotReady { coord: loc, missing });
        }

        let dims = self.params.chunk_dims;
        let center = sections.section_of_chunk(loc, dims);
        let ring: Vec<ColumnCoord> = (-1..=1)
            .flat_map(|dz| (-1..=1).map(move |dx| ColumnCoord::new(center.x + dx, center.z + dz)))
            .collect();
        for &coord in &ring {
            self.smooth_section(sections, coord);
        }
        for &coord in &ring {
            self.place_features(sections, coord);
        }

        let section = sections
            .get(center)
            .ok_or(TerrainError::NotReady { coord: loc, missing: 1 })?;
        let mut chunk = Chunk::new(loc, dims);
        let y0 = loc.y * dims.y as i32;
        let height = dims.y as i32;

        for lz in 0..dims.z {
            for lx in 0..dims.x {
                let gx = loc.x * dims.x as i32 + lx as i32;
                let gz = loc.z * dims.z as i32 + lz as i32;
                let landcover = section.get_landcover(gx, gz);
                let elevation = section.get_subsection_elevation(gx, gz);

                let top = (elevation.saturating_sub(y0)).min(height - 1);
                for ly in 0..=top {
                    let voxel = column_voxel(landcover, y0 + ly, elevation);
                    chunk.set_voxel(lx, ly as usize, lz, voxel);
                }

                let above = elevation.saturating_add(1).saturating_sub(y0);
                if landcover.is_vegetated() && (0..height).contains(&above) {
                    if let Some(decoration) = self.decoration_at(gx, gz) {
                        chunk.set_voxel(lx, above as usize, lz, decoration);
                    }
                }
            }
        }

        for coord in ring {
            let Some(section) = sections.get(coord) else {
                continue;
            };
            for feature in section.get_features(loc) {
                let local = local_of(feature.pos, dims);
                let (x, y, z) = (local.x as usize, local.y as usize, local.z as usize);
                let existing = chunk.get_voxel(x, y, z);
                if existing.is_empty() || existing.is_non_cube() {
                    chunk.set_voxel(x, y, z, feature.voxel);
                }
            }
        }

        chunk.refresh_empty();
        tracing::debug!("filled chunk {:?} ({} voxels)", loc, chunk.count_non_empty());
        Ok(chunk)
    }

    /// Decorative cap for a vegetated column, if any field fires.
    fn decoration_at(&self, gx: i32, gz: i32) -> Option<VoxelCode> {
        let d = &self.params.decoration;
        let (x, z) = (gx as f64, gz as f64);
        if self.sunflower.sample_unit(x, z) > d.sunflower_threshold {
            Some(VoxelCode::Sunflower)
        } else if self.roses.sample_unit(x, z) > d.roses_threshold {
            Some(VoxelCode::Roses)
        } else if self.tall_grass.sample_unit(x, z) > d.tall_grass_threshold {
            Some(VoxelCode::TallGrass)
        } else {
            None
        }
    }

    /// Box-filters raw elevation of one section. Water columns stay at sea level.
    fn smooth_section(&self, sections: &mut SectionMap, coord: ColumnCoord) {
        let Some(section) = sections.get(coord) else {
            return;
        };
        if section.is_smoothed() {
            return;
        }
        let size = section.size();
        let origin = section.origin();
        let r = self.params.smoothing_radius as i32;

        let mut smoothed = Vec::with_capacity(size * size);
        for lz in 0..size as i32 {
            for lx in 0..size as i32 {
                let (gx, gz) = (origin.x + lx, origin.z + lz);
                let raw = section.get_raw_elevation(gx, gz).unwrap_or(self.params.sea_level);
                if section.get_landcover(gx, gz) == Landcover::Water {
                    smoothed.push(raw);
                    continue;
                }
                let (mut sum, mut n) = (0i64, 0i64);
                for dz in -r..=r {
                    for dx in -r..=r {
                        if let Some(e) = sections.raw_elevation_at(gx + dx, gz + dz) {
                            sum += e as i64;
                            n += 1;
                        }
                    }
                }
                smoothed.push(if n == 0 { raw } else { (sum as f64 / n as f64).round() as i32 });
            }
        }
        if let Some(section) = sections.get_mut(coord) {
            section.set_smoothed(smoothed);
        }
    }

    /// Places trees and scattered plants in one section, once.
    fn place_features(&self, sections: &mut SectionMap, coord: ColumnCoord) {
        let Some(section) = sections.get(coord) else {
            return;
        };
        if section.features_ready() {
            return;
        }
        let size = section.size();
        let origin = section.origin();

        let mut vegetated = Vec::new();
        let mut expected = 0.0;
        for lz in 0..size as i32 {
            for lx in 0..size as i32 {
                let (gx, gz) = (origin.x + lx, origin.z + lz);
                let landcover = section.get_landcover(gx, gz);
                if landcover.is_vegetated() {
                    vegetated.push((gx, gz));
                    expected += self.params.tree_density(landcover);
                }
            }
        }

        let mut voxels: Vec<FeatureVoxel> = Vec::new();
        let target = expected.round() as usize;
        if !vegetated.is_empty() && target > 0 {
            let mut rng = section_rng(self.params.seed, coord);
            let candidates = (target * 5).min(vegetated.len());
            let points: Vec<(f64, f64)> = (0..candidates)
                .map(|_| {
                    let (gx, gz) = vegetated[rng.random_range(0..vegetated.len())];
                    (gx as f64 + rng.random::<f64>(), gz as f64 + rng.random::<f64>())
                })
                .collect();
            let result = poisson_disk_elimination(&points, target, (size * size) as f64);

            let surface = |i: usize| {
                let (x, z) = points[i];
                let (gx, gz) = (x.floor() as i32, z.floor() as i32);
                IVec3::new(gx, section.get_subsection_elevation(gx, gz) + 1, gz)
            };
            for &i in &result.kept {
                voxels.extend(plant_tree(self.params.seed, surface(i)));
            }
            for &i in &result.eliminated {
                let pos = surface(i);
                let (x, z) = (pos.x as f64, pos.z as f64);
                let d = &self.params.decoration;
                if self.scatter_roses.sample_unit(x, z) > d.scatter_roses_threshold {
                    voxels.push(FeatureVoxel::new(pos, VoxelCode::Roses));
                } else if self.scatter_grass.sample_unit(x, z) > d.scatter_grass_threshold {
                    voxels.push(FeatureVoxel::new(pos, VoxelCode::TallGrass));
                }
            }
            tracing::debug!(
                "section ({}, {}): {} trees from {} candidates",
                coord.x,
                coord.z,
                result.kept.len(),
                candidates
            );
        }

        if let Some(section) = sections.get_mut(coord) {
            for v in voxels {
                section.insert_into_features(v.pos.x, v.pos.y, v.pos.z, v.voxel);
            }
            section.mark_features_ready();
        }
    }
}

/// The voxel at global height `gy` of a column whose surface is `elevation`.
fn column_voxel(landcover: Landcover, gy: i32, elevation: i32) -> VoxelCode {
    match landcover {
        Landcover::Bare => VoxelCode::Stone,
        Landcover::Water => VoxelCode::Water,
        Landcover::Grassland | Landcover::Forest if gy == elevation => VoxelCode::GrassBlock,
        Landcover::Grassland | Landcover::Forest => VoxelCode::Dirt,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::Section;

    const DIMS: ChunkDims = ChunkDims::cubic(16);

    fn quiet_params() -> TerrainParams {
        TerrainParams {
            seed: 11,
            chunk_dims: DIMS,
            section_size: 16,
            smoothing_radius: 1,
            forest_tree_density: 0.0,
            grassland_tree_density: 0.0,
            decoration: DecorationParams {
                sunflower_threshold: 2.0,
                roses_threshold: 2.0,
                tall_grass_threshold: 2.0,
                ..DecorationParams::default()
            },
            ..TerrainParams::default()
        }
    }

    fn uniform_map(landcover: Landcover, elevation: i32) -> SectionMap {
        let mut map = SectionMap::new(16);
        for z in -2..=2 {
            for x in -2..=2 {
                map.insert(Section::uniform(ColumnCoord::new(x, z), 16, DIMS, landcover, elevation));
            }
        }
        map
    }

    #[test]
    fn test_incomplete_window_is_not_ready() {
        let generator = TerrainGenerator::new(quiet_params());
        let mut map = SectionMap::new(16);
        let loc = ChunkCoord::new(0, 0, 0);
        assert_eq!(generator.missing_sections(loc, &map).len(), 25);
        assert!(!generator.ready_to_fill(loc, &map));

        map.insert(Section::uniform(ColumnCoord::new(0, 0), 16, DIMS, Landcover::Grassland, 4));
        assert_eq!(
            generator.fill_chunk(loc, &mut map),
            Err(TerrainError::NotReady { coord: loc, missing: 24 })
        );
    }

    #[test]
    fn test_grassland_column_layers() {
        let generator = TerrainGenerator::new(quiet_params());
        let mut map = uniform_map(Landcover::Grassland, 5);
        let chunk = generator.fill_chunk(ChunkCoord::new(0, 0, 0), &mut map).expect("ready");
        assert_eq!(chunk.get_voxel(3, 0, 7), VoxelCode::Dirt);
        assert_eq!(chunk.get_voxel(3, 4, 7), VoxelCode::Dirt);
        assert_eq!(chunk.get_voxel(3, 5, 7), VoxelCode::GrassBlock);
        assert_eq!(chunk.get_voxel(3, 6, 7), VoxelCode::Empty);
        assert!(!chunk.is_empty());

        let sky = generator.fill_chunk(ChunkCoord::new(0, 1, 0), &mut map).expect("ready");
        assert!(sky.is_empty());
    }

    #[test]
    fn test_bare_and_water_fill() {
        let generator = TerrainGenerator::new(quiet_params());
        let mut bare = uniform_map(Landcover::Bare, 3);
        let chunk = generator.fill_chunk(ChunkCoord::new(1, 0, -1), &mut bare).expect("ready");
        assert_eq!(chunk.get_voxel(0, 3, 0), VoxelCode::Stone);
        assert_eq!(chunk.get_voxel(0, 4, 0), VoxelCode::Empty);

        let mut water = uniform_map(Landcover::Water, 2);
        let chunk = generator.fill_chunk(ChunkCoord::new(0, 0, 0), &mut water).expect("ready");
        assert_eq!(chunk.get_voxel(9, 2, 9), VoxelCode::Water);
        assert_eq!(chunk.get_voxel(9, 3, 9), VoxelCode::Empty);
    }

    #[test]
    fn test_smoothing_spreads_a_spike() {
        let generator = TerrainGenerator::new(quiet_params());
        let mut map = uniform_map(Landcover::Grassland, 10);
        let mut elevation = vec![10; 256];
        elevation[3 + 16 * 3] = 19;
        map.insert(Section::new(
            ColumnCoord::new(0, 0),
            16,
            DIMS,
            vec![Landcover::Grassland; 256],
            elevation,
        ));
        let chunk = generator.fill_chunk(ChunkCoord::new(0, 0, 0), &mut map).expect("ready");
        assert_eq!(chunk.get_voxel(3, 11, 3), VoxelCode::GrassBlock);
        assert_eq!(chunk.get_voxel(3, 12, 3), VoxelCode::Empty);
        assert_eq!(chunk.get_voxel(2, 11, 3), VoxelCode::GrassBlock);
        assert_eq!(chunk.get_voxel(6, 10, 6), VoxelCode::GrassBlock);
        assert_eq!(chunk.get_voxel(6, 11, 6), VoxelCode::Empty);
    }

    #[test]
    fn test_decoration_caps_vegetated_columns_only() {
        let mut params = quiet_params();
        params.decoration.sunflower_threshold = -2.0;
        let generator = TerrainGenerator::new(params);

        let mut grass = uniform_map(Landcover::Forest, 4);
        let chunk = generator.fill_chunk(ChunkCoord::new(0, 0, 0), &mut grass).expect("ready");
        assert_eq!(chunk.get_voxel(8, 5, 8), VoxelCode::Sunflower);

        let mut bare = uniform_map(Landcover::Bare, 4);
        let chunk = generator.fill_chunk(ChunkCoord::new(0, 0, 0), &mut bare).expect("ready");
        assert_eq!(chunk.get_voxel(8, 5, 8), VoxelCode::Empty);
    }

    #[test]
    fn test_forest_grows_trees_deterministically() {
        let mut params = quiet_params();
        params.forest_tree_density = 0.05;
        let generator = TerrainGenerator::new(params);

        let mut map = uniform_map(Landcover::Forest, 2);
        let chunk = generator.fill_chunk(ChunkCoord::new(0, 0, 0), &mut map).expect("ready");
        let wood = chunk.voxels().iter().filter(|&&v| v == VoxelCode::Wood).count();
        assert!(wood > 0);
        // Features never replace ground.
        for z in 0..16 {
            for x in 0..16 {
                assert_eq!(chunk.get_voxel(x, 2, z), VoxelCode::GrassBlock);
                assert_eq!(chunk.get_voxel(x, 1, z), VoxelCode::Dirt);
            }
        }

        let mut again = uniform_map(Landcover::Forest, 2);
        assert_eq!(generator.fill_chunk(ChunkCoord::new(0, 0, 0), &mut again), Ok(chunk));
    }

    #[test]
    fn test_section_size_aligns_to_chunks() {
        let params = TerrainParams {
            chunk_dims: ChunkDims::new(8, 8, 12),
            section_size: 30,
            ..TerrainParams::default()
        }
        .normalized();
        assert_eq!(params.section_size, 48);
    }
}
