//! Section sources.

use loam_voxel::ColumnCoord;

use crate::generator::TerrainParams;
use crate::heightmap::{HeightmapParams, HeightmapSampler};
use crate::section::{Landcover, Section};
use crate::seed::noise_seed;

/// Supplies sections on request.
pub trait SectionService {
    /// Returns one section per requested section coordinate. Implementations
    /// may answer a subset; the caller requests again later.
    fn request(&mut self, columns: &[ColumnCoord]) -> Vec<Section>;
}

/// Builds sections from elevation and moisture noise.
pub struct NoiseSectionService {
    params: TerrainParams,
    elevation: HeightmapSampler,
    moisture: HeightmapSampler,
}

impl NoiseSectionService {
    /// Creates a service. `params` is normalized first, so the section size
    /// matches a [`TerrainGenerator`](crate::TerrainGenerator) built from the
    /// same parameters.
    pub fn new(params: TerrainParams) -> Self {
        let params = params.normalized();
        let elevation = HeightmapSampler::new(HeightmapParams {
            seed: noise_seed(params.seed, 0),
            ..params.elevation.clone()
        });
        let moisture = HeightmapSampler::new(HeightmapParams {
            seed: noise_seed(params.seed, 1),
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: params.moisture_frequency,
            amplitude: 1.0,
        });
        Self {
            params,
            elevation,
            moisture,
        }
    }

    /// Builds the section at `coord`.
    pub fn build_section(&self, coord: ColumnCoord) -> Section {
        let size = self.params.section_size;
        let (ox, oz) = (coord.x * size as i32, coord.z * size as i32);
        let mut landcover = Vec::with_capacity(size * size);
        let mut elevation = Vec::with_capacity(size * size);

        for lz in 0..size as i32 {
            for lx in 0..size as i32 {
                let (x, z) = ((ox + lx) as f64, (oz + lz) as f64);
                let height = self.params.sea_level
                    + self.params.ground_offset
                    + self.elevation.sample(x, z).round() as i32;
                let (cover, surface) = if height < self.params.sea_level {
                    (Landcover::Water, self.params.sea_level)
                } else if height > self.params.snow_line {
                    (Landcover::Bare, height)
                } else if self.moisture.sample_unit(x, z) > self.params.forest_threshold {
                    (Landcover::Forest, height)
                } else {
                    (Landcover::Grassland, height)
                };
                landcover.push(cover);
                elevation.push(surface);
            }
        }
        Section::new(coord, size, self.params.chunk_dims, landcover, elevation)
    }
}

impl SectionService for NoiseSectionService {
    fn request(&mut self, columns: &[ColumnCoord]) -> Vec<Section> {
        tracing::debug!("building {} sections", columns.len());
        columns.iter().map(|&c| self.build_section(c)).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
