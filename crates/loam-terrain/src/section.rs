//! Sections: square tiles of per-column landcover and elevation.
//!
//! A section covers `size × size` columns starting at
//! `(coord.x * size, coord.z * size)`. Its raw elevation comes from the
//! section service; smoothing and feature placement happen later, once the
//! surrounding sections are resident. All accessors take global coordinates.

use glam::IVec3;
use rustc_hash::FxHashMap;

use loam_voxel::{ChunkCoord, ChunkDims, ColumnCoord, VoxelCode, chunk_coord_of};

use crate::feature::FeatureVoxel;

/// Surface classification of a column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Landcover {
    /// Open water up to sea level.
    #[default]
    Water,
    /// Exposed rock.
    Bare,
    /// Grass with sparse trees.
    Grassland,
    /// Grass with dense trees.
    Forest,
}

impl Landcover {
    /// Returns `true` for grassland and forest.
    pub fn is_vegetated(self) -> bool {
        matches!(self, Self::Grassland | Self::Forest)
    }
}

/// Landcover and elevation for one tile of columns.
#[derive(Clone, Debug)]
pub struct Section {
    coord: ColumnCoord,
    size: usize,
    chunk_dims: ChunkDims,
    landcover: Vec<Landcover>,
    elevation: Vec<i32>,
    smoothed: Option<Vec<i32>>,
    features: FxHashMap<ChunkCoord, Vec<FeatureVoxel>>,
    features_ready: bool,
}

impl Section {
    /// Creates a section from per-column data in `x + size * z` order.
    pub fn new(
        coord: ColumnCoord,
        size: usize,
        chunk_dims: ChunkDims,
        landcover: Vec<Landcover>,
        elevation: Vec<i32>,
    ) -> Self {
        debug_assert_eq!(landcover.len(), size * size);
        debug_assert_eq!(elevation.len(), size * size);
        Self {
            coord,
            size,
            chunk_dims,
            landcover,
            elevation,
            smoothed: None,
            features: FxHashMap::default(),
            features_ready: false,
        }
    }

    /// Creates a section with the same landcover and elevation everywhere.
    pub fn uniform(coord: ColumnCoord, size: usize, chunk_dims: ChunkDims, landcover: Landcover, elevation: i32) -> Self {
        Self::new(
            coord,
            size,
            chunk_dims,
            vec![landcover; size * size],
            vec![elevation; size * size],
        )
    }

    /// The section's coordinate in section units.
    pub fn coord(&self) -> ColumnCoord {
        self.coord
    }

    /// Side length in columns.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Global column of the section's minimum corner.
    pub fn origin(&self) -> ColumnCoord {
        ColumnCoord::new(self.coord.x * self.size as i32, self.coord.z * self.size as i32)
    }

    /// Returns `true` if the global column lies inside the section.
    pub fn contains_column(&self, x: i32, z: i32) -> bool {
        self.local_index(x, z).is_some()
    }

    fn local_index(&self, x: i32, z: i32) -> Option<usize> {
        let origin = self.origin();
        let (lx, lz) = (x - origin.x, z - origin.z);
        let size = self.size as i32;
        ((0..size).contains(&lx) && (0..size).contains(&lz)).then(|| (lx + size * lz) as usize)
    }

    /// Landcover of a global column. Columns outside the section read as water.
    pub fn get_landcover(&self, x: i32, z: i32) -> Landcover {
        match self.local_index(x, z) {
            Some(i) => self.landcover[i],
            None => {
                tracing::warn!("Section::get_landcover outside section {:?}: ({}, {})", self.coord, x, z);
                Landcover::Water
            }
        }
    }

    /// Unsmoothed elevation of a global column.
    pub fn get_raw_elevation(&self, x: i32, z: i32) -> Option<i32> {
        self.local_index(x, z).map(|i| self.elevation[i])
    }

    /// Smoothed elevation of a global column, or the raw value before
    /// smoothing ran. Columns outside the section read as `i32::MIN`.
    pub fn get_subsection_elevation(&self, x: i32, z: i32) -> i32 {
        let Some(i) = self.local_index(x, z) else {
            tracing::warn!("Section::get_subsection_elevation outside section {:?}: ({}, {})", self.coord, x, z);
            return i32::MIN;
        };
        match &self.smoothed {
            Some(smoothed) => smoothed[i],
            None => self.elevation[i],
        }
    }

    /// Returns `true` once smoothed elevation has been stored.
    pub fn is_smoothed(&self) -> bool {
        self.smoothed.is_some()
    }

    /// Stores smoothed elevation in `x + size * z` order.
    pub fn set_smoothed(&mut self, smoothed: Vec<i32>) {
        debug_assert_eq!(smoothed.len(), self.size * self.size);
        self.smoothed = Some(smoothed);
    }

    /// Records a feature voxel at a global position, bucketed by the chunk it
    /// falls in. The position may lie outside the section.
    pub fn insert_into_features(&mut self, x: i32, y: i32, z: i32, voxel: VoxelCode) {
        let pos = IVec3::new(x, y, z);
        self.features
            .entry(chunk_coord_of(pos, self.chunk_dims))
            .or_default()
            .push(FeatureVoxel::new(pos, voxel));
    }

    /// Feature voxels this section contributes to `chunk`.
    pub fn get_features(&self, chunk: ChunkCoord) -> &[FeatureVoxel] {
        self.features.get(&chunk).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns `true` once feature placement ran for this section.
    pub fn features_ready(&self) -> bool {
        self.features_ready
    }

    /// Marks feature placement as done.
    pub fn mark_features_ready(&mut self) {
        self.features_ready = true;
    }
}

/// Resident sections keyed by section coordinate.
pub struct SectionMap {
    section_size: usize,
    sections: FxHashMap<ColumnCoord, Section>,
}

impl SectionMap {
    /// Creates an empty map for sections of `section_size` columns.
    pub fn new(section_size: usize) -> Self {
        Self {
            section_size: section_size.max(1),
            sections: FxHashMap::default(),
        }
    }

    /// Side length of every section in columns.
    pub fn section_size(&self) -> usize {
        self.section_size
    }

    /// Section containing a global column.
    pub fn section_of_column(&self, column: ColumnCoord) -> ColumnCoord {
        let size = self.section_size as i32;
        ColumnCoord::new(column.x.div_euclid(size), column.z.div_euclid(size))
    }

    /// Section containing the minimum corner column of a chunk.
    pub fn section_of_chunk(&self, chunk: ChunkCoord, dims: ChunkDims) -> ColumnCoord {
        self.section_of_column(ColumnCoord::new(chunk.x * dims.x as i32, chunk.z * dims.z as i32))
    }

    /// Inserts a section, replacing any previous one at its coordinate.
    pub fn insert(&mut self, section: Section) {
        debug_assert_eq!(section.size(), self.section_size);
        self.sections.insert(section.coord(), section);
    }

    /// Immutable access to a section.
    pub fn get(&self, coord: ColumnCoord) -> Option<&Section> {
        self.sections.get(&coord)
    }

    /// Mutable access to a section.
    pub fn get_mut(&mut self, coord: ColumnCoord) -> Option<&mut Section> {
        self.sections.get_mut(&coord)
    }

    /// Returns `true` if the section is resident.
    pub fn contains(&self, coord: ColumnCoord) -> bool {
        self.sections.contains_key(&coord)
    }

    /// Number of resident sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns `true` if no section is resident.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Raw elevation of any resident global column.
    pub fn raw_elevation_at(&self, x: i32, z: i32) -> Option<i32> {
        let section = self.get(self.section_of_column(ColumnCoord::new(x, z)))?;
        section.get_raw_elevation(x, z)
    }

    /// Smoothed (or raw) elevation of any resident global column.
    pub fn elevation_at(&self, x: i32, z: i32) -> Option<i32> {
        let section = self.get(self.section_of_column(ColumnCoord::new(x, z)))?;
        Some(section.get_subsection_elevation(x, z))
    }

    /// Drops sections farther than `radius` sections (Chebyshev) from `center`.
    pub fn retain_within(&mut self, center: ColumnCoord, radius: i32) {
        self.sections
            .retain(|c, _| (c.x - center.x).abs() <= radius && (c.z - center.z).abs() <= radius);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const DIMS: ChunkDims = ChunkDims::cubic(8);

    #[test]
    fn test_accessors_use_global_columns() {
        let mut landcover = vec![Landcover::Grassland; 16];
        landcover[1 + 4 * 2] = Landcover::Forest;
        let elevation: Vec<i32> = (0..16).collect();
        let section = Section::new(ColumnCoord::new(-1, 2), 4, DIMS, landcover, elevation);

        assert_eq!(section.origin(), ColumnCoord::new(-4, 8));
        assert_eq!(section.get_landcover(-3, 10), Landcover::Forest);
        assert_eq!(section.get_subsection_elevation(-3, 10), 9);
        assert_eq!(section.get_raw_elevation(0, 8), None);
        assert!(!section.contains_column(-5, 8));
    }

    #[test]
    fn test_smoothed_elevation_replaces_raw() {
        let mut section = Section::uniform(ColumnCoord::new(0, 0), 2, DIMS, Landcover::Bare, 3);
        assert_eq!(section.get_subsection_elevation(1, 1), 3);
        section.set_smoothed(vec![7; 4]);
        assert!(section.is_smoothed());
        assert_eq!(section.get_subsection_elevation(1, 1), 7);
        assert_eq!(section.get_raw_elevation(1, 1), Some(3));
    }

    #[test]
    fn test_features_are_bucketed_by_chunk() {
        let mut section = Section::uniform(ColumnCoord::new(0, 0), 8, DIMS, Landcover::Forest, 0);
        section.insert_into_features(1, 1, 1, VoxelCode::Wood);
        section.insert_into_features(-1, 1, 1, VoxelCode::Leaves);
        section.insert_into_features(2, 9, 3, VoxelCode::Leaves);
        assert_eq!(section.get_features(ChunkCoord::new(0, 0, 0)).len(), 1);
        assert_eq!(section.get_features(ChunkCoord::new(-1, 0, 0)).len(), 1);
        assert_eq!(section.get_features(ChunkCoord::new(0, 1, 0))[0].voxel, VoxelCode::Leaves);
        assert!(section.get_features(ChunkCoord::new(5, 5, 5)).is_empty());
    }

    #[test]
    fn test_map_locates_sections() {
        let mut map = SectionMap::new(16);
        assert_eq!(map.section_of_column(ColumnCoord::new(-1, 16)), ColumnCoord::new(-1, 1));
        assert_eq!(map.section_of_chunk(ChunkCoord::new(-3, 7, 2), DIMS), ColumnCoord::new(-2, 1));

        map.insert(Section::uniform(ColumnCoord::new(0, 0), 16, DIMS, Landcover::Grassland, 4));
        map.insert(Section::uniform(ColumnCoord::new(5, 0), 16, DIMS, Landcover::Grassland, 4));
        assert_eq!(map.raw_elevation_at(15, 15), Some(4));
        assert_eq!(map.elevation_at(-1, 0), None);
        map.retain_within(ColumnCoord::new(0, 0), 2);
        assert_eq!(map.len(), 1);
    }
}
