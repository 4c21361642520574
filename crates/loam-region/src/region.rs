//! Central owner for all resident chunks, keyed by [`ChunkCoord`].
//!
//! The [`RegionStore`] tracks, per coordinate, how many of the six orthogonal
//! neighbors are still missing. A chunk becomes mesh-eligible once that count
//! reaches zero; eligibility is announced through the diff stream, which the
//! engine drains with [`RegionStore::consume_diffs`].
//!
//! Memory is bounded twice. `max_visible` caps the set of meshed chunks: making
//! a chunk visible past the cap tombstones the visible chunk farthest from it.
//! `max_resident` caps the whole map: [`RegionStore::purge`] drops non-visible
//! chunks farthest from the player's column.

use glam::IVec3;
use rustc_hash::{FxHashMap, FxHashSet};

use loam_voxel::{
    Chunk, ChunkCoord, ChunkDims, ColumnCoord, DELETED, EMPTY, MODIFIED, VoxelCode, chunk_coord_of,
    local_of,
};

/// Number of face-adjacent neighbors a chunk waits for before it may be meshed.
const NEIGHBOR_COUNT: u8 = 6;

/// What happened to a coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiffKind {
    /// The chunk became visible or must be remeshed.
    Creation,
    /// The chunk left the visible set and its mesh must be dropped.
    Deletion,
}

/// A visibility change queued for the mesh consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Diff {
    /// The affected chunk.
    pub coord: ChunkCoord,
    /// Creation or deletion.
    pub kind: DiffKind,
}

/// Capacity and geometry of a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionConfig {
    /// Dimensions shared by every chunk in the region.
    pub dims: ChunkDims,
    /// Upper bound on simultaneously visible chunks.
    pub max_visible: usize,
    /// Upper bound on resident chunks, enforced by [`RegionStore::purge`].
    pub max_resident: usize,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            dims: ChunkDims::DEFAULT,
            max_visible: 1_024,
            max_resident: 4_096,
        }
    }
}

/// Resident chunks plus the bookkeeping that decides which of them are meshed.
pub struct RegionStore {
    config: RegionConfig,
    chunks: FxHashMap<ChunkCoord, Chunk>,
    adjacents_missing: FxHashMap<ChunkCoord, u8>,
    visible: FxHashSet<ChunkCoord>,
    diffs: Vec<Diff>,
    player_column: ColumnCoord,
}

impl RegionStore {
    /// Creates an empty region. `max_visible` is raised to at least 1.
    pub fn new(mut config: RegionConfig) -> Self {
        config.max_visible = config.max_visible.max(1);
        Self {
            config,
            chunks: FxHashMap::default(),
            adjacents_missing: FxHashMap::default(),
            visible: FxHashSet::default(),
            diffs: Vec::new(),
            player_column: ColumnCoord::default(),
        }
    }

    /// The region's configuration.
    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// Dimensions of every chunk in the region.
    pub fn dims(&self) -> ChunkDims {
        self.config.dims
    }

    /// Inserts a chunk, replacing any resident chunk at the same coordinate.
    ///
    /// Neighbor counters are only touched when the coordinate was not already
    /// resident. Afterwards the chunk and each of its neighbors are checked for
    /// eligibility and promoted to visible when they qualify.
    pub fn add_chunk(&mut self, chunk: Chunk) {
        debug_assert_eq!(chunk.dims(), self.config.dims);
        let coord = chunk.coord();
        let replaced = self.chunks.insert(coord, chunk).is_some();
        self.adjacents_missing.entry(coord).or_insert(NEIGHBOR_COUNT);

        if replaced {
            if self.visible.contains(&coord) {
                self.push_diff(coord, DiffKind::Creation);
            }
        } else {
            for neighbor in coord.neighbors() {
                let missing = self.adjacents_missing.entry(neighbor).or_insert(NEIGHBOR_COUNT);
                *missing = missing.saturating_sub(1);
            }
        }

        self.try_make_visible(coord);
        for neighbor in coord.neighbors() {
            self.try_make_visible(neighbor);
        }
    }

    /// Removes a chunk outright. A visible chunk gets a deletion diff.
    pub fn remove_chunk(&mut self, coord: ChunkCoord) -> Option<Chunk> {
        if self.visible.remove(&coord) {
            self.push_diff(coord, DiffKind::Deletion);
        }
        self.erase(coord)
    }

    /// Records the player's last known column for purge ordering.
    pub fn set_player_column(&mut self, column: ColumnCoord) {
        self.player_column = column;
    }

    /// The player's last known column.
    pub fn player_column(&self) -> ColumnCoord {
        self.player_column
    }

    /// Immutable access to a resident chunk, tombstones included.
    pub fn get_chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Clears [`MODIFIED`] on a resident chunk after it was persisted.
    pub fn mark_saved(&mut self, coord: ChunkCoord) {
        if let Some(chunk) = self.chunks.get_mut(&coord) {
            chunk.clear_flag(MODIFIED);
        }
    }

    /// Coordinates of resident chunks edited since they were last saved.
    pub fn modified_coords(&self) -> Vec<ChunkCoord> {
        self.chunks
            .iter()
            .filter(|(_, chunk)| chunk.has_flag(MODIFIED))
            .map(|(coord, _)| *coord)
            .collect()
    }

    /// Returns `true` if a chunk is resident at `coord`.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Returns `true` if all six neighbors of `coord` are resident.
    pub fn is_fully_loaded(&self, coord: ChunkCoord) -> bool {
        self.adjacents_missing.get(&coord) == Some(&0)
    }

    /// Returns `true` if `coord` currently has a mesh.
    pub fn is_visible(&self, coord: ChunkCoord) -> bool {
        self.visible.contains(&coord)
    }

    /// Number of resident chunks, tombstones included.
    pub fn loaded_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of visible chunks.
    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// Iterates over visible coordinates.
    pub fn visible_coords(&self) -> impl Iterator<Item = &ChunkCoord> {
        self.visible.iter()
    }

    /// Iterates over all resident `(coord, chunk)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&ChunkCoord, &Chunk)> {
        self.chunks.iter()
    }

    /// Diffs queued since the last consumption.
    pub fn pending_diffs(&self) -> &[Diff] {
        &self.diffs
    }

    /// Reads the voxel at a global coordinate.
    ///
    /// Returns `None` when the owning chunk is missing or tombstoned.
    pub fn get_voxel(&self, global: IVec3) -> Option<VoxelCode> {
        let dims = self.config.dims;
        let chunk = self.chunks.get(&chunk_coord_of(global, dims))?;
        if chunk.is_deleted() {
            return None;
        }
        let local = local_of(global, dims);
        Some(chunk.get_voxel(local.x as usize, local.y as usize, local.z as usize))
    }

    /// Edits the voxel at a global coordinate.
    ///
    /// The chunk is flagged [`MODIFIED`], then re-signalled for meshing along
    /// with any visible neighbor sharing the edited boundary. Returns `false`
    /// for missing or tombstoned chunks and for sentinel codes.
    pub fn set_voxel(&mut self, global: IVec3, voxel: VoxelCode) -> bool {
        let dims = self.config.dims;
        let coord = chunk_coord_of(global, dims);
        let local = local_of(global, dims);
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return false;
        };
        if chunk.is_deleted() {
            tracing::warn!("edit rejected: chunk {:?} is awaiting deletion", coord);
            return false;
        }
        if !chunk.set_voxel(local.x as usize, local.y as usize, local.z as usize, voxel) {
            return false;
        }
        chunk.set_flag(MODIFIED);
        if voxel.is_empty() {
            chunk.refresh_empty();
        } else {
            chunk.clear_flag(EMPTY);
        }
        self.signal_edit(coord, local);
        true
    }

    /// Hands every queued diff, oldest first, to `f`, then clears the batch.
    ///
    /// Tombstones whose deletion diff was part of the batch are erased unless
    /// they were revived in the meantime.
    pub fn consume_diffs<F>(&mut self, mut f: F)
    where
        F: FnMut(&RegionStore, &Diff),
    {
        let batch = std::mem::take(&mut self.diffs);
        for diff in &batch {
            f(self, diff);
        }
        for diff in &batch {
            if diff.kind == DiffKind::Deletion
                && self.chunks.get(&diff.coord).is_some_and(Chunk::is_deleted)
            {
                self.erase(diff.coord);
            }
        }
    }

    /// Drops non-visible, non-deleted chunks farthest from the player column
    /// until at most `max_resident` chunks remain.
    ///
    /// The dropped chunks are returned so edited ones can be persisted.
    pub fn purge(&mut self) -> Vec<Chunk> {
        let excess = self.chunks.len().saturating_sub(self.config.max_resident);
        if excess == 0 {
            return Vec::new();
        }

        let player = self.player_column;
        let mut candidates: Vec<ChunkCoord> = self
            .chunks
            .iter()
            .filter(|(coord, chunk)| !chunk.is_deleted() && !self.visible.contains(coord))
            .map(|(coord, _)| *coord)
            .collect();
        candidates.sort_unstable_by_key(|c| std::cmp::Reverse((c.column().distance_sq(player), *c)));

        let purged: Vec<Chunk> = candidates
            .into_iter()
            .take(excess)
            .filter_map(|coord| self.erase(coord))
            .collect();
        if !purged.is_empty() {
            tracing::debug!(
                "purged {} chunks around column ({}, {})",
                purged.len(),
                player.x,
                player.z
            );
        }
        purged
    }

    // -- internals ----------------------------------------------------------

    fn is_eligible(&self, coord: ChunkCoord) -> bool {
        if self.visible.contains(&coord) || !self.is_fully_loaded(coord) {
            return false;
        }
        let Some(chunk) = self.chunks.get(&coord) else {
            return false;
        };
        if chunk.is_deleted() || chunk.is_empty() {
            return false;
        }
        coord
            .neighbors()
            .iter()
            .all(|n| self.chunks.get(n).is_some_and(|c| !c.is_deleted()))
    }

    fn try_make_visible(&mut self, coord: ChunkCoord) -> bool {
        if !self.is_eligible(coord) {
            return false;
        }
        if self.visible.len() >= self.config.max_visible {
            self.evict_farthest_from(coord);
        }
        self.visible.insert(coord);
        self.push_diff(coord, DiffKind::Creation);
        true
    }

    fn evict_farthest_from(&mut self, origin: ChunkCoord) {
        let Some(farthest) = self
            .visible
            .iter()
            .copied()
            .max_by_key(|c| (c.distance_sq(origin), *c))
        else {
            return;
        };
        self.visible.remove(&farthest);
        if let Some(chunk) = self.chunks.get_mut(&farthest) {
            chunk.set_flag(DELETED);
        }
        tracing::debug!("evicted visible chunk {:?} for {:?}", farthest, origin);
        self.push_diff(farthest, DiffKind::Deletion);
    }

    /// Removes a chunk and gives its neighbors their missing slot back.
    fn erase(&mut self, coord: ChunkCoord) -> Option<Chunk> {
        let chunk = self.chunks.remove(&coord)?;
        self.visible.remove(&coord);
        for neighbor in coord.neighbors() {
            if let Some(missing) = self.adjacents_missing.get_mut(&neighbor) {
                *missing = (*missing + 1).min(NEIGHBOR_COUNT);
                if *missing == NEIGHBOR_COUNT && !self.chunks.contains_key(&neighbor) {
                    self.adjacents_missing.remove(&neighbor);
                }
            }
        }
        if self.adjacents_missing.get(&coord) == Some(&NEIGHBOR_COUNT) {
            self.adjacents_missing.remove(&coord);
        }
        Some(chunk)
    }

    /// Queues a diff. Back-to-back creations for one coordinate collapse.
    fn push_diff(&mut self, coord: ChunkCoord, kind: DiffKind) {
        if kind == DiffKind::Creation
            && self
                .diffs
                .iter()
                .rev()
                .find(|d| d.coord == coord)
                .is_some_and(|d| d.kind == DiffKind::Creation)
        {
            return;
        }
        self.diffs.push(Diff { coord, kind });
    }

    /// Remeshes an edited chunk and any visible neighbor across a touched face.
    fn signal_edit(&mut self, coord: ChunkCoord, local: IVec3) {
        self.signal_chunk(coord);

        let last = self.config.dims.as_ivec3() - IVec3::ONE;
        for axis in 0..3 {
            let mut offset = IVec3::ZERO;
            if local[axis] == 0 {
                offset[axis] = -1;
            } else if local[axis] == last[axis] {
                offset[axis] = 1;
            } else {
                continue;
            }
            let neighbor = coord.offset(offset.x, offset.y, offset.z);
            if self.visible.contains(&neighbor) {
                self.push_diff(neighbor, DiffKind::Creation);
            }
            // A one-voxel-thick axis touches both faces.
            if last[axis] == 0 {
                let opposite = coord.offset(-offset.x, -offset.y, -offset.z);
                if self.visible.contains(&opposite) {
                    self.push_diff(opposite, DiffKind::Creation);
                }
            }
        }
    }

    fn signal_chunk(&mut self, coord: ChunkCoord) {
        if self.visible.contains(&coord) {
            self.push_diff(coord, DiffKind::Creation);
        } else {
            self.try_make_visible(coord);
        }
    }
}

impl Default for RegionStore {
    fn default() -> Self {
        Self::new(RegionConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
