//! The simulation-thread owner of all world state.

use std::sync::Arc;

use glam::{IVec3, Vec3};
use loam_lighting::propagate_skylight;
use loam_mesh::{FaceDirection, MeshExchange, MeshUpdate, Neighbors, build_chunk_mesh};
use loam_persist::{ChunkStore, StoreError};
use loam_region::{DiffKind, RegionStore};
use loam_terrain::{NoiseSectionService, SectionMap, SectionService, TerrainGenerator};
use loam_voxel::{ChunkCoord, MODIFIED, VoxelCode, chunk_coord_of};
use rustc_hash::FxHashSet;

use crate::error::EngineError;
use crate::loading::{stream_order, wanted_chunks};
use crate::settings::EngineSettings;

/// Sections kept around the player beyond the streaming radius.
const SECTION_MARGIN: i32 = 3;

/// What one [`World::step`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Chunks read from the store.
    pub loaded: usize,
    /// Chunks produced by the terrain generator.
    pub generated: usize,
    /// Chunks whose sections were not available yet.
    pub deferred: usize,
    /// Chunks dropped to respect `max_resident`.
    pub purged: usize,
    /// Chunks written to the store.
    pub saved: usize,
    /// Meshes built.
    pub created: usize,
    /// Meshes dropped.
    pub destroyed: usize,
}

enum Streamed {
    Loaded,
    Generated,
    Deferred,
}

/// Region, terrain, persistence and mesh hand-off for one session.
pub struct World<S = NoiseSectionService> {
    settings: EngineSettings,
    region: RegionStore,
    sections: SectionMap,
    service: S,
    generator: TerrainGenerator,
    store: ChunkStore,
    /// Chunks evicted from view since the player entered their chunk.
    evicted: FxHashSet<ChunkCoord>,
    exchange: Arc<MeshExchange>,
    player_chunk: Option<ChunkCoord>,
    steps: u64,
}

impl World<NoiseSectionService> {
    /// Opens a world whose sections come from noise.
    ///
    /// Fails if the save directory cannot be created.
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let service = NoiseSectionService::new(Self::terrain_params(&settings));
        Self::with_service(settings, service)
    }
}

impl<S: SectionService> World<S> {
    fn terrain_params(settings: &EngineSettings) -> loam_terrain::TerrainParams {
        let mut terrain = settings.terrain.clone();
        terrain.chunk_dims = settings.region.dims;
        terrain.normalized()
    }

    /// Opens a world with a custom section service.
    pub fn with_service(settings: EngineSettings, service: S) -> Result<Self, EngineError> {
        let store = ChunkStore::open(&settings.save_dir)?;
        let generator = TerrainGenerator::new(Self::terrain_params(&settings));
        let sections = SectionMap::new(generator.params().section_size);

        let wanted = wanted_chunks(ChunkCoord::default(), settings.streaming.view_radius, settings.streaming.vertical_radius)
            .count();
        if wanted > settings.region.max_visible {
            tracing::warn!(
                "streaming volume of {} chunks exceeds max_visible {}; evicted chunks stay unloaded until the player moves",
                wanted,
                settings.region.max_visible
            );
        }
        tracing::info!(
            "world opened: seed {}, chunks {:?}, view radius {}",
            generator.params().seed,
            settings.region.dims,
            settings.streaming.view_radius
        );

        Ok(Self {
            region: RegionStore::new(settings.region),
            sections,
            service,
            generator,
            store,
            evicted: FxHashSet::default(),
            exchange: Arc::new(MeshExchange::new()),
            player_chunk: None,
            steps: 0,
            settings,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn region(&self) -> &RegionStore {
        &self.region
    }

    pub fn sections(&self) -> &SectionMap {
        &self.sections
    }

    /// The exchange the render thread drains.
    pub fn exchange(&self) -> Arc<MeshExchange> {
        Arc::clone(&self.exchange)
    }

    /// Steps run so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Terrain surface height of a global column, if its section is resident.
    pub fn surface_height(&self, x: i32, z: i32) -> Option<i32> {
        self.sections.elevation_at(x, z)
    }

    /// Advances the simulation with the player at `player`.
    ///
    /// Streams the nearest missing chunks within budget, enforces the
    /// residency bound, then meshes and lights every chunk the region
    /// announced and publishes the batch.
    pub fn step(&mut self, player: Vec3) -> Result<StepReport, EngineError> {
        let dims = self.region.dims();
        let center = chunk_coord_of(player.floor().as_ivec3(), dims);
        let mut report = StepReport::default();
        let mut updates = Vec::new();

        if self.player_chunk != Some(center) {
            self.player_chunk = Some(center);
            self.region.set_player_column(center.column());
            updates.push(MeshUpdate::Reorigin { origin: center });
            self.trim_sections(center);
            self.evicted.clear();
        }

        // Chunks evicted from view stay out until the player changes chunk.
        let streaming = &self.settings.streaming;
        let (region, evicted) = (&self.region, &self.evicted);
        let order = stream_order(center, streaming.view_radius, streaming.vertical_radius, |coord| {
            region.contains(coord) || evicted.contains(&coord)
        });
        let budget = streaming.max_chunks_per_step;
        let mut queued = order.len();
        for coord in order {
            if report.loaded + report.generated >= budget {
                break;
            }
            queued -= 1;
            match self.stream_chunk(coord)? {
                Streamed::Loaded => report.loaded += 1,
                Streamed::Generated => report.generated += 1,
                Streamed::Deferred => report.deferred += 1,
            }
        }

        for chunk in self.region.purge() {
            report.purged += 1;
            if chunk.has_flag(MODIFIED) {
                self.store.save_chunk(&chunk)?;
                report.saved += 1;
            }
        }

        let mesh_params = &self.settings.mesh;
        let max_lighting = self.settings.max_lighting;
        let sections = &self.sections;
        let evicted = &mut self.evicted;
        self.region.consume_diffs(|region, diff| match diff.kind {
            DiffKind::Creation => {
                let Some(chunk) = region.get_chunk(diff.coord).filter(|c| !c.is_deleted()) else {
                    return;
                };
                let neighbors: Neighbors<'_> = FaceDirection::ALL.map(|face| {
                    let (dx, dy, dz) = face.offset(0, 0, 0);
                    region.get_chunk(diff.coord.offset(dx, dy, dz))
                });
                let meshes = build_chunk_mesh(chunk, &neighbors, mesh_params);
                let light = propagate_skylight(
                    chunk,
                    |gx, gz| sections.elevation_at(gx, gz).unwrap_or(i32::MIN),
                    max_lighting,
                );
                updates.push(MeshUpdate::Create { meshes, light });
                report.created += 1;
            }
            DiffKind::Deletion => {
                evicted.insert(diff.coord);
                updates.push(MeshUpdate::Destroy { coord: diff.coord });
                report.destroyed += 1;
            }
        });

        if !updates.is_empty() {
            self.exchange.publish(updates);
        }

        self.steps += 1;
        let interval = self.settings.stats_interval;
        if interval > 0 && self.steps % interval == 0 {
            tracing::info!(
                "step {}: {} resident, {} visible, {} sections, {} queued",
                self.steps,
                self.region.loaded_count(),
                self.region.visible_count(),
                self.sections.len(),
                queued
            );
        }
        Ok(report)
    }

    /// Places `voxel` in front of the first solid voxel along the ray and
    /// persists the edited chunk. Returns the edited position.
    pub fn place_voxel(&mut self, origin: Vec3, dir: Vec3, voxel: VoxelCode) -> Result<Option<IVec3>, EngineError> {
        let Some(pos) = self.region.raycast_place(origin, dir, self.settings.reach, voxel) else {
            return Ok(None);
        };
        self.persist_edit(pos)?;
        Ok(Some(pos))
    }

    /// Clears the first solid voxel along the ray and persists the edited
    /// chunk. Returns the edited position.
    pub fn remove_voxel(&mut self, origin: Vec3, dir: Vec3) -> Result<Option<IVec3>, EngineError> {
        let Some(pos) = self.region.raycast_remove(origin, dir, self.settings.reach) else {
            return Ok(None);
        };
        self.persist_edit(pos)?;
        Ok(Some(pos))
    }

    /// Saves every resident chunk edited since its last save.
    pub fn save_all(&mut self) -> Result<usize, EngineError> {
        let modified = self.region.modified_coords();
        for &coord in &modified {
            self.save_resident(coord)?;
        }
        if !modified.is_empty() {
            tracing::info!("saved {} modified chunks", modified.len());
        }
        Ok(modified.len())
    }

    fn persist_edit(&mut self, pos: IVec3) -> Result<(), EngineError> {
        let coord = chunk_coord_of(pos, self.region.dims());
        self.save_resident(coord)
    }

    fn save_resident(&mut self, coord: ChunkCoord) -> Result<(), EngineError> {
        if let Some(chunk) = self.region.get_chunk(coord) {
            self.store.save_chunk(chunk)?;
            self.region.mark_saved(coord);
        }
        Ok(())
    }

    fn stream_chunk(&mut self, coord: ChunkCoord) -> Result<Streamed, EngineError> {
        match self.store.load_chunk_if_exists(coord, self.region.dims()) {
            Ok(Some(chunk)) => {
                self.region.add_chunk(chunk);
                return Ok(Streamed::Loaded);
            }
            Ok(None) => {}
            Err(StoreError::Corrupt { .. }) => {
                tracing::warn!("regenerating chunk {:?} over its corrupt blob", coord);
            }
            Err(e) => return Err(e.into()),
        }

        if !self.generator.ready_to_fill(coord, &self.sections) {
            let missing = self.generator.missing_sections(coord, &self.sections);
            for section in self.service.request(&missing) {
                self.sections.insert(section);
            }
            if !self.generator.ready_to_fill(coord, &self.sections) {
                return Ok(Streamed::Deferred);
            }
        }

        let chunk = self.generator.fill_chunk(coord, &mut self.sections)?;
        self.region.add_chunk(chunk);
        Ok(Streamed::Generated)
    }

    /// Drops sections no chunk in view can need.
    fn trim_sections(&mut self, center: ChunkCoord) {
        let dims = self.region.dims();
        let section_size = self.sections.section_size();
        let reach = self.settings.streaming.view_radius as usize * dims.x.max(dims.z);
        let radius = reach.div_ceil(section_size) as i32 + SECTION_MARGIN;
        let center_section = self.sections.section_of_chunk(center, dims);
        let before = self.sections.len();
        self.sections.retain_within(center_section, radius);
        if self.sections.len() < before {
            tracing::debug!("dropped {} sections", before - self.sections.len());
        }
    }
}
