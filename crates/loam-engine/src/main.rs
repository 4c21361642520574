//! Headless Loam session.
//!
//! Walks a player in a straight line over generated terrain while a render
//! thread drains mesh updates into a counting sink. Every `EDIT_INTERVAL`
//! steps the player digs the voxel below them and puts stone back.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags:
//! `cargo run -p loam-engine -- --seed 7 --steps 300`.

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::Parser;
use glam::Vec3;
use loam_config::{CliArgs, Config};
use loam_engine::{EngineSettings, World};
use loam_lighting::LightMap;
use loam_mesh::{ChunkMeshes, MeshExchange, MeshSink, apply_updates};
use loam_voxel::{ChunkCoord, VoxelCode};
use rustc_hash::FxHashMap;
use tracing::{error, info};

/// Voxels the player advances per step.
const WALK_SPEED: f32 = 0.5;
/// Height above the surface the player hovers at.
const EYE_HEIGHT: f32 = 3.5;
const EDIT_INTERVAL: u64 = 50;

/// Renderer stand-in that tracks what would be on the GPU.
#[derive(Default)]
struct CountingSink {
    vertices: FxHashMap<ChunkCoord, usize>,
    created: usize,
    destroyed: usize,
    reorigins: usize,
}

impl MeshSink for CountingSink {
    fn create(&mut self, meshes: ChunkMeshes, _light: LightMap) {
        self.created += 1;
        self.vertices.insert(meshes.coord, meshes.vertex_count());
    }

    fn destroy(&mut self, coord: ChunkCoord) {
        self.destroyed += 1;
        self.vertices.remove(&coord);
    }

    fn reorigin(&mut self, _origin: ChunkCoord) {
        self.reorigins += 1;
    }
}

fn spawn_renderer(exchange: Arc<MeshExchange>, stop: Arc<AtomicBool>) -> std::io::Result<thread::JoinHandle<CountingSink>> {
    thread::Builder::new().name("render".to_string()).spawn(move || {
        let mut sink = CountingSink::default();
        loop {
            exchange.wait_ready(Duration::from_millis(16));
            if let Some(updates) = exchange.try_take() {
                apply_updates(&mut sink, updates);
            }
            if stop.load(Ordering::Acquire) {
                if let Some(updates) = exchange.try_take() {
                    apply_updates(&mut sink, updates);
                }
                return sink;
            }
        }
    })
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let config_dir = args.config_dir();

    let mut config = match Config::load_or_create(&config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load config from {}: {e}", config_dir.display());
            return ExitCode::FAILURE;
        }
    };
    config.apply_cli_overrides(&args);
    if let Err(e) = config.validate() {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    loam_log::init_logging(Some(&config_dir.join("logs")), cfg!(debug_assertions), Some(&config));

    match run(&config, args.steps) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("session failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config, steps: u64) -> Result<(), Box<dyn std::error::Error>> {
    let mut world = World::new(EngineSettings::from(config))?;
    let stop = Arc::new(AtomicBool::new(false));
    let renderer = spawn_renderer(world.exchange(), Arc::clone(&stop))?;

    let heading = Vec3::X;
    let mut position = Vec3::new(0.5, 0.0, 0.5);
    for step in 0..steps {
        let surface = world
            .surface_height(position.x.floor() as i32, position.z.floor() as i32)
            .unwrap_or(config.terrain.sea_level);
        position.y = surface as f32 + EYE_HEIGHT;
        world.step(position)?;

        if step > 0 && step % EDIT_INTERVAL == 0 {
            if let Some(pos) = world.remove_voxel(position, Vec3::NEG_Y)? {
                info!("dug {:?}", pos);
            }
            world.place_voxel(position, Vec3::NEG_Y, VoxelCode::Stone)?;
        }
        position += heading * WALK_SPEED;
    }

    let saved = world.save_all()?;
    stop.store(true, Ordering::Release);
    let sink = renderer.join().map_err(|_| "render thread panicked")?;

    info!(
        "session done: {} steps, {} resident, {} visible, {} saved on exit",
        world.steps(),
        world.region().loaded_count(),
        world.region().visible_count(),
        saved
    );
    info!(
        "renderer: {} meshes live ({} vertices), {} created, {} destroyed, {} reorigins",
        sink.vertices.len(),
        sink.vertices.values().sum::<usize>(),
        sink.created,
        sink.destroyed,
        sink.reorigins
    );
    Ok(())
}
