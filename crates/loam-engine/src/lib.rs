//! The Loam simulation loop.
//!
//! [`World`] streams chunks around the player (loading persisted chunks,
//! generating the rest), keeps the region within its memory bounds, and turns
//! region diffs into meshes and light published to the render thread.

pub mod error;
pub mod loading;
pub mod settings;
pub mod world;

pub use error::EngineError;
pub use loading::{stream_order, wanted_chunks};
pub use settings::{EngineSettings, StreamingSettings};
pub use world::{StepReport, World};
