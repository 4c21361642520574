//! Chunk meshing: per-voxel face emission for cubes, billboards, and water,
//! plus the exchange that hands finished meshes to the render thread.

pub mod builder;
pub mod face_direction;
pub mod handoff;
pub mod texture;
pub mod vertex;

pub use builder::{ChunkMeshes, MeshParams, Neighbors, build_chunk_mesh};
pub use face_direction::FaceDirection;
pub use handoff::{MeshExchange, MeshSink, MeshUpdate, apply_updates};
pub use texture::{TextureLayer, texture_layer};
pub use vertex::{FreeVertex, PackedVertex};
