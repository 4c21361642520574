//! Mesh hand-off between the simulation thread and the render thread.
//!
//! The simulation thread publishes batches of [`MeshUpdate`]s; the render
//! thread polls with [`MeshExchange::try_take`], which never blocks. A ready
//! flag guarded by its own mutex and a condvar lets start-up code wait for the
//! first batch.

use std::mem;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Duration;

use loam_lighting::LightMap;
use loam_voxel::ChunkCoord;

use crate::builder::ChunkMeshes;

/// A change the renderer must apply, in publication order.
#[derive(Clone, Debug, PartialEq)]
pub enum MeshUpdate {
    /// Upload (or replace) the meshes and light of a chunk.
    Create {
        /// Vertex buffers.
        meshes: ChunkMeshes,
        /// Per-voxel skylight.
        light: LightMap,
    },
    /// Drop the meshes of a chunk.
    Destroy {
        /// The chunk that left the visible set.
        coord: ChunkCoord,
    },
    /// The player entered a new chunk; rebase rendering around it.
    Reorigin {
        /// The player's new chunk.
        origin: ChunkCoord,
    },
}

/// The renderer collaborator.
pub trait MeshSink {
    /// Uploads meshes for a chunk, replacing any previous upload.
    fn create(&mut self, meshes: ChunkMeshes, light: LightMap);
    /// Releases the meshes of a chunk.
    fn destroy(&mut self, coord: ChunkCoord);
    /// Rebases world-space rendering around `origin`.
    fn reorigin(&mut self, origin: ChunkCoord);
}

/// Replays a batch of updates into `sink`, in order.
pub fn apply_updates<S, I>(sink: &mut S, updates: I)
where
    S: MeshSink + ?Sized,
    I: IntoIterator<Item = MeshUpdate>,
{
    for update in updates {
        match update {
            MeshUpdate::Create { meshes, light } => sink.create(meshes, light),
            MeshUpdate::Destroy { coord } => sink.destroy(coord),
            MeshUpdate::Reorigin { origin } => sink.reorigin(origin),
        }
    }
}

/// Shared slot holding published updates until the render thread takes them.
#[derive(Default)]
pub struct MeshExchange {
    pending: Mutex<Vec<MeshUpdate>>,
    ready: Mutex<bool>,
    ready_signal: Condvar,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MeshExchange {
    /// Creates an empty exchange.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a batch and wakes any waiter. Blocks on the mesh lock.
    pub fn publish(&self, updates: Vec<MeshUpdate>) {
        if updates.is_empty() {
            return;
        }
        let mut pending = lock(&self.pending);
        pending.extend(updates);
        let mut ready = lock(&self.ready);
        *ready = true;
        self.ready_signal.notify_all();
    }

    /// Takes everything published so far.
    ///
    /// Returns `None` when nothing is pending or the simulation thread holds
    /// the lock.
    pub fn try_take(&self) -> Option<Vec<MeshUpdate>> {
        let mut pending = match self.pending.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        if pending.is_empty() {
            return None;
        }
        let batch = mem::take(&mut *pending);
        *lock(&self.ready) = false;
        Some(batch)
    }

    /// Blocks until a batch is pending or `timeout` elapses.
    pub fn wait_ready(&self, timeout: Duration) -> bool {
        let ready = lock(&self.ready);
        let (ready, _) = self
            .ready_signal
            .wait_timeout_while(ready, timeout, |ready| !*ready)
            .unwrap_or_else(PoisonError::into_inner);
        *ready
    }

    /// Number of updates waiting to be taken.
    pub fn pending_len(&self) -> usize {
        lock(&self.pending).len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    use loam_voxel::ChunkDims;

    #[derive(Default)]
    struct RecordingSink {
        events: Vec<String>,
        live: Vec<ChunkCoord>,
    }

    impl MeshSink for RecordingSink {
        fn create(&mut self, meshes: ChunkMeshes, _light: LightMap) {
            self.events.push(format!("create {:?}", meshes.coord));
            self.live.retain(|c| *c != meshes.coord);
            self.live.push(meshes.coord);
        }

        fn destroy(&mut self, coord: ChunkCoord) {
            self.events.push(format!("destroy {coord:?}"));
            self.live.retain(|c| *c != coord);
        }

        fn reorigin(&mut self, origin: ChunkCoord) {
            self.events.push(format!("reorigin {origin:?}"));
        }
    }

    fn create(coord: ChunkCoord) -> MeshUpdate {
        MeshUpdate::Create {
            meshes: ChunkMeshes::new(coord),
            light: LightMap::new_dark(ChunkDims::cubic(2)),
        }
    }

    #[test]
    fn test_take_returns_batches_in_order() {
        let exchange = MeshExchange::new();
        assert!(exchange.try_take().is_none());

        let a = ChunkCoord::new(0, 0, 0);
        let b = ChunkCoord::new(1, 0, 0);
        exchange.publish(vec![create(a)]);
        exchange.publish(vec![MeshUpdate::Destroy { coord: a }, create(b)]);
        assert_eq!(exchange.pending_len(), 3);

        let batch = exchange.try_take().expect("published");
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[1], MeshUpdate::Destroy { coord: a });
        assert!(exchange.try_take().is_none());
    }

    #[test]
    fn test_take_does_not_block_on_contention() {
        let exchange = MeshExchange::new();
        exchange.publish(vec![create(ChunkCoord::new(0, 0, 0))]);
        let held = lock(&exchange.pending);
        assert!(exchange.try_take().is_none());
        drop(held);
        assert!(exchange.try_take().is_some());
    }

    #[test]
    fn test_wait_ready_wakes_on_publish() {
        let exchange = Arc::new(MeshExchange::new());
        assert!(!exchange.wait_ready(Duration::from_millis(10)));

        let publisher = Arc::clone(&exchange);
        let handle = thread::spawn(move || {
            publisher.publish(vec![MeshUpdate::Reorigin {
                origin: ChunkCoord::new(2, 0, 2),
            }]);
        });
        assert!(exchange.wait_ready(Duration::from_secs(5)));
        handle.join().expect("publisher thread");
        assert!(exchange.try_take().is_some());
        assert!(!exchange.wait_ready(Duration::from_millis(1)));
    }

    #[test]
    fn test_apply_replays_and_repeated_create_replaces() {
        let a = ChunkCoord::new(0, 0, 0);
        let b = ChunkCoord::new(0, 1, 0);
        let mut sink = RecordingSink::default();
        apply_updates(
            &mut sink,
            vec![
                MeshUpdate::Reorigin { origin: a },
                create(a),
                create(b),
                create(a),
                MeshUpdate::Destroy { coord: b },
            ],
        );
        assert_eq!(sink.events.len(), 5);
        assert_eq!(sink.events[0], format!("reorigin {a:?}"));
        assert_eq!(sink.live, vec![a]);
    }
}
