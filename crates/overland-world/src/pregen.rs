//! Background chunk pregeneration.
//!
//! A single worker thread pulls chunk coordinates from a queue and asks the
//! shared [`ChunkManager`] for each one, so chunks around the player are ready
//! before they are first read.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use overland_common::ChunkCoord;
use tracing::{debug, info, warn};

use crate::streaming::{spiral_chunks, ChunkManager};

/// Worker thread name.
const WORKER_NAME: &str = "overland-pregen";

/// Handle to the pregeneration worker.
///
/// Dropping the handle shuts the worker down after it drains its queue.
#[derive(Debug)]
pub struct Pregenerator {
    requests: Option<Sender<ChunkCoord>>,
    completed: Receiver<ChunkCoord>,
    worker: Option<JoinHandle<()>>,
}

impl Pregenerator {
    /// Starts the worker thread.
    pub fn spawn(manager: Arc<ChunkManager>) -> io::Result<Self> {
        let (request_tx, request_rx) = unbounded::<ChunkCoord>();
        let (done_tx, done_rx) = unbounded();

        let worker = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                for coord in request_rx {
                    manager.chunk(coord);
                    if done_tx.send(coord).is_err() {
                        break;
                    }
                }
                debug!("Pregeneration worker exiting");
            })?;

        info!("Started chunk pregeneration worker");
        Ok(Self {
            requests: Some(request_tx),
            completed: done_rx,
            worker: Some(worker),
        })
    }

    /// Queues one chunk. Returns false once the worker has stopped.
    pub fn request(&self, coord: ChunkCoord) -> bool {
        self.requests
            .as_ref()
            .is_some_and(|tx| tx.send(coord).is_ok())
    }

    /// Queues every chunk within `radius` rings of `center`, spiral order.
    ///
    /// Returns the number of chunks queued.
    pub fn request_area(&self, center: ChunkCoord, radius: u32) -> usize {
        spiral_chunks(center, radius)
            .into_iter()
            .take_while(|&coord| self.request(coord))
            .count()
    }

    /// Coordinates finished since the last call.
    pub fn drain_completed(&self) -> Vec<ChunkCoord> {
        self.completed.try_iter().collect()
    }

    /// Closes the queue and waits for the worker to finish what was queued.
    pub fn shutdown(&mut self) {
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Pregeneration worker panicked");
            }
        }
    }
}

impl Drop for Pregenerator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
