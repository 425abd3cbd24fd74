//! Parallel surface generation worker pool.
//!
//! Workers only build surfaces (grid, heights, normals); they never touch the
//! registry. Results come back over a crossbeam channel and are stitched and
//! committed by the thread that owns the strategy.

use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, warn};
use std::sync::Arc;

use crate::displacement::{displace, HeightSource};
use crate::error::TerrainResult;
use crate::grid_builder::build_grid;
use crate::mesh_buffer::MeshBuffer;
use crate::normals::accumulate_normals;
use crate::tile::{TileId, TileRect};

/// Fraction of detected CPUs to use for worker threads (numerator).
const THREAD_CPU_NUMERATOR: usize = 3;
/// Fraction of detected CPUs to use for worker threads (denominator).
const THREAD_CPU_DENOMINATOR: usize = 4;
/// Minimum number of worker threads.
const MIN_WORKER_THREADS: usize = 2;
/// Minimum batch size for processing surface requests.
const MIN_BATCH_SIZE: usize = 16;
/// Default capacity of the request channel.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Grid, displacement and normals for one tile, without stitching.
pub fn build_surface(
    rect: &TileRect,
    sample_count: usize,
    heights: &dyn HeightSource,
) -> TerrainResult<MeshBuffer> {
    let mut surface = build_grid(rect, sample_count)?;
    displace(&mut surface, heights)?;
    accumulate_normals(&mut surface)?;
    Ok(surface)
}

/// Request sent from the owning thread to workers
pub struct SurfaceRequest {
    pub tile_id: TileId,
    pub rect: TileRect,
    pub sample_count: usize,
    pub heights: Arc<dyn HeightSource + Send + Sync>,
}

/// A finished (or failed) surface, ready for `commit_surface`
#[derive(Debug)]
pub struct SurfaceResult {
    pub tile_id: TileId,
    pub surface: TerrainResult<MeshBuffer>,
}

/// Worker pool for parallel surface generation
pub struct SurfaceWorkerPool {
    thread_count: usize,
    /// Dedicated rayon pool sized to `thread_count`; `None` falls back to the global pool
    pool: Option<rayon::ThreadPool>,
    request_tx: Sender<SurfaceRequest>,
    request_rx: Receiver<SurfaceRequest>,
    result_tx: Sender<SurfaceResult>,
    result_rx: Receiver<SurfaceResult>,
}

impl SurfaceWorkerPool {
    pub fn new(num_threads: usize, channel_capacity: usize) -> Self {
        let detected_cpus = num_cpus::get();
        let threads = if num_threads == 0 {
            ((detected_cpus * THREAD_CPU_NUMERATOR) / THREAD_CPU_DENOMINATOR)
                .max(MIN_WORKER_THREADS)
        } else {
            num_threads
        };

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("surface-worker-{}", i))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("[worker] falling back to the global rayon pool: {}", e);
                None
            }
        };

        let (request_tx, request_rx) = bounded(channel_capacity);
        // Unbounded so a finished surface is never dropped
        let (result_tx, result_rx) = unbounded();

        Self {
            thread_count: threads,
            pool,
            request_tx,
            request_rx,
            result_tx,
            result_rx,
        }
    }

    pub fn request_sender(&self) -> Sender<SurfaceRequest> {
        self.request_tx.clone()
    }

    pub fn result_receiver(&self) -> Receiver<SurfaceResult> {
        self.result_rx.clone()
    }

    /// Drain up to one batch of requests and build them in parallel.
    /// Returns the number of requests processed.
    pub fn process_requests(&self) -> usize {
        let batch_size = self.thread_count.max(MIN_BATCH_SIZE);
        let mut batch = Vec::with_capacity(batch_size);

        while batch.len() < batch_size {
            match self.request_rx.try_recv() {
                Ok(req) => batch.push(req),
                Err(_) => break,
            }
        }

        if batch.is_empty() {
            return 0;
        }

        let processed = batch.len();
        let result_tx = &self.result_tx;

        match &self.pool {
            Some(pool) => pool.install(|| build_batch(batch, result_tx)),
            None => build_batch(batch, result_tx),
        }

        debug!("[worker] built {} surfaces", processed);
        processed
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn shutdown(&mut self) {
        while self.request_rx.try_recv().is_ok() {}
        while self.result_rx.try_recv().is_ok() {}
    }
}

impl Default for SurfaceWorkerPool {
    fn default() -> Self {
        Self::new(0, DEFAULT_CHANNEL_CAPACITY)
    }
}

/// Spawn one task per request in the current rayon pool and wait for all of them.
fn build_batch(batch: Vec<SurfaceRequest>, result_tx: &Sender<SurfaceResult>) {
    rayon::scope(|scope| {
        for request in batch {
            let tx = result_tx.clone();
            scope.spawn(move |_| {
                let _ = tx.send(generate_surface_for_request(&request));
            });
        }
    });
}

fn generate_surface_for_request(request: &SurfaceRequest) -> SurfaceResult {
    SurfaceResult {
        tile_id: request.tile_id,
        surface: build_surface(&request.rect, request.sample_count, request.heights.as_ref()),
    }
}
