//! Chunk generation worker and chunk archives.
#![forbid(unsafe_code)]

mod archive;
mod queue;

use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, select, unbounded};
use cubit_blocks::BlockRegistry;
use cubit_chunk::{ChunkCoord, ChunkRecord};
use cubit_gen::TerrainGen;
use rayon::{ThreadPool, ThreadPoolBuilder};

pub use archive::{ChunkArchive, DirArchive, MemoryArchive};
pub use queue::PendingQueue;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenRequest {
    Generate { coord: ChunkCoord, epoch: u64 },
    Cancel { coord: ChunkCoord },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    Archive,
    Generated,
}

#[derive(Clone, Debug)]
pub struct GenResponse {
    pub coord: ChunkCoord,
    pub epoch: u64,
    pub record: ChunkRecord,
    pub origin: Origin,
    pub t_ms: u32,
}

struct GenCtx {
    terrain: TerrainGen,
    reg: Arc<BlockRegistry>,
    archive: Arc<dyn ChunkArchive>,
}

fn process_request(coord: ChunkCoord, epoch: u64, ctx: &GenCtx, tx: &Sender<GenResponse>) {
    let t0 = Instant::now();
    let found = match ctx.archive.load(coord) {
        Ok(found) => found,
        Err(e) => {
            log::warn!("archive load for {coord} failed: {e}; generating");
            None
        }
    };
    let (record, origin) = match found {
        Some(record) => (record, Origin::Archive),
        None => {
            let record = ctx.terrain.generate(&ctx.reg, coord).to_record();
            if let Err(e) = ctx.archive.save(&record) {
                log::warn!("archive save for {coord} failed: {e}");
            }
            (record, Origin::Generated)
        }
    };
    let t_ms = t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
    let res = GenResponse {
        coord,
        epoch,
        record,
        origin,
        t_ms,
    };
    if tx.send(res).is_err() {
        log::debug!("result channel closed; dropped chunk {coord}");
    }
}

struct Dispatcher {
    req_rx: Receiver<GenRequest>,
    res_tx: Sender<GenResponse>,
    pool: ThreadPool,
    ctx: Arc<GenCtx>,
    workers: usize,
    queued: Arc<AtomicUsize>,
    inflight: Arc<AtomicUsize>,
}

impl Dispatcher {
    // Requests wait here rather than in the pool so that cancels can still reach them.
    fn run(self) {
        let (done_tx, done_rx) = unbounded::<()>();
        let mut pending = PendingQueue::new();
        loop {
            while self.inflight.load(Ordering::Relaxed) < self.workers {
                let Some((coord, epoch)) = pending.pop() else {
                    break;
                };
                self.inflight.fetch_add(1, Ordering::Relaxed);
                let ctx = Arc::clone(&self.ctx);
                let tx = self.res_tx.clone();
                let done = done_tx.clone();
                self.pool.spawn(move || {
                    process_request(coord, epoch, ctx.as_ref(), &tx);
                    let _ = done.send(());
                });
            }
            self.queued.store(pending.len(), Ordering::Relaxed);
            select! {
                recv(self.req_rx) -> msg => match msg {
                    Ok(GenRequest::Generate { coord, epoch }) => {
                        if !pending.push(coord, epoch) {
                            log::trace!("generate {coord} already queued");
                        }
                    }
                    Ok(GenRequest::Cancel { coord }) => {
                        if pending.cancel(coord) {
                            log::debug!("cancelled queued generation of {coord}");
                        }
                    }
                    Err(_) => break,
                },
                recv(done_rx) -> _ => {
                    self.inflight.fetch_sub(1, Ordering::Relaxed);
                }
            }
        }
        if !pending.is_empty() {
            log::debug!("generation worker stopping with {} requests queued", pending.len());
        }
    }
}

/// Handle to the generation worker: a dispatcher thread feeding a rayon pool.
pub struct GenRuntime {
    req_tx: Option<Sender<GenRequest>>,
    res_rx: Receiver<GenResponse>,
    queued: Arc<AtomicUsize>,
    inflight: Arc<AtomicUsize>,
    dispatcher: Option<JoinHandle<()>>,
    pub workers: usize,
}

impl GenRuntime {
    pub fn new(
        terrain: TerrainGen,
        reg: Arc<BlockRegistry>,
        archive: Arc<dyn ChunkArchive>,
        workers: usize,
    ) -> Result<Self, Box<dyn Error>> {
        let workers = if workers == 0 {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
        } else {
            workers
        };
        let (req_tx, req_rx) = unbounded::<GenRequest>();
        let (res_tx, res_rx) = unbounded::<GenResponse>();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("cubit-gen-{i}"))
            .build()?;
        let queued = Arc::new(AtomicUsize::new(0));
        let inflight = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher {
            req_rx,
            res_tx,
            pool,
            ctx: Arc::new(GenCtx {
                terrain,
                reg,
                archive,
            }),
            workers,
            queued: Arc::clone(&queued),
            inflight: Arc::clone(&inflight),
        };
        let handle = thread::Builder::new()
            .name("cubit-gen-dispatch".into())
            .spawn(move || dispatcher.run())?;
        log::info!("generation worker started with {workers} threads");
        Ok(Self {
            req_tx: Some(req_tx),
            res_rx,
            queued,
            inflight,
            dispatcher: Some(handle),
            workers,
        })
    }

    pub fn submit(&self, req: GenRequest) {
        let Some(tx) = &self.req_tx else {
            return;
        };
        if tx.send(req).is_err() {
            log::warn!("generation worker gone; dropped {req:?}");
        }
    }

    #[inline]
    pub fn request(&self, coord: ChunkCoord, epoch: u64) {
        self.submit(GenRequest::Generate { coord, epoch });
    }

    #[inline]
    pub fn cancel(&self, coord: ChunkCoord) {
        self.submit(GenRequest::Cancel { coord });
    }

    pub fn drain_results(&self) -> Vec<GenResponse> {
        self.res_rx.try_iter().collect()
    }

    /// Blocks up to `timeout` for the next result.
    pub fn wait_result(&self, timeout: Duration) -> Option<GenResponse> {
        match self.res_rx.recv_timeout(timeout) {
            Ok(r) => Some(r),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// (queued, in flight)
    pub fn queue_debug_counts(&self) -> (usize, usize) {
        (
            self.queued.load(Ordering::Relaxed),
            self.inflight.load(Ordering::Relaxed),
        )
    }

    /// Stops accepting requests and waits for the dispatcher to exit.
    pub fn shutdown(&mut self) {
        self.req_tx.take();
        if let Some(handle) = self.dispatcher.take() {
            if handle.join().is_err() {
                log::warn!("generation dispatcher panicked");
            }
        }
    }
}

impl Drop for GenRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubit_gen::WorldGenConfig;

    fn ctx(archive: Arc<MemoryArchive>) -> GenCtx {
        let reg = Arc::new(BlockRegistry::builtin().unwrap());
        GenCtx {
            terrain: TerrainGen::new(&WorldGenConfig::default(), &reg).unwrap(),
            reg,
            archive,
        }
    }

    #[test]
    fn closed_result_channel_still_archives_the_chunk() {
        let archive = Arc::new(MemoryArchive::new());
        let (tx, rx) = unbounded();
        drop(rx);
        let coord = ChunkCoord::new(2, 0, -1);
        process_request(coord, 1, &ctx(Arc::clone(&archive)), &tx);
        assert!(archive.contains(coord));
    }

    #[test]
    fn archived_records_come_back_unchanged() {
        let archive = Arc::new(MemoryArchive::new());
        let (tx, rx) = unbounded();
        let coord = ChunkCoord::new(0, 0, 0);
        let ctx = ctx(Arc::clone(&archive));
        process_request(coord, 1, &ctx, &tx);
        process_request(coord, 2, &ctx, &tx);
        let first = rx.recv().unwrap();
        let second = rx.recv().unwrap();
        assert_eq!(first.origin, Origin::Generated);
        assert_eq!(second.origin, Origin::Archive);
        assert_eq!(second.epoch, 2);
        assert_eq!(first.record, second.record);
    }
}
