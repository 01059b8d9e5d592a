//! # Scan Pipeline
//!
//! Moves every address of a [`RangeSet`] through two filtering stages:
//!
//! ```text
//! producer ──▶ [liveness × N] ──▶ [fingerprint × N] ──▶ results
//! ```
//!
//! Stages are joined by capacity-1 channels, so a busy downstream stage holds
//! back the one before it. Each channel closes when its last sender is dropped:
//! the producer owns the only stage-1 sender, and every worker owns a clone of
//! the sender into the next stage. A downstream channel therefore closes only
//! after every upstream worker has returned.
//!
//! Results arrive in completion order, not enumeration order.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use edgefind_common::network::RangeSet;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::{JoinError, JoinSet};
use tracing::debug;

use crate::probe::Probe;

const STAGE_CAPACITY: usize = 1;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline task failed")]
    Task(#[from] JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Liveness,
    Fingerprint,
}

/// Counters shared by all tasks of one run.
#[derive(Debug, Default)]
struct Counters {
    enumerated: AtomicU64,
    alive: AtomicU64,
    matched: AtomicU64,
}

impl Counters {
    fn passed(&self, stage: Stage) -> &AtomicU64 {
        match stage {
            Stage::Liveness => &self.alive,
            Stage::Fingerprint => &self.matched,
        }
    }

    fn snapshot(&self) -> PipelineSummary {
        PipelineSummary {
            enumerated: self.enumerated.load(Ordering::Relaxed),
            alive: self.alive.load(Ordering::Relaxed),
            matched: self.matched.load(Ordering::Relaxed),
        }
    }
}

/// How many addresses entered the run and survived each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub enumerated: u64,
    pub alive: u64,
    pub matched: u64,
}

/// Two-stage filter over an address stream.
pub struct Pipeline<L, F> {
    concurrency: usize,
    liveness: Arc<L>,
    fingerprint: Arc<F>,
}

impl<L: Probe, F: Probe> Pipeline<L, F> {
    /// `concurrency` workers are started for each stage (at least one).
    pub fn new(concurrency: usize, liveness: L, fingerprint: F) -> Self {
        Self {
            concurrency: concurrency.max(1),
            liveness: Arc::new(liveness),
            fingerprint: Arc::new(fingerprint),
        }
    }

    /// Starts the producer and both worker pools on the current runtime.
    pub fn spawn(self, ranges: RangeSet) -> PipelineHandle {
        let counters: Arc<Counters> = Arc::new(Counters::default());
        let mut tasks: JoinSet<()> = JoinSet::new();

        let (addr_tx, addr_rx) = mpsc::channel::<Ipv4Addr>(STAGE_CAPACITY);
        let (alive_tx, alive_rx) = mpsc::channel::<Ipv4Addr>(STAGE_CAPACITY);
        let (result_tx, result_rx) = mpsc::channel::<Ipv4Addr>(STAGE_CAPACITY);

        tasks.spawn(produce(ranges, addr_tx, counters.clone()));

        spawn_stage(
            &mut tasks,
            Stage::Liveness,
            self.concurrency,
            addr_rx,
            self.liveness,
            alive_tx,
            counters.clone(),
        );
        spawn_stage(
            &mut tasks,
            Stage::Fingerprint,
            self.concurrency,
            alive_rx,
            self.fingerprint,
            result_tx,
            counters.clone(),
        );

        PipelineHandle {
            results: result_rx,
            tasks,
            counters,
        }
    }
}

/// A running pipeline: read results with [`recv`](Self::recv), then
/// [`join`](Self::join).
pub struct PipelineHandle {
    results: mpsc::Receiver<Ipv4Addr>,
    tasks: JoinSet<()>,
    counters: Arc<Counters>,
}

impl PipelineHandle {
    /// Next matching address, or `None` once every stage has drained.
    pub async fn recv(&mut self) -> Option<Ipv4Addr> {
        self.results.recv().await
    }

    /// Waits for every task to exit.
    ///
    /// Results not yet read are discarded; dropping the result channel makes
    /// the remaining workers wind down.
    pub async fn join(self) -> Result<PipelineSummary, PipelineError> {
        let PipelineHandle {
            results,
            mut tasks,
            counters,
        } = self;
        drop(results);

        while let Some(joined) = tasks.join_next().await {
            joined?;
        }

        Ok(counters.snapshot())
    }

    /// Reads every result, then joins.
    pub async fn collect(mut self) -> Result<(Vec<Ipv4Addr>, PipelineSummary), PipelineError> {
        let mut found: Vec<Ipv4Addr> = Vec::new();
        while let Some(addr) = self.recv().await {
            found.push(addr);
        }
        let summary = self.join().await?;
        Ok((found, summary))
    }
}

async fn produce(ranges: RangeSet, tx: mpsc::Sender<Ipv4Addr>, counters: Arc<Counters>) {
    for addr in ranges.into_addresses() {
        if tx.send(addr).await.is_err() {
            debug!("Liveness stage closed early, stopping enumeration");
            break;
        }
        counters.enumerated.fetch_add(1, Ordering::Relaxed);
    }
    debug!(
        "Enumeration finished after {} addresses",
        counters.enumerated.load(Ordering::Relaxed)
    );
}

fn spawn_stage<P: Probe>(
    tasks: &mut JoinSet<()>,
    stage: Stage,
    workers: usize,
    input: mpsc::Receiver<Ipv4Addr>,
    probe: Arc<P>,
    output: mpsc::Sender<Ipv4Addr>,
    counters: Arc<Counters>,
) {
    let input = Arc::new(Mutex::new(input));
    for id in 0..workers {
        tasks.spawn(run_worker(
            stage,
            id,
            input.clone(),
            probe.clone(),
            output.clone(),
            counters.clone(),
        ));
    }
    // Only worker clones remain, so the next stage closes when the last worker exits.
    drop(output);
}

async fn run_worker<P: Probe>(
    stage: Stage,
    id: usize,
    input: Arc<Mutex<mpsc::Receiver<Ipv4Addr>>>,
    probe: Arc<P>,
    output: mpsc::Sender<Ipv4Addr>,
    counters: Arc<Counters>,
) {
    loop {
        // The lock is released before probing, so other workers can take the next address.
        let next: Option<Ipv4Addr> = input.lock().await.recv().await;
        let Some(addr) = next else {
            break;
        };

        if !probe.probe(addr).await {
            continue;
        }

        if output.send(addr).await.is_err() {
            debug!("{stage:?} worker {id}: downstream closed");
            break;
        }
        counters.passed(stage).fetch_add(1, Ordering::Relaxed);
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
