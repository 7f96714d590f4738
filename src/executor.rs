//! Parallel execution of planned search jobs.
//!
//! The sweep is an embarrassingly-parallel map: every job owns its arm
//! statistics and RNG, and only borrows the reward tensor read-only, so no
//! locks are needed anywhere.  A fixed-size thread pool is built per batch
//! run and dropped when the run returns; each worker runs one search to
//! completion before taking the next (no preemption inside a search).
//!
//! Results arrive over a channel in completion order — only the association
//! between a [`ResultKey`] and its result is guaranteed, never temporal
//! order.  Per-job seeding makes every individual result reproducible
//! regardless of scheduling.
//!
//! Failure semantics: a search that fails (a data error for its document) is
//! returned as a *tagged* failure for that key, leaving every other job
//! untouched.  A panicking worker fails the whole batch loudly via scope
//! propagation rather than hanging or silently dropping results.

use std::sync::mpsc;

use tracing::debug;

use crate::document::Document;
use crate::error::Error;
use crate::search::{run_search, SearchResult};
use crate::sweep::{plan_sweep, ResultKey, SweepConfig, SweepPlan};

/// Worker-pool sizing for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutorConfig {
    /// Number of pool workers.  `None` (or `Some(0)`) uses the host's
    /// available parallelism.
    pub jobs: Option<usize>,
}

impl ExecutorConfig {
    fn worker_count(&self) -> usize {
        match self.jobs {
            Some(n) if n > 0 => n,
            _ => std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

/// Everything a batch run produced: completed results plus an explicit
/// account of every configuration that failed (during planning or execution).
///
/// A caller can never mistake a partial result set for success: check
/// [`SweepReport::is_complete`] or inspect `failures` directly.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// `(key, result)` pairs in arrival order from the pool.
    pub results: Vec<(ResultKey, SearchResult)>,
    /// Failed configurations with their cause.
    pub failures: Vec<(ResultKey, Error)>,
}

impl SweepReport {
    /// True iff every planned configuration produced a result.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Execute a planned sweep on a scoped fixed-size pool.
///
/// Planning failures carry over into the report's `failures`; execution
/// failures are appended as they arrive.  Returns `Err` only if the pool
/// itself cannot be built.
pub fn execute(plan: SweepPlan<'_>, cfg: &ExecutorConfig) -> Result<SweepReport, Error> {
    let SweepPlan {
        jobs,
        planning_failures,
    } = plan;
    let workers = cfg.worker_count();
    let n_jobs = jobs.len();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| Error::PoolBuild(e.to_string()))?;

    let mut pending: std::collections::BTreeMap<String, ResultKey> = jobs
        .iter()
        .map(|j| (j.key.label(), j.key.clone()))
        .collect();

    let (tx, rx) = mpsc::channel();
    pool.scope(|scope| {
        for job in jobs {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let outcome = run_search(job.n_sents, &job.config, Some(&job.prior), job.tensor);
                // The receiver outlives the scope; send cannot fail here.
                let _ = tx.send((job.key, outcome));
            });
        }
    });
    drop(tx);

    let mut report = SweepReport {
        results: Vec::with_capacity(n_jobs),
        failures: planning_failures,
    };
    for (key, outcome) in rx.try_iter() {
        pending.remove(&key.label());
        match outcome {
            Ok(result) => report.results.push((key, result)),
            Err(e) => report.failures.push((key, e)),
        }
    }
    // Every dispatched key must come back; anything left is accounted for
    // explicitly rather than silently missing from the result set.
    for (label, key) in pending {
        report.failures.push((key, Error::WorkerLost(label)));
    }

    debug!(
        workers,
        results = report.results.len(),
        failures = report.failures.len(),
        "sweep batch finished"
    );
    Ok(report)
}

/// Batch entry point: plan the sweep for `docs` and execute it.
pub fn run_sweep(
    docs: &[Document],
    sweep: &SweepConfig,
    exec: &ExecutorConfig,
) -> Result<SweepReport, Error> {
    let plan = plan_sweep(docs, sweep)?;
    execute(plan, exec)
}
