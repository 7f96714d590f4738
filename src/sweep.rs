//! Sweep planning: one search configuration per (document, prior choice,
//! exploration constant, prior weight).
//!
//! A sweep runs the same UCB search under many configurations to map out how
//! the exploration constant and the informed-prior blend affect search
//! quality.  Planning is fully deterministic: the cross-product is enumerated
//! in a fixed nesting order, every job carries its originating document id,
//! and every job's RNG seed is derived from the sweep seed and the job key.
//!
//! Planning also front-loads every structural check: a malformed
//! configuration is rejected here and never reaches a worker.  A failing
//! per-document prior derivation does not abort the sweep; it tags the
//! affected configurations as planning failures so the caller sees exactly
//! which (document, configuration) pairs are missing.

use tracing::debug;

use crate::document::Document;
use crate::error::Error;
use crate::prior::{blended_prior, informed_prior, PriorChoice};
use crate::search::{SamplingBudget, SearchConfig};
use crate::stable_hash::stable_hash64;
use crate::tensor::RewardTensor;

/// Configuration for a full sweep over one document batch.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SweepConfig {
    /// Exploration constants to sweep, typically log-spaced.
    pub exploration_constants: Vec<f64>,
    /// Prior-weight blends in `[0, 1]`; `0.0` means pure uniform prior.
    pub prior_weights: Vec<f64>,
    /// Sampling-budget policy shared by every search in the sweep.
    pub budget: SamplingBudget,
    /// Master seed; per-job seeds are derived from it and the job key.
    pub seed: u64,
}

impl Default for SweepConfig {
    /// The reference sweep: 5 log-spaced constants spanning `1e4..1e8` and
    /// blends `0.0, 0.1, .., 0.5`.
    fn default() -> Self {
        Self {
            exploration_constants: log_spaced(4.0, 8.0, 5),
            prior_weights: (0..=5).map(|i| i as f64 / 10.0).collect(),
            budget: SamplingBudget::Fixed,
            seed: 0,
        }
    }
}

impl SweepConfig {
    /// Fail fast on any malformed axis value.
    pub fn validate(&self) -> Result<(), Error> {
        for &c in &self.exploration_constants {
            if !c.is_finite() || c < 0.0 {
                return Err(Error::InvalidExplorationConstant(c));
            }
        }
        for &w in &self.prior_weights {
            if !w.is_finite() || !(0.0..=1.0).contains(&w) {
                return Err(Error::InvalidPriorWeight(w));
            }
        }
        Ok(())
    }
}

/// `count` values spaced evenly on a log scale from `10^lo_exp` to `10^hi_exp`.
#[must_use]
pub fn log_spaced(lo_exp: f64, hi_exp: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![10f64.powf(lo_exp)],
        _ => {
            let step = (hi_exp - lo_exp) / (count - 1) as f64;
            (0..count)
                .map(|i| 10f64.powf(lo_exp + step * i as f64))
                .collect()
        }
    }
}

/// Identity of one search configuration; results are re-associated by it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResultKey {
    /// Originating document id.
    pub doc_id: String,
    /// Which greedy baseline seeded the prior.
    pub prior_choice: PriorChoice,
    /// Exploration constant used by this search.
    pub exploration_c: f64,
    /// Informed-prior blend weight used by this search.
    pub prior_weight: f64,
}

impl ResultKey {
    /// Stable string form, usable as a dump key:
    /// `<doc_id>_<best|med|worst>_<c>_<weight>`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.doc_id,
            self.prior_choice.label(),
            self.exploration_c,
            self.prior_weight
        )
    }
}

impl std::fmt::Display for ResultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// One dispatched unit of work: everything a worker needs to run one search.
///
/// The tensor is borrowed read-only from the document batch; arm statistics
/// live inside the search call itself, so jobs share nothing mutable.
#[derive(Debug, Clone)]
pub struct SearchJob<'a> {
    /// Identity carried through execution and back with the result.
    pub key: ResultKey,
    /// Search parameters with the derived per-job seed.
    pub config: SearchConfig,
    /// Blended prior, length `n_sents`.
    pub prior: Vec<f64>,
    /// Valid-candidate count for the document.
    pub n_sents: usize,
    /// The document's reward tensor.
    pub tensor: &'a RewardTensor,
}

/// Output of [`plan_sweep`]: runnable jobs plus the configurations that could
/// not be planned (e.g. a document with no positive reward for the worst
/// prior).
#[derive(Debug, Clone, Default)]
pub struct SweepPlan<'a> {
    /// Jobs in deterministic enumeration order:
    /// document, then prior choice, then constant, then weight.
    pub jobs: Vec<SearchJob<'a>>,
    /// Configurations that failed during planning, with the cause.
    pub planning_failures: Vec<(ResultKey, Error)>,
}

/// Enumerate the sweep cross-product for `docs` under `cfg`.
///
/// Returns `Err` only for a malformed [`SweepConfig`]; per-document prior
/// failures are reported in [`SweepPlan::planning_failures`] instead, one
/// entry per affected configuration.
pub fn plan_sweep<'a>(docs: &'a [Document], cfg: &SweepConfig) -> Result<SweepPlan<'a>, Error> {
    cfg.validate()?;

    let mut plan = SweepPlan::default();
    for doc in docs {
        for choice in PriorChoice::ALL {
            let informed = match informed_prior(&doc.tensor, doc.n_sents, choice) {
                Ok(p) => p,
                Err(e) => {
                    // Tag every configuration this prior would have fed.
                    for &c in &cfg.exploration_constants {
                        for &w in &cfg.prior_weights {
                            let key = ResultKey {
                                doc_id: doc.id.clone(),
                                prior_choice: choice,
                                exploration_c: c,
                                prior_weight: w,
                            };
                            plan.planning_failures.push((key, e.clone()));
                        }
                    }
                    continue;
                }
            };
            for &c in &cfg.exploration_constants {
                for &w in &cfg.prior_weights {
                    let key = ResultKey {
                        doc_id: doc.id.clone(),
                        prior_choice: choice,
                        exploration_c: c,
                        prior_weight: w,
                    };
                    let prior = blended_prior(&informed, w)?;
                    let config = SearchConfig {
                        exploration_c: c,
                        budget: cfg.budget,
                        seed: stable_hash64(cfg.seed, &key.label()),
                    };
                    plan.jobs.push(SearchJob {
                        key,
                        config,
                        prior,
                        n_sents: doc.n_sents,
                        tensor: &doc.tensor,
                    });
                }
            }
        }
    }

    debug!(
        documents = docs.len(),
        jobs = plan.jobs.len(),
        planning_failures = plan.planning_failures.len(),
        "planned sweep"
    );
    Ok(plan)
}
