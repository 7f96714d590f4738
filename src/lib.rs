//! `trisum`: deterministic combinatorial-bandit search for extractive
//! 3-sentence summaries.
//!
//! Given a document with up to 50 candidate sentences and a precomputed
//! tensor of ROUGE-style rewards over all sentence triples, `trisum`
//! estimates which 3-sentence subset best approximates the reference summary
//! — without scoring all `C(n, 3)` combinations.  Each sentence is a bandit
//! arm; one iteration "pulls" three arms by looking up that triple's reward,
//! and a UCB rule decides which triple to sample next.
//!
//! **Goals:**
//! - **Deterministic by default**: same seed + tensor + configuration → the
//!   same output, bit-for-bit, serial or parallel.  All tie-break randomness
//!   flows through a per-search seeded RNG; there is no process-global
//!   random state.
//! - **Read-only data, exclusive statistics**: reward tensors are borrowed
//!   immutably by every search; arm statistics are owned by exactly one
//!   search instance.  The sweep layer is an embarrassingly-parallel map
//!   with no locks.
//! - **Fail fast, fail loud**: malformed configurations are rejected before
//!   any sampling or dispatch; a batch run reports exactly which
//!   (document, configuration) pairs failed instead of returning a silently
//!   incomplete list.
//!
//! **Layers:**
//! - [`RewardTensor`]: dense read-only `dim^3` reward store with O(1)
//!   order-independent triple lookups.
//! - [`run_search`]: one UCB search → per-sentence value estimates
//!   ([`SearchResult::q_vals`], length 50) and a regret delta.
//! - [`informed_prior`] / [`blended_prior`]: best/median/worst greedy
//!   baselines from the tensor, blended with the uniform prior to bias
//!   early exploration.
//! - [`plan_sweep`]: the cross-product of documents × prior choices ×
//!   exploration constants × prior weights, enumerated deterministically
//!   with per-job derived seeds.
//! - [`run_sweep`] / [`execute`]: fixed-size worker pool, one whole search
//!   per unit of work, results keyed by [`ResultKey`] in arrival order.
//!
//! **Non-goals:** no gradients, no learning of the bandit's own parameters,
//! no persistence format (dump [`ResultKey::label`]-keyed results however
//! you like), no UI.
//!
//! # Example
//!
//! ```rust
//! use trisum::{
//!     run_sweep, Document, ExecutorConfig, RewardTensor, SweepConfig,
//! };
//!
//! // A toy tensor: triples of pairwise-distinct sentences score by index sum.
//! let tensor = RewardTensor::from_fn(5, |i, j, k| {
//!     if i != j && j != k && i != k {
//!         let s = (i + j + k) as f64 / 12.0;
//!         [s, s, s]
//!     } else {
//!         [0.0; 3]
//!     }
//! })
//! .unwrap();
//! let docs = vec![Document::new("doc-0", 5, tensor).unwrap()];
//!
//! let report = run_sweep(&docs, &SweepConfig::default(), &ExecutorConfig::default()).unwrap();
//! assert!(report.is_complete());
//! for (key, result) in &report.results {
//!     assert_eq!(key.doc_id, "doc-0");
//!     assert_eq!(result.q_vals.len(), 50);
//!     assert!(result.regret >= 0.0);
//! }
//! ```

mod document;
mod error;
mod executor;
mod prior;
mod search;
mod stable_hash;
mod sweep;
mod tensor;

pub use document::{valid_sentence_count, Document};
pub use error::{Error, ErrorKind};
pub use executor::{execute, run_sweep, ExecutorConfig, SweepReport};
pub use prior::{blended_prior, informed_prior, PriorChoice};
pub use search::{run_search, SamplingBudget, SearchConfig, SearchResult};
pub use stable_hash::stable_hash64;
pub use sweep::{log_spaced, plan_sweep, ResultKey, SearchJob, SweepConfig, SweepPlan};
pub use tensor::{RewardTensor, MAX_SENTS, N_REWARD_METRICS, SUMMARY_LEN};
