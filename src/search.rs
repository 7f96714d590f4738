//! UCB search over one document's sentence triples.
//!
//! Each candidate sentence is an arm; one iteration "pulls" three arms by
//! scoring the corresponding triple against the precomputed reward tensor.
//! The search keeps a running mean value per sentence and a visit count, and
//! spends a fixed sampling budget exploring the `O(n^3)` reward space instead
//! of scoring all `C(n, 3)` combinations.
//!
//! Notes:
//! - The search is **seedable**: all tie-break randomness comes from a
//!   per-instance `StdRng`, so the same seed, prior, and tensor reproduce the
//!   same output bit-for-bit.  Default construction uses seed 0.
//! - Arm statistics are owned by the running search and never shared; the
//!   tensor is borrowed read-only.  This is what makes the sweep layer an
//!   embarrassingly-parallel map.
//! - An unvisited arm scores `+inf`, so every sentence is tried before the
//!   confidence bonus starts discriminating.  This is the only place a
//!   division by zero can appear and it never surfaces as an error.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::str::FromStr;

use crate::error::Error;
use crate::tensor::{RewardTensor, MAX_SENTS, SUMMARY_LEN};

/// Sampling-budget policy for one search.
///
/// A closed enum rather than a mode string: an invalid mode is rejected when
/// parsing configuration, never at sampling time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SamplingBudget {
    /// Always 100 samples, independent of document length.
    #[default]
    Fixed,
    /// `2 * n_sents + 50` samples, scaling with document length.
    Linear,
}

impl SamplingBudget {
    /// Number of sampling iterations this policy grants for a document.
    #[must_use]
    pub fn n_samples(self, n_sents: usize) -> usize {
        match self {
            SamplingBudget::Fixed => 100,
            SamplingBudget::Linear => 2 * n_sents + 50,
        }
    }
}

impl FromStr for SamplingBudget {
    type Err = Error;

    /// Accepts the config vocabulary `"fix"` / `"fixed"` / `"linear"`.
    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "fix" | "fixed" => Ok(SamplingBudget::Fixed),
            "linear" => Ok(SamplingBudget::Linear),
            other => Err(Error::UnknownBudgetMode(other.to_string())),
        }
    }
}

/// Configuration for one independent search instance.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    /// Exploration constant `c`.  Larger values favor exploration; `0.0`
    /// degenerates to greedy exploitation once every arm has been visited.
    /// Must be finite and non-negative.
    pub exploration_c: f64,
    /// Sampling-budget policy.
    pub budget: SamplingBudget,
    /// Seed for the instance RNG (tie-break randomness).
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exploration_c: 1.0,
            budget: SamplingBudget::Fixed,
            seed: 0,
        }
    }
}

impl SearchConfig {
    /// Fail fast on a malformed configuration, before any sampling.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.exploration_c.is_finite() || self.exploration_c < 0.0 {
            return Err(Error::InvalidExplorationConstant(self.exploration_c));
        }
        Ok(())
    }
}

/// Output of one search: estimated per-sentence values and the regret of the
/// final choice.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchResult {
    /// Final running-mean value per sentence slot, length exactly 50;
    /// positions at or past `n_sents` are zero.
    pub q_vals: Vec<f64>,
    /// Tensor-wide max mean reward minus the mean reward of the triple the
    /// search settled on.  Always `>= 0`.
    pub regret: f64,
}

/// Per-sentence running statistics, exclusively owned by one search.
#[derive(Debug, Clone)]
struct ArmStats {
    n_visits: Vec<u64>,
    q_vals: Vec<f64>,
}

impl ArmStats {
    fn new(n_sents: usize) -> Self {
        Self {
            n_visits: vec![0; n_sents],
            q_vals: vec![0.0; n_sents],
        }
    }

    /// Fold one triple reward into the running mean of each selected arm.
    fn update(&mut self, triple: [usize; 3], reward: f64) {
        for &i in &triple {
            let visits = self.n_visits[i] as f64;
            self.q_vals[i] = (reward + self.q_vals[i] * visits) / (visits + 1.0);
            self.n_visits[i] += 1;
        }
    }

    fn total_visits(&self) -> u64 {
        self.n_visits.iter().sum()
    }
}

/// Run one UCB search.
///
/// `n_sents` is the count of valid candidate sentences (capped at 50);
/// `prior` is an optional non-negative bias vector of length `n_sents`
/// (uniform `1/n_sents` when `None`).  Returns the length-50 value vector and
/// the regret of the search's chosen triple.
///
/// Errors are all structural and raised before sampling starts: fewer than 3
/// valid sentences, a tensor smaller than `n_sents`, a negative or non-finite
/// exploration constant, or a malformed prior.
pub fn run_search(
    n_sents: usize,
    cfg: &SearchConfig,
    prior: Option<&[f64]>,
    tensor: &RewardTensor,
) -> Result<SearchResult, Error> {
    let (stats, regret) = run_to_completion(n_sents, cfg, prior, tensor)?;
    let mut q_vals = vec![0.0; MAX_SENTS];
    q_vals[..stats.q_vals.len()].copy_from_slice(&stats.q_vals);
    Ok(SearchResult { q_vals, regret })
}

/// Full search loop, returning the raw arm statistics (used directly by the
/// tests for visit-count invariants).
fn run_to_completion(
    n_sents: usize,
    cfg: &SearchConfig,
    prior: Option<&[f64]>,
    tensor: &RewardTensor,
) -> Result<(ArmStats, f64), Error> {
    let n_sents = n_sents.min(MAX_SENTS);
    if n_sents < SUMMARY_LEN {
        return Err(Error::TooFewSentences(n_sents));
    }
    if n_sents > tensor.dim() {
        return Err(Error::SentenceCountExceedsTensor {
            n_sents,
            dim: tensor.dim(),
        });
    }
    cfg.validate()?;

    let uniform = vec![1.0 / n_sents as f64; n_sents];
    let prior: &[f64] = match prior {
        Some(p) => {
            if p.len() != n_sents {
                return Err(Error::PriorLengthMismatch {
                    expected: n_sents,
                    got: p.len(),
                });
            }
            if let Some((i, &v)) = p.iter().enumerate().find(|(_, v)| !v.is_finite() || **v < 0.0)
            {
                return Err(Error::InvalidPriorEntry { index: i, value: v });
            }
            p
        }
        None => &uniform,
    };

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut stats = ArmStats::new(n_sents);
    let mut scores = vec![0.0f64; n_sents];
    let budget = cfg.budget.n_samples(n_sents);

    for n in 1..=budget {
        let ln2n = 2.0 * (n as f64).ln();
        for i in 0..n_sents {
            scores[i] = if stats.n_visits[i] == 0 {
                // Division by zero; an unvisited arm always wins.
                f64::INFINITY
            } else {
                stats.q_vals[i]
                    + cfg.exploration_c * prior[i] * (ln2n / stats.n_visits[i] as f64).sqrt()
            };
        }
        let triple = pick_top3(&scores, &mut rng);
        let reward = tensor.mean_reward(triple)?;
        stats.update(triple, reward);
    }

    let best = pick_top3(&stats.q_vals, &mut rng);
    let best_reward = tensor.mean_reward(best)?;
    let regret = tensor.max_mean_reward() - best_reward;

    Ok((stats, regret))
}

/// Select the 3 highest-scoring arms, randomizing among ties.
///
/// The threshold is the 3rd-largest score; every arm at or above it is
/// eligible, and 3 distinct arms are drawn uniformly from the eligible set.
/// This randomizes among exact ties (including the all-`+inf` first rounds)
/// instead of always favoring low indices.
fn pick_top3(scores: &[f64], rng: &mut StdRng) -> [usize; 3] {
    debug_assert!(scores.len() >= SUMMARY_LEN);

    let mut sorted = scores.to_vec();
    sorted.sort_unstable_by(|a, b| b.total_cmp(a));
    let threshold = sorted[SUMMARY_LEN - 1];

    let eligible: Vec<usize> = (0..scores.len())
        .filter(|&i| scores[i] >= threshold)
        .collect();

    let mut triple = [0usize; 3];
    for (slot, &i) in triple
        .iter_mut()
        .zip(eligible.choose_multiple(rng, SUMMARY_LEN))
    {
        *slot = i;
    }
    triple
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Symmetric tensor with mean reward `(i + j + k) / (3 * dim)`.
    fn ramp_tensor(dim: usize) -> RewardTensor {
        RewardTensor::from_fn(dim, |i, j, k| {
            let s = (i + j + k) as f64 / (3.0 * dim as f64);
            [s, s, s]
        })
        .unwrap()
    }

    #[test]
    fn budget_fixed_is_100_regardless_of_n_sents() {
        assert_eq!(SamplingBudget::Fixed.n_samples(10), 100);
        assert_eq!(SamplingBudget::Fixed.n_samples(50), 100);
    }

    #[test]
    fn budget_linear_scales_with_n_sents() {
        assert_eq!(SamplingBudget::Linear.n_samples(20), 90);
        assert_eq!(SamplingBudget::Linear.n_samples(3), 56);
    }

    #[test]
    fn unknown_budget_mode_is_a_configuration_error() {
        let err = "mcts".parse::<SamplingBudget>().unwrap_err();
        assert_eq!(err, Error::UnknownBudgetMode("mcts".into()));
        assert_eq!("fix".parse::<SamplingBudget>(), Ok(SamplingBudget::Fixed));
        assert_eq!(
            "linear".parse::<SamplingBudget>(),
            Ok(SamplingBudget::Linear)
        );
    }

    #[test]
    fn total_visits_is_three_per_iteration() {
        let tensor = ramp_tensor(10);
        for budget in [SamplingBudget::Fixed, SamplingBudget::Linear] {
            let cfg = SearchConfig {
                budget,
                ..SearchConfig::default()
            };
            let (stats, _) = run_to_completion(10, &cfg, None, &tensor).unwrap();
            assert_eq!(stats.total_visits(), 3 * budget.n_samples(10) as u64);
        }
    }

    #[test]
    fn tail_beyond_n_sents_is_zero() {
        let tensor = ramp_tensor(8);
        let res = run_search(8, &SearchConfig::default(), None, &tensor).unwrap();
        assert_eq!(res.q_vals.len(), MAX_SENTS);
        assert!(res.q_vals[8..].iter().all(|&q| q == 0.0));
    }

    #[test]
    fn regret_is_non_negative() {
        let tensor = ramp_tensor(12);
        for seed in 0..20 {
            let cfg = SearchConfig {
                seed,
                ..SearchConfig::default()
            };
            let res = run_search(12, &cfg, None, &tensor).unwrap();
            assert!(res.regret >= 0.0, "seed {seed}: regret {}", res.regret);
        }
    }

    #[test]
    fn same_seed_same_output() {
        let tensor = ramp_tensor(15);
        let cfg = SearchConfig {
            exploration_c: 1e4,
            budget: SamplingBudget::Linear,
            seed: 42,
        };
        let a = run_search(15, &cfg, None, &tensor).unwrap();
        let b = run_search(15, &cfg, None, &tensor).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn single_valid_triple_is_found_exactly() {
        // n_sents = 3: the only distinct triple is (0, 1, 2) at mean 0.8.
        let tensor = RewardTensor::from_fn(3, |i, j, k| {
            if i != j && j != k && i != k {
                [0.8; 3]
            } else {
                [0.0; 3]
            }
        })
        .unwrap();
        let res = run_search(3, &SearchConfig::default(), None, &tensor).unwrap();
        for i in 0..3 {
            assert!((res.q_vals[i] - 0.8).abs() < 1e-12, "q[{i}] = {}", res.q_vals[i]);
        }
        assert!(res.q_vals[3..].iter().all(|&q| q == 0.0));
        assert_eq!(res.regret, 0.0);
    }

    #[test]
    fn zero_exploration_is_greedy_after_first_visits() {
        // With c = 0 the score is exactly q_vals once every arm is visited.
        // For n_sents = 6 the first two iterations are forced exploration
        // (two disjoint triples); every remaining iteration re-selects the
        // better of the two, so visits concentrate on exactly 3 arms.
        let tensor = ramp_tensor(6);
        let cfg = SearchConfig {
            exploration_c: 0.0,
            ..SearchConfig::default()
        };
        let (stats, _) = run_to_completion(6, &cfg, None, &tensor).unwrap();
        let mut visits = stats.n_visits.clone();
        visits.sort_unstable();
        assert_eq!(visits, vec![1, 1, 1, 99, 99, 99]);
    }

    #[test]
    fn negative_exploration_constant_rejected() {
        let tensor = ramp_tensor(5);
        let cfg = SearchConfig {
            exploration_c: -1.0,
            ..SearchConfig::default()
        };
        let err = run_search(5, &cfg, None, &tensor).unwrap_err();
        assert_eq!(err, Error::InvalidExplorationConstant(-1.0));
    }

    #[test]
    fn short_document_rejected() {
        let tensor = ramp_tensor(2);
        let err = run_search(2, &SearchConfig::default(), None, &tensor).unwrap_err();
        assert_eq!(err, Error::TooFewSentences(2));
    }

    #[test]
    fn prior_length_mismatch_rejected() {
        let tensor = ramp_tensor(5);
        let prior = vec![0.2; 4];
        let err = run_search(5, &SearchConfig::default(), Some(&prior), &tensor).unwrap_err();
        assert_eq!(
            err,
            Error::PriorLengthMismatch {
                expected: 5,
                got: 4
            }
        );
    }

    #[test]
    fn negative_prior_entry_rejected() {
        let tensor = ramp_tensor(5);
        let prior = vec![0.2, 0.2, -0.1, 0.2, 0.2];
        let err = run_search(5, &SearchConfig::default(), Some(&prior), &tensor).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidPriorEntry {
                index: 2,
                value: -0.1
            }
        );
    }

    #[test]
    fn pick_top3_respects_a_strict_ordering() {
        let mut rng = StdRng::seed_from_u64(0);
        let scores = [0.1, 0.9, 0.3, 0.8, 0.7];
        for _ in 0..50 {
            let mut t = pick_top3(&scores, &mut rng);
            t.sort_unstable();
            assert_eq!(t, [1, 3, 4]);
        }
    }

    #[test]
    fn pick_top3_randomizes_among_ties() {
        let mut rng = StdRng::seed_from_u64(7);
        let scores = [0.5; 6];
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            let mut t = pick_top3(&scores, &mut rng);
            t.sort_unstable();
            seen.insert(t);
        }
        assert!(seen.len() > 1, "ties should not collapse to one triple");
    }

    proptest! {
        #[test]
        fn search_output_is_well_formed(
            n_sents in 3usize..20,
            seed in any::<u64>(),
            c in 0.0f64..1e6,
        ) {
            let tensor = ramp_tensor(n_sents);
            let cfg = SearchConfig { exploration_c: c, budget: SamplingBudget::Linear, seed };
            let res = run_search(n_sents, &cfg, None, &tensor).unwrap();
            prop_assert_eq!(res.q_vals.len(), MAX_SENTS);
            prop_assert!(res.regret >= 0.0);
            for (i, &q) in res.q_vals.iter().enumerate() {
                prop_assert!(q.is_finite());
                prop_assert!(q >= 0.0);
                if i >= n_sents {
                    prop_assert_eq!(q, 0.0);
                }
            }
        }

        #[test]
        fn search_is_deterministic_under_seed(
            n_sents in 3usize..15,
            seed in any::<u64>(),
        ) {
            let tensor = ramp_tensor(n_sents);
            let cfg = SearchConfig { exploration_c: 1e4, budget: SamplingBudget::Fixed, seed };
            let a = run_search(n_sents, &cfg, None, &tensor).unwrap();
            let b = run_search(n_sents, &cfg, None, &tensor).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
