//! Informed-prior seeding from the reward tensor.
//!
//! Before a sweep, each document gets three deterministic "greedy baseline"
//! priors derived from its reward tensor: the triple with the best mean
//! reward, the one closest to the median, and the worst strictly-positive
//! one.  A prior puts weight `1/3` on its triple's positions and 0 elsewhere,
//! and is blended with the uniform prior by a sweep-controlled weight before
//! it reaches a search.
//!
//! These are pure functions of the tensor and `n_sents`; ties are broken by
//! first occurrence in flattened row-major order, so the same tensor always
//! seeds the same priors.

use crate::error::Error;
use crate::tensor::{unravel, RewardTensor};

/// Which greedy baseline seeds the informed prior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PriorChoice {
    /// Triple with the maximum mean reward.
    Best,
    /// Triple whose mean reward is nearest the 50th percentile.
    Median,
    /// Triple with the minimum strictly-positive mean reward.
    Worst,
}

impl PriorChoice {
    /// All choices in sweep-enumeration order.
    pub const ALL: [PriorChoice; 3] = [PriorChoice::Best, PriorChoice::Median, PriorChoice::Worst];

    /// Stable label used in result keys (`best` / `med` / `worst`).
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PriorChoice::Best => "best",
            PriorChoice::Median => "med",
            PriorChoice::Worst => "worst",
        }
    }
}

/// Derive the informed prior for `choice` over the top-left
/// `n_sents^3` block of mean rewards.
///
/// The returned vector has length `n_sents` with `1/3` on the positions of
/// the selected triple.  A triple with repeated indices (the block scan does
/// not exclude the diagonal) still gets `1/3` per *distinct* position.
///
/// Errors with [`Error::NoPositiveReward`] if `choice` is
/// [`PriorChoice::Worst`] and the block has no strictly positive entry.
pub fn informed_prior(
    tensor: &RewardTensor,
    n_sents: usize,
    choice: PriorChoice,
) -> Result<Vec<f64>, Error> {
    let n_sents = n_sents.min(tensor.dim());
    if n_sents < 3 {
        return Err(Error::TooFewSentences(n_sents));
    }

    let (i, j, k) = match choice {
        PriorChoice::Best => argmax_block(tensor, n_sents),
        PriorChoice::Worst => argmin_positive_block(tensor, n_sents)?,
        PriorChoice::Median => argmedian_block(tensor, n_sents),
    };

    let mut prior = vec![0.0; n_sents];
    for idx in [i, j, k] {
        prior[idx] = 1.0 / 3.0;
    }
    Ok(prior)
}

/// Blend an informed prior with the uniform prior: `(1 - w) * uniform + w * informed`.
///
/// `weight` must lie in `[0, 1]`; `0.0` recovers the uniform prior exactly.
pub fn blended_prior(informed: &[f64], weight: f64) -> Result<Vec<f64>, Error> {
    if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
        return Err(Error::InvalidPriorWeight(weight));
    }
    let n = informed.len();
    let uniform = 1.0 / n as f64;
    Ok(informed
        .iter()
        .map(|&p| (1.0 - weight) * uniform + weight * p)
        .collect())
}

/// Iterate block cells in flattened row-major order as `(flat, mean)`.
fn block_means(tensor: &RewardTensor, n_sents: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
    let dim = tensor.dim();
    (0..n_sents).flat_map(move |i| {
        (0..n_sents).flat_map(move |j| {
            (0..n_sents).map(move |k| {
                let block_flat = (i * n_sents + j) * n_sents + k;
                let tensor_flat = (i * dim + j) * dim + k;
                (block_flat, tensor.mean_at_flat(tensor_flat))
            })
        })
    })
}

fn argmax_block(tensor: &RewardTensor, n_sents: usize) -> (usize, usize, usize) {
    let mut best = (0usize, f64::NEG_INFINITY);
    for (flat, v) in block_means(tensor, n_sents) {
        // Strict comparison keeps the first occurrence on ties.
        if v > best.1 {
            best = (flat, v);
        }
    }
    unravel(best.0, n_sents)
}

fn argmin_positive_block(
    tensor: &RewardTensor,
    n_sents: usize,
) -> Result<(usize, usize, usize), Error> {
    let mut best: Option<(usize, f64)> = None;
    for (flat, v) in block_means(tensor, n_sents) {
        if v <= 0.0 {
            continue;
        }
        match best {
            Some((_, min)) if v >= min => {}
            _ => best = Some((flat, v)),
        }
    }
    let (flat, _) = best.ok_or(Error::NoPositiveReward { n_sents })?;
    Ok(unravel(flat, n_sents))
}

fn argmedian_block(tensor: &RewardTensor, n_sents: usize) -> (usize, usize, usize) {
    let mut values: Vec<f64> = block_means(tensor, n_sents).map(|(_, v)| v).collect();
    values.sort_unstable_by(f64::total_cmp);
    // Nearest-rank 50th percentile (no interpolation).
    let pos = (values.len() - 1) as f64 * 0.5;
    let median = values[pos.round() as usize];

    for (flat, v) in block_means(tensor, n_sents) {
        if v == median {
            return unravel(flat, n_sents);
        }
    }
    // Unreachable: `median` was drawn from the same scan.
    unravel(0, n_sents)
}
