//! Precomputed reward tensor over sentence triples.
//!
//! The tensor is produced upstream (every 3-sentence ROUGE score for a
//! document) and is strictly read-only here: searches look cells up, they
//! never write.  Storage is a dense row-major `dim^3` array of 3-component
//! reward vectors (e.g. ROUGE-1 / ROUGE-2 / ROUGE-L); the scalar optimization
//! target is always the mean of the 3 components.
//!
//! Lookups are order-independent: `(i, j, k)` and any permutation address the
//! same summary, so indices are canonicalized (sorted) before indexing.

use crate::error::Error;

/// Maximum number of candidate sentence slots per document.
pub const MAX_SENTS: usize = 50;

/// Number of sentences in an extractive summary (one triple per lookup).
pub const SUMMARY_LEN: usize = 3;

/// Number of sub-metrics per reward cell (three ROUGE variants).
pub const N_REWARD_METRICS: usize = 3;

/// Dense, read-only `dim^3` tensor of per-triple reward vectors.
///
/// Only entries whose indices are all `< n_sents` for the owning document are
/// meaningful; the producer zero-fills the rest.  All stored values must be
/// finite and non-negative — this is checked once at construction so lookups
/// stay cheap.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RewardTensor {
    dim: usize,
    cells: Vec<[f64; N_REWARD_METRICS]>,
}

impl RewardTensor {
    /// Build from a row-major `dim^3` cell vector.
    ///
    /// Returns [`Error::TensorSizeMismatch`] if the cell count does not match
    /// `dim^3`, and [`Error::InvalidRewardCell`] on the first NaN or negative
    /// sub-metric.
    pub fn from_cells(dim: usize, cells: Vec<[f64; N_REWARD_METRICS]>) -> Result<Self, Error> {
        let expected = dim * dim * dim;
        if cells.len() != expected {
            return Err(Error::TensorSizeMismatch {
                dim,
                expected,
                got: cells.len(),
            });
        }
        for (flat, cell) in cells.iter().enumerate() {
            for &v in cell {
                if !v.is_finite() || v < 0.0 {
                    let (i, j, k) = unravel(flat, dim);
                    return Err(Error::InvalidRewardCell(i, j, k, v));
                }
            }
        }
        Ok(Self { dim, cells })
    }

    /// Build by evaluating `f` at every `(i, j, k)` in row-major order.
    pub fn from_fn<F>(dim: usize, mut f: F) -> Result<Self, Error>
    where
        F: FnMut(usize, usize, usize) -> [f64; N_REWARD_METRICS],
    {
        let mut cells = Vec::with_capacity(dim * dim * dim);
        for i in 0..dim {
            for j in 0..dim {
                for k in 0..dim {
                    cells.push(f(i, j, k));
                }
            }
        }
        Self::from_cells(dim, cells)
    }

    /// Stored dimension (sentence slots covered by this tensor, `<= 50`).
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Reward vector for a triple, order-independent. O(1).
    pub fn rewards(&self, triple: [usize; 3]) -> Result<[f64; N_REWARD_METRICS], Error> {
        let [i, j, k] = canonical(triple);
        if k >= self.dim {
            return Err(Error::TripleOutOfBounds(i, j, k, self.dim));
        }
        Ok(self.cells[(i * self.dim + j) * self.dim + k])
    }

    /// Mean of the 3 sub-metrics for a triple — the scalar reward the
    /// bandit optimizes.
    pub fn mean_reward(&self, triple: [usize; 3]) -> Result<f64, Error> {
        let r = self.rewards(triple)?;
        Ok(r.iter().sum::<f64>() / N_REWARD_METRICS as f64)
    }

    /// Largest mean reward anywhere in the tensor (the "true maximum" that
    /// regret is measured against).
    #[must_use]
    pub fn max_mean_reward(&self) -> f64 {
        self.cells
            .iter()
            .map(|c| c.iter().sum::<f64>() / N_REWARD_METRICS as f64)
            .fold(0.0, f64::max)
    }

    /// Mean reward at a raw flattened position, without canonicalization.
    ///
    /// Used by the prior seeder, which scans the block in flattened order the
    /// same way the tensor producer laid it out.
    pub(crate) fn mean_at_flat(&self, flat: usize) -> f64 {
        let c = &self.cells[flat];
        c.iter().sum::<f64>() / N_REWARD_METRICS as f64
    }
}

/// Sort a triple into canonical non-decreasing order.
#[inline]
pub(crate) fn canonical(mut t: [usize; 3]) -> [usize; 3] {
    t.sort_unstable();
    t
}

/// Row-major `flat -> (i, j, k)` for a `dim^3` block.
#[inline]
pub(crate) fn unravel(flat: usize, dim: usize) -> (usize, usize, usize) {
    let d = dim.max(1);
    (flat / (d * d), (flat / d) % d, flat % d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> RewardTensor {
        // mean reward = (i + j + k) / 30, symmetric by construction.
        RewardTensor::from_fn(4, |i, j, k| {
            let s = (i + j + k) as f64 / 10.0;
            [s, s, s]
        })
        .unwrap()
    }

    #[test]
    fn lookup_is_order_independent() {
        let t = small();
        let a = t.mean_reward([0, 2, 3]).unwrap();
        let b = t.mean_reward([3, 0, 2]).unwrap();
        let c = t.mean_reward([2, 3, 0]).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn out_of_bounds_is_a_data_error() {
        let t = small();
        let err = t.mean_reward([0, 1, 4]).unwrap_err();
        assert!(matches!(err, Error::TripleOutOfBounds(0, 1, 4, 4)));
    }

    #[test]
    fn max_mean_reward_is_the_global_max() {
        let t = small();
        // Max at (3, 3, 3): (3+3+3)/10 = 0.9.
        assert!((t.max_mean_reward() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn negative_cell_rejected_at_construction() {
        let err = RewardTensor::from_fn(2, |i, j, k| {
            if (i, j, k) == (1, 0, 1) {
                [0.1, -0.2, 0.1]
            } else {
                [0.0; 3]
            }
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidRewardCell(1, 0, 1, v) if v == -0.2));
    }

    #[test]
    fn nan_cell_rejected_at_construction() {
        let err = RewardTensor::from_fn(2, |_, _, _| [f64::NAN, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidRewardCell(0, 0, 0, _)));
    }

    #[test]
    fn unravel_round_trips_row_major() {
        let dim = 5;
        let mut flat = 0;
        for i in 0..dim {
            for j in 0..dim {
                for k in 0..dim {
                    assert_eq!(unravel(flat, dim), (i, j, k));
                    flat += 1;
                }
            }
        }
    }
}
