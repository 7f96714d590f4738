//! Documents and the candidate-validity signal.
//!
//! A document arrives as up to 50 sentence slots; trailing slots are padding
//! and must never be selected.  Upstream tokenization tells us how many
//! tokens each slot holds; a slot is a real candidate iff it has at least one
//! token.  Everything downstream (priors, searches, sweeps) works off the
//! resulting `n_sents` count.

use crate::error::Error;
use crate::tensor::{RewardTensor, MAX_SENTS};

/// One document's search inputs: id, valid-candidate count, and its
/// precomputed reward tensor.  Read-only to every search that borrows it.
#[derive(Debug, Clone)]
pub struct Document {
    /// Caller-assigned id; results are re-associated by this key.
    pub id: String,
    /// Count of real (non-padding) candidate sentences, `3..=50`.
    pub n_sents: usize,
    /// Precomputed per-triple rewards, `dim >= n_sents`.
    pub tensor: RewardTensor,
}

impl Document {
    /// Bundle a document, checking the counts a sweep relies on.
    ///
    /// Documents with fewer than 3 valid sentences cannot form a triple and
    /// are rejected here rather than deep inside a worker.
    pub fn new(id: impl Into<String>, n_sents: usize, tensor: RewardTensor) -> Result<Self, Error> {
        let n_sents = n_sents.min(MAX_SENTS);
        if n_sents < 3 {
            return Err(Error::TooFewSentences(n_sents));
        }
        if n_sents > tensor.dim() {
            return Err(Error::SentenceCountExceedsTensor {
                n_sents,
                dim: tensor.dim(),
            });
        }
        Ok(Self {
            id: id.into(),
            n_sents,
            tensor,
        })
    }
}

/// Derive `(n_sents, validity mask)` from per-sentence token counts.
///
/// A sentence is valid iff it has at least one token.  `n_sents` is capped at
/// [`MAX_SENTS`]; slots past the cap stay masked out even if non-empty.
#[must_use]
pub fn valid_sentence_count(token_counts: &[usize]) -> (usize, Vec<bool>) {
    let mut mask: Vec<bool> = token_counts.iter().map(|&n| n > 0).collect();
    for m in mask.iter_mut().skip(MAX_SENTS) {
        *m = false;
    }
    let n_sents = mask.iter().filter(|&&m| m).count();
    (n_sents, mask)
}
