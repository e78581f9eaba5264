use nalgebra::*;
use std::fmt::Debug;

use crate::error::{Error, Result};

pub mod gaussian;

pub use gaussian::*;

pub mod square;

pub use square::*;

pub mod categorical;

pub use categorical::*;

pub mod duration;

pub use duration::*;

/// Trait shared by the parametric emission models. The immediate state of a
/// distribution is its parameter set (mean vector plus whatever scale the
/// family carries), mutated in place by the maximum-likelihood refits and
/// inspected by the scoring methods. Observation batches are N x D matrices
/// with one observation per row; scoring methods return one value per row.
///
/// The two refit entry points keep the hard-assignment (K-means style) and
/// soft-assignment (EM responsibility) M-steps distinct: `max_likelihood`
/// takes a non-negative weight per row, `max_likelihood_hard` a boolean
/// selection mask.
///
/// Refits require exclusive access (`&mut self`); scoring is a pure read and
/// may run concurrently across instances.
pub trait Distribution
    where Self : Debug
{

    /// Dimensionality of a single observation.
    fn dim(&self) -> usize;

    /// Current location parameter (centroid or probability profile).
    fn mean(&self) -> &DVector<f64>;

    /// Per-row assignment score of the batch under the current parameters
    /// (half squared Mahalanobis distance, squared Euclidean distance, or
    /// cross-entropy, depending on the family). Lower is closer.
    fn distances(&self, x : DMatrixSlice<'_, f64>) -> Result<DVector<f64>>;

    /// Per-row log-density (or log-likelihood) of the batch.
    fn log_pdf(&self, x : DMatrixSlice<'_, f64>) -> Result<DVector<f64>>;

    /// Per-row density. With `normalized = false` the constant normalizer is
    /// omitted, which preserves likelihood ratios while avoiding determinant
    /// under/overflow in high dimension.
    fn pdf(&self, x : DMatrixSlice<'_, f64>, normalized : bool) -> Result<DVector<f64>>;

    /// Closed-form weighted M-step: refits the parameters in place from the
    /// batch and a non-negative, not-all-zero weight vector (soft EM
    /// responsibilities or any other scheme the driver chooses).
    fn max_likelihood(&mut self, x : DMatrixSlice<'_, f64>, weights : DVectorSlice<'_, f64>) -> Result<()>;

    /// Hard-assignment M-step: refits from the unweighted rows selected by
    /// the mask (K-means style). Fails with `EmptySelection` when the mask
    /// selects nothing.
    fn max_likelihood_hard(&mut self, x : DMatrixSlice<'_, f64>, mask : &[bool]) -> Result<()>;

}

/// Discrete duration model over the integer support 1..=D, where D is the
/// fixed maximum duration declared at construction. A duration-aware sequence
/// driver reads the whole table once via `log_vec` and indexes into it during
/// its forward/backward passes. Parameters are fixed at construction; no
/// re-estimation happens in this crate.
pub trait DurationDistribution
    where Self : Debug
{

    /// Declared maximum duration D.
    fn max_duration(&self) -> usize;

    /// Log-PMF evaluated at each entry of `x`.
    fn log_pmf(&self, x : &[u64]) -> DVector<f64>;

    /// Precomputed log-PMF table over the full support: entry i holds
    /// `log_pmf(i + 1)`, so the vector has length exactly D.
    fn log_vec(&self) -> DVector<f64> {
        let support : Vec<u64> = (1..=self.max_duration() as u64).collect();
        self.log_pmf(&support)
    }

}

/// Compact decayed summary of a stream of weighted observations, sufficient
/// to recompute a maximum-likelihood parameter estimate without revisiting
/// past data. An accumulator is keyed to one cluster out of K at
/// construction; `online_update` applies one decay-and-mix transition per
/// incoming observation.
pub trait SufficientStatistics {

    /// Cluster this accumulator was seeded for.
    fn cluster(&self) -> usize;

    /// Number of clusters K the mixing transform runs over.
    fn n_clusters(&self) -> usize;

    /// Decay the accumulated statistics through the K x K transition/mixing
    /// matrix `trans`, then mix in the new observation at the seeded cluster
    /// with learning rate `step` in (0, 1]. Decreasing step sequences give
    /// the usual stochastic-approximation guarantees; that schedule is the
    /// caller's contract.
    fn online_update(&mut self, x : DVectorSlice<'_, f64>, trans : DMatrixSlice<'_, f64>, step : f64) -> Result<()>;

}

pub(crate) fn check_obs_dim(dim : usize, x : DMatrixSlice<'_, f64>) -> Result<()> {
    if x.ncols() != dim {
        return Err(Error::DimensionMismatch { expected : dim, found : x.ncols() });
    }
    Ok(())
}

pub(crate) fn check_step(step : f64) -> Result<()> {
    if !(step > 0.0 && step <= 1.0) {
        return Err(Error::InvalidStep(step));
    }
    Ok(())
}

/// Validates a soft weight vector against the batch and returns its sum.
pub(crate) fn check_weights(n : usize, weights : DVectorSlice<'_, f64>) -> Result<f64> {
    if weights.nrows() != n {
        return Err(Error::DimensionMismatch { expected : n, found : weights.nrows() });
    }
    if weights.iter().any(|w| *w < 0.0) {
        return Err(Error::DegenerateWeights);
    }
    let wsum = weights.sum();
    if wsum <= 0.0 {
        return Err(Error::DegenerateWeights);
    }
    Ok(wsum)
}

/// Weighted average of the rows of x: sum_i w_i x_i / sum_i w_i.
pub(crate) fn weighted_mean(x : DMatrixSlice<'_, f64>, weights : DVectorSlice<'_, f64>, wsum : f64) -> DVector<f64> {
    let mut mean = DVector::zeros(x.ncols());
    for (i, row) in x.row_iter().enumerate() {
        mean.axpy(weights[i], &row.transpose(), 1.0);
    }
    mean.unscale_mut(wsum);
    mean
}

/// Unweighted average of the rows selected by the mask, with the selection
/// count. Fails when the mask length disagrees with the batch or selects
/// nothing.
pub(crate) fn masked_mean(x : DMatrixSlice<'_, f64>, mask : &[bool]) -> Result<(DVector<f64>, usize)> {
    if mask.len() != x.nrows() {
        return Err(Error::DimensionMismatch { expected : x.nrows(), found : mask.len() });
    }
    let mut mean = DVector::zeros(x.ncols());
    let mut count = 0;
    for (i, row) in x.row_iter().enumerate() {
        if mask[i] {
            mean += row.transpose();
            count += 1;
        }
    }
    if count == 0 {
        return Err(Error::EmptySelection);
    }
    mean.unscale_mut(count as f64);
    Ok((mean, count))
}
