use nalgebra::*;
use super::*;
use crate::error::{Error, Result};
use serde::{Serialize, Deserialize};
use std::fmt::{self, Display};

/// Categorical (multinomial) emission model over D categories, scored by the
/// cross-entropy -x . ln(theta), a KL-divergence-like assignment criterion
/// playing the role squared distance plays for the continuous families. Rows
/// of the observation batch are count or indicator vectors.
///
/// The probability profile is kept normalized by the caller: `max_likelihood`
/// over normalized rows yields a normalized profile, but nothing here
/// renormalizes after an arbitrary refit. A zero entry entering the logarithm
/// propagates as -inf in the scores, unmasked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Categorical {
    mean : DVector<f64>
}

impl Categorical {

    pub fn new(mean : DVector<f64>) -> Result<Self> {
        if mean.iter().any(|p| *p < 0.0) {
            return Err(Error::InvalidParameter("probabilities must be non-negative"));
        }
        if (mean.sum() - 1.0).abs() > 1e-8 {
            return Err(Error::InvalidParameter("probabilities must sum to one"));
        }
        Ok(Self { mean })
    }

    /// Uniform profile over n categories.
    pub fn flat(n : usize) -> Self {
        Self { mean : DVector::from_element(n, 1.0 / n as f64) }
    }

    fn log_mean(&self) -> DVector<f64> {
        self.mean.map(|p| p.ln())
    }

    /// Single-observation exponential-moving-average refit:
    /// mean <- (1 - step) * mean + step * x. A lightweight streaming
    /// alternative to the full sufficient-statistics bookkeeping.
    pub fn online_update(&mut self, x : DVectorSlice<'_, f64>, step : f64) -> Result<()> {
        check_step(step)?;
        if x.nrows() != self.dim() {
            return Err(Error::DimensionMismatch { expected : self.dim(), found : x.nrows() });
        }
        self.mean.axpy(step, &x, 1.0 - step);
        Ok(())
    }

    /// Seeds a fresh accumulator with a single observation assigned to
    /// `cluster` out of `k`.
    pub fn suff_stat(&self, x : DVectorSlice<'_, f64>, cluster : usize, k : usize) -> Result<CategoricalSuffStat> {
        if x.nrows() != self.dim() {
            return Err(Error::DimensionMismatch { expected : self.dim(), found : x.nrows() });
        }
        CategoricalSuffStat::new(x, cluster, k)
    }

    /// Stochastic-approximation M-step: reads a sufficient-statistics
    /// snapshot instead of raw data, setting
    /// mean <- (rho . phi) / (rho0 . phi), where phi is the driver's current
    /// length-K responsibility vector over cluster identity. A zero
    /// denominator propagates as NaN/Inf entries for the driver to detect.
    pub fn online_max_likelihood(&mut self, stat : &CategoricalSuffStat, phi : DVectorSlice<'_, f64>) -> Result<()> {
        if stat.rho.nrows() != self.dim() {
            return Err(Error::DimensionMismatch { expected : self.dim(), found : stat.rho.nrows() });
        }
        if phi.nrows() != stat.n_clusters() {
            return Err(Error::DimensionMismatch { expected : stat.n_clusters(), found : phi.nrows() });
        }
        let denom = stat.rho0.dot(&phi);
        self.mean = (&stat.rho * phi).unscale(denom);
        Ok(())
    }

}

impl Distribution for Categorical {

    fn dim(&self) -> usize {
        self.mean.nrows()
    }

    fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    fn distances(&self, x : DMatrixSlice<'_, f64>) -> Result<DVector<f64>> {
        check_obs_dim(self.dim(), x)?;
        let log_mean = self.log_mean();
        let mut dists = DVector::zeros(x.nrows());
        for (i, row) in x.row_iter().enumerate() {
            dists[i] = -row.transpose().dot(&log_mean);
        }
        Ok(dists)
    }

    fn log_pdf(&self, x : DMatrixSlice<'_, f64>) -> Result<DVector<f64>> {
        Ok(-self.distances(x)?)
    }

    // The categorical log-likelihood x . ln(theta) carries no separate
    // normalizer, so the flag changes nothing here.
    fn pdf(&self, x : DMatrixSlice<'_, f64>, _normalized : bool) -> Result<DVector<f64>> {
        Ok(self.log_pdf(x)?.map(|lp| lp.exp()))
    }

    fn max_likelihood(&mut self, x : DMatrixSlice<'_, f64>, weights : DVectorSlice<'_, f64>) -> Result<()> {
        check_obs_dim(self.dim(), x)?;
        let wsum = check_weights(x.nrows(), weights)?;
        self.mean = weighted_mean(x, weights, wsum);
        Ok(())
    }

    fn max_likelihood_hard(&mut self, x : DMatrixSlice<'_, f64>, mask : &[bool]) -> Result<()> {
        check_obs_dim(self.dim(), x)?;
        let (mean, _) = masked_mean(x, mask)?;
        self.mean = mean;
        Ok(())
    }

}

impl Display for Categorical {

    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cat({})", self.mean.nrows())
    }

}

/// Decayed sufficient statistics for the categorical family under online EM:
/// `rho0[k]` is a decayed count of assignments to cluster k, `rho[:, k]` the
/// matching decayed weighted sum of observation vectors, so that
/// `rho[:, k] / rho0[k]` tracks the running categorical mean of cluster k.
/// Both decay under the same step sequence and the same mixing transform,
/// which is what keeps that ratio meaningful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalSuffStat {
    cluster : usize,
    rho0 : DVector<f64>,
    rho : DMatrix<f64>
}

impl CategoricalSuffStat {

    pub fn new(x : DVectorSlice<'_, f64>, cluster : usize, k : usize) -> Result<Self> {
        if cluster >= k {
            return Err(Error::ClusterOutOfRange { cluster, k });
        }
        let rho0 = DVector::zeros(k);
        let mut rho = DMatrix::zeros(x.nrows(), k);
        rho.column_mut(cluster).copy_from(&x);
        Ok(Self { cluster, rho0, rho })
    }

    /// Decayed per-cluster assignment counts.
    pub fn rho0(&self) -> &DVector<f64> {
        &self.rho0
    }

    /// Decayed per-cluster weighted observation sums (one column per cluster).
    pub fn rho(&self) -> &DMatrix<f64> {
        &self.rho
    }

}

impl SufficientStatistics for CategoricalSuffStat {

    fn cluster(&self) -> usize {
        self.cluster
    }

    fn n_clusters(&self) -> usize {
        self.rho0.nrows()
    }

    fn online_update(&mut self, x : DVectorSlice<'_, f64>, trans : DMatrixSlice<'_, f64>, step : f64) -> Result<()> {
        check_step(step)?;
        let k = self.n_clusters();
        if trans.nrows() != k || trans.ncols() != k {
            return Err(Error::DimensionMismatch { expected : k, found : trans.nrows() });
        }
        if x.nrows() != self.rho.nrows() {
            return Err(Error::DimensionMismatch { expected : self.rho.nrows(), found : x.nrows() });
        }

        // rho0 is a row against the transition matrix: rho0 <- rho0^T . trans
        self.rho0 = (trans.transpose() * &self.rho0) * (1.0 - step);
        self.rho0[self.cluster] += step;

        self.rho = (&self.rho * trans) * (1.0 - step);
        self.rho.column_mut(self.cluster).axpy(step, &x, 1.0);
        Ok(())
    }

}
