use nalgebra::*;
use super::*;
use crate::error::{Error, Result};
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;
use std::fmt::{self, Display};

/// Isotropic emission model restricted to covariance sigma2 * I. With
/// `sigma2` set it behaves as an isotropic Gaussian; with `sigma2` unset it
/// degrades to a pure Euclidean centroid for K-means-style assignment, where
/// only `distances` and the refits are defined and the density methods fail
/// with `Error::MissingScale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquareDistance {
    mean : DVector<f64>,
    sigma2 : Option<f64>
}

impl SquareDistance {

    pub fn new(mean : DVector<f64>, sigma2 : Option<f64>) -> Result<Self> {
        if let Some(s) = sigma2 {
            if s <= 0.0 {
                return Err(Error::InvalidParameter("sigma2 must be positive"));
            }
        }
        Ok(Self { mean, sigma2 })
    }

    pub fn sigma2(&self) -> Option<f64> {
        self.sigma2
    }

    /// Isotropic covariance view sigma2 * I at the model's own dimension, or
    /// None in pure-distance mode.
    pub fn cov(&self) -> Option<DMatrix<f64>> {
        let d = self.dim();
        self.sigma2.map(|s| DMatrix::identity(d, d) * s)
    }

    /// Squared Euclidean distance of each row to the mean. Never touches
    /// sigma2, which keeps the K-means assignment criterion well defined in
    /// pure-distance mode.
    fn sq_dists(&self, x : DMatrixSlice<'_, f64>) -> DVector<f64> {
        let mut dists = DVector::zeros(x.nrows());
        for (i, row) in x.row_iter().enumerate() {
            let diff = row.transpose() - &self.mean;
            dists[i] = diff.norm_squared();
        }
        dists
    }

    fn scale(&self) -> Result<f64> {
        self.sigma2.ok_or(Error::MissingScale)
    }

    /// Refit of the isotropic scale from the residuals against the freshly
    /// updated mean: sum_i w_i dist_i / (d * sum_i w_i). The 1/d factor is
    /// the exact argmax of the weighted isotropic log-density; at two
    /// dimensions it reduces to the half-quadratic 0.5 convention.
    fn refit_scale(&mut self, x : DMatrixSlice<'_, f64>, weights : DVectorSlice<'_, f64>, wsum : f64) {
        if self.sigma2.is_some() {
            let dists = self.sq_dists(x);
            self.sigma2 = Some(dists.dot(&weights) / (self.dim() as f64 * wsum));
        }
    }

}

impl Distribution for SquareDistance {

    fn dim(&self) -> usize {
        self.mean.nrows()
    }

    fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    fn distances(&self, x : DMatrixSlice<'_, f64>) -> Result<DVector<f64>> {
        check_obs_dim(self.dim(), x)?;
        Ok(self.sq_dists(x))
    }

    fn log_pdf(&self, x : DMatrixSlice<'_, f64>) -> Result<DVector<f64>> {
        check_obs_dim(self.dim(), x)?;
        let s = self.scale()?;
        let d = self.dim() as f64;
        let norm = -0.5 * d * (2.0 * PI).ln() - 0.5 * d * s.ln();
        Ok(self.sq_dists(x).map(|dist| norm - 0.5 * dist / s))
    }

    fn pdf(&self, x : DMatrixSlice<'_, f64>, normalized : bool) -> Result<DVector<f64>> {
        check_obs_dim(self.dim(), x)?;
        let s = self.scale()?;
        let d = self.dim() as f64;
        let dists = self.sq_dists(x);
        if normalized {
            let norm = 1.0 / (2.0 * PI * s).powf(d).sqrt();
            Ok(dists.map(|dist| norm * (-0.5 * dist / s).exp()))
        } else {
            Ok(dists.map(|dist| (-0.5 * dist / s).exp()))
        }
    }

    fn max_likelihood(&mut self, x : DMatrixSlice<'_, f64>, weights : DVectorSlice<'_, f64>) -> Result<()> {
        check_obs_dim(self.dim(), x)?;
        let wsum = check_weights(x.nrows(), weights)?;
        self.mean = weighted_mean(x, weights, wsum);
        self.refit_scale(x, weights, wsum);
        Ok(())
    }

    fn max_likelihood_hard(&mut self, x : DMatrixSlice<'_, f64>, mask : &[bool]) -> Result<()> {
        check_obs_dim(self.dim(), x)?;
        let (mean, count) = masked_mean(x, mask)?;
        self.mean = mean;
        if self.sigma2.is_some() {
            let dists = self.sq_dists(x);
            let selected : f64 = dists.iter().zip(mask.iter())
                .filter(|(_, sel)| **sel)
                .map(|(dist, _)| *dist)
                .sum();
            self.sigma2 = Some(selected / (self.dim() as f64 * count as f64));
        }
        Ok(())
    }

}

impl Display for SquareDistance {

    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sigma2 {
            Some(s) => write!(f, "SqDist({}; {})", self.mean.nrows(), s),
            None => write!(f, "SqDist({})", self.mean.nrows())
        }
    }

}
