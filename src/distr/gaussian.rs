use nalgebra::*;
use super::*;
use crate::error::{Error, Result};
use serde::{Serialize, Deserialize};
use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::PI;
use std::fmt::{self, Display};

/// Full-covariance multivariate normal, parametrized by a mean vector (D x 1)
/// and a symmetric positive-definite covariance (D x D). This is the richest
/// emission family: scoring goes through the inverse covariance, so a
/// singular covariance surfaces as `Error::SingularCovariance` rather than a
/// silently regularized value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gaussian {
    mean : DVector<f64>,
    cov : DMatrix<f64>
}

impl Gaussian {

    pub fn new(mean : DVector<f64>, cov : DMatrix<f64>) -> Result<Self> {
        if cov.nrows() != cov.ncols() || cov.nrows() != mean.nrows() {
            return Err(Error::DimensionMismatch { expected : mean.nrows(), found : cov.nrows() });
        }
        Ok(Self { mean, cov })
    }

    /// Standard normal of the given dimension (zero mean, identity covariance).
    pub fn standard(dim : usize) -> Self {
        Self { mean : DVector::zeros(dim), cov : DMatrix::identity(dim, dim) }
    }

    pub fn cov(&self) -> &DMatrix<f64> {
        &self.cov
    }

    /// Half squared Mahalanobis distance of each row, together with the
    /// covariance determinant (the LU factorization yields both at once).
    fn quad_forms(&self, x : DMatrixSlice<'_, f64>) -> Result<(DVector<f64>, f64)> {
        let lu = LU::new(self.cov.clone());
        let det = lu.determinant();
        let prec = lu.try_inverse().ok_or(Error::SingularCovariance)?;
        let mut dists = DVector::zeros(x.nrows());
        for (i, row) in x.row_iter().enumerate() {
            let diff = row.transpose() - &self.mean;
            dists[i] = 0.5 * (&prec * &diff).dot(&diff);
        }
        Ok((dists, det))
    }

    /// Draws n i.i.d. observations from the current parameters (one per row),
    /// via the Cholesky factor of the covariance.
    pub fn sample<R : Rng>(&self, n : usize, rng : &mut R) -> Result<DMatrix<f64>> {
        let chol = Cholesky::new(self.cov.clone()).ok_or(Error::SingularCovariance)?;
        let d = self.dim();
        let mut out = DMatrix::zeros(n, d);
        for i in 0..n {
            let z : DVector<f64> = DVector::from_fn(d, |_, _| rng.sample(StandardNormal));
            let y = &self.mean + chol.l() * z;
            out.row_mut(i).copy_from(&y.transpose());
        }
        Ok(out)
    }

}

impl Distribution for Gaussian {

    fn dim(&self) -> usize {
        self.mean.nrows()
    }

    fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    fn distances(&self, x : DMatrixSlice<'_, f64>) -> Result<DVector<f64>> {
        check_obs_dim(self.dim(), x)?;
        let (dists, _) = self.quad_forms(x)?;
        Ok(dists)
    }

    fn log_pdf(&self, x : DMatrixSlice<'_, f64>) -> Result<DVector<f64>> {
        check_obs_dim(self.dim(), x)?;
        let d = self.dim() as f64;
        let (dists, det) = self.quad_forms(x)?;
        let norm = -0.5 * d * (2.0 * PI).ln() - 0.5 * det.ln();
        Ok(dists.map(|m| norm - m))
    }

    fn pdf(&self, x : DMatrixSlice<'_, f64>, normalized : bool) -> Result<DVector<f64>> {
        check_obs_dim(self.dim(), x)?;
        let d = self.dim() as f64;
        let (dists, det) = self.quad_forms(x)?;
        if normalized {
            let norm = 1.0 / ((2.0 * PI).powf(d) * det).sqrt();
            Ok(dists.map(|m| norm * (-m).exp()))
        } else {
            Ok(dists.map(|m| (-m).exp()))
        }
    }

    fn max_likelihood(&mut self, x : DMatrixSlice<'_, f64>, weights : DVectorSlice<'_, f64>) -> Result<()> {
        check_obs_dim(self.dim(), x)?;
        let wsum = check_weights(x.nrows(), weights)?;
        let mean = weighted_mean(x, weights, wsum);
        let mut cov = DMatrix::zeros(self.dim(), self.dim());
        for (i, row) in x.row_iter().enumerate() {
            let err = row.transpose() - &mean;
            let mut err_prod = &err * err.transpose();
            err_prod.scale_mut(weights[i]);
            cov += err_prod;
        }
        cov.unscale_mut(wsum);
        self.mean = mean;
        self.cov = cov;
        Ok(())
    }

    fn max_likelihood_hard(&mut self, x : DMatrixSlice<'_, f64>, mask : &[bool]) -> Result<()> {
        check_obs_dim(self.dim(), x)?;
        let (mean, count) = masked_mean(x, mask)?;
        let mut cov = DMatrix::zeros(self.dim(), self.dim());
        for (i, row) in x.row_iter().enumerate() {
            if mask[i] {
                let err = row.transpose() - &mean;
                cov += &err * err.transpose();
            }
        }
        cov.unscale_mut(count as f64);
        self.mean = mean;
        self.cov = cov;
        Ok(())
    }

}

impl Display for Gaussian {

    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gauss({})", self.mean.nrows())
    }

}
