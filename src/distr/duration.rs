use nalgebra::*;
use super::*;
use crate::error::{Error, Result};
use serde::{Serialize, Deserialize};
use rand::Rng;
use statrs::function::gamma::ln_gamma;
use std::fmt::{self, Display};

/// Poisson duration model with rate lambda > 0, truncated for table purposes
/// at the declared maximum duration D (the PMF itself is the untruncated
/// one; `log_vec` just stops reading at D).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoissonDuration {
    lambda : f64,
    max_duration : usize
}

impl PoissonDuration {

    pub fn new(lambda : f64, max_duration : usize) -> Result<Self> {
        if lambda <= 0.0 || !lambda.is_finite() {
            return Err(Error::InvalidParameter("lambda must be positive and finite"));
        }
        if max_duration == 0 {
            return Err(Error::InvalidParameter("maximum duration must be at least one"));
        }
        Ok(Self { lambda, max_duration })
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn sample<R : Rng>(&self, n : usize, rng : &mut R) -> Vec<u64> {
        // lambda was validated at construction, so the sampler is well defined.
        let pois = rand_distr::Poisson::new(self.lambda).unwrap();
        (0..n).map(|_| {
            let draw : f64 = rng.sample(pois);
            draw as u64
        }).collect()
    }

}

impl DurationDistribution for PoissonDuration {

    fn max_duration(&self) -> usize {
        self.max_duration
    }

    fn log_pmf(&self, x : &[u64]) -> DVector<f64> {
        DVector::from_iterator(x.len(), x.iter().map(|k| {
            *k as f64 * self.lambda.ln() - self.lambda - ln_gamma(*k as f64 + 1.0)
        }))
    }

}

impl Display for PoissonDuration {

    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pois({}; {})", self.lambda, self.max_duration)
    }

}

/// Negative-binomial duration model counting failures before the r-th
/// success, with success probability p. Follows the (r, p) convention of
/// scipy's nbinom: log pmf(k) = ln G(k + r) - ln G(r) - ln G(k + 1)
/// + r ln p + k ln(1 - p). Real-valued r > 0 is allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegativeBinomial {
    r : f64,
    p : f64,
    max_duration : usize
}

impl NegativeBinomial {

    pub fn new(r : f64, p : f64, max_duration : usize) -> Result<Self> {
        if r <= 0.0 || !r.is_finite() {
            return Err(Error::InvalidParameter("r must be positive and finite"));
        }
        if !(p > 0.0 && p < 1.0) {
            return Err(Error::InvalidParameter("p must lie strictly between zero and one"));
        }
        if max_duration == 0 {
            return Err(Error::InvalidParameter("maximum duration must be at least one"));
        }
        Ok(Self { r, p, max_duration })
    }

    pub fn r(&self) -> f64 {
        self.r
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    /// Draws via the gamma-Poisson mixture: a rate from
    /// Gamma(r, (1 - p) / p), then a Poisson count at that rate.
    pub fn sample<R : Rng>(&self, n : usize, rng : &mut R) -> Vec<u64> {
        let scale = (1.0 - self.p) / self.p;
        // r and p were validated at construction.
        let gamma = rand_distr::Gamma::new(self.r, scale).unwrap();
        (0..n).map(|_| {
            let rate : f64 = rng.sample(gamma);
            // A zero rate can underflow out of the gamma draw for small r.
            match rand_distr::Poisson::new(rate) {
                Ok(pois) => {
                    let draw : f64 = rng.sample(pois);
                    draw as u64
                },
                Err(_) => 0
            }
        }).collect()
    }

}

impl DurationDistribution for NegativeBinomial {

    fn max_duration(&self) -> usize {
        self.max_duration
    }

    fn log_pmf(&self, x : &[u64]) -> DVector<f64> {
        let (r, p) = (self.r, self.p);
        DVector::from_iterator(x.len(), x.iter().map(|k| {
            let k = *k as f64;
            ln_gamma(k + r) - ln_gamma(r) - ln_gamma(k + 1.0)
                + r * p.ln() + k * (1.0 - p).ln()
        }))
    }

}

impl Display for NegativeBinomial {

    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NegBin({}, {}; {})", self.r, self.p, self.max_duration)
    }

}
