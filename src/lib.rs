/// Generic traits and implementations for the parametric emission models
/// (full-covariance Gaussian; isotropic/Euclidean square-distance; categorical
/// scored by cross-entropy) and the discrete duration models (Poisson,
/// Negative-Binomial) used by EM-style clustering and hidden semi-Markov
/// drivers. Also holds the online sufficient-statistics accumulator consumed
/// by the stochastic (online) EM variant.
pub mod distr;

/// Error taxonomy shared by all fallible operations in the crate.
pub mod error;

pub use error::Error;
