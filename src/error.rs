use thiserror::Error;

/// Failure modes surfaced by the distribution and sufficient-statistics
/// operations. Precondition violations fail fast with one of these variants;
/// numerical degeneracy inside otherwise valid inputs (a zero probability
/// entering a logarithm, a nearly-singular but still invertible covariance)
/// propagates as NaN/Inf in the returned values instead, so the caller can
/// decide how to regularize.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected : usize, found : usize },

    #[error("covariance matrix is singular")]
    SingularCovariance,

    #[error("sigma2 is unset: density is undefined for a pure-distance model")]
    MissingScale,

    #[error("weights must be non-negative and not sum to zero")]
    DegenerateWeights,

    #[error("selection mask selects no observations")]
    EmptySelection,

    #[error("step size {0} lies outside (0, 1]")]
    InvalidStep(f64),

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("cluster index {cluster} outside 0..{k}")]
    ClusterOutOfRange { cluster : usize, k : usize },

}

pub type Result<T> = std::result::Result<T, Error>;
