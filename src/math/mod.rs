//! Numerical kernels shared by the pricing engines: normal-distribution
//! functions, deterministic RNG streams, running statistics, and
//! correlation-matrix utilities.

pub mod correlation;
pub mod fast_rng;
pub mod normal;
pub mod stats;

pub use correlation::{
    cholesky_lower_psd, correlate_normals, is_positive_semidefinite, min_eigenvalue_symmetric,
    sample_correlated_normals, validate_correlation_matrix,
};
pub use fast_rng::{
    Xoshiro256PlusPlus, resolve_base_seed, sample_standard_normal, stream_seed, uniform_open01,
};
pub use normal::{normal_cdf, normal_inv_cdf, normal_pdf};
pub use stats::RunningStats;
