//! # rocket-ts
//!
//! **RandOm Convolutional KErnel Transform** for time series.
//!
//! ROCKET turns a batch of time series into a dense feature matrix by
//! convolving every series with a large bank of randomly generated 1-D
//! kernels (random length, weights, bias, dilation and padding) and keeping
//! two summary statistics per kernel: the proportion of positive responses
//! (ppv) and the maximum response. A plain linear model on top of those
//! features is competitive with far heavier architectures.
//!
//! Reference: Dempster, Petitjean, Webb (2019) — "ROCKET: Exceptionally
//! fast and accurate time series classification using random convolutional
//! kernels", arXiv:1910.13051.
//!
//! ## Components
//!
//! 1. **transform** — kernel bank generation and the batch feature
//!    transform, with serial and rayon-parallel evaluators
//! 2. **linear** — ridge regression with alpha-grid cross-validation
//! 3. **pipeline** — `RocketClassifier` / `RocketRegressor` plus JSON
//!    persistence
//! 4. **search** — grid/random hyperparameter study driver

pub mod linear;
pub mod pipeline;
pub mod search;
pub mod transform;

/// Crate-wide defaults.
pub mod config {
    /// Default number of random kernels per bank.
    pub const DEFAULT_NUM_KERNELS: usize = 10_000;

    /// Default candidate kernel lengths.
    pub const DEFAULT_KERNEL_LENGTHS: [usize; 3] = [7, 9, 11];

    /// Cross-validation folds for the ridge alpha search.
    pub const DEFAULT_CV_FOLDS: usize = 5;

    /// Trial count for random search when none is configured.
    pub const DEFAULT_RANDOM_TRIALS: usize = 20;

    /// Epsilon added to per-instance standard deviations before dividing.
    pub const NORM_EPS: f64 = 1e-8;
}
