//! End-to-end pipelines: ROCKET features feeding a ridge model.

pub mod classifier;
pub mod persist;
pub mod regressor;

pub use classifier::{RocketClassifier, RocketClassifierConfig};
pub use persist::{load, save};
pub use regressor::{RocketRegressor, RocketRegressorConfig};

use ndarray::{Array3, ArrayView3, Axis};
use thiserror::Error;

use crate::config::NORM_EPS;
use crate::linear::RidgeError;
use crate::transform::TransformError;

/// Errors from pipeline fit/predict.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Ridge(#[from] RidgeError),

    #[error("pipeline has not been fitted")]
    NotFitted,

    #[error("{got} targets for {want} sequences")]
    TargetMismatch { want: usize, got: usize },

    #[error("training data needs at least two sequences, got {0}")]
    TooFewSequences(usize),
}

/// Standardize each (instance, channel) row over time: subtract its mean,
/// divide by its standard deviation (plus a small epsilon).
pub(crate) fn normalize_instances(x: ArrayView3<'_, f64>) -> Array3<f64> {
    let mut out = x.to_owned();
    for mut series in out.axis_iter_mut(Axis(0)) {
        for mut channel in series.axis_iter_mut(Axis(0)) {
            let n = channel.len();
            if n == 0 {
                continue;
            }
            let mean = channel.sum() / n as f64;
            let var = channel.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
            let std = var.sqrt() + NORM_EPS;
            channel.mapv_inplace(|v| (v - mean) / std);
        }
    }
    out
}
