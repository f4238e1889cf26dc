//! Time-series classification: ROCKET features + a ridge classifier.
//!
//! Fitting generates a fresh kernel bank (seeded when a seed is set),
//! optionally normalizes each instance, transforms the batch and fits a
//! cross-validated ridge on ±1 one-vs-rest targets. Binary problems use a
//! single decision column; multi-class predicts the argmax column.

use ndarray::{Array2, ArrayView3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{normalize_instances, PipelineError};
use crate::linear::{default_alphas, RidgeCv, RidgeModel};
use crate::transform::{apply_bank, detect_backend, Backend, GeneratorConfig, KernelBank};

/// Configuration for `RocketClassifier`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RocketClassifierConfig {
    /// Number of random kernels (two features each).
    pub num_kernels: usize,

    /// Candidate kernel lengths.
    pub candidate_lengths: Vec<usize>,

    /// Standardize each instance per channel before transforming.
    pub normalize_input: bool,

    /// Alpha grid for the ridge cross-validation.
    pub alphas: Vec<f64>,

    /// Seed for kernel generation; fresh entropy when `None`.
    pub seed: Option<u64>,

    /// Evaluator backend for the batch transform.
    pub backend: Backend,

    /// Allow padded kernels.
    pub use_padding: bool,

    /// Allow dilated kernels.
    pub use_dilation: bool,
}

impl Default for RocketClassifierConfig {
    fn default() -> Self {
        Self {
            num_kernels: crate::config::DEFAULT_NUM_KERNELS,
            candidate_lengths: crate::config::DEFAULT_KERNEL_LENGTHS.to_vec(),
            normalize_input: true,
            alphas: default_alphas(),
            seed: None,
            backend: detect_backend(),
            use_padding: true,
            use_dilation: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct FittedClassifier {
    bank: KernelBank,
    model: RidgeModel,
    classes: Vec<i64>,
}

/// ROCKET feature transform + cross-validated ridge classifier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RocketClassifier {
    pub config: RocketClassifierConfig,
    state: Option<FittedClassifier>,
}

impl Default for RocketClassifier {
    fn default() -> Self {
        Self::new(RocketClassifierConfig::default())
    }
}

impl RocketClassifier {
    pub fn new(config: RocketClassifierConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Fit on `x` (`batch × channels × len`) with integer class labels.
    pub fn fit(&mut self, x: ArrayView3<'_, f64>, y: &[i64]) -> Result<&mut Self, PipelineError> {
        let (batch, channels, seq_len) = x.dim();
        if y.len() != batch {
            return Err(PipelineError::TargetMismatch {
                want: batch,
                got: y.len(),
            });
        }
        if batch < 2 {
            return Err(PipelineError::TooFewSequences(batch));
        }

        let x_owned;
        let x = if self.config.normalize_input {
            x_owned = normalize_instances(x);
            x_owned.view()
        } else {
            // Reborrow so both arms carry the function-local lifetime.
            x.view()
        };

        let gen_cfg = GeneratorConfig {
            num_kernels: self.config.num_kernels,
            candidate_lengths: self.config.candidate_lengths.clone(),
            use_padding: self.config.use_padding,
            use_dilation: self.config.use_dilation,
            channels,
        };
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let bank = KernelBank::generate(seq_len, &gen_cfg, &mut rng)?;
        let feats = apply_bank(x, &bank, self.config.backend)?;

        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();

        let targets = build_targets(y, &classes);
        let cv = RidgeCv {
            alphas: self.config.alphas.clone(),
            ..RidgeCv::default()
        };
        let model = cv.fit(feats.view(), targets.view())?;

        self.state = Some(FittedClassifier {
            bank,
            model,
            classes,
        });
        Ok(self)
    }

    /// Raw ridge decision values: one column for binary problems, one per
    /// class otherwise.
    pub fn decision_function(&self, x: ArrayView3<'_, f64>) -> Result<Array2<f64>, PipelineError> {
        let state = self.state.as_ref().ok_or(PipelineError::NotFitted)?;
        let x_owned;
        let x = if self.config.normalize_input {
            x_owned = normalize_instances(x);
            x_owned.view()
        } else {
            x.view()
        };
        let feats = apply_bank(x, &state.bank, self.config.backend)?;
        Ok(state.model.decision(feats.view())?)
    }

    /// Predicted class labels.
    pub fn predict(&self, x: ArrayView3<'_, f64>) -> Result<Vec<i64>, PipelineError> {
        let state = self.state.as_ref().ok_or(PipelineError::NotFitted)?;
        let decision = self.decision_function(x)?;
        let labels = decision
            .rows()
            .into_iter()
            .map(|row| {
                if state.classes.len() == 2 {
                    if row[0] > 0.0 {
                        state.classes[1]
                    } else {
                        state.classes[0]
                    }
                } else {
                    let mut best = 0usize;
                    for (i, &v) in row.iter().enumerate() {
                        if v > row[best] {
                            best = i;
                        }
                    }
                    state.classes[best]
                }
            })
            .collect();
        Ok(labels)
    }

    /// Mean accuracy against `y`.
    pub fn score(&self, x: ArrayView3<'_, f64>, y: &[i64]) -> Result<f64, PipelineError> {
        let pred = self.predict(x)?;
        if pred.len() != y.len() {
            return Err(PipelineError::TargetMismatch {
                want: pred.len(),
                got: y.len(),
            });
        }
        if y.is_empty() {
            return Ok(0.0);
        }
        let hits = pred.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
        Ok(hits as f64 / y.len() as f64)
    }

    /// Class labels seen at fit, sorted ascending.
    pub fn classes(&self) -> Option<&[i64]> {
        self.state.as_ref().map(|s| s.classes.as_slice())
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }
}

/// ±1 one-vs-rest target matrix; binary problems collapse to one column
/// (+1 for the greater class).
fn build_targets(y: &[i64], classes: &[i64]) -> Array2<f64> {
    let n = y.len();
    if classes.len() == 2 {
        Array2::from_shape_fn((n, 1), |(i, _)| if y[i] == classes[1] { 1.0 } else { -1.0 })
    } else {
        Array2::from_shape_fn((n, classes.len()), |(i, j)| {
            if y[i] == classes[j] {
                1.0
            } else {
                -1.0
            }
        })
    }
}
