//! Time-series regression: ROCKET features + cross-validated ridge.

use ndarray::{Array1, Array2, ArrayView3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{normalize_instances, PipelineError};
use crate::linear::{default_alphas, RidgeCv, RidgeModel};
use crate::transform::{apply_bank, detect_backend, Backend, GeneratorConfig, KernelBank};

/// Configuration for `RocketRegressor`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RocketRegressorConfig {
    pub num_kernels: usize,
    pub candidate_lengths: Vec<usize>,
    pub normalize_input: bool,
    pub alphas: Vec<f64>,
    pub seed: Option<u64>,
    pub backend: Backend,
    pub use_padding: bool,
    pub use_dilation: bool,
}

impl Default for RocketRegressorConfig {
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
struct FittedRegressor {
    bank: KernelBank,
    model: RidgeModel,
}

/// ROCKET feature transform + cross-validated ridge regressor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RocketRegressor {
    pub config: RocketRegressorConfig,
    state: Option<FittedRegressor>,
}

impl Default for RocketRegressor {
    fn default() -> Self {
        Self::new(RocketRegressorConfig::default())
    }
}

impl RocketRegressor {
    pub fn new(config: RocketRegressorConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Fit on `x` (`batch × channels × len`) against a scalar target each.
    pub fn fit(&mut self, x: ArrayView3<'_, f64>, y: &[f64]) -> Result<&mut Self, PipelineError> {
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

        let targets = Array2::from_shape_fn((batch, 1), |(i, _)| y[i]);
        let cv = RidgeCv {
            alphas: self.config.alphas.clone(),
            ..RidgeCv::default()
        };
        let model = cv.fit(feats.view(), targets.view())?;

        self.state = Some(FittedRegressor { bank, model });
        Ok(self)
    }

    /// Predicted targets, one per input sequence.
    pub fn predict(&self, x: ArrayView3<'_, f64>) -> Result<Array1<f64>, PipelineError> {
        let state = self.state.as_ref().ok_or(PipelineError::NotFitted)?;
        let x_owned;
        let x = if self.config.normalize_input {
            x_owned = normalize_instances(x);
            x_owned.view()
        } else {
            x.view()
        };
        let feats = apply_bank(x, &state.bank, self.config.backend)?;
        let decision = state.model.decision(feats.view())?;
        Ok(decision.column(0).to_owned())
    }

    /// Coefficient of determination R² against `y`.
    pub fn score(&self, x: ArrayView3<'_, f64>, y: &[f64]) -> Result<f64, PipelineError> {
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
        let mean = y.iter().sum::<f64>() / y.len() as f64;
        let ss_res: f64 = pred
            .iter()
            .zip(y.iter())
            .map(|(p, t)| (t - p) * (t - p))
            .sum();
        let ss_tot: f64 = y.iter().map(|t| (t - mean) * (t - mean)).sum();
        if ss_tot == 0.0 {
            return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
        }
        Ok(1.0 - ss_res / ss_tot)
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn config(num_kernels: usize) -> RocketRegressorConfig {
        RocketRegressorConfig {
            num_kernels,
            seed: Some(7),
            // Target scale lives in the raw amplitude; keep it.
            normalize_input: false,
            ..RocketRegressorConfig::default()
        }
    }

    /// Target = amplitude of a sine carried by the series.
    fn amplitude_data(n: usize, seq_len: usize, seed: u64) -> (Array3<f64>, Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x = Array3::zeros((n, 1, seq_len));
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let amp = rng.gen_range(0.5..3.0);
            y.push(amp);
            for t in 0..seq_len {
                x[[i, 0, t]] = amp * (t as f64 * 0.7).sin() + rng.gen_range(-0.05..0.05);
            }
        }
        (x, y)
    }

    #[test]
    fn test_fit_predict_amplitude() {
        let (x, y) = amplitude_data(30, 40, 0);
        let mut reg = RocketRegressor::new(config(300));
        reg.fit(x.view(), &y).unwrap();
        let r2 = reg.score(x.view(), &y).unwrap();
        assert!(r2 > 0.9, "train R² {r2}");
    }

    #[test]
    fn test_generalizes() {
        let (x_train, y_train) = amplitude_data(40, 40, 1);
        let (x_test, y_test) = amplitude_data(15, 40, 2);
        let mut reg = RocketRegressor::new(config(300));
        reg.fit(x_train.view(), &y_train).unwrap();
        let r2 = reg.score(x_test.view(), &y_test).unwrap();
        assert!(r2 > 0.7, "test R² {r2}");
    }

    #[test]
    fn test_predict_before_fit() {
        let reg = RocketRegressor::default();
        let x = Array3::<f64>::zeros((2, 1, 20));
        assert!(matches!(
            reg.predict(x.view()),
            Err(PipelineError::NotFitted)
        ));
    }

    #[test]
    fn test_target_mismatch() {
        let (x, _) = amplitude_data(6, 20, 3);
        let mut reg = RocketRegressor::new(config(50));
        assert!(matches!(
            reg.fit(x.view(), &[1.0, 2.0]),
            Err(PipelineError::TargetMismatch { .. })
        ));
    }

    #[test]
    fn test_fit_predict_with_normalization() {
        // Exercises the normalizing arm of the input views in fit and
        // predict.
        let (x, y) = amplitude_data(12, 25, 8);
        let mut reg = RocketRegressor::new(RocketRegressorConfig {
            normalize_input: true,
            ..config(80)
        });
        reg.fit(x.view(), &y).unwrap();
        let pred = reg.predict(x.view()).unwrap();
        assert_eq!(pred.len(), 12);
        for &v in pred.iter() {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn test_prediction_shape() {
        let (x, y) = amplitude_data(10, 25, 4);
        let mut reg = RocketRegressor::new(config(80));
        reg.fit(x.view(), &y).unwrap();
        let pred = reg.predict(x.view()).unwrap();
        assert_eq!(pred.len(), 10);
    }
}
