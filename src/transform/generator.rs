//! Random kernel bank generation.
//!
//! Each kernel draws, in a fixed order: a length from the candidate set,
//! `channels × length` standard-normal weights (then mean-centred so the
//! kernel has zero DC response), a bias uniform on [-1, 1], a dilation
//! `floor(2^u)` with `u ~ U[0, log2(floor((seq_len-1)/(length-1)))]`, and a
//! fair coin for padding. Dilation is truncated to an integer stride at
//! generation time and padding is computed from the truncated stride, so
//! every kernel's receptive field fits inside the (padded) input.
//!
//! The RNG is an explicitly passed, owned generator: a fixed seed plus the
//! fixed draw order make regeneration bit-identical.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use super::TransformError;
use crate::config::{DEFAULT_KERNEL_LENGTHS, DEFAULT_NUM_KERNELS};

/// Configuration for kernel bank generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of kernels in the bank.
    pub num_kernels: usize,

    /// Candidate kernel lengths. Lengths >= seq_len or < 2 are skipped.
    pub candidate_lengths: Vec<usize>,

    /// Whether kernels may be zero-padded (coin flip per kernel).
    pub use_padding: bool,

    /// Whether kernels may be dilated (otherwise stride 1).
    pub use_dilation: bool,

    /// Input channels each kernel spans.
    pub channels: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_kernels: DEFAULT_NUM_KERNELS,
            candidate_lengths: DEFAULT_KERNEL_LENGTHS.to_vec(),
            use_padding: true,
            use_dilation: true,
            channels: 1,
        }
    }
}

/// One randomly generated convolution kernel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KernelDescriptor {
    /// Number of weight taps per channel.
    pub length: usize,

    /// Weights, `channels × length`, mean-centred over the whole tensor.
    pub weights: Array2<f64>,

    /// Additive bias, uniform on [-1, 1].
    pub bias: f64,

    /// Integer spacing between consecutive taps (>= 1).
    pub dilation: usize,

    /// Zero padding added to both ends of the input (0 or half the span).
    pub padding: usize,
}

impl KernelDescriptor {
    /// Receptive-field span minus one input position:
    /// distance between the first and last tap.
    pub fn span(&self) -> usize {
        (self.length - 1) * self.dilation
    }
}

/// An immutable, ordered collection of random kernels, tied to the input
/// shape it was generated for.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KernelBank {
    /// The kernels, in generation order.
    pub kernels: Vec<KernelDescriptor>,

    /// Sequence length the bank was generated for.
    pub seq_len: usize,

    /// Channel count the bank was generated for.
    pub channels: usize,
}

impl KernelBank {
    /// Generate a bank of `config.num_kernels` kernels for inputs of
    /// `seq_len` positions, drawing from the caller's RNG.
    pub fn generate(
        seq_len: usize,
        config: &GeneratorConfig,
        rng: &mut StdRng,
    ) -> Result<Self, TransformError> {
        if config.num_kernels == 0 {
            return Err(TransformError::Configuration {
                reason: "num_kernels must be positive".into(),
            });
        }
        if config.channels == 0 {
            return Err(TransformError::Configuration {
                reason: "channels must be positive".into(),
            });
        }
        if seq_len < 2 {
            return Err(TransformError::Configuration {
                reason: format!("sequence length {seq_len} is too short to convolve"),
            });
        }

        let usable: Vec<usize> = config
            .candidate_lengths
            .iter()
            .copied()
            .filter(|&l| l >= 2 && l < seq_len)
            .collect();
        if usable.is_empty() {
            return Err(TransformError::Configuration {
                reason: format!(
                    "no candidate kernel length in {:?} is >= 2 and < sequence length {}",
                    config.candidate_lengths, seq_len
                ),
            });
        }

        let mut kernels = Vec::with_capacity(config.num_kernels);
        for _ in 0..config.num_kernels {
            kernels.push(draw_kernel(seq_len, &usable, config, rng));
        }

        Ok(Self {
            kernels,
            seq_len,
            channels: config.channels,
        })
    }

    /// `generate` with a fresh `StdRng` seeded from `seed`.
    pub fn generate_seeded(
        seq_len: usize,
        config: &GeneratorConfig,
        seed: u64,
    ) -> Result<Self, TransformError> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::generate(seq_len, config, &mut rng)
    }

    /// Number of kernels in the bank.
    pub fn num_kernels(&self) -> usize {
        self.kernels.len()
    }

    /// Number of output feature columns: two per kernel.
    pub fn num_features(&self) -> usize {
        2 * self.kernels.len()
    }
}

/// Draw one kernel. `usable` is the filtered candidate-length set and is
/// never empty here.
fn draw_kernel(
    seq_len: usize,
    usable: &[usize],
    config: &GeneratorConfig,
    rng: &mut StdRng,
) -> KernelDescriptor {
    let length = usable[rng.gen_range(0..usable.len())];

    let mut weights = Array2::<f64>::zeros((config.channels, length));
    for w in weights.iter_mut() {
        *w = rng.sample(StandardNormal);
    }
    let mean = weights.mean().unwrap_or(0.0);
    weights -= mean;

    let bias: f64 = rng.gen_range(-1.0..=1.0);

    let dilation = if config.use_dilation {
        // Exponent cap uses the integer ratio, so floor(2^u) <= cap and the
        // span (length-1)*dilation stays < seq_len.
        let cap = (seq_len - 1) / (length - 1);
        let max_exp = (cap as f64).log2();
        let u: f64 = rng.gen_range(0.0..=max_exp);
        2f64.powf(u).floor() as usize
    } else {
        1
    };

    let padding = if config.use_padding && rng.gen_bool(0.5) {
        (length - 1) * dilation / 2
    } else {
        0
    };

    KernelDescriptor {
        length,
        weights,
        bias,
        dilation,
        padding,
    }
}
