//! The ROCKET transform: random kernel banks and the batch feature map.
//!
//! A `KernelBank` is generated once from a seeded RNG; `apply_bank` then
//! maps a batch of series to a `(batch × 2·num_kernels)` feature matrix,
//! two columns per kernel (ppv, then max response).

pub mod apply;
pub mod backend;
pub mod batch;
pub mod generator;

pub use apply::apply_kernel;
pub use backend::{detect_backend, Backend};
pub use batch::{apply_bank, apply_bank_2d};
pub use generator::{GeneratorConfig, KernelBank, KernelDescriptor};

use thiserror::Error;

/// Errors surfaced by kernel generation and the batch transform.
///
/// None of these is transient: the transform is a pure function, so every
/// failure is a caller-visible error and retrying cannot change the outcome.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The generator cannot produce a single valid kernel.
    #[error("invalid kernel generator configuration: {reason}")]
    Configuration { reason: String },

    /// Input batch disagrees with the shape the bank was generated for.
    #[error(
        "input shape {got_channels}ch x {got_len} does not match expected \
         {want_channels}ch x {want_len}"
    )]
    Shape {
        want_channels: usize,
        want_len: usize,
        got_channels: usize,
        got_len: usize,
    },

    /// A kernel's weight tensor spans a different channel count than the
    /// series it is applied to.
    #[error("kernel spans {want} channels but input has {got}")]
    ChannelMismatch { want: usize, got: usize },

    /// A kernel's receptive field exceeds the padded input: the output
    /// length would be non-positive. Unreachable for generator-produced
    /// banks; treated as an invariant violation, never silently skipped.
    #[error("kernel span {span} >= padded length {padded_len}: non-positive output length")]
    InvariantViolation { span: usize, padded_len: usize },

    /// A compute backend was requested that this build does not provide.
    #[error("unknown compute backend '{0}' (available: serial, parallel)")]
    BackendUnavailable(String),
}
