//! Single kernel × single series application.
//!
//! This is the innermost loop of the transform: O(length) work per output
//! position, O(output_length) positions, no cross-iteration dependency.
//! The batch driver parallelizes over the (series × kernel) grid on top of
//! this scalar reference.

use ndarray::ArrayView2;

use super::{KernelDescriptor, TransformError};

/// Convolve one series (`channels × len`) with one kernel and reduce the
/// response to `(ppv, max_activation)`.
///
/// Padding is handled virtually: taps that fall into the zero-padded region
/// contribute nothing, which is arithmetically identical to materializing a
/// zero-padded copy. All accumulation is in f64.
pub fn apply_kernel(
    series: ArrayView2<'_, f64>,
    kernel: &KernelDescriptor,
) -> Result<(f64, f64), TransformError> {
    let channels = series.nrows();
    let len = series.ncols();
    if kernel.weights.nrows() != channels {
        return Err(TransformError::ChannelMismatch {
            want: kernel.weights.nrows(),
            got: channels,
        });
    }

    let padded_len = len + 2 * kernel.padding;
    let span = kernel.span();
    if span >= padded_len {
        return Err(TransformError::InvariantViolation { span, padded_len });
    }
    let output_length = padded_len - span;

    let mut positives = 0usize;
    let mut max = f64::NEG_INFINITY;

    for p in 0..output_length {
        let mut sum = kernel.bias;
        for j in 0..kernel.length {
            let pos = p + j * kernel.dilation;
            // Positions inside [padding, padding + len) read the series;
            // everything else is the zero pad.
            if pos >= kernel.padding {
                let idx = pos - kernel.padding;
                if idx < len {
                    for c in 0..channels {
                        sum += kernel.weights[[c, j]] * series[[c, idx]];
                    }
                }
            }
        }
        if sum > 0.0 {
            positives += 1;
        }
        if sum > max {
            max = sum;
        }
    }

    Ok((positives as f64 / output_length as f64, max))
}
