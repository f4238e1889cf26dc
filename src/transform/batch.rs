//! Batch feature transform: every series × every kernel.
//!
//! Each `(series, kernel)` pair reads only its own inputs and writes only
//! its own output slot, so the grid is embarrassingly parallel. The bank is
//! the sole shared resource and is read-only. No partial results: the whole
//! batch succeeds or the first error is returned.

use ndarray::{Array1, Array2, ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;

use super::{apply_kernel, Backend, KernelBank, TransformError};

/// Transform a batch (`batch × channels × len`) into the feature matrix
/// (`batch × 2·num_kernels`). Column order is kernel-major: kernel 0's ppv,
/// kernel 0's max, kernel 1's ppv, ...
///
/// The input must match the shape the bank was generated for; variable
/// lengths are rejected with a shape error rather than recomputed per
/// series.
pub fn apply_bank(
    x: ArrayView3<'_, f64>,
    bank: &KernelBank,
    backend: Backend,
) -> Result<Array2<f64>, TransformError> {
    let (batch, channels, len) = x.dim();
    if channels != bank.channels || len != bank.seq_len {
        return Err(TransformError::Shape {
            want_channels: bank.channels,
            want_len: bank.seq_len,
            got_channels: channels,
            got_len: len,
        });
    }

    let rows: Vec<Vec<f64>> = match backend {
        Backend::Serial => {
            let mut rows = Vec::with_capacity(batch);
            for b in 0..batch {
                rows.push(transform_row(x.index_axis(Axis(0), b), bank)?);
            }
            rows
        }
        Backend::Parallel => (0..batch)
            .into_par_iter()
            .map(|b| transform_row(x.index_axis(Axis(0), b), bank))
            .collect::<Result<Vec<_>, _>>()?,
    };

    let mut out = Array2::zeros((batch, bank.num_features()));
    for (b, row) in rows.into_iter().enumerate() {
        out.row_mut(b).assign(&Array1::from_vec(row));
    }
    Ok(out)
}

/// `apply_bank` for univariate input (`batch × len`).
pub fn apply_bank_2d(
    x: ArrayView2<'_, f64>,
    bank: &KernelBank,
    backend: Backend,
) -> Result<Array2<f64>, TransformError> {
    apply_bank(x.insert_axis(Axis(1)), bank, backend)
}

/// One series against the whole bank: 2K features, ppv then max per kernel.
fn transform_row(
    series: ArrayView2<'_, f64>,
    bank: &KernelBank,
) -> Result<Vec<f64>, TransformError> {
    let mut row = Vec::with_capacity(bank.num_features());
    for kernel in &bank.kernels {
        let (ppv, max) = apply_kernel(series, kernel)?;
        row.push(ppv);
        row.push(max);
    }
    Ok(row)
}
