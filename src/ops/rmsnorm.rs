// RMSNorm over f32 activations. The learned weights are kept in f32 too,
// their precision matters more than their size.

use crate::core::error::{check_len, KernelError};
use crate::core::types::Matrix;

/// RMSNorm of one vector:
///   inv_rms   = 1 / sqrt(sum(x_j^2) / n + epsilon)
///   output[j] = weight[j] * (inv_rms * input[j])
///
/// `epsilon` should be positive. With 0 an all-zero input gives NaN;
/// `KernelConfig::validate` rejects that value.
pub fn rms_norm_vector(
    input: &[f32],
    weight: &[f32],
    epsilon: f32,
    output: &mut [f32],
) -> Result<(), KernelError> {
    let dim = input.len();
    if dim == 0 {
        return Err(KernelError::EmptyInput { op: "rms_norm_vector" });
    }
    check_len("rms_norm_vector (weight)", dim, weight.len())?;
    check_len("rms_norm_vector (output)", dim, output.len())?;

    let mut sum_squared = 0.0f32;
    for &x in input {
        sum_squared += x * x;
    }
    let mean_squared = sum_squared / dim as f32;
    let inv_rms = 1.0 / (mean_squared + epsilon).sqrt();

    for j in 0..dim {
        output[j] = weight[j] * (inv_rms * input[j]);
    }
    Ok(())
}

/// Row-wise RMSNorm where every row has its own weight row (weight is m × n like input)
pub fn rms_norm(
    input: &Matrix,
    weight: &Matrix,
    epsilon: f32,
    output: &mut Matrix,
) -> Result<(), KernelError> {
    if weight.shape() != input.shape() {
        return Err(KernelError::ShapeMismatch {
            op: "rms_norm (weight)",
            expected: input.shape(),
            actual: weight.shape(),
        });
    }
    if output.shape() != input.shape() {
        return Err(KernelError::ShapeMismatch {
            op: "rms_norm (output)",
            expected: input.shape(),
            actual: output.shape(),
        });
    }

    for ((x, w), out) in input.rows_iter().zip(weight.rows_iter()).zip(output.rows_iter_mut()) {
        rms_norm_vector(x, w, epsilon, out)?;
    }
    Ok(())
}

/// Row-wise RMSNorm with a single length-n weight vector shared by all rows
pub fn rms_norm_shared(
    input: &Matrix,
    weight: &[f32],
    epsilon: f32,
    output: &mut Matrix,
) -> Result<(), KernelError> {
    check_len("rms_norm_shared (weight)", input.cols(), weight.len())?;
    if output.shape() != input.shape() {
        return Err(KernelError::ShapeMismatch {
            op: "rms_norm_shared (output)",
            expected: input.shape(),
            actual: output.shape(),
        });
    }

    for (x, out) in input.rows_iter().zip(output.rows_iter_mut()) {
        rms_norm_vector(x, weight, epsilon, out)?;
    }
    Ok(())
}
