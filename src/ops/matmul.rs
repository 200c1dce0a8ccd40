/// Dense matrix multiplication kernels
///
/// Matrix Layout:
/// - All matrices stored in row-major order
/// - matmul:            output[i,j] = sum_t(X[i,t] * Y[t,j])
/// - matmul_transposed: output[i,j] = sum_t(X[i,t] * Y[j,t])   (X · Yᵀ, no copy of Yᵀ)
///
/// Sums run left to right over t, so results are reproducible bit for bit.

use crate::core::error::KernelError;
use crate::core::types::Matrix;

/// Matrix multiplication: output = X × Y
///
/// # Arguments
/// * `x` - m × k
/// * `y` - k × n
/// * `output` - Pre-allocated m × n buffer, fully overwritten (never read)
///
/// # Errors
/// `ShapeMismatch` if `x.cols() != y.rows()` or the output is not m × n
pub fn matmul(x: &Matrix, y: &Matrix, output: &mut Matrix) -> Result<(), KernelError> {
    let (m, k) = x.shape();
    let n = y.cols();

    if y.rows() != k {
        return Err(KernelError::ShapeMismatch {
            op: "matmul",
            expected: (k, n),
            actual: y.shape(),
        });
    }
    if output.shape() != (m, n) {
        return Err(KernelError::ShapeMismatch {
            op: "matmul (output)",
            expected: (m, n),
            actual: output.shape(),
        });
    }

    matmul_f32(x.data(), y.data(), output.data_mut(), m, k, n);
    Ok(())
}

/// Matrix multiplication against a transposed right-hand side: output = X × Yᵀ
///
/// # Arguments
/// * `x` - m × k
/// * `y` - n × k (row j of Y is column j of Yᵀ)
/// * `output` - Pre-allocated m × n buffer
pub fn matmul_transposed(x: &Matrix, y: &Matrix, output: &mut Matrix) -> Result<(), KernelError> {
    let (m, k) = x.shape();
    let n = y.rows();

    if y.cols() != k {
        return Err(KernelError::ShapeMismatch {
            op: "matmul_transposed",
            expected: (n, k),
            actual: y.shape(),
        });
    }
    if output.shape() != (m, n) {
        return Err(KernelError::ShapeMismatch {
            op: "matmul_transposed (output)",
            expected: (m, n),
            actual: output.shape(),
        });
    }

    let out = output.data_mut();
    for (i, x_row) in x.rows_iter().enumerate() {
        for (j, y_row) in y.rows_iter().enumerate() {
            let mut val = 0.0f32;
            for t in 0..k {
                val += x_row[t] * y_row[t];
            }
            out[i * n + j] = val;
        }
    }
    Ok(())
}

/// Scalar F32 × F32 kernel on raw buffers. Callers have already checked
/// `x.len() == m*k`, `y.len() == k*n` and `output.len() == m*n`.
pub(crate) fn matmul_f32(x: &[f32], y: &[f32], output: &mut [f32], m: usize, k: usize, n: usize) {
    debug_assert_eq!(x.len(), m * k);
    debug_assert_eq!(y.len(), k * n);
    debug_assert_eq!(output.len(), m * n);

    for i in 0..m {
        for j in 0..n {
            let mut val = 0.0f32;
            for t in 0..k {
                val += x[i * k + t] * y[t * n + j];
            }
            output[i * n + j] = val;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matmul_2x3_times_3x2() {
        let x = Matrix::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let y = Matrix::new(3, 2, vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0]).unwrap();
        let mut output = Matrix::zeros(2, 2).unwrap();
        matmul(&x, &y, &mut output).unwrap();
        assert_eq!(output.data(), &[58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_matmul_overwrites_output() {
        let x = Matrix::new(1, 2, vec![1.0, 2.0]).unwrap();
        let y = Matrix::new(2, 1, vec![3.0, 4.0]).unwrap();
        let mut output = Matrix::new(1, 1, vec![100.0]).unwrap();
        matmul(&x, &y, &mut output).unwrap();
        assert_eq!(output.data(), &[11.0]);
    }

    #[test]
    fn test_matmul_identity() {
        let x = Matrix::new(2, 3, vec![1.0, -2.0, 3.5, 0.25, 5.0, -6.0]).unwrap();
        let eye = Matrix::identity(3).unwrap();
        let mut output = Matrix::zeros(2, 3).unwrap();
        matmul(&x, &eye, &mut output).unwrap();
        assert_eq!(output, x);
    }

    #[test]
    fn test_matmul_inner_dim_mismatch() {
        let x = Matrix::zeros(2, 3).unwrap();
        let y = Matrix::zeros(4, 2).unwrap();
        let mut output = Matrix::zeros(2, 2).unwrap();
        let err = matmul(&x, &y, &mut output).unwrap_err();
        assert_eq!(
            err,
            KernelError::ShapeMismatch { op: "matmul", expected: (3, 2), actual: (4, 2) }
        );
    }

    #[test]
    fn test_matmul_output_mismatch() {
        let x = Matrix::zeros(2, 3).unwrap();
        let y = Matrix::zeros(3, 2).unwrap();
        let mut output = Matrix::zeros(3, 3).unwrap();
        assert!(matches!(
            matmul(&x, &y, &mut output),
            Err(KernelError::ShapeMismatch { op: "matmul (output)", .. })
        ));
    }

    #[test]
    fn test_matmul_transposed_matches_explicit_transpose() {
        // Y is 3x2, so X·Yᵀ needs Yᵀ = [[1,3,5],[2,4,6]]
        let x = Matrix::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let y = Matrix::new(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let y_t = Matrix::new(2, 3, vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0]).unwrap();

        let mut direct = Matrix::zeros(2, 3).unwrap();
        matmul_transposed(&x, &y, &mut direct).unwrap();
        let mut reference = Matrix::zeros(2, 3).unwrap();
        matmul(&x, &y_t, &mut reference).unwrap();

        assert_eq!(direct, reference);
        assert_eq!(direct.data(), &[5.0, 11.0, 17.0, 11.0, 25.0, 39.0]);
    }

    #[test]
    fn test_matmul_transposed_mismatch() {
        let x = Matrix::zeros(2, 3).unwrap();
        let y = Matrix::zeros(2, 2).unwrap();
        let mut output = Matrix::zeros(2, 2).unwrap();
        assert!(matmul_transposed(&x, &y, &mut output).is_err());
    }

    #[test]
    fn test_matmul_f32_matvec() {
        // 2x3 matrix times a length-3 column
        let mut output = vec![0.0; 2];
        matmul_f32(&[1.0, 0.0, 2.0, 0.0, 1.0, 1.0], &[3.0, 4.0, 5.0], &mut output, 2, 3, 1);
        assert_eq!(output, vec![13.0, 9.0]);
    }
}
