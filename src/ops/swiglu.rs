// Gated activations: Swish with a per-element beta, and the full SwiGLU
//   SwiGLU(x) = Swish(W1·x + b) ⊗ (V·x + c)
// built from three steps that can each be run on their own:
// linear projection, swish, elementwise product.

use log::debug;

use super::matmul::matmul_f32;
use crate::core::error::{check_len, KernelError};
use crate::core::types::Matrix;

/// sigmoid(z) = 1 / (1 + exp(-z))
///
/// For very negative z, exp(-z) overflows to +inf and the result is 0.0, not NaN.
pub fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

/// Swish(x) = x * sigmoid(beta * x), with beta given per element
pub fn swish(input: &[f32], beta: &[f32], output: &mut [f32]) -> Result<(), KernelError> {
    check_len("swish (beta)", input.len(), beta.len())?;
    check_len("swish (output)", input.len(), output.len())?;

    for i in 0..input.len() {
        let gate = sigmoid(input[i] * beta[i]);
        output[i] = gate * input[i];
    }
    Ok(())
}

/// Affine projection: output = W·x + b
///
/// # Arguments
/// * `weight` - m × n
/// * `input` - length n
/// * `bias` - length m
/// * `output` - length m
pub fn linear(
    weight: &Matrix,
    input: &[f32],
    bias: &[f32],
    output: &mut [f32],
) -> Result<(), KernelError> {
    let (m, n) = weight.shape();
    check_len("linear (input)", n, input.len())?;
    check_len("linear (bias)", m, bias.len())?;
    check_len("linear (output)", m, output.len())?;

    // W (m x n) times x seen as an n x 1 column
    matmul_f32(weight.data(), input, output, m, n, 1);
    for (out, b) in output.iter_mut().zip(bias) {
        *out += b;
    }
    Ok(())
}

/// Hadamard product: output[i] = a[i] * b[i]
pub fn elementwise_mul(a: &[f32], b: &[f32], output: &mut [f32]) -> Result<(), KernelError> {
    check_len("elementwise_mul (rhs)", a.len(), b.len())?;
    check_len("elementwise_mul (output)", a.len(), output.len())?;

    for ((out, x), y) in output.iter_mut().zip(a).zip(b) {
        *out = x * y;
    }
    Ok(())
}

/// Parameters of a SwiGLU block mapping an n-dim input to an m-dim output
#[derive(Debug, Clone, PartialEq)]
pub struct SwiGluWeights {
    w1: Matrix,
    b: Vec<f32>,
    v: Matrix,
    c: Vec<f32>,
    beta: Vec<f32>,
}

impl SwiGluWeights {
    /// # Arguments
    /// * `w1`, `v` - gate and value projections, both m × n
    /// * `b`, `c` - their biases, length m
    /// * `beta` - swish gating parameter per output element, length m
    pub fn new(
        w1: Matrix,
        b: Vec<f32>,
        v: Matrix,
        c: Vec<f32>,
        beta: Vec<f32>,
    ) -> Result<Self, KernelError> {
        if v.shape() != w1.shape() {
            return Err(KernelError::ShapeMismatch {
                op: "swiglu (V)",
                expected: w1.shape(),
                actual: v.shape(),
            });
        }
        let m = w1.rows();
        check_len("swiglu (b)", m, b.len())?;
        check_len("swiglu (c)", m, c.len())?;
        check_len("swiglu (beta)", m, beta.len())?;
        Ok(Self { w1, b, v, c, beta })
    }

    /// Input width n
    pub fn input_dim(&self) -> usize {
        self.w1.cols()
    }

    /// Output width m
    pub fn output_dim(&self) -> usize {
        self.w1.rows()
    }
}

/// SwiGLU(x) = Swish(W1·x + b) ⊗ (V·x + c)
///
/// `input` has length n and `output` length m. Two temporaries of length m
/// are allocated per call.
pub fn swiglu(
    input: &[f32],
    weights: &SwiGluWeights,
    output: &mut [f32],
) -> Result<(), KernelError> {
    let m = weights.output_dim();
    check_len("swiglu (input)", weights.input_dim(), input.len())?;
    check_len("swiglu (output)", m, output.len())?;
    debug!("swiglu: {} -> {}", weights.input_dim(), m);

    let mut gate = vec![0.0f32; m];
    linear(&weights.w1, input, &weights.b, &mut gate)?;
    let mut activated = vec![0.0f32; m];
    swish(&gate, &weights.beta, &mut activated)?;

    let mut value = vec![0.0f32; m];
    linear(&weights.v, input, &weights.c, &mut value)?;

    elementwise_mul(&activated, &value, output)
}
