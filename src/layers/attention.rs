use log::debug;

use crate::core::config::{AttentionScaling, KernelConfig};
use crate::core::error::KernelError;
use crate::core::types::Matrix;
use crate::ops::matmul::{matmul, matmul_transposed};
use crate::ops::softmax::softmax_rows_with;

/// Single-head self-attention
///
/// Shapes:
///   Q, K, V: N × d
///   output:  N × d
///
/// output = softmax(Q·Kᵀ)·V, with the scores optionally divided by sqrt(d)
/// first (see [`AttentionScaling`]). The N × N score matrix lives only for the
/// duration of the call.
pub fn self_attention(
    q: &Matrix,
    k: &Matrix,
    v: &Matrix,
    config: &KernelConfig,
    output: &mut Matrix,
) -> Result<(), KernelError> {
    if v.shape() != q.shape() {
        return Err(KernelError::ShapeMismatch {
            op: "self_attention (V)",
            expected: q.shape(),
            actual: v.shape(),
        });
    }
    if output.shape() != q.shape() {
        return Err(KernelError::ShapeMismatch {
            op: "self_attention (output)",
            expected: q.shape(),
            actual: output.shape(),
        });
    }

    let scores = attention_weights(q, k, config)?;
    matmul(&scores, v, output)
}

/// Row-stochastic attention matrix S = softmax(Q·Kᵀ), N × N
///
/// Q and K must both be N × d. Allocation of S is fallible.
pub fn attention_weights(
    q: &Matrix,
    k: &Matrix,
    config: &KernelConfig,
) -> Result<Matrix, KernelError> {
    if k.shape() != q.shape() {
        return Err(KernelError::ShapeMismatch {
            op: "self_attention (K)",
            expected: q.shape(),
            actual: k.shape(),
        });
    }
    let (seq_len, head_dim) = q.shape();
    debug!(
        "attention: seq_len={} head_dim={} scaling={:?} max_init={:?}",
        seq_len, head_dim, config.attention_scaling, config.softmax_max_init
    );

    // 1. S = Q · Kᵀ
    let mut scores = Matrix::zeros(seq_len, seq_len)?;
    matmul_transposed(q, k, &mut scores)?;

    if config.attention_scaling != AttentionScaling::Unscaled {
        let scale = config.attention_scaling.factor(head_dim);
        for s in scores.data_mut() {
            *s *= scale;
        }
    }

    // 2. softmax over each row
    softmax_rows_with(&mut scores, config.softmax_max_init)?;
    Ok(scores)
}
