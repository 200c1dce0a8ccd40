//! Dense f32 kernels for one transformer layer: matrix multiply, safe softmax,
//! single-head self-attention, RMSNorm, Swish and SwiGLU.
//!
//! All kernels work on row-major [`Matrix`] values (or plain slices for the
//! vector variants), check shapes up front and report violations as
//! [`KernelError`]. Nothing is kept between calls.

pub mod core;
pub mod layers;
pub mod ops;

pub use crate::core::config::{
    AttentionScaling, ConfigError, DEFAULT_RMS_EPSILON, KernelConfig, MaxInit,
};
pub use crate::core::error::KernelError;
pub use crate::core::types::Matrix;
pub use crate::layers::attention::{attention_weights, self_attention};
pub use crate::ops::matmul::{matmul, matmul_transposed};
pub use crate::ops::rmsnorm::{rms_norm, rms_norm_shared, rms_norm_vector};
pub use crate::ops::softmax::{
    softmax_rows, softmax_rows_with, softmax_vector, softmax_vector_with,
};
pub use crate::ops::swiglu::{elementwise_mul, linear, sigmoid, swiglu, swish, SwiGluWeights};
