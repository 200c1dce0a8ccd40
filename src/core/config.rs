use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Epsilon added to the mean square in RMSNorm
pub const DEFAULT_RMS_EPSILON: f32 = 1e-5;

/// Whether attention scores are divided by sqrt(head_dim) before the softmax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionScaling {
    /// softmax(Q·Kᵀ)·V
    #[default]
    Unscaled,
    /// softmax(Q·Kᵀ / sqrt(d))·V
    InverseSqrtHeadDim,
}

impl AttentionScaling {
    /// Factor applied to every score for a head of width `head_dim`
    pub fn factor(self, head_dim: usize) -> f32 {
        match self {
            AttentionScaling::Unscaled => 1.0,
            AttentionScaling::InverseSqrtHeadDim => 1.0 / (head_dim as f32).sqrt(),
        }
    }
}

/// Starting value of the running maximum in safe softmax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxInit {
    /// Start from the first element: the true row maximum is subtracted
    #[default]
    FirstElement,
    /// Start from 1.0 and use the legacy kernel's f64 exp, reproducing it bit for bit.
    /// Rows whose maximum is below 1.0 are shifted by 1.0 instead of their max,
    /// which drives the f32 sum to zero and the output to +inf for strongly
    /// negative rows.
    LegacyOne,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Numeric knobs shared by the kernels
///
/// Every field has a default, so `{}` is a valid config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub rms_epsilon: f32,
    pub attention_scaling: AttentionScaling,
    pub softmax_max_init: MaxInit,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            rms_epsilon: DEFAULT_RMS_EPSILON,
            attention_scaling: AttentionScaling::default(),
            softmax_max_init: MaxInit::default(),
        }
    }
}

impl KernelConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: KernelConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        info!("Loaded kernel config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Epsilon must be finite and strictly positive: with 0 an all-zero row
    /// would normalise to 0 * inf = NaN
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rms_epsilon.is_finite() || self.rms_epsilon <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "rms_epsilon must be finite and > 0, got {}",
                self.rms_epsilon
            )));
        }
        Ok(())
    }
}
