//! Number system configuration

use crate::holographic::{validate_beta, BindingStrategy};
use crate::{Result, HrrError};
use serde::{Deserialize, Serialize};

/// Parameters of a [`NumberSystem`](super::NumberSystem)
///
/// Missing fields fall back to the defaults when deserializing, so
/// `{"min_range": 1000}` is a complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberSystemConfig {
    /// Every integer in `[0, min_range)` must be representable
    pub min_range: u64,

    /// Inverse temperature of the softmax readouts. Should grow with the
    /// largest prime of the basis for reliable multiplication.
    pub beta: f32,

    /// How per-prime phase points are fused into the composite vector
    pub binding: BindingStrategy,
}

impl Default for NumberSystemConfig {
    fn default() -> Self {
        Self {
            min_range: 30,
            beta: 25.0,
            binding: BindingStrategy::Concatenate,
        }
    }
}

impl NumberSystemConfig {
    /// Configuration for the given range and beta, default binding
    pub fn new(min_range: u64, beta: f32) -> Self {
        Self {
            min_range,
            beta,
            ..Self::default()
        }
    }

    /// Builder: set the binding strategy
    pub fn with_binding(mut self, binding: BindingStrategy) -> Self {
        self.binding = binding;
        self
    }

    /// Check range and beta
    pub fn validate(&self) -> Result<()> {
        if self.min_range < 1 {
            return Err(HrrError::InvalidRange(self.min_range));
        }
        validate_beta(self.beta)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| HrrError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| HrrError::Serialization(e.to_string()))
    }
}
