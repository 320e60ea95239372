//! Activation Functions
//!
//! The readout nonlinearity used by the associative memories.

use candle_core::{D, Tensor};
use crate::{Result, HrrError};

/// Softmax of `beta * scores` along the last dimension.
///
/// `beta` is the inverse temperature: `beta → 0` flattens the distribution
/// towards uniform, large `beta` sharpens it towards one-hot.
pub fn softmax_with_beta(scores: &Tensor, beta: f32) -> Result<Tensor> {
    let scaled = scores
        .affine(beta as f64, 0.0)
        .map_err(|e| HrrError::Tensor(format!("Beta scaling failed: {}", e)))?;
    candle_nn::ops::softmax(&scaled, D::Minus1)
        .map_err(|e| HrrError::Tensor(format!("Softmax failed: {}", e)))
}

/// Index of the largest entry of a 1D tensor.
pub fn argmax(tensor: &Tensor) -> Result<usize> {
    let idx = tensor
        .argmax(0)
        .and_then(|t| t.to_scalar::<u32>())
        .map_err(|e| HrrError::Tensor(format!("Argmax failed: {}", e)))?;
    Ok(idx as usize)
}
