//! Core Tensor Operations
//!
//! Device selection and the small set of tensor routines the phase code is
//! built from.
//!
//! ## Complex numbers as 2-vectors
//!
//! A phase point `e^{iθ}` is stored as the row `[cos θ, sin θ]`. A tensor of
//! shape `[k, 2]` therefore holds `k` complex numbers, one per row, and the
//! helpers below implement the complex operations the arithmetic needs:
//!
//! ```text
//! complex_mul([a, b], [c, d]) = [ac - bd, ad + bc]     (rotation composition)
//! conjugate([a, b])           = [a, -b]                (rotation inverse)
//! ```
//!
//! ## Device selection
//!
//! Set `HRR_NUMBERS_NO_GPU=1` to force CPU mode even when the crate is built
//! with the `metal` or `cuda` feature.

use crate::{Result, HrrError};
use candle_core::{Device, Tensor};
use tracing::info;

// ============================================================================
// Environment-controlled Device Selection
// ============================================================================

/// Check if GPU is disabled via environment variable.
///
/// Set `HRR_NUMBERS_NO_GPU=1` to force CPU-only mode.
pub fn gpu_disabled() -> bool {
    flag_set(std::env::var("HRR_NUMBERS_NO_GPU").ok().as_deref())
}

fn flag_set(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"))
}

/// Get the best available device for phase vectors
///
/// Priority:
/// 1. Check `HRR_NUMBERS_NO_GPU` env var (forces CPU if set)
/// 2. Metal (Apple Silicon)
/// 3. CUDA (NVIDIA GPUs)
/// 4. CPU (fallback)
///
/// Composite vectors are tiny (two floats per prime), so the CPU is usually
/// the fastest choice. GPU devices only pay off for large batched sweeps.
pub fn best_device() -> Device {
    if gpu_disabled() {
        info!("Using CPU device (HRR_NUMBERS_NO_GPU set)");
        return Device::Cpu;
    }

    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            info!("Using Metal device (Apple Silicon)");
            return device;
        }
    }

    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            info!("Using CUDA device (NVIDIA GPU)");
            return device;
        }
    }

    info!("Using CPU device");
    Device::Cpu
}

/// Force CPU device, ignoring GPU availability.
pub fn cpu_device() -> Device {
    Device::Cpu
}

// ============================================================================
// Complex Arithmetic on [k, 2] Tensors
// ============================================================================

fn check_complex(t: &Tensor, op: &str) -> Result<usize> {
    match t.dims() {
        [rows, 2] => Ok(*rows),
        dims => Err(HrrError::Tensor(format!(
            "{} expects a [k, 2] tensor, got {:?}",
            op, dims
        ))),
    }
}

fn split(t: &Tensor) -> Result<(Tensor, Tensor)> {
    Ok((t.narrow(1, 0, 1)?, t.narrow(1, 1, 1)?))
}

/// Row-wise complex product of two `[k, 2]` tensors.
///
/// For unit-magnitude rows this composes the two rotations, i.e. adds the
/// angles.
pub fn complex_mul(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    let rows_a = check_complex(a, "complex_mul")?;
    let rows_b = check_complex(b, "complex_mul")?;
    if rows_a != rows_b {
        return Err(HrrError::Tensor(format!(
            "Shape mismatch for complex_mul: {} vs {} rows",
            rows_a, rows_b
        )));
    }

    let (ar, ai) = split(a)?;
    let (br, bi) = split(b)?;

    let re = ((&ar * &br)? - (&ai * &bi)?)?;
    let im = ((&ar * &bi)? + (&ai * &br)?)?;

    Tensor::cat(&[&re, &im], 1).map_err(|e| HrrError::Tensor(e.to_string()))
}

/// Row-wise complex conjugate of a `[k, 2]` tensor (angle negation).
pub fn conjugate(t: &Tensor) -> Result<Tensor> {
    check_complex(t, "conjugate")?;
    let (re, im) = split(t)?;
    Tensor::cat(&[&re, &im.neg()?], 1).map_err(|e| HrrError::Tensor(e.to_string()))
}

/// Euclidean norm of every row of a `[k, 2]` tensor.
pub fn row_norms(t: &Tensor) -> Result<Vec<f32>> {
    check_complex(t, "row_norms")?;
    let norms = t.sqr()?.sum_keepdim(1)?.sqrt()?.flatten_all()?;
    norms
        .to_vec1::<f32>()
        .map_err(|e| HrrError::Tensor(format!("Row norms failed: {}", e)))
}

/// Scale every row of a `[k, 2]` tensor to unit length.
///
/// Rows with (near) zero length are left untouched.
pub fn normalize_rows(t: &Tensor) -> Result<Tensor> {
    check_complex(t, "normalize_rows")?;
    let norms = t.sqr()?.sum_keepdim(1)?.sqrt()?;
    let ones = Tensor::ones_like(&norms)?;
    let mask = norms.ge(1e-8f32)?;
    let safe = mask.where_cond(&norms, &ones)?;
    t.broadcast_div(&safe)
        .map_err(|e| HrrError::Tensor(format!("Normalize failed: {}", e)))
}

/// Compute cosine similarity between two tensors of equal shape
///
/// Returns a scalar in [-1, 1] representing the angle between vectors.
pub fn cosine_similarity(a: &Tensor, b: &Tensor) -> Result<f32> {
    if a.dims() != b.dims() {
        return Err(HrrError::Tensor(format!(
            "Shape mismatch for cosine_similarity: {:?} vs {:?}",
            a.dims(),
            b.dims()
        )));
    }

    let dot = a
        .mul(b)?
        .sum_all()?
        .to_scalar::<f32>()
        .map_err(|e| HrrError::Tensor(format!("Dot product failed: {}", e)))?;

    let norm_a = a
        .sqr()?
        .sum_all()?
        .sqrt()?
        .to_scalar::<f32>()
        .map_err(|e| HrrError::Tensor(format!("Norm a failed: {}", e)))?;

    let norm_b = b
        .sqr()?
        .sum_all()?
        .sqrt()?
        .to_scalar::<f32>()
        .map_err(|e| HrrError::Tensor(format!("Norm b failed: {}", e)))?;

    if norm_a > 1e-8 && norm_b > 1e-8 {
        Ok(dot / (norm_a * norm_b))
    } else {
        Ok(0.0)
    }
}
