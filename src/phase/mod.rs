//! # Phase Embedding
//!
//! Residues as points on the unit circle.
//!
//! A residue `r` modulo `p` becomes the rotation `ζ_p^r = e^{2πi·r/p}`, stored
//! as the 2-vector `[cos, sin]`. Adding residues is composing rotations.
//!
//! The nonzero residues modulo a prime also form a cyclic group under
//! multiplication, `F_p^× ≅ Z/(p−1)Z`. [`isomorphism`] builds that map
//! (primitive root and discrete logarithm) so that multiplication can be
//! carried out as a rotation too, on a circle with `p − 1` positions.

pub mod isomorphism;

pub use isomorphism::{cached_primes, primitive_root, tables_for, PrimeTables};

use crate::Result;
use candle_core::{Device, Tensor};
use std::f64::consts::TAU;

/// A point on the unit circle, `[cos θ, sin θ]`.
pub type PhasePoint = [f32; 2];

/// Unit-circle point for residue `r` modulo `p`, at angle `2π·r/p`.
///
/// `r` is reduced modulo `p` first.
///
/// # Panics
/// If `p == 0`.
pub fn embed(r: u64, p: u64) -> PhasePoint {
    let angle = TAU * (r % p) as f64 / p as f64;
    [angle.cos() as f32, angle.sin() as f32]
}

/// Multiplicative-domain embedding: `r` is read as an exponent of the
/// primitive root and placed on the `(p − 1)`-point circle.
///
/// # Panics
/// If `p < 2`; `p` is expected to be a basis prime.
pub fn mul_embed(r: u64, p: u64) -> PhasePoint {
    embed(r, p - 1)
}

/// Nearest root of unity: the `r ∈ [0, p)` whose angle `2π·r/p` is closest
/// to the angle of `point`.
///
/// The magnitude of `point` is ignored. The zero vector maps to 0.
///
/// # Panics
/// If `p == 0`.
pub fn project(point: PhasePoint, p: u64) -> u64 {
    let mut angle = (point[1] as f64).atan2(point[0] as f64);
    if angle < 0.0 {
        angle += TAU;
    }
    ((angle * p as f64 / TAU).round() as u64) % p
}

/// Stack the embeddings of `residues` (one per prime) into a `[k, 2]` tensor.
pub fn embed_all(residues: &[u64], primes: &[u64], device: &Device) -> Result<Tensor> {
    let flat: Vec<f32> = residues
        .iter()
        .zip(primes)
        .flat_map(|(&r, &p)| embed(r, p))
        .collect();
    Ok(Tensor::from_vec(flat, (primes.len(), 2), device)?)
}

/// All `p` canonical points for modulus `p`, as a `[p, 2]` tensor.
pub fn roots_of_unity(p: u64, device: &Device) -> Result<Tensor> {
    let flat: Vec<f32> = (0..p).flat_map(|r| embed(r, p)).collect();
    Ok(Tensor::from_vec(flat, (p as usize, 2), device)?)
}
