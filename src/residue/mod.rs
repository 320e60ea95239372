//! # Residue Codec
//!
//! Converts integers to residue tuples and back via the Chinese Remainder
//! Theorem.
//!
//! Encoding never rejects a value: anything outside `[0, modulus)` wraps
//! modulo `Π p_i`. Subtraction relies on this, so that `0 − 1` lands on
//! `max_value`.

use crate::basis::Basis;
use crate::{Result, HrrError};

/// Residues of `value` modulo each prime of the basis.
///
/// Values `≥ modulus` wrap: `encode(v) == encode(v mod Π p_i)`.
pub fn encode(value: u64, basis: &Basis) -> Vec<u64> {
    basis.primes().iter().map(|&p| value % p).collect()
}

/// Residues of a signed value, reduced with the Euclidean remainder.
///
/// `encode_signed(-1)` equals `encode(max_value)`.
pub fn encode_signed(value: i64, basis: &Basis) -> Vec<u64> {
    basis
        .primes()
        .iter()
        .map(|&p| (value as i128).rem_euclid(p as i128) as u64)
        .collect()
}

/// Extended Euclidean algorithm.
///
/// Returns `(g, x, y)` with `a·x + b·y = g = gcd(a, b)`.
pub fn extended_gcd(a: i128, b: i128) -> (i128, i128, i128) {
    if a == 0 {
        return (b, 0, 1);
    }
    let (g, x1, y1) = extended_gcd(b % a, a);
    (g, y1 - (b / a) * x1, x1)
}

/// Inverse of `a` modulo `m`, if `gcd(a, m) = 1`.
pub fn mod_inverse(a: u64, m: u64) -> Option<u64> {
    let (g, x, _) = extended_gcd((a % m) as i128, m as i128);
    if g != 1 {
        return None;
    }
    Some(x.rem_euclid(m as i128) as u64)
}

/// Reconstruct the unique `v ∈ [0, Π p_i)` with `v ≡ residues[i] (mod p_i)`.
///
/// # Errors
/// [`HrrError::InconsistentResidue`] if the tuple length does not match the
/// basis or any residue is not below its prime. Residues are never silently
/// reduced.
pub fn decode(residues: &[u64], basis: &Basis) -> Result<u64> {
    let primes = basis.primes();

    if residues.len() != primes.len() {
        return Err(HrrError::InconsistentResidue(format!(
            "expected {} residues, got {}",
            primes.len(),
            residues.len()
        )));
    }

    if let Some((r, p)) = residues.iter().zip(primes).find(|(r, p)| r >= p) {
        return Err(HrrError::InconsistentResidue(format!(
            "residue {} is not below its prime {}",
            r, p
        )));
    }

    let modulus = basis.modulus() as u128;
    let mut value: u128 = 0;

    for (&r, &p) in residues.iter().zip(primes) {
        let partial = modulus / p as u128;
        // Distinct primes: the inverse always exists
        let inverse = mod_inverse((partial % p as u128) as u64, p).ok_or_else(|| {
            HrrError::InconsistentResidue(format!("{} is not coprime to the basis", p))
        })? as u128;

        value = (value + (r as u128 * partial) % modulus * inverse) % modulus;
    }

    Ok(value as u64)
}
