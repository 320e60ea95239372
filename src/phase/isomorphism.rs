//! Multiplicative isomorphism `F_p^× ≅ Z/(p−1)Z`
//!
//! For a prime `p` with primitive root `g`:
//!
//! ```text
//! ψ⁻¹(k) = g^k mod p        (exponent → field element)
//! ψ(n)   = log_g(n)         (field element → exponent), undefined for n = 0
//!
//! ψ(1) = 0                  ψ(n·m) = ψ(n) + ψ(m)  (mod p−1)
//! ψ⁻¹(0) = 1                ψ⁻¹(g + h) = ψ⁻¹(g)·ψ⁻¹(h)  (mod p)
//! ```
//!
//! The discrete logarithm is the expensive part, so the tables for each prime
//! are built once and shared process-wide. The cache is initialized lazily and
//! is safe under concurrent first use: a table is built at most once, under
//! the write lock, and read through an `Arc` afterwards.

use crate::basis::is_prime;
use crate::{HrrError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Power and logarithm tables for one prime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimeTables {
    prime: u64,
    generator: u64,
    /// `powers[k] = g^k mod p` for `k ∈ [0, p−1)`
    powers: Vec<u64>,
    /// `logs[n] = ψ(n)` for `n ∈ [1, p)`; `logs[0]` is unused
    logs: Vec<u64>,
}

impl PrimeTables {
    /// Build the tables for prime `p` (uncached).
    ///
    /// # Errors
    /// [`HrrError::InvalidBasis`] when `p` is not prime.
    pub fn build(p: u64) -> Result<Self> {
        if !is_prime(p) {
            return Err(HrrError::InvalidBasis(format!(
                "discrete-log tables need a prime modulus, got {}",
                p
            )));
        }
        let generator = primitive_root(p);
        let order = (p - 1).max(1) as usize;

        let mut powers = Vec::with_capacity(order);
        let mut logs = vec![0u64; p as usize];
        let mut current = 1u64;

        for k in 0..order {
            powers.push(current);
            logs[current as usize] = k as u64;
            current = (current as u128 * generator as u128 % p as u128) as u64;
        }

        debug!(prime = p, generator, "built discrete-log tables");

        Ok(Self {
            prime: p,
            generator,
            powers,
            logs,
        })
    }

    /// The prime these tables belong to
    pub fn prime(&self) -> u64 {
        self.prime
    }

    /// The primitive root `g` used as the logarithm base
    pub fn generator(&self) -> u64 {
        self.generator
    }

    /// Order of the multiplicative group, `p − 1`
    pub fn order(&self) -> u64 {
        self.powers.len() as u64
    }

    /// `ψ⁻¹(k) = g^k mod p`, with `k` taken modulo `p − 1`
    pub fn exp(&self, k: u64) -> u64 {
        self.powers[(k % self.order()) as usize]
    }

    /// `ψ(n) = log_g(n mod p)`; `None` for multiples of `p`
    pub fn log(&self, n: u64) -> Option<u64> {
        match n % self.prime {
            0 => None,
            r => Some(self.logs[r as usize]),
        }
    }
}

fn mod_pow(base: u64, mut exp: u64, m: u64) -> u64 {
    let m = m as u128;
    let mut base = base as u128 % m;
    let mut acc = 1u128 % m;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = acc * base % m;
        }
        base = base * base % m;
        exp >>= 1;
    }
    acc as u64
}

fn distinct_prime_factors(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    let mut d = 2u64;
    while d * d <= n {
        if n % d == 0 {
            factors.push(d);
            while n % d == 0 {
                n /= d;
            }
        }
        d += 1;
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

/// Smallest primitive root of the prime `p`.
///
/// `g` generates `F_p^×` iff `g^((p−1)/q) ≠ 1` for every prime `q | p − 1`.
/// For `p = 2` the group is trivial and the root is 1.
pub fn primitive_root(p: u64) -> u64 {
    if p <= 2 {
        return 1;
    }
    let order = p - 1;
    let factors = distinct_prime_factors(order);

    (2..p)
        .find(|&g| factors.iter().all(|&q| mod_pow(g, order / q, p) != 1))
        .unwrap_or(1)
}

// ============================================================================
// Process-wide Cache
// ============================================================================

static PRIME_TABLES: OnceLock<RwLock<HashMap<u64, Arc<PrimeTables>>>> = OnceLock::new();

fn cache() -> &'static RwLock<HashMap<u64, Arc<PrimeTables>>> {
    PRIME_TABLES.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Shared tables for prime `p`, built on first use.
///
/// # Errors
/// [`HrrError::InvalidBasis`] when `p` is not prime; nothing is cached.
pub fn tables_for(p: u64) -> Result<Arc<PrimeTables>> {
    if let Some(tables) = cache().read().get(&p) {
        return Ok(Arc::clone(tables));
    }

    let mut map = cache().write();
    if let Some(tables) = map.get(&p) {
        return Ok(Arc::clone(tables));
    }
    let tables = Arc::new(PrimeTables::build(p)?);
    map.insert(p, Arc::clone(&tables));
    Ok(tables)
}

/// Primes whose tables are currently cached, sorted.
pub fn cached_primes() -> Vec<u64> {
    let mut primes: Vec<u64> = cache().read().keys().copied().collect();
    primes.sort_unstable();
    primes
}
