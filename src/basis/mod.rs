//! # Prime Basis Selection
//!
//! Chooses the moduli of the residue number system.
//!
//! Primes are taken in increasing order (2, 3, 5, 7, ...) until their product
//! covers the requested range. Distinct primes are pairwise coprime, so the
//! Chinese Remainder Theorem reconstructs every value below the product
//! uniquely.
//!
//! ```text
//! min_range = 25  →  2 · 3 · 5 = 30 ≥ 25  →  primes [2, 3, 5], max_value 29
//! ```

use crate::{Result, HrrError};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// Prime Generator
// ============================================================================

/// Infinite iterator over the primes, by trial division against the primes
/// found so far.
#[derive(Debug, Clone, Default)]
pub struct Primes {
    found: Vec<u64>,
}

impl Primes {
    /// Start a fresh prime sequence at 2
    pub fn new() -> Self {
        Self::default()
    }
}

impl Iterator for Primes {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let mut candidate = match self.found.last() {
            None => 2,
            Some(2) => 3,
            Some(&last) => last + 2,
        };

        loop {
            let is_prime = self
                .found
                .iter()
                .take_while(|&&p| p * p <= candidate)
                .all(|&p| candidate % p != 0);

            if is_prime {
                self.found.push(candidate);
                return Some(candidate);
            }
            candidate += 2;
        }
    }
}

/// Deterministic primality test by trial division.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3u64;
    while d.saturating_mul(d) <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

// ============================================================================
// Basis
// ============================================================================

/// Ordered set of distinct primes bounding the representable range.
///
/// Immutable once built; `max_value = Π p_i − 1`. Serializes as the list of
/// primes, and deserializing goes through [`Basis::from_primes`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u64>")]
pub struct Basis {
    primes: Vec<u64>,
    modulus: u64,
}

impl Basis {
    /// Smallest prefix of the primes whose product is at least `min_range`.
    ///
    /// At least one prime is always taken, so `min_range = 1` yields `[2]`.
    ///
    /// # Errors
    /// - [`HrrError::InvalidRange`] when `min_range < 1`
    /// - [`HrrError::RangeTooLarge`] when the covering product overflows `u64`
    pub fn for_range(min_range: u64) -> Result<Self> {
        if min_range < 1 {
            return Err(HrrError::InvalidRange(min_range));
        }

        let mut primes = Vec::new();
        let mut modulus = 1u64;

        for p in Primes::new() {
            if !primes.is_empty() && modulus >= min_range {
                break;
            }
            modulus = modulus
                .checked_mul(p)
                .ok_or(HrrError::RangeTooLarge(min_range))?;
            primes.push(p);
        }

        debug!(
            min_range,
            ?primes,
            max_value = modulus - 1,
            "selected prime basis"
        );

        Ok(Self { primes, modulus })
    }

    /// Build a basis from an explicit list of primes.
    ///
    /// The list must be non-empty, strictly increasing and contain only
    /// primes whose product fits in `u64`.
    pub fn from_primes(primes: &[u64]) -> Result<Self> {
        if primes.is_empty() {
            return Err(HrrError::InvalidBasis("basis must contain at least one prime".into()));
        }

        if let Some(p) = primes.iter().find(|&&p| !is_prime(p)) {
            return Err(HrrError::InvalidBasis(format!("{} is not prime", p)));
        }

        if primes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(HrrError::InvalidBasis(format!(
                "primes must be strictly increasing: {:?}",
                primes
            )));
        }

        let modulus = primes
            .iter()
            .try_fold(1u64, |acc, &p| acc.checked_mul(p))
            .ok_or_else(|| {
                HrrError::InvalidBasis(format!("product of {:?} overflows u64", primes))
            })?;

        Ok(Self {
            primes: primes.to_vec(),
            modulus,
        })
    }

    /// The primes, in increasing order
    pub fn primes(&self) -> &[u64] {
        &self.primes
    }

    /// Number of primes in the basis
    pub fn len(&self) -> usize {
        self.primes.len()
    }

    /// Always false: a basis holds at least one prime
    pub fn is_empty(&self) -> bool {
        self.primes.is_empty()
    }

    /// Product of all primes (the size of the representable range)
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Largest representable value, `Π p_i − 1`
    pub fn max_value(&self) -> u64 {
        self.modulus - 1
    }

    /// Largest prime in the basis
    pub fn largest_prime(&self) -> u64 {
        self.primes[self.primes.len() - 1]
    }
}

impl TryFrom<Vec<u64>> for Basis {
    type Error = HrrError;

    fn try_from(primes: Vec<u64>) -> Result<Self> {
        Self::from_primes(&primes)
    }
}

impl From<Basis> for Vec<u64> {
    fn from(basis: Basis) -> Self {
        basis.primes
    }
}
