//! Binding per-prime phase points into one composite vector
//!
//! A number with `k` primes has `k` phase points, held as a `[k, 2]` tensor.
//! A [`Binding`] turns that into a flat composite vector of dimension `2k` and
//! back. Whatever the scheme, extraction must recover every prime's point
//! exactly when no noise is present.
//!
//! ## Strategies
//!
//! - **Concatenate** (default): direct sum. Prime `i` owns coordinates
//!   `2i, 2i+1`; zero cross-talk between primes.
//! - **Orthogonal**: the concatenated vector is multiplied by a seeded
//!   orthonormal matrix `Q`. Every coordinate then carries a share of every
//!   prime, and extraction multiplies by `Qᵀ`. Noise added to the composite
//!   vector spreads over all primes instead of hitting one.

use crate::{Result, HrrError};
use candle_core::{Device, Tensor};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// How per-prime phase points are fused into a composite vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindingStrategy {
    /// Direct sum of the per-prime 2-vectors
    #[default]
    Concatenate,
    /// Direct sum followed by a seeded orthonormal mixing matrix
    Orthogonal {
        /// Seed of the generator the mixing matrix is drawn from
        seed: u64,
    },
}

impl BindingStrategy {
    /// Instantiate the strategy for a basis of `primes` primes.
    pub fn build(&self, primes: usize, device: &Device) -> Result<Box<dyn Binding>> {
        if primes == 0 {
            return Err(HrrError::Config("binding needs at least one prime".into()));
        }
        Ok(match *self {
            Self::Concatenate => Box::new(Concatenation::new(primes)),
            Self::Orthogonal { seed } => Box::new(OrthogonalMixing::new(primes, seed, device)?),
        })
    }
}

/// Combine/extract pair for composite vectors.
pub trait Binding: Send + Sync + Debug {
    /// The strategy this binding implements
    fn strategy(&self) -> BindingStrategy;

    /// Composite dimension (two per prime)
    fn dim(&self) -> usize;

    /// `[k, 2]` phase points → `[2k]` composite vector
    fn combine(&self, points: &Tensor) -> Result<Tensor>;

    /// `[2k]` composite vector → `[k, 2]` (possibly noisy) phase points
    fn extract(&self, composite: &Tensor) -> Result<Tensor>;

    /// Phase point of prime `index` as a `[1, 2]` tensor
    fn extract_one(&self, composite: &Tensor, index: usize) -> Result<Tensor> {
        let points = self.extract(composite)?;
        Ok(points.narrow(0, index, 1)?)
    }
}

fn check_points(points: &Tensor, primes: usize) -> Result<()> {
    if points.dims() != [primes, 2] {
        return Err(HrrError::Tensor(format!(
            "Expected [{}, 2] phase points, got {:?}",
            primes,
            points.dims()
        )));
    }
    Ok(())
}

fn check_composite(composite: &Tensor, dim: usize) -> Result<()> {
    if composite.dims() != [dim] {
        return Err(HrrError::Tensor(format!(
            "Expected composite vector of dim {}, got {:?}",
            dim,
            composite.dims()
        )));
    }
    Ok(())
}

// ============================================================================
// Concatenation
// ============================================================================

/// Direct-sum binding
#[derive(Debug, Clone)]
pub struct Concatenation {
    primes: usize,
}

impl Concatenation {
    /// Binding for `primes` primes
    pub fn new(primes: usize) -> Self {
        Self { primes }
    }
}

impl Binding for Concatenation {
    fn strategy(&self) -> BindingStrategy {
        BindingStrategy::Concatenate
    }

    fn dim(&self) -> usize {
        2 * self.primes
    }

    fn combine(&self, points: &Tensor) -> Result<Tensor> {
        check_points(points, self.primes)?;
        Ok(points.flatten_all()?)
    }

    fn extract(&self, composite: &Tensor) -> Result<Tensor> {
        check_composite(composite, self.dim())?;
        Ok(composite.reshape((self.primes, 2))?)
    }

    fn extract_one(&self, composite: &Tensor, index: usize) -> Result<Tensor> {
        check_composite(composite, self.dim())?;
        Ok(composite.narrow(0, 2 * index, 2)?.reshape((1, 2))?)
    }
}

// ============================================================================
// Orthogonal Mixing
// ============================================================================

/// Direct sum followed by a fixed orthonormal rotation of the whole vector
#[derive(Debug, Clone)]
pub struct OrthogonalMixing {
    primes: usize,
    seed: u64,
    /// `Q`, `[2k, 2k]`
    mixing: Tensor,
    /// `Qᵀ`, `[2k, 2k]`
    unmixing: Tensor,
}

impl OrthogonalMixing {
    /// Binding for `primes` primes with a mixing matrix drawn from `seed`
    pub fn new(primes: usize, seed: u64, device: &Device) -> Result<Self> {
        let dim = 2 * primes;
        let rows = orthonormal_rows(dim, seed);

        let mixing: Vec<f32> = rows.iter().flatten().map(|&x| x as f32).collect();
        let unmixing: Vec<f32> = (0..dim)
            .flat_map(|col| rows.iter().map(move |row| row[col] as f32))
            .collect();

        Ok(Self {
            primes,
            seed,
            mixing: Tensor::from_vec(mixing, (dim, dim), device)?,
            unmixing: Tensor::from_vec(unmixing, (dim, dim), device)?,
        })
    }

    /// The mixing matrix `Q`
    pub fn matrix(&self) -> &Tensor {
        &self.mixing
    }
}

impl Binding for OrthogonalMixing {
    fn strategy(&self) -> BindingStrategy {
        BindingStrategy::Orthogonal { seed: self.seed }
    }

    fn dim(&self) -> usize {
        2 * self.primes
    }

    fn combine(&self, points: &Tensor) -> Result<Tensor> {
        check_points(points, self.primes)?;
        let row = points.reshape((1, self.dim()))?;
        Ok(row.matmul(&self.mixing)?.flatten_all()?)
    }

    fn extract(&self, composite: &Tensor) -> Result<Tensor> {
        check_composite(composite, self.dim())?;
        let row = composite.reshape((1, self.dim()))?;
        Ok(row.matmul(&self.unmixing)?.reshape((self.primes, 2))?)
    }
}

/// Deterministic `dim × dim` orthonormal matrix (rows), by Gram–Schmidt over
/// rows drawn from a 64-bit LCG.
fn orthonormal_rows(dim: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state as f64 / u64::MAX as f64) * 2.0 - 1.0
    };

    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(dim);
    while rows.len() < dim {
        let mut v: Vec<f64> = (0..dim).map(|_| next()).collect();

        // Modified Gram–Schmidt, twice for numerical stability
        for _ in 0..2 {
            for row in &rows {
                let dot: f64 = v.iter().zip(row).map(|(a, b)| a * b).sum();
                for (x, r) in v.iter_mut().zip(row) {
                    *x -= dot * r;
                }
            }
        }

        let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm < 1e-6 {
            // Nearly dependent draw; take another
            continue;
        }
        v.iter_mut().for_each(|x| *x /= norm);
        rows.push(v);
    }
    rows
}
