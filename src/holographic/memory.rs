//! Associative memories over phase points
//!
//! Both memories perform a single modern-Hopfield update with a fixed,
//! explicit set of stored patterns:
//!
//! ```text
//! scores  = beta · (K · q)           real part of ⟨q, k_j⟩ for each stored key
//! weights = softmax(scores)
//! auto:     residue = argmax(weights)
//! hetero:   output  = weightsᵀ · V
//! ```
//!
//! [`AssociativeMemory`] stores the `p` roots of unity of one prime and is the
//! decoder. [`HeteroAssociativeMemory`] stores key/value pairs and carries a
//! phase between the additive circle and the multiplicative circle of a prime.

use crate::phase::{embed, mul_embed, roots_of_unity, PhasePoint, PrimeTables};
use crate::primitives::{argmax, softmax_with_beta};
use crate::{Result, HrrError};
use candle_core::{Device, Tensor};

/// Reject betas the softmax readout cannot use.
pub fn validate_beta(beta: f32) -> Result<()> {
    if beta.is_finite() && beta > 0.0 {
        Ok(())
    } else {
        Err(HrrError::InvalidBeta(beta))
    }
}

fn as_query(query: &Tensor) -> Result<Tensor> {
    if query.elem_count() != 2 {
        return Err(HrrError::Tensor(format!(
            "Query must hold one phase point, got {:?}",
            query.dims()
        )));
    }
    Ok(query.reshape((1, 2))?)
}

fn transpose_points(points: &[PhasePoint], device: &Device) -> Result<Tensor> {
    let xs = points.iter().map(|p| p[0]);
    let ys = points.iter().map(|p| p[1]);
    let flat: Vec<f32> = xs.chain(ys).collect();
    Ok(Tensor::from_vec(flat, (2, points.len()), device)?)
}

// ============================================================================
// Auto-associative decoder
// ============================================================================

/// Decoder memory for one prime: the `p` canonical phase points.
#[derive(Debug, Clone)]
pub struct AssociativeMemory {
    modulus: u64,
    /// `[p, 2]`
    patterns: Tensor,
    /// `[2, p]`, kept contiguous for the score matmul
    patterns_t: Tensor,
}

impl AssociativeMemory {
    /// Memory holding `ζ_p^0 … ζ_p^{p−1}`
    pub fn canonical(p: u64, device: &Device) -> Result<Self> {
        let points: Vec<PhasePoint> = (0..p).map(|r| embed(r, p)).collect();
        Ok(Self {
            modulus: p,
            patterns: roots_of_unity(p, device)?,
            patterns_t: transpose_points(&points, device)?,
        })
    }

    /// Modulus `p` (number of stored patterns)
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Stored patterns, `[p, 2]`
    pub fn patterns(&self) -> &Tensor {
        &self.patterns
    }

    /// Raw similarities `⟨q, ζ_p^j⟩`, shape `[p]`
    pub fn scores(&self, query: &Tensor) -> Result<Tensor> {
        let q = as_query(query)?;
        Ok(q.matmul(&self.patterns_t)?.squeeze(0)?)
    }

    /// Retrieval distribution `softmax(beta · scores)`, shape `[p]`
    pub fn distribution(&self, query: &Tensor, beta: f32) -> Result<Tensor> {
        validate_beta(beta)?;
        softmax_with_beta(&self.scores(query)?, beta)
    }

    /// Most likely residue
    pub fn retrieve(&self, query: &Tensor, beta: f32) -> Result<u64> {
        Ok(self.retrieve_with_confidence(query, beta)?.0)
    }

    /// Most likely residue together with its retrieval probability
    pub fn retrieve_with_confidence(&self, query: &Tensor, beta: f32) -> Result<(u64, f32)> {
        let dist = self.distribution(query, beta)?;
        let residue = argmax(&dist)?;
        let confidence = dist.get(residue)?.to_scalar::<f32>()?;
        Ok((residue as u64, confidence))
    }
}

// ============================================================================
// Hetero-associative map
// ============================================================================

/// Key → value phase memory with a softmax readout.
#[derive(Debug, Clone)]
pub struct HeteroAssociativeMemory {
    /// `[2, n]`
    keys_t: Tensor,
    /// `[n, 2]`
    values: Tensor,
}

impl HeteroAssociativeMemory {
    /// Memory storing `keys[j] → values[j]`
    pub fn new(keys: &[PhasePoint], values: &[PhasePoint], device: &Device) -> Result<Self> {
        if keys.is_empty() || keys.len() != values.len() {
            return Err(HrrError::Tensor(format!(
                "Hetero-associative memory needs matching non-empty keys/values, got {}/{}",
                keys.len(),
                values.len()
            )));
        }
        let flat: Vec<f32> = values.iter().flatten().copied().collect();
        Ok(Self {
            keys_t: transpose_points(keys, device)?,
            values: Tensor::from_vec(flat, (values.len(), 2), device)?,
        })
    }

    /// Additive circle of `p` → multiplicative circle of `p − 1`.
    ///
    /// Key `ζ_p^{g^k}` recalls `ζ_{p−1}^k`. The zero residue has no logarithm;
    /// its key `ζ_p^0` recalls the zero vector.
    pub fn to_multiplicative(tables: &PrimeTables, device: &Device) -> Result<Self> {
        let p = tables.prime();
        let mut keys = vec![embed(0, p)];
        let mut values = vec![[0.0, 0.0]];
        for k in 1..p {
            keys.push(embed(tables.exp(k), p));
            values.push(mul_embed(k, p));
        }
        Self::new(&keys, &values, device)
    }

    /// Multiplicative circle of `p − 1` → additive circle of `p`.
    ///
    /// Key `ζ_{p−1}^k` recalls `ζ_p^{g^k}`.
    pub fn from_multiplicative(tables: &PrimeTables, device: &Device) -> Result<Self> {
        let p = tables.prime();
        let keys: Vec<PhasePoint> = (1..p).map(|k| mul_embed(k, p)).collect();
        let values: Vec<PhasePoint> = (1..p).map(|k| embed(tables.exp(k), p)).collect();
        Self::new(&keys, &values, device)
    }

    /// Number of stored pairs
    pub fn len(&self) -> usize {
        self.values.dims()[0]
    }

    /// Always false: construction rejects empty memories
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Softmax-weighted recall for one query, shape `[1, 2]`
    pub fn readout(&self, query: &Tensor, beta: f32) -> Result<Tensor> {
        validate_beta(beta)?;
        let q = as_query(query)?;
        let weights = softmax_with_beta(&q.matmul(&self.keys_t)?, beta)?;
        Ok(weights.matmul(&self.values)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::tables_for;

    fn point(p: PhasePoint) -> Tensor {
        Tensor::from_vec(p.to_vec(), (1, 2), &Device::Cpu).unwrap()
    }

    fn rotated(r: u64, p: u64, offset: f32) -> Tensor {
        let angle = std::f32::consts::TAU * r as f32 / p as f32 + offset;
        point([angle.cos(), angle.sin()])
    }

    #[test]
    fn test_retrieve_exact() {
        for p in [2u64, 3, 5, 7, 13] {
            let memory = AssociativeMemory::canonical(p, &Device::Cpu).unwrap();
            for r in 0..p {
                assert_eq!(memory.retrieve(&point(embed(r, p)), 25.0).unwrap(), r);
            }
        }
    }

    #[test]
    fn test_retrieve_noisy() {
        let p = 11;
        let memory = AssociativeMemory::canonical(p, &Device::Cpu).unwrap();
        // Less than half the spacing between neighbours
        let offset = 0.4 * std::f32::consts::TAU / p as f32;
        for r in 0..p {
            assert_eq!(memory.retrieve(&rotated(r, p, offset), 10.0).unwrap(), r);
            assert_eq!(memory.retrieve(&rotated(r, p, -offset), 10.0).unwrap(), r);
        }
    }

    #[test]
    fn test_distribution_sharpens_with_beta() {
        let memory = AssociativeMemory::canonical(5, &Device::Cpu).unwrap();
        let q = rotated(2, 5, 0.2);

        let (r_soft, c_soft) = memory.retrieve_with_confidence(&q, 1.0).unwrap();
        let (r_sharp, c_sharp) = memory.retrieve_with_confidence(&q, 100.0).unwrap();

        assert_eq!(r_soft, 2);
        assert_eq!(r_sharp, 2);
        assert!(c_sharp > c_soft);
        assert!(c_sharp > 0.99);

        let dist = memory.distribution(&q, 1.0).unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(dist.len(), 5);
        assert!((dist.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_tiny_beta_is_uniform() {
        let memory = AssociativeMemory::canonical(4, &Device::Cpu).unwrap();
        let dist = memory
            .distribution(&point(embed(1, 4)), 1e-6)
            .unwrap()
            .to_vec1::<f32>()
            .unwrap();
        for v in dist {
            assert!((v - 0.25).abs() < 1e-4);
        }
    }

    #[test]
    fn test_invalid_beta() {
        let memory = AssociativeMemory::canonical(3, &Device::Cpu).unwrap();
        let q = point(embed(1, 3));
        assert!(matches!(memory.retrieve(&q, 0.0), Err(HrrError::InvalidBeta(_))));
        assert!(matches!(memory.retrieve(&q, -1.0), Err(HrrError::InvalidBeta(_))));
        assert!(matches!(memory.retrieve(&q, f32::NAN), Err(HrrError::InvalidBeta(_))));
    }

    #[test]
    fn test_query_shape() {
        let memory = AssociativeMemory::canonical(3, &Device::Cpu).unwrap();
        let flat = Tensor::from_vec(vec![1.0f32, 0.0], 2, &Device::Cpu).unwrap();
        assert_eq!(memory.retrieve(&flat, 10.0).unwrap(), 0);

        let wrong = Tensor::from_vec(vec![1.0f32, 0.0, 0.0], 3, &Device::Cpu).unwrap();
        assert!(memory.retrieve(&wrong, 10.0).is_err());
    }

    #[test]
    fn test_multiplicative_maps_are_inverse() {
        for p in [3u64, 5, 7, 11, 13] {
            let tables = tables_for(p).unwrap();
            let forward = HeteroAssociativeMemory::to_multiplicative(&tables, &Device::Cpu).unwrap();
            let backward = HeteroAssociativeMemory::from_multiplicative(&tables, &Device::Cpu).unwrap();
            let decoder = AssociativeMemory::canonical(p, &Device::Cpu).unwrap();

            assert_eq!(forward.len(), p as usize);
            assert_eq!(backward.len(), p as usize - 1);

            for n in 1..p {
                let lifted = forward.readout(&point(embed(n, p)), 100.0).unwrap();
                let expected = mul_embed(tables.log(n).unwrap(), p);
                let got = lifted.to_vec2::<f32>().unwrap();
                assert!((got[0][0] - expected[0]).abs() < 1e-3);
                assert!((got[0][1] - expected[1]).abs() < 1e-3);

                let lowered = backward.readout(&lifted, 100.0).unwrap();
                assert_eq!(decoder.retrieve(&lowered, 100.0).unwrap(), n);
            }
        }
    }

    #[test]
    fn test_zero_residue_lifts_to_zero_vector() {
        let tables = tables_for(7).unwrap();
        let forward = HeteroAssociativeMemory::to_multiplicative(&tables, &Device::Cpu).unwrap();
        let lifted = forward.readout(&point(embed(0, 7)), 100.0).unwrap();
        let norm = lifted.sqr().unwrap().sum_all().unwrap().sqrt().unwrap();
        assert!(norm.to_scalar::<f32>().unwrap() < 1e-3);
    }

    #[test]
    fn test_mismatched_memory() {
        let keys = [embed(0, 3), embed(1, 3)];
        let values = [embed(0, 3)];
        assert!(HeteroAssociativeMemory::new(&keys, &values, &Device::Cpu).is_err());
        assert!(HeteroAssociativeMemory::new(&[], &[], &Device::Cpu).is_err());
    }
}
