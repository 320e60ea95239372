//! The number system: basis, memories and encoding

use super::config::NumberSystemConfig;
use super::element::Element;
use crate::basis::Basis;
use crate::holographic::{
    validate_beta, AssociativeMemory, Binding, BindingStrategy, HeteroAssociativeMemory,
};
use crate::phase::{embed, embed_all, tables_for, PrimeTables};
use crate::primitives::{best_device, normalize_rows, row_norms};
use crate::{residue, Result, HrrError};
use candle_core::{Device, Tensor};
use std::sync::Arc;
use tracing::debug;

/// Below this magnitude a multiplicative-domain point is the zero element.
pub(crate) const ZERO_THRESHOLD: f32 = 0.5;

/// Everything one prime of the basis needs at run time.
#[derive(Debug)]
pub(crate) struct PrimeChannel {
    pub(crate) prime: u64,
    pub(crate) tables: Arc<PrimeTables>,
    pub(crate) decoder: AssociativeMemory,
    lift: HeteroAssociativeMemory,
    lower: HeteroAssociativeMemory,
}

impl PrimeChannel {
    fn new(prime: u64, device: &Device) -> Result<Self> {
        let tables = tables_for(prime)?;
        Ok(Self {
            prime,
            decoder: AssociativeMemory::canonical(prime, device)?,
            lift: HeteroAssociativeMemory::to_multiplicative(&tables, device)?,
            lower: HeteroAssociativeMemory::from_multiplicative(&tables, device)?,
            tables,
        })
    }

    /// Additive point → multiplicative point; the zero residue becomes the
    /// zero vector, anything else is put back on the unit circle.
    pub(crate) fn lift(&self, point: &Tensor, beta: f32) -> Result<Tensor> {
        let lifted = self.lift.readout(point, beta)?;
        if row_norms(&lifted)?[0] < ZERO_THRESHOLD {
            Ok(lifted.zeros_like()?)
        } else {
            normalize_rows(&lifted)
        }
    }

    /// Multiplicative point → additive point. A (near) zero product is the
    /// zero residue and skips the memory.
    pub(crate) fn lower(&self, point: &Tensor, beta: f32) -> Result<Tensor> {
        if row_norms(point)?[0] < ZERO_THRESHOLD {
            let zero = embed(0, self.prime);
            return Ok(Tensor::from_vec(zero.to_vec(), (1, 2), point.device())?);
        }
        normalize_rows(&self.lower.readout(point, beta)?)
    }
}

#[derive(Debug)]
struct SystemCore {
    basis: Basis,
    binding: Box<dyn Binding>,
    device: Device,
    channels: Vec<PrimeChannel>,
}

/// A holographic number system over a fixed prime basis.
///
/// Cheap to clone: the basis, memories and binding are shared. Every
/// [`Element`] keeps a handle to the system that produced it.
///
/// # Example
/// ```rust,ignore
/// let numbers = NumberSystem::new(25, 25.0)?;
/// let x = numbers.encode(7)?;
/// assert_eq!(x.decode_residues()?, vec![1, 1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct NumberSystem {
    core: Arc<SystemCore>,
    beta: f32,
}

impl NumberSystem {
    /// System representing at least `[0, min_range)` with readout sharpness `beta`
    pub fn new(min_range: u64, beta: f32) -> Result<Self> {
        Self::from_config(&NumberSystemConfig::new(min_range, beta))
    }

    /// System from a configuration, on the best available device
    pub fn from_config(config: &NumberSystemConfig) -> Result<Self> {
        Self::with_device(config, &best_device())
    }

    /// System from a configuration, on an explicit device
    pub fn with_device(config: &NumberSystemConfig, device: &Device) -> Result<Self> {
        config.validate()?;
        let basis = Basis::for_range(config.min_range)?;
        Self::from_basis(basis, config.beta, config.binding, device)
    }

    /// System over an explicit basis
    pub fn from_basis(
        basis: Basis,
        beta: f32,
        binding: BindingStrategy,
        device: &Device,
    ) -> Result<Self> {
        validate_beta(beta)?;

        let channels = basis
            .primes()
            .iter()
            .map(|&p| PrimeChannel::new(p, device))
            .collect::<Result<Vec<_>>>()?;
        let binding = binding.build(basis.len(), device)?;

        debug!(
            primes = ?basis.primes(),
            max_value = basis.max_value(),
            dim = binding.dim(),
            beta,
            "number system ready"
        );

        Ok(Self {
            core: Arc::new(SystemCore {
                basis,
                binding,
                device: device.clone(),
                channels,
            }),
            beta,
        })
    }

    /// Same basis and memories, different beta.
    ///
    /// Elements of `self` can be moved to the result with [`Element::rebind`].
    pub fn with_beta(&self, beta: f32) -> Result<Self> {
        validate_beta(beta)?;
        Ok(Self {
            core: Arc::clone(&self.core),
            beta,
        })
    }

    /// Readout sharpness
    pub fn beta(&self) -> f32 {
        self.beta
    }

    /// The prime basis
    pub fn basis(&self) -> &Basis {
        &self.core.basis
    }

    /// The basis primes, increasing
    pub fn primes(&self) -> &[u64] {
        self.core.basis.primes()
    }

    /// Largest representable value
    pub fn max_value(&self) -> u64 {
        self.core.basis.max_value()
    }

    /// Composite vector dimension
    pub fn dim(&self) -> usize {
        self.core.binding.dim()
    }

    /// Binding strategy in use
    pub fn binding(&self) -> BindingStrategy {
        self.core.binding.strategy()
    }

    /// Primitive root used for the multiplicative map of each prime
    pub fn generators(&self) -> Vec<u64> {
        self.channels().iter().map(|c| c.tables.generator()).collect()
    }

    /// Device the composite vectors live on
    pub fn device(&self) -> &Device {
        &self.core.device
    }

    /// Whether elements of `other` can be combined with elements of `self`.
    ///
    /// Beta may differ; basis, binding and device must agree.
    pub fn is_compatible(&self, other: &NumberSystem) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
            || (self.core.basis == other.core.basis
                && self.binding() == other.binding()
                && self.core.device.same_device(&other.core.device))
    }

    pub(crate) fn ensure_compatible(&self, other: &NumberSystem) -> Result<()> {
        if self.is_compatible(other) {
            Ok(())
        } else {
            Err(HrrError::IncompatibleSystem(format!(
                "primes {:?} ({:?}) vs {:?} ({:?})",
                self.primes(),
                self.binding(),
                other.primes(),
                other.binding()
            )))
        }
    }

    pub(crate) fn channels(&self) -> &[PrimeChannel] {
        &self.core.channels
    }

    pub(crate) fn binder(&self) -> &dyn Binding {
        self.core.binding.as_ref()
    }

    /// Encode `value ∈ [0, max_value]`.
    ///
    /// # Errors
    /// [`HrrError::ValueOutOfRange`] for larger values. Arithmetic wraps
    /// around; direct encoding does not.
    pub fn encode(&self, value: u64) -> Result<Element> {
        if value > self.max_value() {
            return Err(HrrError::ValueOutOfRange {
                value: value as i128,
                max_value: self.max_value(),
            });
        }
        self.encode_residues(&residue::encode(value, self.basis()))
    }

    /// Alias for [`encode`](Self::encode)
    pub fn element(&self, value: u64) -> Result<Element> {
        self.encode(value)
    }

    /// Encode a signed value with `|value| ≤ max_value`; negatives wrap, so
    /// `-1` encodes like `max_value`.
    pub fn encode_signed(&self, value: i64) -> Result<Element> {
        if value.unsigned_abs() > self.max_value() {
            return Err(HrrError::ValueOutOfRange {
                value: value as i128,
                max_value: self.max_value(),
            });
        }
        self.encode_residues(&residue::encode_signed(value, self.basis()))
    }

    /// Encode a residue tuple directly.
    pub fn encode_residues(&self, residues: &[u64]) -> Result<Element> {
        let primes = self.primes();
        if residues.len() != primes.len() || residues.iter().zip(primes).any(|(r, p)| r >= p) {
            return Err(HrrError::InconsistentResidue(format!(
                "{:?} is not a residue tuple for {:?}",
                residues, primes
            )));
        }
        let points = embed_all(residues, primes, self.device())?;
        self.element_from_points(&points)
    }

    /// The multiplicative identity
    pub fn one(&self) -> Result<Element> {
        self.encode_residues(&residue::encode(1, self.basis()))
    }

    pub(crate) fn element_from_points(&self, points: &Tensor) -> Result<Element> {
        let vector = self.binder().combine(points)?;
        Ok(Element::from_parts(self.clone(), vector))
    }
}
