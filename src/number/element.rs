//! Integer elements and their arithmetic
//!
//! An [`Element`] is a composite vector bound to a [`NumberSystem`]. Every
//! operation returns a new element; nothing is mutated in place.
//!
//! ## Operations
//!
//! - **Add**: per-prime complex product (angles add), no decode on the way
//! - **Neg / Sub**: per-prime conjugate, `a − b = a + (−b)`, wraps around
//! - **Mul**: lift both operands to the multiplicative circle, complex product,
//!   lower back
//! - **Div**: as Mul with the divisor conjugated on the multiplicative circle
//!
//! Division is **not** integer division. It multiplies by the multiplicative
//! pseudo-inverse, so `(x / y) * y == x` whenever no residue of `y` is zero.
//! A zero residue of `y` makes that coordinate of the result zero; use
//! [`Element::checked_div`] to reject such divisors instead.

use super::system::{NumberSystem, ZERO_THRESHOLD};
use crate::holographic::validate_beta;
use crate::primitives::{complex_mul, conjugate, cosine_similarity, row_norms};
use crate::{residue, Result, HrrError};
use candle_core::Tensor;
use tracing::trace;

/// An integer represented as a composite phase vector
#[derive(Debug, Clone)]
pub struct Element {
    system: NumberSystem,
    vector: Tensor,
}

impl Element {
    pub(crate) fn from_parts(system: NumberSystem, vector: Tensor) -> Self {
        Self { system, vector }
    }

    /// The system this element belongs to
    pub fn system(&self) -> &NumberSystem {
        &self.system
    }

    /// The composite vector, `[dim]`
    pub fn vector(&self) -> &Tensor {
        &self.vector
    }

    /// Per-prime phase points extracted from the composite vector, `[k, 2]`
    pub fn points(&self) -> Result<Tensor> {
        self.system.binder().extract(&self.vector)
    }

    // ------------------------------------------------------------------------
    // Decoding
    // ------------------------------------------------------------------------

    fn retrieve_all(&self, beta: f32) -> Result<Vec<(u64, f32)>> {
        validate_beta(beta)?;
        let points = self.points()?;
        self.system
            .channels()
            .iter()
            .enumerate()
            .map(|(i, channel)| {
                let query = points.narrow(0, i, 1)?;
                channel.decoder.retrieve_with_confidence(&query, beta)
            })
            .collect()
    }

    /// Decode to an integer in `[0, max_value]` with the system's beta.
    ///
    /// Decoding never fails because of noise: a corrupted vector decodes to a
    /// possibly wrong integer.
    pub fn decode(&self) -> Result<u64> {
        self.decode_with_beta(self.system.beta())
    }

    /// Decode with an explicit beta
    pub fn decode_with_beta(&self, beta: f32) -> Result<u64> {
        let retrieved = self.retrieve_all(beta)?;
        let residues: Vec<u64> = retrieved.iter().map(|(r, _)| *r).collect();
        let value = residue::decode(&residues, self.system.basis())?;

        trace!(
            value,
            confidence = retrieved.iter().map(|(_, c)| *c).fold(1.0f32, f32::min),
            "decoded element"
        );
        Ok(value)
    }

    /// Decoded residues, one per prime, skipping the CRT step
    pub fn decode_residues(&self) -> Result<Vec<u64>> {
        Ok(self
            .retrieve_all(self.system.beta())?
            .into_iter()
            .map(|(r, _)| r)
            .collect())
    }

    /// Full retrieval distribution for every prime (`p_i` probabilities each)
    pub fn decode_distribution(&self) -> Result<Vec<Vec<f32>>> {
        let beta = self.system.beta();
        let points = self.points()?;
        self.system
            .channels()
            .iter()
            .enumerate()
            .map(|(i, channel)| {
                let query = points.narrow(0, i, 1)?;
                Ok(channel.decoder.distribution(&query, beta)?.to_vec1::<f32>()?)
            })
            .collect()
    }

    /// Smallest winning probability across the primes.
    ///
    /// Close to 1 when every residue was retrieved unambiguously.
    pub fn confidence(&self) -> Result<f32> {
        Ok(self
            .retrieve_all(self.system.beta())?
            .into_iter()
            .map(|(_, c)| c)
            .fold(1.0f32, f32::min))
    }

    // ------------------------------------------------------------------------
    // Arithmetic
    // ------------------------------------------------------------------------

    /// `self + rhs` modulo `max_value + 1`
    pub fn add(&self, rhs: &Element) -> Result<Element> {
        self.system.ensure_compatible(&rhs.system)?;
        let sum = complex_mul(&self.points()?, &rhs.points()?)?;
        self.system.element_from_points(&sum)
    }

    /// `−self`, i.e. `max_value + 1 − self`
    pub fn neg(&self) -> Result<Element> {
        let negated = conjugate(&self.points()?)?;
        self.system.element_from_points(&negated)
    }

    /// `self − rhs`, wrapping below zero to the top of the range
    pub fn sub(&self, rhs: &Element) -> Result<Element> {
        self.add(&rhs.neg()?)
    }

    /// `self · rhs` modulo `max_value + 1`
    pub fn mul(&self, rhs: &Element) -> Result<Element> {
        self.multiply(rhs, false)
    }

    /// `self` times the multiplicative pseudo-inverse of `rhs`.
    ///
    /// Not integer division; see the module documentation.
    pub fn div(&self, rhs: &Element) -> Result<Element> {
        self.multiply(rhs, true)
    }

    /// Division that refuses divisors with a zero residue.
    ///
    /// # Errors
    /// [`HrrError::ZeroDivisor`] naming the first prime dividing `rhs`.
    pub fn checked_div(&self, rhs: &Element) -> Result<Element> {
        self.system.ensure_compatible(&rhs.system)?;
        let residues = rhs.decode_residues()?;
        if let Some((_, &prime)) = residues
            .iter()
            .zip(self.system.primes())
            .find(|(r, _)| **r == 0)
        {
            return Err(HrrError::ZeroDivisor { prime });
        }
        self.div(rhs)
    }

    /// `self^exp` by repeated squaring; `x^0 = 1`
    pub fn pow(&self, mut exp: u64) -> Result<Element> {
        let mut result = self.system.one()?;
        let mut base = self.clone();
        while exp > 0 {
            if exp & 1 == 1 {
                result = Element::mul(&result, &base)?;
            }
            exp >>= 1;
            if exp > 0 {
                base = Element::mul(&base, &base)?;
            }
        }
        Ok(result)
    }

    fn multiply(&self, rhs: &Element, invert: bool) -> Result<Element> {
        self.system.ensure_compatible(&rhs.system)?;
        let beta = self.system.beta();
        let a = self.points()?;
        let b = rhs.points()?;

        let rows = self
            .system
            .channels()
            .iter()
            .enumerate()
            .map(|(i, channel)| {
                let x = channel.lift(&a.narrow(0, i, 1)?, beta)?;
                let y = channel.lift(&b.narrow(0, i, 1)?, beta)?;
                let y = if invert { conjugate(&y)? } else { y };
                channel.lower(&complex_mul(&x, &y)?, beta)
            })
            .collect::<Result<Vec<_>>>()?;

        let product = Tensor::cat(&rows, 0)?;
        self.system.element_from_points(&product)
    }

    // ------------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------------

    /// Add Gaussian noise with standard deviation `sigma` to every coordinate
    /// of the composite vector.
    pub fn perturb(&self, sigma: f32) -> Result<Element> {
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(HrrError::Config(format!(
                "noise sigma must be finite and non-negative, got {}",
                sigma
            )));
        }
        if sigma == 0.0 {
            return Ok(self.clone());
        }
        let noise = Tensor::randn(0f32, sigma, self.vector.dims(), self.vector.device())?;
        Ok(Self::from_parts(self.system.clone(), (&self.vector + &noise)?))
    }

    /// The same vector viewed through another compatible system (typically
    /// one with a different beta).
    pub fn rebind(&self, system: &NumberSystem) -> Result<Element> {
        system.ensure_compatible(&self.system)?;
        Ok(Self::from_parts(system.clone(), self.vector.clone()))
    }

    /// Cosine similarity of the two composite vectors
    pub fn similarity(&self, other: &Element) -> Result<f32> {
        self.system.ensure_compatible(&other.system)?;
        cosine_similarity(&self.vector, &other.vector)
    }

    /// Whether no residue is zero, so division by `self` is exact.
    pub fn is_invertible(&self) -> Result<bool> {
        let beta = self.system.beta();
        let points = self.points()?;
        for (i, channel) in self.system.channels().iter().enumerate() {
            let lifted = channel.lift(&points.narrow(0, i, 1)?, beta)?;
            if row_norms(&lifted)?[0] < ZERO_THRESHOLD {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

// ============================================================================
// Operator Traits
// ============================================================================

macro_rules! bin_trait {
    ($trait:ident, $fn:ident) => {
        impl std::ops::$trait<&Element> for &Element {
            type Output = Result<Element>;

            fn $fn(self, rhs: &Element) -> Self::Output {
                Element::$fn(self, rhs)
            }
        }

        impl std::ops::$trait<Element> for &Element {
            type Output = Result<Element>;

            fn $fn(self, rhs: Element) -> Self::Output {
                Element::$fn(self, &rhs)
            }
        }

        impl std::ops::$trait<&Element> for Element {
            type Output = Result<Element>;

            fn $fn(self, rhs: &Element) -> Self::Output {
                Element::$fn(&self, rhs)
            }
        }

        impl std::ops::$trait<Element> for Element {
            type Output = Result<Element>;

            fn $fn(self, rhs: Element) -> Self::Output {
                Element::$fn(&self, &rhs)
            }
        }
    };
}

bin_trait!(Add, add);
bin_trait!(Sub, sub);
bin_trait!(Mul, mul);
bin_trait!(Div, div);

impl std::ops::Neg for &Element {
    type Output = Result<Element>;

    fn neg(self) -> Self::Output {
        Element::neg(self)
    }
}

impl std::ops::Neg for Element {
    type Output = Result<Element>;

    fn neg(self) -> Self::Output {
        Element::neg(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::Basis;
    use crate::holographic::BindingStrategy;
    use crate::number::NumberSystemConfig;
    use crate::primitives::cpu_device;

    fn system(min_range: u64, beta: f32) -> NumberSystem {
        NumberSystem::with_device(&NumberSystemConfig::new(min_range, beta), &cpu_device()).unwrap()
    }

    #[test]
    fn test_concrete_scenario() {
        let numbers = system(25, 25.0);
        assert_eq!(numbers.primes(), &[2, 3, 5]);
        assert_eq!(numbers.max_value(), 29);

        let seven = numbers.encode(7).unwrap();
        let three = numbers.encode(3).unwrap();

        assert_eq!(seven.decode_residues().unwrap(), vec![1, 1, 2]);
        assert_eq!(three.decode_residues().unwrap(), vec![1, 0, 3]);

        assert_eq!((&seven + &three).unwrap().decode().unwrap(), 10);
        assert_eq!((&seven * &three).unwrap().decode().unwrap(), 21);
        assert_eq!((&seven - &three).unwrap().decode().unwrap(), 4);
    }

    #[test]
    fn test_round_trip() {
        let numbers = system(210, 25.0);
        for v in 0..=numbers.max_value() {
            assert_eq!(numbers.encode(v).unwrap().decode().unwrap(), v);
        }
    }

    #[test]
    fn test_round_trip_orthogonal_binding() {
        let config = NumberSystemConfig::new(210, 25.0)
            .with_binding(BindingStrategy::Orthogonal { seed: 17 });
        let numbers = NumberSystem::with_device(&config, &cpu_device()).unwrap();
        for v in 0..=numbers.max_value() {
            assert_eq!(numbers.encode(v).unwrap().decode().unwrap(), v);
        }

        let a = numbers.encode(123).unwrap();
        let b = numbers.encode(45).unwrap();
        assert_eq!((&a + &b).unwrap().decode().unwrap(), 168);
        assert_eq!((&a * &b).unwrap().decode().unwrap(), 123 * 45 % 210);
    }

    #[test]
    fn test_addition_and_subtraction_law() {
        let numbers = system(210, 25.0);
        let modulus = numbers.max_value() + 1;
        let elements: Vec<Element> = (0..modulus).map(|v| numbers.encode(v).unwrap()).collect();

        for a in (0..modulus).step_by(7) {
            for b in 0..modulus {
                let x = &elements[a as usize];
                let y = &elements[b as usize];
                assert_eq!((x + y).unwrap().decode().unwrap(), (a + b) % modulus);
                assert_eq!(
                    (x - y).unwrap().decode().unwrap(),
                    (a + modulus - b) % modulus
                );
            }
        }
    }

    #[test]
    fn test_multiplication_law() {
        let numbers = system(210, 100.0);
        let modulus = numbers.max_value() + 1;
        let elements: Vec<Element> = (0..modulus).map(|v| numbers.encode(v).unwrap()).collect();

        for a in (0..modulus).step_by(11) {
            for b in 0..modulus {
                let product = (&elements[a as usize] * &elements[b as usize]).unwrap();
                assert_eq!(product.decode().unwrap(), a * b % modulus, "{} * {}", a, b);
            }
        }
    }

    #[test]
    fn test_multiplication_by_zero_and_one() {
        let numbers = system(2310, 100.0);
        let zero = numbers.encode(0).unwrap();
        let one = numbers.one().unwrap();
        for v in [0u64, 1, 2, 17, 1000, 2309] {
            let x = numbers.encode(v).unwrap();
            assert_eq!((&x * &zero).unwrap().decode().unwrap(), 0);
            assert_eq!((&x * &one).unwrap().decode().unwrap(), v);
        }
    }

    #[test]
    fn test_division_inverts_multiplication() {
        let numbers = system(210, 100.0);
        // Divisors with no zero residue: coprime to 2·3·5·7
        let divisors = [1u64, 11, 13, 17, 101, 209];
        for &d in &divisors {
            let y = numbers.encode(d).unwrap();
            assert!(y.is_invertible().unwrap());
            for a in (0..210u64).step_by(5) {
                let x = numbers.encode(a).unwrap();
                let quotient = (&x / &y).unwrap();
                assert_eq!((&quotient * &y).unwrap().decode().unwrap(), a);
                assert_eq!((&y * &quotient).unwrap().decode().unwrap(), a);
            }
        }
    }

    #[test]
    fn test_division_is_not_integer_division() {
        let numbers = system(25, 25.0);
        let ten = numbers.encode(10).unwrap();
        let seven = numbers.encode(7).unwrap();
        // 10 · 7⁻¹ mod 30 = 10 · 13 mod 30 = 10
        let quotient = (&ten / &seven).unwrap().decode().unwrap();
        assert_eq!(quotient, 10);
        assert_ne!(quotient, 10 / 7);
    }

    #[test]
    fn test_division_by_zero_residue() {
        let numbers = system(25, 25.0);
        let seven = numbers.encode(7).unwrap();
        let three = numbers.encode(3).unwrap();

        assert!(!three.is_invertible().unwrap());

        // Pseudo-inverse: the mod-3 coordinate collapses to 0
        let quotient = (&seven / &three).unwrap();
        assert_eq!(quotient.decode_residues().unwrap()[1], 0);

        assert!(matches!(
            seven.checked_div(&three),
            Err(HrrError::ZeroDivisor { prime: 3 })
        ));
        assert!(seven.checked_div(&numbers.encode(7).unwrap()).is_ok());
    }

    #[test]
    fn test_wraparound() {
        let basis = Basis::from_primes(&[7]).unwrap();
        let numbers =
            NumberSystem::from_basis(basis, 25.0, BindingStrategy::Concatenate, &cpu_device()).unwrap();
        assert_eq!(numbers.max_value(), 6);

        let zero = numbers.encode(0).unwrap();
        let one = numbers.encode(1).unwrap();
        assert_eq!((&zero - &one).unwrap().decode().unwrap(), 6);

        let numbers = system(25, 25.0);
        let diff = (numbers.encode(2).unwrap() - numbers.encode(5).unwrap()).unwrap();
        assert_eq!(diff.decode().unwrap(), 27);
    }

    #[test]
    fn test_negation_and_signed_encoding() {
        let numbers = system(25, 25.0);
        let minus_one = numbers.encode_signed(-1).unwrap();
        assert_eq!(minus_one.decode().unwrap(), 29);

        let four = numbers.encode(4).unwrap();
        assert_eq!((-&four).unwrap().decode().unwrap(), 26);
        assert_eq!((-(-&four).unwrap()).unwrap().decode().unwrap(), 4);
    }

    #[test]
    fn test_pow() {
        let numbers = system(2310, 100.0);
        let three = numbers.encode(3).unwrap();
        assert_eq!(three.pow(0).unwrap().decode().unwrap(), 1);
        assert_eq!(three.pow(1).unwrap().decode().unwrap(), 3);
        assert_eq!(three.pow(5).unwrap().decode().unwrap(), 243);
        assert_eq!(three.pow(7).unwrap().decode().unwrap(), 2187);
        assert_eq!(three.pow(8).unwrap().decode().unwrap(), 6561 % 2310);
    }

    #[test]
    fn test_incompatible_operands() {
        let a = system(25, 25.0).encode(3).unwrap();
        let b = system(100, 25.0).encode(3).unwrap();
        assert!(matches!(&a + &b, Err(HrrError::IncompatibleSystem(_))));
        assert!(matches!(&a * &b, Err(HrrError::IncompatibleSystem(_))));
        assert!(matches!(a.rebind(b.system()), Err(HrrError::IncompatibleSystem(_))));
    }

    #[test]
    fn test_operands_from_equal_systems_combine() {
        let a = system(25, 25.0).encode(3).unwrap();
        let b = system(25, 25.0).encode(4).unwrap();
        assert_eq!((&a + &b).unwrap().decode().unwrap(), 7);
    }

    #[test]
    fn test_decode_distribution() {
        let numbers = system(25, 25.0);
        let x = numbers.encode(7).unwrap();
        let dist = x.decode_distribution().unwrap();

        assert_eq!(dist.len(), 3);
        for (probs, &p) in dist.iter().zip(numbers.primes()) {
            assert_eq!(probs.len(), p as usize);
            assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
        assert!(x.confidence().unwrap() > 0.99);

        let soft = x.rebind(&numbers.with_beta(0.5).unwrap()).unwrap();
        assert!(soft.confidence().unwrap() < x.confidence().unwrap());
    }

    #[test]
    fn test_similarity() {
        let numbers = system(210, 25.0);
        let a = numbers.encode(42).unwrap();
        assert!((a.similarity(&a).unwrap() - 1.0).abs() < 1e-5);
        assert!(a.similarity(&numbers.encode(43).unwrap()).unwrap() < 0.99);
    }

    #[test]
    fn test_perturb() {
        let numbers = system(210, 25.0);
        let x = numbers.encode(99).unwrap();

        let same = x.perturb(0.0).unwrap();
        assert!((x.similarity(&same).unwrap() - 1.0).abs() < 1e-6);

        // Small noise is cleaned up by the decoder
        for _ in 0..20 {
            assert_eq!(x.perturb(0.02).unwrap().decode().unwrap(), 99);
        }

        assert!(x.perturb(-1.0).is_err());
        assert!(x.perturb(f32::NAN).is_err());
    }

    #[test]
    fn test_hard_decode_ignores_beta() {
        let numbers = system(210, 25.0);
        let noisy: Vec<Element> = (0..40)
            .map(|v| numbers.encode(v * 5).unwrap().perturb(0.4).unwrap())
            .collect();

        let decoded = |beta: f32| -> Vec<u64> {
            noisy.iter().map(|x| x.decode_with_beta(beta).unwrap()).collect()
        };
        assert_eq!(decoded(1.0), decoded(100.0));
    }

    #[test]
    fn test_error_rate_non_increasing_in_beta() {
        let numbers = system(210, 25.0);
        let modulus = numbers.max_value() + 1;

        let operands: Vec<(u64, u64, Element, Element)> = (0..80u64)
            .map(|i| {
                let a = (i * 37 + 11) % modulus;
                let b = (i * 53 + 5) % modulus;
                let x = numbers.encode(a).unwrap().perturb(0.1).unwrap();
                let y = numbers.encode(b).unwrap().perturb(0.1).unwrap();
                (a, b, x, y)
            })
            .collect();

        let errors: Vec<usize> = [1.0f32, 10.0, 100.0]
            .iter()
            .map(|&beta| {
                let sharp = numbers.with_beta(beta).unwrap();
                operands
                    .iter()
                    .filter(|(a, b, x, y)| {
                        let x = x.rebind(&sharp).unwrap();
                        let y = y.rebind(&sharp).unwrap();
                        (&x * &y).unwrap().decode().unwrap() != a * b % modulus
                    })
                    .count()
            })
            .collect();

        assert!(errors[0] >= errors[1], "errors by beta: {:?}", errors);
        assert!(errors[1] >= errors[2], "errors by beta: {:?}", errors);
        assert!(errors[0] > errors[2], "errors by beta: {:?}", errors);
    }

    #[test]
    fn test_parallel_arithmetic() {
        use std::thread;

        let numbers = system(2310, 100.0);
        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let numbers = numbers.clone();
                thread::spawn(move || {
                    let a = numbers.encode(100 + i).unwrap();
                    let b = numbers.encode(7 + i).unwrap();
                    (&a * &b).unwrap().decode().unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let i = i as u64;
            assert_eq!(handle.join().unwrap(), (100 + i) * (7 + i) % 2310);
        }
    }
}
