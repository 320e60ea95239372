//! # hrr-numbers
//!
//! Integer arithmetic carried out on holographic phase vectors.
//!
//! ## Overview
//!
//! A non-negative integer is split into its residues modulo a small set of
//! primes. Each residue becomes a rotation on the unit circle, and the rotations
//! are bound into one fixed-dimension composite vector. Arithmetic then happens
//! on the vectors themselves:
//!
//! - **Addition / subtraction**: per-prime rotation composition (complex product / conjugate)
//! - **Multiplication / division**: the same rotation composition, performed after
//!   moving each phase through the isomorphism `F_p^× ≅ Z/(p-1)Z`
//! - **Decoding**: a one-shot modern-Hopfield readout over the `p` roots of unity
//!   per prime, followed by the Chinese Remainder Theorem
//!
//! The vector dimension depends only on the number of primes, not on the size
//! of the representable range. The price is a bounded, beta-dependent decode
//! error instead of exact arithmetic.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hrr_numbers::prelude::*;
//!
//! let numbers = NumberSystem::new(25, 25.0)?;
//! assert_eq!(numbers.primes(), &[2, 3, 5]);
//! assert_eq!(numbers.max_value(), 29);
//!
//! let seven = numbers.encode(7)?;
//! let three = numbers.encode(3)?;
//!
//! assert_eq!((&seven + &three)?.decode()?, 10);
//! assert_eq!((&seven - &three)?.decode()?, 4);
//! assert_eq!((&seven * &three)?.decode()?, 21);
//! assert_eq!(seven.decode_residues()?, vec![1, 1, 2]);
//! ```
//!
//! ## Feature Flags
//!
//! - `metal`: Apple Metal GPU acceleration
//! - `cuda`: NVIDIA CUDA GPU acceleration

pub mod primitives;
pub mod basis;
pub mod residue;
pub mod phase;
pub mod holographic;
pub mod number;

// Re-export candle types for convenience
pub use candle_core::{DType, Device, Tensor};

/// Error types for holographic number operations
#[derive(Debug, thiserror::Error)]
pub enum HrrError {
    #[error("Invalid range: {0} (the representable range must be at least 1)")]
    InvalidRange(u64),

    #[error("Range too large: the prime basis covering {0} overflows u64")]
    RangeTooLarge(u64),

    #[error("Invalid basis: {0}")]
    InvalidBasis(String),

    #[error("Value {value} is outside the representable range [0, {max_value}]")]
    ValueOutOfRange { value: i128, max_value: u64 },

    #[error("Incompatible number systems: {0}")]
    IncompatibleSystem(String),

    #[error("Division by an element with residue 0 modulo {prime}")]
    ZeroDivisor { prime: u64 },

    #[error("Inconsistent residues: {0}")]
    InconsistentResidue(String),

    #[error("Invalid beta: {0} (must be finite and positive)")]
    InvalidBeta(f32),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Tensor operation failed: {0}")]
    Tensor(String),

    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),
}

/// Result type alias for holographic number operations
pub type Result<T> = std::result::Result<T, HrrError>;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{DType, Device, Tensor};
    pub use crate::{HrrError, Result};

    // Primitives
    pub use crate::primitives::{best_device, cpu_device, gpu_disabled};

    // Basis and residues
    pub use crate::basis::{Basis, Primes};
    pub use crate::residue::{decode as crt_decode, encode as residues_of};

    // Phases
    pub use crate::phase::{embed, mul_embed, project, tables_for, PrimeTables};

    // Holographic machinery
    pub use crate::holographic::{
        AssociativeMemory, Binding, BindingStrategy, HeteroAssociativeMemory,
    };

    // Number system
    pub use crate::number::{Element, NumberSystem, NumberSystemConfig};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let numbers = NumberSystem::new(25, 25.0).unwrap();
        assert_eq!(numbers.primes(), &[2, 3, 5]);
        assert!(matches!(cpu_device(), Device::Cpu));
    }

    #[test]
    fn test_error_display() {
        let err = crate::HrrError::ValueOutOfRange { value: 31, max_value: 29 };
        assert_eq!(
            err.to_string(),
            "Value 31 is outside the representable range [0, 29]"
        );
    }
}
