//! # Holographic Phase Codes
//!
//! The vector side of the number system: how per-prime phase points become
//! one composite vector, and how noisy phase points are cleaned up again.
//!
//! ## Key Concepts
//!
//! - **Binding**: fuses the `k` phase points of a number into a `2k`-dimensional
//!   composite vector and extracts them again
//! - **Associative memory**: softmax(beta · similarity) readout over the `p`
//!   roots of unity, the decoder for one prime
//! - **Hetero-associative memory**: the same readout with separate keys and
//!   values, used to cross between the additive and multiplicative circles
//!
//! ## Architecture
//!
//! ```text
//!  residues ──embed──▶ [k, 2] points ──combine──▶ composite [2k]
//!                                                      │
//!  residues ◀─retrieve─ [k, 2] noisy points ◀─extract──┘
//! ```
//!
//! ## Reference
//!
//! Tony Plate, "Holographic Reduced Representations" (1995);
//! Ramsauer et al., "Hopfield Networks is All You Need" (2020)

pub mod binding;
pub mod memory;

pub use binding::{Binding, BindingStrategy, Concatenation, OrthogonalMixing};
pub use memory::{validate_beta, AssociativeMemory, HeteroAssociativeMemory};
