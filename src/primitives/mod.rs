//! Tensor Primitives
//!
//! Device selection and the tensor routines shared by the phase code.
//!
//! ## Submodules
//!
//! - [`tensor_ops`]: Device selection, complex arithmetic on `[k, 2]` tensors, cosine similarity
//! - [`activations`]: Softmax readout and argmax

mod tensor_ops;
mod activations;

// Re-export all primitives at module level
pub use tensor_ops::*;
pub use activations::*;
