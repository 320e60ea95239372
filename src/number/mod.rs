//! # Holographic Numbers
//!
//! Integers in `[0, M)` as composite phase vectors, with modular arithmetic
//! carried out on the vectors themselves.
//!
//! ```rust,ignore
//! use hrr_numbers::prelude::*;
//!
//! let numbers = NumberSystem::new(25, 25.0)?;   // primes [2, 3, 5], M = 30
//! let seven = numbers.encode(7)?;
//! let three = numbers.encode(3)?;
//!
//! assert_eq!((&seven + &three)?.decode()?, 10);
//! assert_eq!((&seven * &three)?.decode()?, 21);
//! assert_eq!((&three - &seven)?.decode()?, 26);
//! ```

mod config;
mod element;
mod system;

pub use config::NumberSystemConfig;
pub use element::Element;
pub use system::NumberSystem;
