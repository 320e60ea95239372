//! Encoding, arithmetic and decoding on holographic numbers
//!
//! Demonstrates: encode → add / sub / mul / div → decode, and how noise and
//! beta affect the readout.
//!
//! Run with:
//! ```bash
//! RUST_LOG=hrr_numbers=debug cargo run --example arithmetic
//! ```

use hrr_numbers::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hrr_numbers=info")),
        )
        .init();

    // 1. A system covering at least [0, 25): primes [2, 3, 5], so M = 30
    let numbers = NumberSystem::new(25, 25.0)?;
    println!(
        "Primes {:?}, values 0..={}, vector dim {}",
        numbers.primes(),
        numbers.max_value(),
        numbers.dim()
    );

    // 2. Encode and inspect residues
    let seven = numbers.encode(7)?;
    let three = numbers.encode(3)?;
    println!("7 → residues {:?}", seven.decode_residues()?);
    println!("3 → residues {:?}", three.decode_residues()?);

    // 3. Arithmetic without intermediate decoding
    println!("\n--- Arithmetic mod {} ---", numbers.max_value() + 1);
    println!("7 + 3 = {}", (&seven + &three)?.decode()?);
    println!("7 - 3 = {}", (&seven - &three)?.decode()?);
    println!("3 - 7 = {}", (&three - &seven)?.decode()?);
    println!("7 * 3 = {}", (&seven * &three)?.decode()?);
    println!("7^4   = {}", seven.pow(4)?.decode()?);

    // Division multiplies by the inverse; 3 shares a factor with 30
    let eleven = numbers.encode(11)?;
    println!("7 / 11 = {} (7 · 11⁻¹ mod 30)", (&seven / &eleven)?.decode()?);
    match seven.checked_div(&three) {
        Ok(q) => println!("7 / 3 = {}", q.decode()?),
        Err(e) => println!("7 / 3 rejected: {}", e),
    }

    // 4. Noise and beta
    println!("\n--- Noisy readout ---");
    let noisy = numbers.encode(21)?.perturb(0.3)?;
    for beta in [1.0f32, 10.0, 100.0] {
        let sharp = noisy.rebind(&numbers.with_beta(beta)?)?;
        println!(
            "beta {:>5}: decoded {:>2}, confidence {:.3}",
            beta,
            sharp.decode()?,
            sharp.confidence()?
        );
    }

    Ok(())
}
