//! Multiplication error count over a large range
//!
//! Builds the system for `[0, 510510)` (primes 2..17) and multiplies every
//! pair `i, j < √max_value`, counting products that decode incorrectly.
//!
//! Run with:
//! ```bash
//! cargo run --release --example check_range -- [beta] [min_range]
//! ```

use hrr_numbers::prelude::*;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn parse_arg<T: std::str::FromStr>(index: usize, default: T) -> Result<T> {
    match std::env::args().nth(index) {
        Some(raw) => raw
            .parse()
            .map_err(|_| HrrError::Config(format!("cannot parse argument {}: {:?}", index, raw))),
        None => Ok(default),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hrr_numbers=info")),
        )
        .init();

    let beta: f32 = parse_arg(1, 75.0)?;
    let min_range: u64 = parse_arg(2, 510_510)?;

    let numbers = NumberSystem::new(min_range, beta)?;
    let n = (numbers.max_value() as f64).sqrt().floor() as u64;
    println!(
        "Primes {:?}, beta {}, checking {}² products",
        numbers.primes(),
        beta,
        n
    );

    let elements: Vec<Element> = (0..n).map(|v| numbers.encode(v)).collect::<Result<_>>()?;

    let start = Instant::now();
    let mut fails = Vec::new();
    for (i, x) in elements.iter().enumerate() {
        for (j, y) in elements.iter().enumerate() {
            let expected = (i * j) as u64;
            let got = (x * y)?.decode()?;
            if got != expected {
                fails.push((i, j, expected, got));
            }
        }
        if (i + 1) % 50 == 0 {
            println!("  {}/{} rows, {} errors so far", i + 1, n, fails.len());
        }
    }

    println!("Errors: {} of {} ({:.2?})", fails.len(), n * n, start.elapsed());
    for (i, j, expected, got) in fails.iter().take(10) {
        println!("  {} * {} = {}, decoded {}", i, j, expected, got);
    }

    Ok(())
}
