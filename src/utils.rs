//! Miscellaneous helper utilities.

use ethers::types::U256;
use serde::Serializer;
use std::fmt::Display;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Current wall-clock time in unix seconds. Fails if the clock reads
/// before the epoch.
pub fn unix_now() -> Result<u64, SystemTimeError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Render a raw token amount with its decimals, e.g. `10^16` at 18 → `0.01`.
pub fn format_amount(raw: U256, decimals: u8) -> String {
    match ethers::utils::format_units(raw, decimals as u32) {
        Ok(s) if !s.contains('.') => s,
        Ok(s) => {
            let trimmed = s.trim_end_matches('0').trim_end_matches('.');
            if trimmed.is_empty() {
                "0".to_string()
            } else {
                trimmed.to_string()
            }
        }
        Err(_) => raw.to_string(),
    }
}

/// Wei → gwei for log lines.
pub fn wei_to_gwei(wei: U256) -> f64 {
    format_amount(wei, 9).parse().unwrap_or(0.0)
}

pub fn serialize_display<T: Display, S: Serializer>(v: &T, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(v)
}
