//! Gas price escalation.
//!
//! The network's suggested price is scaled by a decimal multiplier so a
//! transaction from an identity with pending transactions is not rejected as
//! underpriced. The product is computed exactly and rounded half-up.

use crate::chain::ChainConnector;
use crate::errors::PipelineError;
use crate::models::GasQuote;
use crate::utils::wei_to_gwei;
use bigdecimal::BigDecimal;
use ethers::types::U256;
use num_bigint::{BigInt, BigUint};
use tracing::info;

/// Largest decimal exponent, either way, a multiplier may carry.
pub const MAX_MULTIPLIER_SCALE: i64 = 18;

/// `round_half_up(base * multiplier)`, or `None` if the result is negative,
/// does not fit in 256 bits or the multiplier's exponent exceeds
/// [`MAX_MULTIPLIER_SCALE`].
pub fn escalate(base: U256, multiplier: &BigDecimal) -> Option<U256> {
    let (digits, scale) = multiplier.as_bigint_and_exponent();
    if scale.abs() > MAX_MULTIPLIER_SCALE {
        return None;
    }
    let product = BigInt::from(u256_to_biguint(base)) * digits;
    let ten = BigInt::from(10u8);
    let scaled = if scale > 0 {
        let den = num_traits::pow(ten, scale as usize);
        (product + &den / 2) / den
    } else {
        product * num_traits::pow(ten, scale.unsigned_abs() as usize)
    };
    biguint_to_u256(&scaled.to_biguint()?)
}

/// Read the network gas price and escalate it.
pub async fn quote_gas_price(
    chain: &dyn ChainConnector,
    multiplier: &BigDecimal,
) -> Result<GasQuote, PipelineError> {
    let base = chain.gas_price().await?;
    let effective = escalate(base, multiplier).ok_or_else(|| PipelineError::GasPriceOverflow {
        base: base.to_string(),
        multiplier: multiplier.to_string(),
    })?;
    info!(
        base_gwei = wei_to_gwei(base),
        effective_gwei = wei_to_gwei(effective),
        multiplier = %multiplier,
        "[GAS] escalated gas price"
    );
    Ok(GasQuote {
        base_gas_price: base,
        effective_gas_price: effective,
        multiplier: multiplier.clone(),
    })
}

fn u256_to_biguint(v: U256) -> BigUint {
    let mut buf = [0u8; 32];
    v.to_big_endian(&mut buf);
    BigUint::from_bytes_be(&buf)
}

fn biguint_to_u256(v: &BigUint) -> Option<U256> {
    let bytes = v.to_bytes_be();
    (bytes.len() <= 32).then(|| U256::from_big_endian(&bytes))
}
