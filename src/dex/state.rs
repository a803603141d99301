use crate::models::FeeTier;
use ethers::types::{Address, U256};
use serde::Serialize;

/// Snapshot of a Uniswap V3 pool, read fresh on every run.
#[derive(Clone, Debug, Serialize)]
pub struct Pool {
    pub address: Address,
    /// Ordering is the pool's, not the caller's.
    pub token0: Address,
    pub token1: Address,
    /// Raw fee from `fee()`, e.g. 10000 for the HIGH tier.
    pub fee: u32,
    /// Current sqrt(price1/price0) in Q96 (`slot0.sqrtPriceX96`).
    pub sqrt_price_x96: U256,
    /// Current tick index (`slot0.tick`), `None` when the price lies outside
    /// the tick range (e.g. an uninitialized pool reporting a zero price).
    pub tick: Option<i32>,
}

pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;
/// sqrt ratio at [`MIN_TICK`].
pub const MIN_SQRT_RATIO: U256 = U256([4_295_128_739, 0, 0, 0]);
/// sqrt ratio at [`MAX_TICK`], exclusive.
pub const MAX_SQRT_RATIO: U256 = U256([0x5d95_1d52_6398_8d26, 0xefd1_fc6a_5064_8849, 0xfffd_8963, 0]);

/// The tick `slot0` reported, if the price it came with is a valid one.
pub fn tick_in_range(sqrt_price_x96: U256, tick: i32) -> Option<i32> {
    let price_ok = sqrt_price_x96 >= MIN_SQRT_RATIO && sqrt_price_x96 < MAX_SQRT_RATIO;
    (price_ok && (MIN_TICK..=MAX_TICK).contains(&tick)).then_some(tick)
}

impl Pool {
    pub fn fee_tier(&self) -> Option<FeeTier> {
        FeeTier::from_fee(self.fee)
    }

    /// Whether the pool trades exactly `{a, b}`, in either order.
    pub fn trades(&self, a: Address, b: Address) -> bool {
        (self.token0 == a && self.token1 == b) || (self.token0 == b && self.token1 == a)
    }

    /// Human price of token0 in units of token1.
    pub fn price_token1_per_token0(&self, token0_decimals: u8, token1_decimals: u8) -> f64 {
        price_from_sqrt_x96(self.sqrt_price_x96, token0_decimals, token1_decimals)
    }
}

/// sqrtPriceX96 = sqrt(token1_raw / token0_raw) * 2^96; rescale the raw ratio
/// by the decimals difference to get a human price.
pub fn price_from_sqrt_x96(sqrt_price_x96: U256, token0_decimals: u8, token1_decimals: u8) -> f64 {
    let sqrt_q96 = sqrt_price_x96.to_string().parse::<f64>().unwrap_or(0.0) / 2.0_f64.powi(96);
    if sqrt_q96 <= 0.0 {
        return 0.0;
    }
    let ratio_raw = sqrt_q96 * sqrt_q96;
    ratio_raw * 10_f64.powi(token0_decimals as i32 - token1_decimals as i32)
}
