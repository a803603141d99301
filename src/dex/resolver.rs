use super::state::{Pool, tick_in_range};
use crate::chain::ChainConnector;
use crate::errors::PipelineError;
use crate::models::FeeTier;
use crate::tokens::Token;
use ethers::types::Address;
use tracing::{error, info};

/// Find the pool for `(token_a, token_b, fee_tier)` and read its state.
///
/// The four state reads run concurrently; the first failure aborts the
/// others and surfaces as [`PipelineError::Transport`].
pub async fn resolve_pool(
    chain: &dyn ChainConnector,
    factory: Address,
    token_a: &Token,
    token_b: &Token,
    fee_tier: FeeTier,
) -> Result<Pool, PipelineError> {
    let address = chain
        .get_pool(factory, token_a.address, token_b.address, fee_tier.fee())
        .await?;
    if address.is_zero() {
        return Err(PipelineError::PoolNotFound {
            token_a: token_a.address,
            token_b: token_b.address,
            fee: fee_tier.fee(),
        });
    }
    info!(pool = ?address, pair = %format!("{}/{}", token_a.symbol, token_b.symbol), %fee_tier, "[POOL] resolved");

    let (token0, token1, fee, slot0) = futures::try_join!(
        chain.pool_token0(address),
        chain.pool_token1(address),
        chain.pool_fee(address),
        chain.pool_slot0(address),
    )
    .map_err(|e| {
        error!(pool = ?address, error = %e, "[POOL] state read failed");
        PipelineError::Transport(e)
    })?;

    let pool = Pool {
        address,
        token0,
        token1,
        fee,
        sqrt_price_x96: slot0.sqrt_price_x96,
        tick: tick_in_range(slot0.sqrt_price_x96, slot0.tick),
    };
    if !pool.trades(token_a.address, token_b.address) {
        return Err(PipelineError::PoolMismatch {
            pool: address,
            token0,
            token1,
        });
    }
    Ok(pool)
}
