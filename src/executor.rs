//! Builds, submits and confirms the single swap transaction.

use crate::chain::wait_for_receipt;
use crate::classifier::classify;
use crate::config::DEADLINE_WINDOW_SECS;
use crate::dex::Pool;
use crate::errors::ChainError;
use crate::models::{GasQuote, SwapPhase, SwapRequest, TransactionResult, TxOverrides};
use crate::pipeline::SwapContext;
use ethers::types::U256;
use tracing::{error, info, warn};

/// The request that was built and what became of it.
#[derive(Debug, Clone)]
pub struct SwapExecution {
    pub request: SwapRequest,
    pub result: TransactionResult,
}

/// Exact-input swap of the input token for the output token with no
/// output floor and no price limit, paid out to the signing identity.
pub fn build_request(ctx: &SwapContext, pool: &Pool, now: u64) -> SwapRequest {
    SwapRequest {
        token_in: ctx.tokens.input.address,
        token_out: ctx.tokens.output.address,
        fee: pool.fee,
        recipient: ctx.chain.signer_address(),
        deadline: now + DEADLINE_WINDOW_SECS,
        amount_in: ctx.amount_in,
        amount_out_minimum: U256::zero(),
        sqrt_price_limit_x96: U256::zero(),
    }
}

/// Submit the swap once and wait for its outcome.
///
/// Failures are classified and returned in the result, never retried.
pub async fn execute_swap(
    ctx: &SwapContext,
    pool: &Pool,
    gas: &GasQuote,
    now: u64,
) -> SwapExecution {
    ctx.report(SwapPhase::Building);
    let request = build_request(ctx, pool, now);
    info!(
        token_in = ?request.token_in,
        token_out = ?request.token_out,
        fee = request.fee,
        recipient = ?request.recipient,
        deadline = request.deadline,
        amount_in = %request.amount_in,
        "[TX] Started"
    );

    let overrides = TxOverrides {
        gas_limit: ctx.gas.gas_limit,
        gas_price: gas.effective_gas_price,
    };
    let hash = match ctx
        .chain
        .exact_input_single(ctx.router, &request, overrides)
        .await
    {
        Ok(hash) => hash,
        Err(e) => {
            let result = failed(ctx, e);
            return SwapExecution { request, result };
        }
    };
    ctx.report(SwapPhase::Submitted(hash));
    ctx.report(SwapPhase::Mining(hash));

    let mut cancel = ctx.cancel.clone();
    let result = match wait_for_receipt(
        ctx.chain.as_ref(),
        hash,
        ctx.confirmation_timeout,
        &mut cancel,
    )
    .await
    {
        Ok(receipt) => {
            ctx.report(SwapPhase::Confirmed(hash));
            info!(?hash, block = ?receipt.block_number, gas_used = ?receipt.gas_used, "[TX] Mined");
            TransactionResult::confirmed(hash)
        }
        Err(e @ (ChainError::Timeout { .. } | ChainError::Cancelled { .. })) => {
            warn!(?hash, error = %e, "[TX] stopped waiting; transaction may still be mined");
            TransactionResult::pending(hash, e.to_string())
        }
        Err(e) => failed(ctx, e),
    };
    SwapExecution { request, result }
}

fn failed(ctx: &SwapContext, e: ChainError) -> TransactionResult {
    let kind = classify(&e);
    ctx.report(SwapPhase::Failed(kind));
    error!(%kind, error = %e, "[TX] swap failed");
    TransactionResult::failed(e.tx_hash(), kind, e.to_string())
}
