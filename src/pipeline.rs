//! Single-attempt swap pipeline.
//!
//! Order: resolve pool → approve → read balances → quote gas → swap.
//! Everything before the swap is submitted aborts the run with a [`PipelineError`];
//! a failed swap is reported in the returned [`SwapOutcome`] instead.

use crate::allowance::ensure_allowance;
use crate::chain::ChainConnector;
use crate::config::{AppConfig, GasConfig};
use crate::dex::{Pool, resolve_pool};
use crate::errors::PipelineError;
use crate::executor::execute_swap;
use crate::gas::quote_gas_price;
use crate::models::{FeeTier, GasQuote, SwapPhase, SwapRequest, TransactionResult};
use crate::tokens::TokenRegistry;
use crate::utils::{format_amount, unix_now};
use ethers::types::{Address, H256, U256};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

/// Everything the pipeline components need, built once at startup.
pub struct SwapContext {
    pub chain: Arc<dyn ChainConnector>,
    pub tokens: TokenRegistry,
    pub factory: Address,
    pub router: Address,
    pub fee_tier: FeeTier,
    pub amount_in: U256,
    pub approval_amount: U256,
    pub approval_skip_if_sufficient: bool,
    pub gas: GasConfig,
    pub confirmation_timeout: Duration,
    pub(crate) cancel: watch::Receiver<bool>,
    progress: Option<mpsc::UnboundedSender<SwapPhase>>,
}

impl SwapContext {
    pub fn new(chain: Arc<dyn ChainConnector>, config: &AppConfig) -> Self {
        // Sender dropped right away: never cancelled unless `with_cancel` is used.
        let (_, cancel) = watch::channel(false);
        Self {
            chain,
            tokens: config.tokens.clone(),
            factory: config.factory_address,
            router: config.swap_router_address,
            fee_tier: config.fee_tier,
            amount_in: config.amount_in,
            approval_amount: config.approval_amount,
            approval_skip_if_sufficient: config.approval_skip_if_sufficient,
            gas: config.gas.clone(),
            confirmation_timeout: config.confirmation_timeout,
            cancel,
            progress: None,
        }
    }

    /// Stop waiting for confirmations once `cancel` becomes `true`.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Receive every swap phase transition on `progress`.
    pub fn with_progress(mut self, progress: mpsc::UnboundedSender<SwapPhase>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub(crate) fn report(&self, phase: SwapPhase) {
        info!(%phase, "[TX] phase");
        if let Some(tx) = &self.progress {
            let _ = tx.send(phase);
        }
    }
}

/// Balances of the signing identity, in smallest units.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Balances {
    pub input: U256,
    pub output: U256,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwapOutcome {
    pub pool: Pool,
    pub approval: Option<H256>,
    pub balances: Balances,
    pub gas: GasQuote,
    pub request: SwapRequest,
    pub swap: TransactionResult,
}

pub async fn run(ctx: &SwapContext) -> Result<SwapOutcome, PipelineError> {
    let pool = resolve_pool(
        ctx.chain.as_ref(),
        ctx.factory,
        &ctx.tokens.input,
        &ctx.tokens.output,
        ctx.fee_tier,
    )
    .await?;
    log_pool(ctx, &pool);

    let approval = ensure_allowance(ctx).await?;

    let balances = read_balances(ctx).await?;

    let gas = quote_gas_price(ctx.chain.as_ref(), &ctx.gas.gas_price_multiplier).await?;

    let now = unix_now().map_err(|e| {
        error!(error = %e, "[TX] cannot compute the swap deadline");
        PipelineError::Clock(e)
    })?;
    let execution = execute_swap(ctx, &pool, &gas, now).await;

    Ok(SwapOutcome {
        pool,
        approval,
        balances,
        gas,
        request: execution.request,
        swap: execution.result,
    })
}

fn log_pool(ctx: &SwapContext, pool: &Pool) {
    let (Some(t0), Some(t1)) = (
        ctx.tokens.by_address(pool.token0),
        ctx.tokens.by_address(pool.token1),
    ) else {
        return;
    };
    info!(
        token0 = %t0.symbol,
        token1 = %t1.symbol,
        fee = pool.fee,
        tick = ?pool.tick,
        sqrt_price_x96 = %pool.sqrt_price_x96,
        price = pool.price_token1_per_token0(t0.decimals, t1.decimals),
        "[POOL] info"
    );
}

async fn read_balances(ctx: &SwapContext) -> Result<Balances, PipelineError> {
    let holder = ctx.chain.signer_address();
    let (input, output) = futures::try_join!(
        ctx.chain.balance_of(ctx.tokens.input.address, holder),
        ctx.chain.balance_of(ctx.tokens.output.address, holder),
    )?;
    info!(
        holder = ?holder,
        input = %format!("{} {}", format_amount(input, ctx.tokens.input.decimals), ctx.tokens.input.symbol),
        output = %format!("{} {}", format_amount(output, ctx.tokens.output.decimals), ctx.tokens.output.symbol),
        "[BALANCE] your balance"
    );
    if input < ctx.amount_in {
        warn!(
            balance = %input,
            amount_in = %ctx.amount_in,
            "[BALANCE] input balance below swap amount; the swap will likely revert"
        );
    }
    Ok(Balances { input, output })
}
