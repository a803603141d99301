use anyhow::Result;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use v3_swap_executor::{
    chain::EthersChain,
    config::AppConfig,
    pipeline::{self, SwapContext},
    utils,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    // Configuration
    let config = AppConfig::load()?;
    tracing::info!(
        chain_id = config.chain_id,
        fee_tier = %config.fee_tier,
        amount_in = %utils::format_amount(config.amount_in, config.tokens.input.decimals),
        token_in = %config.tokens.input.symbol,
        token_out = %config.tokens.output.symbol,
        "[INIT] v3-swap-executor starting"
    );

    let chain: EthersChain = EthersChain::connect(&config).await?;

    // Ctrl-C stops the confirmation wait; a broadcast transaction stays broadcast.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("[INIT] interrupt received, abandoning confirmation wait");
            let _ = cancel_tx.send(true);
        }
    });

    let ctx = SwapContext::new(Arc::new(chain), &config).with_cancel(cancel_rx);

    match pipeline::run(&ctx).await {
        Ok(outcome) => {
            tracing::info!(summary = %serde_json::to_string(&outcome)?, "[DONE] outcome");
            if outcome.swap.is_confirmed() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "[ABORT] pipeline aborted before the swap");
            Ok(ExitCode::FAILURE)
        }
    }
}
