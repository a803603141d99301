//! Router approval for the input token.

use crate::chain::wait_for_receipt;
use crate::classifier::classify;
use crate::errors::{ChainError, PipelineError};
use crate::pipeline::SwapContext;
use crate::utils::format_amount;
use ethers::types::H256;
use tracing::{error, info};

/// Approve the router to move up to the configured ceiling of the input
/// token and wait until the approval is mined.
///
/// Returns the approval hash, or `None` when the allowance pre-check is
/// enabled and the existing allowance already covers `amount_in`.
pub async fn ensure_allowance(ctx: &SwapContext) -> Result<Option<H256>, PipelineError> {
    let token = &ctx.tokens.input;
    let owner = ctx.chain.signer_address();

    if ctx.approval_skip_if_sufficient {
        let current = ctx.chain.allowance(token.address, owner, ctx.router).await?;
        if current >= ctx.amount_in {
            info!(
                token = %token.symbol,
                allowance = %format_amount(current, token.decimals),
                "[APPROVE] existing allowance is sufficient, skipping"
            );
            return Ok(None);
        }
    }

    info!(
        token = %token.symbol,
        spender = ?ctx.router,
        amount = %format_amount(ctx.approval_amount, token.decimals),
        "[APPROVE] ask for approval"
    );
    let hash = ctx
        .chain
        .approve(token.address, ctx.router, ctx.approval_amount)
        .await
        .map_err(approval_failed)?;
    info!(?hash, "[APPROVE] submitted, waiting for confirmation");

    let mut cancel = ctx.cancel.clone();
    let receipt = wait_for_receipt(
        ctx.chain.as_ref(),
        hash,
        ctx.confirmation_timeout,
        &mut cancel,
    )
    .await
    .map_err(approval_failed)?;
    info!(?hash, block = ?receipt.block_number, "[APPROVE] approved");
    Ok(Some(hash))
}

fn approval_failed(source: ChainError) -> PipelineError {
    let kind = classify(&source);
    error!(%kind, error = %source, "[APPROVE] approval failed");
    PipelineError::ApprovalFailed { kind, source }
}
