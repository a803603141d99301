//! Chain access used by the pipeline.
//!
//! [`ChainConnector`] is the whole surface the pipeline needs from a node:
//! the fixed set of contract reads, the two writes (approve, swap), the
//! network gas price and receipt waiting. [`client::EthersChain`] is the
//! ethers-rs implementation; tests substitute their own.

use crate::errors::ChainError;
use crate::models::{SwapRequest, TxOverrides, TxReceipt};
use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use std::time::Duration;
use tokio::sync::watch;

pub mod client;

pub use client::EthersChain;

/// Fields of the pool's `slot0()` the pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    pub tick: i32,
}

#[async_trait]
pub trait ChainConnector: Send + Sync {
    /// Address of the signing identity.
    fn signer_address(&self) -> Address;

    async fn get_pool(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
        fee: u32,
    ) -> Result<Address, ChainError>;

    async fn pool_token0(&self, pool: Address) -> Result<Address, ChainError>;
    async fn pool_token1(&self, pool: Address) -> Result<Address, ChainError>;
    async fn pool_fee(&self, pool: Address) -> Result<u32, ChainError>;
    async fn pool_slot0(&self, pool: Address) -> Result<Slot0, ChainError>;

    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256, ChainError>;
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError>;

    /// Broadcast `approve(spender, amount)` from the signing identity.
    async fn approve(&self, token: Address, spender: Address, amount: U256)
    -> Result<H256, ChainError>;

    /// Broadcast `exactInputSingle(request)` from the signing identity.
    async fn exact_input_single(
        &self,
        router: Address,
        request: &SwapRequest,
        overrides: TxOverrides,
    ) -> Result<H256, ChainError>;

    async fn gas_price(&self) -> Result<U256, ChainError>;

    /// Resolves once the transaction is mined (`Ok`) or is known to have
    /// reverted, been dropped or been replaced (`Err`).
    async fn await_confirmation(&self, hash: H256) -> Result<TxReceipt, ChainError>;
}

/// Wait for a terminal state of `hash`, giving up after `timeout` or when
/// `cancel` flips to `true`. Giving up does not affect the transaction itself.
pub async fn wait_for_receipt(
    chain: &dyn ChainConnector,
    hash: H256,
    timeout: Duration,
    cancel: &mut watch::Receiver<bool>,
) -> Result<TxReceipt, ChainError> {
    if *cancel.borrow_and_update() {
        return Err(ChainError::Cancelled { hash });
    }
    tokio::select! {
        res = chain.await_confirmation(hash) => res,
        _ = tokio::time::sleep(timeout) => Err(ChainError::Timeout { hash, after: timeout }),
        _ = cancelled(cancel) => Err(ChainError::Cancelled { hash }),
    }
}

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if cancel.changed().await.is_err() {
            // Sender gone: nobody can cancel any more.
            std::future::pending::<()>().await;
        }
        if *cancel.borrow_and_update() {
            return;
        }
    }
}
