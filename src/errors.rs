use crate::classifier::ErrorKind;
use ethers::types::{Address, H256};
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Provider error: {0}")]
    Provider(#[from] ethers::providers::ProviderError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] ethers::signers::WalletError),

    #[error("Serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Failure reported by a [`crate::chain::ChainConnector`].
///
/// `code` carries the failure tag the classifier keys on
/// (`REPLACEMENT_UNDERPRICED`, `NONCE_EXPIRED`, `TRANSACTION_REPLACED`).
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    #[error("rpc error: {message}")]
    Rpc {
        code: Option<String>,
        message: String,
    },

    #[error("transaction {hash:?} reverted")]
    Reverted { hash: H256 },

    #[error("transaction {hash:?} was dropped from the mempool")]
    Dropped { hash: H256 },

    #[error("transaction {hash:?} was replaced by another transaction with the same nonce")]
    Replaced { hash: H256 },

    #[error("gave up waiting for {hash:?} after {after:?}")]
    Timeout { hash: H256, after: Duration },

    #[error("wait for {hash:?} cancelled")]
    Cancelled { hash: H256 },
}

impl ChainError {
    pub fn rpc(message: impl Into<String>) -> Self {
        Self::Rpc {
            code: None,
            message: message.into(),
        }
    }

    pub fn tagged(code: &str, message: impl Into<String>) -> Self {
        Self::Rpc {
            code: Some(code.to_string()),
            message: message.into(),
        }
    }

    /// Failure code, if the connector could attach one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Rpc { code, .. } => code.as_deref(),
            Self::Replaced { .. } => Some(crate::classifier::TRANSACTION_REPLACED),
            _ => None,
        }
    }

    /// Hash of the transaction the failure refers to, when one was broadcast.
    pub fn tx_hash(&self) -> Option<H256> {
        match self {
            Self::Rpc { .. } => None,
            Self::Reverted { hash }
            | Self::Dropped { hash }
            | Self::Replaced { hash }
            | Self::Timeout { hash, .. }
            | Self::Cancelled { hash } => Some(*hash),
        }
    }
}

/// Failures that abort the pipeline before a swap outcome exists.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Transport error: {0}")]
    Transport(#[source] ChainError),

    #[error("No pool for {token_a:?}/{token_b:?} at fee {fee}")]
    PoolNotFound {
        token_a: Address,
        token_b: Address,
        fee: u32,
    },

    #[error("Pool {pool:?} trades {token0:?}/{token1:?}, not the requested pair")]
    PoolMismatch {
        pool: Address,
        token0: Address,
        token1: Address,
    },

    #[error("Approval failed ({kind}): {source}")]
    ApprovalFailed {
        kind: ErrorKind,
        #[source]
        source: ChainError,
    },

    #[error("System clock error: {0}")]
    Clock(#[from] std::time::SystemTimeError),

    #[error("Escalated gas price is out of range (base {base}, multiplier {multiplier})")]
    GasPriceOverflow { base: String, multiplier: String },
}

impl From<ChainError> for PipelineError {
    fn from(e: ChainError) -> Self {
        Self::Transport(e)
    }
}
