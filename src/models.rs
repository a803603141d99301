//! Shared data structures used throughout the pipeline.

use crate::classifier::ErrorKind;
use bigdecimal::BigDecimal;
use ethers::types::{Address, H256, U256};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Uniswap V3 fee tiers, in hundredths of a basis point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeeTier {
    Lowest,
    Low,
    Medium,
    High,
}

impl FeeTier {
    pub fn fee(self) -> u32 {
        match self {
            Self::Lowest => 100,
            Self::Low => 500,
            Self::Medium => 3_000,
            Self::High => 10_000,
        }
    }

    pub fn from_fee(fee: u32) -> Option<Self> {
        match fee {
            100 => Some(Self::Lowest),
            500 => Some(Self::Low),
            3_000 => Some(Self::Medium),
            10_000 => Some(Self::High),
            _ => None,
        }
    }
}

impl FromStr for FeeTier {
    type Err = String;

    /// Accepts a tier name (`HIGH`) or its raw fee (`10000`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_uppercase().as_str() {
            "LOWEST" => Ok(Self::Lowest),
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            _ => s
                .parse::<u32>()
                .ok()
                .and_then(Self::from_fee)
                .ok_or_else(|| format!("unknown fee tier '{s}'")),
        }
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.fee())
    }
}

/// Parameters of a single `exactInputSingle` router call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapRequest {
    pub token_in: Address,
    pub token_out: Address,
    pub fee: u32,
    pub recipient: Address,
    /// Unix seconds after which the router rejects the swap.
    pub deadline: u64,
    pub amount_in: U256,
    pub amount_out_minimum: U256,
    /// Zero disables the price limit.
    pub sqrt_price_limit_x96: U256,
}

/// Gas settings attached to a swap transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOverrides {
    pub gas_limit: U256,
    pub gas_price: U256,
}

#[derive(Debug, Clone, Serialize)]
pub struct GasQuote {
    pub base_gas_price: U256,
    pub effective_gas_price: U256,
    #[serde(serialize_with = "crate::utils::serialize_display")]
    pub multiplier: BigDecimal,
}

/// Receipt of a transaction that reached a mined, successful state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub hash: H256,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionResult {
    pub hash: Option<H256>,
    pub status: TxStatus,
    pub error_kind: Option<ErrorKind>,
    pub message: Option<String>,
}

impl TransactionResult {
    pub fn confirmed(hash: H256) -> Self {
        Self {
            hash: Some(hash),
            status: TxStatus::Confirmed,
            error_kind: None,
            message: None,
        }
    }

    pub fn pending(hash: H256, message: impl Into<String>) -> Self {
        Self {
            hash: Some(hash),
            status: TxStatus::Pending,
            error_kind: None,
            message: Some(message.into()),
        }
    }

    pub fn failed(hash: Option<H256>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            hash,
            status: TxStatus::Failed,
            error_kind: Some(kind),
            message: Some(message.into()),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == TxStatus::Confirmed
    }
}

/// Observable lifecycle of the swap transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapPhase {
    Building,
    Submitted(H256),
    Mining(H256),
    Confirmed(H256),
    Failed(ErrorKind),
}

impl fmt::Display for SwapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Building => f.write_str("Building"),
            Self::Submitted(h) => write!(f, "Submitted {h:?}"),
            Self::Mining(h) => write!(f, "Mining {h:?}"),
            Self::Confirmed(h) => write!(f, "Confirmed {h:?}"),
            Self::Failed(kind) => write!(f, "Failed ({kind})"),
        }
    }
}
