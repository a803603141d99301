//! The two tradable assets, fixed at startup.

use crate::errors::{AppError, Result};
use ethers::types::{Address, U256};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Token {
    pub chain_id: u64,
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
}

impl Token {
    pub fn new(chain_id: u64, address: Address, decimals: u8, symbol: &str, name: &str) -> Self {
        Self {
            chain_id,
            address,
            decimals,
            symbol: symbol.to_string(),
            name: name.to_string(),
        }
    }

    /// Scale a human amount ("0.01") into the token's smallest unit.
    pub fn parse_amount(&self, human: &str) -> Result<U256> {
        let parsed = ethers::utils::parse_units(human.trim(), self.decimals as u32).map_err(|e| {
            AppError::Config(format!("invalid {} amount '{human}': {e}", self.symbol))
        })?;
        Ok(parsed.into())
    }
}

// Identity is the contract address.
impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Token {}

/// Input and output side of the swap.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    pub input: Token,
    pub output: Token,
}

impl TokenRegistry {
    /// WETH in, USDC out.
    pub fn weth_usdc(chain_id: u64, weth: Address, usdc: Address) -> Self {
        Self {
            input: Token::new(chain_id, weth, 18, "WETH", "Wrapped Ether"),
            output: Token::new(chain_id, usdc, 6, "USDC", "USD Coin"),
        }
    }

    pub fn by_address(&self, address: Address) -> Option<&Token> {
        [&self.input, &self.output]
            .into_iter()
            .find(|t| t.address == address)
    }
}
