//! Configuration loader and application settings.

use crate::errors::{AppError, Result};
use crate::gas::MAX_MULTIPLIER_SCALE;
use crate::models::FeeTier;
use crate::tokens::TokenRegistry;
use bigdecimal::BigDecimal;
use ethers::types::{Address, U256};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Seconds between submission and the router-enforced deadline.
pub const DEADLINE_WINDOW_SECS: u64 = 600;

/// Consolidated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// RPC endpoint for the Ethereum-compatible node.
    pub rpc_url: Url,
    /// Private key of the signing identity. Never logged.
    pub wallet_secret: String,
    /// Expected address of the signing identity, if configured.
    pub wallet_address: Option<Address>,
    pub chain_id: u64,
    pub factory_address: Address,
    pub swap_router_address: Address,
    pub tokens: TokenRegistry,
    pub fee_tier: FeeTier,
    /// Input amount, in the input token's smallest unit.
    pub amount_in: U256,
    /// Allowance granted to the router, in the input token's smallest unit.
    pub approval_amount: U256,
    /// Read the current allowance first and skip the approval when it suffices.
    pub approval_skip_if_sufficient: bool,
    pub gas: GasConfig,
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
}

/// Gas configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct GasConfig {
    pub gas_limit: U256,
    pub gas_price_multiplier: BigDecimal,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            gas_limit: U256::from(100_000u64),
            gas_price_multiplier: BigDecimal::new(15.into(), 1),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| AppError::Config(format!("Set {key} env var")))
        };

        let rpc_url = Url::parse(required("MAINNET_URL")?.trim())?;
        let wallet_secret = required("WALLET_SECRET")?;
        let wallet_address = var("WALLET_ADDRESS")
            .map(|v| parse_address("WALLET_ADDRESS", &v))
            .transpose()?;
        let chain_id = parse_value::<u64>("CHAIN_ID", &required("CHAIN_ID")?)?;
        let weth = parse_address("WETH_ADDRESS", &required("WETH_ADDRESS")?)?;
        let usdc = parse_address("USDC_ADDRESS", &required("USDC_ADDRESS")?)?;
        let factory_address = parse_address("FACTORY_ADDRESS", &required("FACTORY_ADDRESS")?)?;
        let swap_router_address =
            parse_address("SWAP_ROUTER_ADDRESS", &required("SWAP_ROUTER_ADDRESS")?)?;

        let tokens = TokenRegistry::weth_usdc(chain_id, weth, usdc);

        let fee_tier = match var("FEE_TIER") {
            Some(v) => v.parse::<FeeTier>().map_err(AppError::Config)?,
            None => FeeTier::High,
        };

        let amount_in = tokens
            .input
            .parse_amount(&var("AMOUNT_IN").unwrap_or_else(|| "0.01".into()))?;
        if amount_in.is_zero() {
            return Err(AppError::Config("AMOUNT_IN must be greater than zero".into()));
        }
        let approval_amount = tokens
            .input
            .parse_amount(&var("APPROVAL_AMOUNT").unwrap_or_else(|| "100000".into()))?;
        if approval_amount < amount_in {
            return Err(AppError::Config(format!(
                "APPROVAL_AMOUNT ({approval_amount}) is below AMOUNT_IN ({amount_in})"
            )));
        }
        let approval_skip_if_sufficient = match var("APPROVAL_SKIP_IF_SUFFICIENT") {
            Some(v) => parse_bool("APPROVAL_SKIP_IF_SUFFICIENT", &v)?,
            None => false,
        };

        let mut gas = GasConfig::default();
        if let Some(v) = var("GAS_LIMIT") {
            gas.gas_limit = U256::from(parse_value::<u64>("GAS_LIMIT", &v)?);
        }
        if let Some(v) = var("GAS_PRICE_MULTIPLIER") {
            let multiplier = parse_value::<BigDecimal>("GAS_PRICE_MULTIPLIER", &v)?.normalized();
            let (_, scale) = multiplier.as_bigint_and_exponent();
            if scale.abs() > MAX_MULTIPLIER_SCALE {
                return Err(AppError::Config(format!(
                    "GAS_PRICE_MULTIPLIER {} is out of range: scale must be within ±{MAX_MULTIPLIER_SCALE}",
                    v.trim()
                )));
            }
            gas.gas_price_multiplier = multiplier;
        }
        if gas.gas_price_multiplier < BigDecimal::from(1) {
            return Err(AppError::Config(format!(
                "GAS_PRICE_MULTIPLIER must be at least 1.0, got {}",
                gas.gas_price_multiplier
            )));
        }

        let confirmation_timeout = Duration::from_secs(match var("CONFIRMATION_TIMEOUT_SECS") {
            Some(v) => parse_value("CONFIRMATION_TIMEOUT_SECS", &v)?,
            None => 600,
        });
        let poll_interval = Duration::from_millis(match var("POLL_INTERVAL_MS") {
            Some(v) => parse_value("POLL_INTERVAL_MS", &v)?,
            None => 2_000,
        });

        Ok(Self {
            rpc_url,
            wallet_secret,
            wallet_address,
            chain_id,
            factory_address,
            swap_router_address,
            tokens,
            fee_tier,
            amount_in,
            approval_amount,
            approval_skip_if_sufficient,
            gas,
            confirmation_timeout,
            poll_interval,
        })
    }
}

fn parse_address(key: &str, raw: &str) -> Result<Address> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| AppError::Config(format!("{key} is not a valid address: {e}")))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| AppError::Config(format!("{key} is invalid: {e}")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Config(format!("{key} is not a boolean: {other}"))),
    }
}
