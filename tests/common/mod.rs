//! Scriptable in-memory [`ChainConnector`] that records every call.

#![allow(dead_code)]

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;
use v3_swap_executor::chain::{ChainConnector, Slot0};
use v3_swap_executor::config::AppConfig;
use v3_swap_executor::errors::ChainError;
use v3_swap_executor::models::{SwapRequest, TxOverrides, TxReceipt};

pub const CHAIN_ID: u64 = 1;

pub fn weth() -> Address {
    Address::repeat_byte(0x11)
}
pub fn usdc() -> Address {
    Address::repeat_byte(0x22)
}
pub fn factory() -> Address {
    Address::repeat_byte(0x33)
}
pub fn router() -> Address {
    Address::repeat_byte(0x44)
}
pub fn pool_address() -> Address {
    Address::repeat_byte(0x55)
}
pub fn signer() -> Address {
    Address::repeat_byte(0x77)
}
pub fn approve_hash() -> H256 {
    H256::repeat_byte(0xa1)
}
pub fn swap_hash() -> H256 {
    H256::repeat_byte(0x5a)
}

pub fn config_with(overrides: &[(&'static str, &str)]) -> AppConfig {
    let mut env: HashMap<&'static str, String> = HashMap::from([
        ("MAINNET_URL", "http://localhost:8545".to_string()),
        ("WALLET_SECRET", "0x01".to_string()),
        ("CHAIN_ID", CHAIN_ID.to_string()),
        ("WETH_ADDRESS", format!("{:?}", weth())),
        ("USDC_ADDRESS", format!("{:?}", usdc())),
        ("FACTORY_ADDRESS", format!("{:?}", factory())),
        ("SWAP_ROUTER_ADDRESS", format!("{:?}", router())),
        ("CONFIRMATION_TIMEOUT_SECS", "5".to_string()),
    ]);
    for (k, v) in overrides {
        env.insert(*k, v.to_string());
    }
    AppConfig::from_lookup(|k| env.get(k).cloned()).expect("test config")
}

pub fn config() -> AppConfig {
    config_with(&[])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetPool { token_a: Address, token_b: Address, fee: u32 },
    Token0,
    Token1,
    Fee,
    Slot0,
    BalanceOf(Address),
    Allowance,
    Approve { token: Address, spender: Address, amount: U256 },
    Swap { request: SwapRequest, overrides: TxOverrides },
    GasPrice,
    AwaitConfirmation(H256),
    Confirmed(H256),
}

impl Call {
    pub fn is_write(&self) -> bool {
        matches!(self, Call::Approve { .. } | Call::Swap { .. })
    }
}

pub struct FakeState {
    pub pool: Address,
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
    pub sqrt_price_x96: U256,
    pub gas_price: U256,
    pub balances: HashMap<Address, U256>,
    /// (token, spender) → allowance granted by the signer.
    pub allowances: HashMap<(Address, Address), U256>,
    pending_approval: Option<(Address, Address, U256)>,

    pub fail_token1_read: bool,
    /// Answer `token1()` with this instead of the real token1.
    pub reported_token1: Option<Address>,
    pub approve_error: Option<ChainError>,
    pub approval_confirm_error: Option<ChainError>,
    pub swap_error: Option<ChainError>,
    pub swap_confirm_error: Option<ChainError>,
    /// Swap confirmation never resolves.
    pub hang_swap_confirmation: bool,
    /// Approval confirmation never resolves.
    pub hang_approval_confirmation: bool,
    /// Each of the four pool-state reads waits here before answering.
    pub read_barrier: Option<Arc<Barrier>>,

    pub calls: Vec<Call>,
}

#[derive(Clone)]
pub struct FakeChain {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeChain {
    /// A healthy chain holding a WETH/USDC HIGH pool; USDC sorts as token0
    /// to make sure nothing assumes the input token comes first.
    pub fn new() -> Self {
        let state = FakeState {
            pool: pool_address(),
            token0: usdc(),
            token1: weth(),
            fee: 10_000,
            sqrt_price_x96: U256::from_dec_str("1771595571142957166518320255467520").unwrap(),
            gas_price: U256::from(20_000_000_000u64),
            balances: HashMap::from([
                (weth(), U256::exp10(18)),
                (usdc(), U256::from(5_000_000u64)),
            ]),
            allowances: HashMap::new(),
            pending_approval: None,
            fail_token1_read: false,
            reported_token1: None,
            approve_error: None,
            approval_confirm_error: None,
            swap_error: None,
            swap_confirm_error: None,
            hang_swap_confirmation: false,
            hang_approval_confirmation: false,
            read_barrier: None,
            calls: Vec::new(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with(self, f: impl FnOnce(&mut FakeState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_write).collect()
    }

    pub fn allowance_of(&self, token: Address, spender: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .allowances
            .get(&(token, spender))
            .copied()
            .unwrap_or_default()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    async fn pool_read_gate(&self) {
        let barrier = self.state.lock().unwrap().read_barrier.clone();
        if let Some(b) = barrier {
            b.wait().await;
        }
    }
}

#[async_trait]
impl ChainConnector for FakeChain {
    fn signer_address(&self) -> Address {
        signer()
    }

    async fn get_pool(
        &self,
        _factory: Address,
        token_a: Address,
        token_b: Address,
        fee: u32,
    ) -> Result<Address, ChainError> {
        self.record(Call::GetPool { token_a, token_b, fee });
        let s = self.state.lock().unwrap();
        let pair_known = (token_a == s.token0 && token_b == s.token1)
            || (token_a == s.token1 && token_b == s.token0);
        if pair_known && fee == s.fee {
            Ok(s.pool)
        } else {
            Ok(Address::zero())
        }
    }

    async fn pool_token0(&self, _pool: Address) -> Result<Address, ChainError> {
        self.pool_read_gate().await;
        self.record(Call::Token0);
        Ok(self.state.lock().unwrap().token0)
    }

    async fn pool_token1(&self, _pool: Address) -> Result<Address, ChainError> {
        self.pool_read_gate().await;
        self.record(Call::Token1);
        let s = self.state.lock().unwrap();
        if s.fail_token1_read {
            return Err(ChainError::rpc("connection reset by peer"));
        }
        Ok(s.reported_token1.unwrap_or(s.token1))
    }

    async fn pool_fee(&self, _pool: Address) -> Result<u32, ChainError> {
        self.pool_read_gate().await;
        self.record(Call::Fee);
        Ok(self.state.lock().unwrap().fee)
    }

    async fn pool_slot0(&self, _pool: Address) -> Result<Slot0, ChainError> {
        self.pool_read_gate().await;
        self.record(Call::Slot0);
        Ok(Slot0 {
            sqrt_price_x96: self.state.lock().unwrap().sqrt_price_x96,
            tick: 200_000,
        })
    }

    async fn balance_of(&self, token: Address, _holder: Address) -> Result<U256, ChainError> {
        self.record(Call::BalanceOf(token));
        Ok(self
            .state
            .lock()
            .unwrap()
            .balances
            .get(&token)
            .copied()
            .unwrap_or_default())
    }

    async fn allowance(
        &self,
        token: Address,
        _owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        self.record(Call::Allowance);
        Ok(self.allowance_of(token, spender))
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<H256, ChainError> {
        self.record(Call::Approve { token, spender, amount });
        let mut s = self.state.lock().unwrap();
        if let Some(e) = s.approve_error.clone() {
            return Err(e);
        }
        s.pending_approval = Some((token, spender, amount));
        Ok(approve_hash())
    }

    async fn exact_input_single(
        &self,
        _router: Address,
        request: &SwapRequest,
        overrides: TxOverrides,
    ) -> Result<H256, ChainError> {
        self.record(Call::Swap {
            request: request.clone(),
            overrides,
        });
        match self.state.lock().unwrap().swap_error.clone() {
            Some(e) => Err(e),
            None => Ok(swap_hash()),
        }
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        self.record(Call::GasPrice);
        Ok(self.state.lock().unwrap().gas_price)
    }

    async fn await_confirmation(&self, hash: H256) -> Result<TxReceipt, ChainError> {
        self.record(Call::AwaitConfirmation(hash));
        // Yield once so the wait is a real suspension point.
        tokio::time::sleep(Duration::from_millis(5)).await;

        let hang = {
            let s = self.state.lock().unwrap();
            (hash == swap_hash() && s.hang_swap_confirmation)
                || (hash == approve_hash() && s.hang_approval_confirmation)
        };
        if hang {
            std::future::pending::<()>().await;
        }

        {
            let mut s = self.state.lock().unwrap();
            let scripted = if hash == approve_hash() {
                s.approval_confirm_error.clone()
            } else {
                s.swap_confirm_error.clone()
            };
            if let Some(e) = scripted {
                return Err(e);
            }
            if hash == approve_hash() {
                if let Some((token, spender, amount)) = s.pending_approval.take() {
                    s.allowances.insert((token, spender), amount);
                }
            }
        }
        self.record(Call::Confirmed(hash));
        Ok(TxReceipt {
            hash,
            block_number: Some(19_000_000),
            gas_used: Some(U256::from(46_000u64)),
        })
    }
}
