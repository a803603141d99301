use super::{ChainConnector, Slot0};
use crate::classifier::code_from_message;
use crate::config::AppConfig;
use crate::errors::{AppError, ChainError, Result};
use crate::models::{SwapRequest, TxOverrides, TxReceipt};
use async_trait::async_trait;
use ethers::{
    contract::abigen,
    middleware::SignerMiddleware,
    providers::{Http, JsonRpcClient, Middleware, PendingTransaction, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, BlockNumber, H256, TransactionReceipt, U64, U256},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

abigen!(
    UniswapV3Factory,
    r"[
        function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address pool)
    ]",
);

abigen!(
    UniswapV3Pool,
    r"[
        function slot0() view returns (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex, uint16 observationCardinality, uint16 observationCardinalityNext, uint8 feeProtocol, bool unlocked)
        function token0() view returns (address)
        function token1() view returns (address)
        function fee() view returns (uint24)
    ]",
);

abigen!(
    Erc20,
    r"[
        function balanceOf(address account) external view returns (uint256)
        function allowance(address owner, address spender) external view returns (uint256)
        function approve(address spender, uint256 amount) external returns (bool)
    ]",
);

abigen!(
    SwapRouter,
    r"[
        struct ExactInputSingleParams { address tokenIn; address tokenOut; uint24 fee; address recipient; uint256 deadline; uint256 amountIn; uint256 amountOutMinimum; uint160 sqrtPriceLimitX96; }
        function exactInputSingle(ExactInputSingleParams calldata params) external payable returns (uint256 amountOut)
    ]",
);

type SignerClient<P> = SignerMiddleware<Provider<P>, LocalWallet>;

/// ethers-rs connector signing with a local private key.
#[derive(Clone)]
pub struct EthersChain<P = Http> {
    client: Arc<SignerClient<P>>,
    poll_interval: Duration,
}

impl EthersChain<Http> {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let provider =
            Provider::<Http>::try_from(config.rpc_url.as_str())?.interval(config.poll_interval);

        let wallet = config
            .wallet_secret
            .trim()
            .parse::<LocalWallet>()?
            .with_chain_id(config.chain_id);
        if let Some(expected) = config.wallet_address {
            if expected != wallet.address() {
                return Err(AppError::Config(format!(
                    "WALLET_ADDRESS {expected:?} does not match the key's address {:?}",
                    wallet.address()
                )));
            }
        }

        // sanity-check
        let remote_chain_id = provider.get_chainid().await?;
        if remote_chain_id != U256::from(config.chain_id) {
            return Err(AppError::Config(format!(
                "CHAIN_ID is {} but the node reports {remote_chain_id}",
                config.chain_id
            )));
        }

        info!(signer = ?wallet.address(), chain_id = config.chain_id, "[INIT] connected");
        Ok(Self::with_provider(provider, wallet, config.poll_interval))
    }
}

impl<P: JsonRpcClient> EthersChain<P> {
    /// Wrap an already configured provider; no node round-trips.
    pub fn with_provider(
        provider: Provider<P>,
        wallet: LocalWallet,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client: Arc::new(SignerMiddleware::new(provider, wallet)),
            poll_interval,
        }
    }
}

/// Tag a failure with the classifier code its text implies.
fn chain_error(err: impl std::fmt::Display) -> ChainError {
    let message = err.to_string();
    match code_from_message(&message) {
        Some(code) => ChainError::tagged(code, message),
        None => ChainError::rpc(message),
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> ChainConnector for EthersChain<P> {
    fn signer_address(&self) -> Address {
        self.client.address()
    }

    async fn get_pool(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
        fee: u32,
    ) -> std::result::Result<Address, ChainError> {
        UniswapV3Factory::new(factory, self.client.clone())
            .get_pool(token_a, token_b, fee)
            .call()
            .await
            .map_err(chain_error)
    }

    async fn pool_token0(&self, pool: Address) -> std::result::Result<Address, ChainError> {
        UniswapV3Pool::new(pool, self.client.clone())
            .token_0()
            .call()
            .await
            .map_err(chain_error)
    }

    async fn pool_token1(&self, pool: Address) -> std::result::Result<Address, ChainError> {
        UniswapV3Pool::new(pool, self.client.clone())
            .token_1()
            .call()
            .await
            .map_err(chain_error)
    }

    async fn pool_fee(&self, pool: Address) -> std::result::Result<u32, ChainError> {
        UniswapV3Pool::new(pool, self.client.clone())
            .fee()
            .call()
            .await
            .map_err(chain_error)
    }

    async fn pool_slot0(&self, pool: Address) -> std::result::Result<Slot0, ChainError> {
        let (sqrt_price_x96, tick, _, _, _, _fee_protocol, _unlocked) =
            UniswapV3Pool::new(pool, self.client.clone())
                .slot_0()
                .call()
                .await
                .map_err(chain_error)?;
        Ok(Slot0 {
            sqrt_price_x96,
            tick,
        })
    }

    async fn balance_of(
        &self,
        token: Address,
        holder: Address,
    ) -> std::result::Result<U256, ChainError> {
        Erc20::new(token, self.client.clone())
            .balance_of(holder)
            .call()
            .await
            .map_err(chain_error)
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> std::result::Result<U256, ChainError> {
        Erc20::new(token, self.client.clone())
            .allowance(owner, spender)
            .call()
            .await
            .map_err(chain_error)
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> std::result::Result<H256, ChainError> {
        let call = Erc20::new(token, self.client.clone()).approve(spender, amount);
        let pending = call.send().await.map_err(chain_error)?;
        Ok(pending.tx_hash())
    }

    async fn exact_input_single(
        &self,
        router: Address,
        request: &SwapRequest,
        overrides: TxOverrides,
    ) -> std::result::Result<H256, ChainError> {
        let params = ExactInputSingleParams {
            token_in: request.token_in,
            token_out: request.token_out,
            fee: request.fee,
            recipient: request.recipient,
            deadline: U256::from(request.deadline),
            amount_in: request.amount_in,
            amount_out_minimum: request.amount_out_minimum,
            sqrt_price_limit_x96: request.sqrt_price_limit_x96,
        };
        let call = SwapRouter::new(router, self.client.clone())
            .exact_input_single(params)
            .legacy()
            .gas(overrides.gas_limit)
            .gas_price(overrides.gas_price);
        let pending = call.send().await.map_err(chain_error)?;
        Ok(pending.tx_hash())
    }

    async fn gas_price(&self) -> std::result::Result<U256, ChainError> {
        self.client.get_gas_price().await.map_err(chain_error)
    }

    async fn await_confirmation(&self, hash: H256) -> std::result::Result<TxReceipt, ChainError> {
        let provider = self.client.provider();
        // Remember sender and nonce so a dropped transaction can be told apart
        // from one whose nonce was taken by another transaction.
        let sent = provider.get_transaction(hash).await.map_err(chain_error)?;

        let receipt = PendingTransaction::new(hash, provider)
            .interval(self.poll_interval)
            .await
            .map_err(chain_error)?;

        settle(provider, hash, sent.map(|tx| (tx.from, tx.nonce)), receipt).await
    }
}

/// Turn the end of a receipt wait into a terminal state.
///
/// `sent` is the sender and nonce seen before waiting; `receipt` is `None`
/// when the transaction left the mempool without being mined.
async fn settle<P: JsonRpcClient>(
    provider: &Provider<P>,
    hash: H256,
    sent: Option<(Address, U256)>,
    receipt: Option<TransactionReceipt>,
) -> std::result::Result<TxReceipt, ChainError> {
    match receipt {
        Some(r) if r.status == Some(U64::from(1)) => Ok(TxReceipt {
            hash,
            block_number: r.block_number.map(|b| b.as_u64()),
            gas_used: r.gas_used,
        }),
        Some(_) => Err(ChainError::Reverted { hash }),
        None => {
            if let Some((from, nonce)) = sent {
                let mined = provider
                    .get_transaction_count(from, Some(BlockNumber::Latest.into()))
                    .await
                    .map_err(chain_error)?;
                debug!(?hash, %nonce, %mined, "[TX] dropped, checking nonce");
                if mined > nonce {
                    return Err(ChainError::Replaced { hash });
                }
            }
            Err(ChainError::Dropped { hash })
        }
    }
}
