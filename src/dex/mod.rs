//! Uniswap V3 pool lookup and pool state.

pub mod resolver;
pub mod state;

pub use resolver::resolve_pool;
pub use state::{Pool, price_from_sqrt_x96};
