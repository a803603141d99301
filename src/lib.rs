//! Core library for the v3-swap-executor project.
//!
//! Resolves a Uniswap V3 pool, approves the router, escalates the gas price
//! and submits one `exactInputSingle` swap. The binary (`main.rs`) only wires
//! configuration, the ethers connector and logging around [`pipeline::run`].

pub mod allowance;
pub mod chain;
pub mod classifier;
pub mod config;
pub mod dex;
pub mod errors;
pub mod executor;
pub mod gas;
pub mod models;
pub mod pipeline;
pub mod tokens;
pub mod utils;
