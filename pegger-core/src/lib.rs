#![allow(clippy::missing_errors_doc)]
#![allow(clippy::wildcard_imports)]

pub mod calibrator;
pub mod controller;
pub mod error;
pub mod fixed_point;
pub mod liquidity_amount;
pub mod pair_math;
pub mod peg_config;
pub mod pool;
pub mod price_feed;
pub mod price_ratio;
pub mod round_log;
#[cfg(any(test, feature = "simulation"))]
pub mod sim_pool;
pub mod solana_clock;
pub mod threshold_gate;
pub mod util;
