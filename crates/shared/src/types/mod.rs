//! Common types shared across crates.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{MONEY_SCALE, percent_of, round_money, safe_ratio, within_tolerance};
