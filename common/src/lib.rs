//! fxrate Common Types
//!
//! This crate contains shared types used across the fxrate service,
//! including currency codes, quoted rate records, and time helpers.

pub mod currency;
pub mod rate;
pub mod time;

pub use currency::*;
pub use rate::*;
pub use time::*;
