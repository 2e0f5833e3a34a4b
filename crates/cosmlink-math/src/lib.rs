//! Mathematical types for cosmlink
//!
//! This crate provides the exact fixed-point [`Decimal`] used for every
//! monetary amount, plus the coin and gas price types built on top of it.
//! Nothing in here touches floating point except
//! [`Decimal::to_float_approximation`].

pub mod coin;
pub mod decimal;

pub use coin::{calculate_fee, Coin, CoinError, Coins, GasPrice, GAS_PRICE_DIGITS};
pub use decimal::{Decimal, DecimalError, FractionalDigitsError, MAX_FRACTIONAL_DIGITS};
