//! Coin, Coins and gas price types

use crate::decimal::{Decimal, DecimalError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Precision used for gas prices
pub const GAS_PRICE_DIGITS: u32 = 18;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoinError {
    #[error("invalid denomination:: {0}")]
    InvalidDenom(String),

    #[error("invalid amount:: {0}")]
    InvalidAmount(#[from] DecimalError),

    #[error("duplicate denomination:: {0}")]
    DuplicateDenom(String),

    #[error("invalid gas price:: {0}")]
    InvalidGasPrice(String),
}

/// A single coin with denomination and an integer amount
///
/// The amount is kept in its canonical decimal string form, which is also
/// how it travels in protobuf and amino JSON.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ::prost::Message)]
pub struct Coin {
    #[prost(string, tag = "1")]
    pub denom: String,
    #[prost(string, tag = "2")]
    pub amount: String,
}

impl Coin {
    /// Create a new coin, validating denomination and amount
    pub fn new(denom: impl Into<String>, amount: &str) -> Result<Self, CoinError> {
        let denom = denom.into();
        if !is_valid_denom(&denom) {
            return Err(CoinError::InvalidDenom(denom));
        }

        let amount = Decimal::from_atomics(amount, 0)?;
        Ok(Self {
            denom,
            amount: amount.atomics(),
        })
    }

    /// The amount as an integer decimal
    pub fn amount_decimal(&self) -> Result<Decimal, CoinError> {
        Ok(Decimal::from_atomics(&self.amount, 0)?)
    }

    pub fn is_zero(&self) -> bool {
        self.amount.bytes().all(|b| b == b'0')
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A collection of coins, always sorted by denomination
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Create a new Coins collection from a vector of coins
    /// Enforces sorting by denomination and no duplicates
    pub fn new(mut coins: Vec<Coin>) -> Result<Self, CoinError> {
        coins.retain(|c| !c.is_zero());
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));

        for window in coins.windows(2) {
            if window[0].denom == window[1].denom {
                return Err(CoinError::DuplicateDenom(window[0].denom.clone()));
            }
        }

        Ok(Self(coins))
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Coin] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Coin> {
        self.0
    }

    /// Add a coin to the collection, merging with an existing denomination
    pub fn add(&mut self, coin: Coin) -> Result<(), CoinError> {
        if coin.is_zero() {
            return Ok(());
        }

        if let Some(existing) = self.0.iter_mut().find(|c| c.denom == coin.denom) {
            let sum = existing.amount_decimal()?.plus(&coin.amount_decimal()?)?;
            existing.amount = sum.atomics();
            return Ok(());
        }

        self.0.push(coin);
        self.0.sort_by(|a, b| a.denom.cmp(&b.denom));
        Ok(())
    }

    /// Amount held of a specific denomination, zero when absent
    pub fn amount_of(&self, denom: &str) -> Result<Decimal, CoinError> {
        match self.0.iter().find(|c| c.denom == denom) {
            Some(coin) => coin.amount_decimal(),
            None => Ok(Decimal::zero(0)?),
        }
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", s.join(","))
    }
}

/// Price per unit of gas, e.g. `0.025uatom`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GasPrice {
    pub amount: Decimal,
    pub denom: String,
}

impl GasPrice {
    pub fn new(amount: Decimal, denom: impl Into<String>) -> Result<Self, CoinError> {
        let denom = denom.into();
        if !is_valid_denom(&denom) {
            return Err(CoinError::InvalidDenom(denom));
        }
        Ok(Self { amount, denom })
    }
}

impl FromStr for GasPrice {
    type Err = CoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .ok_or_else(|| CoinError::InvalidGasPrice(s.to_string()))?;
        let (amount, denom) = s.split_at(split);
        if amount.is_empty() {
            return Err(CoinError::InvalidGasPrice(s.to_string()));
        }

        let amount = Decimal::from_user_input(amount, GAS_PRICE_DIGITS)?;
        Self::new(amount, denom)
    }
}

impl fmt::Display for GasPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Fee for `gas_limit` units at `gas_price`, rounded up to a whole coin
pub fn calculate_fee(gas_limit: u64, gas_price: &GasPrice) -> Result<Coin, CoinError> {
    let total = gas_price.amount.multiply(gas_limit).ceil();
    Coin::new(gas_price.denom.clone(), &total.to_string())
}

/// Denominations start with a letter and use `[a-zA-Z0-9/:._-]`, 3 to 128 chars
fn is_valid_denom(denom: &str) -> bool {
    if denom.len() < 3 || denom.len() > 128 {
        return false;
    }

    let mut chars = denom.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return false;
    }

    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'))
}
