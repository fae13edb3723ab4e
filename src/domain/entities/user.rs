//! Player account with its soft-currency balances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use validator::Validate;

use crate::error::AppError;

/// Coins granted to a freshly created account.
pub const STARTING_COINS: i64 = 1000;

/// Gems granted to a freshly created account.
pub const STARTING_GEMS: i64 = 100;

/// Soft currency a pull can be paid with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Coins,
    Gems,
}

impl Currency {
    /// Maps the `use_gems` request flag onto a currency.
    pub fn from_use_gems(use_gems: bool) -> Self {
        if use_gems { Currency::Gems } else { Currency::Coins }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Coins => "coins",
            Currency::Gems => "gems",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A player account.
///
/// Balances never go negative; [`User::debit`] refuses any charge the
/// selected balance cannot cover and leaves the account untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub coins: i64,
    pub gems: i64,
    pub experience_points: i32,
    pub level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Current balance of the given currency.
    pub fn balance(&self, currency: Currency) -> i64 {
        match currency {
            Currency::Coins => self.coins,
            Currency::Gems => self.gems,
        }
    }

    /// Removes `amount` from the selected balance.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InsufficientFunds`] if the balance is lower than
    /// `amount`. The user is not modified in that case.
    pub fn debit(&mut self, currency: Currency, amount: i64) -> Result<(), AppError> {
        let available = self.balance(currency);
        if available < amount {
            return Err(AppError::insufficient_funds(
                format!("Not enough {currency}"),
                json!({
                    "currency": currency,
                    "required": amount,
                    "available": available,
                }),
            ));
        }

        match currency {
            Currency::Coins => self.coins -= amount,
            Currency::Gems => self.gems -= amount,
        }
        Ok(())
    }
}

/// Input data for registering a new account.
#[derive(Debug, Clone, Validate)]
pub struct NewUser {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
}
