//! DTOs for pull and drop-rate endpoints.

use serde::{Deserialize, Serialize};

use super::card::CardDto;
use crate::domain::entities::{Currency, Rarity};
use crate::domain::gacha::{PullResult, PullType};

/// Query string of the pull endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PullQuery {
    #[serde(default, alias = "useGems")]
    pub use_gems: bool,
}

/// Cards drawn by a pull and the balances left afterwards.
#[derive(Debug, Serialize, Deserialize)]
pub struct PullResponse {
    pub pull_type: String,
    pub total_cost: i64,
    pub remaining_coins: i64,
    pub remaining_gems: i64,
    pub cards: Vec<CardDto>,
}

impl From<PullResult> for PullResponse {
    fn from(result: PullResult) -> Self {
        Self {
            pull_type: result.pull_type.as_str().to_string(),
            total_cost: result.total_cost,
            remaining_coins: result.remaining_coins,
            remaining_gems: result.remaining_gems,
            cards: result.cards.into_iter().map(CardDto::from).collect(),
        }
    }
}

/// Published drop table and prices.
#[derive(Debug, Serialize, Deserialize)]
pub struct RatesResponse {
    pub rates: Vec<RateEntry>,
    pub costs: Vec<CostEntry>,
    /// Minimum rarity guaranteed once per ten-pull.
    pub ten_pull_guarantee: Rarity,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RateEntry {
    pub rarity: Rarity,
    pub percent: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CostEntry {
    pub pull_type: String,
    pub currency: Currency,
    pub amount: i64,
    pub cards: usize,
}

impl From<PullType> for CostEntry {
    fn from(pull_type: PullType) -> Self {
        Self {
            pull_type: pull_type.as_str().to_string(),
            currency: pull_type.currency(),
            amount: pull_type.cost(),
            cards: pull_type.kind().draws(),
        }
    }
}
