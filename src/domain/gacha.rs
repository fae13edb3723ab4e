//! Gacha rules: pull pricing, drop tables and the pity guarantee.
//!
//! Everything here is pure; catalog lookups and ledger writes happen in
//! [`crate::application::services::GachaService`].
//!
//! # Drop rates
//!
//! | Rarity    | Standard | Guaranteed slot |
//! |-----------|----------|-----------------|
//! | LEGENDARY | 1%       | 1/30            |
//! | EPIC      | 4%       | 4/30            |
//! | RARE      | 25%      | 25/30           |
//! | COMMON    | 70%      | -               |
//!
//! The guaranteed slot keeps the relative 1:4:25 odds of the non-common tiers.

use serde::Serialize;

use super::entities::{Card, Currency, Rarity};

/// Number of cards drawn by a ten-pull.
pub const TEN_PULL_SIZE: usize = 10;

/// Drop rate per tier in percent, rarest first.
pub const DROP_RATES: [(Rarity, u32); 4] = [
    (Rarity::Legendary, 1),
    (Rarity::Epic, 4),
    (Rarity::Rare, 25),
    (Rarity::Common, 70),
];

/// Single or ten-card pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PullKind {
    Single,
    Ten,
}

impl PullKind {
    /// Number of cards the pull produces.
    pub fn draws(&self) -> usize {
        match self {
            PullKind::Single => 1,
            PullKind::Ten => TEN_PULL_SIZE,
        }
    }
}

/// Pull label reported back to callers, combining kind and currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullType {
    SingleCoin,
    SingleGem,
    TenCoin,
    TenGem,
}

impl PullType {
    pub const ALL: [PullType; 4] = [
        PullType::SingleCoin,
        PullType::SingleGem,
        PullType::TenCoin,
        PullType::TenGem,
    ];

    pub fn new(kind: PullKind, currency: Currency) -> Self {
        match (kind, currency) {
            (PullKind::Single, Currency::Coins) => PullType::SingleCoin,
            (PullKind::Single, Currency::Gems) => PullType::SingleGem,
            (PullKind::Ten, Currency::Coins) => PullType::TenCoin,
            (PullKind::Ten, Currency::Gems) => PullType::TenGem,
        }
    }

    pub fn kind(&self) -> PullKind {
        match self {
            PullType::SingleCoin | PullType::SingleGem => PullKind::Single,
            PullType::TenCoin | PullType::TenGem => PullKind::Ten,
        }
    }

    pub fn currency(&self) -> Currency {
        match self {
            PullType::SingleCoin | PullType::TenCoin => Currency::Coins,
            PullType::SingleGem | PullType::TenGem => Currency::Gems,
        }
    }

    /// Price in the pull's currency. Ten-pulls cost nine singles.
    pub fn cost(&self) -> i64 {
        match self {
            PullType::SingleCoin => 100,
            PullType::SingleGem => 1,
            PullType::TenCoin => 900,
            PullType::TenGem => 9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PullType::SingleCoin => "SINGLE_COIN",
            PullType::SingleGem => "SINGLE_GEM",
            PullType::TenCoin => "TEN_COIN",
            PullType::TenGem => "TEN_GEM",
        }
    }
}

/// Which distribution a single draw uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// Full [`DROP_RATES`] table, falling back to COMMON.
    Standard,
    /// RARE-or-better only, falling back to RARE. Used for the pity slot.
    GuaranteedRare,
}

impl DrawMode {
    /// Upper bound of the uniform `1..=sides` roll.
    pub fn roll_sides(&self) -> u32 {
        self.table().map(|(_, rate)| rate).sum()
    }

    /// Maps a roll in `1..=roll_sides()` onto a rarity tier.
    ///
    /// Thresholds are cumulative from the rarest tier down, so for the
    /// standard table 1 is LEGENDARY, 2..=5 EPIC, 6..=30 RARE, the rest COMMON.
    pub fn rarity_for(&self, roll: u32) -> Rarity {
        let mut threshold = 0;
        for (rarity, rate) in self.table() {
            threshold += rate;
            if roll <= threshold {
                return rarity;
            }
        }
        self.fallback()
    }

    /// Pool used when the rolled tier has no active cards.
    pub fn fallback(&self) -> Rarity {
        match self {
            DrawMode::Standard => Rarity::Common,
            DrawMode::GuaranteedRare => Rarity::Rare,
        }
    }

    fn table(&self) -> impl Iterator<Item = (Rarity, u32)> {
        let floor = match self {
            DrawMode::Standard => Rarity::Common,
            DrawMode::GuaranteedRare => Rarity::Rare,
        };
        DROP_RATES
            .into_iter()
            .filter(move |(rarity, _)| *rarity >= floor)
    }
}

/// Chooses the draw mode for slot `index` of a pull.
///
/// Only the last slot of a ten-pull can be forced, and only when no earlier
/// slot produced anything above COMMON.
pub fn draw_mode_for_slot(kind: PullKind, index: usize, rare_seen: bool) -> DrawMode {
    let last_slot = kind == PullKind::Ten && index + 1 == TEN_PULL_SIZE;
    if last_slot && !rare_seen {
        DrawMode::GuaranteedRare
    } else {
        DrawMode::Standard
    }
}

/// Outcome of a completed pull.
#[derive(Debug, Clone)]
pub struct PullResult {
    /// Drawn cards in draw order.
    pub cards: Vec<Card>,
    pub total_cost: i64,
    pub pull_type: PullType,
    pub remaining_coins: i64,
    pub remaining_gems: i64,
}
