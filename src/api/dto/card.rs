//! DTOs for catalog endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{Card, Element, Rarity};

/// Public view of a catalog card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDto {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub attack: i32,
    pub defense: i32,
    pub cost: i32,
    pub rarity: Rarity,
    pub element: Element,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Card> for CardDto {
    fn from(card: Card) -> Self {
        Self {
            id: card.id,
            name: card.name,
            description: card.description,
            attack: card.attack,
            defense: card.defense,
            cost: card.cost,
            rarity: card.rarity,
            element: card.element,
            image_url: card.image_url,
            is_active: card.is_active,
            created_at: card.created_at,
        }
    }
}

/// `GET /api/cards` filters, matched case-insensitively.
#[derive(Debug, Deserialize)]
pub struct CardListQuery {
    pub rarity: Option<String>,
    pub element: Option<String>,
}

/// Active catalog listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct CardListResponse {
    pub total: usize,
    pub items: Vec<CardDto>,
}
