//! PostgreSQL implementation of the card catalog.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{Card, NewCard, Rarity};
use crate::domain::repositories::CardCatalog;
use crate::error::AppError;

const CARD_COLUMNS: &str = "id, name, description, attack, defense, cost, rarity, element, \
                            image_url, is_active, created_at";

/// Raw `cards` row; rarity and element are stored as text.
#[derive(Debug, FromRow)]
pub(crate) struct CardRow {
    id: i64,
    name: String,
    description: Option<String>,
    attack: i32,
    defense: i32,
    cost: i32,
    rarity: String,
    element: String,
    image_url: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<CardRow> for Card {
    type Error = AppError;

    fn try_from(row: CardRow) -> Result<Self, Self::Error> {
        let corrupt = |e: crate::domain::entities::UnknownVariant| {
            AppError::internal(
                "Corrupt card row",
                json!({ "card_id": row.id, "reason": e.to_string() }),
            )
        };
        let rarity = row.rarity.parse().map_err(corrupt)?;
        let element = row.element.parse().map_err(corrupt)?;

        Ok(Card {
            id: row.id,
            name: row.name,
            description: row.description,
            attack: row.attack,
            defense: row.defense,
            cost: row.cost,
            rarity,
            element,
            image_url: row.image_url,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

pub(crate) fn into_cards(rows: Vec<CardRow>) -> Result<Vec<Card>, AppError> {
    rows.into_iter().map(Card::try_from).collect()
}

/// PostgreSQL repository for catalog cards.
pub struct PgCardCatalog {
    pool: Arc<PgPool>,
}

impl PgCardCatalog {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CardCatalog for PgCardCatalog {
    async fn list_active_by_rarity(&self, rarity: Rarity) -> Result<Vec<Card>, AppError> {
        let rows = sqlx::query_as::<_, CardRow>(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE rarity = $1 AND is_active ORDER BY id"
        ))
        .bind(rarity.as_str())
        .fetch_all(self.pool.as_ref())
        .await?;

        into_cards(rows)
    }

    async fn list_active(&self) -> Result<Vec<Card>, AppError> {
        let rows = sqlx::query_as::<_, CardRow>(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE is_active ORDER BY name, id"
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        into_cards(rows)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Card>, AppError> {
        let row = sqlx::query_as::<_, CardRow>(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Card::try_from).transpose()
    }

    async fn create(&self, new_card: NewCard) -> Result<Card, AppError> {
        let row = sqlx::query_as::<_, CardRow>(&format!(
            r#"
            INSERT INTO cards (name, description, attack, defense, cost, rarity, element, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {CARD_COLUMNS}
            "#
        ))
        .bind(&new_card.name)
        .bind(&new_card.description)
        .bind(new_card.attack)
        .bind(new_card.defense)
        .bind(new_card.cost)
        .bind(new_card.rarity.as_str())
        .bind(new_card.element.as_str())
        .bind(&new_card.image_url)
        .fetch_one(self.pool.as_ref())
        .await?;

        Card::try_from(row)
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<Option<Card>, AppError> {
        let row = sqlx::query_as::<_, CardRow>(&format!(
            "UPDATE cards SET is_active = $2 WHERE id = $1 RETURNING {CARD_COLUMNS}"
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Card::try_from).transpose()
    }
}
