//! PostgreSQL implementation of the user ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::sync::Arc;

use super::pg_card_catalog::CardRow;
use crate::domain::entities::{
    Card, CollectionEntry, NewOwnedCard, NewUser, OwnedCard, STARTING_COINS, STARTING_GEMS, User,
};
use crate::domain::repositories::{LedgerTransaction, UserLedger};
use crate::error::AppError;

const USER_COLUMNS: &str =
    "id, username, email, coins, gems, experience_points, level, created_at, updated_at";

const OWNED_COLUMNS: &str = "id, user_id, card_id, level, experience, obtained_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    coins: i64,
    gems: i64,
    experience_points: i32,
    level: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            username: r.username,
            email: r.email,
            coins: r.coins,
            gems: r.gems,
            experience_points: r.experience_points,
            level: r.level,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct OwnedCardRow {
    id: i64,
    user_id: i64,
    card_id: i64,
    level: i32,
    experience: i32,
    obtained_at: DateTime<Utc>,
}

impl From<OwnedCardRow> for OwnedCard {
    fn from(r: OwnedCardRow) -> Self {
        OwnedCard {
            id: r.id,
            user_id: r.user_id,
            card_id: r.card_id,
            level: r.level,
            experience: r.experience,
            obtained_at: r.obtained_at,
        }
    }
}

/// Ownership row joined with its card; card columns are read by [`CardRow`].
#[derive(Debug, FromRow)]
struct CollectionRow {
    owned_id: i64,
    owned_level: i32,
    experience: i32,
    obtained_at: DateTime<Utc>,
    #[sqlx(flatten)]
    card: CardRow,
}

/// PostgreSQL repository for users and their collections.
pub struct PgUserLedger {
    pool: Arc<PgPool>,
}

impl PgUserLedger {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserLedger for PgUserLedger {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTransaction { tx }))
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(User::from))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (username, email, coins, gems)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(STARTING_COINS)
        .bind(STARTING_GEMS)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn list_collection(
        &self,
        user_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<CollectionEntry>, AppError> {
        let rows = sqlx::query_as::<_, CollectionRow>(
            r#"
            SELECT uc.id AS owned_id, uc.level AS owned_level, uc.experience, uc.obtained_at,
                   c.id, c.name, c.description, c.attack, c.defense, c.cost,
                   c.rarity, c.element, c.image_url, c.is_active, c.created_at
            FROM user_cards uc
            JOIN cards c ON c.id = uc.card_id
            WHERE uc.user_id = $1
            ORDER BY uc.obtained_at DESC, uc.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter()
            .map(|r| {
                let card = Card::try_from(r.card)?;
                Ok(CollectionEntry {
                    owned: OwnedCard {
                        id: r.owned_id,
                        user_id,
                        card_id: card.id,
                        level: r.owned_level,
                        experience: r.experience,
                        obtained_at: r.obtained_at,
                    },
                    card,
                })
            })
            .collect()
    }

    async fn count_owned_cards(&self, user_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_cards WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }
}

/// A database transaction; row locks taken here are held until it ends.
///
/// Dropping it without [`LedgerTransaction::commit`] rolls back.
pub struct PgLedgerTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    async fn lock_user(&mut self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(User::from))
    }

    async fn save_user(&mut self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET coins = $2, gems = $3, experience_points = $4, level = $5, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(user.coins)
        .bind(user.gems)
        .bind(user.experience_points)
        .bind(user.level)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn find_owned_card(
        &mut self,
        user_id: i64,
        card_id: i64,
    ) -> Result<Option<OwnedCard>, AppError> {
        let row = sqlx::query_as::<_, OwnedCardRow>(&format!(
            "SELECT {OWNED_COLUMNS} FROM user_cards WHERE user_id = $1 AND card_id = $2"
        ))
        .bind(user_id)
        .bind(card_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(OwnedCard::from))
    }

    async fn insert_owned_card(&mut self, new_owned: NewOwnedCard) -> Result<OwnedCard, AppError> {
        let row = sqlx::query_as::<_, OwnedCardRow>(&format!(
            "INSERT INTO user_cards (user_id, card_id) VALUES ($1, $2) RETURNING {OWNED_COLUMNS}"
        ))
        .bind(new_owned.user_id)
        .bind(new_owned.card_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    async fn update_owned_card(&mut self, owned: &OwnedCard) -> Result<(), AppError> {
        sqlx::query("UPDATE user_cards SET experience = $2, level = $3 WHERE id = $1")
            .bind(owned.id)
            .bind(owned.experience)
            .bind(owned.level)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
