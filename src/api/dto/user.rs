//! DTOs for user profile and collection endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::card::CardDto;
use crate::domain::entities::{CollectionEntry, User};

/// Profile with balances.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserDto {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub coins: i64,
    pub gems: i64,
    pub experience_points: i32,
    pub level: i32,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            coins: user.coins,
            gems: user.gems,
            experience_points: user.experience_points,
            level: user.level,
            created_at: user.created_at,
        }
    }
}

/// New balances; omitted fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCurrencyRequest {
    #[validate(range(min = 0))]
    pub coins: Option<i64>,
    #[validate(range(min = 0))]
    pub gems: Option<i64>,
}

/// One owned card.
#[derive(Debug, Serialize, Deserialize)]
pub struct CollectionItemDto {
    pub id: i64,
    pub level: i32,
    pub experience: i32,
    pub obtained_at: DateTime<Utc>,
    pub card: CardDto,
}

impl From<CollectionEntry> for CollectionItemDto {
    fn from(entry: CollectionEntry) -> Self {
        Self {
            id: entry.owned.id,
            level: entry.owned.level,
            experience: entry.owned.experience,
            obtained_at: entry.owned.obtained_at,
            card: entry.card.into(),
        }
    }
}

/// Paginated collection.
#[derive(Debug, Serialize, Deserialize)]
pub struct CollectionResponse {
    pub pagination: PaginationMeta,
    pub items: Vec<CollectionItemDto>,
}

/// Pagination metadata for responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: u32,
}
