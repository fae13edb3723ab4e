//! Repository trait for the card catalog.

use crate::domain::entities::{Card, NewCard, Rarity};
use crate::error::AppError;
use async_trait::async_trait;

/// Read-mostly access to catalog cards.
///
/// The gacha engine only needs [`CardCatalog::list_active_by_rarity`]; the
/// remaining methods back the catalog endpoints and the admin tool.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgCardCatalog`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryStore`] - in-process store
/// - [`crate::infrastructure::cache::CachedCardCatalog`] - caching decorator
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CardCatalog: Send + Sync {
    /// Lists active cards of one rarity tier. May be empty.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn list_active_by_rarity(&self, rarity: Rarity) -> Result<Vec<Card>, AppError>;

    /// Lists every active card ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn list_active(&self) -> Result<Vec<Card>, AppError>;

    /// Finds a card by id, active or not.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<Card>, AppError>;

    /// Adds a new active card.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn create(&self, new_card: NewCard) -> Result<Card, AppError>;

    /// Toggles whether a card takes part in draws.
    ///
    /// Returns `Ok(None)` if no card has this id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn set_active(&self, id: i64, active: bool) -> Result<Option<Card>, AppError>;
}
