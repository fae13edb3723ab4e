//! Repository traits for user balances and card ownership.

use crate::domain::entities::{CollectionEntry, NewOwnedCard, NewUser, OwnedCard, User};
use crate::error::AppError;
use async_trait::async_trait;

/// Storage for user accounts and their owned cards.
///
/// Mutations of balances and ownership go through a [`LedgerTransaction`]
/// obtained from [`UserLedger::begin`], so a pull either commits all of its
/// writes or none of them.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUserLedger`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryStore`] - in-process store
#[async_trait]
pub trait UserLedger: Send + Sync {
    /// Opens a unit of work. Dropping it without committing discards its writes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the transaction cannot be started.
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, AppError>;

    /// Reads a user without locking.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Registers a user with the starting balances.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the username or email is taken.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError>;

    /// Lists a user's owned cards, most recently obtained first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn list_collection(
        &self,
        user_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<CollectionEntry>, AppError>;

    /// Counts distinct cards owned by a user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn count_owned_cards(&self, user_id: i64) -> Result<i64, AppError>;
}

/// An open ledger transaction.
///
/// Concurrent transactions touching the same user are serialized by
/// [`LedgerTransaction::lock_user`]: the lock is held until commit or rollback.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Loads a user and locks the row for the rest of the transaction.
    async fn lock_user(&mut self, id: i64) -> Result<Option<User>, AppError>;

    /// Writes back balances, experience and level of a locked user.
    async fn save_user(&mut self, user: &User) -> Result<(), AppError>;

    /// Finds the ownership record for `(user_id, card_id)`, including
    /// records inserted earlier in this transaction.
    async fn find_owned_card(
        &mut self,
        user_id: i64,
        card_id: i64,
    ) -> Result<Option<OwnedCard>, AppError>;

    /// Creates an ownership record with zero experience.
    async fn insert_owned_card(&mut self, new_owned: NewOwnedCard) -> Result<OwnedCard, AppError>;

    /// Writes back the experience and level of an ownership record.
    async fn update_owned_card(&mut self, owned: &OwnedCard) -> Result<(), AppError>;

    /// Makes every write of this transaction visible.
    async fn commit(self: Box<Self>) -> Result<(), AppError>;

    /// Discards every write of this transaction.
    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}
