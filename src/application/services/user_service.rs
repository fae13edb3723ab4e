//! User profiles, balances and collections.

use std::sync::Arc;

use serde_json::json;
use validator::Validate;

use crate::domain::entities::{CollectionEntry, NewUser, User};
use crate::domain::repositories::UserLedger;
use crate::error::AppError;

/// One page of a user's collection plus the total number of owned cards.
#[derive(Debug, Clone)]
pub struct CollectionPage {
    pub entries: Vec<CollectionEntry>,
    pub total: i64,
}

/// Service for account reads and balance administration.
pub struct UserService<L: UserLedger + ?Sized> {
    ledger: Arc<L>,
}

impl<L: UserLedger + ?Sized> UserService<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// Retrieves a user profile.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the user does not exist.
    pub async fn get_user(&self, id: i64) -> Result<User, AppError> {
        self.ledger
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({ "user_id": id })))
    }

    /// Registers a user with the starting balances.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if username or email is malformed.
    /// Returns [`AppError::Conflict`] if either is already taken.
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        new_user.validate()?;
        let user = self.ledger.create_user(new_user).await?;
        tracing::info!(user_id = user.id, "User created");
        Ok(user)
    }

    /// Overwrites coin and/or gem balances.
    ///
    /// Runs in a ledger transaction with the user row locked, so it cannot
    /// interleave with a pull for the same user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if a balance is negative.
    /// Returns [`AppError::NotFound`] if the user does not exist.
    pub async fn update_currency(
        &self,
        id: i64,
        coins: Option<i64>,
        gems: Option<i64>,
    ) -> Result<User, AppError> {
        if coins.is_some_and(|c| c < 0) || gems.is_some_and(|g| g < 0) {
            return Err(AppError::bad_request(
                "Balances must not be negative",
                json!({ "coins": coins, "gems": gems }),
            ));
        }

        let mut tx = self.ledger.begin().await?;
        let Some(mut user) = tx.lock_user(id).await? else {
            tx.rollback().await?;
            return Err(AppError::not_found("User not found", json!({ "user_id": id })));
        };

        if let Some(coins) = coins {
            user.coins = coins;
        }
        if let Some(gems) = gems {
            user.gems = gems;
        }

        tx.save_user(&user).await?;
        tx.commit().await?;

        tracing::info!(user_id = id, coins = user.coins, gems = user.gems, "Balances updated");
        Ok(user)
    }

    /// Adds coins and/or gems to the current balances.
    ///
    /// The balances are read under the same row lock that the write uses, so a
    /// pull committing concurrently is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if a resulting balance would be negative.
    /// Returns [`AppError::NotFound`] if the user does not exist.
    pub async fn grant_currency(&self, id: i64, coins: i64, gems: i64) -> Result<User, AppError> {
        let mut tx = self.ledger.begin().await?;
        let Some(mut user) = tx.lock_user(id).await? else {
            tx.rollback().await?;
            return Err(AppError::not_found("User not found", json!({ "user_id": id })));
        };

        let new_coins = user.coins + coins;
        let new_gems = user.gems + gems;
        if new_coins < 0 || new_gems < 0 {
            tx.rollback().await?;
            return Err(AppError::bad_request(
                "Balances must not be negative",
                json!({ "coins": new_coins, "gems": new_gems }),
            ));
        }

        user.coins = new_coins;
        user.gems = new_gems;
        tx.save_user(&user).await?;
        tx.commit().await?;

        tracing::info!(user_id = id, coins, gems, "Balances granted");
        Ok(user)
    }

    /// Lists a page of the user's collection, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the user does not exist.
    pub async fn list_collection(
        &self,
        user_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<CollectionPage, AppError> {
        self.get_user(user_id).await?;

        let (entries, total) = tokio::try_join!(
            self.ledger.list_collection(user_id, offset, limit),
            self.ledger.count_owned_cards(user_id),
        )?;

        Ok(CollectionPage { entries, total })
    }
}
