//! In-process catalog and ledger.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::entities::{
    Card, CollectionEntry, NewCard, NewOwnedCard, NewUser, OwnedCard, Rarity, STARTING_COINS,
    STARTING_GEMS, User,
};
use crate::domain::repositories::{CardCatalog, LedgerTransaction, UserLedger};
use crate::error::AppError;

#[derive(Debug, Clone, Default)]
struct LedgerState {
    users: BTreeMap<i64, User>,
    owned: BTreeMap<i64, OwnedCard>,
    next_user_id: i64,
    next_owned_id: i64,
}

impl LedgerState {
    fn owned_by(&self, user_id: i64, card_id: i64) -> Option<&OwnedCard> {
        self.owned
            .values()
            .find(|o| o.user_id == user_id && o.card_id == card_id)
    }
}

/// Catalog and ledger kept in memory.
///
/// Ledger transactions take an exclusive lock on the whole ledger and work on
/// a private copy that replaces the shared state on commit. This serializes
/// every pull, which is stricter than the per-user row locks of
/// [`super::PgUserLedger`] but gives the same observable guarantees.
#[derive(Default)]
pub struct MemoryStore {
    cards: RwLock<Vec<Card>>,
    ledger: Arc<Mutex<LedgerState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites both balances of a user outside of any pull.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the user does not exist.
    pub async fn set_balances(&self, user_id: i64, coins: i64, gems: i64) -> Result<(), AppError> {
        let mut state = self.ledger.lock().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found("User not found", json!({ "user_id": user_id })))?;
        user.coins = coins;
        user.gems = gems;
        Ok(())
    }
}

#[async_trait]
impl CardCatalog for MemoryStore {
    async fn list_active_by_rarity(&self, rarity: Rarity) -> Result<Vec<Card>, AppError> {
        let cards = self.cards.read().await;
        Ok(cards
            .iter()
            .filter(|c| c.is_active && c.rarity == rarity)
            .cloned()
            .collect())
    }

    async fn list_active(&self) -> Result<Vec<Card>, AppError> {
        let cards = self.cards.read().await;
        let mut active: Vec<Card> = cards.iter().filter(|c| c.is_active).cloned().collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(active)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Card>, AppError> {
        let cards = self.cards.read().await;
        Ok(cards.iter().find(|c| c.id == id).cloned())
    }

    async fn create(&self, new_card: NewCard) -> Result<Card, AppError> {
        let mut cards = self.cards.write().await;
        let card = Card {
            id: cards.len() as i64 + 1,
            name: new_card.name,
            description: new_card.description,
            attack: new_card.attack,
            defense: new_card.defense,
            cost: new_card.cost,
            rarity: new_card.rarity,
            element: new_card.element,
            image_url: new_card.image_url,
            is_active: true,
            created_at: Utc::now(),
        };
        cards.push(card.clone());
        Ok(card)
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<Option<Card>, AppError> {
        let mut cards = self.cards.write().await;
        Ok(cards.iter_mut().find(|c| c.id == id).map(|card| {
            card.is_active = active;
            card.clone()
        }))
    }
}

#[async_trait]
impl UserLedger for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, AppError> {
        let guard = self.ledger.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.ledger.lock().await.users.get(&id).cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut state = self.ledger.lock().await;

        let taken = state
            .users
            .values()
            .any(|u| u.username == new_user.username || u.email == new_user.email);
        if taken {
            return Err(AppError::conflict(
                "Username or email already registered",
                json!({ "username": new_user.username }),
            ));
        }

        state.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: state.next_user_id,
            username: new_user.username,
            email: new_user.email,
            coins: STARTING_COINS,
            gems: STARTING_GEMS,
            experience_points: 0,
            level: 1,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_collection(
        &self,
        user_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<CollectionEntry>, AppError> {
        let mut owned: Vec<OwnedCard> = {
            let state = self.ledger.lock().await;
            state
                .owned
                .values()
                .filter(|o| o.user_id == user_id)
                .cloned()
                .collect()
        };
        owned.sort_by(|a, b| b.obtained_at.cmp(&a.obtained_at).then(b.id.cmp(&a.id)));

        let cards = self.cards.read().await;
        Ok(owned
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .filter_map(|owned| {
                let card = cards.iter().find(|c| c.id == owned.card_id)?.clone();
                Some(CollectionEntry { owned, card })
            })
            .collect())
    }

    async fn count_owned_cards(&self, user_id: i64) -> Result<i64, AppError> {
        let state = self.ledger.lock().await;
        Ok(state.owned.values().filter(|o| o.user_id == user_id).count() as i64)
    }
}

/// Exclusive view of the ledger; writes land in `working` until commit.
struct MemoryTransaction {
    guard: OwnedMutexGuard<LedgerState>,
    working: LedgerState,
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    async fn lock_user(&mut self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn save_user(&mut self, user: &User) -> Result<(), AppError> {
        let stored = self.working.users.get_mut(&user.id).ok_or_else(|| {
            AppError::internal("Saving unknown user", json!({ "user_id": user.id }))
        })?;
        *stored = User {
            updated_at: Utc::now(),
            ..user.clone()
        };
        Ok(())
    }

    async fn find_owned_card(
        &mut self,
        user_id: i64,
        card_id: i64,
    ) -> Result<Option<OwnedCard>, AppError> {
        Ok(self.working.owned_by(user_id, card_id).cloned())
    }

    async fn insert_owned_card(&mut self, new_owned: NewOwnedCard) -> Result<OwnedCard, AppError> {
        if self
            .working
            .owned_by(new_owned.user_id, new_owned.card_id)
            .is_some()
        {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "user_cards_user_id_card_id_key" }),
            ));
        }

        self.working.next_owned_id += 1;
        let owned = OwnedCard {
            id: self.working.next_owned_id,
            user_id: new_owned.user_id,
            card_id: new_owned.card_id,
            level: 1,
            experience: 0,
            obtained_at: Utc::now(),
        };
        self.working.owned.insert(owned.id, owned.clone());
        Ok(owned)
    }

    async fn update_owned_card(&mut self, owned: &OwnedCard) -> Result<(), AppError> {
        let stored = self.working.owned.get_mut(&owned.id).ok_or_else(|| {
            AppError::internal("Updating unknown ownership record", json!({ "id": owned.id }))
        })?;
        stored.experience = owned.experience;
        stored.level = owned.level;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_user() -> (MemoryStore, i64) {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                username: "dora".to_string(),
                email: "dora@example.com".to_string(),
            })
            .await
            .unwrap();
        (store, user.id)
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let (store, user_id) = store_with_user().await;

        {
            let mut tx = store.begin().await.unwrap();
            let mut user = tx.lock_user(user_id).await.unwrap().unwrap();
            user.coins = 1;
            tx.save_user(&user).await.unwrap();
        }

        assert_eq!(store.find_user(user_id).await.unwrap().unwrap().coins, 1000);
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let (store, user_id) = store_with_user().await;

        let mut tx = store.begin().await.unwrap();
        let mut user = tx.lock_user(user_id).await.unwrap().unwrap();
        user.gems = 3;
        tx.save_user(&user).await.unwrap();
        tx.insert_owned_card(NewOwnedCard {
            user_id,
            card_id: 5,
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.find_user(user_id).await.unwrap().unwrap().gems, 3);
        assert_eq!(store.count_owned_cards(user_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_second_insert_of_same_pair_conflicts() {
        let (store, user_id) = store_with_user().await;

        let mut tx = store.begin().await.unwrap();
        let pair = NewOwnedCard {
            user_id,
            card_id: 5,
        };
        tx.insert_owned_card(pair).await.unwrap();
        let err = tx.insert_owned_card(pair).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_inactive_cards_are_hidden_from_pools() {
        let store = MemoryStore::new();
        let card = store
            .create(NewCard {
                name: "Golem".to_string(),
                description: None,
                attack: 4,
                defense: 6,
                cost: 3,
                rarity: Rarity::Epic,
                element: crate::domain::entities::Element::Earth,
                image_url: None,
            })
            .await
            .unwrap();

        assert_eq!(store.list_active_by_rarity(Rarity::Epic).await.unwrap().len(), 1);
        store.set_active(card.id, false).await.unwrap();
        assert!(store.list_active_by_rarity(Rarity::Epic).await.unwrap().is_empty());
        assert!(store.find_by_id(card.id).await.unwrap().is_some());
    }
}
