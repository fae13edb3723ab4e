#![allow(dead_code)]

use std::sync::Arc;

use gacha_backend::domain::entities::{Element, NewCard, NewUser, Rarity};
use gacha_backend::domain::random::{RandomSource, ScriptedRandom};
use gacha_backend::domain::repositories::{CardCatalog, UserLedger};
use gacha_backend::infrastructure::cache::NullCache;
use gacha_backend::infrastructure::persistence::MemoryStore;
use gacha_backend::state::AppState;

pub fn new_card(name: &str, rarity: Rarity) -> NewCard {
    NewCard {
        name: name.to_string(),
        description: None,
        attack: 5,
        defense: 3,
        cost: 2,
        rarity,
        element: Element::Water,
        image_url: None,
    }
}

/// One active card per rarity, named after it ("COMMON card", ...).
pub async fn stock_catalog(store: &MemoryStore) {
    for rarity in Rarity::ALL {
        store
            .create(new_card(&format!("{rarity} card"), rarity))
            .await
            .unwrap();
    }
}

pub async fn create_test_user(store: &MemoryStore, username: &str) -> i64 {
    store
        .create_user(NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
        })
        .await
        .unwrap()
        .id
}

pub fn create_test_state(store: Arc<MemoryStore>, random: impl RandomSource + 'static) -> AppState {
    AppState::new(
        store.clone(),
        store,
        Arc::new(random),
        Arc::new(NullCache::new()),
    )
}

/// Stocked catalog, one user, and a random source that always rolls the top
/// of the range (COMMON on the standard table, RARE on the guaranteed one).
pub async fn stocked_state() -> (AppState, Arc<MemoryStore>, i64) {
    let store = Arc::new(MemoryStore::new());
    stock_catalog(&store).await;
    let user_id = create_test_user(&store, "player").await;
    let state = create_test_state(store.clone(), ScriptedRandom::new());
    (state, store, user_id)
}
