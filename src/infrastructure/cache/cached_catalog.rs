//! Read-through cache in front of a [`CardCatalog`].

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::service::CacheService;
use crate::domain::entities::{Card, NewCard, Rarity};
use crate::domain::repositories::CardCatalog;
use crate::error::AppError;

const ALL_ACTIVE_KEY: &str = "catalog:active:ALL";

fn pool_key(rarity: Rarity) -> String {
    format!("catalog:active:{}", rarity.as_str())
}

/// Caches the active pools as JSON; writes go straight through and clear them.
///
/// Pools change only through catalog maintenance, while every draw reads one.
pub struct CachedCardCatalog<C: CardCatalog + ?Sized> {
    inner: Arc<C>,
    cache: Arc<dyn CacheService>,
    ttl_seconds: u64,
}

impl<C: CardCatalog + ?Sized> CachedCardCatalog<C> {
    pub fn new(inner: Arc<C>, cache: Arc<dyn CacheService>, ttl_seconds: u64) -> Self {
        Self {
            inner,
            cache,
            ttl_seconds,
        }
    }

    async fn cached(&self, key: &str) -> Option<Vec<Card>> {
        let raw = self.cache.get(key).await.ok().flatten()?;
        match serde_json::from_str(&raw) {
            Ok(cards) => Some(cards),
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    async fn store(&self, key: &str, cards: &[Card]) {
        match serde_json::to_string(cards) {
            Ok(raw) => {
                let _ = self.cache.set(key, &raw, Some(self.ttl_seconds)).await;
            }
            Err(e) => warn!(key, error = %e, "Failed to encode catalog for cache"),
        }
    }

    async fn invalidate_pools(&self) {
        let _ = self.cache.invalidate(ALL_ACTIVE_KEY).await;
        for rarity in Rarity::ALL {
            let _ = self.cache.invalidate(&pool_key(rarity)).await;
        }
        debug!("Catalog cache invalidated");
    }
}

#[async_trait]
impl<C: CardCatalog + ?Sized> CardCatalog for CachedCardCatalog<C> {
    async fn list_active_by_rarity(&self, rarity: Rarity) -> Result<Vec<Card>, AppError> {
        let key = pool_key(rarity);
        if let Some(cards) = self.cached(&key).await {
            return Ok(cards);
        }

        let cards = self.inner.list_active_by_rarity(rarity).await?;
        self.store(&key, &cards).await;
        Ok(cards)
    }

    async fn list_active(&self) -> Result<Vec<Card>, AppError> {
        if let Some(cards) = self.cached(ALL_ACTIVE_KEY).await {
            return Ok(cards);
        }

        let cards = self.inner.list_active().await?;
        self.store(ALL_ACTIVE_KEY, &cards).await;
        Ok(cards)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Card>, AppError> {
        self.inner.find_by_id(id).await
    }

    async fn create(&self, new_card: NewCard) -> Result<Card, AppError> {
        let card = self.inner.create(new_card).await?;
        self.invalidate_pools().await;
        Ok(card)
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<Option<Card>, AppError> {
        let card = self.inner.set_active(id, active).await?;
        if card.is_some() {
            self.invalidate_pools().await;
        }
        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Element;
    use crate::domain::repositories::MockCardCatalog;
    use crate::infrastructure::cache::{CacheResult, NullCache};
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapCache(Mutex<HashMap<String, String>>);

    #[async_trait]
    impl CacheService for MapCache {
        async fn get(&self, key: &str) -> CacheResult<Option<String>> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str, _ttl: Option<u64>) -> CacheResult<()> {
            self.0
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn invalidate(&self, key: &str) -> CacheResult<()> {
            self.0.lock().unwrap().remove(key);
            Ok(())
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn epic_card() -> Card {
        Card {
            id: 7,
            name: "Phoenix".to_string(),
            description: Some("Reborn in flame".to_string()),
            attack: 9,
            defense: 4,
            cost: 6,
            rarity: Rarity::Epic,
            element: Element::Fire,
            image_url: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_second_pool_read_is_served_from_cache() {
        let mut inner = MockCardCatalog::new();
        inner
            .expect_list_active_by_rarity()
            .times(1)
            .returning(|_| Ok(vec![epic_card()]));

        let catalog = CachedCardCatalog::new(Arc::new(inner), Arc::new(MapCache::default()), 60);

        let first = catalog.list_active_by_rarity(Rarity::Epic).await.unwrap();
        let second = catalog.list_active_by_rarity(Rarity::Epic).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second[0].name, "Phoenix");
    }

    #[tokio::test]
    async fn test_toggle_invalidates_pools() {
        let mut inner = MockCardCatalog::new();
        inner
            .expect_list_active_by_rarity()
            .times(2)
            .returning(|_| Ok(vec![epic_card()]));
        inner.expect_set_active().times(1).returning(|_, active| {
            Ok(Some(Card {
                is_active: active,
                ..epic_card()
            }))
        });

        let catalog = CachedCardCatalog::new(Arc::new(inner), Arc::new(MapCache::default()), 60);

        catalog.list_active_by_rarity(Rarity::Epic).await.unwrap();
        catalog.set_active(7, false).await.unwrap();
        catalog.list_active_by_rarity(Rarity::Epic).await.unwrap();
    }

    #[tokio::test]
    async fn test_retired_card_leaves_cached_draw_pool() {
        use crate::application::services::{CardService, GachaService};
        use crate::domain::entities::{NewCard, NewUser};
        use crate::domain::random::ScriptedRandom;
        use crate::domain::repositories::UserLedger;
        use crate::infrastructure::persistence::MemoryStore;

        let store = Arc::new(MemoryStore::new());
        for (name, rarity) in [
            ("Retiring slime", Rarity::Common),
            ("Fresh slime", Rarity::Common),
            ("Knight", Rarity::Rare),
        ] {
            store
                .create(NewCard {
                    name: name.to_string(),
                    description: None,
                    attack: 1,
                    defense: 1,
                    cost: 1,
                    rarity,
                    element: Element::Earth,
                    image_url: None,
                })
                .await
                .unwrap();
        }
        let user = store
            .create_user(NewUser {
                username: "collector".to_string(),
                email: "collector@example.com".to_string(),
            })
            .await
            .unwrap();

        let catalog = Arc::new(CachedCardCatalog::new(
            store.clone(),
            Arc::new(MapCache::default()) as Arc<dyn CacheService>,
            300,
        ));
        let gacha = GachaService::new(
            catalog.clone(),
            store.clone(),
            Arc::new(ScriptedRandom::new()),
        );
        let cards = CardService::new(catalog);

        let first = gacha.perform_single_pull(user.id, false).await.unwrap();
        assert_eq!(first.cards[0].name, "Retiring slime");

        cards.set_active(first.cards[0].id, false).await.unwrap();

        let second = gacha.perform_single_pull(user.id, false).await.unwrap();
        assert_eq!(second.cards[0].name, "Fresh slime");
        assert_eq!(cards.check_provisioning().await.unwrap().active_common, 1);
    }

    #[tokio::test]
    async fn test_null_cache_always_reaches_inner_catalog() {
        let mut inner = MockCardCatalog::new();
        inner
            .expect_list_active()
            .times(2)
            .returning(|| Ok(vec![epic_card()]));

        let catalog = CachedCardCatalog::new(Arc::new(inner), Arc::new(NullCache::new()), 60);

        catalog.list_active().await.unwrap();
        catalog.list_active().await.unwrap();
    }
}
