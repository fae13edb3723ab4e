//! Gacha pull engine.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::entities::{Card, Currency, NewOwnedCard, Rarity};
use crate::domain::gacha::{DrawMode, PullKind, PullResult, PullType, draw_mode_for_slot};
use crate::domain::random::RandomSource;
use crate::domain::repositories::{CardCatalog, LedgerTransaction, UserLedger};
use crate::error::AppError;

/// Executes single and ten-card pulls.
///
/// Every pull runs inside one ledger transaction: the user row is locked,
/// the cost is debited, cards are drawn and ownership is upserted. Any error
/// rolls the whole pull back, so a failed draw never leaves a debited balance.
pub struct GachaService<C: CardCatalog + ?Sized, L: UserLedger + ?Sized> {
    catalog: Arc<C>,
    ledger: Arc<L>,
    random: Arc<dyn RandomSource>,
}

impl<C: CardCatalog + ?Sized, L: UserLedger + ?Sized> GachaService<C, L> {
    /// Creates a new gacha service.
    pub fn new(catalog: Arc<C>, ledger: Arc<L>, random: Arc<dyn RandomSource>) -> Self {
        Self {
            catalog,
            ledger,
            random,
        }
    }

    /// Draws one card for 100 coins or 1 gem.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the user does not exist.
    /// Returns [`AppError::InsufficientFunds`] if the selected balance is too low.
    /// Returns [`AppError::InvalidConfiguration`] if no fallback pool has active cards.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn perform_single_pull(
        &self,
        user_id: i64,
        use_gems: bool,
    ) -> Result<PullResult, AppError> {
        let pull_type = PullType::new(PullKind::Single, Currency::from_use_gems(use_gems));
        self.perform_pull(user_id, pull_type).await
    }

    /// Draws ten cards for 900 coins or 9 gems, guaranteeing at least one
    /// RARE-or-better card.
    ///
    /// # Errors
    ///
    /// See [`Self::perform_single_pull`].
    pub async fn perform_ten_pull(
        &self,
        user_id: i64,
        use_gems: bool,
    ) -> Result<PullResult, AppError> {
        let pull_type = PullType::new(PullKind::Ten, Currency::from_use_gems(use_gems));
        self.perform_pull(user_id, pull_type).await
    }

    /// Runs a pull as one unit of work.
    ///
    /// # Errors
    ///
    /// See [`Self::perform_single_pull`].
    pub async fn perform_pull(
        &self,
        user_id: i64,
        pull_type: PullType,
    ) -> Result<PullResult, AppError> {
        let mut tx = self.ledger.begin().await?;

        let outcome = self.pull_within(tx.as_mut(), user_id, pull_type).await;

        let result = match outcome {
            Ok(result) => match tx.commit().await {
                Ok(()) => result,
                Err(err) => return Err(self.record_failure(user_id, pull_type, err)),
            },
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(user_id, error = %rollback_err, "Failed to roll back pull");
                }
                return Err(self.record_failure(user_id, pull_type, err));
            }
        };

        metrics::counter!("gacha_pulls_total", "pull_type" => pull_type.as_str()).increment(1);
        for card in &result.cards {
            metrics::counter!("gacha_cards_drawn_total", "rarity" => card.rarity.as_str())
                .increment(1);
        }

        info!(
            user_id,
            pull_type = pull_type.as_str(),
            cost = result.total_cost,
            rarities = ?result.cards.iter().map(|c| c.rarity).collect::<Vec<_>>(),
            "Pull completed"
        );

        Ok(result)
    }

    async fn pull_within(
        &self,
        tx: &mut dyn LedgerTransaction,
        user_id: i64,
        pull_type: PullType,
    ) -> Result<PullResult, AppError> {
        let mut user = tx
            .lock_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({ "user_id": user_id })))?;

        let cost = pull_type.cost();
        user.debit(pull_type.currency(), cost)?;

        let kind = pull_type.kind();
        let mut cards = Vec::with_capacity(kind.draws());
        let mut rare_seen = false;

        for index in 0..kind.draws() {
            let mode = draw_mode_for_slot(kind, index, rare_seen);
            if mode == DrawMode::GuaranteedRare {
                metrics::counter!("gacha_pity_triggered_total").increment(1);
                debug!(user_id, "Pity guarantee applied to last slot");
            }

            let card = self.draw(mode).await?;
            rare_seen |= card.rarity > Rarity::Common;

            self.upsert_owned_card(tx, user.id, card.id).await?;
            cards.push(card);
        }

        tx.save_user(&user).await?;

        Ok(PullResult {
            cards,
            total_cost: cost,
            pull_type,
            remaining_coins: user.coins,
            remaining_gems: user.gems,
        })
    }

    /// Draws one card with the given distribution.
    ///
    /// Falls back to the mode's fallback tier when the rolled tier has no
    /// active cards.
    async fn draw(&self, mode: DrawMode) -> Result<Card, AppError> {
        let roll = self.random.roll(mode.roll_sides());
        let rarity = mode.rarity_for(roll);

        let mut pool = self.catalog.list_active_by_rarity(rarity).await?;
        if pool.is_empty() && rarity != mode.fallback() {
            debug!(
                rolled = rarity.as_str(),
                fallback = mode.fallback().as_str(),
                "Rolled tier has no active cards, falling back"
            );
            pool = self.catalog.list_active_by_rarity(mode.fallback()).await?;
        }

        if pool.is_empty() {
            return Err(AppError::invalid_configuration(
                "No active cards available for draw",
                json!({ "rolled": rarity, "fallback": mode.fallback() }),
            ));
        }

        let index = self.random.pick(pool.len());
        let size = pool.len();
        pool.into_iter().nth(index).ok_or_else(|| {
            AppError::internal(
                "Random pick out of range",
                json!({ "index": index, "pool_size": size }),
            )
        })
    }

    /// Grants a drawn card: creates the ownership record on first draw,
    /// otherwise adds duplicate experience.
    async fn upsert_owned_card(
        &self,
        tx: &mut dyn LedgerTransaction,
        user_id: i64,
        card_id: i64,
    ) -> Result<(), AppError> {
        match tx.find_owned_card(user_id, card_id).await? {
            Some(mut owned) => {
                owned.absorb_duplicate();
                tx.update_owned_card(&owned).await
            }
            None => tx
                .insert_owned_card(NewOwnedCard { user_id, card_id })
                .await
                .map(|_| ()),
        }
    }

    fn record_failure(&self, user_id: i64, pull_type: PullType, err: AppError) -> AppError {
        metrics::counter!("gacha_pull_failures_total", "reason" => err.code()).increment(1);
        match &err {
            AppError::InsufficientFunds { .. } | AppError::NotFound { .. } => {
                debug!(user_id, pull_type = pull_type.as_str(), error = %err, "Pull rejected");
            }
            _ => {
                warn!(user_id, pull_type = pull_type.as_str(), error = %err, "Pull aborted");
            }
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Element, NewCard, NewUser};
    use crate::domain::random::ScriptedRandom;
    use crate::domain::repositories::MockCardCatalog;
    use crate::infrastructure::persistence::MemoryStore;
    use chrono::Utc;

    fn card(id: i64, rarity: Rarity) -> Card {
        Card {
            id,
            name: format!("{rarity} #{id}"),
            description: None,
            attack: 1,
            defense: 1,
            cost: 1,
            rarity,
            element: Element::Fire,
            image_url: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn new_card(name: &str, rarity: Rarity) -> NewCard {
        NewCard {
            name: name.to_string(),
            description: None,
            attack: 2,
            defense: 1,
            cost: 1,
            rarity,
            element: Element::Water,
            image_url: None,
        }
    }

    /// Store with one active card per tier and a user holding the given balances.
    async fn seeded_store(coins: i64, gems: i64) -> (Arc<MemoryStore>, i64) {
        let store = Arc::new(MemoryStore::new());
        for rarity in Rarity::ALL {
            store
                .create(new_card(&format!("{rarity} card"), rarity))
                .await
                .unwrap();
        }
        let user = store
            .create_user(NewUser {
                username: "tester".to_string(),
                email: "tester@example.com".to_string(),
            })
            .await
            .unwrap();
        store.set_balances(user.id, coins, gems).await.unwrap();
        (store, user.id)
    }

    fn service(
        store: &Arc<MemoryStore>,
        random: ScriptedRandom,
    ) -> GachaService<MemoryStore, MemoryStore> {
        GachaService::new(store.clone(), store.clone(), Arc::new(random))
    }

    #[tokio::test]
    async fn test_single_pull_debits_coins_only() {
        let (store, user_id) = seeded_store(250, 4).await;
        let gacha = service(&store, ScriptedRandom::new().with_rolls([50]));

        let result = gacha.perform_single_pull(user_id, false).await.unwrap();

        assert_eq!(result.cards.len(), 1);
        assert_eq!(result.total_cost, 100);
        assert_eq!(result.pull_type, PullType::SingleCoin);
        assert_eq!(result.remaining_coins, 150);
        assert_eq!(result.remaining_gems, 4);

        let user = store.find_user(user_id).await.unwrap().unwrap();
        assert_eq!(user.coins, 150);
        assert_eq!(user.gems, 4);
    }

    #[tokio::test]
    async fn test_single_pull_with_gems_debits_gems_only() {
        let (store, user_id) = seeded_store(250, 4).await;
        let gacha = service(&store, ScriptedRandom::new());

        let result = gacha.perform_single_pull(user_id, true).await.unwrap();

        assert_eq!(result.pull_type, PullType::SingleGem);
        assert_eq!(result.total_cost, 1);
        assert_eq!(result.remaining_coins, 250);
        assert_eq!(result.remaining_gems, 3);
    }

    #[tokio::test]
    async fn test_insufficient_coins_leaves_no_side_effects() {
        let (store, user_id) = seeded_store(50, 0).await;
        let gacha = service(&store, ScriptedRandom::new());

        let err = gacha.perform_single_pull(user_id, false).await.unwrap_err();

        assert!(matches!(err, AppError::InsufficientFunds { .. }));
        let user = store.find_user(user_id).await.unwrap().unwrap();
        assert_eq!(user.coins, 50);
        assert_eq!(user.gems, 0);
        assert_eq!(store.count_owned_cards(user_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_gems_for_ten_pull() {
        let (store, user_id) = seeded_store(10_000, 8).await;
        let gacha = service(&store, ScriptedRandom::new());

        let err = gacha.perform_ten_pull(user_id, true).await.unwrap_err();

        assert!(matches!(err, AppError::InsufficientFunds { .. }));
        let user = store.find_user(user_id).await.unwrap().unwrap();
        assert_eq!(user.gems, 8);
        assert_eq!(user.coins, 10_000);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let (store, _) = seeded_store(1000, 10).await;
        let gacha = service(&store, ScriptedRandom::new());

        let err = gacha.perform_single_pull(9_999, false).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_ten_pull_example_from_thousand_coins() {
        let (store, user_id) = seeded_store(1000, 0).await;
        let gacha = service(&store, ScriptedRandom::new());

        let result = gacha.perform_ten_pull(user_id, false).await.unwrap();

        assert_eq!(result.cards.len(), 10);
        assert_eq!(result.pull_type, PullType::TenCoin);
        assert_eq!(result.total_cost, 900);
        assert_eq!(result.remaining_coins, 100);
        assert_eq!(store.find_user(user_id).await.unwrap().unwrap().coins, 100);
    }

    #[tokio::test]
    async fn test_pity_forces_rare_after_nine_commons() {
        let (store, user_id) = seeded_store(1000, 0).await;
        // Nine COMMON rolls, then a guaranteed-slot roll of 30 (RARE).
        let rolls = std::iter::repeat_n(100, 9).chain([30]);
        let gacha = service(&store, ScriptedRandom::new().with_rolls(rolls));

        let result = gacha.perform_ten_pull(user_id, false).await.unwrap();

        assert!(result.cards[..9].iter().all(|c| c.rarity == Rarity::Common));
        assert_eq!(result.cards[9].rarity, Rarity::Rare);
    }

    #[tokio::test]
    async fn test_pity_slot_uses_guaranteed_table() {
        let (store, user_id) = seeded_store(1000, 0).await;
        // A roll of 1 on the guaranteed table is LEGENDARY.
        let rolls = std::iter::repeat_n(100, 9).chain([1]);
        let gacha = service(&store, ScriptedRandom::new().with_rolls(rolls));

        let result = gacha.perform_ten_pull(user_id, false).await.unwrap();
        assert_eq!(result.cards[9].rarity, Rarity::Legendary);
    }

    #[tokio::test]
    async fn test_no_pity_when_earlier_draw_is_rare() {
        let (store, user_id) = seeded_store(1000, 0).await;
        // Slot 3 rolls RARE; the last slot rolls 100, which must stay COMMON.
        let rolls = [100, 100, 10, 100, 100, 100, 100, 100, 100, 100];
        let gacha = service(&store, ScriptedRandom::new().with_rolls(rolls));

        let result = gacha.perform_ten_pull(user_id, false).await.unwrap();

        assert_eq!(result.cards[2].rarity, Rarity::Rare);
        assert_eq!(result.cards[9].rarity, Rarity::Common);
    }

    #[tokio::test]
    async fn test_duplicate_draw_increments_experience() {
        let (store, user_id) = seeded_store(1000, 0).await;
        let gacha = service(&store, ScriptedRandom::new().with_rolls([100, 100]));

        let first = gacha.perform_single_pull(user_id, false).await.unwrap();
        let second = gacha.perform_single_pull(user_id, false).await.unwrap();
        assert_eq!(first.cards[0].id, second.cards[0].id);

        assert_eq!(store.count_owned_cards(user_id).await.unwrap(), 1);
        let collection = store.list_collection(user_id, 0, 10).await.unwrap();
        assert_eq!(collection[0].owned.experience, 10);
    }

    #[tokio::test]
    async fn test_duplicates_within_one_ten_pull_share_a_row() {
        let (store, user_id) = seeded_store(1000, 0).await;
        // Every standard slot is COMMON; pity slot is RARE.
        let rolls = std::iter::repeat_n(100, 9).chain([30]);
        let gacha = service(&store, ScriptedRandom::new().with_rolls(rolls));

        gacha.perform_ten_pull(user_id, false).await.unwrap();

        assert_eq!(store.count_owned_cards(user_id).await.unwrap(), 2);
        let collection = store.list_collection(user_id, 0, 10).await.unwrap();
        let common = collection
            .iter()
            .find(|e| e.card.rarity == Rarity::Common)
            .unwrap();
        assert_eq!(common.owned.experience, 80);
    }

    #[tokio::test]
    async fn test_empty_legendary_pool_falls_back_to_common() {
        let mut catalog = MockCardCatalog::new();
        catalog
            .expect_list_active_by_rarity()
            .withf(|r| *r == Rarity::Legendary)
            .times(1)
            .returning(|_| Ok(vec![]));
        catalog
            .expect_list_active_by_rarity()
            .withf(|r| *r == Rarity::Common)
            .times(1)
            .returning(|_| Ok(vec![card(7, Rarity::Common)]));

        let (store, user_id) = seeded_store(100, 0).await;
        let gacha = GachaService::new(
            Arc::new(catalog),
            store.clone(),
            Arc::new(ScriptedRandom::new().with_rolls([1])),
        );

        let result = gacha.perform_single_pull(user_id, false).await.unwrap();
        assert_eq!(result.cards[0].id, 7);
        assert_eq!(result.cards[0].rarity, Rarity::Common);
    }

    #[tokio::test]
    async fn test_empty_guaranteed_pool_falls_back_to_rare() {
        let mut catalog = MockCardCatalog::new();
        catalog
            .expect_list_active_by_rarity()
            .withf(|r| *r == Rarity::Common)
            .returning(|_| Ok(vec![card(1, Rarity::Common)]));
        catalog
            .expect_list_active_by_rarity()
            .withf(|r| *r == Rarity::Epic)
            .times(1)
            .returning(|_| Ok(vec![]));
        catalog
            .expect_list_active_by_rarity()
            .withf(|r| *r == Rarity::Rare)
            .times(1)
            .returning(|_| Ok(vec![card(2, Rarity::Rare)]));

        let (store, user_id) = seeded_store(900, 0).await;
        let rolls = std::iter::repeat_n(100, 9).chain([3]);
        let gacha = GachaService::new(
            Arc::new(catalog),
            store.clone(),
            Arc::new(ScriptedRandom::new().with_rolls(rolls)),
        );

        let result = gacha.perform_ten_pull(user_id, false).await.unwrap();
        assert_eq!(result.cards[9].id, 2);
    }

    #[tokio::test]
    async fn test_epic_roll_that_fell_back_to_common_keeps_pity() {
        let mut catalog = MockCardCatalog::new();
        catalog
            .expect_list_active_by_rarity()
            .withf(|r| *r == Rarity::Common)
            .returning(|_| Ok(vec![card(1, Rarity::Common)]));
        catalog
            .expect_list_active_by_rarity()
            .withf(|r| *r == Rarity::Epic)
            .times(1)
            .returning(|_| Ok(vec![]));
        catalog
            .expect_list_active_by_rarity()
            .withf(|r| *r == Rarity::Rare)
            .times(1)
            .returning(|_| Ok(vec![card(2, Rarity::Rare)]));

        // Slot 4 rolls EPIC; slot 10 has no scripted roll, which yields RARE
        // on the guaranteed table and COMMON on the standard one.
        let (store, user_id) = seeded_store(900, 0).await;
        let rolls = [100, 100, 100, 5, 100, 100, 100, 100, 100];
        let gacha = GachaService::new(
            Arc::new(catalog),
            store.clone(),
            Arc::new(ScriptedRandom::new().with_rolls(rolls)),
        );

        let result = gacha.perform_ten_pull(user_id, false).await.unwrap();

        assert_eq!(result.cards[3].rarity, Rarity::Common);
        assert!(result.cards[9].rarity >= Rarity::Rare);
        assert_eq!(result.cards[9].id, 2);
    }

    #[tokio::test]
    async fn test_seeded_single_pulls_follow_drop_rates() {
        use crate::domain::random::SeededRandom;
        use std::collections::HashMap;

        const PULLS: usize = 4000;
        let (store, user_id) = seeded_store(100 * PULLS as i64, 0).await;
        let gacha = GachaService::new(
            store.clone(),
            store.clone(),
            Arc::new(SeededRandom::new(7)),
        );

        let mut counts: HashMap<Rarity, usize> = HashMap::new();
        for _ in 0..PULLS {
            let result = gacha.perform_single_pull(user_id, false).await.unwrap();
            *counts.entry(result.cards[0].rarity).or_default() += 1;
        }

        let share =
            |rarity: Rarity| counts.get(&rarity).copied().unwrap_or(0) as f64 / PULLS as f64;
        assert!((0.65..0.75).contains(&share(Rarity::Common)));
        assert!((0.20..0.30).contains(&share(Rarity::Rare)));
        assert!((0.02..0.06).contains(&share(Rarity::Epic)));
        assert!((0.002..0.02).contains(&share(Rarity::Legendary)));
        assert_eq!(store.find_user(user_id).await.unwrap().unwrap().coins, 0);
    }

    #[tokio::test]
    async fn test_every_seeded_ten_pull_holds_a_rare() {
        use crate::domain::random::SeededRandom;

        let (store, user_id) = seeded_store(0, 9 * 200).await;
        let gacha = GachaService::new(
            store.clone(),
            store.clone(),
            Arc::new(SeededRandom::new(42)),
        );

        for _ in 0..200 {
            let result = gacha.perform_ten_pull(user_id, true).await.unwrap();
            assert!(result.cards.iter().any(|c| c.rarity >= Rarity::Rare));
        }
    }

    #[tokio::test]
    async fn test_empty_fallback_pool_rolls_back_debit() {
        let mut catalog = MockCardCatalog::new();
        catalog
            .expect_list_active_by_rarity()
            .returning(|_| Ok(vec![]));

        let (store, user_id) = seeded_store(500, 0).await;
        let gacha = GachaService::new(
            Arc::new(catalog),
            store.clone(),
            Arc::new(ScriptedRandom::new().with_rolls([1])),
        );

        let err = gacha.perform_single_pull(user_id, false).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidConfiguration { .. }));
        assert_eq!(store.find_user(user_id).await.unwrap().unwrap().coins, 500);
        assert_eq!(store.count_owned_cards(user_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_catalog_failure_mid_ten_pull_rolls_back_everything() {
        let mut catalog = MockCardCatalog::new();
        let mut calls = 0;
        catalog
            .expect_list_active_by_rarity()
            .returning(move |_| {
                calls += 1;
                if calls > 4 {
                    Err(AppError::internal("Database error", json!({})))
                } else {
                    Ok(vec![card(1, Rarity::Common)])
                }
            });

        let (store, user_id) = seeded_store(1000, 0).await;
        let gacha = GachaService::new(
            Arc::new(catalog),
            store.clone(),
            Arc::new(ScriptedRandom::new()),
        );

        let err = gacha.perform_ten_pull(user_id, false).await.unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
        assert_eq!(store.find_user(user_id).await.unwrap().unwrap().coins, 1000);
        assert_eq!(store.count_owned_cards(user_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_pulls_cannot_overspend() {
        let (store, user_id) = seeded_store(150, 0).await;
        let gacha = Arc::new(service(&store, ScriptedRandom::new()));

        let a = tokio::spawn({
            let gacha = gacha.clone();
            async move { gacha.perform_single_pull(user_id, false).await }
        });
        let b = tokio::spawn({
            let gacha = gacha.clone();
            async move { gacha.perform_single_pull(user_id, false).await }
        });

        let results = [a.await.unwrap(), b.await.unwrap()];
        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::InsufficientFunds { .. })))
            .count();

        assert_eq!(succeeded, 1);
        assert_eq!(rejected, 1);
        assert_eq!(store.find_user(user_id).await.unwrap().unwrap().coins, 50);
    }
}
