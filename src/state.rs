//! Shared application state injected into every handler.

use sqlx::PgPool;
use std::sync::Arc;

use crate::application::services::{CardService, GachaService, UserService};
use crate::domain::random::RandomSource;
use crate::domain::repositories::{CardCatalog, UserLedger};
use crate::infrastructure::cache::CacheService;

/// Services and backends shared across requests.
///
/// Cloning is cheap: every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub gacha_service: Arc<GachaService<dyn CardCatalog, dyn UserLedger>>,
    pub card_service: Arc<CardService<dyn CardCatalog>>,
    pub user_service: Arc<UserService<dyn UserLedger>>,
    pub cache: Arc<dyn CacheService>,
    /// `None` when running on the in-memory store.
    pub db: Option<Arc<PgPool>>,
}

impl AppState {
    /// Wires the services over one catalog, one ledger and one random source.
    pub fn new(
        catalog: Arc<dyn CardCatalog>,
        ledger: Arc<dyn UserLedger>,
        random: Arc<dyn RandomSource>,
        cache: Arc<dyn CacheService>,
    ) -> Self {
        Self {
            gacha_service: Arc::new(GachaService::new(catalog.clone(), ledger.clone(), random)),
            card_service: Arc::new(CardService::new(catalog)),
            user_service: Arc::new(UserService::new(ledger)),
            cache,
            db: None,
        }
    }

    /// Attaches the database pool checked by `/health`.
    pub fn with_db(mut self, pool: Arc<PgPool>) -> Self {
        self.db = Some(pool);
        self
    }
}
