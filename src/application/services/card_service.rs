//! Card catalog browsing and maintenance.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use validator::Validate;

use crate::domain::entities::{Card, Element, NewCard, Rarity};
use crate::domain::repositories::CardCatalog;
use crate::error::AppError;

/// Sizes of the pools the draw falls back to.
///
/// A draw can only fail for configuration reasons when one of these is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProvisioningReport {
    pub active_common: usize,
    pub active_rare: usize,
}

impl ProvisioningReport {
    /// Returns true when both fallback pools contain at least one active card.
    pub fn is_ready(&self) -> bool {
        self.active_common > 0 && self.active_rare > 0
    }
}

/// Service for reading and maintaining the card catalog.
pub struct CardService<C: CardCatalog + ?Sized> {
    catalog: Arc<C>,
}

impl<C: CardCatalog + ?Sized> CardService<C> {
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }

    /// Lists active cards ordered by name, optionally restricted to one
    /// rarity and/or one element.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn list_active(
        &self,
        rarity: Option<Rarity>,
        element: Option<Element>,
    ) -> Result<Vec<Card>, AppError> {
        let mut cards = match rarity {
            Some(rarity) => {
                let mut cards = self.catalog.list_active_by_rarity(rarity).await?;
                cards.sort_by(|a, b| a.name.cmp(&b.name));
                cards
            }
            None => self.catalog.list_active().await?,
        };
        if let Some(element) = element {
            cards.retain(|card| card.element == element);
        }
        Ok(cards)
    }

    /// Retrieves an active card by id.
    ///
    /// Deactivated cards are retired from the public catalog and read as missing.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the card does not exist or is inactive.
    pub async fn get_card(&self, id: i64) -> Result<Card, AppError> {
        self.catalog
            .find_by_id(id)
            .await?
            .filter(|card| card.is_active)
            .ok_or_else(|| AppError::not_found("Card not found", json!({ "card_id": id })))
    }

    /// Retrieves a card by id whether or not it is active.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the card does not exist.
    pub async fn find_card(&self, id: i64) -> Result<Card, AppError> {
        self.catalog
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Card not found", json!({ "card_id": id })))
    }

    /// Adds a card to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if stats or name are out of range.
    pub async fn create_card(&self, new_card: NewCard) -> Result<Card, AppError> {
        new_card.validate()?;
        let card = self.catalog.create(new_card).await?;
        tracing::info!(card_id = card.id, rarity = card.rarity.as_str(), "Card created");
        Ok(card)
    }

    /// Enables or disables a card for draws.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the card does not exist.
    pub async fn set_active(&self, id: i64, active: bool) -> Result<Card, AppError> {
        let card = self
            .catalog
            .set_active(id, active)
            .await?
            .ok_or_else(|| AppError::not_found("Card not found", json!({ "card_id": id })))?;
        tracing::info!(card_id = id, active, "Card availability changed");
        Ok(card)
    }

    /// Counts the active cards in the COMMON and RARE fallback pools.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn check_provisioning(&self) -> Result<ProvisioningReport, AppError> {
        let common = self.catalog.list_active_by_rarity(Rarity::Common).await?;
        let rare = self.catalog.list_active_by_rarity(Rarity::Rare).await?;
        Ok(ProvisioningReport {
            active_common: common.len(),
            active_rare: rare.len(),
        })
    }
}
