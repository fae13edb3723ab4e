//! Domain layer containing business entities and rules.
//!
//! # Architecture
//!
//! - [`entities`] - Cards, users and ownership records
//! - [`gacha`] - Pull pricing, drop tables and the pity rule
//! - [`random`] - Injectable random sources
//! - [`repositories`] - Catalog and ledger trait definitions
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by infrastructure layer
//! - Orchestration lives in services (see [`crate::application::services`])
//!
//! # Pull Flow
//!
//! 1. HTTP handler calls [`crate::application::services::GachaService`]
//! 2. The service opens a [`repositories::LedgerTransaction`] and locks the user
//! 3. Cost is debited, cards are drawn via [`gacha::DrawMode`] and the catalog
//! 4. Ownership records are upserted and the transaction commits

pub mod entities;
pub mod gacha;
pub mod random;
pub mod repositories;
