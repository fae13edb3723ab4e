//! Application layer services implementing business logic.
//!
//! Services consume the catalog and ledger traits and provide a clean API for
//! HTTP handlers and the admin tool.
//!
//! # Available Services
//!
//! - [`services::gacha_service::GachaService`] - Single and ten-card pulls
//! - [`services::card_service::CardService`] - Catalog browsing and maintenance
//! - [`services::user_service::UserService`] - Profiles, balances and collections

pub mod services;
