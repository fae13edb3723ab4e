//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod cards;
pub mod gacha;
pub mod health;
pub mod users;

pub use cards::{get_card_handler, list_cards_handler};
pub use gacha::{rates_handler, single_pull_handler, ten_pull_handler};
pub use health::health_handler;
pub use users::{get_user_handler, update_currency_handler, user_cards_handler};
