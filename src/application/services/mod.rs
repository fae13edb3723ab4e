//! Business logic services for the application layer.

pub mod card_service;
pub mod gacha_service;
pub mod user_service;

pub use card_service::{CardService, ProvisioningReport};
pub use gacha_service::GachaService;
pub use user_service::{CollectionPage, UserService};
