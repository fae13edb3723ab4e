//! Core domain entities representing the business data model.
//!
//! Entities are plain records; relationships are expressed through ids and
//! resolved by explicit repository queries rather than object graphs.
//!
//! # Entity Types
//!
//! - [`Card`] - A catalog card with its [`Rarity`] and [`Element`]
//! - [`User`] - A player account holding coin and gem balances
//! - [`OwnedCard`] - A `(user, card)` ownership record with duplicate experience
//!
//! # Design Pattern
//!
//! Separate input structs are used for creation (`NewCard`, `NewUser`,
//! `NewOwnedCard`); ids and timestamps are assigned by storage.

pub mod card;
pub mod owned_card;
pub mod user;

pub use card::{Card, Element, NewCard, Rarity, UnknownVariant};
pub use owned_card::{CollectionEntry, DUPLICATE_EXPERIENCE, NewOwnedCard, OwnedCard};
pub use user::{Currency, NewUser, STARTING_COINS, STARTING_GEMS, User};
