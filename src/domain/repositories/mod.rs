//! Repository trait definitions for the domain layer.
//!
//! These traits abstract the two collaborators of the gacha engine: the card
//! catalog and the user ledger. Concrete implementations live in
//! `crate::infrastructure::persistence`.
//!
//! # Available Repositories
//!
//! - [`CardCatalog`] - Active cards by rarity and catalog maintenance
//! - [`UserLedger`] - User balances and ownership, written through [`LedgerTransaction`]
//!
//! # Testing
//!
//! `CardCatalog` gets a `mockall` mock under `cfg(test)`. The ledger is
//! exercised through `MemoryStore`, which honours the same transaction
//! semantics as the PostgreSQL implementation.

pub mod card_catalog;
pub mod user_ledger;

pub use card_catalog::CardCatalog;
pub use user_ledger::{LedgerTransaction, UserLedger};

#[cfg(test)]
pub use card_catalog::MockCardCatalog;
