//! Storage implementations of the domain repository traits.
//!
//! # Repositories
//!
//! - [`PgCardCatalog`] - Catalog cards in PostgreSQL
//! - [`PgUserLedger`] - Users and owned cards in PostgreSQL, with row-locking transactions
//! - [`MemoryStore`] - Both traits in process memory, for tests and local runs

pub mod memory_store;
pub mod pg_card_catalog;
pub mod pg_user_ledger;

pub use memory_store::MemoryStore;
pub use pg_card_catalog::PgCardCatalog;
pub use pg_user_ledger::{PgLedgerTransaction, PgUserLedger};
