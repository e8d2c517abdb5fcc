//! PostgreSQL store implementations.

mod store;

pub use store::PgStore;
