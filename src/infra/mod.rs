//! Infrastructure layer: errors, storage seams, and store implementations.

mod error;
mod memory;
pub mod postgres;
mod traits;

pub use error::{Result, WorkflowError};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use traits::{ApplicationStore, AuditLog, WatermarkStore};

#[cfg(test)]
pub use traits::{MockApplicationStore, MockAuditLog, MockWatermarkStore};
