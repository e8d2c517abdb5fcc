//! Notification derivation from the audit trail.

mod deriver;

pub use deriver::{Notification, NotificationDeriver, MAX_NOTIFICATIONS};
