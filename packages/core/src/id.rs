//! Unique Id Generation
//!
//! Every node created by a clone operation gets a fresh id from an
//! [`IdGenerator`]. Production uses UUIDv4; tests substitute deterministic
//! generators to observe creation order.

use uuid::Uuid;

/// Produces identifiers unique across the deployment's lifetime.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// UUIDv4-backed generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
