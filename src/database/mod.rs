pub mod manager;

pub use manager::{DatabaseError, DatabaseManager};

use sqlx::PgPool;

/// Capability handle for data access that bypasses per-caller row scoping.
///
/// Candidate search in the matching workflow must read contractor profiles that
/// belong to other users, which the caller-scoped pool cannot see. The handle
/// is constructed once at startup and threaded explicitly through application
/// state, never read from ambient globals.
#[derive(Clone, Debug)]
pub struct ServiceRole(PgPool);

impl ServiceRole {
    pub fn new(pool: PgPool) -> Self {
        Self(pool)
    }

    pub fn pool(&self) -> &PgPool {
        &self.0
    }
}
