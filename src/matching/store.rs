use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::ServiceRole;
use crate::matching::{MatchError, MAX_MATCHES};
use crate::models::MatchStatus;

/// A contractor profile row as seen by candidate search
#[derive(Debug, Clone, FromRow)]
pub struct Candidate {
    pub id: Uuid,
    pub trade: Option<String>,
}

/// Data access used by the matching pipeline. Implemented against the
/// service-role pool in production and an in-memory fake in tests.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Contractors with a non-null trade, filtered by the request trade as a
    /// case-insensitive substring when given, ordered by id, capped at
    /// [`MAX_MATCHES`].
    async fn find_candidates(&self, trade: Option<&str>) -> Result<Vec<Candidate>, MatchError>;

    /// Contractor ids already matched to the request
    async fn existing_contractor_ids(&self, request_id: Uuid)
        -> Result<HashSet<Uuid>, MatchError>;

    /// Insert pending matches; conflicts on (request_id, contractor_id) are
    /// skipped. Returns the number of rows actually inserted.
    async fn insert_pending(
        &self,
        request_id: Uuid,
        contractor_ids: &[Uuid],
    ) -> Result<u64, MatchError>;
}

/// [`MatchStore`] backed by the service-role Postgres pool. Candidate search
/// must read other users' profile rows, so the caller-scoped pool cannot be
/// used here.
pub struct SqlMatchStore {
    service: ServiceRole,
}

impl SqlMatchStore {
    pub fn new(service: ServiceRole) -> Self {
        Self { service }
    }
}

fn db_err(e: sqlx::Error) -> MatchError {
    MatchError::Database(e.to_string())
}

/// Escape LIKE/ILIKE metacharacters so a trade like "50%_off" matches
/// literally, the same way the in-memory substring filter treats it.
fn escape_like(trade: &str) -> String {
    trade
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl MatchStore for SqlMatchStore {
    async fn find_candidates(&self, trade: Option<&str>) -> Result<Vec<Candidate>, MatchError> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT id, trade FROM profiles WHERE role = 'contractor' AND trade IS NOT NULL",
        );
        if let Some(trade) = trade {
            query.push(" AND trade ILIKE ");
            query.push_bind(format!("%{}%", escape_like(trade)));
        }
        query.push(" ORDER BY id LIMIT ");
        query.push_bind(MAX_MATCHES as i64);

        query
            .build_query_as::<Candidate>()
            .fetch_all(self.service.pool())
            .await
            .map_err(db_err)
    }

    async fn existing_contractor_ids(
        &self,
        request_id: Uuid,
    ) -> Result<HashSet<Uuid>, MatchError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT contractor_id FROM request_matches WHERE request_id = $1",
        )
        .bind(request_id)
        .fetch_all(self.service.pool())
        .await
        .map_err(db_err)?;

        Ok(ids.into_iter().collect())
    }

    async fn insert_pending(
        &self,
        request_id: Uuid,
        contractor_ids: &[Uuid],
    ) -> Result<u64, MatchError> {
        if contractor_ids.is_empty() {
            return Ok(0);
        }

        let mut query = QueryBuilder::<Postgres>::new(
            "INSERT INTO request_matches (request_id, contractor_id, status) ",
        );
        query.push_values(contractor_ids.iter().copied(), |mut row, contractor_id| {
            row.push_bind(request_id)
                .push_bind(contractor_id)
                .push_bind(MatchStatus::Pending);
        });
        query.push(" ON CONFLICT (request_id, contractor_id) DO NOTHING");

        let result = query
            .build()
            .execute(self.service.pool())
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_passes_plain_trades_through() {
        assert_eq!(escape_like("plumber"), "plumber");
        assert_eq!(escape_like("Gas Engineer"), "Gas Engineer");
    }

    #[test]
    fn test_escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("50% off"), "50\\% off");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like(r"back\slash"), r"back\\slash");
    }
}
