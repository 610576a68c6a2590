//! Request-to-contractor matching.
//!
//! One implementation serves both triggers: the explicit
//! `POST /api/requests/:id/match` endpoint and the best-effort auto-match that
//! runs after a request is created. Candidate filtering, the result cap, and
//! deduplication live in [`compute_matches`]; persistence sits behind the
//! [`MatchStore`] trait so tests can run against an in-memory store.

pub mod store;

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Request, RequestStatus};

pub use store::{Candidate, MatchStore, SqlMatchStore};

/// Upper bound on matches created by a single invocation
pub const MAX_MATCHES: usize = 5;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Request must be open to match contractors")]
    RequestNotOpen,

    #[error("{0}")]
    Database(String),
}

/// Result of a matching run, in the shape the HTTP endpoint returns
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MatchOutcome {
    pub matched: usize,
    pub message: String,
}

impl MatchOutcome {
    fn matched(count: usize) -> Self {
        let plural = if count == 1 { "" } else { "s" };
        Self {
            matched: count,
            message: format!("Matched {} contractor{}", count, plural),
        }
    }

    fn none_found() -> Self {
        Self {
            matched: 0,
            message: "No contractors found for this trade".to_string(),
        }
    }

    fn already_matched() -> Self {
        Self {
            matched: 0,
            message: "All found contractors already matched".to_string(),
        }
    }
}

/// Case-insensitive substring check: a request trade of "plumb" matches a
/// contractor trade of "Plumber".
pub fn trade_matches(candidate_trade: &str, request_trade: &str) -> bool {
    candidate_trade
        .to_lowercase()
        .contains(&request_trade.to_lowercase())
}

/// Select the contractors to match for a request.
///
/// Filters candidates to those with a trade (matching the request's trade as a
/// case-insensitive substring when one is set), orders by contractor id so the
/// pick is deterministic for a fixed candidate set, caps at [`MAX_MATCHES`],
/// then drops contractors that already have a match. The cap is applied before
/// the dedup step, so a request whose top candidates are all matched reports
/// zero new matches rather than reaching further down the pool.
pub fn compute_matches(
    request_trade: Option<&str>,
    candidates: &[Candidate],
    existing: &HashSet<Uuid>,
) -> Vec<Uuid> {
    let mut eligible: Vec<Uuid> = candidates
        .iter()
        .filter(|c| match (c.trade.as_deref(), request_trade) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(have), Some(want)) => trade_matches(have, want),
        })
        .map(|c| c.id)
        .collect();

    eligible.sort();
    eligible.dedup();
    eligible.truncate(MAX_MATCHES);
    eligible.retain(|id| !existing.contains(id));
    eligible
}

/// Runs the matching pipeline against a [`MatchStore`].
///
/// Callers are responsible for the ownership check (the explicit trigger loads
/// the request scoped to the caller); the open-status precondition is enforced
/// here so it cannot drift between the two triggers.
#[derive(Clone)]
pub struct MatchingService {
    store: Arc<dyn MatchStore>,
}

impl MatchingService {
    pub fn new(store: Arc<dyn MatchStore>) -> Self {
        Self { store }
    }

    /// Match contractors for an open request. All store calls are attempted
    /// once; there are no retries.
    pub async fn match_request(&self, request: &Request) -> Result<MatchOutcome, MatchError> {
        if request.status != RequestStatus::Open {
            return Err(MatchError::RequestNotOpen);
        }

        let candidates = self.store.find_candidates(request.trade.as_deref()).await?;
        if candidates.is_empty() {
            return Ok(MatchOutcome::none_found());
        }

        let existing = self.store.existing_contractor_ids(request.id).await?;
        let chosen = compute_matches(request.trade.as_deref(), &candidates, &existing);
        if chosen.is_empty() {
            return Ok(MatchOutcome::already_matched());
        }

        // The unique constraint on (request_id, contractor_id) makes a
        // concurrent run a no-op; count what this run actually inserted.
        let inserted = self.store.insert_pending(request.id, &chosen).await?;
        if inserted == 0 {
            return Ok(MatchOutcome::already_matched());
        }

        Ok(MatchOutcome::matched(inserted as usize))
    }

    /// Best-effort matching for the implicit trigger after request creation.
    /// Skips non-open requests silently; failures are logged and discarded so
    /// the creation response is never affected.
    pub async fn try_match(&self, request: &Request) {
        if request.status != RequestStatus::Open {
            return;
        }

        match self.match_request(request).await {
            Ok(outcome) => {
                tracing::debug!(
                    request_id = %request.id,
                    matched = outcome.matched,
                    "auto-match finished"
                );
            }
            Err(e) => {
                tracing::warn!(request_id = %request.id, error = %e, "auto-match failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    /// In-memory store mirroring the SQL store's query semantics
    struct FakeStore {
        candidates: Vec<Candidate>,
        matches: Mutex<HashSet<(Uuid, Uuid)>>,
        fail: bool,
    }

    impl FakeStore {
        fn new(candidates: Vec<Candidate>) -> Self {
            Self {
                candidates,
                matches: Mutex::new(HashSet::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                candidates: Vec::new(),
                matches: Mutex::new(HashSet::new()),
                fail: true,
            }
        }

        fn match_count(&self) -> usize {
            self.matches.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MatchStore for FakeStore {
        async fn find_candidates(&self, trade: Option<&str>) -> Result<Vec<Candidate>, MatchError> {
            if self.fail {
                return Err(MatchError::Database("connection refused".to_string()));
            }
            let mut found: Vec<Candidate> = self
                .candidates
                .iter()
                .filter(|c| match (c.trade.as_deref(), trade) {
                    (None, _) => false,
                    (Some(_), None) => true,
                    (Some(have), Some(want)) => trade_matches(have, want),
                })
                .cloned()
                .collect();
            found.sort_by_key(|c| c.id);
            found.truncate(MAX_MATCHES);
            Ok(found)
        }

        async fn existing_contractor_ids(
            &self,
            request_id: Uuid,
        ) -> Result<HashSet<Uuid>, MatchError> {
            Ok(self
                .matches
                .lock()
                .unwrap()
                .iter()
                .filter(|(r, _)| *r == request_id)
                .map(|(_, c)| *c)
                .collect())
        }

        async fn insert_pending(
            &self,
            request_id: Uuid,
            contractor_ids: &[Uuid],
        ) -> Result<u64, MatchError> {
            let mut matches = self.matches.lock().unwrap();
            let mut inserted = 0;
            for contractor_id in contractor_ids {
                if matches.insert((request_id, *contractor_id)) {
                    inserted += 1;
                }
            }
            Ok(inserted)
        }
    }

    fn candidate(trade: Option<&str>) -> Candidate {
        Candidate {
            id: Uuid::new_v4(),
            trade: trade.map(str::to_string),
        }
    }

    fn open_request(trade: Option<&str>) -> Request {
        Request {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            title: "Fix leaking tap".to_string(),
            description: None,
            trade: trade.map(str::to_string),
            postcode: None,
            budget_min: None,
            budget_max: None,
            timeline: None,
            status: RequestStatus::Open,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(store: FakeStore) -> (MatchingService, Arc<FakeStore>) {
        let store = Arc::new(store);
        (MatchingService::new(store.clone()), store)
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        assert!(trade_matches("Plumber", "plumb"));
        assert!(trade_matches("plumber", "Plumb"));
        assert!(!trade_matches("Electrician", "plumb"));
    }

    #[test]
    fn compute_matches_filters_caps_and_dedups() {
        let mut candidates: Vec<Candidate> = (0..8).map(|_| candidate(Some("Plumber"))).collect();
        candidates.push(candidate(Some("Electrician")));
        candidates.push(candidate(None));

        let chosen = compute_matches(Some("plumb"), &candidates, &HashSet::new());
        assert_eq!(chosen.len(), MAX_MATCHES);

        // Deterministic for a fixed candidate set: ascending contractor id
        let mut sorted = chosen.clone();
        sorted.sort();
        assert_eq!(chosen, sorted);

        // Electricians and trade-less profiles never make the cut
        let all_plumbers: HashSet<Uuid> = candidates
            .iter()
            .filter(|c| c.trade.as_deref() == Some("Plumber"))
            .map(|c| c.id)
            .collect();
        assert!(chosen.iter().all(|id| all_plumbers.contains(id)));
    }

    #[test]
    fn compute_matches_without_request_trade_takes_any_tradesperson() {
        let candidates = vec![
            candidate(Some("Plumber")),
            candidate(Some("Electrician")),
            candidate(None),
        ];
        let chosen = compute_matches(None, &candidates, &HashSet::new());
        assert_eq!(chosen.len(), 2);
    }

    #[test]
    fn compute_matches_skips_already_matched() {
        let candidates = vec![candidate(Some("Roofer")), candidate(Some("Roofer"))];
        let existing: HashSet<Uuid> = [candidates[0].id].into_iter().collect();
        let chosen = compute_matches(Some("roof"), &candidates, &existing);
        assert_eq!(chosen, vec![candidates[1].id]);
    }

    #[tokio::test]
    async fn matches_one_contractor() {
        // Scenario A: open request + one matching contractor
        let (svc, store) = service(FakeStore::new(vec![candidate(Some("Plumber"))]));
        let request = open_request(Some("plumber"));

        let outcome = svc.match_request(&request).await.unwrap();
        assert_eq!(outcome.matched, 1);
        assert_eq!(outcome.message, "Matched 1 contractor");
        assert_eq!(store.match_count(), 1);
    }

    #[tokio::test]
    async fn second_run_is_idempotent() {
        // Scenario B: invoking matching twice never duplicates a pair
        let (svc, store) = service(FakeStore::new(vec![candidate(Some("Plumber"))]));
        let request = open_request(Some("plumber"));

        svc.match_request(&request).await.unwrap();
        let outcome = svc.match_request(&request).await.unwrap();

        assert_eq!(outcome.matched, 0);
        assert_eq!(outcome.message, "All found contractors already matched");
        assert_eq!(store.match_count(), 1);
    }

    #[tokio::test]
    async fn non_open_request_is_rejected() {
        // Scenario C: draft request
        let (svc, store) = service(FakeStore::new(vec![candidate(Some("Plumber"))]));
        let mut request = open_request(Some("plumber"));
        request.status = RequestStatus::Draft;

        let err = svc.match_request(&request).await.unwrap_err();
        assert!(matches!(err, MatchError::RequestNotOpen));
        assert_eq!(store.match_count(), 0);
    }

    #[tokio::test]
    async fn no_candidates_is_not_an_error() {
        let (svc, store) = service(FakeStore::new(vec![candidate(Some("Electrician"))]));
        let request = open_request(Some("plumber"));

        let outcome = svc.match_request(&request).await.unwrap();
        assert_eq!(outcome.matched, 0);
        assert_eq!(outcome.message, "No contractors found for this trade");
        assert_eq!(store.match_count(), 0);
    }

    #[tokio::test]
    async fn pluralizes_matched_message() {
        let candidates = vec![candidate(Some("Plumber")), candidate(Some("Plumbing & Heating"))];
        let (svc, _) = service(FakeStore::new(candidates));
        let request = open_request(Some("plumb"));

        let outcome = svc.match_request(&request).await.unwrap();
        assert_eq!(outcome.matched, 2);
        assert_eq!(outcome.message, "Matched 2 contractors");
    }

    #[tokio::test]
    async fn single_run_never_exceeds_cap() {
        let candidates: Vec<Candidate> = (0..12).map(|_| candidate(Some("Plumber"))).collect();
        let (svc, store) = service(FakeStore::new(candidates));
        let request = open_request(Some("plumber"));

        let outcome = svc.match_request(&request).await.unwrap();
        assert_eq!(outcome.matched, MAX_MATCHES);
        assert_eq!(store.match_count(), MAX_MATCHES);
    }

    #[tokio::test]
    async fn try_match_swallows_store_failures() {
        let (svc, store) = service(FakeStore::failing());
        let request = open_request(Some("plumber"));

        // Must not panic or surface the error
        svc.try_match(&request).await;
        assert_eq!(store.match_count(), 0);
    }

    #[tokio::test]
    async fn try_match_skips_non_open_requests() {
        let (svc, store) = service(FakeStore::new(vec![candidate(Some("Plumber"))]));
        let mut request = open_request(Some("plumber"));
        request.status = RequestStatus::Draft;

        svc.try_match(&request).await;
        assert_eq!(store.match_count(), 0);
    }
}
