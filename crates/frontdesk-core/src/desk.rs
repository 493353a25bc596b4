use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{HelpRequest, KnowledgeEntry, RequestStatus};
use crate::store::{Store, StoreError};

pub const ESCALATION_RESPONSE: &str = "Let me check with my supervisor and get back to you.";
pub const DEFAULT_TIMEOUT_MINUTES: u64 = 60;

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("{0}")]
    Validation(String),
    #[error("help request {0} not found")]
    NotFound(u64),
    #[error("help request {id} is already {status}")]
    NotPending { id: u64, status: RequestStatus },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    /// The question matched a knowledge entry.
    Answered(String),
    /// No match; a pending help request was opened.
    Escalated { id: u64, response: String },
}

impl AskOutcome {
    pub fn response(&self) -> &str {
        match self {
            Self::Answered(answer) => answer,
            Self::Escalated { response, .. } => response,
        }
    }
}

/// Help requests split by status, each list in stored order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestBoard {
    pub pending: Vec<HelpRequest>,
    pub resolved: Vec<HelpRequest>,
    pub unresolved: Vec<HelpRequest>,
}

impl RequestBoard {
    pub fn partition(requests: Vec<HelpRequest>) -> Self {
        let mut board = Self::default();
        for request in requests {
            match request.status {
                RequestStatus::Pending => board.pending.push(request),
                RequestStatus::Resolved => board.resolved.push(request),
                RequestStatus::Unresolved => board.unresolved.push(request),
            }
        }
        board
    }

    pub fn total(&self) -> usize {
        self.pending.len() + self.resolved.len() + self.unresolved.len()
    }
}

pub fn normalize_question(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// First entry whose lowercased question equals `normalized` exactly.
pub fn find_answer<'a>(
    entries: &'a [KnowledgeEntry],
    normalized: &str,
) -> Option<&'a KnowledgeEntry> {
    entries
        .iter()
        .find(|entry| entry.question.to_lowercase() == normalized)
}

pub fn next_request_id(requests: &[HelpRequest]) -> u64 {
    requests.iter().map(|r| r.id).max().map_or(1, |max| max + 1)
}

/// Marks every pending request older than `timeout` as unresolved. Returns
/// how many were promoted; the caller decides whether to persist.
pub fn enforce_timeouts(
    requests: &mut [HelpRequest],
    timeout: TimeDelta,
    now: NaiveDateTime,
) -> usize {
    let mut promoted = 0_usize;
    for request in requests.iter_mut().filter(|r| r.is_pending()) {
        if now.signed_duration_since(request.created_at) > timeout {
            request.mark_unresolved(now);
            promoted += 1;
        }
    }
    promoted
}

/// Question routing, supervisor workflow and timeout sweep over one [`Store`].
///
/// Every operation is a load, mutate, save cycle. Callers that share a desk
/// between threads must serialize access themselves.
#[derive(Debug)]
pub struct Desk<S> {
    store: S,
    timeout: TimeDelta,
}

impl<S: Store> Desk<S> {
    pub fn new(store: S, timeout: TimeDelta) -> Self {
        Self { store, timeout }
    }

    pub fn with_timeout_minutes(store: S, minutes: u64) -> Self {
        let timeout = i64::try_from(minutes)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .unwrap_or(TimeDelta::MAX);
        Self::new(store, timeout)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn timeout(&self) -> TimeDelta {
        self.timeout
    }

    pub fn ask(&mut self, question: &str, now: NaiveDateTime) -> Result<AskOutcome, DeskError> {
        let normalized = normalize_question(question);
        if normalized.is_empty() {
            return Err(DeskError::Validation("question cannot be empty".to_string()));
        }

        let knowledge = self.store.load_knowledge()?;
        if let Some(entry) = find_answer(&knowledge, &normalized) {
            debug!(question = %normalized, "answered from knowledge base");
            return Ok(AskOutcome::Answered(entry.answer.clone()));
        }

        let mut requests = self.store.load_requests()?;
        let id = next_request_id(&requests);
        requests.push(HelpRequest::pending(id, normalized.clone(), now));
        self.store.save_requests(&requests)?;
        info!(id, question = %normalized, "escalated to supervisor");

        Ok(AskOutcome::Escalated {
            id,
            response: ESCALATION_RESPONSE.to_string(),
        })
    }

    pub fn sweep_timeouts(&mut self, now: NaiveDateTime) -> Result<usize, DeskError> {
        let mut requests = self.store.load_requests()?;
        let promoted = enforce_timeouts(&mut requests, self.timeout, now);
        if promoted > 0 {
            self.store.save_requests(&requests)?;
            info!(promoted, "pending requests timed out");
        }
        Ok(promoted)
    }

    pub fn list(&mut self, now: NaiveDateTime) -> Result<RequestBoard, DeskError> {
        self.sweep_timeouts(now)?;
        Ok(RequestBoard::partition(self.store.load_requests()?))
    }

    /// Resolves a pending request and records the answer as a new knowledge
    /// entry so the same question is answered directly next time.
    pub fn answer(
        &mut self,
        id: u64,
        text: &str,
        now: NaiveDateTime,
    ) -> Result<HelpRequest, DeskError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DeskError::Validation("answer cannot be empty".to_string()));
        }

        let mut requests = self.store.load_requests()?;
        let request = requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(DeskError::NotFound(id))?;
        if !request.is_pending() {
            warn!(id, status = %request.status, "refusing to answer settled request");
            return Err(DeskError::NotPending {
                id,
                status: request.status,
            });
        }

        request.resolve(text, now);
        let resolved = request.clone();
        self.store.save_requests(&requests)?;

        let mut knowledge = self.store.load_knowledge()?;
        knowledge.push(KnowledgeEntry::new(resolved.question.clone(), text, now));
        self.store.save_knowledge(&knowledge)?;
        info!(id, question = %resolved.question, "supervisor answer learned");

        Ok(resolved)
    }

    pub fn knowledge(&self) -> Result<Vec<KnowledgeEntry>, DeskError> {
        Ok(self.store.load_knowledge()?)
    }
}
