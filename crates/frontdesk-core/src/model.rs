use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::timestamp;

/// A learned question/answer pair. Entries are never edited once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub question: String,
    pub answer: String,
    #[serde(with = "timestamp")]
    pub added_at: NaiveDateTime,
}

impl KnowledgeEntry {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        added_at: NaiveDateTime,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            added_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Resolved,
    Unresolved,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Unresolved => "unresolved",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer question waiting on (or settled by) the supervisor.
///
/// `answer`/`resolved_at` are only set for resolved requests and `timeout_at`
/// only for unresolved ones; the transition methods keep that true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpRequest {
    pub id: u64,
    pub question: String,
    pub status: RequestStatus,
    #[serde(with = "timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub resolved_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout_at: Option<NaiveDateTime>,
}

impl HelpRequest {
    pub fn pending(id: u64, question: impl Into<String>, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            question: question.into(),
            status: RequestStatus::Pending,
            created_at,
            resolved_at: None,
            answer: None,
            timeout_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    pub(crate) fn resolve(&mut self, answer: &str, now: NaiveDateTime) {
        self.status = RequestStatus::Resolved;
        self.resolved_at = Some(now);
        self.answer = Some(answer.to_string());
    }

    pub(crate) fn mark_unresolved(&mut self, now: NaiveDateTime) {
        self.status = RequestStatus::Unresolved;
        self.timeout_at = Some(now);
    }
}
