mod desk;
mod model;
mod store;

pub mod timestamp;

pub use desk::{
    AskOutcome, DEFAULT_TIMEOUT_MINUTES, Desk, DeskError, ESCALATION_RESPONSE, RequestBoard,
    enforce_timeouts, find_answer, next_request_id, normalize_question,
};
pub use model::{HelpRequest, KnowledgeEntry, RequestStatus};
pub use store::{InMemoryStore, Store, StoreError};
