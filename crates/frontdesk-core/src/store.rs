use std::path::PathBuf;

use thiserror::Error;

use crate::model::{HelpRequest, KnowledgeEntry};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize {collection}: {source}")]
    Serialize {
        collection: &'static str,
        source: serde_json::Error,
    },
}

/// Whole-collection persistence for the two record sets.
///
/// `load_*` returns every record in stored order (empty when nothing has been
/// saved yet); `save_*` replaces the collection wholesale.
pub trait Store {
    fn load_knowledge(&self) -> Result<Vec<KnowledgeEntry>, StoreError>;
    fn save_knowledge(&mut self, entries: &[KnowledgeEntry]) -> Result<(), StoreError>;
    fn load_requests(&self) -> Result<Vec<HelpRequest>, StoreError>;
    fn save_requests(&mut self, requests: &[HelpRequest]) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    knowledge: Vec<KnowledgeEntry>,
    requests: Vec<HelpRequest>,
    saves: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(knowledge: Vec<KnowledgeEntry>, requests: Vec<HelpRequest>) -> Self {
        Self {
            knowledge,
            requests,
            saves: 0,
        }
    }

    /// Number of `save_*` calls so far, across both collections.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl Store for InMemoryStore {
    fn load_knowledge(&self) -> Result<Vec<KnowledgeEntry>, StoreError> {
        Ok(self.knowledge.clone())
    }

    fn save_knowledge(&mut self, entries: &[KnowledgeEntry]) -> Result<(), StoreError> {
        self.knowledge = entries.to_vec();
        self.saves += 1;
        Ok(())
    }

    fn load_requests(&self) -> Result<Vec<HelpRequest>, StoreError> {
        Ok(self.requests.clone())
    }

    fn save_requests(&mut self, requests: &[HelpRequest]) -> Result<(), StoreError> {
        self.requests = requests.to_vec();
        self.saves += 1;
        Ok(())
    }
}
