use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use frontdesk_core::{HelpRequest, KnowledgeEntry, Store, StoreError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

/// Keeps the knowledge base and the help requests in two JSON array files.
///
/// Each save rewrites the whole file in place: there is no temp-file rename,
/// no lock and no backup, so two processes pointed at the same files can
/// overwrite each other's changes.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    knowledge_path: PathBuf,
    requests_path: PathBuf,
}

impl JsonFileStore {
    pub fn open(knowledge_path: &Path, requests_path: &Path) -> Self {
        Self {
            knowledge_path: knowledge_path.to_path_buf(),
            requests_path: requests_path.to_path_buf(),
        }
    }

    /// Uses the default file names inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::open(
            &data_dir.join("knowledge.json"),
            &data_dir.join("help_requests.json"),
        )
    }

    pub fn knowledge_path(&self) -> &Path {
        &self.knowledge_path
    }

    pub fn requests_path(&self) -> &Path {
        &self.requests_path
    }
}

impl Store for JsonFileStore {
    fn load_knowledge(&self) -> Result<Vec<KnowledgeEntry>, StoreError> {
        read_collection(&self.knowledge_path)
    }

    fn save_knowledge(&mut self, entries: &[KnowledgeEntry]) -> Result<(), StoreError> {
        write_collection(&self.knowledge_path, "knowledge", entries)
    }

    fn load_requests(&self) -> Result<Vec<HelpRequest>, StoreError> {
        read_collection(&self.requests_path)
    }

    fn save_requests(&mut self, requests: &[HelpRequest]) -> Result<(), StoreError> {
        write_collection(&self.requests_path, "help requests", requests)
    }
}

fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_collection<T: Serialize>(
    path: &Path,
    collection: &'static str,
    records: &[T],
) -> Result<(), StoreError> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    records
        .serialize(&mut serializer)
        .map_err(|source| StoreError::Serialize { collection, source })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StoreError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, buf).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), records = records.len(), "collection saved");
    Ok(())
}
