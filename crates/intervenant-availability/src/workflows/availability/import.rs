use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use super::domain::{Intervenant, IntervenantId};

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Json(serde_json::Error),
    DuplicateId(IntervenantId),
    DuplicateKey(IntervenantId),
    EmptyKey(IntervenantId),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "failed to read intervenant records: {}", err),
            ImportError::Json(err) => write!(f, "invalid intervenant records: {}", err),
            ImportError::DuplicateId(id) => write!(f, "intervenant '{}' appears twice", id),
            ImportError::DuplicateKey(id) => write!(
                f,
                "intervenant '{}' reuses an access key already bound to another record",
                id
            ),
            ImportError::EmptyKey(id) => write!(f, "intervenant '{}' has an empty access key", id),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            ImportError::Json(err) => Some(err),
            ImportError::DuplicateId(_) | ImportError::DuplicateKey(_) | ImportError::EmptyKey(_) => {
                None
            }
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Loads intervenant records from a JSON array.
///
/// Slots and week labels are validated while decoding, so a single malformed entry
/// rejects the whole batch.
pub struct IntervenantImporter;

impl IntervenantImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Intervenant>, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Intervenant>, ImportError> {
        let records: Vec<Intervenant> = serde_json::from_reader(reader)?;

        let mut ids = HashSet::new();
        let mut tokens = HashSet::new();
        for record in &records {
            if record.key.token.is_empty() {
                return Err(ImportError::EmptyKey(record.id.clone()));
            }
            if !ids.insert(&record.id) {
                return Err(ImportError::DuplicateId(record.id.clone()));
            }
            if !tokens.insert(record.key.token.as_str()) {
                return Err(ImportError::DuplicateKey(record.id.clone()));
            }
        }

        Ok(records)
    }
}
