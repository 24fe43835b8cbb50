//! Metadata tables: internal id → record.
//!
//! Metadata files come in two layouts. Either a plain list aligned with the index ids, or an
//! object carrying `metadata_list` and/or an `id_to_metadata` map keyed by id. The layout is
//! resolved once at load time into [`MetadataTable`], so lookups never sniff shapes.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One metadata record: field name → value. Values are strings except `price`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Text form of a scalar field. Numbers and bools render as their decimal/literal text;
    /// `null`, arrays and objects count as missing.
    pub fn text(&self, field: &str) -> Option<Cow<'_, str>> {
        match self.0.get(field)? {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Numeric price. Accepts numbers and numeric strings.
    pub fn price(&self) -> Option<f64> {
        match self.0.get("price")? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Metadata for one index, keyed by internal id.
#[derive(Debug, Clone)]
pub enum MetadataTable {
    /// Records in id order; `None` marks an id with no record.
    Dense(Vec<Option<Record>>),
    Sparse(HashMap<usize, Record>),
}

impl MetadataTable {
    /// Record for `id`, or `None` if the table has nothing for it.
    pub fn lookup(&self, id: usize) -> Option<&Record> {
        match self {
            MetadataTable::Dense(records) => records.get(id)?.as_ref(),
            MetadataTable::Sparse(records) => records.get(&id),
        }
    }

    /// Number of ids that resolve to a record.
    pub fn len(&self) -> usize {
        match self {
            MetadataTable::Dense(records) => records.iter().filter(|r| r.is_some()).count(),
            MetadataTable::Sparse(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load a JSON metadata file.
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| MetadataError::Read(path.to_path_buf(), e))?;
        Self::from_json(&s).map_err(|e| match e {
            MetadataError::Parse(err) => MetadataError::ParseFile(path.to_path_buf(), err),
            other => other,
        })
    }

    pub fn from_json(s: &str) -> Result<Self, MetadataError> {
        let file: MetadataFile = serde_json::from_str(s)?;
        Self::from_file(file)
    }

    fn from_file(file: MetadataFile) -> Result<Self, MetadataError> {
        match file {
            MetadataFile::List(records) => Ok(MetadataTable::Dense(records)),
            MetadataFile::Keyed {
                metadata_list: Some(list),
                id_to_metadata: None,
            } => Ok(MetadataTable::Dense(list)),
            MetadataFile::Keyed {
                metadata_list,
                id_to_metadata: Some(map),
            } => {
                let mut sparse = parse_ids(map)?;
                // List entries shadow the map for every id inside the list, holes included.
                for (id, record) in metadata_list.into_iter().flatten().enumerate() {
                    match record {
                        Some(record) => {
                            sparse.insert(id, record);
                        }
                        None => {
                            sparse.remove(&id);
                        }
                    }
                }
                Ok(MetadataTable::Sparse(sparse))
            }
            MetadataFile::Keyed {
                metadata_list: None,
                id_to_metadata: None,
            } => Err(MetadataError::NoTable),
        }
    }
}

fn parse_ids(map: HashMap<String, Record>) -> Result<HashMap<usize, Record>, MetadataError> {
    map.into_iter()
        .map(|(key, record)| {
            key.trim()
                .parse::<usize>()
                .map(|id| (id, record))
                .map_err(|_| MetadataError::BadId(key))
        })
        .collect()
}

/// On-disk layouts.
#[derive(Deserialize)]
#[serde(untagged)]
enum MetadataFile {
    List(Vec<Option<Record>>),
    Keyed {
        #[serde(default)]
        metadata_list: Option<Vec<Option<Record>>>,
        #[serde(default)]
        id_to_metadata: Option<HashMap<String, Record>>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("failed to read metadata {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("invalid metadata JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid metadata JSON in {0}: {1}")]
    ParseFile(PathBuf, serde_json::Error),
    #[error("metadata has neither `metadata_list` nor `id_to_metadata`")]
    NoTable,
    #[error("metadata id {0:?} is not a non-negative integer")]
    BadId(String),
}
