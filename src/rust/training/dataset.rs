use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde_json::{Map, Value};

pub const TEXT_FIELD: &str = "text";
pub const TARGET_FIELD: &str = "sentiment";

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Dataset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid dataset structure: {0}")]
    Schema(String),
    #[error("Unmapped label after filtering: {0}")]
    DataIntegrity(String),
    #[error("No training data left after preprocessing")]
    Empty,
}

/// Texts and their labels (`0 = negative`, `1 = positive`), index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub texts: Vec<String>,
    pub labels: Vec<u8>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Share of positive labels; `0.0` for an empty dataset.
    pub fn positive_fraction(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.labels.iter().filter(|&&y| y == 1).count() as f64 / self.labels.len() as f64
    }

    /// Rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            texts: indices.iter().map(|&i| self.texts[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

fn map_label(sentiment: &str) -> Option<u8> {
    match sentiment {
        "negative" => Some(0),
        "positive" => Some(1),
        _ => None,
    }
}

/// Reads a JSON array of `{"text": ..., "sentiment": ...}` records.
///
/// Records missing either field, holding a non-string value, or with a sentiment other
/// than exactly `negative` / `positive` are dropped without error.
///
/// # Errors
/// - `Io` / `Json` if the file cannot be read or parsed
/// - `Schema` if the document is not an array of objects, or no record carries a
///   `text` or a `sentiment` field at all
/// - `DataIntegrity` if a kept record has a label that cannot be mapped
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset, DatasetError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = parse_dataset(&raw)?;
    info!("Loaded {} labelled examples from {:?}", dataset.len(), path);
    Ok(dataset)
}

/// Same as [`load_dataset`] for an in-memory JSON document.
pub fn parse_dataset(raw: &str) -> Result<Dataset, DatasetError> {
    let document: Value = serde_json::from_str(raw)?;
    let records = match document {
        Value::Array(records) => records,
        other => {
            return Err(DatasetError::Schema(format!(
                "expected an array of records, found {}",
                json_kind(&other)
            )))
        }
    };

    let objects: Vec<Map<String, Value>> = records
        .into_iter()
        .enumerate()
        .map(|(i, record)| match record {
            Value::Object(fields) => Ok(fields),
            other => Err(DatasetError::Schema(format!(
                "record {} is {}, expected an object",
                i,
                json_kind(&other)
            ))),
        })
        .collect::<Result<_, _>>()?;

    if !objects.is_empty() {
        let has_field = |name: &str| objects.iter().any(|fields| fields.contains_key(name));
        if !has_field(TEXT_FIELD) || !has_field(TARGET_FIELD) {
            return Err(DatasetError::Schema(format!(
                "records must contain '{}' and '{}' fields",
                TEXT_FIELD, TARGET_FIELD
            )));
        }
    }

    let total = objects.len();
    let kept: Vec<(String, String)> = objects
        .into_iter()
        .filter_map(|mut fields| {
            let text = match fields.remove(TEXT_FIELD) {
                Some(Value::String(text)) => text,
                _ => return None,
            };
            match fields.remove(TARGET_FIELD) {
                Some(Value::String(sentiment)) if map_label(&sentiment).is_some() => {
                    Some((text, sentiment))
                }
                _ => None,
            }
        })
        .collect();

    if kept.len() < total {
        warn!("Dropped {} of {} records with missing or invalid fields", total - kept.len(), total);
    }

    let mut dataset = Dataset::default();
    for (text, sentiment) in kept {
        let label = map_label(&sentiment).ok_or_else(|| {
            DatasetError::DataIntegrity(format!("'{}' is not a known sentiment", sentiment))
        })?;
        dataset.texts.push(text);
        dataset.labels.push(label);
    }
    Ok(dataset)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
