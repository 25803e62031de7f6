use crate::write_atomic;
use rfetcher_core::{SaveMode, StoreError};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Document written as given.
    Written,
    /// Document combined with the existing file contents.
    Merged,
    /// Existing file had an incompatible shape and was replaced.
    ShapeMismatchOverwritten,
}

/// Persists `data` at `path`. In append mode an existing document is merged
/// with `data` first; a missing file is simply written.
pub fn save(data: &Value, path: &Path, mode: SaveMode) -> Result<SaveOutcome, StoreError> {
    let (document, outcome) = match mode {
        SaveMode::Append if path.exists() => {
            let existing = read_document(path)?;
            merge_documents(existing, data, path)?
        }
        _ => (data.clone(), SaveOutcome::Written),
    };

    let bytes = serde_json::to_vec_pretty(&document).map_err(|e| StoreError::WriteFailed {
        path: path.display().to_string(),
        source: e.into(),
    })?;
    write_atomic(path, &bytes)?;

    info!("Data saved to {}", path.display());
    Ok(outcome)
}

fn read_document(path: &Path) -> Result<Value, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::ReadFailed {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StoreError::MalformedDocument {
        path: path.display().to_string(),
        source,
    })
}

/// Combines an existing document with new data.
///
/// Mappings merge key by key: lists extend, new keys are inserted, equal
/// values stay, and any other collision is a conflict. Two lists
/// concatenate. A list appended to a mapping extends its `posts` list.
/// Every other pairing yields `data` unchanged.
pub fn merge_documents(
    existing: Value,
    data: &Value,
    path: &Path,
) -> Result<(Value, SaveOutcome), StoreError> {
    match (existing, data) {
        (Value::Object(mut current), Value::Object(incoming)) => {
            for (key, value) in incoming {
                if !current.contains_key(key) {
                    current.insert(key.clone(), value.clone());
                    continue;
                }
                match (current.get_mut(key), value) {
                    (Some(Value::Array(items)), Value::Array(more)) => {
                        items.extend(more.iter().cloned())
                    }
                    (Some(present), _) if *present == *value => {}
                    _ => {
                        return Err(StoreError::ConflictingEntry {
                            path: path.display().to_string(),
                            key: key.clone(),
                        })
                    }
                }
            }
            Ok((Value::Object(current), SaveOutcome::Merged))
        }
        (Value::Array(mut items), Value::Array(more)) => {
            items.extend(more.iter().cloned());
            Ok((Value::Array(items), SaveOutcome::Merged))
        }
        (Value::Object(mut current), Value::Array(more))
            if current.get("posts").is_some_and(Value::is_array) =>
        {
            if let Some(Value::Array(posts)) = current.get_mut("posts") {
                posts.extend(more.iter().cloned());
            }
            Ok((Value::Object(current), SaveOutcome::Merged))
        }
        _ => {
            warn!(
                "Data structure mismatch in {}, overwriting instead",
                path.display()
            );
            Ok((data.clone(), SaveOutcome::ShapeMismatchOverwritten))
        }
    }
}
