//! Local persistence: JSON result documents, the category keyword file and
//! output path conventions.

pub mod categories;
pub mod merge;
pub mod paths;


pub use categories::CategoryStore;
pub use merge::{merge_documents, save, SaveOutcome};
pub use paths::{generate_filename, normalize_custom, sanitize_category, OutputTarget};

use rfetcher_core::StoreError;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes `bytes` to a temporary file beside `path`, then renames it over
/// `path`. Missing parent directories are created first.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let write_failed = |source: std::io::Error| StoreError::WriteFailed {
        path: path.display().to_string(),
        source,
    };

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(write_failed)?;

    let mut file = NamedTempFile::new_in(parent).map_err(write_failed)?;
    file.write_all(bytes).map_err(write_failed)?;
    file.as_file().sync_all().map_err(write_failed)?;
    file.persist(path).map_err(|e| write_failed(e.error))?;
    Ok(())
}
