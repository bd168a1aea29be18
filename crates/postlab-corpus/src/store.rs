//! Reading and writing JSON corpus files.
//!
//! Only `.json` paths are accepted. Files are written UTF-8, pretty-printed
//! with four-space indentation, with non-ASCII characters stored literally.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tracing::{debug, info};

use postlab_types::PostRecord;

use crate::error::CorpusError;

const INDENT: &[u8] = b"    ";

/// True when `path` has the `.json` extension (case-insensitive).
pub fn is_json_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Read and parse a JSON document of any shape.
pub fn read_document(path: &Path) -> Result<Value, CorpusError> {
    if !is_json_path(path) {
        return Err(CorpusError::UnsupportedFormat(path.display().to_string()));
    }

    let bytes = fs::read(path)?;
    let text = std::str::from_utf8(&bytes).map_err(|source| CorpusError::Encoding {
        path: path.display().to_string(),
        source,
    })?;

    Ok(serde_json::from_str(text)?)
}

/// Load a JSON array, deserializing each element as `T`.
///
/// A single object (for example a raw API envelope) is rejected with
/// [`CorpusError::NotASequence`].
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CorpusError> {
    let document = read_document(path)?;
    if !document.is_array() {
        return Err(CorpusError::NotASequence(path.display().to_string()));
    }

    let items: Vec<T> = serde_json::from_value(document)?;
    debug!(path = %path.display(), count = items.len(), "Loaded JSON array");
    Ok(items)
}

/// Load the post records stored at `path`.
pub fn load(path: &Path) -> Result<Vec<PostRecord>, CorpusError> {
    let records = load_json(path)?;
    info!(path = %path.display(), records = records.len(), "Loaded corpus");
    Ok(records)
}

/// Write `data` to `path` as indented JSON, creating parent directories.
pub fn save<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), CorpusError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let bytes = to_pretty_json(data)?;
    fs::write(path, bytes)?;
    info!(path = %path.display(), "Saved JSON document");
    Ok(())
}

/// Serialize with four-space indentation and literal non-ASCII characters.
pub fn to_pretty_json<T: Serialize + ?Sized>(data: &T) -> Result<Vec<u8>, CorpusError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    data.serialize(&mut serializer)?;
    Ok(buf)
}
