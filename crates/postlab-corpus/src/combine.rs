//! Merging several corpus files into one.
//!
//! Merging is best-effort: a file that is missing, not `.json`, unparsable or
//! not an array is skipped with a warning and the rest are still combined.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::error::CorpusError;
use crate::store::{read_document, save};

/// Summary of a combine run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombineReport {
    /// Files whose elements were merged
    pub merged: Vec<PathBuf>,
    /// Files skipped, with the reason
    pub skipped: Vec<(PathBuf, String)>,
    /// Total number of merged elements
    pub elements: usize,
}

/// Concatenate the arrays stored at `paths`, in order.
pub fn combine<P: AsRef<Path>>(paths: &[P]) -> Vec<Value> {
    combine_with_report(paths).0
}

/// Combine `paths` and write the merged array to `output`.
pub fn combine_files<P: AsRef<Path>>(
    paths: &[P],
    output: &Path,
) -> Result<CombineReport, CorpusError> {
    let (combined, report) = combine_with_report(paths);
    save(output, &combined)?;
    info!(
        output = %output.display(),
        merged = report.merged.len(),
        skipped = report.skipped.len(),
        elements = report.elements,
        "Combined corpus files"
    );
    Ok(report)
}

fn combine_with_report<P: AsRef<Path>>(paths: &[P]) -> (Vec<Value>, CombineReport) {
    let mut combined = Vec::new();
    let mut report = CombineReport::default();

    for path in paths {
        let path = path.as_ref();

        let document = if path.exists() {
            read_document(path)
        } else {
            Err(CorpusError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "file not found",
            )))
        };

        match document {
            Ok(Value::Array(items)) => {
                report.elements += items.len();
                report.merged.push(path.to_path_buf());
                combined.extend(items);
            }
            Ok(_) => {
                warn!(path = %path.display(), "File does not contain a JSON array, skipping");
                report
                    .skipped
                    .push((path.to_path_buf(), "not a JSON array".to_string()));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read file, skipping");
                report.skipped.push((path.to_path_buf(), e.to_string()));
            }
        }
    }

    (combined, report)
}
