use std::path::Path;

use crate::error::FetchError;

/// Reads the identifier column as exact strings. NPIs and CCNs are opaque
/// tokens here; leading zeros survive because nothing is parsed numerically.
pub fn read_npis(path: &Path, column: &str) -> Result<Vec<String>, FetchError> {
    let mut reader =
        csv::Reader::from_path(path).map_err(|err| invalid(path, err.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|err| invalid(path, err.to_string()))?;
    let index = headers
        .iter()
        .position(|header| header == column)
        .ok_or_else(|| invalid(path, format!("missing column {column:?}")))?;

    let mut npis = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| invalid(path, err.to_string()))?;
        npis.push(record.get(index).unwrap_or("").to_string());
    }
    Ok(npis)
}

fn invalid(path: &Path, reason: String) -> FetchError {
    FetchError::InvalidInput {
        path: path.display().to_string(),
        reason,
    }
}
