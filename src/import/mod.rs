//! Reading batches of keys from delimited text files

use csv::{ReaderBuilder, Trim};
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::btree::TreeKey;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid key on line {line}: {value:?}")]
    InvalidKey { line: u64, value: String },
}

pub type ImportResult<T> = Result<T, ImportError>;

/// Read every key from a CSV file, in file order.
///
/// Records may hold any number of fields. Empty fields are skipped.
pub fn load_keys_csv<P: AsRef<Path>>(path: P, delimiter: u8) -> ImportResult<Vec<TreeKey>> {
    let path = path.as_ref();
    let keys = read_keys(std::fs::File::open(path)?, delimiter)?;
    info!(path = %path.display(), count = keys.len(), "imported keys");
    Ok(keys)
}

pub fn read_keys<R: Read>(source: R, delimiter: u8) -> ImportResult<Vec<TreeKey>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true) // Allow varying number of fields per row
        .trim(Trim::All)
        .from_reader(source);

    let mut keys = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        for field in record.iter().filter(|f| !f.is_empty()) {
            let key = field.parse::<TreeKey>().map_err(|_| ImportError::InvalidKey {
                line,
                value: field.to_string(),
            })?;
            keys.push(key);
        }
    }

    Ok(keys)
}
