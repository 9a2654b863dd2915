//! Training corpus loading.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{ModelError, Result};
use crate::utils::normalize;

/// Read a UTF-8 corpus file, one text unit per line.
///
/// Lines are NFC-normalized and trimmed; blank lines are dropped.
pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ModelError::io(path, &e))?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| ModelError::io(path, &e))?;
        let line = normalize(&line);
        if !line.is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}
