use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::rules::model::RuleResult;

/// Read a JSON array of rule results from disk.
///
/// Order is preserved exactly as stored; aggregation relies on it.
pub fn read_results(path: &Path) -> Result<Vec<RuleResult>> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read results: {}", path.display()))?;

    serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse results: {}", path.display()))
}
