//! Loading experiment data from disk.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cleaning::RawGroup;

/// The two experiment groups as stored on disk.
///
/// ```json
/// {
///   "control": { "primary": [450.0, ...], "secondary": [0.0, 1.0, ...] },
///   "variant": { "primary": [480.0, ...], "secondary": [1.0, 0.0, ...] }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentData {
    pub control: RawGroup,
    pub variant: RawGroup,
}

impl ExperimentData {
    /// Load experiment data from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<ExperimentData> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?;

        let data: ExperimentData = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse input file: {}", path.display()))?;

        Ok(data)
    }
}
