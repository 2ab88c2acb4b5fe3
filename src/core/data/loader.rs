//! Data loaders resolving paths under `data/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::tuning::Tuning;

fn data_root() -> PathBuf {
    // Assume running from the project root during development.
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// Read a raw JSON file under `data/` and return its string.
pub fn read_json(rel: impl AsRef<Path>) -> Result<String> {
    let path = data_root().join(rel);
    let s = fs::read_to_string(&path).with_context(|| format!("read data: {}", path.display()))?;
    Ok(s)
}

/// Load `data/tuning.json`, falling back to compiled-in defaults when the
/// file is absent or malformed.
pub fn load_tuning() -> Tuning {
    match read_json("tuning.json") {
        Ok(txt) => match serde_json::from_str::<Tuning>(&txt) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("tuning.json malformed ({e}); using defaults");
                Tuning::default()
            }
        },
        Err(e) => {
            log::warn!("tuning.json not loaded ({e}); using defaults");
            Tuning::default()
        }
    }
}
