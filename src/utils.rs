use crate::error::Result;
use crate::extract::SchemaInput;
use crate::log_info;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub fn read_schema(path: impl AsRef<Path>) -> Result<SchemaInput> {
    let content = fs::read_to_string(path.as_ref())?;
    let schema = serde_json::from_str(&content)?;
    log_info!("[utils] Loaded schema from {}", path.as_ref().display());
    Ok(schema)
}

pub fn save_json(data: &impl serde::Serialize, path: impl AsRef<Path>) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }

    let json_string = serde_json::to_string_pretty(data)?;
    let mut file = File::create(path.as_ref())?;
    file.write_all(json_string.as_bytes())?;
    log_info!("[utils] Saved JSON to {}", path.as_ref().display());
    Ok(())
}
