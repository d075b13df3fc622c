//! Subcommands.

pub mod batch;
pub mod config;
pub mod inspect;
pub mod process;

use std::fs;
use std::path::Path;

use sheetinv_core::{MappingSubmission, SheetinvConfig};

/// Load the configuration file, or defaults when none is given.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<SheetinvConfig> {
    match config_path {
        Some(path) => Ok(SheetinvConfig::from_file(Path::new(path))?),
        None => Ok(SheetinvConfig::default()),
    }
}

/// Load user-confirmed mappings from a JSON file.
pub fn load_submission(path: Option<&Path>) -> anyhow::Result<Option<MappingSubmission>> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            Ok(Some(MappingSubmission::from_json(&json)?))
        }
        None => Ok(None),
    }
}
