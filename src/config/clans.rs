use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::ClanGroup;

#[derive(Debug, Deserialize)]
struct ClansFile {
    clans: ClansSection,
}

#[derive(Debug, Deserialize)]
struct ClansSection {
    data: Vec<ClanGroup>,
}

/// Loads the clan definitions from their own config file. The file nests
/// the list under `clans.data`, matching the clan plugin's layout.
pub fn load_clans<P: AsRef<Path>>(path: P) -> Result<Vec<ClanGroup>, ConfigError> {
    let parsed: ClansFile = Config::builder()
        .add_source(File::from(path.as_ref()))
        .build()?
        .try_deserialize()?;

    Ok(parsed.clans.data)
}
