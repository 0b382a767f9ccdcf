use anyhow::Result;

use super::{open_stream, StreamName};
use habitat::config::HabitatConfig;
use habitat::memory::search;

/// Print the profile and the latest root-stream entries as pretty JSON.
pub fn snapshot(config: &HabitatConfig) -> Result<()> {
    let log = open_stream(config, StreamName::Root);
    let snapshot = search::snapshot(&log, &config.profile_path(), &config.resolved_root())?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
