use anyhow::Result;

use super::{format_entry, open_stream, StreamName};
use habitat::config::HabitatConfig;
use habitat::memory::search::{self, SearchFilter};

/// Search the root stream from the terminal. No filters shows the latest entries.
pub fn search(config: &HabitatConfig, query: Option<&str>, tag: Option<&str>) -> Result<()> {
    let log = open_stream(config, StreamName::Root);
    if !log.path().exists() {
        println!("Memory stream not found at {}", log.path().display());
        return Ok(());
    }

    let filter = SearchFilter::new(query, tag);
    let response = search::search(&log, &filter)?;

    if response.total == 0 {
        println!("No valid memory entries found.");
        return Ok(());
    }

    println!(
        "{} matching entries (of {} total) in {}:",
        response.results.len(),
        response.total,
        log.path().display()
    );
    for entry in &response.results {
        println!("{}", format_entry(entry));
    }
    Ok(())
}
