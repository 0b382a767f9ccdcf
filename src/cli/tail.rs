use anyhow::Result;

use super::{format_item, open_stream, StreamName};
use habitat::config::HabitatConfig;

/// Lines shown when no positive count is given.
pub const DEFAULT_TAIL: usize = 5;

/// Print the last `n` lines of a stream, unparseable lines included.
///
/// A count of zero or less falls back to [`DEFAULT_TAIL`].
pub fn tail(config: &HabitatConfig, stream: StreamName, n: i64) -> Result<()> {
    let n = line_count(n);
    let log = open_stream(config, stream);
    if !log.path().exists() {
        println!("Memory stream not found at {}", log.path().display());
        return Ok(());
    }

    let items = log.tail(n)?;
    if items.is_empty() {
        println!("No memory entries found.");
        return Ok(());
    }

    println!(
        "Last {} memory entries from {}:",
        items.len(),
        log.path().display()
    );
    for item in &items {
        println!("{}", format_item(item));
    }
    Ok(())
}

fn line_count(requested: i64) -> usize {
    usize::try_from(requested)
        .ok()
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_TAIL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_count_uses_default() {
        assert_eq!(line_count(0), DEFAULT_TAIL);
        assert_eq!(line_count(-3), DEFAULT_TAIL);
        assert_eq!(line_count(12), 12);
    }
}
