use crate::storage::OutputLayout;
use anyhow::Context;
use chrono::NaiveDate;
use std::io::Write;

/// Appends one newline-terminated row to the universe file of `date`, creating it on first use.
/// The file is opened and closed per call.
pub fn append_universe_line(
    layout: &OutputLayout,
    date: NaiveDate,
    line: &str,
) -> anyhow::Result<()> {
    let path = layout.universe_path(date);
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open universe file {}", path.display()))?;

    file.write_all(format!("{line}\n").as_bytes())
        .with_context(|| format!("failed to append to universe file {}", path.display()))?;
    Ok(())
}
