use crate::domain::rows::{FollowerRow, UniverseRow};
use anyhow::Context;
use std::path::Path;

pub fn read_ticker_file(path: &Path) -> anyhow::Result<Vec<FollowerRow>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_lines(&text, FollowerRow::parse_line)
        .with_context(|| format!("failed to parse {}", path.display()))
}

pub fn read_universe_file(path: &Path) -> anyhow::Result<Vec<UniverseRow>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_lines(&text, UniverseRow::parse_line)
        .with_context(|| format!("failed to parse {}", path.display()))
}

fn parse_lines<T>(text: &str, parse: fn(&str) -> anyhow::Result<T>) -> anyhow::Result<Vec<T>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| parse(line).with_context(|| format!("line {}", idx + 1)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_and_reports_bad_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.csv");

        std::fs::write(&path, "20200508,100,0.1,0.2,0.3\n20200509,101,,,").unwrap();
        let rows = read_ticker_file(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].followers, 101);

        std::fs::write(&path, "20200508,100,0.1,0.2,0.3\nbroken").unwrap();
        let err = read_ticker_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"), "{err:#}");
    }
}
