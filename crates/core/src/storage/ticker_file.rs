use crate::storage::OutputLayout;
use anyhow::Context;
use std::path::PathBuf;

/// Replaces `{root}/{stem}.csv` with `lines` joined by newlines (no trailing newline).
///
/// The content goes to a temp file in the same directory first and is renamed over the target,
/// so readers see either the old file or the complete new one.
pub fn write_ticker_file(
    layout: &OutputLayout,
    stem: &str,
    lines: &[String],
) -> anyhow::Result<PathBuf> {
    let target = layout.ticker_path(stem);
    let tmp = layout
        .root
        .join(format!(".{stem}.{}.tmp", uuid::Uuid::new_v4().simple()));

    std::fs::write(&tmp, lines.join("\n"))
        .with_context(|| format!("failed to write temp file {}", tmp.display()))?;

    if let Err(err) = std::fs::rename(&tmp, &target) {
        let _ = std::fs::remove_file(&tmp);
        return Err(err).with_context(|| format!("failed to replace {}", target.display()));
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_previous_content_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::prepare(dir.path()).unwrap();
        std::fs::write(layout.ticker_path("a"), "20190101,1,,,\n20190102,2,,,").unwrap();

        let lines = vec!["20200508,100,0.1,0.2,0.3".to_string()];
        let path = write_ticker_file(&layout, "a", &lines).unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "20200508,100,0.1,0.2,0.3");
    }

    #[test]
    fn leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::prepare(dir.path()).unwrap();
        let lines = vec!["a".to_string(), "b".to_string()];
        write_ticker_file(&layout, "x", &lines).unwrap();

        let names: Vec<String> = std::fs::read_dir(&layout.root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().all(|n| !n.ends_with(".tmp")), "{names:?}");
        assert_eq!(std::fs::read_to_string(layout.ticker_path("x")).unwrap(), "a\nb");
    }
}
