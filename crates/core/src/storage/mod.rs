use anyhow::Context;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub mod reader;
pub mod ticker_file;
pub mod universe;

pub const UNIVERSE_DIR: &str = "universe";

/// Output locations of one run: per-ticker files in `root`, per-date files in `root/universe`.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub universe: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let universe = root.join(UNIVERSE_DIR);
        Self { root, universe }
    }

    /// Deletes any previous universe directory and (re)creates both output directories.
    pub fn prepare(root: &Path) -> anyhow::Result<Self> {
        let layout = Self::new(root);

        if layout.universe.exists() {
            std::fs::remove_dir_all(&layout.universe).with_context(|| {
                format!(
                    "failed to remove previous universe dir {}",
                    layout.universe.display()
                )
            })?;
        }

        std::fs::create_dir_all(&layout.root)
            .with_context(|| format!("failed to create output dir {}", layout.root.display()))?;
        std::fs::create_dir_all(&layout.universe).with_context(|| {
            format!("failed to create universe dir {}", layout.universe.display())
        })?;

        Ok(layout)
    }

    pub fn ticker_path(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{stem}.csv"))
    }

    pub fn universe_path(&self, date: NaiveDate) -> PathBuf {
        self.universe.join(format!("{}.csv", date.format("%Y%m%d")))
    }
}
