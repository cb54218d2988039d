use crate::identifier::{default_date, IdentifierResolver, SecurityIdentifier};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;

/// One row of a map file: the ticker a company traded under up to and including `date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapFileRow {
    pub date: NaiveDate,
    pub ticker: String,
}

/// Ticker history of one company lineage, ordered by date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapFile {
    pub name: String,
    pub rows: Vec<MapFileRow>,
}

impl MapFile {
    pub fn parse(name: &str, text: &str) -> Result<Self> {
        let mut rows = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut cols = line.split(',');
            let date = cols.next().unwrap_or_default().trim();
            let ticker = cols.next().unwrap_or_default().trim();
            anyhow::ensure!(
                !ticker.is_empty(),
                "map file {name} line {}: missing ticker",
                idx + 1
            );
            let date = NaiveDate::parse_from_str(date, "%Y%m%d").with_context(|| {
                format!("map file {name} line {}: invalid date {date}", idx + 1)
            })?;
            rows.push(MapFileRow {
                date,
                ticker: ticker.to_ascii_uppercase(),
            });
        }

        rows.sort_by_key(|r| r.date);
        Ok(Self {
            name: name.to_string(),
            rows,
        })
    }

    pub fn first_row(&self) -> Option<&MapFileRow> {
        self.rows.first()
    }
}

/// In-memory index over all map files of a market.
#[derive(Debug, Default)]
pub struct MapFileIndex {
    files: Vec<MapFile>,
    // ticker -> (file index, row index)
    by_ticker: HashMap<String, Vec<(usize, usize)>>,
}

impl MapFileIndex {
    pub fn from_map_files(files: Vec<MapFile>) -> Self {
        let files: Vec<MapFile> = files.into_iter().filter(|f| !f.rows.is_empty()).collect();
        let mut by_ticker: HashMap<String, Vec<(usize, usize)>> = HashMap::new();
        for (file_idx, file) in files.iter().enumerate() {
            for (row_idx, row) in file.rows.iter().enumerate() {
                by_ticker
                    .entry(row.ticker.clone())
                    .or_default()
                    .push((file_idx, row_idx));
            }
        }
        Self { files, by_ticker }
    }

    /// Loads every `*.csv` map file in `dir`. When the directory holds none, falls back to the
    /// latest `map_files_*.zip` archive in it.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut csv_paths = Vec::new();
        let mut zip_paths = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("failed to read map files dir {}", dir.display()))?
        {
            let path = entry.context("failed to read map files dir entry")?.path();
            let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            let lower = file_name.to_ascii_lowercase();
            if lower.ends_with(".csv") {
                csv_paths.push(path);
            } else if lower.starts_with("map_files_") && lower.ends_with(".zip") {
                zip_paths.push(path);
            }
        }

        if !csv_paths.is_empty() {
            csv_paths.sort();
            let mut files = Vec::with_capacity(csv_paths.len());
            for path in csv_paths {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read map file {}", path.display()))?;
                let name = map_file_name(&path.to_string_lossy());
                files.push(MapFile::parse(&name, &text)?);
            }
            return Self::non_empty(Self::from_map_files(files), dir);
        }

        zip_paths.sort();
        let latest = zip_paths
            .pop()
            .with_context(|| format!("no map files found in {}", dir.display()))?;
        let bytes = std::fs::read(&latest)
            .with_context(|| format!("failed to read map files archive {}", latest.display()))?;
        let files = unzip_and_parse_map_files(&bytes)
            .with_context(|| format!("failed to load map files archive {}", latest.display()))?;
        Self::non_empty(Self::from_map_files(files), dir)
    }

    fn non_empty(index: Self, dir: &Path) -> Result<Self> {
        anyhow::ensure!(!index.is_empty(), "map files in {} have no rows", dir.display());
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Finds the map file in which `ticker` was the active ticker on `date`.
    ///
    /// Row `i` covers `(row[i-1].date, row[i].date]`. If no row covers the date, the closest row
    /// ending after it wins, then the latest one.
    pub fn resolve(&self, ticker: &str, date: NaiveDate) -> Option<&MapFile> {
        let entries = self.by_ticker.get(&ticker.trim().to_ascii_uppercase())?;

        let mut next_after: Option<(NaiveDate, usize)> = None;
        let mut latest: Option<(NaiveDate, usize)> = None;
        for &(file_idx, row_idx) in entries {
            let rows = &self.files[file_idx].rows;
            let end = rows[row_idx].date;
            let covered = date <= end && (row_idx == 0 || date > rows[row_idx - 1].date);
            if covered {
                return Some(&self.files[file_idx]);
            }
            if end >= date && next_after.map_or(true, |(d, _)| end < d) {
                next_after = Some((end, file_idx));
            }
            if latest.map_or(true, |(d, _)| end > d) {
                latest = Some((end, file_idx));
            }
        }

        next_after
            .or(latest)
            .map(|(_, file_idx)| &self.files[file_idx])
    }
}

/// Resolves equity identifiers from map files: the identifier carries the first ticker and first
/// date of the lineage the ticker belonged to on the requested date.
#[derive(Debug)]
pub struct MapFileIdentifierResolver {
    index: MapFileIndex,
}

impl MapFileIdentifierResolver {
    pub fn new(index: MapFileIndex) -> Self {
        Self { index }
    }

    pub fn load_dir(dir: &Path) -> Result<Self> {
        Ok(Self::new(MapFileIndex::load_dir(dir)?))
    }

    pub fn index(&self) -> &MapFileIndex {
        &self.index
    }
}

impl IdentifierResolver for MapFileIdentifierResolver {
    fn resolve(&self, ticker: &str, market: &str, date: NaiveDate) -> Result<SecurityIdentifier> {
        let ticker = ticker.trim();
        anyhow::ensure!(!ticker.is_empty(), "cannot resolve identifier for empty ticker");

        let first = self
            .index
            .resolve(ticker, date)
            .and_then(MapFile::first_row);

        let (symbol, first_date) = match first {
            Some(row) => (row.ticker.as_str(), row.date),
            None => (ticker, default_date()),
        };

        SecurityIdentifier::generate_equity(symbol, market, first_date)
            .with_context(|| format!("failed to generate identifier for {ticker} as of {date}"))
    }
}

fn map_file_name(path: &str) -> String {
    let base = path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path);
    base.to_ascii_lowercase().trim_end_matches(".csv").to_string()
}

fn unzip_and_parse_map_files(zip_bytes: &[u8]) -> Result<Vec<MapFile>> {
    use std::io::{Cursor, Read};

    let reader = Cursor::new(zip_bytes);
    let mut zip = zip::ZipArchive::new(reader).context("open zip archive failed")?;

    let mut out = Vec::new();
    for i in 0..zip.len() {
        let mut file = zip.by_index(i).context("open zip entry failed")?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        if !name.to_ascii_lowercase().ends_with(".csv") {
            continue;
        }

        let mut text = String::new();
        file.read_to_string(&mut text)
            .with_context(|| format!("read zip entry {name} failed"))?;
        out.push(MapFile::parse(&map_file_name(&name), &text)?);
    }

    anyhow::ensure!(!out.is_empty(), "zip has no map file entries");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // GOOG traded as GOOG until 2014-04-02, then the ticker moved to a new lineage.
    fn sample_index() -> MapFileIndex {
        let goocv = MapFile::parse(
            "goocv",
            "20040819,goog,Q\n20140402,goog,Q\n20140403,goocv,Q\n20501231,goocv,Q\n",
        )
        .unwrap();
        let goog = MapFile::parse("goog", "20140327,goog,Q\n20501231,goog,Q\n").unwrap();
        let fb = MapFile::parse("meta", "20120518,fb,Q\n20220608,fb,Q\n20501231,meta,Q\n").unwrap();
        MapFileIndex::from_map_files(vec![goocv, goog, fb])
    }

    #[test]
    fn parses_and_sorts_rows() {
        let mf = MapFile::parse("x", "20501231,xx\n20100104,x,N\n\n").unwrap();
        assert_eq!(mf.rows.len(), 2);
        assert_eq!(mf.rows[0].date, d(2010, 1, 4));
        assert_eq!(mf.rows[0].ticker, "X");
    }

    #[test]
    fn rejects_malformed_rows() {
        assert!(MapFile::parse("x", "2010-01-04,x\n").is_err());
        assert!(MapFile::parse("x", "20100104\n").is_err());
    }

    #[test]
    fn resolves_ticker_reuse_by_date() {
        let index = sample_index();
        assert_eq!(index.resolve("GOOG", d(2010, 1, 4)).unwrap().name, "goocv");
        assert_eq!(index.resolve("goog", d(2020, 1, 2)).unwrap().name, "goog");
        assert_eq!(index.resolve("META", d(2023, 1, 3)).unwrap().name, "meta");
        assert_eq!(index.resolve("FB", d(2015, 6, 1)).unwrap().name, "meta");
        assert!(index.resolve("MSFT", d(2015, 6, 1)).is_none());
    }

    #[test]
    fn resolver_uses_first_ticker_and_date_of_lineage() {
        let resolver = MapFileIdentifierResolver::new(sample_index());

        let sid = resolver.resolve("META", "usa", d(2023, 1, 3)).unwrap();
        assert_eq!(sid.symbol(), "FB");
        assert_eq!(sid.date(), Some(d(2012, 5, 18)));

        let sid = resolver.resolve("GOOG", "usa", d(2020, 1, 2)).unwrap();
        assert_eq!(sid.symbol(), "GOOG");
        assert_eq!(sid.date(), Some(d(2014, 3, 27)));
    }

    #[test]
    fn resolver_falls_back_to_default_date_for_unknown_ticker() {
        let resolver = MapFileIdentifierResolver::new(sample_index());
        let sid = resolver.resolve("SPY", "usa", d(2020, 1, 2)).unwrap();
        assert_eq!(sid.to_string(), "SPY R735QTJ8XC9X");
    }

    #[test]
    fn resolver_errors_on_bad_input() {
        let resolver = MapFileIdentifierResolver::new(sample_index());
        assert!(resolver.resolve("", "usa", d(2020, 1, 2)).is_err());
        assert!(resolver.resolve("SPY", "nowhere", d(2020, 1, 2)).is_err());
    }

    #[test]
    fn loads_csv_files_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("spy.csv"), "19980102,spy,P\n20501231,spy,P\n").unwrap();
        std::fs::write(dir.path().join("README.txt"), "ignored").unwrap();

        let index = MapFileIndex::load_dir(dir.path()).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.resolve("SPY", d(2020, 1, 2)).unwrap().name, "spy");
    }

    #[test]
    fn loads_latest_zip_archive_when_no_csv_files() {
        let dir = tempfile::tempdir().unwrap();

        let write_zip = |name: &str, entry: &str, body: &str| {
            let file = std::fs::File::create(dir.path().join(name)).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            zip.start_file(entry, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(body.as_bytes()).unwrap();
            zip.finish().unwrap();
        };
        write_zip("map_files_20200101.zip", "map_files/old.csv", "20000103,old\n");
        write_zip("map_files_20230101.zip", "map_files/aapl.csv", "19801212,aapl,Q\n20501231,aapl,Q\n");

        let index = MapFileIndex::load_dir(dir.path()).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.resolve("AAPL", d(2020, 1, 2)).unwrap().name, "aapl");
        assert!(index.resolve("OLD", d(2000, 1, 3)).is_none());
    }

    #[test]
    fn empty_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(MapFileIndex::load_dir(dir.path()).is_err());
    }

    #[test]
    fn map_files_without_rows_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blank.csv"), "\n\n").unwrap();

        let err = MapFileIndex::load_dir(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("no rows"), "{err:#}");
    }
}
