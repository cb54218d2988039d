/// A company covered by the vendor, as processed by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    /// Ticker exactly as the vendor lists it.
    pub vendor_ticker: String,

    /// Ticker with any defunct suffix stripped. Used for the history lookup, output files,
    /// universe rows and identifier resolution.
    pub ticker: String,

    pub name: Option<String>,
}

impl Company {
    pub fn new(vendor_ticker: impl Into<String>) -> Option<Self> {
        let vendor_ticker = vendor_ticker.into();
        let ticker = normalize_defunct_ticker(&vendor_ticker)?;
        Some(Self {
            vendor_ticker,
            ticker,
            name: None,
        })
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Output file stem for the per-ticker history file.
    pub fn file_stem(&self) -> String {
        self.ticker.to_lowercase()
    }
}

const DEFUNCT_MARKER: &str = "defunct";
const DEFUNCT_DELIMITERS: [char; 2] = ['-', '_'];

/// Strips a vendor "defunct" suffix (e.g. `ABC-DEFUNCT-1234`) from a ticker.
///
/// Tickers without the marker are returned unchanged. Returns `None` when the marker is present
/// but no delimiter precedes the real ticker.
pub fn normalize_defunct_ticker(ticker: &str) -> Option<String> {
    let lower = ticker.to_ascii_lowercase();
    match lower.find(DEFUNCT_MARKER) {
        Some(pos) if pos > 0 => {}
        _ => return Some(ticker.to_string()),
    }

    for delim in DEFUNCT_DELIMITERS {
        if let Some(end) = ticker.find(delim) {
            let base = ticker[..end].trim();
            if base.is_empty() {
                return None;
            }
            return Some(base.to_string());
        }
    }

    None
}
