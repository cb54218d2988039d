use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub mod map_file;

// Packed property layout (least significant first):
//   security type (2 digits) | market (3) | strike scale (2) | strike (6) | option style (1) | days (5)
// Equities only use security type, market and days.
const SECURITY_TYPE_WIDTH: u64 = 100;
const SECURITY_TYPE_OFFSET: u64 = 1;
const MARKET_WIDTH: u64 = 1_000;
const MARKET_OFFSET: u64 = SECURITY_TYPE_OFFSET * SECURITY_TYPE_WIDTH;
const DAYS_WIDTH: u64 = 100_000;
const DAYS_OFFSET: u64 = 100_000_000_000_000;

const SECURITY_TYPE_EQUITY: u64 = 1;

const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Identifier date used when a ticker has no map file.
pub fn default_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1998, 1, 2).unwrap_or_default()
}

// Day zero of the OLE automation calendar.
fn ole_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

pub fn market_code(market: &str) -> Option<u64> {
    match market.trim().to_ascii_lowercase().as_str() {
        "usa" => Some(1),
        "fxcm" => Some(2),
        "oanda" => Some(3),
        "dukascopy" => Some(4),
        "bitfinex" => Some(5),
        _ => None,
    }
}

/// Location of the ticker history (map file) dataset for a market.
pub fn map_files_dir(data_folder: &Path, market: &str) -> PathBuf {
    data_folder
        .join("equity")
        .join(market.to_ascii_lowercase())
        .join("map_files")
}

/// Stable identifier of a tradeable instrument: the symbol it first traded under plus packed
/// properties (security type, market, first date). Rendered as `SYMBOL BASE36`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecurityIdentifier {
    symbol: String,
    properties: u64,
}

impl SecurityIdentifier {
    pub fn generate_equity(symbol: &str, market: &str, date: NaiveDate) -> Result<Self> {
        let symbol = symbol.trim().to_ascii_uppercase();
        anyhow::ensure!(!symbol.is_empty(), "security identifier symbol must be non-empty");
        anyhow::ensure!(
            !symbol.contains(|c: char| c == ' ' || c == ','),
            "security identifier symbol must not contain spaces or commas: {symbol}"
        );

        let market_code = market_code(market).with_context(|| format!("unknown market: {market}"))?;

        let days = date.signed_duration_since(ole_epoch()).num_days();
        anyhow::ensure!(
            (0..DAYS_WIDTH as i64).contains(&days),
            "date {date} cannot be encoded in a security identifier"
        );

        let properties = SECURITY_TYPE_EQUITY * SECURITY_TYPE_OFFSET
            + market_code * MARKET_OFFSET
            + (days as u64) * DAYS_OFFSET;

        Ok(Self { symbol, properties })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn security_type(&self) -> u64 {
        (self.properties / SECURITY_TYPE_OFFSET) % SECURITY_TYPE_WIDTH
    }

    pub fn market_code(&self) -> u64 {
        (self.properties / MARKET_OFFSET) % MARKET_WIDTH
    }

    pub fn date(&self) -> Option<NaiveDate> {
        let days = (self.properties / DAYS_OFFSET) % DAYS_WIDTH;
        ole_epoch().checked_add_days(Days::new(days))
    }

    pub fn parse(s: &str) -> Result<Self> {
        let (symbol, encoded) = s
            .trim()
            .split_once(' ')
            .with_context(|| format!("security identifier must be 'SYMBOL PROPERTIES': {s}"))?;
        anyhow::ensure!(!symbol.is_empty(), "security identifier symbol must be non-empty");
        // Derivative identifiers carry an underlying after '|'; only the head is decoded.
        let encoded = encoded.split('|').next().unwrap_or_default();
        let properties = decode_base36(encoded)?;
        Ok(Self {
            symbol: symbol.to_string(),
            properties,
        })
    }
}

impl fmt::Display for SecurityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.symbol, encode_base36(self.properties))
    }
}

impl FromStr for SecurityIdentifier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Resolves the identifier of a ticker as of a date.
pub trait IdentifierResolver: Send + Sync {
    fn resolve(&self, ticker: &str, market: &str, date: NaiveDate) -> Result<SecurityIdentifier>;
}

fn encode_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::with_capacity(13);
    while value != 0 {
        out.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn decode_base36(s: &str) -> Result<u64> {
    anyhow::ensure!(!s.is_empty(), "empty base36 value");
    let mut value: u64 = 0;
    for c in s.chars() {
        let digit = c
            .to_digit(36)
            .with_context(|| format!("invalid base36 digit '{c}' in {s}"))?;
        value = value
            .checked_mul(36)
            .and_then(|v| v.checked_add(digit as u64))
            .with_context(|| format!("base36 value overflows: {s}"))?;
    }
    Ok(value)
}
