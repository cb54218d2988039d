use crate::identifier::SecurityIdentifier;
use anyhow::{Context, Result};
use chrono::NaiveDate;

/// A parsed row of a per-ticker history file.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowerRow {
    pub date: NaiveDate,
    pub followers: i64,
    pub pct_change_day: Option<f64>,
    pub pct_change_week: Option<f64>,
    pub pct_change_month: Option<f64>,
}

impl FollowerRow {
    pub fn parse_line(line: &str) -> Result<Self> {
        let cols: Vec<&str> = line.trim_end_matches('\r').split(',').collect();
        anyhow::ensure!(
            cols.len() == 5,
            "follower row must have 5 columns (got {}): {line}",
            cols.len()
        );

        let date = NaiveDate::parse_from_str(cols[0], "%Y%m%d")
            .with_context(|| format!("invalid date in follower row: {}", cols[0]))?;

        Ok(Self {
            date,
            followers: parse_followers(cols[1])?,
            pct_change_day: parse_pct(cols[2])?,
            pct_change_week: parse_pct(cols[3])?,
            pct_change_month: parse_pct(cols[4])?,
        })
    }
}

/// A parsed row of a per-date universe file.
#[derive(Debug, Clone, PartialEq)]
pub struct UniverseRow {
    pub security_id: SecurityIdentifier,
    pub ticker: String,
    pub followers: i64,
    pub pct_change_day: Option<f64>,
    pub pct_change_week: Option<f64>,
    pub pct_change_month: Option<f64>,
}

impl UniverseRow {
    pub fn parse_line(line: &str) -> Result<Self> {
        let cols: Vec<&str> = line.trim_end_matches('\r').split(',').collect();
        anyhow::ensure!(
            cols.len() == 6,
            "universe row must have 6 columns (got {}): {line}",
            cols.len()
        );

        let security_id = cols[0]
            .parse::<SecurityIdentifier>()
            .with_context(|| format!("invalid security identifier: {}", cols[0]))?;
        let ticker = cols[1].trim();
        anyhow::ensure!(!ticker.is_empty(), "universe row ticker must be non-empty");

        Ok(Self {
            security_id,
            ticker: ticker.to_string(),
            followers: parse_followers(cols[2])?,
            pct_change_day: parse_pct(cols[3])?,
            pct_change_week: parse_pct(cols[4])?,
            pct_change_month: parse_pct(cols[5])?,
        })
    }
}

fn parse_followers(s: &str) -> Result<i64> {
    s.trim()
        .parse::<i64>()
        .with_context(|| format!("invalid follower count: {s}"))
}

fn parse_pct(s: &str) -> Result<Option<f64>> {
    let t = s.trim();
    if t.is_empty() {
        return Ok(None);
    }
    t.parse::<f64>()
        .map(Some)
        .with_context(|| format!("invalid percent change: {s}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_follower_row() {
        let row = FollowerRow::parse_line("20200508,100,0.1,0.2,0.3").unwrap();
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2020, 5, 8).unwrap());
        assert_eq!(row.followers, 100);
        assert_eq!(row.pct_change_day, Some(0.1));
        assert_eq!(row.pct_change_month, Some(0.3));
    }

    #[test]
    fn parses_follower_row_with_empty_pct_fields() {
        let row = FollowerRow::parse_line("20200101,1000,,,").unwrap();
        assert_eq!(row.followers, 1000);
        assert_eq!(row.pct_change_day, None);
        assert_eq!(row.pct_change_week, None);
        assert_eq!(row.pct_change_month, None);
    }

    #[test]
    fn rejects_short_follower_row() {
        assert!(FollowerRow::parse_line("20200508,100,0.1").is_err());
        assert!(FollowerRow::parse_line("2020-05-08,100,0.1,0.2,0.3").is_err());
    }

    #[test]
    fn parses_universe_row() {
        let row = UniverseRow::parse_line("SPY R735QTJ8XC9X,SPY,2500,-0.5,1,2.25").unwrap();
        assert_eq!(row.security_id.symbol(), "SPY");
        assert_eq!(row.ticker, "SPY");
        assert_eq!(row.followers, 2500);
        assert_eq!(row.pct_change_day, Some(-0.5));
        assert_eq!(row.pct_change_week, Some(1.0));
    }

    #[test]
    fn rejects_universe_row_with_bad_identifier() {
        assert!(UniverseRow::parse_line("SPY,SPY,2500,1,2,3").is_err());
    }
}
