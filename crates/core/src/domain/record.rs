use crate::identifier::SecurityIdentifier;
use chrono::NaiveDate;
use serde_json::Number;

/// One day of follower data for one ticker.
///
/// Percent changes keep the vendor's JSON number so they are written back without re-rounding.
/// `None` means the vendor sent `null` (or a non-finite value).
#[derive(Debug, Clone, PartialEq)]
pub struct EngagementRecord {
    pub ticker: String,
    pub date: NaiveDate,
    pub followers: i64,
    pub pct_change_day: Option<Number>,
    pub pct_change_week: Option<Number>,
    pub pct_change_month: Option<Number>,
}

impl EngagementRecord {
    /// `YYYYMMDD`, the date key used by both output formats.
    pub fn date_key(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    /// `followers,pct_day,pct_week,pct_month`
    pub fn info(&self) -> String {
        format!(
            "{},{},{},{}",
            self.followers,
            fmt_pct(&self.pct_change_day),
            fmt_pct(&self.pct_change_week),
            fmt_pct(&self.pct_change_month)
        )
    }

    /// Row of the per-ticker history file.
    pub fn ticker_line(&self) -> String {
        format!("{},{}", self.date_key(), self.info())
    }

    /// Row of the per-date universe file.
    pub fn universe_line(&self, sid: &SecurityIdentifier) -> String {
        format!("{sid},{},{}", self.ticker, self.info())
    }
}

fn fmt_pct(v: &Option<Number>) -> String {
    match v {
        None => String::new(),
        Some(n) => match n.as_f64() {
            Some(f) if n.is_f64() => fmt_float(f),
            _ => n.to_string(),
        },
    }
}

/// Shortest round-trip float text: positional for exponents in `-4..16` with at least one
/// fractional digit (`5.0`), otherwise `1.5e-07` / `1e+16` style.
fn fmt_float(f: f64) -> String {
    let sci = format!("{f:e}");
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or_default()),
        None => return sci,
    };

    if (-4..16).contains(&exp) {
        let plain = f.to_string();
        if plain.contains('.') {
            plain
        } else {
            format!("{plain}.0")
        }
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: Option<f64>) -> EngagementRecord {
        EngagementRecord {
            ticker: "AAPL".to_string(),
            date: NaiveDate::from_ymd_opt(2020, 5, 8).unwrap(),
            followers: 100,
            pct_change_day: day.and_then(Number::from_f64),
            pct_change_week: Number::from_f64(0.2),
            pct_change_month: Some(Number::from(3)),
        }
    }

    #[test]
    fn formats_ticker_line() {
        assert_eq!(record(Some(0.1)).ticker_line(), "20200508,100,0.1,0.2,3");
    }

    #[test]
    fn missing_pct_is_an_empty_field() {
        assert_eq!(record(None).ticker_line(), "20200508,100,,0.2,3");
    }

    #[test]
    fn formats_universe_line() {
        let sid = SecurityIdentifier::generate_equity(
            "AAPL",
            "usa",
            NaiveDate::from_ymd_opt(1998, 1, 2).unwrap(),
        )
        .unwrap();
        assert_eq!(
            record(Some(0.1)).universe_line(&sid),
            format!("{sid},AAPL,100,0.1,0.2,3")
        );
    }

    #[test]
    fn float_text_switches_to_exponent_outside_normal_range() {
        assert_eq!(fmt_float(0.0001), "0.0001");
        assert_eq!(fmt_float(0.00001), "1e-05");
        assert_eq!(fmt_float(-1.5e-7), "-1.5e-07");
        assert_eq!(fmt_float(1e15), "1000000000000000.0");
        assert_eq!(fmt_float(1e16), "1e+16");
        assert_eq!(fmt_float(2.5e100), "2.5e+100");
        assert_eq!(fmt_float(5.0), "5.0");
        assert_eq!(fmt_float(0.0), "0.0");
    }

    #[test]
    fn integer_pct_keeps_integer_text() {
        let mut rec = record(Some(0.00001));
        rec.pct_change_week = Some(Number::from(-7));
        assert_eq!(rec.ticker_line(), "20200508,100,1e-05,-7,3");
    }
}
