use crate::domain::record::EngagementRecord;
use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Number;

#[derive(Debug, Clone, Deserialize)]
pub struct VendorCompany {
    #[serde(rename = "Ticker", default)]
    pub ticker: Option<String>,

    #[serde(rename = "Name", default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VendorFollowerRow {
    #[serde(rename = "Date")]
    pub date: String,

    #[serde(rename = "Followers")]
    pub followers: i64,

    #[serde(default, alias = "pct_change_daily")]
    pub pct_change_day: Option<Number>,

    #[serde(default)]
    pub pct_change_week: Option<Number>,

    #[serde(default, alias = "pct_change")]
    pub pct_change_month: Option<Number>,
}

impl VendorFollowerRow {
    pub fn into_record(self, ticker: &str) -> anyhow::Result<EngagementRecord> {
        // Some payloads carry a time component ("2020-05-08T00:00:00").
        let day = match self.date.split_once('T') {
            Some((day, _)) => day,
            None => self.date.as_str(),
        };
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .with_context(|| format!("invalid Date: {}", self.date))?;

        Ok(EngagementRecord {
            ticker: ticker.to_string(),
            date,
            followers: self.followers,
            pct_change_day: self.pct_change_day,
            pct_change_week: self.pct_change_week,
            pct_change_month: self.pct_change_month,
        })
    }
}
