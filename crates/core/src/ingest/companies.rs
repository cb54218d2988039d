use crate::domain::company::Company;
use crate::ingest::provider::VendorTransport;
use crate::ingest::types::VendorCompany;
use anyhow::{Context, Result};

/// Fetches the vendor's company catalog. Any failure here is fatal for the run.
pub async fn list_companies(transport: &dyn VendorTransport) -> Result<Vec<Company>> {
    let res = transport
        .get(&["companies"])
        .await
        .context("company list request failed")?;

    anyhow::ensure!(
        res.status.is_success(),
        "company list HTTP {}: {}",
        res.status,
        res.body.chars().take(200).collect::<String>()
    );

    let raw = serde_json::from_str::<Vec<VendorCompany>>(&res.body)
        .context("failed to parse company list")?;

    Ok(prepare_companies(raw))
}

/// Drops blank tickers, normalizes defunct tickers, then sorts and deduplicates on the
/// normalized ticker. Among entries sharing a normalized ticker the lowest vendor ticker is kept,
/// so a live `ABC` wins over `ABC-DEFUNCT-1`.
pub fn prepare_companies(raw: Vec<VendorCompany>) -> Vec<Company> {
    let mut entries: Vec<(String, Option<String>)> = Vec::with_capacity(raw.len());
    let mut missing: usize = 0;
    for c in raw {
        match c.ticker.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            Some(t) => entries.push((t, c.name)),
            None => missing += 1,
        }
    }
    if missing > 0 {
        tracing::warn!(missing, "company list entries without a ticker were dropped");
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out: Vec<Company> = Vec::with_capacity(entries.len());
    for (vendor_ticker, name) in entries {
        match Company::new(vendor_ticker.as_str()) {
            Some(company) => out.push(company.with_name(name)),
            None => {
                tracing::error!(
                    ticker = %vendor_ticker,
                    "defunct ticker is unable to be parsed; skipping"
                );
            }
        }
    }

    // Stable: equal tickers keep vendor-ticker order.
    out.sort_by(|a, b| a.ticker.cmp(&b.ticker));
    out.dedup_by(|dup, kept| {
        let same = dup.ticker == kept.ticker;
        if same {
            tracing::warn!(
                ticker = %kept.ticker,
                kept = %kept.vendor_ticker,
                dropped = %dup.vendor_ticker,
                "duplicate company after ticker normalization"
            );
        }
        same
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: serde_json::Value) -> Vec<VendorCompany> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn sorts_by_ticker() {
        let companies = prepare_companies(raw(json!([
            {"Ticker": "B", "Name": "Bee"},
            {"Ticker": "A", "Name": "Ay"}
        ])));
        let tickers: Vec<_> = companies.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(tickers, ["A", "B"]);
        assert_eq!(companies[0].name.as_deref(), Some("Ay"));
    }

    #[test]
    fn drops_missing_and_duplicate_tickers() {
        let companies = prepare_companies(raw(json!([
            {"Ticker": "MSFT"},
            {"Ticker": null},
            {"Name": "No ticker"},
            {"Ticker": "  "},
            {"Ticker": "MSFT"},
            {"Ticker": "AAPL"}
        ])));
        let tickers: Vec<_> = companies.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(tickers, ["AAPL", "MSFT"]);
    }

    #[test]
    fn normalizes_and_skips_defunct_tickers() {
        let companies = prepare_companies(raw(json!([
            {"Ticker": "ZZZ-DEFUNCT-12"},
            {"Ticker": "BADDEFUNCT"},
            {"Ticker": "CCC"}
        ])));
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[0].ticker, "CCC");
        assert_eq!(companies[1].vendor_ticker, "ZZZ-DEFUNCT-12");
        assert_eq!(companies[1].ticker, "ZZZ");
    }

    #[test]
    fn live_ticker_wins_over_its_defunct_namesake() {
        let companies = prepare_companies(raw(json!([
            {"Ticker": "ABC-DEFUNCT-1", "Name": "Old Abc"},
            {"Ticker": "ABB"},
            {"Ticker": "ABC", "Name": "Abc"}
        ])));
        let tickers: Vec<_> = companies.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(tickers, ["ABB", "ABC"]);
        assert_eq!(companies[1].vendor_ticker, "ABC");
        assert_eq!(companies[1].name.as_deref(), Some("Abc"));
    }
}
