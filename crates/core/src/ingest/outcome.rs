use crate::domain::record::EngagementRecord;
use crate::ingest::types::VendorFollowerRow;
use reqwest::StatusCode;
use serde_json::Value;
use std::borrow::Cow;

/// Result of one history request, classified for the retry loop.
#[derive(Debug)]
pub enum FetchOutcome {
    /// At least one record, sorted ascending by date.
    Records(Vec<EngagementRecord>),
    /// The vendor has no history for the ticker.
    Empty,
    /// The response decoded to something other than a list of records.
    Malformed(String),
    /// Network failure or an unexpected HTTP status.
    Transport(anyhow::Error),
}

const BODY_SNIPPET_CHARS: usize = 200;

pub fn classify_history(ticker: &str, status: StatusCode, body: &str) -> FetchOutcome {
    if status == StatusCode::NOT_FOUND {
        return FetchOutcome::Empty;
    }
    if !status.is_success() {
        return FetchOutcome::Transport(anyhow::anyhow!(
            "vendor HTTP {status}: {}",
            snippet(body)
        ));
    }

    let cleaned = sanitize_non_finite(body);
    let value = match serde_json::from_str::<Value>(&cleaned) {
        Ok(v) => v,
        Err(err) => {
            return FetchOutcome::Malformed(format!(
                "response is not valid JSON ({err}): {}",
                snippet(body)
            ))
        }
    };

    let items = match value {
        Value::Array(items) => items,
        other => {
            return FetchOutcome::Malformed(format!(
                "expected a list of records, got {}: {}",
                json_kind(&other),
                snippet(body)
            ))
        }
    };

    if items.is_empty() {
        return FetchOutcome::Empty;
    }

    if let Some((idx, item)) = items.iter().enumerate().find(|(_, v)| !v.is_object()) {
        return FetchOutcome::Malformed(format!(
            "element {idx} is {}, not a record",
            json_kind(item)
        ));
    }

    let mut records = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let record = serde_json::from_value::<VendorFollowerRow>(item)
            .map_err(anyhow::Error::from)
            .and_then(|row| row.into_record(ticker));
        match record {
            Ok(r) => records.push(r),
            Err(err) => {
                return FetchOutcome::Malformed(format!("element {idx} is not a valid record: {err:#}"))
            }
        }
    }

    records.sort_by_key(|r| r.date);
    FetchOutcome::Records(records)
}

/// Rewrites bare `NaN`, `Infinity` and `-Infinity` tokens outside of string literals to `null`.
pub fn sanitize_non_finite(body: &str) -> Cow<'_, str> {
    if !body.contains("NaN") && !body.contains("Infinity") {
        return Cow::Borrowed(body);
    }

    let mut out = String::with_capacity(body.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = body;

    while let Some(c) = rest.chars().next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            rest = &rest[c.len_utf8()..];
            continue;
        }

        if c == '"' {
            in_string = true;
            out.push(c);
            rest = &rest[1..];
            continue;
        }

        let token = ["-Infinity", "Infinity", "NaN"]
            .into_iter()
            .find(|t| rest.starts_with(t));
        match token {
            Some(t) => {
                out.push_str("null");
                rest = &rest[t.len()..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    Cow::Owned(out)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn snippet(body: &str) -> Cow<'_, str> {
    match body.char_indices().nth(BODY_SNIPPET_CHARS) {
        Some((end, _)) => Cow::Owned(format!("{}...", &body[..end])),
        None => Cow::Borrowed(body),
    }
}
