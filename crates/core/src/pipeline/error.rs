use chrono::NaiveDate;
use std::fmt;

/// Why a single per-ticker attempt failed. Every variant is retried.
#[derive(Debug)]
pub enum AttemptError {
    Transport(anyhow::Error),
    Malformed { detail: String },
    Identifier { date: NaiveDate, source: anyhow::Error },
    Write(anyhow::Error),
}

impl AttemptError {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Malformed { .. } => "malformed",
            Self::Identifier { .. } => "identifier",
            Self::Write(_) => "write",
        }
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "request failed: {err:#}"),
            Self::Malformed { detail } => write!(f, "malformed payload: {detail}"),
            Self::Identifier { date, source } => {
                write!(f, "identifier resolution failed for {date}: {source:#}")
            }
            Self::Write(err) => write!(f, "write failed: {err:#}"),
        }
    }
}

impl std::error::Error for AttemptError {}
