use crate::domain::company::Company;
use crate::identifier::IdentifierResolver;
use crate::ingest::companies::list_companies;
use crate::ingest::outcome::{classify_history, FetchOutcome};
use crate::ingest::provider::VendorTransport;
use crate::storage::OutputLayout;
use anyhow::Context;
use std::time::Instant;

pub mod config;
pub mod error;
pub mod sink;

pub use config::PipelineConfig;
use error::AttemptError;
use sink::DualSink;

/// Final state of one ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerStatus {
    Written { rows: usize },
    NoData,
    Abandoned,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub companies: usize,
    pub written: usize,
    pub no_data: usize,
    pub abandoned: usize,
}

impl RunStats {
    fn record(&mut self, status: TickerStatus) {
        match status {
            TickerStatus::Written { .. } => self.written += 1,
            TickerStatus::NoData => self.no_data += 1,
            TickerStatus::Abandoned => self.abandoned += 1,
        }
    }
}

enum AttemptResult {
    Written { rows: usize },
    NoData,
}

/// Sequential company → history → files pipeline.
pub struct Pipeline<'a> {
    transport: &'a dyn VendorTransport,
    resolver: Option<&'a dyn IdentifierResolver>,
    config: PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(transport: &'a dyn VendorTransport, config: PipelineConfig) -> Self {
        Self {
            transport,
            resolver: None,
            config,
        }
    }

    /// Enables universe files. Without a resolver only per-ticker files are written.
    pub fn with_resolver(mut self, resolver: &'a dyn IdentifierResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Runs to completion. Only output setup and the company list can fail the run; per-ticker
    /// failures are logged and counted.
    pub async fn run(&self) -> anyhow::Result<RunStats> {
        let started = Instant::now();

        let layout = OutputLayout::prepare(&self.config.destination)?;

        let companies = list_companies(self.transport)
            .await
            .with_context(|| format!("failed to list {} companies", self.transport.vendor_name()))?;
        tokio::time::sleep(self.config.request_delay).await;

        let mut sink = DualSink::new(&layout);
        if let Some(resolver) = self.resolver {
            sink = sink.with_universe(resolver, &self.config.market);
        }

        let total = companies.len();
        tracing::info!(
            total,
            dataset = %self.config.dataset,
            universe = sink.universe_enabled(),
            destination = %layout.root.display(),
            "start processing companies"
        );

        let mut stats = RunStats {
            companies: total,
            ..RunStats::default()
        };

        for (idx, company) in companies.iter().enumerate() {
            let status = self.process_company(company, &sink).await;
            stats.record(status);

            let every = self.config.progress_every;
            if every != 0 {
                let n = idx + 1;
                if n == 1 || n == total || n % every == 0 {
                    tracing::info!(
                        processed = n,
                        total,
                        written = stats.written,
                        no_data = stats.no_data,
                        abandoned = stats.abandoned,
                        "progress"
                    );
                }
            }
        }

        tracing::info!(
            elapsed = ?started.elapsed(),
            written = stats.written,
            no_data = stats.no_data,
            abandoned = stats.abandoned,
            "finished"
        );
        Ok(stats)
    }

    /// Retries one ticker up to `max_attempts` times. Never fails the run.
    pub async fn process_company(&self, company: &Company, sink: &DualSink<'_>) -> TickerStatus {
        tracing::info!(ticker = %company.ticker, "processing ticker");

        let max_attempts = self.config.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.attempt(company, sink).await {
                Ok(AttemptResult::Written { rows }) => {
                    tracing::info!(ticker = %company.ticker, rows, "finished processing ticker");
                    return TickerStatus::Written { rows };
                }
                Ok(AttemptResult::NoData) => {
                    tracing::info!(ticker = %company.ticker, "no data for ticker");
                    return TickerStatus::NoData;
                }
                Err(err) => {
                    tracing::warn!(
                        ticker = %company.ticker,
                        attempt,
                        max_attempts,
                        stage = err.stage(),
                        error = %err,
                        "failed to process ticker"
                    );
                    if attempt < max_attempts {
                        tokio::time::sleep(self.config.retry_cooldown).await;
                    }
                }
            }
        }

        tracing::error!(
            ticker = %company.ticker,
            attempts = max_attempts,
            "no attempts left; skipping ticker"
        );
        TickerStatus::Abandoned
    }

    async fn attempt(
        &self,
        company: &Company,
        sink: &DualSink<'_>,
    ) -> Result<AttemptResult, AttemptError> {
        match self.fetch_history(company).await {
            FetchOutcome::Records(records) => {
                let rows = sink.write(company, &records)?;
                Ok(AttemptResult::Written { rows })
            }
            FetchOutcome::Empty => Ok(AttemptResult::NoData),
            FetchOutcome::Malformed(detail) => Err(AttemptError::Malformed { detail }),
            FetchOutcome::Transport(err) => Err(AttemptError::Transport(err)),
        }
    }

    async fn fetch_history(&self, company: &Company) -> FetchOutcome {
        let segments = [
            "historical",
            self.config.dataset.as_str(),
            company.ticker.as_str(),
        ];

        match self.transport.get(&segments).await {
            Ok(res) => {
                tokio::time::sleep(self.config.request_delay).await;
                classify_history(&company.ticker, res.status, &res.body)
            }
            Err(err) => FetchOutcome::Transport(err),
        }
    }
}
