use crate::domain::company::Company;
use crate::domain::record::EngagementRecord;
use crate::identifier::IdentifierResolver;
use crate::pipeline::error::AttemptError;
use crate::storage::ticker_file::write_ticker_file;
use crate::storage::universe::append_universe_line;
use crate::storage::OutputLayout;

/// Writes one ticker's records to its history file and, when enabled, to the per-date universe
/// files.
///
/// Universe rows are appended as records are iterated and are not rolled back if the attempt
/// fails later; a retried attempt can therefore duplicate rows for the same ticker and date.
pub struct DualSink<'a> {
    layout: &'a OutputLayout,
    universe: Option<UniverseSink<'a>>,
}

struct UniverseSink<'a> {
    resolver: &'a dyn IdentifierResolver,
    market: &'a str,
}

impl<'a> DualSink<'a> {
    pub fn new(layout: &'a OutputLayout) -> Self {
        Self {
            layout,
            universe: None,
        }
    }

    pub fn with_universe(mut self, resolver: &'a dyn IdentifierResolver, market: &'a str) -> Self {
        self.universe = Some(UniverseSink { resolver, market });
        self
    }

    pub fn universe_enabled(&self) -> bool {
        self.universe.is_some()
    }

    /// `records` must be non-empty and sorted by date. Returns the number of rows written.
    pub fn write(
        &self,
        company: &Company,
        records: &[EngagementRecord],
    ) -> Result<usize, AttemptError> {
        let mut lines = Vec::with_capacity(records.len());

        for record in records {
            lines.push(record.ticker_line());

            if let Some(universe) = &self.universe {
                let sid = universe
                    .resolver
                    .resolve(&company.ticker, universe.market, record.date)
                    .map_err(|source| AttemptError::Identifier {
                        date: record.date,
                        source,
                    })?;

                append_universe_line(self.layout, record.date, &record.universe_line(&sid))
                    .map_err(AttemptError::Write)?;
            }
        }

        write_ticker_file(self.layout, &company.file_stem(), &lines)
            .map_err(AttemptError::Write)?;

        Ok(lines.len())
    }
}
