// nea_scraper - Extract data.gov.sg weather station readings to CSV
//
// Copyright 2024 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

//! Runs a full extraction: fetch every day in a range, fill in missing readings, pick out
//! one station and convert its timestamps to Singapore time.
//!
//! A run moves through each [`Stage`] in order. Any error ends the run and is reported as
//! a [`PipelineError`] that records the stage it happened in. Nothing is written to disk
//! here, output is up to the caller once a run is complete.

use crate::client::{FetchError, ReadingSource};
use crate::model::{DailyPayload, DataKind, StationSet};
use crate::normalize::normalize_all;
use crate::range::{fetch_range, fetch_stations};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Asia::Singapore;
use std::error;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CollectingRange,
    NormalizingReadings,
    SelectingStation,
    ConvertingTimezone,
    Complete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CollectingRange => "collecting range",
            Self::NormalizingReadings => "normalizing readings",
            Self::SelectingStation => "selecting station",
            Self::ConvertingTimezone => "converting timezone",
            Self::Complete => "complete",
        })
    }
}

#[derive(Debug)]
pub enum PipelineErrorKind {
    EmptyRange,
    Fetch(FetchError),
    UnknownStation(String),
}

impl fmt::Display for PipelineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRange => write!(f, "no dates to extract"),
            Self::Fetch(e) => write!(f, "{}", e),
            Self::UnknownStation(s) => write!(f, "unknown station {}", s),
        }
    }
}

#[derive(Debug)]
pub struct PipelineError {
    stage: Stage,
    kind: PipelineErrorKind,
}

impl PipelineError {
    fn new(stage: Stage, kind: PipelineErrorKind) -> Self {
        PipelineError { stage, kind }
    }

    /// Stage the run was in when it failed.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn kind(&self) -> &PipelineErrorKind {
        &self.kind
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "extraction failed while {}: {}", self.stage, self.kind)
    }
}

impl error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.kind {
            PipelineErrorKind::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

/// Everything a single run needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub kind: DataKind,
    pub dates: Vec<NaiveDate>,
    pub pace: Duration,
}

/// All readings and stations for a date range, before a station has been picked.
#[derive(Debug, Clone)]
pub struct Collection {
    config: RunConfig,
    first_date: NaiveDate,
    last_date: NaiveDate,
    payloads: Vec<DailyPayload>,
    stations: StationSet,
}

impl Collection {
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn payloads(&self) -> &[DailyPayload] {
        &self.payloads
    }

    /// Every station seen in any day of the range.
    pub fn stations(&self) -> &StationSet {
        &self.stations
    }

    /// Build the table of readings for a single station, one row per timestamp.
    pub fn extract(&self, station_id: &str) -> Result<ExtractedTable, PipelineError> {
        let station_id = station_id.trim();

        tracing::debug!(message = "pipeline stage", stage = %Stage::NormalizingReadings);
        let normalized = normalize_all(&self.payloads, &self.stations);

        tracing::debug!(message = "pipeline stage", stage = %Stage::SelectingStation, station = %station_id);
        if !self.stations.contains(station_id) {
            return Err(PipelineError::new(
                Stage::SelectingStation,
                PipelineErrorKind::UnknownStation(station_id.to_owned()),
            ));
        }

        // Rows are matched by station within each payload rather than by position
        // so that each value stays with its own timestamp.
        let selected: Vec<_> = normalized
            .iter()
            .filter_map(|p| p.reading(station_id).map(|r| (p, r)))
            .collect();

        tracing::debug!(message = "pipeline stage", stage = %Stage::ConvertingTimezone, rows = selected.len());
        let rows = selected
            .into_iter()
            .map(|(p, r)| ExtractedRow {
                timestamp: to_local(p.timestamp),
                station_id: r.station_id.clone(),
                value: r.value,
                reading_type: p.reading_type.clone(),
                reading_unit: p.reading_unit.clone(),
            })
            .collect::<Vec<_>>();

        tracing::info!(
            message = "pipeline stage",
            stage = %Stage::Complete,
            station = %station_id,
            rows = rows.len(),
            missing = rows.iter().filter(|r| r.value.is_none()).count(),
        );

        Ok(ExtractedTable {
            kind: self.config.kind,
            station_id: station_id.to_owned(),
            first_date: self.first_date,
            last_date: self.last_date,
            rows,
        })
    }
}

/// Fetch readings and stations for every date in the configured range.
pub async fn collect<S>(source: &S, config: &RunConfig) -> Result<Collection, PipelineError>
where
    S: ReadingSource,
{
    tracing::debug!(message = "pipeline stage", stage = %Stage::CollectingRange, dates = config.dates.len());
    let (first_date, last_date) = match (config.dates.first(), config.dates.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(PipelineError::new(Stage::CollectingRange, PipelineErrorKind::EmptyRange)),
    };

    let fetch_err = |e| PipelineError::new(Stage::CollectingRange, PipelineErrorKind::Fetch(e));
    let payloads = fetch_range(source, &config.dates, config.kind, config.pace)
        .await
        .map_err(fetch_err)?;
    let stations = fetch_stations(source, &config.dates, config.kind, config.pace)
        .await
        .map_err(fetch_err)?;

    Ok(Collection {
        config: config.clone(),
        first_date,
        last_date,
        payloads,
        stations,
    })
}

/// Collect and extract in one go for a station picked ahead of time.
pub async fn run<S>(source: &S, config: &RunConfig, station_id: &str) -> Result<ExtractedTable, PipelineError>
where
    S: ReadingSource,
{
    collect(source, config).await?.extract(station_id)
}

/// Singapore wall clock time for a UTC timestamp. Singapore is UTC+8 with no DST.
pub fn to_local(timestamp: DateTime<Utc>) -> NaiveDateTime {
    timestamp.with_timezone(&Singapore).naive_local()
}

/// Readings for a single station over a date range, ready to be written out.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTable {
    pub kind: DataKind,
    pub station_id: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub rows: Vec<ExtractedRow>,
}

impl ExtractedTable {
    /// Name of the CSV file for this table, `nea_<kind>_<station>_from_<first>_to_<last>.csv`.
    pub fn file_name(&self) -> String {
        format!(
            "nea_{}_{}_from_{}_to_{}.csv",
            self.kind, self.station_id, self.first_date, self.last_date
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRow {
    pub timestamp: NaiveDateTime,
    pub station_id: String,
    pub value: Option<f64>,
    pub reading_type: Option<String>,
    pub reading_unit: Option<String>,
}
