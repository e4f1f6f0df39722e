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

//! Canned data.gov.sg responses and an in-memory [`ReadingSource`] for tests.
//!
//! Response shape:
//!
//! ```text
//! metadata.stations[]       - id, device_id (some responses only have one), name, location
//! metadata.reading_type     - e.g. "DBT 1M F"
//! metadata.reading_unit     - e.g. "deg C" or "mm"
//! items[].timestamp         - RFC 3339 with a +08:00 offset
//! items[].readings[]        - station_id, value (stations with no report are left out)
//! ```

use crate::client::{DailyResponse, FetchError, ReadingSource};
use crate::model::{DailyPayload, DataKind, Station};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Two timestamps, only S1 reports and only S1 is listed as a station.
pub(crate) fn fixture_air_temperature_day_one() -> &'static str {
    r#"{
      "metadata": {
        "stations": [
          { "id": "S1", "device_id": "S1", "name": "Station One",
            "location": { "latitude": 1.3764, "longitude": 103.8492 } }
        ],
        "reading_type": "DBT 1M F",
        "reading_unit": "deg C"
      },
      "items": [
        { "timestamp": "2023-01-01T00:00:00+08:00",
          "readings": [ { "station_id": "S1", "value": 26.1 } ] },
        { "timestamp": "2023-01-01T00:01:00+08:00",
          "readings": [ { "station_id": "S1", "value": 26.0 } ] }
      ],
      "api_info": { "status": "healthy" }
    }"#
}

/// One timestamp where both stations report. S2 is listed with only a `device_id`.
pub(crate) fn fixture_air_temperature_day_two() -> &'static str {
    r#"{
      "metadata": {
        "stations": [
          { "id": "S1", "device_id": "S1", "name": "Station One",
            "location": { "latitude": 1.3764, "longitude": 103.8492 } },
          { "device_id": "S2", "name": "Station Two",
            "location": { "latitude": 1.3337, "longitude": 103.7768 } }
        ],
        "reading_type": "DBT 1M F",
        "reading_unit": "deg C"
      },
      "items": [
        { "timestamp": "2023-01-02T00:00:00+08:00",
          "readings": [
            { "station_id": "S1", "value": 25.4 },
            { "station_id": "S2", "value": 24.9 }
          ] }
      ],
      "api_info": { "status": "healthy" }
    }"#
}

/// Rainfall with a real zero for S1 and an explicit null for S2.
pub(crate) fn fixture_rainfall_with_null() -> &'static str {
    r#"{
      "metadata": {
        "stations": [
          { "id": "S1", "device_id": "S1", "name": "Station One" },
          { "id": "S2", "device_id": "S2", "name": "Station Two" }
        ],
        "reading_type": "TB1 Rainfall 5 Minute Total F",
        "reading_unit": "mm"
      },
      "items": [
        { "timestamp": "2023-01-01T00:05:00+08:00",
          "readings": [
            { "station_id": "S1", "value": 0 },
            { "station_id": "S2", "value": null }
          ] }
      ],
      "api_info": { "status": "healthy" }
    }"#
}

/// Source backed by canned response bodies, one per date. Dates without a body
/// fail to parse the same way an API error would.
#[derive(Debug, Default)]
pub(crate) struct FakeSource {
    days: HashMap<NaiveDate, &'static str>,
    delays: HashMap<NaiveDate, Duration>,
    calls: Mutex<Vec<NaiveDate>>,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_day(mut self, date: NaiveDate, body: &'static str) -> Self {
        self.days.insert(date, body);
        self
    }

    pub(crate) fn with_delay(mut self, date: NaiveDate, delay: Duration) -> Self {
        self.delays.insert(date, delay);
        self
    }

    /// Dates requested so far, in request order.
    pub(crate) fn calls(&self) -> Vec<NaiveDate> {
        self.calls.lock().unwrap().clone()
    }

    async fn response(&self, date: NaiveDate, kind: DataKind) -> Result<DailyResponse, FetchError> {
        self.calls.lock().unwrap().push(date);
        if let Some(d) = self.delays.get(&date) {
            tokio::time::sleep(*d).await;
        }

        DailyResponse::parse(self.days.get(&date).copied().unwrap_or(""), date, kind)
    }
}

impl ReadingSource for FakeSource {
    async fn readings(&self, date: NaiveDate, kind: DataKind) -> Result<Vec<DailyPayload>, FetchError> {
        Ok(self.response(date, kind).await?.into_payloads(kind))
    }

    async fn stations(&self, date: NaiveDate, kind: DataKind) -> Result<Vec<Station>, FetchError> {
        Ok(self.response(date, kind).await?.metadata.stations)
    }
}

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
