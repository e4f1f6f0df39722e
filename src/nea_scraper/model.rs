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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use std::error;
use std::fmt;
use std::str::FromStr;

/// Type of reading to request from the API, each kind has its own endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    AirTemperature,
    Rainfall,
}

impl DataKind {
    pub const ALL: [DataKind; 2] = [DataKind::AirTemperature, DataKind::Rainfall];

    /// Path segment of the endpoint for this kind of reading, also used in output file names.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::AirTemperature => "air-temperature",
            Self::Rainfall => "rainfall",
        }
    }

    /// Number used to pick this kind from the interactive menu.
    pub fn choice(&self) -> u8 {
        match self {
            Self::AirTemperature => 1,
            Self::Rainfall => 2,
        }
    }

    /// Name shown in the interactive menu.
    pub fn description(&self) -> &'static str {
        match self {
            Self::AirTemperature => "air temperature",
            Self::Rainfall => "rainfall",
        }
    }
}

impl DataKind {
    /// Every kind with its menu number, e.g. `1. air temperature 2. rainfall`.
    pub fn menu() -> String {
        DataKind::ALL
            .iter()
            .map(|k| format!("{}. {}", k.choice(), k.description()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

impl FromStr for DataKind {
    type Err = UnsupportedDataKind;

    /// Parse either a menu choice (`1`, `2`) or an endpoint name (`air-temperature`, `rainfall`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        DataKind::ALL
            .into_iter()
            .find(|k| s == k.choice().to_string() || s.eq_ignore_ascii_case(k.endpoint()))
            .ok_or_else(|| UnsupportedDataKind(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedDataKind(pub String);

impl fmt::Display for UnsupportedDataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported data kind '{}', choose 1 (air temperature) or 2 (rainfall)", self.0)
    }
}

impl error::Error for UnsupportedDataKind {}

/// A single station value at a point in time. `value` is `None` when the station
/// did not report anything for the timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub station_id: String,
    pub value: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub kind: DataKind,
}

impl Reading {
    pub fn missing<S: Into<String>>(station_id: S, timestamp: DateTime<Utc>, kind: DataKind) -> Self {
        Reading {
            station_id: station_id.into(),
            value: None,
            timestamp,
            kind,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.value.is_none()
    }
}

/// Every station reading the API returned for one timestamp, along with metadata
/// from the response that is passed through to the output.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPayload {
    pub timestamp: DateTime<Utc>,
    pub kind: DataKind,
    pub readings: Vec<Reading>,
    pub reading_type: Option<String>,
    pub reading_unit: Option<String>,
}

impl DailyPayload {
    /// Reading for the given station, if this payload has one.
    pub fn reading(&self, station_id: &str) -> Option<&Reading> {
        self.readings.iter().find(|r| r.station_id == station_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Station {
    #[serde(alias = "id", default)]
    pub id: String,
    #[serde(alias = "device_id", default)]
    pub device_id: String,
    #[serde(alias = "name")]
    pub name: Option<String>,
    #[serde(alias = "location")]
    pub location: Option<Location>,
}

impl Station {
    /// Identifier that readings refer to this station by. Some responses leave out `id`,
    /// in which case `device_id` is the same value.
    pub fn key(&self) -> &str {
        if self.id.is_empty() {
            &self.device_id
        } else {
            &self.id
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Location {
    #[serde(alias = "latitude")]
    pub latitude: f64,
    #[serde(alias = "longitude")]
    pub longitude: f64,
}

/// Stations seen across one or more responses, keyed and ordered by station ID.
///
/// Stations come and go between days so the set of stations expected in a date range
/// is built by calling [`StationSet::union`] with the stations of each day. When a
/// station is seen more than once, the metadata seen first is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationSet {
    stations: BTreeMap<String, Station>,
}

impl StationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a station, returning `false` if it was already present or has no usable ID.
    pub fn insert(&mut self, station: Station) -> bool {
        let key = station.key().trim();
        if key.is_empty() {
            tracing::debug!(message = "ignoring station without an ID", station = ?station);
            return false;
        }

        match self.stations.entry(key.to_owned()) {
            btree_map::Entry::Occupied(_) => false,
            btree_map::Entry::Vacant(e) => {
                e.insert(station);
                true
            }
        }
    }

    pub fn union<I>(&mut self, stations: I)
    where
        I: IntoIterator<Item = Station>,
    {
        for s in stations {
            self.insert(s);
        }
    }

    pub fn contains(&self, station_id: &str) -> bool {
        self.stations.contains_key(station_id)
    }

    pub fn get(&self, station_id: &str) -> Option<&Station> {
        self.stations.get(station_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.stations.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

impl FromIterator<Station> for StationSet {
    fn from_iter<T: IntoIterator<Item = Station>>(iter: T) -> Self {
        let mut set = StationSet::new();
        set.union(iter);
        set
    }
}
