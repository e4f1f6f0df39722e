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

use crate::model::{DailyPayload, Reading, StationSet};
use std::collections::HashMap;

/// Fill in a missing reading for every expected station that a payload doesn't report.
///
/// The result has exactly one reading per station: readings the payload already has are
/// kept as-is (the expected set is a floor, not a filter) and any station in `expected`
/// without a reading gets a placeholder with no value at the payload timestamp. If the
/// payload reports the same station more than once, only the first real value is kept.
///
/// With an empty `expected` set nothing is filled in, so the readings come back unchanged
/// apart from duplicates being collapsed.
pub fn normalize(payload: &DailyPayload, expected: &StationSet) -> DailyPayload {
    let mut readings: Vec<Reading> = Vec::with_capacity(payload.readings.len().max(expected.len()));
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(payload.readings.len());

    for r in payload.readings.iter() {
        match seen.get(r.station_id.as_str()) {
            Some(&i) => {
                if readings[i].is_missing() && !r.is_missing() {
                    readings[i] = r.clone();
                }
            }
            None => {
                seen.insert(r.station_id.as_str(), readings.len());
                readings.push(r.clone());
            }
        }
    }

    let reported = readings.len();
    for id in expected.ids() {
        if !seen.contains_key(id) {
            readings.push(Reading::missing(id, payload.timestamp, payload.kind));
        }
    }

    tracing::trace!(
        message = "normalized payload",
        timestamp = %payload.timestamp,
        reported = reported,
        filled = readings.len() - reported,
    );

    DailyPayload {
        timestamp: payload.timestamp,
        kind: payload.kind,
        readings,
        reading_type: payload.reading_type.clone(),
        reading_unit: payload.reading_unit.clone(),
    }
}

pub fn normalize_all(payloads: &[DailyPayload], expected: &StationSet) -> Vec<DailyPayload> {
    payloads.iter().map(|p| normalize(p, expected)).collect()
}
