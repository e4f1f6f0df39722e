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

use crate::client::{FetchError, ReadingSource};
use crate::model::{DailyPayload, DataKind, StationSet};
use chrono::NaiveDate;
use std::time::Duration;

/// Fetch readings for each date in order, concatenating the payloads of every day.
///
/// Dates are requested one at a time in the order given, waiting `pace` between
/// requests. Dates are not sorted or deduplicated. The first error ends the fetch.
pub async fn fetch_range<S>(
    source: &S,
    dates: &[NaiveDate],
    kind: DataKind,
    pace: Duration,
) -> Result<Vec<DailyPayload>, FetchError>
where
    S: ReadingSource,
{
    let mut payloads = Vec::new();
    for (i, date) in dates.iter().enumerate() {
        pause(i, pace).await;

        let day = source.readings(*date, kind).await?;
        tracing::info!(message = "fetched readings", date = %date, kind = %kind, timestamps = day.len());
        payloads.extend(day);
    }

    Ok(payloads)
}

/// Fetch the stations listed for each date and combine them into the set of
/// stations expected to have readings anywhere in the range.
pub async fn fetch_stations<S>(
    source: &S,
    dates: &[NaiveDate],
    kind: DataKind,
    pace: Duration,
) -> Result<StationSet, FetchError>
where
    S: ReadingSource,
{
    let mut stations = StationSet::new();
    for (i, date) in dates.iter().enumerate() {
        pause(i, pace).await;

        let day = source.stations(*date, kind).await?;
        tracing::debug!(message = "fetched stations", date = %date, kind = %kind, stations = day.len());
        stations.union(day);
    }

    tracing::info!(message = "found stations", kind = %kind, stations = stations.len());
    Ok(stations)
}

async fn pause(index: usize, pace: Duration) {
    if index > 0 && !pace.is_zero() {
        tokio::time::sleep(pace).await;
    }
}

#[cfg(test)]
mod tests {
    use super::{fetch_range, fetch_stations};
    use crate::client::FetchError;
    use crate::fixtures::*;
    use crate::model::DataKind;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    #[tokio::test]
    async fn test_fetch_range_preserves_date_order() {
        let source = FakeSource::new()
            .with_day(date(2023, 1, 1), fixture_air_temperature_day_one())
            .with_day(date(2023, 1, 2), fixture_air_temperature_day_two())
            .with_delay(date(2023, 1, 1), Duration::from_millis(20));

        let dates = [date(2023, 1, 1), date(2023, 1, 2)];
        let payloads = fetch_range(&source, &dates, DataKind::AirTemperature, Duration::ZERO)
            .await
            .unwrap();

        let timestamps: Vec<_> = payloads.iter().map(|p| p.timestamp).collect();
        assert_eq!(
            vec![
                Utc.with_ymd_and_hms(2022, 12, 31, 16, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2022, 12, 31, 16, 1, 0).unwrap(),
                Utc.with_ymd_and_hms(2023, 1, 1, 16, 0, 0).unwrap(),
            ],
            timestamps
        );
        assert_eq!(dates.to_vec(), source.calls());
    }

    #[tokio::test]
    async fn test_fetch_range_does_not_reorder_input() {
        let source = FakeSource::new()
            .with_day(date(2023, 1, 1), fixture_air_temperature_day_one())
            .with_day(date(2023, 1, 2), fixture_air_temperature_day_two());

        let dates = [date(2023, 1, 2), date(2023, 1, 1)];
        let payloads = fetch_range(&source, &dates, DataKind::AirTemperature, Duration::from_millis(1))
            .await
            .unwrap();

        assert_eq!(3, payloads.len());
        assert_eq!(Utc.with_ymd_and_hms(2023, 1, 1, 16, 0, 0).unwrap(), payloads[0].timestamp);
        assert_eq!(dates.to_vec(), source.calls());
    }

    #[tokio::test]
    async fn test_fetch_range_stops_at_first_failure() {
        let source = FakeSource::new().with_day(date(2023, 1, 2), fixture_air_temperature_day_two());

        let dates = [date(2023, 1, 1), date(2023, 1, 2)];
        let res = fetch_range(&source, &dates, DataKind::AirTemperature, Duration::ZERO).await;

        assert!(matches!(res, Err(FetchError::Parse(..))));
        assert_eq!(vec![date(2023, 1, 1)], source.calls());
    }

    #[tokio::test]
    async fn test_fetch_stations_unions_every_day() {
        let source = FakeSource::new()
            .with_day(date(2023, 1, 1), fixture_air_temperature_day_one())
            .with_day(date(2023, 1, 2), fixture_air_temperature_day_two());

        let dates = [date(2023, 1, 1), date(2023, 1, 2)];
        let stations = fetch_stations(&source, &dates, DataKind::AirTemperature, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(vec!["S1", "S2"], stations.ids().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_fetch_stations_single_day() {
        let source = FakeSource::new().with_day(date(2023, 1, 1), fixture_air_temperature_day_one());

        let stations = fetch_stations(&source, &[date(2023, 1, 1)], DataKind::AirTemperature, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(vec!["S1"], stations.ids().collect::<Vec<_>>());
    }
}
