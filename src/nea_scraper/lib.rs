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

//! Extract data.gov.sg weather station readings to CSV
//!
//! ## Features
//!
//! `nea_scraper` fetches daily air temperature or rainfall readings for a range of dates from the
//! [data.gov.sg] environment API (`/air-temperature` and `/rainfall`), fills in a missing value for
//! every station that didn't report at a particular time, and writes the readings for a single
//! station to a CSV file. Timestamps are converted to Singapore time.
//!
//! The API returns one JSON document per day with many timestamps per day. Stations are listed
//! separately for each day and the list changes from day to day, so the set of stations for a
//! range is the union of the stations listed on each day of the range.
//!
//! [data.gov.sg]: https://data.gov.sg/
//!
//! ## Build
//!
//! `nea_scraper` is a Rust program and must be built from source using a [Rust toolchain](https://rustup.rs/).
//!
//! ```text
//! cargo build --release
//! ```
//!
//! ## Usage
//!
//! Run `nea_scraper` without arguments to be prompted for the start date, number of days, type of
//! data, and station ID. Each of these can also be given as a flag, for example:
//!
//! ```text
//! ./nea_scraper --start-date 2023-01-01 --days 7 --data-kind rainfall --station S43
//! ```
//!
//! This writes `rainfall/nea_rainfall_S43_from_2023-01-01_to_2023-01-07.csv`. The columns are a
//! row number, the timestamp in Singapore time, the station ID, the value (blank when the station
//! did not report), and the reading type and unit from the API.
//!
//! A start date that is not valid or is in the future falls back to today. A number of days that
//! would go past today falls back to every day from the start date through today. A warning is
//! logged in both cases.

pub mod client;
pub mod dates;
pub mod model;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod range;

#[cfg(test)]
mod fixtures;
