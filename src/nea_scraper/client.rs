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

use crate::model::{DailyPayload, DataKind, Reading, Station};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::error;
use std::fmt;
use std::future::Future;

#[derive(Debug)]
pub enum FetchError {
    Internal(reqwest::Error),
    Unexpected(StatusCode, Url),
    Parse(NaiveDate, DataKind, serde_json::Error),
    InvalidUrl(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(e) => write!(f, "{}", e),
            Self::Unexpected(status, url) => write!(f, "unexpected status {} for {}", status, url),
            Self::Parse(date, kind, e) => write!(f, "unable to parse {} response for {}: {}", kind, date, e),
            Self::InvalidUrl(u) => write!(f, "invalid API URL {}", u),
        }
    }
}

impl error::Error for FetchError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Internal(e) => Some(e),
            Self::Parse(_, _, e) => Some(e),
            _ => None,
        }
    }
}

/// Something that can produce readings and stations for a single day.
///
/// Implemented by [`NeaClient`] for the real API. The range and pipeline functions are
/// generic over this so that they can be driven by canned responses.
pub trait ReadingSource {
    /// Readings for each timestamp the API has for `date`, in the order the API returned them.
    fn readings(
        &self,
        date: NaiveDate,
        kind: DataKind,
    ) -> impl Future<Output = Result<Vec<DailyPayload>, FetchError>> + Send;

    /// Stations the API lists for `date`.
    fn stations(&self, date: NaiveDate, kind: DataKind) -> impl Future<Output = Result<Vec<Station>, FetchError>> + Send;
}

#[derive(Debug)]
pub struct NeaClient {
    client: Client,
    base_url: Url,
}

impl NeaClient {
    const USER_AGENT: &'static str = concat!("nea_scraper/", env!("CARGO_PKG_VERSION"));
    const JSON_RESPONSE: &'static str = "application/json";

    pub fn new(client: Client, base_url: &str) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(base_url.to_string()));
        }

        Ok(NeaClient { client, base_url })
    }

    /// Make a request for a full day of readings of the given kind and parse the response.
    pub async fn daily(&self, date: NaiveDate, kind: DataKind) -> Result<DailyResponse, FetchError> {
        let request_url = self.daily_url(date, kind)?;
        tracing::debug!(message = "making daily readings request", url = %request_url);

        let res = self.make_request(request_url).await?;
        let body = res.text().await.map_err(FetchError::Internal)?;
        DailyResponse::parse(&body, date, kind)
    }

    async fn make_request(&self, url: Url) -> Result<Response, FetchError> {
        let res = self
            .client
            .get(url.clone())
            .header(USER_AGENT, Self::USER_AGENT)
            .header(ACCEPT, Self::JSON_RESPONSE)
            .send()
            .await
            .map_err(FetchError::Internal)?;

        let status = res.status();
        if status == StatusCode::OK {
            Ok(res)
        } else {
            Err(FetchError::Unexpected(status, url))
        }
    }

    fn daily_url(&self, date: NaiveDate, kind: DataKind) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map(|mut p| {
                p.pop_if_empty().push(kind.endpoint());
            })
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?;

        url.query_pairs_mut()
            .clear()
            .append_pair("date", &date.format("%Y-%m-%d").to_string());
        Ok(url)
    }
}

impl ReadingSource for NeaClient {
    async fn readings(&self, date: NaiveDate, kind: DataKind) -> Result<Vec<DailyPayload>, FetchError> {
        Ok(self.daily(date, kind).await?.into_payloads(kind))
    }

    async fn stations(&self, date: NaiveDate, kind: DataKind) -> Result<Vec<Station>, FetchError> {
        Ok(self.daily(date, kind).await?.metadata.stations)
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DailyResponse {
    #[serde(alias = "metadata")]
    pub metadata: Metadata,
    #[serde(alias = "items")]
    pub items: Vec<Item>,
}

impl DailyResponse {
    /// Parse the body of a daily readings response. Error responses from the API
    /// (`{"code": ..., "message": ...}`) don't have `items` and fail here too.
    pub fn parse(body: &str, date: NaiveDate, kind: DataKind) -> Result<Self, FetchError> {
        serde_json::from_str(body).map_err(|e| FetchError::Parse(date, kind, e))
    }

    pub fn into_payloads(self, kind: DataKind) -> Vec<DailyPayload> {
        let Metadata {
            reading_type,
            reading_unit,
            ..
        } = self.metadata;

        self.items
            .into_iter()
            .map(|item| {
                let timestamp = item.timestamp.with_timezone(&Utc);
                DailyPayload {
                    timestamp,
                    kind,
                    readings: item
                        .readings
                        .into_iter()
                        .map(|r| Reading {
                            station_id: r.station_id,
                            value: r.value,
                            timestamp,
                            kind,
                        })
                        .collect(),
                    reading_type: reading_type.clone(),
                    reading_unit: reading_unit.clone(),
                }
            })
            .collect()
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Metadata {
    #[serde(alias = "stations", default)]
    pub stations: Vec<Station>,
    #[serde(alias = "reading_type")]
    pub reading_type: Option<String>,
    #[serde(alias = "reading_unit")]
    pub reading_unit: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Item {
    #[serde(alias = "timestamp")]
    pub timestamp: DateTime<FixedOffset>,
    #[serde(alias = "readings", default)]
    pub readings: Vec<ItemReading>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ItemReading {
    #[serde(alias = "station_id")]
    pub station_id: String,
    #[serde(alias = "value")]
    pub value: Option<f64>,
}
