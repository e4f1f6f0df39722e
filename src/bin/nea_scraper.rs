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

use clap::Parser;
use nea_scraper::client::NeaClient;
use nea_scraper::dates;
use nea_scraper::model::{DataKind, StationSet};
use nea_scraper::output;
use nea_scraper::pipeline::{self, RunConfig};
use reqwest::Client;
use std::error::Error;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::Level;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_TIMEOUT_MILLIS: u64 = 10000;
const DEFAULT_PACE_MILLIS: u64 = 100;
const DEFAULT_API_URL: &str = "https://api.data.gov.sg/v1/environment/";
const MAX_ATTEMPTS: usize = 3;

#[derive(Debug, Parser)]
#[clap(name = "nea_scraper", version = clap::crate_version!())]
struct NeaScraperApplication {
    /// First date to extract readings for, in YYYY-MM-DD format. Prompted for when not
    /// given. Dates that are not valid or in the future fall back to today.
    #[clap(long)]
    start_date: Option<String>,

    /// Number of days to extract readings for, including the start date. Prompted for
    /// when not given. Ranges that go past today are cut off at today.
    #[clap(long)]
    days: Option<String>,

    /// Type of readings to extract, '1' or 'air-temperature', '2' or 'rainfall'. Prompted
    /// for when not given.
    #[clap(long)]
    data_kind: Option<String>,

    /// Station ID to extract readings for (e.g. S109). Prompted for with a list of known
    /// stations when not given.
    #[clap(long)]
    station: Option<String>,

    /// Base URL for the data.gov.sg environment API
    #[clap(long, default_value_t = DEFAULT_API_URL.into())]
    api_url: String,

    /// Directory to write the CSV file to. Defaults to a directory named after the type
    /// of readings ('air-temperature' or 'rainfall').
    #[clap(long)]
    output_dir: Option<PathBuf>,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Timeout for each request to the data.gov.sg API, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MILLIS)]
    timeout_millis: u64,

    /// Pause between requests to the data.gov.sg API, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_PACE_MILLIS)]
    pace_millis: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = NeaScraperApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let today = dates::today();
    let start = opts
        .start_date
        .clone()
        .unwrap_or_else(|| ask("Enter a date in YYYY-MM-DD format: "));
    let resolved = dates::resolve(
        &start,
        || {
            opts.days
                .clone()
                .unwrap_or_else(|| ask("Enter number of days from date entered: "))
        },
        today,
    );

    for w in resolved.warnings.iter() {
        tracing::warn!(message = "date input is not valid, using default dates", reason = %w);
    }

    let menu = DataKind::menu();
    let kind = choose(
        opts.data_kind.clone(),
        &format!("Choose type of data to extract from API - {}: ", menu),
        &format!("Invalid input. Please choose type of data to extract from API - {}: ", menu),
        |s| s.parse::<DataKind>(),
        ask,
    )
    .unwrap_or_else(|e| {
        tracing::error!(message = "no valid data kind chosen", error = %e);
        process::exit(1)
    });

    let timeout = Duration::from_millis(opts.timeout_millis);
    let http_client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize HTTP client", error = %e);
        process::exit(1)
    });

    let client = NeaClient::new(http_client, &opts.api_url).unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize API client", error = %e);
        process::exit(1)
    });

    let config = RunConfig {
        kind,
        dates: resolved.dates,
        pace: Duration::from_millis(opts.pace_millis),
    };

    tracing::info!(
        message = "extracting readings",
        kind = %kind,
        api_url = %opts.api_url,
        days = config.dates.len(),
    );

    let collection = pipeline::collect(&client, &config).await.unwrap_or_else(|e| {
        tracing::error!(message = "failed to fetch readings", error = %e);
        process::exit(1)
    });

    // Anything still not a known station after the last attempt is passed along so
    // that extraction reports it as an unknown station.
    let station = choose(
        opts.station.clone(),
        &format!(
            "The station IDs are:\n{}\nChoose station ID to extract data from: ",
            station_list(collection.stations())
        ),
        "Invalid station ID. Please choose station ID to extract data from: ",
        |s| {
            if collection.stations().contains(s) {
                Ok(s.to_owned())
            } else {
                Err(UnknownChoice(s.to_owned()))
            }
        },
        ask,
    )
    .unwrap_or_else(|e| e.0);

    let table = collection.extract(&station).unwrap_or_else(|e| {
        tracing::error!(message = "failed to extract readings", station = %station, error = %e);
        process::exit(1)
    });

    let dir = opts.output_dir.unwrap_or_else(|| PathBuf::from(kind.endpoint()));
    let path = output::write_csv(&table, &dir).unwrap_or_else(|e| {
        tracing::error!(message = "failed to write readings", error = %e);
        process::exit(1)
    });

    tracing::info!(message = "data extraction complete", path = %path.display(), rows = table.rows.len());
    Ok(())
}

#[derive(Debug)]
struct UnknownChoice(String);

impl fmt::Display for UnknownChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not one of the listed choices", self.0)
    }
}

/// Parse a value given as a flag or typed at a prompt, asking again up to
/// `MAX_ATTEMPTS` times in total before giving up with the last error.
fn choose<T, E, F, A>(
    given: Option<String>,
    question: &str,
    retry: &str,
    parse: F,
    mut ask: A,
) -> Result<T, E>
where
    E: fmt::Display,
    F: Fn(&str) -> Result<T, E>,
    A: FnMut(&str) -> String,
{
    let mut input = given.unwrap_or_else(|| ask(question));
    let mut attempt = 1;

    loop {
        match parse(input.trim()) {
            Ok(v) => return Ok(v),
            Err(e) if attempt >= MAX_ATTEMPTS => return Err(e),
            Err(e) => {
                tracing::warn!(message = "invalid choice", error = %e, attempt = attempt);
                input = ask(retry);
                attempt += 1;
            }
        }
    }
}

/// Print a question and read a single line of input. Unreadable input is treated as empty.
fn ask(question: &str) -> String {
    print!("{}", question);
    let _ = io::stdout().flush();

    let mut line = String::new();
    if let Err(e) = io::stdin().lock().read_line(&mut line) {
        tracing::warn!(message = "unable to read input", error = %e);
    }

    line.trim().to_owned()
}

fn station_list(stations: &StationSet) -> String {
    stations
        .iter()
        .map(|s| match &s.name {
            Some(name) => format!("  {} ({})", s.key(), name),
            None => format!("  {}", s.key()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
