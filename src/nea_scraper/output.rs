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

use crate::pipeline::ExtractedTable;
use std::error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug)]
pub enum OutputError {
    Io(PathBuf, io::Error),
    Csv(PathBuf, csv::Error),
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(p, e) => write!(f, "unable to write {}: {}", p.display(), e),
            Self::Csv(p, e) => write!(f, "unable to write CSV {}: {}", p.display(), e),
        }
    }
}

impl error::Error for OutputError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(_, e) => Some(e),
            Self::Csv(_, e) => Some(e),
        }
    }
}

/// Write the table as CSV into `dir`, creating it if needed, and return the path written.
///
/// Rows are written to a hidden temporary file next to the destination which is renamed
/// into place once complete, so a failed write never leaves a partial CSV behind.
pub fn write_csv(table: &ExtractedTable, dir: &Path) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(dir).map_err(|e| OutputError::Io(dir.to_path_buf(), e))?;

    let name = table.file_name();
    let path = dir.join(&name);
    let tmp = dir.join(format!(".{}.tmp", name));

    if let Err(e) = write_rows(table, &tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    if let Err(e) = fs::rename(&tmp, &path) {
        let _ = fs::remove_file(&tmp);
        return Err(OutputError::Io(path, e));
    }

    tracing::info!(message = "wrote CSV", path = %path.display(), rows = table.rows.len());
    Ok(path)
}

fn write_rows(table: &ExtractedTable, path: &Path) -> Result<(), OutputError> {
    let csv_err = |e| OutputError::Csv(path.to_path_buf(), e);
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;

    wtr.write_record(["", "timestamp", "station_id", "value", "reading_type", "reading_unit"])
        .map_err(csv_err)?;

    for (i, row) in table.rows.iter().enumerate() {
        wtr.write_record([
            i.to_string(),
            row.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            row.station_id.clone(),
            row.value.map_or(String::new(), |v| v.to_string()),
            row.reading_type.clone().unwrap_or_default(),
            row.reading_unit.clone().unwrap_or_default(),
        ])
        .map_err(csv_err)?;
    }

    wtr.flush().map_err(|e| OutputError::Io(path.to_path_buf(), e))
}
