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

use chrono::{Days, NaiveDate, Utc};
use chrono_tz::Asia::Singapore;
use std::error;
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    InvalidDate(String),
    FutureDate(NaiveDate),
    InvalidDays(String),
    FutureRange(NaiveDate, NaiveDate),
}

impl fmt::Display for DateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDate(s) => write!(f, "date '{}' is not in YYYY-MM-DD format", s),
            Self::FutureDate(d) => write!(f, "date {} is in the future", d),
            Self::InvalidDays(s) => write!(f, "number of days '{}' is not a positive integer", s),
            Self::FutureRange(start, end) => write!(f, "date range {} to {} goes into the future", start, end),
        }
    }
}

impl error::Error for DateError {}

/// Dates to extract along with any problems with the input that were worked around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub dates: Vec<NaiveDate>,
    pub warnings: Vec<DateError>,
}

/// Current date in Singapore, where the readings are taken.
pub fn today() -> NaiveDate {
    Utc::now().with_timezone(&Singapore).date_naive()
}

pub fn parse_start(input: &str, today: NaiveDate) -> Result<NaiveDate, DateError> {
    let input = input.trim();
    let date =
        NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|_| DateError::InvalidDate(input.to_owned()))?;

    if date > today {
        Err(DateError::FutureDate(date))
    } else {
        Ok(date)
    }
}

/// `num_days` consecutive dates beginning with `start`, none of which may be after `today`.
pub fn days_from(start: NaiveDate, num_days: &str, today: NaiveDate) -> Result<Vec<NaiveDate>, DateError> {
    let num_days = num_days.trim();
    let n = match num_days.parse::<u64>() {
        Ok(n) if n > 0 => n,
        _ => return Err(DateError::InvalidDays(num_days.to_owned())),
    };

    match start.checked_add_days(Days::new(n - 1)) {
        Some(end) if end <= today => Ok(start.iter_days().take(n as usize).collect()),
        Some(end) => Err(DateError::FutureRange(start, end)),
        None => Err(DateError::FutureRange(start, NaiveDate::MAX)),
    }
}

/// Every date from `start` through `today`, inclusive.
pub fn until(start: NaiveDate, today: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= today).collect()
}

/// Work out which dates to extract, falling back to defaults for bad input.
///
/// An invalid or future start date falls back to just `today` and `num_days` is never
/// called. A number of days that isn't a positive integer, or that would extend past
/// `today`, falls back to every date from the start through `today`.
pub fn resolve<F>(start: &str, num_days: F, today: NaiveDate) -> Resolved
where
    F: FnOnce() -> String,
{
    let start = match parse_start(start, today) {
        Ok(d) => d,
        Err(e) => {
            return Resolved {
                dates: vec![today],
                warnings: vec![e],
            }
        }
    };

    match days_from(start, &num_days(), today) {
        Ok(dates) => Resolved {
            dates,
            warnings: Vec::new(),
        },
        Err(e) => Resolved {
            dates: until(start, today),
            warnings: vec![e],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{days_from, parse_start, resolve, until, DateError};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2023, 1, 10)
    }

    #[test]
    fn test_parse_start_valid() {
        assert_eq!(Ok(date(2023, 1, 1)), parse_start(" 2023-01-01\n", today()));
        assert_eq!(Ok(today()), parse_start("2023-01-10", today()));
    }

    #[test]
    fn test_parse_start_invalid() {
        assert_eq!(
            Err(DateError::InvalidDate("01/01/2023".to_owned())),
            parse_start("01/01/2023", today())
        );
        assert!(matches!(parse_start("", today()), Err(DateError::InvalidDate(_))));
    }

    #[test]
    fn test_parse_start_future() {
        assert_eq!(Err(DateError::FutureDate(date(2023, 1, 11))), parse_start("2023-01-11", today()));
    }

    #[test]
    fn test_days_from() {
        assert_eq!(
            Ok(vec![date(2023, 1, 1), date(2023, 1, 2), date(2023, 1, 3)]),
            days_from(date(2023, 1, 1), "3", today())
        );
        assert_eq!(Ok(vec![today()]), days_from(today(), "1", today()));
    }

    #[test]
    fn test_days_from_crosses_month() {
        let dates = days_from(date(2022, 12, 30), "4", today()).unwrap();
        assert_eq!(date(2022, 12, 30), dates[0]);
        assert_eq!(date(2023, 1, 2), dates[3]);
    }

    #[test]
    fn test_days_from_invalid_count() {
        assert_eq!(
            Err(DateError::InvalidDays("0".to_owned())),
            days_from(date(2023, 1, 1), "0", today())
        );
        assert!(matches!(days_from(date(2023, 1, 1), "-2", today()), Err(DateError::InvalidDays(_))));
        assert!(matches!(days_from(date(2023, 1, 1), "two", today()), Err(DateError::InvalidDays(_))));
    }

    #[test]
    fn test_days_from_into_future() {
        assert_eq!(
            Err(DateError::FutureRange(date(2023, 1, 9), date(2023, 1, 11))),
            days_from(date(2023, 1, 9), "3", today())
        );
    }

    #[test]
    fn test_until_inclusive() {
        assert_eq!(
            vec![date(2023, 1, 8), date(2023, 1, 9), date(2023, 1, 10)],
            until(date(2023, 1, 8), today())
        );
    }

    #[test]
    fn test_resolve_valid() {
        let res = resolve("2023-01-01", || "2".to_owned(), today());
        assert_eq!(vec![date(2023, 1, 1), date(2023, 1, 2)], res.dates);
        assert!(res.warnings.is_empty());
    }

    #[test]
    fn test_resolve_tomorrow_falls_back_to_today() {
        let res = resolve("2023-01-11", || panic!("number of days should not be asked for"), today());
        assert_eq!(vec![today()], res.dates);
        assert_eq!(vec![DateError::FutureDate(date(2023, 1, 11))], res.warnings);
    }

    #[test]
    fn test_resolve_garbage_falls_back_to_today() {
        let res = resolve("yesterday", || "5".to_owned(), today());
        assert_eq!(vec![today()], res.dates);
        assert_eq!(1, res.warnings.len());
    }

    #[test]
    fn test_resolve_range_past_today_falls_back_to_today() {
        let res = resolve("2023-01-07", || "30".to_owned(), today());
        assert_eq!(until(date(2023, 1, 7), today()), res.dates);
        assert_eq!(4, res.dates.len());
        assert!(matches!(res.warnings[..], [DateError::FutureRange(_, _)]));
    }

    #[test]
    fn test_resolve_bad_count_falls_back_to_today() {
        let res = resolve("2023-01-09", || "lots".to_owned(), today());
        assert_eq!(vec![date(2023, 1, 9), today()], res.dates);
        assert_eq!(vec![DateError::InvalidDays("lots".to_owned())], res.warnings);
    }
}
