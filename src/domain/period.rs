use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MIN_KEY_YEAR: i32 = 0;
const MAX_KEY_YEAR: i32 = 9999;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PeriodScope {
    Day,
    Week,
    Quarter,
    Year,
}

impl PeriodScope {
    pub const ALL: [PeriodScope; 4] = [Self::Day, Self::Week, Self::Quarter, Self::Year];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }

    pub fn key_format(self) -> &'static str {
        match self {
            Self::Day => "YYYY-MM-DD",
            Self::Week => "YYYY-Www",
            Self::Quarter => "YYYY-Qn",
            Self::Year => "YYYY",
        }
    }
}

impl fmt::Display for PeriodScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodScope {
    type Err = PeriodError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            _ => Err(PeriodError::UnknownScope(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("malformed period key '{key}': expected {expected}")]
    MalformedKey { key: String, expected: &'static str },
    #[error("period key '{key}' is not a {expected} key")]
    ScopeMismatch { key: String, expected: PeriodScope },
    #[error("unknown period scope '{0}': expected day|week|quarter|year")]
    UnknownScope(String),
    #[error("{0} is not a goal scope: expected week|quarter|year")]
    NotGoalScope(PeriodScope),
    #[error("period out of supported range: {0}")]
    OutOfRange(String),
}

/// Position of a period relative to today.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Timeline {
    Past,
    Current,
    Future,
}

/// Inclusive span of calendar dates covered by a period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A scope-tagged calendar period.
///
/// Internally a key is its scope plus the normalized first day of the
/// period (Monday for weeks, the first of the month for quarters, Jan 1 for
/// years), so two keys naming the same period always compare equal. The
/// string form is `YYYY-MM-DD`, `YYYY-Www` (ISO week-year), `YYYY-Qn` or
/// `YYYY`, and is self-describing: parsing infers the scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodKey {
    scope: PeriodScope,
    start: NaiveDate,
}

impl PeriodKey {
    /// Builds the key of the `scope` period that contains `date`.
    pub fn for_date(date: NaiveDate, scope: PeriodScope) -> Result<Self, PeriodError> {
        match scope {
            PeriodScope::Day => {
                ensure_year_in_range(date.year())?;
                Ok(Self { scope, start: date })
            }
            PeriodScope::Week => {
                ensure_year_in_range(date.iso_week().year())?;
                let start = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
                Ok(Self { scope, start })
            }
            PeriodScope::Quarter => {
                let quarter = date.month0() / 3 + 1;
                Self::quarter(date.year(), quarter)
            }
            PeriodScope::Year => Self::year(date.year()),
        }
    }

    pub fn day(date: NaiveDate) -> Result<Self, PeriodError> {
        Self::for_date(date, PeriodScope::Day)
    }

    /// ISO week `week` of ISO week-year `year`.
    ///
    /// The Monday is found by anchoring on Jan 4, which always falls in
    /// week 1, and adding `week - 1` weeks.
    pub fn week(year: i32, week: u32) -> Result<Self, PeriodError> {
        ensure_year_in_range(year)?;
        if week == 0 || week > iso_weeks_in_year(year) {
            return Err(PeriodError::MalformedKey {
                key: format!("{year:04}-W{week:02}"),
                expected: "an ISO week number that exists in that year",
            });
        }
        let jan4 = calendar_date(year, 1, 4)?;
        let first_monday = jan4 - Duration::days(i64::from(jan4.weekday().num_days_from_monday()));
        Ok(Self {
            scope: PeriodScope::Week,
            start: first_monday + Duration::weeks(i64::from(week - 1)),
        })
    }

    pub fn quarter(year: i32, quarter: u32) -> Result<Self, PeriodError> {
        ensure_year_in_range(year)?;
        if !(1..=4).contains(&quarter) {
            return Err(PeriodError::MalformedKey {
                key: format!("{year:04}-Q{quarter}"),
                expected: "a quarter between 1 and 4",
            });
        }
        Ok(Self {
            scope: PeriodScope::Quarter,
            start: calendar_date(year, (quarter - 1) * 3 + 1, 1)?,
        })
    }

    pub fn year(year: i32) -> Result<Self, PeriodError> {
        ensure_year_in_range(year)?;
        Ok(Self {
            scope: PeriodScope::Year,
            start: calendar_date(year, 1, 1)?,
        })
    }

    /// Parses `raw` and requires it to be a key of `scope`.
    pub fn parse_scoped(raw: &str, scope: PeriodScope) -> Result<Self, PeriodError> {
        let key = raw.parse::<Self>()?;
        if key.scope != scope {
            return Err(PeriodError::ScopeMismatch {
                key: raw.to_string(),
                expected: scope,
            });
        }
        Ok(key)
    }

    pub fn scope(&self) -> PeriodScope {
        self.scope
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    pub fn end_date(&self) -> NaiveDate {
        match self.scope {
            PeriodScope::Day => self.start,
            PeriodScope::Week => self.start + Duration::days(6),
            PeriodScope::Quarter => {
                let (year, month) = (self.start.year(), self.start.month());
                let last_month = month + 2;
                let last_day = if last_month == 6 || last_month == 9 { 30 } else { 31 };
                NaiveDate::from_ymd_opt(year, last_month, last_day)
                    .expect("quarter end is a valid calendar date")
            }
            PeriodScope::Year => NaiveDate::from_ymd_opt(self.start.year(), 12, 31)
                .expect("Dec 31 exists in every year"),
        }
    }

    pub fn date_range(&self) -> DateRange {
        DateRange {
            start: self.start_date(),
            end: self.end_date(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.date_range().contains(date)
    }

    /// The year printed in the key; for weeks this is the ISO week-year.
    pub fn key_year(&self) -> i32 {
        match self.scope {
            PeriodScope::Week => self.start.iso_week().year(),
            _ => self.start.year(),
        }
    }

    /// The key `offset` periods of the same scope away from this one.
    pub fn offset_by(&self, offset: i64) -> Result<Self, PeriodError> {
        let out_of_range = || PeriodError::OutOfRange(format!("{self} offset by {offset}"));
        match self.scope {
            PeriodScope::Day => {
                let delta = Duration::try_days(offset).ok_or_else(out_of_range)?;
                let date = self.start.checked_add_signed(delta).ok_or_else(out_of_range)?;
                Self::for_date(date, PeriodScope::Day)
            }
            PeriodScope::Week => {
                let delta = Duration::try_weeks(offset).ok_or_else(out_of_range)?;
                let date = self.start.checked_add_signed(delta).ok_or_else(out_of_range)?;
                Self::for_date(date, PeriodScope::Week)
            }
            PeriodScope::Quarter => {
                let index = i64::from(self.start.year()) * 4 + i64::from(self.start.month0() / 3);
                let shifted = index.checked_add(offset).ok_or_else(out_of_range)?;
                let year = i32::try_from(shifted.div_euclid(4)).map_err(|_| out_of_range())?;
                let quarter = u32::try_from(shifted.rem_euclid(4)).map_err(|_| out_of_range())? + 1;
                Self::quarter(year, quarter)
            }
            PeriodScope::Year => {
                let year = i64::from(self.start.year())
                    .checked_add(offset)
                    .and_then(|year| i32::try_from(year).ok())
                    .ok_or_else(out_of_range)?;
                Self::year(year)
            }
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            PeriodScope::Day => write!(f, "{}", self.start.format("%Y-%m-%d")),
            PeriodScope::Week => {
                write!(f, "{:04}-W{:02}", self.key_year(), self.start.iso_week().week())
            }
            PeriodScope::Quarter => {
                write!(f, "{:04}-Q{}", self.start.year(), self.start.month0() / 3 + 1)
            }
            PeriodScope::Year => write!(f, "{:04}", self.start.year()),
        }
    }
}

impl FromStr for PeriodKey {
    type Err = PeriodError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if let Some((year, week)) = raw.split_once("-W") {
            let invalid = || malformed(raw, PeriodScope::Week);
            let year = parse_digits(year, 4).ok_or_else(invalid)?;
            let week = parse_digits(week, 2).ok_or_else(invalid)?;
            return Self::week(year as i32, week).map_err(|_| invalid());
        }
        if let Some((year, quarter)) = raw.split_once("-Q") {
            let invalid = || malformed(raw, PeriodScope::Quarter);
            let year = parse_digits(year, 4).ok_or_else(invalid)?;
            let quarter = parse_digits(quarter, 1).ok_or_else(invalid)?;
            return Self::quarter(year as i32, quarter).map_err(|_| invalid());
        }
        if raw.len() == 4 {
            let year = parse_digits(raw, 4).ok_or_else(|| malformed(raw, PeriodScope::Year))?;
            return Self::year(year as i32);
        }

        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| malformed(raw, PeriodScope::Day))?;
        // Reject unpadded forms such as 2026-2-9 that chrono would accept.
        if date.format("%Y-%m-%d").to_string() != raw {
            return Err(malformed(raw, PeriodScope::Day));
        }
        Self::day(date)
    }
}

impl TryFrom<String> for PeriodKey {
    type Error = PeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PeriodKey> for String {
    fn from(key: PeriodKey) -> Self {
        key.to_string()
    }
}

/// One signed distance per scope from today's period; 0 is current.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodOffsets {
    pub day: i64,
    pub week: i64,
    pub quarter: i64,
    pub year: i64,
}

impl PeriodOffsets {
    pub fn get(&self, scope: PeriodScope) -> i64 {
        match scope {
            PeriodScope::Day => self.day,
            PeriodScope::Week => self.week,
            PeriodScope::Quarter => self.quarter,
            PeriodScope::Year => self.year,
        }
    }

    pub fn set(&mut self, scope: PeriodScope, offset: i64) {
        match scope {
            PeriodScope::Day => self.day = offset,
            PeriodScope::Week => self.week = offset,
            PeriodScope::Quarter => self.quarter = offset,
            PeriodScope::Year => self.year = offset,
        }
    }
}

/// The current key of every scope, as handed to legacy migration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentPeriodKeys {
    pub day: PeriodKey,
    pub week: PeriodKey,
    pub quarter: PeriodKey,
    pub year: PeriodKey,
}

impl CurrentPeriodKeys {
    pub fn get(&self, scope: PeriodScope) -> PeriodKey {
        match scope {
            PeriodScope::Day => self.day,
            PeriodScope::Week => self.week,
            PeriodScope::Quarter => self.quarter,
            PeriodScope::Year => self.year,
        }
    }
}

fn iso_weeks_in_year(year: i32) -> u32 {
    // Dec 28 is always in the last ISO week of its year.
    NaiveDate::from_ymd_opt(year, 12, 28).map_or(52, |date| date.iso_week().week())
}

fn ensure_year_in_range(year: i32) -> Result<(), PeriodError> {
    if !(MIN_KEY_YEAR..=MAX_KEY_YEAR).contains(&year) {
        return Err(PeriodError::OutOfRange(format!(
            "year {year} is outside {MIN_KEY_YEAR:04}..={MAX_KEY_YEAR:04}"
        )));
    }
    Ok(())
}

fn calendar_date(year: i32, month: u32, day: u32) -> Result<NaiveDate, PeriodError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| PeriodError::OutOfRange(format!("{year:04}-{month:02}-{day:02}")))
}

fn parse_digits(value: &str, width: usize) -> Option<u32> {
    if value.len() != width || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn malformed(raw: &str, scope: PeriodScope) -> PeriodError {
    PeriodError::MalformedKey {
        key: raw.to_string(),
        expected: scope.key_format(),
    }
}
