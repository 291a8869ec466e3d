use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Smallest Jalali year that can be converted
pub const MIN_YEAR: i64 = 1;
/// Largest Jalali year that can be converted
pub const MAX_YEAR: i64 = 9377;

/// Month lengths of a common Jalali year; Esfand gains a day in leap years
const MONTH_DAYS: [u32; 12] = [31, 31, 31, 31, 31, 31, 30, 30, 30, 30, 30, 29];

/// Year `ANCHOR_YEAR`/01/01 falls on `ANCHOR_GREGORIAN` and starts a 33-year cycle
const ANCHOR_YEAR: i64 = 979;
const ANCHOR_GREGORIAN: (i32, u32, u32) = (1600, 3, 20);

const DAYS_PER_CYCLE: i64 = 33 * 365 + 8;
const DAYS_PER_QUAD: i64 = 4 * 365 + 1;

/// Residues of `year % 33` that mark a leap year
const LEAP_RESIDUES: [i64; 8] = [1, 5, 9, 13, 17, 22, 26, 30];

/// Failure to read or convert a Jalali date
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// The text did not split into exactly three `/`-separated parts
    #[error("expected a YYYY/MM/DD date, got {0:?}")]
    Shape(String),

    /// One of the three parts is not an integer
    #[error("{0:?} is not a number")]
    Number(String),

    /// The triple does not name a day of the Jalali calendar
    #[error("{year}/{month}/{day} is not a valid Jalali date")]
    OutOfRange { year: i64, month: i64, day: i64 },

    /// The Gregorian date has no Jalali counterpart in the supported years
    #[error("{0} is outside the convertible range")]
    Unsupported(NaiveDate),
}

/// A validated day of the Jalali (solar hijri) calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JalaliDate {
    year: i64,
    month: u32,
    day: u32,
}

/// Whether `year` has 366 days
pub fn is_leap_year(year: i64) -> bool {
    LEAP_RESIDUES.contains(&year.rem_euclid(33))
}

/// Number of days in `month` (1-based) of `year`
pub fn days_in_month(year: i64, month: u32) -> Option<u32> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    let days = *MONTH_DAYS.get(index)?;
    if month == 12 && is_leap_year(year) {
        Some(days + 1)
    } else {
        Some(days)
    }
}

fn anchor() -> NaiveDate {
    let (y, m, d) = ANCHOR_GREGORIAN;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

impl JalaliDate {
    /// Builds a date, rejecting triples that do not exist in the calendar
    pub fn new(year: i64, month: i64, day: i64) -> Result<Self, DateError> {
        let out_of_range = || DateError::OutOfRange { year, month, day };

        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(out_of_range());
        }
        let month_u = u32::try_from(month).map_err(|_| out_of_range())?;
        let day_u = u32::try_from(day).map_err(|_| out_of_range())?;
        let max_day = days_in_month(year, month_u).ok_or_else(out_of_range)?;
        if day_u == 0 || day_u > max_day {
            return Err(out_of_range());
        }

        Ok(Self {
            year,
            month: month_u,
            day: day_u,
        })
    }

    pub fn year(&self) -> i64 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Days elapsed since the anchor year's first day (negative before it)
    fn days_from_anchor(&self) -> i64 {
        let years = self.year - ANCHOR_YEAR;
        let mut days = 365 * years
            + years.div_euclid(33) * 8
            + (years.rem_euclid(33) + 3).div_euclid(4);
        days += MONTH_DAYS[..(self.month - 1) as usize]
            .iter()
            .map(|&d| i64::from(d))
            .sum::<i64>();
        days + i64::from(self.day) - 1
    }

    /// Converts to the equivalent proleptic Gregorian date
    pub fn to_gregorian(&self) -> Result<NaiveDate, DateError> {
        anchor()
            .checked_add_signed(TimeDelta::days(self.days_from_anchor()))
            .ok_or(DateError::OutOfRange {
                year: self.year,
                month: i64::from(self.month),
                day: i64::from(self.day),
            })
    }

    /// Converts a Gregorian date into the Jalali calendar
    pub fn from_gregorian(date: NaiveDate) -> Result<Self, DateError> {
        let elapsed = date.signed_duration_since(anchor()).num_days();

        let mut year = ANCHOR_YEAR + 33 * elapsed.div_euclid(DAYS_PER_CYCLE);
        let mut rest = elapsed.rem_euclid(DAYS_PER_CYCLE);

        year += 4 * (rest / DAYS_PER_QUAD);
        rest %= DAYS_PER_QUAD;
        // First year of every quad is the leap one
        if rest >= 366 {
            year += (rest - 1) / 365;
            rest = (rest - 1) % 365;
        }

        let mut month = 1;
        for &len in &MONTH_DAYS[..11] {
            if rest < i64::from(len) {
                break;
            }
            rest -= i64::from(len);
            month += 1;
        }

        Self::new(year, month, rest + 1).map_err(|_| DateError::Unsupported(date))
    }
}

impl TryFrom<NaiveDate> for JalaliDate {
    type Error = DateError;

    fn try_from(date: NaiveDate) -> Result<Self, Self::Error> {
        Self::from_gregorian(date)
    }
}

impl FromStr for JalaliDate {
    type Err = DateError;

    /// Parses a `YYYY/MM/DD` string of Western digits
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        let [year, month, day] = parts.as_slice() else {
            return Err(DateError::Shape(s.to_string()));
        };

        let number = |part: &str| {
            part.trim()
                .parse::<i64>()
                .map_err(|_| DateError::Number(part.to_string()))
        };

        Self::new(number(*year)?, number(*month)?, number(*day)?)
    }
}

impl fmt::Display for JalaliDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}
