//! Movement and expiry date handling.
//!
//! Dates arrive from people as `DD/MM/YYYY` (optionally with a time of day) and are
//! stored as `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS` so that text order is time order.

use crate::errors::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};

const ENTRY_DATE: &str = "%d/%m/%Y";
const ENTRY_DATE_TIME: [&str; 2] = ["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M"];
const STORED_DATE: &str = "%Y-%m-%d";
const STORED_DATE_TIME: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// When a movement happened: a calendar date, optionally with a time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MovementTime {
    /// Date without time of day
    Date(NaiveDate),
    /// Date with time of day
    DateTime(NaiveDateTime),
}

impl MovementTime {
    /// Parses interactive input: `DD/MM/YYYY`, `DD/MM/YYYY HH:MM` or `DD/MM/YYYY HH:MM:SS`.
    pub fn parse_entry(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, ENTRY_DATE) {
            return Ok(Self::Date(date));
        }
        ENTRY_DATE_TIME
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
            .map(Self::DateTime)
            .ok_or_else(|| Error::InvalidTimestamp {
                input: input.to_string(),
            })
    }

    /// Parses a stored value in either the date-only or the date-time form.
    #[must_use]
    pub fn parse_stored(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, STORED_DATE) {
            return Some(Self::Date(date));
        }
        STORED_DATE_TIME
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
            .map(Self::DateTime)
    }

    /// Storage form: `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.
    #[must_use]
    pub fn to_storage_string(&self) -> String {
        match self {
            Self::Date(date) => date.format(STORED_DATE).to_string(),
            Self::DateTime(date_time) => date_time.format(STORED_DATE_TIME[0]).to_string(),
        }
    }

    /// The calendar date, dropping any time of day.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Date(date) => *date,
            Self::DateTime(date_time) => date_time.date(),
        }
    }
}

/// Parses a stored date or date-time value down to its calendar date.
#[must_use]
pub fn parse_stored_date(value: &str) -> Option<NaiveDate> {
    MovementTime::parse_stored(value).map(|time| time.date())
}

/// Formats a date in storage form (`YYYY-MM-DD`).
#[must_use]
pub fn format_storage_date(date: NaiveDate) -> String {
    date.format(STORED_DATE).to_string()
}

/// Parses an expiry date typed by a person or found in imported data.
/// Accepts `DD/MM/YYYY` and `YYYY-MM-DD`.
pub fn parse_expiry_text(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, ENTRY_DATE)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, STORED_DATE))
        .map_err(|_| Error::InvalidTimestamp {
            input: input.to_string(),
        })
}
