//! Inclusive date ranges used to filter transactions.

use time::{Date, macros::format_description};

use crate::Error;

/// An inclusive range of calendar dates where either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// The earliest date to include, if any.
    pub start: Option<Date>,
    /// The latest date to include, if any.
    pub end: Option<Date>,
}

impl DateRange {
    /// A range that includes every date.
    pub const ALL: DateRange = DateRange {
        start: None,
        end: None,
    };

    /// Create a range, checking that `start` is not after `end`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidDateRange] if both ends are given and `start > end`.
    pub fn new(start: Option<Date>, end: Option<Date>) -> Result<Self, Error> {
        match (start, end) {
            (Some(start), Some(end)) if start > end => Err(Error::InvalidDateRange(start, end)),
            _ => Ok(Self { start, end }),
        }
    }

    /// Whether `date` lies inside the range, including the end points.
    pub fn contains(&self, date: Date) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }

    /// The year that monthly breakdowns of this range cover.
    ///
    /// This is the year of the start date, or of the end date when the range
    /// has no start. Returns `None` for a fully open range.
    pub fn reporting_year(&self) -> Option<i32> {
        self.start.or(self.end).map(|date| date.year())
    }
}

/// Parse a `YYYY-MM-DD` date from the request field `field`.
///
/// # Errors
///
/// Returns [Error::InvalidDate] naming `field` and the bad value.
pub fn parse_date(field: &str, value: &str) -> Result<Date, Error> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        Error::InvalidDate {
            field: field.to_owned(),
            value: value.to_owned(),
        }
    })
}
