//! Query string parameters shared by the summary, breakdown and report endpoints.

use serde::{Deserialize, Deserializer};

use crate::{
    Error,
    report::{DateRange, parse_date},
};

/// The optional `start_date` and `end_date` query parameters.
///
/// Empty values are treated the same as missing ones, so a form that submits
/// `?start_date=&end_date=2024-01-31` only filters by the end date.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct DateRangeQuery {
    /// The first day to include, formatted as YYYY-MM-DD.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub start_date: Option<String>,
    /// The last day to include, formatted as YYYY-MM-DD.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub end_date: Option<String>,
}

impl DateRangeQuery {
    /// Parse the query into a date range.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] naming the field that failed to parse, or
    /// [Error::InvalidDateRange] if the start date is after the end date.
    pub fn into_range(self) -> Result<DateRange, Error> {
        let start = self
            .start_date
            .map(|value| parse_date("start_date", &value))
            .transpose()?;
        let end = self
            .end_date
            .map(|value| parse_date("end_date", &value))
            .transpose()?;

        DateRange::new(start, end)
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;

    Ok(value.filter(|value| !value.trim().is_empty()))
}
