//! Month by month income and expenditure for one calendar year.

use serde::Serialize;
use time::Month;

use crate::{
    report::{DateRange, summary::summarize},
    transaction::{Amount, Transaction},
};

/// The totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyBreakdown {
    /// The month and year, e.g. "Jan 2024".
    pub month: String,
    /// The sum of income amounts in the month.
    pub income: Amount,
    /// The sum of expenditure amounts in the month.
    pub expenditure: Amount,
    /// Income minus expenditure.
    pub net: Amount,
}

/// Break the transactions in `date_range` down by month.
///
/// The months cover the [reporting year](DateRange::reporting_year) of
/// `date_range`, or `fallback_year` when the range is open at both ends. A
/// transaction is counted iff its date lies in `date_range` and in the
/// reporting year.
///
/// Always returns all twelve months in calendar order. Months without
/// transactions are filled with zeros.
pub fn compute_monthly_breakdown(
    transactions: &[Transaction],
    date_range: &DateRange,
    fallback_year: i32,
) -> [MonthlyBreakdown; 12] {
    let year = date_range.reporting_year().unwrap_or(fallback_year);
    breakdown(transactions, year, date_range)
}

/// Break all transactions in `year` down by month.
pub fn compute_monthly_breakdown_for_year(
    transactions: &[Transaction],
    year: i32,
) -> [MonthlyBreakdown; 12] {
    breakdown(transactions, year, &DateRange::ALL)
}

fn breakdown(
    transactions: &[Transaction],
    year: i32,
    date_range: &DateRange,
) -> [MonthlyBreakdown; 12] {
    std::array::from_fn(|index| {
        let month = month_from_index(index);
        let in_month = transactions.iter().filter(|transaction| {
            transaction.date.year() == year
                && transaction.date.month() == month
                && date_range.contains(transaction.date)
        });
        let totals = summarize(in_month);

        MonthlyBreakdown {
            month: format!("{} {year}", month_label(month)),
            income: totals.total_income,
            expenditure: totals.total_expenditure,
            net: totals.net_balance,
        }
    })
}

/// Maps 0 to January through to 11 to December.
fn month_from_index(index: usize) -> Month {
    (0..index).fold(Month::January, |month, _| month.next())
}

/// Three-letter abbreviation for `month`, e.g. "Jan".
pub(crate) fn month_label(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}
