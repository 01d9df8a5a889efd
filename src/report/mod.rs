//! Pure aggregation over transactions: summaries, monthly and category
//! breakdowns, recent highlights and the data behind the financial report.
//!
//! Nothing in here touches the database or HTTP.

mod category;
mod financial;
mod highlights;
mod monthly;
mod range;
mod summary;

#[cfg(test)]
pub(crate) mod test_utils;

pub use category::{CategoryBreakdown, UNCATEGORIZED_LABEL, compute_category_breakdown};
pub use financial::FinancialReport;
pub use highlights::{DEFAULT_HIGHLIGHT_COUNT, Highlight, select_recent_highlights, user_prefix};
pub use monthly::{MonthlyBreakdown, compute_monthly_breakdown, compute_monthly_breakdown_for_year};
pub use range::{DateRange, parse_date};
pub use summary::{Summary, compute_summary};
