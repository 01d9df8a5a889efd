//! Dashboard module
//!
//! Serves the dashboard totals, the monthly and category breakdowns, and the
//! printable business financial report.

mod handlers;
mod report_page;

pub use handlers::{DashboardState, get_breakdown, get_dashboard_summary, get_financial_report_page};
