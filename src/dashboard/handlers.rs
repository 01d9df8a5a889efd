//! Route handlers for the dashboard summary, the breakdowns and the HTML
//! financial report.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use maud::Markup;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    AppState, Error,
    dashboard::report_page::financial_report_view,
    filters::DateRangeQuery,
    report::{
        CategoryBreakdown, DEFAULT_HIGHLIGHT_COUNT, FinancialReport, Highlight, MonthlyBreakdown,
        Summary, compute_category_breakdown, compute_monthly_breakdown, compute_summary,
        select_recent_highlights,
    },
    timezone::get_local_offset,
    transaction::{get_recent_transactions_with_users, get_transactions_in_range},
};

/// The business name used when the report request does not give one.
const DEFAULT_BUSINESS_NAME: &str = "My Business";

/// The state needed for the dashboard and report handlers.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl DashboardState {
    fn today(&self) -> Result<time::Date, Error> {
        let local_offset = local_offset(&self.local_timezone)?;

        Ok(OffsetDateTime::now_utc().to_offset(local_offset).date())
    }
}

fn local_offset(local_timezone: &str) -> Result<UtcOffset, Error> {
    get_local_offset(local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {local_timezone}");
        Error::InvalidTimezoneError(local_timezone.to_owned())
    })
}

/// The response body of the dashboard summary endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummaryResponse {
    /// Totals over the requested date range.
    pub summary: Summary,
    /// The most recently recorded transactions, regardless of the date range.
    pub recent_transactions: Vec<Highlight>,
}

/// The response body of the breakdown endpoint.
#[derive(Debug, Serialize)]
pub struct BreakdownResponse {
    /// Totals over the requested date range.
    pub summary: Summary,
    /// Totals for each month of the reporting year, January first.
    pub monthly: [MonthlyBreakdown; 12],
    /// Expenditure totals per category in the requested date range.
    pub categories: Vec<CategoryBreakdown>,
}

/// The query parameters for the HTML financial report.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// The business the report is prepared for.
    #[serde(default)]
    pub business_name: String,
    /// The first day to include, formatted as YYYY-MM-DD.
    #[serde(default)]
    pub start_date: Option<String>,
    /// The last day to include, formatted as YYYY-MM-DD.
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Get the totals for a date range and the most recently recorded transactions.
pub async fn get_dashboard_summary(
    State(state): State<DashboardState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<DashboardSummaryResponse>, Error> {
    let date_range = query.into_range()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_transactions_in_range(&date_range, &connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;
    let recent = get_recent_transactions_with_users(DEFAULT_HIGHLIGHT_COUNT, &connection)
        .inspect_err(|error| tracing::error!("could not get recent transactions: {error}"))?;

    Ok(Json(DashboardSummaryResponse {
        summary: compute_summary(&transactions, &date_range),
        recent_transactions: select_recent_highlights(&recent, DEFAULT_HIGHLIGHT_COUNT),
    }))
}

/// Get the totals, monthly breakdown and category breakdown for a date range.
///
/// When the range is open at both ends the monthly breakdown covers the
/// current year.
pub async fn get_breakdown(
    State(state): State<DashboardState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<BreakdownResponse>, Error> {
    let date_range = query.into_range()?;
    let current_year = state.today()?.year();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_transactions_in_range(&date_range, &connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;

    Ok(Json(BreakdownResponse {
        summary: compute_summary(&transactions, &date_range),
        monthly: compute_monthly_breakdown(&transactions, &date_range, current_year),
        categories: compute_category_breakdown(&transactions),
    }))
}

/// Render the business financial report for a date range as an HTML page.
pub async fn get_financial_report_page(
    State(state): State<DashboardState>,
    Query(query): Query<ReportQuery>,
) -> Result<Markup, Error> {
    let date_range = DateRangeQuery {
        start_date: query.start_date.filter(|value| !value.trim().is_empty()),
        end_date: query.end_date.filter(|value| !value.trim().is_empty()),
    }
    .into_range()?;
    let prepared_on = state.today()?;

    let business_name = match query.business_name.trim() {
        "" => DEFAULT_BUSINESS_NAME,
        name => name,
    };

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions_in_range(&date_range, &connection)
            .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?
    };

    let report = FinancialReport::build(business_name, date_range, prepared_on, &transactions);

    Ok(financial_report_view(&report))
}
