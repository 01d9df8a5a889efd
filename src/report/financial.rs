//! Everything needed to render a financial report for a period.

use time::Date;

use crate::{
    report::{
        CategoryBreakdown, DateRange, MonthlyBreakdown, Summary, compute_category_breakdown,
        compute_monthly_breakdown, compute_summary,
    },
    transaction::{Transaction, TransactionType},
};

/// The figures shown in a financial report.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialReport {
    /// The business the report was prepared for.
    pub business_name: String,
    /// The period the report covers.
    pub range: DateRange,
    /// The day the report was generated, in the server's timezone.
    pub prepared_on: Date,
    /// Totals over the period.
    pub summary: Summary,
    /// Income in the period, oldest first.
    pub income: Vec<Transaction>,
    /// Expenditures in the period, oldest first.
    pub expenditures: Vec<Transaction>,
    /// Monthly totals for the year the period starts in.
    pub monthly: [MonthlyBreakdown; 12],
    /// Expenditure totals per category in the period.
    pub categories: Vec<CategoryBreakdown>,
}

impl FinancialReport {
    /// Build a report over the transactions in `range`.
    ///
    /// Transactions outside `range` are ignored, so `transactions` may be a
    /// superset. Income and expenditure rows keep the order they were given in.
    /// When `range` is open at both ends the monthly breakdown covers the year
    /// of `prepared_on`.
    pub fn build(
        business_name: &str,
        range: DateRange,
        prepared_on: Date,
        transactions: &[Transaction],
    ) -> Self {
        let in_range: Vec<Transaction> = transactions
            .iter()
            .filter(|transaction| range.contains(transaction.date))
            .cloned()
            .collect();

        let (income, expenditures) = in_range
            .iter()
            .cloned()
            .partition(|transaction| transaction.transaction_type == TransactionType::Income);

        Self {
            business_name: business_name.to_owned(),
            range,
            prepared_on,
            summary: compute_summary(&in_range, &range),
            income,
            expenditures,
            monthly: compute_monthly_breakdown(&in_range, &range, prepared_on.year()),
            categories: compute_category_breakdown(&in_range),
        }
    }
}
