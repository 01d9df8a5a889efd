//! Income and expenditure totals over a set of transactions.

use serde::Serialize;

use crate::{
    report::DateRange,
    transaction::{Amount, Transaction, TransactionType},
};

/// Aggregate totals over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// The sum of all income amounts.
    pub total_income: Amount,
    /// The sum of all expenditure amounts.
    pub total_expenditure: Amount,
    /// Income minus expenditure. Negative when the business spent more than it earned.
    pub net_balance: Amount,
    /// The number of transactions counted, both income and expenditure.
    #[serde(rename = "totalTransactions")]
    pub transaction_count: usize,
}

impl Summary {
    /// Create a summary from totals, deriving the net balance.
    pub fn new(total_income: Amount, total_expenditure: Amount, transaction_count: usize) -> Self {
        Self {
            total_income,
            total_expenditure,
            net_balance: total_income - total_expenditure,
            transaction_count,
        }
    }

    /// The summary of two disjoint sets of transactions.
    pub fn combine(self, other: Summary) -> Summary {
        Summary::new(
            self.total_income + other.total_income,
            self.total_expenditure + other.total_expenditure,
            self.transaction_count + other.transaction_count,
        )
    }
}

/// Sum up the transactions whose date lies in `date_range`.
///
/// The count uses the same filter as the totals.
pub fn compute_summary(transactions: &[Transaction], date_range: &DateRange) -> Summary {
    let included = transactions
        .iter()
        .filter(|transaction| date_range.contains(transaction.date));

    summarize(included)
}

/// Sum up every transaction in `transactions` without filtering.
pub(super) fn summarize<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Summary {
    let mut total_income = Amount::ZERO;
    let mut total_expenditure = Amount::ZERO;
    let mut transaction_count = 0;

    for transaction in transactions {
        match transaction.transaction_type {
            TransactionType::Income => total_income += transaction.amount,
            TransactionType::Expenditure => total_expenditure += transaction.amount,
        }
        transaction_count += 1;
    }

    Summary::new(total_income, total_expenditure, transaction_count)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        report::{
            DateRange, Summary, compute_summary,
            test_utils::{expenditure, income, scenario_transactions},
        },
        transaction::Amount,
    };

    #[test]
    fn scenario_summary() {
        let range = DateRange::new(Some(date!(2024 - 01 - 01)), Some(date!(2024 - 02 - 28))).unwrap();

        let summary = compute_summary(&scenario_transactions(), &range);

        assert_eq!(
            summary,
            Summary {
                total_income: Amount::from_cents(12000),
                total_expenditure: Amount::from_cents(5000),
                net_balance: Amount::from_cents(7000),
                transaction_count: 4,
            }
        );
    }

    #[test]
    fn empty_input_gives_zero_summary() {
        let summary = compute_summary(&[], &DateRange::ALL);

        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn count_and_totals_use_the_same_filter() {
        let range = DateRange::new(Some(date!(2024 - 02 - 01)), None).unwrap();

        let summary = compute_summary(&scenario_transactions(), &range);

        assert_eq!(summary.transaction_count, 2);
        assert_eq!(summary.total_income, Amount::from_cents(2000));
        assert_eq!(summary.total_expenditure, Amount::from_cents(1000));
    }

    #[test]
    fn net_balance_can_be_negative() {
        let transactions = vec![
            income(1, 1000, date!(2024 - 01 - 01)),
            expenditure(2, 2500, date!(2024 - 01 - 02), "Rent"),
        ];

        let summary = compute_summary(&transactions, &DateRange::ALL);

        assert_eq!(summary.net_balance, Amount::from_cents(-1500));
        assert_eq!(
            summary.net_balance,
            summary.total_income - summary.total_expenditure
        );
    }

    #[test]
    fn huge_totals_do_not_overflow() {
        let transactions = vec![
            income(1, i64::MAX, date!(2024 - 01 - 01)),
            income(2, i64::MAX, date!(2024 - 01 - 02)),
            expenditure(3, i64::MAX, date!(2024 - 01 - 03), "Rent"),
        ];

        let summary = compute_summary(&transactions, &DateRange::ALL);

        assert_eq!(summary.total_income, Amount::from_cents(i64::MAX));
        assert_eq!(summary.net_balance, Amount::ZERO);
        assert_eq!(summary.transaction_count, 3);
    }

    #[test]
    fn summary_is_additive_over_disjoint_sets() {
        let transactions = scenario_transactions();
        let (left, right) = transactions.split_at(1);

        let whole = compute_summary(&transactions, &DateRange::ALL);
        let combined = compute_summary(left, &DateRange::ALL)
            .combine(compute_summary(right, &DateRange::ALL));

        assert_eq!(whole, combined);
    }

    #[test]
    fn order_does_not_change_the_result() {
        let transactions = scenario_transactions();
        let mut reversed = transactions.clone();
        reversed.reverse();

        assert_eq!(
            compute_summary(&transactions, &DateRange::ALL),
            compute_summary(&reversed, &DateRange::ALL)
        );
    }

    #[test]
    fn serializes_with_api_field_names() {
        let summary = Summary::new(Amount::from_cents(12000), Amount::from_cents(5000), 4);

        let json = serde_json::to_value(summary).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "totalIncome": 120.0,
                "totalExpenditure": 50.0,
                "netBalance": 70.0,
                "totalTransactions": 4
            })
        );
    }
}
