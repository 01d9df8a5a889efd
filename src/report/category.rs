//! Expenditure grouped by category.

use std::collections::HashMap;

use serde::Serialize;

use crate::transaction::{Amount, Transaction, TransactionType};

/// The label for expenditures that somehow have no category.
///
/// Validation stops new ones from being created, but rows written before the
/// category became mandatory may still lack one.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// How much was spent in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    /// The category name, exactly as entered.
    pub category: String,
    /// The sum of expenditure amounts in the category.
    pub amount: Amount,
    /// The share of total expenditure, from 0 to 100.
    pub percentage: f64,
}

/// Group the expenditures in `transactions` by category.
///
/// Income is ignored, even when it has a category. Categories are compared
/// exactly, so "Rent" and "rent" are different categories. Categories appear
/// in the order they are first seen.
///
/// Percentages are shares of the total expenditure over all categories. When
/// that total is zero every percentage is zero.
pub fn compute_category_breakdown(transactions: &[Transaction]) -> Vec<CategoryBreakdown> {
    let mut totals: Vec<(&str, Amount)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    let expenditures = transactions
        .iter()
        .filter(|transaction| transaction.transaction_type == TransactionType::Expenditure);

    for transaction in expenditures {
        let category = transaction
            .category
            .as_deref()
            .unwrap_or(UNCATEGORIZED_LABEL);

        let position = *positions.entry(category).or_insert_with(|| {
            totals.push((category, Amount::ZERO));
            totals.len() - 1
        });
        totals[position].1 += transaction.amount;
    }

    let total_expenditure: Amount = totals.iter().map(|(_, amount)| amount).sum();

    totals
        .into_iter()
        .map(|(category, amount)| CategoryBreakdown {
            category: category.to_owned(),
            amount,
            percentage: percentage_of(amount, total_expenditure),
        })
        .collect()
}

fn percentage_of(amount: Amount, total: Amount) -> f64 {
    if total == Amount::ZERO {
        return 0.0;
    }

    amount.cents() as f64 / total.cents() as f64 * 100.0
}
