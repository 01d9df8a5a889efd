//! Transaction fixtures shared by the report tests.

use time::{Date, OffsetDateTime, macros::datetime};

use crate::{
    transaction::{Amount, Transaction, TransactionId, TransactionType, TransactionWithUser},
    user::{UserID, UserSummary},
};

const CREATED_AT: OffsetDateTime = datetime!(2024-03-01 12:00:00 UTC);

pub fn income(id: TransactionId, cents: i64, date: Date) -> Transaction {
    transaction(id, TransactionType::Income, cents, date, None)
}

pub fn expenditure(id: TransactionId, cents: i64, date: Date, category: &str) -> Transaction {
    transaction(
        id,
        TransactionType::Expenditure,
        cents,
        date,
        Some(category.to_owned()),
    )
}

pub fn with_user(transaction: Transaction, email: &str, name: &str) -> TransactionWithUser {
    TransactionWithUser {
        user: UserSummary {
            id: transaction.user_id,
            name: name.to_owned(),
            email: email.to_owned(),
        },
        transaction,
    }
}

/// Two months of trading: 100 income and 40 rent in January, then 10 rent and
/// 20 income in February.
pub fn scenario_transactions() -> Vec<Transaction> {
    use time::macros::date;

    vec![
        income(1, 10000, date!(2024 - 01 - 05)),
        expenditure(2, 4000, date!(2024 - 01 - 10), "Rent"),
        expenditure(3, 1000, date!(2024 - 02 - 01), "Rent"),
        income(4, 2000, date!(2024 - 02 - 15)),
    ]
}

fn transaction(
    id: TransactionId,
    transaction_type: TransactionType,
    cents: i64,
    date: Date,
    category: Option<String>,
) -> Transaction {
    Transaction {
        id,
        transaction_type,
        amount: Amount::from_cents(cents),
        date,
        category,
        description: format!("transaction #{id}"),
        user_id: UserID::new(1),
        created_at: CREATED_AT,
    }
}
