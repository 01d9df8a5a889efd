//! Recording and querying income and expenditure transactions.
//!
//! This module contains:
//! - The [Transaction] model, the [NewTransaction] builder and its validation
//! - The [Amount] type for exact money arithmetic
//! - Database functions for storing and querying transactions
//! - The JSON endpoints for creating and listing transactions

mod amount;
mod core;
mod endpoints;

pub use amount::Amount;
pub use self::core::{
    NewTransaction, Transaction, TransactionId, TransactionType, TransactionWithUser,
    count_transactions, create_transaction, create_transaction_table,
    get_recent_transactions_with_users, get_transaction, get_transactions_in_range,
};
pub use endpoints::{
    TransactionState, create_transaction_endpoint, get_transaction_endpoint,
    list_transactions_endpoint,
};
