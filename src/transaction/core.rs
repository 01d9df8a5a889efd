//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, params_from_iter,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::{
    Error,
    report::DateRange,
    transaction::Amount,
    user::{UserID, UserSummary},
};

/// Alias for the integer type used for transaction IDs in the database.
pub type TransactionId = i64;

// ============================================================================
// MODELS
// ============================================================================

/// Whether money came into or went out of the business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Money earned.
    Income,
    /// Money spent.
    Expenditure,
}

impl TransactionType {
    /// The string stored in the database and used in JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expenditure => "EXPENDITURE",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INCOME" => Ok(TransactionType::Income),
            "EXPENDITURE" => Ok(TransactionType::Expenditure),
            other => Err(format!("unknown transaction type \"{other}\"")),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// An income or expenditure, i.e. an event where money was either earned or spent.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// Whether the transaction is an income or an expenditure.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The amount of money earned or spent. Never negative.
    pub amount: Amount,
    /// When the transaction happened.
    pub date: Date,
    /// What the money was spent on, e.g. "Rent". Always present on expenditures.
    pub category: Option<String>,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The user who recorded the transaction.
    pub user_id: UserID,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [NewTransaction] for discoverability.
    pub fn build(
        transaction_type: TransactionType,
        amount: Amount,
        date: Date,
        description: &str,
    ) -> NewTransaction {
        NewTransaction {
            transaction_type,
            amount,
            date,
            category: None,
            description: description.to_owned(),
            created_at: None,
        }
    }
}

/// A transaction joined with the user who recorded it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionWithUser {
    /// The transaction.
    #[serde(flatten)]
    pub transaction: Transaction,
    /// The user who recorded the transaction.
    pub user: UserSummary,
}

/// A builder for transactions that have not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Whether the transaction is an income or an expenditure.
    pub transaction_type: TransactionType,
    /// The amount of money earned or spent.
    pub amount: Amount,
    /// The date when the transaction occurred.
    pub date: Date,
    /// The category of the transaction, e.g. "Rent", "Utilities".
    pub category: Option<String>,
    /// A human-readable description of the transaction.
    pub description: String,
    /// When the transaction was recorded. Defaults to the time it is saved.
    pub created_at: Option<OffsetDateTime>,
}

impl NewTransaction {
    /// Set the category for the transaction.
    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_owned());
        self
    }

    /// Set the creation time instead of using the time the transaction is saved.
    pub fn created_at(mut self, created_at: OffsetDateTime) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Check the transaction before it is saved.
    ///
    /// A category made of whitespace counts as missing.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::InvalidAmount] if the amount is negative,
    /// - [Error::MissingCategory] if an expenditure has no category,
    /// - [Error::FutureDate] if the date is after `today`.
    pub fn validate(self, today: Date) -> Result<Self, Error> {
        if self.amount.is_negative() {
            return Err(Error::InvalidAmount(self.amount.as_f64()));
        }

        let has_category = self
            .category
            .as_deref()
            .is_some_and(|category| !category.trim().is_empty());

        if self.transaction_type == TransactionType::Expenditure && !has_category {
            return Err(Error::MissingCategory);
        }

        if self.date > today {
            return Err(Error::FutureDate(self.date));
        }

        Ok(self)
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str =
    "id, type, amount, date, category, description, user_id, created_at";

const SELECT_TRANSACTION_COLUMNS: &str =
    "t.id, t.type, t.amount, t.date, t.category, t.description, t.user_id, t.created_at";

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL CHECK (type IN ('INCOME', 'EXPENDITURE')),
                amount INTEGER NOT NULL CHECK (amount >= 0),
                date TEXT NOT NULL,
                category TEXT,
                description TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Used by the summary and report date range filters.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(date);",
        (),
    )?;

    // Used by the recent transactions query.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_created_at ON \"transaction\"(created_at);",
        (),
    )?;

    Ok(())
}

/// Create a new transaction in the database from a builder.
///
/// The builder should already be validated with [NewTransaction::validate].
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `user_id` does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: NewTransaction,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    // Stored in UTC so that the text column sorts chronologically.
    let created_at = builder
        .created_at
        .unwrap_or_else(OffsetDateTime::now_utc)
        .to_offset(UtcOffset::UTC);

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (type, amount, date, category, description, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                builder.transaction_type,
                builder.amount,
                builder.date,
                builder.category,
                builder.description,
                user_id.as_i64(),
                created_at,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::NotFound,
            error => error.into(),
        })
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {SELECT_TRANSACTION_COLUMNS} FROM \"transaction\" t WHERE t.id = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Get the transactions whose date lies in `date_range`, oldest first.
///
/// Missing bounds on the range do not filter anything.
///
/// # Errors
/// Returns [Error::SqlError] if the SQL query fails.
pub fn get_transactions_in_range(
    date_range: &DateRange,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    if let Some(start) = date_range.start {
        params.push(start);
        conditions.push(format!("t.date >= ?{}", params.len()));
    }

    if let Some(end) = date_range.end {
        params.push(end);
        conditions.push(format!("t.date <= ?{}", params.len()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let query = format!(
        "SELECT {SELECT_TRANSACTION_COLUMNS} FROM \"transaction\" t
        {where_clause}
        ORDER BY t.date ASC, t.id ASC"
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), map_transaction_row)?
        .collect::<Result<Vec<Transaction>, rusqlite::Error>>()
        .map_err(|error| error.into())
}

/// Get the `limit` most recently created transactions along with the user who
/// created each one, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if the SQL query fails.
pub fn get_recent_transactions_with_users(
    limit: usize,
    connection: &Connection,
) -> Result<Vec<TransactionWithUser>, Error> {
    connection
        .prepare(&format!(
            "SELECT {SELECT_TRANSACTION_COLUMNS}, u.id, u.name, u.email
            FROM \"transaction\" t
            INNER JOIN user u ON u.id = t.user_id
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT ?1"
        ))?
        .query_map([limit as i64], |row| {
            let transaction = map_transaction_row(row)?;
            let user = UserSummary {
                id: UserID::new(row.get(8)?),
                name: row.get(9)?,
                email: row.get(10)?,
            };

            Ok(TransactionWithUser { transaction, user })
        })?
        .collect::<Result<Vec<_>, rusqlite::Error>>()
        .map_err(|error| error.into())
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Map a database row to a Transaction.
///
/// Expects the columns in the order of `TRANSACTION_COLUMNS`.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        transaction_type: row.get(1)?,
        amount: row.get(2)?,
        date: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        user_id: UserID::new(row.get(6)?),
        created_at: row.get(7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
