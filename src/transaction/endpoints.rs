//! Defines the JSON endpoints for creating and listing transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::require_write_permission,
    endpoints::{self, format_endpoint},
    filters::DateRangeQuery,
    report::parse_date,
    timezone::get_local_offset,
    transaction::{
        Amount, Transaction, TransactionId, TransactionType,
        core::{create_transaction, get_transaction, get_transactions_in_range},
    },
    user::UserID,
};

/// The state needed to get or create a transaction.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The request body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Either "INCOME" or "EXPENDITURE".
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The amount in whole currency units, e.g. 12.50.
    pub amount: f64,
    /// The date the transaction happened, formatted as YYYY-MM-DD.
    pub date: String,
    /// What the money was spent on. Required for expenditures.
    #[serde(default)]
    pub category: Option<String>,
    /// Text detailing the transaction.
    #[serde(default)]
    pub description: String,
}

/// A route handler for recording a new transaction.
///
/// Responds with 201, the saved transaction and its location. The user must
/// have write permission. A body that is not valid JSON, or lacks a required
/// field, is answered with 400 after the permission check.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<Response, Error> {
    let local_timezone = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let today = OffsetDateTime::now_utc().to_offset(local_timezone).date();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    require_write_permission(user_id, &connection)?;

    let Json(request) = payload?;
    let amount = Amount::from_decimal(request.amount)?;
    let date = parse_date("date", &request.date)?;

    let mut builder =
        Transaction::build(request.transaction_type, amount, date, &request.description);
    if let Some(category) = &request.category {
        builder = builder.category(category.trim());
    }
    let builder = builder.validate(today)?;

    let transaction = create_transaction(builder, user_id, &connection)
        .inspect_err(|error| tracing::error!("could not create transaction: {error}"))?;

    tracing::info!(
        "user {user_id} recorded {} transaction {}",
        transaction.transaction_type,
        transaction.id
    );

    let location = format_endpoint(endpoints::TRANSACTION_API, transaction.id);

    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(transaction)).into_response())
}

/// A route handler for getting a single transaction by its ID.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, &connection)?;

    Ok(Json(transaction))
}

/// A route handler for listing the transactions in an optional date range, oldest first.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let date_range = query.into_range()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_transactions_in_range(&date_range, &connection)?;

    Ok(Json(transactions))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Json,
        extract::{Path, Query, State},
        http::{StatusCode, header::LOCATION},
    };
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime, macros::date};

    use crate::{
        Error, PasswordHash,
        db::initialize,
        filters::DateRangeQuery,
        transaction::{
            Amount, Transaction, TransactionState, TransactionType, count_transactions,
            create_transaction, create_transaction_endpoint, get_transaction_endpoint,
            list_transactions_endpoint,
        },
        user::{NewUser, Permission, Role, User, create_user},
    };

    use super::CreateTransactionRequest;

    fn get_test_state(permission: Permission) -> (TransactionState, User) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            NewUser {
                email: "ama@example.com".to_owned(),
                name: "Ama".to_owned(),
                role: Role::User,
                permission,
                password_hash: PasswordHash::new_unchecked("hunter2"),
            },
            &conn,
        )
        .unwrap();

        let state = TransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        (state, user)
    }

    fn rent_request(date: &str) -> CreateTransactionRequest {
        CreateTransactionRequest {
            transaction_type: TransactionType::Expenditure,
            amount: 40.0,
            date: date.to_owned(),
            category: Some("Rent".to_owned()),
            description: "Office rent".to_owned(),
        }
    }

    fn count(state: &TransactionState) -> u32 {
        count_transactions(&state.db_connection.lock().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (state, user) = get_test_state(Permission::Write);

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(user.id),
            Ok(Json(rent_request("2024-01-10"))),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response.headers().get(LOCATION).unwrap().to_str().unwrap().to_owned();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let transaction: Transaction = serde_json::from_slice(&body).unwrap();
        assert_eq!(transaction.amount, Amount::from_cents(4000));
        assert_eq!(transaction.category.as_deref(), Some("Rent"));
        assert_eq!(transaction.user_id, user.id);
        assert_eq!(location, format!("/api/transactions/{}", transaction.id));
        assert_eq!(count(&state), 1);

        let Json(fetched) = get_transaction_endpoint(State(state), Path(transaction.id))
            .await
            .unwrap();
        assert_eq!(fetched, transaction);
    }

    #[tokio::test]
    async fn get_missing_transaction_is_not_found() {
        let (state, _) = get_test_state(Permission::Read);

        let result = get_transaction_endpoint(State(state), Path(42)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }

    #[tokio::test]
    async fn read_only_user_cannot_create_transaction() {
        let (state, user) = get_test_state(Permission::Read);

        let result = create_transaction_endpoint(
            State(state.clone()),
            Extension(user.id),
            Ok(Json(rent_request("2024-01-10"))),
        )
        .await;

        assert_eq!(result.err(), Some(Error::InsufficientPermission));
        assert_eq!(count(&state), 0);
    }

    #[tokio::test]
    async fn rejects_expenditure_without_category() {
        let (state, user) = get_test_state(Permission::Write);
        let mut request = rent_request("2024-01-10");
        request.category = None;

        let result = create_transaction_endpoint(
            State(state.clone()),
            Extension(user.id),
            Ok(Json(request)),
        )
        .await;

        assert_eq!(result.err(), Some(Error::MissingCategory));
        assert_eq!(count(&state), 0);
    }

    #[tokio::test]
    async fn rejects_negative_amount() {
        let (state, user) = get_test_state(Permission::Write);
        let mut request = rent_request("2024-01-10");
        request.amount = -5.0;

        let result =
            create_transaction_endpoint(State(state), Extension(user.id), Ok(Json(request)))
                .await;

        assert_eq!(result.err(), Some(Error::InvalidAmount(-5.0)));
    }

    #[tokio::test]
    async fn rejects_unparseable_date() {
        let (state, user) = get_test_state(Permission::Write);

        let result = create_transaction_endpoint(
            State(state),
            Extension(user.id),
            Ok(Json(rent_request("10/01/2024"))),
        )
        .await;

        assert_eq!(
            result.err(),
            Some(Error::InvalidDate {
                field: "date".to_owned(),
                value: "10/01/2024".to_owned()
            })
        );
    }

    #[tokio::test]
    async fn rejects_future_date() {
        let (state, user) = get_test_state(Permission::Write);
        let tomorrow = OffsetDateTime::now_utc().date() + Duration::days(1);

        let result = create_transaction_endpoint(
            State(state),
            Extension(user.id),
            Ok(Json(rent_request(&tomorrow.to_string()))),
        )
        .await;

        assert_eq!(result.err(), Some(Error::FutureDate(tomorrow)));
    }

    #[tokio::test]
    async fn lists_transactions_in_range() {
        let (state, user) = get_test_state(Permission::Write);
        {
            let conn = state.db_connection.lock().unwrap();
            for date in [date!(2024 - 01 - 05), date!(2024 - 02 - 15)] {
                create_transaction(
                    Transaction::build(TransactionType::Income, Amount::from_cents(100), date, ""),
                    user.id,
                    &conn,
                )
                .unwrap();
            }
        }

        let Json(transactions) = list_transactions_endpoint(
            State(state),
            Query(DateRangeQuery {
                start_date: Some("2024-02-01".to_owned()),
                end_date: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].date, date!(2024 - 02 - 15));
    }
}
