//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::{
    AppState, Error,
    auth::{auth_guard, get_verify_session, post_log_in, post_log_out},
    dashboard::{get_breakdown, get_dashboard_summary, get_financial_report_page},
    endpoints,
    transaction::{
        create_transaction_endpoint, get_transaction_endpoint, list_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Every route except log-in, log-out and coffee requires a valid auth cookie.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT_API, post(post_log_out));

    let protected_routes = Router::new()
        .route(endpoints::VERIFY_SESSION_API, get(get_verify_session))
        .route(endpoints::DASHBOARD_SUMMARY_API, get(get_dashboard_summary))
        .route(endpoints::BREAKDOWN_API, get(get_breakdown))
        .route(endpoints::FINANCIAL_REPORT_VIEW, get(get_financial_report_page))
        .route(
            endpoints::TRANSACTIONS_API,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(endpoints::TRANSACTION_API, get(get_transaction_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (
        StatusCode::IM_A_TEAPOT,
        Json(json!({ "message": "I'm a teapot" })),
    )
        .into_response()
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
