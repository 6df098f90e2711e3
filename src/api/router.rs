use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{AppState, extend_due_date, get_loan_by_id, loan_book, return_book};

/// Creates the API router with all lending endpoints
///
/// Command endpoints (Write operations):
/// - POST /books/:id/loan - Loan a book to a member
/// - POST /books/:id/return - Return a loaned book
/// - POST /loans/:id/extend - Extend a loan's due date
///
/// Query endpoints (Read operations):
/// - GET /loans/:id - Get loan details
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Command endpoints (Write operations)
        .route("/books/:id/loan", post(loan_book))
        .route("/books/:id/return", post(return_book))
        .route("/loans/:id/extend", post(extend_due_date))
        // Query endpoints (Read operations)
        .route("/loans/:id", get(get_loan_by_id))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
