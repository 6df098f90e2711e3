use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::loan::{
    CreateLoan, ExtendDueDate, ReturnLoan, ServiceDependencies,
    create_loan as execute_create_loan, extend_due_date as execute_extend_due_date,
    return_loan as execute_return_loan,
};
use crate::domain::value_objects::{BookId, LoanId, MemberId};

use super::{
    error::ApiError,
    types::{
        BookReturnedResponse, ErrorResponse, ExtendDueDateRequest, LoanBookRequest,
        LoanCreatedResponse, LoanExtendedResponse, LoanResponse, ReturnBookRequest,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Command handlers (POST)
// ============================================================================

/// POST /books/:id/loan - 書籍を貸し出す
///
/// 強制されるビジネスルール:
/// - 会員が存在すること
/// - 貸出可能な冊数が1冊以上あること
///
/// 成功時はloan_created通知が非同期に配信される（レスポンスは配信を待たない）。
pub async fn loan_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<LoanBookRequest>,
) -> Result<(StatusCode, Json<LoanCreatedResponse>), ApiError> {
    let cmd = CreateLoan {
        book_id: BookId::from_uuid(book_id),
        member_id: MemberId::from_uuid(req.member_id),
        duration_days: req.duration_days(),
        now: chrono::Utc::now(),
    };

    let loan = execute_create_loan(&state.service_deps, cmd).await?;

    let response = LoanCreatedResponse {
        loan_id: loan.loan_id.value(),
        book_id: loan.book_id.value(),
        member_id: loan.member_id.value(),
        loaned_at: loan.loaned_at,
        due_date: loan.due_date,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /books/:id/return - 書籍を返却する
///
/// 強制されるビジネスルール:
/// - (書籍, 会員)の貸出中の貸出が存在すること
/// - 延滞中の貸出も返却可能
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<ReturnBookRequest>,
) -> Result<(StatusCode, Json<BookReturnedResponse>), ApiError> {
    let now = chrono::Utc::now();
    let cmd = ReturnLoan {
        book_id: BookId::from_uuid(book_id),
        member_id: MemberId::from_uuid(req.member_id),
        now,
    };

    let loan = execute_return_loan(&state.service_deps, cmd).await?;

    let response = BookReturnedResponse {
        loan_id: loan.loan_id.value(),
        returned_at: loan.returned_at.unwrap_or(now),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// POST /loans/:id/extend - 返却期限を延長する
///
/// 強制されるビジネスルール:
/// - 貸出が存在すること
/// - 返却済み・延滞中でないこと
/// - 延長日数が1日以上であること
pub async fn extend_due_date(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
    Json(req): Json<ExtendDueDateRequest>,
) -> Result<(StatusCode, Json<LoanExtendedResponse>), ApiError> {
    let cmd = ExtendDueDate {
        loan_id: LoanId::from_uuid(loan_id),
        additional_days: req.additional_days,
        now: chrono::Utc::now(),
    };

    let loan = execute_extend_due_date(&state.service_deps, cmd).await?;

    let response = LoanExtendedResponse {
        loan_id: loan.loan_id.value(),
        new_due_date: loan.due_date,
    };

    Ok((StatusCode::OK, Json(response)))
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /loans/:id - 貸出詳細をIDで取得
pub async fn get_loan_by_id(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, QueryError> {
    let loan_id = LoanId::from_uuid(loan_id);

    match state.service_deps.loan_store.get(loan_id).await {
        Ok(Some(loan)) => Ok(Json(LoanResponse::from(loan))),
        Ok(None) => Err(QueryError::NotFound(format!(
            "Loan {} not found",
            loan_id.value()
        ))),
        Err(e) => Err(QueryError::InternalError(e.to_string())),
    }
}

// ============================================================================
// Error types
// ============================================================================

/// クエリハンドラー用のエラー型
#[derive(Debug)]
pub enum QueryError {
    NotFound(String),
    InternalError(String),
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            QueryError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            QueryError::InternalError(msg) => {
                // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
                tracing::error!("Internal error in query handler: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
