use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::application::loan::LoanApplicationError;

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError(LoanApplicationError);

impl From<LoanApplicationError> for ApiError {
    fn from(err: LoanApplicationError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self.0 {
            // 404 Not Found - リクエストされたリソースが存在しない
            LoanApplicationError::LoanNotFound => {
                (StatusCode::NOT_FOUND, "LOAN_NOT_FOUND", "Loan not found".to_string())
            }
            LoanApplicationError::BookNotFound => {
                (StatusCode::NOT_FOUND, "BOOK_NOT_FOUND", "Book not found".to_string())
            }

            // 422 Unprocessable Entity - ビジネスルール違反
            LoanApplicationError::OutOfStock => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "OUT_OF_STOCK",
                "No available copies.".to_string(),
            ),
            LoanApplicationError::MemberNotFound => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MEMBER_NOT_FOUND",
                "Member does not exist.".to_string(),
            ),
            LoanApplicationError::NoActiveLoan => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NO_ACTIVE_LOAN",
                "Active loan does not exist.".to_string(),
            ),
            LoanApplicationError::AlreadyReturned => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "ALREADY_RETURNED",
                "Cannot extend a returned loan".to_string(),
            ),
            LoanApplicationError::AlreadyOverdue => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "ALREADY_OVERDUE",
                "Loan is already overdue".to_string(),
            ),
            LoanApplicationError::InvalidDays(days) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_DAYS",
                format!("Additional days must be greater than 0 (got {days})"),
            ),

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            LoanApplicationError::LoanStoreError(ref e) => {
                tracing::error!("Loan store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LOAN_STORE_ERROR",
                    "Failed to access loan storage".to_string(),
                )
            }
            LoanApplicationError::MemberDirectoryError(ref e) => {
                tracing::error!("Member directory error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MEMBER_DIRECTORY_ERROR",
                    "Member directory error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
