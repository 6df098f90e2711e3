use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Loan;
use crate::domain::loan::DEFAULT_LOAN_PERIOD_DAYS;

/// 貸出作成のリクエスト（POST /books/:id/loan）
///
/// duration_daysが整数でないリクエストはデシリアライズの段階で拒否される。
#[derive(Debug, Deserialize)]
pub struct LoanBookRequest {
    pub member_id: Uuid,
    pub duration_days: Option<i64>,
}

impl LoanBookRequest {
    pub fn duration_days(&self) -> i64 {
        self.duration_days.unwrap_or(DEFAULT_LOAN_PERIOD_DAYS)
    }
}

/// 返却のリクエスト（POST /books/:id/return）
#[derive(Debug, Deserialize)]
pub struct ReturnBookRequest {
    pub member_id: Uuid,
}

/// 期限延長のリクエスト（POST /loans/:id/extend）
#[derive(Debug, Deserialize)]
pub struct ExtendDueDateRequest {
    pub additional_days: i64,
}

/// 貸出作成のレスポンス
#[derive(Debug, Serialize)]
pub struct LoanCreatedResponse {
    pub loan_id: Uuid,
    pub book_id: Uuid,
    pub member_id: Uuid,
    pub loaned_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

/// 返却のレスポンス
#[derive(Debug, Serialize)]
pub struct BookReturnedResponse {
    pub loan_id: Uuid,
    pub returned_at: DateTime<Utc>,
}

/// 期限延長のレスポンス
#[derive(Debug, Serialize)]
pub struct LoanExtendedResponse {
    pub loan_id: Uuid,
    pub new_due_date: DateTime<Utc>,
}

/// 貸出レスポンス（GET /loans/:id）
#[derive(Debug, Serialize)]
pub struct LoanResponse {
    pub loan_id: Uuid,
    pub book_id: Uuid,
    pub member_id: Uuid,
    pub loaned_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: String,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        let status = if loan.is_returned() { "returned" } else { "open" };
        Self {
            loan_id: loan.loan_id.value(),
            book_id: loan.book_id.value(),
            member_id: loan.member_id.value(),
            loaned_at: loan.loaned_at,
            due_date: loan.due_date,
            returned_at: loan.returned_at,
            status: status.to_string(),
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
