use thiserror::Error;

use crate::ports::LoanStoreError;

/// 貸出管理アプリケーション層のエラー
///
/// ライフサイクルエラーは呼び出し元に同期的に返され、自動リトライされない。
#[derive(Debug, Error)]
pub enum LoanApplicationError {
    /// 貸出可能な冊数が0
    #[error("No available copies")]
    OutOfStock,

    /// 書籍が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// 会員が存在しない
    #[error("Member not found")]
    MemberNotFound,

    /// (書籍, 会員)の貸出中の貸出が存在しない
    #[error("Active loan does not exist")]
    NoActiveLoan,

    /// 貸出が見つからない
    #[error("Loan not found")]
    LoanNotFound,

    /// 既に返却済み
    #[error("Loan is already returned")]
    AlreadyReturned,

    /// 既に延滞中のため延長不可
    #[error("Loan is already overdue")]
    AlreadyOverdue,

    /// 延長日数・貸出日数が不正（1日以上の整数が必要）
    #[error("Invalid number of days: {0}")]
    InvalidDays(i64),

    /// 貸出ストアの障害
    #[error("Loan store error")]
    LoanStoreError(#[source] LoanStoreError),

    /// 会員ディレクトリの障害
    #[error("Member directory error")]
    MemberDirectoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<LoanStoreError> for LoanApplicationError {
    fn from(err: LoanStoreError) -> Self {
        match err {
            LoanStoreError::OutOfStock => LoanApplicationError::OutOfStock,
            LoanStoreError::BookNotFound => LoanApplicationError::BookNotFound,
            LoanStoreError::LoanNotFound => LoanApplicationError::LoanNotFound,
            LoanStoreError::AlreadyReturned => LoanApplicationError::AlreadyReturned,
            backend @ LoanStoreError::Backend(_) => LoanApplicationError::LoanStoreError(backend),
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LoanApplicationError>;
