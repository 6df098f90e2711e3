use crate::domain::{Book, Loan, value_objects::{BookId, LoanId, MemberId}};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// 貸出ストアのエラー
///
/// 呼び出し側が在庫切れ・未登録をバックエンド障害と区別できるよう、
/// クエリ用ポートのBox<dyn Error>エイリアスではなくenumで定義する。
#[derive(Debug, Error)]
pub enum LoanStoreError {
    /// 貸出可能な冊数が0（カウンタのアトミックな減算に失敗）
    #[error("No available copies")]
    OutOfStock,

    /// 書籍が登録されていない
    #[error("Book not found")]
    BookNotFound,

    /// 貸出が登録されていない
    #[error("Loan not found")]
    LoanNotFound,

    /// 既に返却済み
    #[error("Loan is already returned")]
    AlreadyReturned,

    /// ストレージバックエンドの障害
    #[error("Storage backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// 貸出ストアポート
///
/// 貸出レコードとBook.available_copiesカウンタの永続化を抽象化する。
/// カウンタは独立したread-then-writeでは決して更新されない：
/// create_loan / complete_return がそれぞれ
/// {カウンタ減算, 貸出挿入} / {返却記録, カウンタ加算} を
/// 1つのアトミックな単位として適用する。これはストレージ層の
/// トランザクション原始性（単一のread-modify-write、または
/// 2つの書き込みに跨るトランザクション）に対する要求である。
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// 貸出を作成する
    ///
    /// 書籍のavailable_copiesを1減らし、貸出を挿入する。
    /// 両方が適用されるか、どちらも適用されないかのいずれか。
    /// カウンタが0の場合は`OutOfStock`を返し、何も変更しない。
    async fn create_loan(&self, loan: &Loan) -> Result<(), LoanStoreError>;

    /// 返却を記録する
    ///
    /// returned_atを設定し、書籍のavailable_copiesを1増やす。
    /// 両方が適用されるか、どちらも適用されないかのいずれか。
    /// 更新後の貸出を返す。
    async fn complete_return(
        &self,
        loan_id: LoanId,
        returned_at: DateTime<Utc>,
    ) -> Result<Loan, LoanStoreError>;

    /// 返却期限を更新する
    async fn extend_due_date(
        &self,
        loan_id: LoanId,
        new_due_date: DateTime<Utc>,
    ) -> Result<(), LoanStoreError>;

    /// IDで貸出を取得する
    ///
    /// ディスパッチ時点の貸出存在確認にも使用される。
    async fn get(&self, loan_id: LoanId) -> Result<Option<Loan>, LoanStoreError>;

    /// (書籍, 会員)の貸出中の貸出を取得する
    ///
    /// 同一ペアの貸出中の貸出は高々1件（上流で保証）。
    async fn find_open_loan(
        &self,
        book_id: BookId,
        member_id: MemberId,
    ) -> Result<Option<Loan>, LoanStoreError>;

    /// 延滞中の貸出をすべて取得する
    ///
    /// due_date < now かつ未返却の貸出を返す。
    /// 延滞スキャナのバッチで使用される。
    async fn find_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Loan>, LoanStoreError>;

    /// IDで書籍を取得する
    ///
    /// 通知メッセージの書籍タイトル表示に使用される。
    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>, LoanStoreError>;
}
