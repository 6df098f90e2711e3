use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{
    self, Loan, Member,
    notification::loan_created_notification,
    value_objects::{BookId, LoanId, MemberId},
};
use crate::notify::Notifier;
use crate::ports::{LoanStore, MemberDirectory};

use super::errors::{LoanApplicationError, Result};

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub loan_store: Arc<dyn LoanStore>,
    pub member_directory: Arc<dyn MemberDirectory>,
    pub notifier: Notifier,
}

/// コマンド：書籍を貸し出す
#[derive(Debug, Clone)]
pub struct CreateLoan {
    pub book_id: BookId,
    pub member_id: MemberId,
    pub duration_days: i64,
    pub now: DateTime<Utc>,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone)]
pub struct ReturnLoan {
    pub book_id: BookId,
    pub member_id: MemberId,
    pub now: DateTime<Utc>,
}

/// コマンド：返却期限を延長する
#[derive(Debug, Clone)]
pub struct ExtendDueDate {
    pub loan_id: LoanId,
    pub additional_days: i64,
    pub now: DateTime<Utc>,
}

/// 会員を解決するヘルパー関数
async fn load_member(deps: &ServiceDependencies, member_id: MemberId) -> Result<Member> {
    deps.member_directory
        .get(member_id)
        .await
        .map_err(LoanApplicationError::MemberDirectoryError)?
        .ok_or(LoanApplicationError::MemberNotFound)
}

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - 会員が存在すること
/// - 貸出可能な冊数が1冊以上あること
/// - 貸出挿入とカウンタ減算は1つのアトミックな単位
///
/// 成功時にloan_created通知をキューに積む。enqueueは
/// fire-and-forgetであり、配信の成否はこの操作の結果に影響しない。
pub async fn create_loan(deps: &ServiceDependencies, cmd: CreateLoan) -> Result<Loan> {
    if cmd.duration_days < 1 {
        return Err(LoanApplicationError::InvalidDays(cmd.duration_days));
    }

    // 1. 会員の存在確認
    let member = load_member(deps, cmd.member_id).await?;

    // 2. ドメイン層の純粋関数で貸出を組み立て
    let loan = domain::loan::open_loan(cmd.book_id, cmd.member_id, cmd.now, cmd.duration_days);

    // 3. アトミックな {カウンタ減算, 貸出挿入}
    //    在庫切れ・書籍未登録はここでLoanStoreErrorとして返る
    deps.loan_store.create_loan(&loan).await?;

    // 4. 通知リクエストをキューに積む（配信は待たない）
    match deps.loan_store.get_book(cmd.book_id).await {
        Ok(Some(book)) => {
            deps.notifier
                .enqueue(loan_created_notification(&loan, &member, &book.title));
        }
        Ok(None) => {
            tracing::warn!(
                book_id = %cmd.book_id.value(),
                "book vanished after loan creation; skipping notification"
            );
        }
        Err(e) => {
            tracing::warn!(
                book_id = %cmd.book_id.value(),
                error = %e,
                "book lookup failed after loan creation; skipping notification"
            );
        }
    }

    Ok(loan)
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - (書籍, 会員)の貸出中の貸出が存在すること
/// - 返却記録とカウンタ加算は1つのアトミックな単位
///
/// 通知は発生しない。
pub async fn return_loan(deps: &ServiceDependencies, cmd: ReturnLoan) -> Result<Loan> {
    // 1. 貸出中の貸出を特定
    let loan = deps
        .loan_store
        .find_open_loan(cmd.book_id, cmd.member_id)
        .await?
        .ok_or(LoanApplicationError::NoActiveLoan)?;

    // 2. アトミックな {返却記録, カウンタ加算}
    let returned = deps.loan_store.complete_return(loan.loan_id, cmd.now).await?;

    Ok(returned)
}

/// 返却期限を延長する
///
/// ビジネスルール：
/// - 貸出が存在すること
/// - 返却済み・延滞中は延長不可
/// - 延長日数は1日以上
///
/// 通知は発生しない。
pub async fn extend_due_date(deps: &ServiceDependencies, cmd: ExtendDueDate) -> Result<Loan> {
    // 1. 貸出を取得
    let loan = deps
        .loan_store
        .get(cmd.loan_id)
        .await?
        .ok_or(LoanApplicationError::LoanNotFound)?;

    // 2. ドメイン層の純粋関数でバリデーションと期限計算
    let extended = domain::loan::extend_due_date(&loan, cmd.additional_days, cmd.now)
        .map_err(|e| match e {
            domain::ExtendDueDateError::AlreadyReturned => LoanApplicationError::AlreadyReturned,
            domain::ExtendDueDateError::AlreadyOverdue => LoanApplicationError::AlreadyOverdue,
            domain::ExtendDueDateError::InvalidAdditionalDays => {
                LoanApplicationError::InvalidDays(cmd.additional_days)
            }
        })?;

    // 3. 新しい期限を永続化
    deps.loan_store
        .extend_due_date(extended.loan_id, extended.due_date)
        .await?;

    Ok(extended)
}
