use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, ExtendDueDateError, LoanId, MemberId, ReturnLoanError};

/// 既定の貸出期間（日数）
pub const DEFAULT_LOAN_PERIOD_DAYS: i64 = 14;

/// Loan集約 - 1冊の書籍の1回の貸出
///
/// 状態は2つ：貸出中（open）と返却済み。
/// `returned_at`のSome/Noneがそのまま返却フラグであり、
/// 「返却済みなのに返却日がない」状態は型で排除される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: LoanId,

    // 他の集約への参照（IDのみ）
    pub book_id: BookId,
    pub member_id: MemberId,

    // 貸出管理の責務
    pub loaned_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Loan {
    /// 貸出中か
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }

    /// 返却済みか
    pub fn is_returned(&self) -> bool {
        self.returned_at.is_some()
    }

    /// 延滞中か（貸出中かつ返却期限超過）
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && self.due_date < now
    }

    /// 延滞日数（暦日単位、切り捨て）
    ///
    /// now.date() - due_date.date() で計算する。
    /// 延滞していない場合は0を返す。
    pub fn days_overdue(&self, now: DateTime<Utc>) -> i64 {
        (now.date_naive() - self.due_date.date_naive()).num_days().max(0)
    }
}

/// 純粋関数：書籍を貸し出す
///
/// ビジネスルール：
/// - 返却期限は貸出日 + duration_days
/// - 作成時点では未返却
///
/// 副作用なし。新しいLoanを返す。
/// 在庫の減算と組にしたアトミックな永続化はストレージ層の責務。
pub fn open_loan(
    book_id: BookId,
    member_id: MemberId,
    loaned_at: DateTime<Utc>,
    duration_days: i64,
) -> Loan {
    Loan {
        loan_id: LoanId::new(),
        book_id,
        member_id,
        loaned_at,
        due_date: loaned_at + Duration::days(duration_days),
        returned_at: None,
    }
}

/// 純粋関数：書籍を返却する
///
/// ビジネスルール：
/// - 延滞していても返却は受け付ける
/// - 返却済みの貸出は再返却不可
///
/// 副作用なし。新しいLoanを返す。
pub fn complete_return(loan: &Loan, returned_at: DateTime<Utc>) -> Result<Loan, ReturnLoanError> {
    if loan.is_returned() {
        return Err(ReturnLoanError::AlreadyReturned);
    }

    Ok(Loan {
        returned_at: Some(returned_at),
        ..loan.clone()
    })
}

/// 純粋関数：返却期限を延長する
///
/// ビジネスルール：
/// - 返却済みは延長不可
/// - 延滞中は延長不可
/// - 延長日数は1日以上
/// - 期限は先送りのみ（短縮は起こり得ない：additional_days >= 1）
///
/// 副作用なし。新しいLoanを返す。
pub fn extend_due_date(
    loan: &Loan,
    additional_days: i64,
    now: DateTime<Utc>,
) -> Result<Loan, ExtendDueDateError> {
    if loan.is_returned() {
        return Err(ExtendDueDateError::AlreadyReturned);
    }

    if loan.due_date < now {
        return Err(ExtendDueDateError::AlreadyOverdue);
    }

    if additional_days < 1 {
        return Err(ExtendDueDateError::InvalidAdditionalDays);
    }

    Ok(Loan {
        due_date: loan.due_date + Duration::days(additional_days),
        ..loan.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_loan(loaned_at: DateTime<Utc>) -> Loan {
        open_loan(
            BookId::new(),
            MemberId::new(),
            loaned_at,
            DEFAULT_LOAN_PERIOD_DAYS,
        )
    }

    // open_loan() のテスト
    #[test]
    fn test_open_loan_sets_due_date_from_duration() {
        let loaned_at = Utc::now();
        let loan = open_loan(BookId::new(), MemberId::new(), loaned_at, 7);

        assert_eq!(loan.loaned_at, loaned_at);
        assert_eq!(loan.due_date, loaned_at + Duration::days(7));
        assert!(loan.is_open());
        assert_eq!(loan.returned_at, None);
    }

    #[test]
    fn test_open_loan_due_date_is_not_before_loan_date() {
        let loaned_at = Utc::now();
        let loan = open_test_loan(loaned_at);
        assert!(loan.due_date >= loan.loaned_at);
    }

    // complete_return() のテスト
    #[test]
    fn test_complete_return_sets_returned_at() {
        let loaned_at = Utc::now();
        let loan = open_test_loan(loaned_at);
        let returned_at = loaned_at + Duration::days(7);

        let returned = complete_return(&loan, returned_at).unwrap();

        assert!(returned.is_returned());
        assert_eq!(returned.returned_at, Some(returned_at));
        assert!(returned.returned_at.unwrap() >= returned.loaned_at);
    }

    #[test]
    fn test_complete_return_fails_when_already_returned() {
        let loaned_at = Utc::now();
        let loan = open_test_loan(loaned_at);
        let returned = complete_return(&loan, loaned_at + Duration::days(7)).unwrap();

        let result = complete_return(&returned, loaned_at + Duration::days(8));
        assert_eq!(result.unwrap_err(), ReturnLoanError::AlreadyReturned);
    }

    // extend_due_date() のテスト
    #[test]
    fn test_extend_due_date_moves_due_date_forward() {
        let loaned_at = Utc::now();
        let loan = open_test_loan(loaned_at);
        let now = loaned_at + Duration::days(5);

        let extended = extend_due_date(&loan, 7, now).unwrap();

        assert_eq!(extended.due_date, loan.due_date + Duration::days(7));
        assert!(extended.due_date > loan.due_date);
    }

    #[test]
    fn test_extend_due_date_fails_when_returned() {
        let loaned_at = Utc::now();
        let loan = open_test_loan(loaned_at);
        let returned = complete_return(&loan, loaned_at + Duration::days(3)).unwrap();

        let result = extend_due_date(&returned, 7, loaned_at + Duration::days(4));
        assert_eq!(result.unwrap_err(), ExtendDueDateError::AlreadyReturned);
    }

    #[test]
    fn test_extend_due_date_fails_when_overdue() {
        let loaned_at = Utc::now();
        let loan = open_test_loan(loaned_at);
        let now = loaned_at + Duration::days(20);

        let result = extend_due_date(&loan, 7, now);
        assert_eq!(result.unwrap_err(), ExtendDueDateError::AlreadyOverdue);
    }

    #[test]
    fn test_extend_due_date_rejects_non_positive_days() {
        let loaned_at = Utc::now();
        let loan = open_test_loan(loaned_at);
        let now = loaned_at + Duration::days(1);

        for days in [0, -1, -14] {
            let result = extend_due_date(&loan, days, now);
            assert_eq!(result.unwrap_err(), ExtendDueDateError::InvalidAdditionalDays);
        }
    }

    // is_overdue() のテスト
    #[test]
    fn test_is_overdue_false_before_due_date() {
        let loaned_at = Utc::now();
        let loan = open_test_loan(loaned_at);
        assert!(!loan.is_overdue(loaned_at + Duration::days(7)));
    }

    #[test]
    fn test_is_overdue_true_after_due_date() {
        let loaned_at = Utc::now();
        let loan = open_test_loan(loaned_at);
        assert!(loan.is_overdue(loaned_at + Duration::days(20)));
    }

    #[test]
    fn test_is_overdue_false_when_returned() {
        let loaned_at = Utc::now();
        let loan = open_test_loan(loaned_at);
        let returned = complete_return(&loan, loaned_at + Duration::days(7)).unwrap();
        assert!(!returned.is_overdue(loaned_at + Duration::days(20)));
    }

    // days_overdue() のテスト
    #[test]
    fn test_days_overdue_floors_to_whole_days() {
        let loaned_at = Utc::now();
        let loan = open_test_loan(loaned_at);

        // 期限から2日と数時間後 → 暦日差で切り捨て
        let now = loan.due_date + Duration::days(2) + Duration::hours(3);
        let expected = (now.date_naive() - loan.due_date.date_naive()).num_days();
        assert_eq!(loan.days_overdue(now), expected);
    }

    #[test]
    fn test_days_overdue_is_zero_before_due_date() {
        let loaned_at = Utc::now();
        let loan = open_test_loan(loaned_at);
        assert_eq!(loan.days_overdue(loaned_at), 0);
    }
}
