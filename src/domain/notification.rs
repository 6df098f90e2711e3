use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Loan, LoanId, Member};

/// 通知の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    /// 貸出完了通知
    LoanCreated,
    /// 延滞通知
    LoanOverdue,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::LoanCreated => "loan_created",
            NotificationKind::LoanOverdue => "loan_overdue",
        }
    }
}

/// 通知リクエスト
///
/// ライフサイクルマネージャまたは延滞スキャナが生成し、
/// ディスパッチャが1回だけ消費する（ベストエフォート配信）。
/// ディスパッチキューの外では永続化されない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub kind: NotificationKind,
    pub loan_id: LoanId,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// 純粋関数：貸出完了通知を組み立てる
///
/// 本文のテンプレートは互換性維持のため元システムのものをそのまま使う。
pub fn loan_created_notification(
    loan: &Loan,
    member: &Member,
    book_title: &str,
) -> NotificationRequest {
    NotificationRequest {
        kind: NotificationKind::LoanCreated,
        loan_id: loan.loan_id,
        recipient: member.email.clone(),
        subject: "Book Loaned Successfully".to_string(),
        body: format!(
            "Hello {},\n\nYou have successfully loaned \"{}\".\nPlease return it by the due date.",
            member.name, book_title
        ),
    }
}

/// 純粋関数：延滞通知を組み立てる
///
/// 本文には書籍タイトル・返却期限・延滞日数（暦日、切り捨て）を含める。
pub fn overdue_notification(
    loan: &Loan,
    member: &Member,
    book_title: &str,
    now: DateTime<Utc>,
) -> NotificationRequest {
    let days_overdue = loan.days_overdue(now);

    NotificationRequest {
        kind: NotificationKind::LoanOverdue,
        loan_id: loan.loan_id,
        recipient: member.email.clone(),
        subject: "Book Loan Overdue".to_string(),
        body: format!(
            "Hello {},\n\nYour loan for the book with title \"{}\" is overdue.\nIt was due on {} and is {} day(s) overdue.\nPlease return it.",
            member.name,
            book_title,
            loan.due_date.format("%Y-%m-%d"),
            days_overdue
        ),
    }
}
