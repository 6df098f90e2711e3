use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::notification::overdue_notification;

use super::loan_service::ServiceDependencies;

/// スキャン実行の集計結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverdueScanReport {
    /// 検出した延滞中の貸出の件数
    pub overdue_found: usize,
    /// キューに積めた通知の件数
    pub enqueued: usize,
    /// 会員不明・連絡先なし等でスキップした件数
    pub skipped: usize,
}

/// スキャン実行そのものの失敗
///
/// 個々の貸出の処理失敗はバッチを止めない（スキップして続行）。
/// このエラーは延滞クエリ自体が失敗した場合のみで、その回の実行を
/// 打ち切る。次のスケジュールで再実行される（実行途中の
/// チェックポイントはない）。
#[derive(Debug, Error)]
pub enum OverdueScanError {
    #[error("Overdue loan query failed")]
    Query(#[source] crate::ports::LoanStoreError),
}

/// 延滞スキャン（純粋な関数）
///
/// 定期的に実行され、延滞中の貸出1件につき1通の延滞通知をキューに積む。
///
/// ビジネスルール：
/// - due_date < now かつ未返却の貸出が対象
/// - 会員が存在しない、または連絡先が空の場合はその貸出をスキップ
///   （ログのみ、バッチは継続）
/// - 同一実行内では貸出1件につき高々1通。実行をまたいだ重複排除は
///   行わない：返却されるまで毎実行1通が積まれる
///
/// # 戻り値
/// 件数の集計（検出・キュー投入・スキップ）
pub async fn run_overdue_scan(
    deps: &ServiceDependencies,
    now: DateTime<Utc>,
) -> Result<OverdueScanReport, OverdueScanError> {
    // 1. 延滞中の貸出を列挙（ここの失敗だけが実行全体の失敗）
    let overdue_loans = deps
        .loan_store
        .find_overdue(now)
        .await
        .map_err(OverdueScanError::Query)?;

    let mut report = OverdueScanReport {
        overdue_found: overdue_loans.len(),
        ..OverdueScanReport::default()
    };

    // 2. 1件ずつ通知を組み立ててキューに積む。
    //    1件の失敗は残りの処理を妨げない。
    for loan in &overdue_loans {
        let member = match deps.member_directory.get(loan.member_id).await {
            Ok(Some(member)) => member,
            Ok(None) => {
                tracing::warn!(
                    loan_id = %loan.loan_id.value(),
                    member_id = %loan.member_id.value(),
                    "overdue loan references unknown member; skipping"
                );
                report.skipped += 1;
                continue;
            }
            Err(e) => {
                tracing::warn!(
                    loan_id = %loan.loan_id.value(),
                    error = %e,
                    "member lookup failed for overdue loan; skipping"
                );
                report.skipped += 1;
                continue;
            }
        };

        if !member.has_contact_address() {
            tracing::warn!(
                loan_id = %loan.loan_id.value(),
                member_id = %loan.member_id.value(),
                "member has no contact address; skipping overdue notification"
            );
            report.skipped += 1;
            continue;
        }

        let book_title = match deps.loan_store.get_book(loan.book_id).await {
            Ok(Some(book)) => book.title,
            Ok(None) => {
                tracing::warn!(
                    loan_id = %loan.loan_id.value(),
                    book_id = %loan.book_id.value(),
                    "overdue loan references unknown book; skipping"
                );
                report.skipped += 1;
                continue;
            }
            Err(e) => {
                tracing::warn!(
                    loan_id = %loan.loan_id.value(),
                    error = %e,
                    "book lookup failed for overdue loan; skipping"
                );
                report.skipped += 1;
                continue;
            }
        };

        if deps
            .notifier
            .enqueue(overdue_notification(loan, &member, &book_title, now))
        {
            report.enqueued += 1;
        } else {
            report.skipped += 1;
        }
    }

    tracing::info!(
        overdue_found = report.overdue_found,
        enqueued = report.enqueued,
        skipped = report.skipped,
        "overdue scan finished"
    );

    Ok(report)
}
