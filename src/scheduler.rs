use std::sync::Arc;

use chrono::Utc;
use cron::Schedule;
use tokio::sync::Mutex;

use crate::application::loan::{ServiceDependencies, run_overdue_scan};

/// 既定のスキャンスケジュール：毎日 00:00 UTC（秒つきcron式）
pub const DEFAULT_SCAN_SCHEDULE: &str = "0 0 0 * * *";

/// 延滞スキャンのスケジュールループ
///
/// cron式の次回時刻まで眠り、スキャンを独立タスクとして起動する。
/// 前回の実行がまだ走っている場合、そのtickはスキップする
/// （run-lockによる同時実行の排除）。スキャンの失敗はその回の
/// 実行だけを打ち切り、ループは次のtickへ進む。
pub async fn run_scan_loop(deps: ServiceDependencies, schedule: Schedule) {
    let run_lock = Arc::new(Mutex::new(()));

    loop {
        let now = Utc::now();
        let Some(next) = schedule.after(&now).next() else {
            tracing::error!("scan schedule yields no future tick; stopping scan loop");
            return;
        };

        let wait = (next - now).to_std().unwrap_or_default();
        tracing::debug!(next_tick = %next, "waiting for next overdue scan tick");
        tokio::time::sleep(wait).await;

        match Arc::clone(&run_lock).try_lock_owned() {
            Ok(guard) => {
                let deps = deps.clone();
                tokio::spawn(async move {
                    let _guard = guard;
                    match run_overdue_scan(&deps, Utc::now()).await {
                        Ok(report) => {
                            tracing::info!(
                                overdue_found = report.overdue_found,
                                enqueued = report.enqueued,
                                skipped = report.skipped,
                                "scheduled overdue scan completed"
                            );
                        }
                        Err(e) => {
                            // 次のtickで再実行されるので、ここでは報告のみ
                            tracing::error!(error = %e, "scheduled overdue scan failed");
                        }
                    }
                });
            }
            Err(_) => {
                tracing::warn!("previous overdue scan still running; skipping this tick");
            }
        }
    }
}
