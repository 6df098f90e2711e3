use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};

use crate::domain::NotificationRequest;
use crate::ports::{LoanStore, Mailer, MailerError};

/// 初回送信後の最大リトライ回数
pub const MAX_RETRIES: u32 = 3;

/// リトライ間隔（固定、指数バックオフではない）
pub const RETRY_DELAY: Duration = Duration::from_secs(60);

/// ディスパッチキューの既定容量
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// 通知キューへの送信ハンドル
///
/// ライフサイクルマネージャと延滞スキャナが保持する。
/// enqueueはブロックしない：配信はキューの向こう側で行われ、
/// 呼び出し元の操作の成否は配信結果に依存しない。
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<NotificationRequest>,
}

impl Notifier {
    /// 通知リクエストをキューに積む
    ///
    /// キューが満杯の場合はリクエストを破棄してfalseを返す
    /// （ベストエフォート配信のため、呼び出し元にエラーは返さない）。
    pub fn enqueue(&self, request: NotificationRequest) -> bool {
        match self.tx.try_send(request) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(request)) => {
                tracing::warn!(
                    kind = request.kind.as_str(),
                    loan_id = %request.loan_id.value(),
                    "notification queue is full; dropping request"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(request)) => {
                tracing::warn!(
                    kind = request.kind.as_str(),
                    loan_id = %request.loan_id.value(),
                    "notification dispatcher is gone; dropping request"
                );
                false
            }
        }
    }
}

/// 通知キューを作成する
pub fn notification_channel(capacity: usize) -> (Notifier, mpsc::Receiver<NotificationRequest>) {
    let (tx, rx) = mpsc::channel(capacity);
    (Notifier { tx }, rx)
}

/// 通知ディスパッチャ
///
/// キューからリクエストを取り出し、1件ごとに独立したタスクで配信する。
/// リトライ待ちの1件が後続の配信を塞がないようにするため。
pub struct NotificationDispatcher {
    rx: mpsc::Receiver<NotificationRequest>,
    loan_store: Arc<dyn LoanStore>,
    mailer: Arc<dyn Mailer>,
}

impl NotificationDispatcher {
    pub fn new(
        rx: mpsc::Receiver<NotificationRequest>,
        loan_store: Arc<dyn LoanStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            rx,
            loan_store,
            mailer,
        }
    }

    /// ディスパッチループ
    ///
    /// すべてのNotifierハンドルがドロップされると終了する。
    pub async fn run(mut self) {
        while let Some(request) = self.rx.recv().await {
            let loan_store = Arc::clone(&self.loan_store);
            let mailer = Arc::clone(&self.mailer);
            tokio::spawn(async move {
                deliver(loan_store, mailer, request).await;
            });
        }
    }
}

/// 1件の通知を配信する
///
/// ポリシー：
/// - 参照先の貸出が消えていたら黙って破棄（エラーではない）
/// - 一時的失敗は固定60秒間隔で最大3回までリトライ
/// - 恒久的失敗は即座に破棄
/// - リトライを使い切ったら破棄し、エラーログで報告（それ以上の
///   エスカレーションはしない）
async fn deliver(
    loan_store: Arc<dyn LoanStore>,
    mailer: Arc<dyn Mailer>,
    request: NotificationRequest,
) {
    match loan_store.get(request.loan_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            tracing::debug!(
                kind = request.kind.as_str(),
                loan_id = %request.loan_id.value(),
                "loan no longer exists; discarding notification"
            );
            return;
        }
        // 存在確認そのものの失敗で配信は諦めない
        Err(e) => {
            tracing::warn!(
                loan_id = %request.loan_id.value(),
                error = %e,
                "loan existence check failed; attempting delivery anyway"
            );
        }
    }

    let mut attempt: u32 = 1;
    loop {
        match mailer
            .send(&request.recipient, &request.subject, &request.body)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    kind = request.kind.as_str(),
                    loan_id = %request.loan_id.value(),
                    attempt,
                    "notification delivered"
                );
                return;
            }
            Err(MailerError::Permanent(reason)) => {
                tracing::error!(
                    kind = request.kind.as_str(),
                    loan_id = %request.loan_id.value(),
                    attempt,
                    reason = %reason,
                    "permanent delivery failure; dropping notification"
                );
                return;
            }
            Err(MailerError::Retryable(reason)) => {
                if attempt > MAX_RETRIES {
                    tracing::error!(
                        kind = request.kind.as_str(),
                        loan_id = %request.loan_id.value(),
                        attempts = attempt,
                        reason = %reason,
                        "delivery retries exhausted; dropping notification"
                    );
                    return;
                }
                tracing::warn!(
                    kind = request.kind.as_str(),
                    loan_id = %request.loan_id.value(),
                    attempt,
                    reason = %reason,
                    "transient delivery failure; retrying after {}s",
                    RETRY_DELAY.as_secs()
                );
                sleep(RETRY_DELAY).await;
                attempt += 1;
            }
        }
    }
}
