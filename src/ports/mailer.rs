use async_trait::async_trait;
use thiserror::Error;

/// メール配信の失敗
///
/// 一時的な失敗（タイムアウト含む）と恒久的な失敗を区別する。
/// リトライするかどうかはこの区別だけで決まる。
#[derive(Debug, Clone, Error)]
pub enum MailerError {
    /// リトライ可能な失敗（接続断、タイムアウトなど）
    #[error("Retryable delivery failure: {0}")]
    Retryable(String),

    /// リトライしても無駄な失敗（宛先不正など）
    #[error("Permanent delivery failure: {0}")]
    Permanent(String),
}

/// メール配信ポート
///
/// 外部のメール配信コラボレータとの契約。
/// send(to, subject, body) → 成功 / 失敗 のみを前提とし、
/// トランスポートの詳細（SMTP等）はアダプタに閉じる。
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError>;
}
