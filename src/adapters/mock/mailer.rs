use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::mailer::{Mailer, MailerError};

/// 送信試行の記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mock implementation of Mailer for tests
///
/// Records every send attempt and replays scripted outcomes.
/// When the script runs out, sends succeed.
pub struct RecordingMailer {
    attempts: Mutex<Vec<SentMail>>,
    script: Mutex<VecDeque<Result<(), MailerError>>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
        }
    }

    /// 次のsendの結果を予約する（先入れ先出し）
    pub fn push_outcome(&self, outcome: Result<(), MailerError>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    /// 失敗をn回予約するショートカット
    pub fn fail_times(&self, error: MailerError, times: usize) {
        let mut script = self.script.lock().unwrap();
        for _ in 0..times {
            script.push_back(Err(error.clone()));
        }
    }

    /// これまでの送信試行回数
    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    /// これまでの送信試行の記録
    pub fn attempts(&self) -> Vec<SentMail> {
        self.attempts.lock().unwrap().clone()
    }
}

impl Default for RecordingMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        self.attempts.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });

        self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

/// Mailer implementation that only logs
///
/// The real mail transport lives outside this service; local runs use
/// this adapter so deliveries show up in the log instead.
pub struct LoggingMailer;

impl LoggingMailer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoggingMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailer for LoggingMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), MailerError> {
        tracing::info!(to, subject, "mail send (logging only)");
        Ok(())
    }
}
