#![allow(dead_code)]

use std::sync::Arc;

use library_lending::adapters::mock::{InMemoryLoanStore, InMemoryMemberDirectory};
use library_lending::application::loan::ServiceDependencies;
use library_lending::domain::{Book, Member, NotificationRequest, value_objects::*};
use library_lending::notify::notification_channel;
use tokio::sync::mpsc;

/// インメモリアダプタ一式と通知キューの受信側
///
/// enqueueされた通知リクエストは`notifications`から直接観測できる
/// （ディスパッチャを起動しない限り消費されない）。
pub struct TestContext {
    pub deps: ServiceDependencies,
    pub loan_store: Arc<InMemoryLoanStore>,
    pub member_directory: Arc<InMemoryMemberDirectory>,
    pub notifications: mpsc::Receiver<NotificationRequest>,
}

impl TestContext {
    /// 蓄積済みの通知リクエストをすべて取り出す
    pub fn drain_notifications(&mut self) -> Vec<NotificationRequest> {
        let mut drained = Vec::new();
        while let Ok(request) = self.notifications.try_recv() {
            drained.push(request);
        }
        drained
    }
}

/// インメモリアダプタでServiceDependenciesを組み立てる
pub fn setup() -> TestContext {
    let loan_store = Arc::new(InMemoryLoanStore::new());
    let member_directory = Arc::new(InMemoryMemberDirectory::new());
    let (notifier, notifications) = notification_channel(64);

    let deps = ServiceDependencies {
        loan_store: loan_store.clone(),
        member_directory: member_directory.clone(),
        notifier,
    };

    TestContext {
        deps,
        loan_store,
        member_directory,
        notifications,
    }
}

/// テスト用の書籍を登録
pub fn seed_book(ctx: &TestContext, title: &str, total_copies: u32) -> BookId {
    let book_id = BookId::new();
    ctx.loan_store
        .add_book(Book::new(book_id, title, total_copies));
    book_id
}

/// テスト用の会員を登録
pub fn seed_member(ctx: &TestContext, name: &str, email: &str) -> MemberId {
    let member_id = MemberId::new();
    ctx.member_directory
        .add_member(Member::new(member_id, name, email));
    member_id
}
