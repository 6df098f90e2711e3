use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    self, Book, Loan,
    value_objects::{BookId, LoanId, MemberId},
};
use crate::ports::loan_store::{LoanStore, LoanStoreError};

/// ストア全体の状態
///
/// 1つのMutexの下に置くことで、カウンタ減算と貸出挿入（および
/// 返却記録とカウンタ加算）が自然にアトミックな単位になる。
#[derive(Default)]
struct State {
    books: HashMap<BookId, Book>,
    loans: HashMap<LoanId, Loan>,
}

/// LoanStoreのインメモリ実装
///
/// テストとローカル実行をサポートする。書籍を登録してから使う。
pub struct InMemoryLoanStore {
    state: Mutex<State>,
}

impl InMemoryLoanStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// テスト用に書籍を登録
    pub fn add_book(&self, book: Book) {
        self.state.lock().unwrap().books.insert(book.book_id, book);
    }

    /// 現在の貸出可能冊数（検証用）
    pub fn available_copies(&self, book_id: BookId) -> Option<u32> {
        self.state
            .lock()
            .unwrap()
            .books
            .get(&book_id)
            .map(|b| b.available_copies)
    }

    /// 貸出中の貸出の件数（検証用）
    pub fn open_loan_count(&self, book_id: BookId) -> usize {
        self.state
            .lock()
            .unwrap()
            .loans
            .values()
            .filter(|l| l.book_id == book_id && l.is_open())
            .count()
    }

    /// テスト用に貸出を直接消す（ディスパッチ時点の存在確認の検証用）
    pub fn remove_loan(&self, loan_id: LoanId) {
        self.state.lock().unwrap().loans.remove(&loan_id);
    }
}

impl Default for InMemoryLoanStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoanStore for InMemoryLoanStore {
    async fn create_loan(&self, loan: &Loan) -> Result<(), LoanStoreError> {
        let mut state = self.state.lock().unwrap();

        let book = state
            .books
            .get(&loan.book_id)
            .ok_or(LoanStoreError::BookNotFound)?;

        let updated = book
            .checkout_copy()
            .map_err(|_| LoanStoreError::OutOfStock)?;

        // ロック中のため、減算と挿入は他の操作から分割して観測されない
        state.books.insert(updated.book_id, updated);
        state.loans.insert(loan.loan_id, loan.clone());

        Ok(())
    }

    async fn complete_return(
        &self,
        loan_id: LoanId,
        returned_at: DateTime<Utc>,
    ) -> Result<Loan, LoanStoreError> {
        let mut state = self.state.lock().unwrap();

        let loan = state
            .loans
            .get(&loan_id)
            .ok_or(LoanStoreError::LoanNotFound)?;

        let returned = domain::loan::complete_return(loan, returned_at)
            .map_err(|_| LoanStoreError::AlreadyReturned)?;

        let book = state
            .books
            .get(&returned.book_id)
            .ok_or(LoanStoreError::BookNotFound)?;

        let updated_book = book.return_copy().map_err(|e| {
            LoanStoreError::Backend(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("inventory invariant violated: {e:?}"),
            )))
        })?;

        state.books.insert(updated_book.book_id, updated_book);
        state.loans.insert(returned.loan_id, returned.clone());

        Ok(returned)
    }

    async fn extend_due_date(
        &self,
        loan_id: LoanId,
        new_due_date: DateTime<Utc>,
    ) -> Result<(), LoanStoreError> {
        let mut state = self.state.lock().unwrap();

        let loan = state
            .loans
            .get_mut(&loan_id)
            .ok_or(LoanStoreError::LoanNotFound)?;

        loan.due_date = new_due_date;
        Ok(())
    }

    async fn get(&self, loan_id: LoanId) -> Result<Option<Loan>, LoanStoreError> {
        Ok(self.state.lock().unwrap().loans.get(&loan_id).cloned())
    }

    async fn find_open_loan(
        &self,
        book_id: BookId,
        member_id: MemberId,
    ) -> Result<Option<Loan>, LoanStoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .loans
            .values()
            .find(|l| l.book_id == book_id && l.member_id == member_id && l.is_open())
            .cloned())
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Loan>, LoanStoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .loans
            .values()
            .filter(|l| l.is_overdue(now))
            .cloned()
            .collect())
    }

    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>, LoanStoreError> {
        Ok(self.state.lock().unwrap().books.get(&book_id).cloned())
    }
}
