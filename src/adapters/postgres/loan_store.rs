use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::domain::{
    Book, Loan,
    value_objects::{BookId, LoanId, MemberId},
};
use crate::ports::loan_store::{LoanStore as LoanStoreTrait, LoanStoreError};

/// sqlxのエラーをバックエンドエラーに包む
fn backend(e: sqlx::Error) -> LoanStoreError {
    LoanStoreError::Backend(Box::new(e))
}

/// PostgreSQLの行データをLoanに変換する
fn map_row_to_loan(row: &PgRow) -> Loan {
    Loan {
        loan_id: LoanId::from_uuid(row.get("loan_id")),
        book_id: BookId::from_uuid(row.get("book_id")),
        member_id: MemberId::from_uuid(row.get("member_id")),
        loaned_at: row.get("loaned_at"),
        due_date: row.get("due_date"),
        returned_at: row.get("returned_at"),
    }
}

/// PostgreSQLの行データをBookに変換する
///
/// 冊数カラム（INTEGER）のi32からu32への変換でエラーハンドリングを行う。
fn map_row_to_book(row: &PgRow) -> Result<Book, LoanStoreError> {
    let total_copies: i32 = row.get("total_copies");
    let available_copies: i32 = row.get("available_copies");

    let convert = |value: i32, column: &str| -> Result<u32, LoanStoreError> {
        value.try_into().map_err(|_| {
            LoanStoreError::Backend(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{column} out of range: {value}"),
            )))
        })
    };

    Ok(Book {
        book_id: BookId::from_uuid(row.get("book_id")),
        title: row.get("title"),
        total_copies: convert(total_copies, "total_copies")?,
        available_copies: convert(available_copies, "available_copies")?,
    })
}

/// LoanStoreのPostgreSQL実装
///
/// create_loan / complete_return は1つのトランザクションの中で
/// カウンタ更新と貸出の書き込みを行う。カウンタ更新は条件付きの
/// 単一UPDATE（read-modify-writeをSQL側で閉じる）なので、
/// 並行する貸出リクエストが同じ1冊を二重に確保することはない。
pub struct PgLoanStore {
    pool: PgPool,
}

impl PgLoanStore {
    /// PostgreSQLコネクションプールから新しいLoanStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanStoreTrait for PgLoanStore {
    /// 貸出を作成する（アトミックな {カウンタ減算, 貸出挿入}）
    async fn create_loan(&self, loan: &Loan) -> Result<(), LoanStoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        // 条件付き減算：available_copies >= 1 の行だけが更新される
        let decremented = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1
            WHERE book_id = $1 AND available_copies >= 1
            "#,
        )
        .bind(loan.book_id.value())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        if decremented.rows_affected() == 0 {
            // 更新0件：書籍がないのか在庫が尽きているのかを区別する
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE book_id = $1)")
                    .bind(loan.book_id.value())
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(backend)?;

            return Err(if exists {
                LoanStoreError::OutOfStock
            } else {
                LoanStoreError::BookNotFound
            });
        }

        sqlx::query(
            r#"
            INSERT INTO loans (loan_id, book_id, member_id, loaned_at, due_date, returned_at)
            VALUES ($1, $2, $3, $4, $5, NULL)
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.book_id.value())
        .bind(loan.member_id.value())
        .bind(loan.loaned_at)
        .bind(loan.due_date)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    /// 返却を記録する（アトミックな {返却記録, カウンタ加算}）
    async fn complete_return(
        &self,
        loan_id: LoanId,
        returned_at: DateTime<Utc>,
    ) -> Result<Loan, LoanStoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        // 未返却の貸出だけが更新される
        let row = sqlx::query(
            r#"
            UPDATE loans
            SET returned_at = $2
            WHERE loan_id = $1 AND returned_at IS NULL
            RETURNING loan_id, book_id, member_id, loaned_at, due_date, returned_at
            "#,
        )
        .bind(loan_id.value())
        .bind(returned_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?;

        let Some(row) = row else {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loans WHERE loan_id = $1)")
                    .bind(loan_id.value())
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(backend)?;

            return Err(if exists {
                LoanStoreError::AlreadyReturned
            } else {
                LoanStoreError::LoanNotFound
            });
        };

        let loan = map_row_to_loan(&row);

        // 不変条件 available <= total はWHERE句で守る
        let incremented = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies + 1
            WHERE book_id = $1 AND available_copies < total_copies
            "#,
        )
        .bind(loan.book_id.value())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        if incremented.rows_affected() == 0 {
            // ロールバックして返却を取り消す
            return Err(LoanStoreError::Backend(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "inventory invariant violated on return of book {}",
                    loan.book_id.value()
                ),
            ))));
        }

        tx.commit().await.map_err(backend)?;
        Ok(loan)
    }

    async fn extend_due_date(
        &self,
        loan_id: LoanId,
        new_due_date: DateTime<Utc>,
    ) -> Result<(), LoanStoreError> {
        let updated = sqlx::query("UPDATE loans SET due_date = $2 WHERE loan_id = $1")
            .bind(loan_id.value())
            .bind(new_due_date)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if updated.rows_affected() == 0 {
            return Err(LoanStoreError::LoanNotFound);
        }
        Ok(())
    }

    async fn get(&self, loan_id: LoanId) -> Result<Option<Loan>, LoanStoreError> {
        let row = sqlx::query(
            r#"
            SELECT loan_id, book_id, member_id, loaned_at, due_date, returned_at
            FROM loans
            WHERE loan_id = $1
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.as_ref().map(map_row_to_loan))
    }

    async fn find_open_loan(
        &self,
        book_id: BookId,
        member_id: MemberId,
    ) -> Result<Option<Loan>, LoanStoreError> {
        let row = sqlx::query(
            r#"
            SELECT loan_id, book_id, member_id, loaned_at, due_date, returned_at
            FROM loans
            WHERE book_id = $1 AND member_id = $2 AND returned_at IS NULL
            "#,
        )
        .bind(book_id.value())
        .bind(member_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.as_ref().map(map_row_to_loan))
    }

    /// 延滞中の貸出をすべて取得する
    ///
    /// (due_date) WHERE returned_at IS NULL の部分インデックスを使用。
    /// 件数が多くてもピークメモリを抑えるため行ストリームで読む。
    async fn find_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Loan>, LoanStoreError> {
        let mut rows = sqlx::query(
            r#"
            SELECT loan_id, book_id, member_id, loaned_at, due_date, returned_at
            FROM loans
            WHERE due_date < $1 AND returned_at IS NULL
            ORDER BY due_date
            "#,
        )
        .bind(now)
        .fetch(&self.pool);

        let mut loans = Vec::new();
        while let Some(row) = rows.try_next().await.map_err(backend)? {
            loans.push(map_row_to_loan(&row));
        }
        Ok(loans)
    }

    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>, LoanStoreError> {
        let row = sqlx::query(
            r#"
            SELECT book_id, title, total_copies, available_copies
            FROM books
            WHERE book_id = $1
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.as_ref().map(map_row_to_book).transpose()
    }
}
