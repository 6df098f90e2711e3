use serde::{Deserialize, Serialize};

use super::{BookId, InventoryError};

/// Book集約 - 蔵書1タイトル分の在庫
///
/// 不変条件：0 <= available_copies <= total_copies
///
/// available_copiesは貸出・返却に連動した2つの純粋関数
/// （checkout_copy / return_copy）でのみ変化する。
/// カウンタの読み取り→書き込みを分離した更新は許可しない。
/// アトミックな適用はストレージアダプタの責務。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub title: String,
    pub total_copies: u32,
    pub available_copies: u32,
}

impl Book {
    pub fn new(book_id: BookId, title: impl Into<String>, total_copies: u32) -> Self {
        Self {
            book_id,
            title: title.into(),
            total_copies,
            available_copies: total_copies,
        }
    }

    /// 純粋関数：貸出1冊分のカウンタ減算
    ///
    /// 副作用なし。新しいBookを返す。
    /// 在庫が尽きている場合は`InventoryError::OutOfStock`を返す。
    pub fn checkout_copy(&self) -> Result<Book, InventoryError> {
        if self.available_copies == 0 {
            return Err(InventoryError::OutOfStock);
        }

        Ok(Book {
            available_copies: self.available_copies - 1,
            ..self.clone()
        })
    }

    /// 純粋関数：返却1冊分のカウンタ加算
    ///
    /// 副作用なし。新しいBookを返す。
    /// 不変条件 available <= total を破る加算は
    /// `InventoryError::ExceedsTotalCopies`として拒否する。
    pub fn return_copy(&self) -> Result<Book, InventoryError> {
        if self.available_copies >= self.total_copies {
            return Err(InventoryError::ExceedsTotalCopies);
        }

        Ok(Book {
            available_copies: self.available_copies + 1,
            ..self.clone()
        })
    }
}
