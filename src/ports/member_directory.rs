use crate::domain::{Member, value_objects::MemberId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 会員ディレクトリポート
///
/// 貸出コンテキストと会員コンテキストの境界を維持する。
/// 貸出コンテキストが必要とするのは存在確認と連絡先のみ。
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// IDで会員を取得する
    ///
    /// 貸出作成前の会員バリデーションと、
    /// 通知の宛先・宛名の解決に使用される。
    async fn get(&self, member_id: MemberId) -> Result<Option<Member>>;
}
