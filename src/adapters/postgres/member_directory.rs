use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::{Member, value_objects::MemberId};
use crate::ports::member_directory::{MemberDirectory as MemberDirectoryTrait, Result};

/// MemberDirectoryのPostgreSQL実装
pub struct PgMemberDirectory {
    pool: PgPool,
}

impl PgMemberDirectory {
    /// PostgreSQLコネクションプールから新しいMemberDirectoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberDirectoryTrait for PgMemberDirectory {
    async fn get(&self, member_id: MemberId) -> Result<Option<Member>> {
        let row = sqlx::query(
            r#"
            SELECT member_id, name, email
            FROM members
            WHERE member_id = $1
            "#,
        )
        .bind(member_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Member {
            member_id: MemberId::from_uuid(row.get("member_id")),
            name: row.get("name"),
            email: row.get("email"),
        }))
    }
}
