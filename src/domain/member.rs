use serde::{Deserialize, Serialize};

use super::MemberId;

/// 会員 - 通知の宛先
///
/// このサブシステムにとって会員は読み取り専用。
/// 登録・更新は会員管理コンテキストの責務。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub member_id: MemberId,
    pub name: String,
    pub email: String,
}

impl Member {
    pub fn new(member_id: MemberId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            member_id,
            name: name.into(),
            email: email.into(),
        }
    }

    /// 通知可能な連絡先を持つか
    pub fn has_contact_address(&self) -> bool {
        !self.email.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_with_email_has_contact_address() {
        let member = Member::new(MemberId::new(), "Aiko", "aiko@example.com");
        assert!(member.has_contact_address());
    }

    #[test]
    fn test_member_with_blank_email_has_no_contact_address() {
        let member = Member::new(MemberId::new(), "Aiko", "   ");
        assert!(!member.has_contact_address());
    }
}
