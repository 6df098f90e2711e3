use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{Member, value_objects::MemberId};
use crate::ports::member_directory::{MemberDirectory as MemberDirectoryTrait, Result};

/// Mock implementation of MemberDirectory
///
/// Supports stateful testing by storing members in memory.
pub struct InMemoryMemberDirectory {
    members: Mutex<HashMap<MemberId, Member>>,
}

impl InMemoryMemberDirectory {
    pub fn new() -> Self {
        Self {
            members: Mutex::new(HashMap::new()),
        }
    }

    /// Add a member for testing purposes
    pub fn add_member(&self, member: Member) {
        self.members.lock().unwrap().insert(member.member_id, member);
    }

    /// Remove a member for testing purposes (e.g. dangling loan references)
    pub fn remove_member(&self, member_id: MemberId) {
        self.members.lock().unwrap().remove(&member_id);
    }
}

impl Default for InMemoryMemberDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemberDirectoryTrait for InMemoryMemberDirectory {
    async fn get(&self, member_id: MemberId) -> Result<Option<Member>> {
        Ok(self.members.lock().unwrap().get(&member_id).cloned())
    }
}
