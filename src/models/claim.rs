use serde::{Deserialize, Serialize};
use uuid::Uuid;
use super::Role;

/// Identity and role proven by a verified session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub subject_id: Uuid,
    pub role: Role,
}

impl Claim {
    pub fn new(subject_id: Uuid, role: Role) -> Self {
        Self { subject_id, role }
    }

    pub fn is(&self, id: Uuid) -> bool {
        self.subject_id == id
    }
}
