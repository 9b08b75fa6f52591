use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::util::now_ms;

/// User document as the rest of the platform stores it. The engine only
/// ever patches `currentGroupId`, inside the merge transaction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_group_id: Option<String>,
    pub created_at_ms: i64,
}

impl UserRecord {
    pub fn new(id: impl Into<String>, nickname: impl Into<String>) -> DomainResult<Self> {
        let id = id.into().trim().to_string();
        let nickname = nickname.into().trim().to_string();
        if id.is_empty() {
            return Err(DomainError::Validation("user id is required".into()));
        }
        if nickname.is_empty() {
            return Err(DomainError::Validation("nickname is required".into()));
        }
        Ok(Self {
            id,
            nickname,
            current_group_id: None,
            created_at_ms: now_ms(),
        })
    }
}
