use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::util::{now_ms, uuid_v7_without_dashes};

/// Invitation to join a forming group. The engine does not act on these
/// beyond observing their creation for the notification trigger.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: String,
    pub to_user_id: String,
    pub from_user_id: String,
    pub group_id: String,
    pub created_at_ms: i64,
}

impl Invitation {
    pub fn new(
        to_user_id: impl Into<String>,
        from_user_id: impl Into<String>,
        group_id: impl Into<String>,
    ) -> DomainResult<Self> {
        let to_user_id = to_user_id.into().trim().to_string();
        let from_user_id = from_user_id.into().trim().to_string();
        let group_id = group_id.into().trim().to_string();
        if to_user_id.is_empty() || from_user_id.is_empty() || group_id.is_empty() {
            return Err(DomainError::Validation(
                "toUserId, fromUserId and groupId are required".into(),
            ));
        }
        if to_user_id == from_user_id {
            return Err(DomainError::Validation(
                "a user cannot invite themselves".into(),
            ));
        }
        Ok(Self {
            id: uuid_v7_without_dashes(),
            to_user_id,
            from_user_id,
            group_id,
            created_at_ms: now_ms(),
        })
    }
}
