use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::util::{now_ms, uuid_v7_without_dashes};

/// A recorded "never match me with this person" preference. Stored
/// directionally, symmetric in effect: the scanner checks both directions.
/// Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Exemption {
    pub id: String,
    pub exempter_id: String,
    pub exempted_id: String,
    pub created_at_ms: i64,
}

impl Exemption {
    pub fn new(
        exempter_id: impl Into<String>,
        exempted_id: impl Into<String>,
    ) -> DomainResult<Self> {
        let exempter_id = exempter_id.into().trim().to_string();
        let exempted_id = exempted_id.into().trim().to_string();
        if exempter_id.is_empty() || exempted_id.is_empty() {
            return Err(DomainError::Validation(
                "exempterId and exemptedId are required".into(),
            ));
        }
        if exempter_id == exempted_id {
            return Err(DomainError::Validation(
                "a user cannot exempt themselves".into(),
            ));
        }
        Ok(Self {
            id: uuid_v7_without_dashes(),
            exempter_id,
            exempted_id,
            created_at_ms: now_ms(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_exemption_is_rejected() {
        let err = Exemption::new("u-1", "u-1").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert!(Exemption::new("  ", "u-2").is_err());
        assert!(Exemption::new("u-1", "").is_err());
    }
}
