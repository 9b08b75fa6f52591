use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::util::now_ms;

pub const UNRESTRICTED_GENDER: &str = "any";
pub const DEFAULT_GROUP_GENDER: &str = "mixed";
pub const DEFAULT_MIN_AGE: f64 = 0.0;
pub const DEFAULT_MAX_AGE: f64 = 100.0;
pub const DEFAULT_MIN_HEIGHT: f64 = 0.0;
pub const DEFAULT_MAX_HEIGHT: f64 = 200.0;
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 100.0;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Forming,
    Seeking,
    Matched,
}

impl GroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forming => "forming",
            Self::Seeking => "seeking",
            Self::Matched => "matched",
        }
    }
}

/// Preference attributes a group matches on. All optional on the wire;
/// absent values fall back to the permissive defaults above at evaluation
/// time, except the averages which fall back to zero.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_distance_km: Option<f64>,
}

/// A set of users seeking a match together. Field names are the wire
/// contract shared with the other components of the platform.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub member_ids: Vec<String>,
    pub status: GroupStatus,
    #[serde(flatten)]
    pub filters: FilterAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_group_id: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl Group {
    pub fn new(
        id: impl Into<String>,
        member_ids: Vec<String>,
        filters: FilterAttributes,
    ) -> DomainResult<Self> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(DomainError::Validation("group id is required".into()));
        }
        let member_ids = validate_member_ids(member_ids)?;
        let now = now_ms();
        Ok(Self {
            id,
            member_ids,
            status: GroupStatus::Forming,
            filters,
            matched_group_id: None,
            created_at_ms: now,
            updated_at_ms: now,
        })
    }

    /// User action that puts the group into the matchable pool.
    pub fn start_seeking(&mut self) -> DomainResult<()> {
        match self.status {
            GroupStatus::Forming => {
                self.status = GroupStatus::Seeking;
                self.updated_at_ms = now_ms();
                Ok(())
            }
            GroupStatus::Seeking => Ok(()),
            GroupStatus::Matched => Err(DomainError::Conflict),
        }
    }

    pub fn member_count(&self) -> usize {
        self.member_ids.len()
    }
}

fn validate_member_ids(member_ids: Vec<String>) -> DomainResult<Vec<String>> {
    let member_ids: Vec<String> = member_ids
        .into_iter()
        .map(|member| member.trim().to_string())
        .collect();

    if member_ids.is_empty() {
        return Err(DomainError::Validation(
            "group requires at least one member".into(),
        ));
    }
    if member_ids.iter().any(String::is_empty) {
        return Err(DomainError::Validation("member ids cannot be empty".into()));
    }

    let mut seen = HashSet::new();
    if !member_ids.iter().all(|member| seen.insert(member.clone())) {
        return Err(DomainError::Validation(
            "member ids must be unique within a group".into(),
        ));
    }

    Ok(member_ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_group_starts_forming() {
        let group = Group::new(
            "group-1",
            vec!["u-1".to_string(), "u-2".to_string()],
            FilterAttributes::default(),
        )
        .expect("group");
        assert_eq!(group.status, GroupStatus::Forming);
        assert!(group.matched_group_id.is_none());
    }

    #[test]
    fn duplicate_members_are_rejected() {
        let err = Group::new(
            "group-1",
            vec!["u-1".to_string(), "u-1".to_string()],
            FilterAttributes::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn empty_member_list_is_rejected() {
        let err = Group::new("group-1", vec![], FilterAttributes::default()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn matched_group_cannot_reenter_the_pool() {
        let mut group = Group::new(
            "group-1",
            vec!["u-1".to_string()],
            FilterAttributes::default(),
        )
        .expect("group");
        group.start_seeking().expect("seek");
        group.status = GroupStatus::Matched;
        assert!(matches!(
            group.start_seeking(),
            Err(DomainError::Conflict)
        ));
    }

    #[test]
    fn wire_field_names_are_camel_case() {
        let group = Group::new(
            "group-1",
            vec!["u-1".to_string()],
            FilterAttributes {
                preferred_gender: Some("female".to_string()),
                max_distance_km: Some(50.0),
                ..FilterAttributes::default()
            },
        )
        .expect("group");
        let value = serde_json::to_value(&group).expect("json");
        assert!(value.get("memberIds").is_some());
        assert_eq!(value.get("status"), Some(&serde_json::json!("forming")));
        assert_eq!(
            value.get("preferredGender"),
            Some(&serde_json::json!("female"))
        );
        assert_eq!(value.get("maxDistanceKm"), Some(&serde_json::json!(50.0)));
        assert!(value.get("matchedGroupId").is_none());
    }
}
