use std::collections::HashSet;
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info, warn};

use crate::DomainResult;
use crate::filter;
use crate::group::{Group, GroupStatus};
use crate::ports::exemptions::ExemptionStore;
use crate::ports::groups::{GroupStore, MatchCommitTx};
use crate::ports::store::StoreError;
use crate::util::now_ms;

pub const DEFAULT_TX_ATTEMPTS: u32 = 5;

const MATCH_COMMITS_TOTAL: &str = "matchroom_match_commits_total";
const MATCH_ABORTS_TOTAL: &str = "matchroom_match_aborts_total";

/// Why a match commit ended without a match. All of these are expected
/// under contention and none is surfaced to a user; the losing group is
/// rediscovered by the next seeking transition elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchAbort {
    MissingGroup,
    StatusChanged,
    Contention,
}

impl MatchAbort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingGroup => "missing_group",
            Self::StatusChanged => "status_changed",
            Self::Contention => "contention",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MatchOutcome {
    Committed { partner_id: String },
    NoCandidate,
    Aborted(MatchAbort),
}

#[derive(Clone)]
pub struct MatchService {
    groups: Arc<dyn GroupStore>,
    exemptions: Arc<dyn ExemptionStore>,
    tx_attempts: u32,
}

impl MatchService {
    pub fn new(groups: Arc<dyn GroupStore>, exemptions: Arc<dyn ExemptionStore>) -> Self {
        Self {
            groups,
            exemptions,
            tx_attempts: DEFAULT_TX_ATTEMPTS,
        }
    }

    pub fn with_tx_attempts(mut self, attempts: u32) -> Self {
        self.tx_attempts = attempts.max(1);
        self
    }

    /// One scan-and-commit pass for a group that just entered the seeking
    /// pool. First compatible candidate wins; a failed commit does not
    /// backtrack to the next candidate (matching is level-triggered).
    pub async fn run(&self, group: &Group) -> DomainResult<MatchOutcome> {
        let Some(candidate) = self.find_candidate(group).await? else {
            debug!(group_id = %group.id, "no compatible group in the seeking pool");
            return Ok(MatchOutcome::NoCandidate);
        };
        self.commit_match(&group.id, &candidate.id).await
    }

    /// Scans the seeking pool in ascending id order and returns the first
    /// candidate that clears the exclusion set and the compatibility filter.
    pub async fn find_candidate(&self, group: &Group) -> DomainResult<Option<Group>> {
        let excluded = self.exclusion_set(&group.member_ids).await?;
        let candidates = self.groups.list_seeking(&group.id).await?;

        for candidate in candidates {
            if candidate
                .member_ids
                .iter()
                .any(|member| excluded.contains(member))
            {
                debug!(
                    group_id = %group.id,
                    candidate_id = %candidate.id,
                    "skipping candidate containing an exempted member"
                );
                continue;
            }
            if filter::is_compatible(group, &candidate) {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Users no member of this group may be paired with: everyone a member
    /// exempted, union everyone who exempted a member. Queried fresh per
    /// invocation; staleness can only suppress a proposal.
    async fn exclusion_set(&self, member_ids: &[String]) -> DomainResult<HashSet<String>> {
        let mut excluded = HashSet::new();
        for exemption in self.exemptions.list_by_exempters(member_ids).await? {
            excluded.insert(exemption.exempted_id);
        }
        for exemption in self.exemptions.list_by_exempted(member_ids).await? {
            excluded.insert(exemption.exempter_id);
        }
        Ok(excluded)
    }

    /// Atomically flips both groups to matched with reciprocal pointers.
    /// Both groups are re-read inside every attempt; the scan snapshot is
    /// never trusted. Version conflicts retry up to the configured bound.
    pub async fn commit_match(&self, self_id: &str, candidate_id: &str) -> DomainResult<MatchOutcome> {
        for _ in 0..self.tx_attempts {
            let own = self.groups.get(self_id).await?;
            let other = self.groups.get(candidate_id).await?;
            let (Some(mut own_doc), Some(mut other_doc)) = (own.doc, other.doc) else {
                return Ok(self.abort(self_id, candidate_id, MatchAbort::MissingGroup));
            };
            if own_doc.status != GroupStatus::Seeking || other_doc.status != GroupStatus::Seeking {
                return Ok(self.abort(self_id, candidate_id, MatchAbort::StatusChanged));
            }

            let now = now_ms();
            own_doc.status = GroupStatus::Matched;
            own_doc.matched_group_id = Some(candidate_id.to_string());
            own_doc.updated_at_ms = now;
            other_doc.status = GroupStatus::Matched;
            other_doc.matched_group_id = Some(self_id.to_string());
            other_doc.updated_at_ms = now;

            let tx = MatchCommitTx {
                seeker: own_doc,
                seeker_version: own.version,
                candidate: other_doc,
                candidate_version: other.version,
            };
            match self.groups.commit_match(&tx).await {
                Ok(()) => {
                    info!(group_id = %self_id, partner_id = %candidate_id, "match committed");
                    counter!(MATCH_COMMITS_TOTAL).increment(1);
                    return Ok(MatchOutcome::Committed {
                        partner_id: candidate_id.to_string(),
                    });
                }
                Err(StoreError::Conflict) => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(self.abort(self_id, candidate_id, MatchAbort::Contention))
    }

    fn abort(&self, self_id: &str, candidate_id: &str, reason: MatchAbort) -> MatchOutcome {
        warn!(
            group_id = %self_id,
            candidate_id = %candidate_id,
            reason = reason.as_str(),
            "match commit aborted"
        );
        counter!(MATCH_ABORTS_TOTAL, "reason" => reason.as_str()).increment(1);
        MatchOutcome::Aborted(reason)
    }
}
