//! Master authority grants and the rules for changing them
//!
//! # Invariants
//!
//! - exactly one grant per session has `is_original_creator = true`; it is
//!   created with the session and never removed
//! - at most one promoted (non-creator) grant exists per session
//!
//! The planners below check authority and compute the change without touching
//! storage. Callers apply the plan in a single transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{SessionId, UserId};

/// A user's master authority over one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMaster {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub is_original_creator: bool,
    pub created_at: DateTime<Utc>,
}

impl SessionMaster {
    /// The permanent grant created together with a session.
    pub fn original_creator(session_id: SessionId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            user_id,
            is_original_creator: true,
            created_at: now,
        }
    }

    /// A revocable grant handed out by the creator.
    pub fn promoted(session_id: SessionId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            user_id,
            is_original_creator: false,
            created_at: now,
        }
    }
}

/// Authority rule violations. Messages are shown to callers verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityViolation {
    #[error("Only the original creator can promote users to master")]
    PromoteRequiresCreator,
    #[error("Only the original creator can demote masters")]
    DemoteRequiresCreator,
    #[error("Cannot demote the original creator")]
    CannotDemoteCreator,
    #[error("Original creator cannot renounce master status. Promote another master first.")]
    CreatorCannotRenounce,
}

/// What a promotion must do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionPlan {
    /// Target is the original creator; nothing changes.
    AlreadyCreator(SessionMaster),
    /// Target already holds the promoted grant; nothing changes.
    AlreadyPromoted(SessionMaster),
    /// Replace every promoted grant with a new one for the target.
    HandOff {
        grant: SessionMaster,
        demoted: Vec<UserId>,
    },
}

/// What a demotion or renunciation must do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevocationPlan {
    /// Remove the promoted grant held by this user.
    Revoke(UserId),
    /// The user holds no grant; there is nothing to remove.
    NoGrant(UserId),
}

impl RevocationPlan {
    pub fn user_id(&self) -> &UserId {
        match self {
            RevocationPlan::Revoke(u) | RevocationPlan::NoGrant(u) => u,
        }
    }
}

fn find<'a>(grants: &'a [SessionMaster], user_id: &UserId) -> Option<&'a SessionMaster> {
    grants.iter().find(|g| &g.user_id == user_id)
}

fn is_creator(grants: &[SessionMaster], user_id: &UserId) -> bool {
    find(grants, user_id).is_some_and(|g| g.is_original_creator)
}

/// Plan a promotion of `target` requested by `requester`.
///
/// Promotion is a hand-off: every other promoted grant is listed in `demoted`.
pub fn plan_promotion(
    grants: &[SessionMaster],
    session_id: SessionId,
    requester: &UserId,
    target: &UserId,
    now: DateTime<Utc>,
) -> Result<PromotionPlan, AuthorityViolation> {
    if !is_creator(grants, requester) {
        return Err(AuthorityViolation::PromoteRequiresCreator);
    }

    if let Some(existing) = find(grants, target) {
        return Ok(if existing.is_original_creator {
            PromotionPlan::AlreadyCreator(existing.clone())
        } else {
            PromotionPlan::AlreadyPromoted(existing.clone())
        });
    }

    let demoted = grants
        .iter()
        .filter(|g| !g.is_original_creator)
        .map(|g| g.user_id.clone())
        .collect();

    Ok(PromotionPlan::HandOff {
        grant: SessionMaster::promoted(session_id, target.clone(), now),
        demoted,
    })
}

/// Plan a demotion of `target` requested by `requester`.
pub fn plan_demotion(
    grants: &[SessionMaster],
    requester: &UserId,
    target: &UserId,
) -> Result<RevocationPlan, AuthorityViolation> {
    if !is_creator(grants, requester) {
        return Err(AuthorityViolation::DemoteRequiresCreator);
    }
    match find(grants, target) {
        Some(g) if g.is_original_creator => Err(AuthorityViolation::CannotDemoteCreator),
        Some(_) => Ok(RevocationPlan::Revoke(target.clone())),
        None => Ok(RevocationPlan::NoGrant(target.clone())),
    }
}

/// Plan `user_id` giving up their own master grant.
pub fn plan_renunciation(
    grants: &[SessionMaster],
    user_id: &UserId,
) -> Result<RevocationPlan, AuthorityViolation> {
    match find(grants, user_id) {
        Some(g) if g.is_original_creator => Err(AuthorityViolation::CreatorCannotRenounce),
        Some(_) => Ok(RevocationPlan::Revoke(user_id.clone())),
        None => Ok(RevocationPlan::NoGrant(user_id.clone())),
    }
}
