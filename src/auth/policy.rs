//! Authorization predicates. Every rule takes the caller's membership record
//! as an `Option`; a missing record never grants anything that a private
//! resource would require.

use crate::models::domain::{Membership, Organization, OrganizationPost, Quiz, QuizPhase, Role};

pub fn can_view_organization(org: &Organization, membership: Option<&Membership>) -> bool {
    !org.is_private || membership.is_some_and(|m| m.organization_id == org.id)
}

pub fn can_view_post(
    post: &OrganizationPost,
    org: &Organization,
    membership: Option<&Membership>,
) -> bool {
    post.organization_id == org.id && can_view_organization(org, membership)
}

pub fn is_admin(membership: Option<&Membership>) -> bool {
    membership.is_some_and(|m| m.role.is_admin())
}

/// Higher rank removes lower rank, except that plain members remove nobody
/// but themselves.
pub fn can_remove_member(actor: &Membership, target: &Membership) -> bool {
    if actor.organization_id != target.organization_id {
        return false;
    }
    actor.is_same_user(target) || (actor.role.outranks(target.role) && actor.role != Role::Member)
}

/// Higher rank changes lower rank. Anyone may set their own role to
/// `Member`, which is how an invitation is accepted.
pub fn can_change_role(actor: &Membership, target: &Membership, new_role: Role) -> bool {
    if actor.organization_id != target.organization_id {
        return false;
    }
    actor.role.outranks(target.role) || (actor.is_same_user(target) && new_role == Role::Member)
}

pub fn can_invite(membership: Option<&Membership>) -> bool {
    is_admin(membership)
}

pub fn can_access_quiz(quiz: &Quiz, membership: Option<&Membership>) -> bool {
    !quiz.is_private || membership.is_some_and(|m| m.organization_id == quiz.organization_id)
}

/// Nobody sees questions before the start, only registered participants
/// while the quiz runs, and afterwards anyone allowed to see the quiz.
pub fn can_access_questions(
    phase: QuizPhase,
    quiz: &Quiz,
    membership: Option<&Membership>,
    registered: bool,
) -> bool {
    match phase {
        QuizPhase::NotStarted => false,
        QuizPhase::GoesOn => registered,
        QuizPhase::Finished => registered || can_access_quiz(quiz, membership),
    }
}
