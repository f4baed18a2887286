// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role table: the rules each role receives.
//!
//! | Role      | Rules                                                         |
//! |-----------|---------------------------------------------------------------|
//! | ADMIN     | allow manage all                                              |
//! | MODERATOR | allow read/publish Post, allow hide Comment, deny delete User |
//! | AUTHOR    | read published posts and own drafts, create posts, never      |
//! |           | publish, update/delete own posts, create/update comments,     |
//! |           | read visible comments                                         |
//!
//! "Own" conditions are materialized with the identity's user id when the
//! set is built.

use super::rule::{Action, FieldCondition, Rule, SubjectType};
use super::set::PolicySet;
use crate::types::{Identity, Role, UserId};
use tracing::{debug, instrument, warn};

/// Returns the rules granted to `role` for the user `user_id`.
pub fn role_rules(role: Role, user_id: &UserId) -> Vec<Rule> {
	match role {
		Role::Admin => vec![Rule::allow(Action::MANAGE, SubjectType::ALL)],
		Role::Moderator => vec![
			Rule::allow(Action::READ, SubjectType::POST),
			Rule::allow(Action::PUBLISH, SubjectType::POST),
			Rule::allow(Action::HIDE, SubjectType::COMMENT),
			Rule::deny(Action::DELETE, SubjectType::USER),
		],
		Role::Author => {
			let own = || FieldCondition::new().with("authorId", user_id);
			vec![
				Rule::allow(Action::READ, SubjectType::POST)
					.when(FieldCondition::new().with("isPublished", true)),
				Rule::allow(Action::READ, SubjectType::POST).when(own().with("isPublished", false)),
				Rule::allow(Action::CREATE, SubjectType::POST),
				Rule::deny(Action::PUBLISH, SubjectType::POST),
				Rule::allow(Action::UPDATE, SubjectType::POST).when(own()),
				Rule::allow(Action::DELETE, SubjectType::POST).when(own()),
				Rule::allow(Action::CREATE, SubjectType::COMMENT),
				Rule::allow(Action::UPDATE, SubjectType::COMMENT),
				Rule::allow(Action::READ, SubjectType::COMMENT)
					.when(FieldCondition::new().with("isHidden", false)),
			]
		}
	}
}

/// Builds the policy set for an identity.
///
/// Pure and deterministic. Unrecognized role names yield an empty set.
#[instrument(
    level = "debug",
    skip(identity),
    fields(user_id = %identity.user_id(), role = %identity.role_name())
)]
pub fn build_policy_set(identity: &Identity) -> PolicySet {
	let Some(role) = identity.role() else {
		warn!("unrecognized role; every check will be denied");
		return PolicySet::empty();
	};

	let rules = role_rules(role, identity.user_id());
	debug!(rule_count = rules.len(), "built policy set");
	PolicySet::new(rules)
}
