// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-request authorization context.
//!
//! # Request Flow
//!
//! ```text
//! Authenticated claims → AuthorizationContext::from_claims
//!                              │
//!                              ├── missing claims / id / role → setup error
//!                              └── build_policy_set(identity) → context
//!                                        │
//!                                        ├── can / cannot / ensure (point checks)
//!                                        └── conditions_for (list filters)
//! ```
//!
//! A context is built once per request and dropped with it. It is never
//! shared between requests, so a role change takes effect on the next one.

use crate::error::AuthzError;
use crate::policy::{
	build_policy_set, AccessFilter, Action, Decision, PolicySet, Subject, SubjectType,
};
use crate::types::{Identity, IdentityClaims, UserId};
use tracing::{debug, info, instrument};

/// Tuning for how decisions are reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthzSettings {
	/// Log denied decisions at info level instead of debug.
	pub audit_denials: bool,
}

impl AuthzSettings {
	pub fn new() -> Self {
		Self::default()
	}

	/// Set denial auditing.
	pub fn with_audit_denials(mut self, enabled: bool) -> Self {
		self.audit_denials = enabled;
		self
	}
}

/// One request's identity bound to its policy set.
#[derive(Debug, Clone)]
pub struct AuthorizationContext {
	identity: Identity,
	policy: PolicySet,
	settings: AuthzSettings,
}

impl AuthorizationContext {
	/// Builds the context for an already validated identity.
	pub fn new(identity: Identity) -> Self {
		let policy = build_policy_set(&identity);
		Self {
			identity,
			policy,
			settings: AuthzSettings::default(),
		}
	}

	/// Builds the context from the claims established by authentication.
	///
	/// Fails before any policy is built if the claims are absent or lack a
	/// user id or role.
	pub fn from_claims(claims: Option<&IdentityClaims>) -> Result<Self, AuthzError> {
		let claims = claims.ok_or(AuthzError::AuthenticationRequired)?;
		let identity = Identity::from_claims(claims)?;
		Ok(Self::new(identity))
	}

	/// Builder: set reporting settings.
	pub fn with_settings(mut self, settings: AuthzSettings) -> Self {
		self.settings = settings;
		self
	}

	pub fn identity(&self) -> &Identity {
		&self.identity
	}

	pub fn user_id(&self) -> &UserId {
		self.identity.user_id()
	}

	pub fn policy(&self) -> &PolicySet {
		&self.policy
	}

	/// Evaluates a check and records the outcome.
	#[instrument(
        level = "debug",
        skip(self, subject),
        fields(user_id = %self.identity.user_id(), action = %action)
    )]
	pub fn evaluate<'a>(&self, action: &Action, subject: impl Into<Subject<'a>>) -> Decision {
		let subject = subject.into();
		let decision = self.policy.evaluate(action, subject);

		if let Some(reason) = decision.denial_reason() {
			let subject_type = subject_label(&subject);
			if self.settings.audit_denials {
				info!(
					role = %self.identity.role_name(),
					subject_type = %subject_type,
					reason = %reason,
					"authorization denied"
				);
			} else {
				debug!(subject_type = %subject_type, reason = %reason, "authorization denied");
			}
		}

		decision
	}

	pub fn can<'a>(&self, action: &Action, subject: impl Into<Subject<'a>>) -> bool {
		self.evaluate(action, subject).is_allowed()
	}

	pub fn cannot<'a>(&self, action: &Action, subject: impl Into<Subject<'a>>) -> bool {
		!self.can(action, subject)
	}

	/// Like [`can`](Self::can), but a denial becomes [`AuthzError::Forbidden`].
	pub fn ensure<'a>(
		&self,
		action: &Action,
		subject: impl Into<Subject<'a>>,
	) -> Result<(), AuthzError> {
		let subject = subject.into();
		if self.evaluate(action, subject).is_allowed() {
			Ok(())
		} else {
			Err(AuthzError::Forbidden {
				action: action.clone(),
				subject_type: subject_label(&subject),
			})
		}
	}

	/// The filter restricting list reads to accessible instances.
	pub fn conditions_for(&self, action: &Action, subject_type: &SubjectType) -> AccessFilter {
		let filter = self.policy.conditions_for(action, subject_type);
		debug!(
			user_id = %self.identity.user_id(),
			action = %action,
			subject_type = %subject_type,
			filter = %filter,
			"computed access filter"
		);
		filter
	}
}

fn subject_label(subject: &Subject<'_>) -> SubjectType {
	subject
		.subject_type()
		.unwrap_or_else(|| SubjectType::new("unclassified"))
}
