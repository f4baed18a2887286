// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization error types.

use crate::policy::{Action, SubjectType};
use thiserror::Error;

/// Errors that can occur while setting up or enforcing authorization.
#[derive(Debug, Error)]
pub enum AuthzError {
	// =========================================================================
	// Setup Errors
	// =========================================================================
	/// No identity was established for the request.
	#[error("authentication required")]
	AuthenticationRequired,

	/// The identity carries no (or a blank) user id.
	#[error("identity has no user id")]
	MissingUserId,

	/// The identity carries no (or a blank) role.
	#[error("identity has no role")]
	MissingRole,

	// =========================================================================
	// Decision Errors
	// =========================================================================
	/// The policy evaluated to a denial.
	#[error("forbidden: cannot {action} {subject_type}")]
	Forbidden {
		action: Action,
		subject_type: SubjectType,
	},
}

impl AuthzError {
	/// Returns true if the request never reached policy evaluation.
	pub fn is_setup_error(&self) -> bool {
		matches!(
			self,
			AuthzError::AuthenticationRequired | AuthzError::MissingUserId | AuthzError::MissingRole
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identity_errors_are_setup_errors() {
		assert!(AuthzError::AuthenticationRequired.is_setup_error());
		assert!(AuthzError::MissingUserId.is_setup_error());
		assert!(AuthzError::MissingRole.is_setup_error());
	}

	#[test]
	fn forbidden_is_a_decision_error() {
		let err = AuthzError::Forbidden {
			action: Action::PUBLISH,
			subject_type: SubjectType::POST,
		};
		assert!(!err.is_setup_error());
		assert_eq!(err.to_string(), "forbidden: cannot publish Post");
	}
}
