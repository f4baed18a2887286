// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for identities and roles.
//!
//! - **ID newtypes**: Type-safe wrappers around the string ids issued by the
//!   storage layer ([`UserId`], [`PostId`], [`CommentId`])
//! - **Roles**: The closed set of publishing roles ([`Role`])
//! - **Identity**: The authenticated requester ([`IdentityClaims`] as handed over
//!   by the authentication layer, [`Identity`] once validated)

use crate::error::AuthzError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(String);

		impl $name {
			/// Create a new ID from its string form.
			pub fn new(id: impl Into<String>) -> Self {
				Self(id.into())
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4().to_string())
			}

			/// Get the inner string value.
			pub fn into_inner(self) -> String {
				self.0
			}

			/// Borrow the ID as a string slice.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl From<String> for $name {
			fn from(id: String) -> Self {
				Self(id)
			}
		}

		impl From<&str> for $name {
			fn from(id: &str) -> Self {
				Self(id.to_string())
			}
		}

		impl From<$name> for String {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(UserId, "Unique identifier for a user.");
define_id_type!(PostId, "Unique identifier for a post.");
define_id_type!(CommentId, "Unique identifier for a comment.");

// =============================================================================
// Roles
// =============================================================================

/// Publishing roles embedded in issued credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
	/// Full control over every resource.
	Admin,
	/// Reviews posts, publishes them and hides comments.
	Moderator,
	/// Writes posts and comments; manages their own drafts.
	Author,
}

impl Role {
	/// Returns all available roles.
	pub fn all() -> &'static [Role] {
		&[Role::Admin, Role::Moderator, Role::Author]
	}

	/// The wire name of the role, as carried in credentials.
	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Admin => "ADMIN",
			Role::Moderator => "MODERATOR",
			Role::Author => "AUTHOR",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Returned when a role name is not one of [`Role::all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unknown role: {}", self.0)
	}
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
	type Err = UnknownRole;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Role::all()
			.iter()
			.copied()
			.find(|role| role.as_str() == s)
			.ok_or_else(|| UnknownRole(s.to_string()))
	}
}

// =============================================================================
// Identity
// =============================================================================

/// Identity claims as decoded by the authentication layer.
///
/// Either field may be absent; [`Identity::from_claims`] decides whether the
/// claims are complete enough to authorize anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaims {
	#[serde(default)]
	pub user_id: Option<String>,
	#[serde(default)]
	pub role: Option<String>,
}

impl IdentityClaims {
	pub fn new(user_id: impl Into<String>, role: impl Into<String>) -> Self {
		Self {
			user_id: Some(user_id.into()),
			role: Some(role.into()),
		}
	}
}

/// A validated requester: a non-blank user id and a non-blank role name.
///
/// The role name is kept as given. Names outside [`Role::all`] are valid
/// identities that simply hold no permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
	user_id: UserId,
	role: String,
}

impl Identity {
	/// Creates an identity for one of the known roles.
	pub fn new(user_id: impl Into<UserId>, role: Role) -> Result<Self, AuthzError> {
		Self::with_role_name(user_id, role.as_str())
	}

	/// Creates an identity from a raw role name.
	pub fn with_role_name(
		user_id: impl Into<UserId>,
		role: impl Into<String>,
	) -> Result<Self, AuthzError> {
		let user_id = user_id.into();
		if user_id.as_str().trim().is_empty() {
			return Err(AuthzError::MissingUserId);
		}
		let role = role.into();
		if role.trim().is_empty() {
			return Err(AuthzError::MissingRole);
		}
		Ok(Self { user_id, role })
	}

	/// Validates decoded claims.
	pub fn from_claims(claims: &IdentityClaims) -> Result<Self, AuthzError> {
		let user_id = claims
			.user_id
			.as_deref()
			.ok_or(AuthzError::MissingUserId)?;
		let role = claims.role.as_deref().ok_or(AuthzError::MissingRole)?;
		Self::with_role_name(user_id, role)
	}

	pub fn user_id(&self) -> &UserId {
		&self.user_id
	}

	/// The role name exactly as it was claimed.
	pub fn role_name(&self) -> &str {
		&self.role
	}

	/// The claimed role, if it is a known one.
	pub fn role(&self) -> Option<Role> {
		self.role.parse().ok()
	}
}
