// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization configuration.

use quill_server_authz::AuthzSettings;
use serde::Deserialize;

/// Authorization configuration (runtime, fully resolved).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthzConfig {
	/// Log every denied check at info level.
	pub audit_denials: bool,
}

impl AuthzConfig {
	/// Settings handed to each request's authorization context.
	pub fn settings(&self) -> AuthzSettings {
		AuthzSettings::new().with_audit_denials(self.audit_denials)
	}
}

/// Authorization configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthzConfigLayer {
	#[serde(default)]
	pub audit_denials: Option<bool>,
}

impl AuthzConfigLayer {
	pub fn merge(&mut self, other: AuthzConfigLayer) {
		if other.audit_denials.is_some() {
			self.audit_denials = other.audit_denials;
		}
	}

	pub fn finalize(self) -> AuthzConfig {
		AuthzConfig {
			audit_denials: self.audit_denials.unwrap_or(false),
		}
	}
}
