// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rules: single grants or denials of an action on a subject type.

use crate::resource::{FieldValue, Resource};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Whether a rule grants or denies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
	Allow,
	Deny,
}

impl Effect {
	pub fn is_allow(&self) -> bool {
		matches!(self, Effect::Allow)
	}

	pub fn is_deny(&self) -> bool {
		matches!(self, Effect::Deny)
	}
}

macro_rules! define_name_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Cow<'static, str>);

		impl $name {
			pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
				Self(name.into())
			}

			pub fn as_str(&self) -> &str {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl From<&'static str> for $name {
			fn from(name: &'static str) -> Self {
				Self(Cow::Borrowed(name))
			}
		}

		impl From<String> for $name {
			fn from(name: String) -> Self {
				Self(Cow::Owned(name))
			}
		}
	};
}

define_name_type!(
	Action,
	"A named operation. Open-ended: any name can be used in rules and checks."
);
define_name_type!(SubjectType, "A named resource kind.");

impl Action {
	pub const CREATE: Action = Action(Cow::Borrowed("create"));
	pub const READ: Action = Action(Cow::Borrowed("read"));
	pub const UPDATE: Action = Action(Cow::Borrowed("update"));
	pub const DELETE: Action = Action(Cow::Borrowed("delete"));
	pub const PUBLISH: Action = Action(Cow::Borrowed("publish"));
	pub const HIDE: Action = Action(Cow::Borrowed("hide"));
	/// Wildcard: a rule on `manage` covers every action.
	pub const MANAGE: Action = Action(Cow::Borrowed("manage"));

	pub fn is_wildcard(&self) -> bool {
		*self == Action::MANAGE
	}
}

impl SubjectType {
	pub const POST: SubjectType = SubjectType(Cow::Borrowed("Post"));
	pub const COMMENT: SubjectType = SubjectType(Cow::Borrowed("Comment"));
	pub const USER: SubjectType = SubjectType(Cow::Borrowed("User"));
	/// Wildcard: a rule on `all` covers every subject type.
	pub const ALL: SubjectType = SubjectType(Cow::Borrowed("all"));

	pub fn is_wildcard(&self) -> bool {
		*self == SubjectType::ALL
	}
}

/// Field name → required literal, AND-combined.
///
/// An empty condition matches every resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldCondition(BTreeMap<String, FieldValue>);

impl FieldCondition {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder: require `field` to equal `value`.
	pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
		self.0.insert(field.into(), value.into());
		self
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Iterates the required values in field-name order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// True when every named field exists on the resource with an equal
	/// value. Fields outside the condition are ignored.
	pub fn matches<R: Resource + ?Sized>(&self, resource: &R) -> bool {
		self
			.0
			.iter()
			.all(|(field, expected)| resource.field(field).as_ref() == Some(expected))
	}
}

impl fmt::Display for FieldCondition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.0.is_empty() {
			return f.write_str("true");
		}
		let mut first = true;
		for (field, value) in &self.0 {
			if !first {
				f.write_str(" AND ")?;
			}
			write!(f, "{field} = {value}")?;
			first = false;
		}
		Ok(())
	}
}

/// A single grant or denial, optionally narrowed by a field condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
	pub effect: Effect,
	pub action: Action,
	pub subject_type: SubjectType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub condition: Option<FieldCondition>,
}

impl Rule {
	pub fn allow(action: Action, subject_type: SubjectType) -> Self {
		Self {
			effect: Effect::Allow,
			action,
			subject_type,
			condition: None,
		}
	}

	pub fn deny(action: Action, subject_type: SubjectType) -> Self {
		Self {
			effect: Effect::Deny,
			action,
			subject_type,
			condition: None,
		}
	}

	/// Builder: narrow the rule to resources matching `condition`.
	pub fn when(mut self, condition: FieldCondition) -> Self {
		self.condition = Some(condition);
		self
	}

	pub fn is_conditional(&self) -> bool {
		self.condition.is_some()
	}

	/// True if the rule is about `action` on `subject_type`, directly or
	/// through the `manage` / `all` wildcards.
	pub fn covers(&self, action: &Action, subject_type: &SubjectType) -> bool {
		(self.action == *action || self.action.is_wildcard())
			&& (self.subject_type == *subject_type || self.subject_type.is_wildcard())
	}

	/// True if the rule carries no condition or its condition matches.
	pub fn matches<R: Resource + ?Sized>(&self, resource: &R) -> bool {
		self
			.condition
			.as_ref()
			.map_or(true, |condition| condition.matches(resource))
	}
}

impl fmt::Display for Rule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let verb = match self.effect {
			Effect::Allow => "allow",
			Effect::Deny => "deny",
		};
		write!(f, "{verb} {} {}", self.action, self.subject_type)?;
		if let Some(condition) = &self.condition {
			write!(f, " where {condition}")?;
		}
		Ok(())
	}
}
