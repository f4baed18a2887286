// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy sets and the decision algorithm.
//!
//! # Decision Algorithm
//!
//! ```text
//! evaluate(action, subject)
//!     │
//!     ├── Resolve subject type (bare type, or classify the instance)
//!     │       └── unclassified → only `all` rules can cover it
//!     │
//!     ├── Keep rules covering (action | manage) × (type | all)
//!     │
//!     ├── Keep rules that apply:
//!     │       instance  → unconditional, or condition matches
//!     │       bare type → unconditional, or conditional allow
//!     │
//!     └── any deny  → Denied(ExplicitDeny)
//!         any allow → Allowed
//!         otherwise → Denied(NoMatchingRule), or
//!                     Denied(UnclassifiedSubject) for an unclassified instance
//! ```
//!
//! Deny always wins over allow, whatever the declaration order.

use super::filter::AccessFilter;
use super::rule::{Action, Effect, Rule, SubjectType};
use crate::resource::Resource;
use serde::Serialize;
use std::fmt;
use tracing::trace;

/// What a check is about: a bare subject type or a concrete resource.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
	Type(&'a SubjectType),
	Instance(&'a dyn Resource),
}

impl<'a> Subject<'a> {
	pub fn instance(resource: &'a dyn Resource) -> Self {
		Subject::Instance(resource)
	}

	/// The effective subject type of the check.
	pub fn subject_type(&self) -> Option<SubjectType> {
		match self {
			Subject::Type(subject_type) => Some((*subject_type).clone()),
			Subject::Instance(resource) => resource.subject_type(),
		}
	}
}

impl<'a> From<&'a SubjectType> for Subject<'a> {
	fn from(subject_type: &'a SubjectType) -> Self {
		Subject::Type(subject_type)
	}
}

impl<'a, R: Resource> From<&'a R> for Subject<'a> {
	fn from(resource: &'a R) -> Self {
		Subject::Instance(resource)
	}
}

/// Why a check was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
	/// An applicable deny rule matched.
	ExplicitDeny,
	/// No applicable allow rule matched.
	NoMatchingRule,
	/// The instance did not classify as any subject type and no `all` rule
	/// allowed it.
	UnclassifiedSubject,
}

impl fmt::Display for DenialReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DenialReason::ExplicitDeny => write!(f, "explicit_deny"),
			DenialReason::NoMatchingRule => write!(f, "no_matching_rule"),
			DenialReason::UnclassifiedSubject => write!(f, "unclassified_subject"),
		}
	}
}

/// The outcome of evaluating one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
	Allowed,
	Denied(DenialReason),
}

impl Decision {
	pub fn is_allowed(&self) -> bool {
		matches!(self, Decision::Allowed)
	}

	pub fn denial_reason(&self) -> Option<DenialReason> {
		match self {
			Decision::Allowed => None,
			Decision::Denied(reason) => Some(*reason),
		}
	}
}

/// An ordered, immutable collection of rules for one identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PolicySet {
	rules: Vec<Rule>,
}

impl PolicySet {
	pub fn new(rules: Vec<Rule>) -> Self {
		Self { rules }
	}

	/// A policy set that refuses everything.
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn rules(&self) -> &[Rule] {
		&self.rules
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}

	fn relevant<'s>(
		&'s self,
		action: &'s Action,
		subject_type: &'s SubjectType,
	) -> impl Iterator<Item = &'s Rule> + 's {
		self
			.rules
			.iter()
			.filter(move |rule| rule.covers(action, subject_type))
	}

	/// Evaluates a check and reports why it was decided that way.
	pub fn evaluate<'a>(&self, action: &Action, subject: impl Into<Subject<'a>>) -> Decision {
		let subject = subject.into();
		let classified = subject.subject_type();
		if classified.is_none() {
			trace!(action = %action, "subject did not classify; only wildcard rules apply");
		}
		// `all` is covered only by rules on `all` itself.
		let subject_type = classified.clone().unwrap_or(SubjectType::ALL);

		let mut allowed = false;
		for rule in self.relevant(action, &subject_type) {
			let applies = match subject {
				Subject::Instance(resource) => rule.matches(resource),
				// Without an instance, a conditional allow may still permit
				// some instances; a conditional deny cannot forbid all of them.
				Subject::Type(_) => !rule.is_conditional() || rule.effect.is_allow(),
			};
			if !applies {
				continue;
			}

			trace!(action = %action, subject_type = %subject_type, rule = %rule, "rule applies");
			match rule.effect {
				Effect::Deny => return Decision::Denied(DenialReason::ExplicitDeny),
				Effect::Allow => allowed = true,
			}
		}

		if allowed {
			Decision::Allowed
		} else if classified.is_none() {
			Decision::Denied(DenialReason::UnclassifiedSubject)
		} else {
			Decision::Denied(DenialReason::NoMatchingRule)
		}
	}

	pub fn can<'a>(&self, action: &Action, subject: impl Into<Subject<'a>>) -> bool {
		self.evaluate(action, subject).is_allowed()
	}

	pub fn cannot<'a>(&self, action: &Action, subject: impl Into<Subject<'a>>) -> bool {
		!self.can(action, subject)
	}

	/// Builds the filter selecting the instances of `subject_type` on which
	/// `action` is permitted.
	pub fn conditions_for(&self, action: &Action, subject_type: &SubjectType) -> AccessFilter {
		let mut any_of = Vec::new();
		let mut none_of = Vec::new();
		let mut unconditional_allow = false;

		for rule in self.relevant(action, subject_type) {
			match (rule.effect, &rule.condition) {
				(Effect::Deny, None) => return AccessFilter::Nothing,
				(Effect::Deny, Some(condition)) => none_of.push(condition.clone()),
				(Effect::Allow, None) => unconditional_allow = true,
				(Effect::Allow, Some(condition)) => any_of.push(condition.clone()),
			}
		}

		if unconditional_allow {
			if none_of.is_empty() {
				return AccessFilter::Everything;
			}
			any_of = vec![Default::default()];
		}

		if any_of.is_empty() {
			AccessFilter::Nothing
		} else {
			AccessFilter::Conditions { any_of, none_of }
		}
	}
}

impl FromIterator<Rule> for PolicySet {
	fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
		Self::new(iter.into_iter().collect())
	}
}
