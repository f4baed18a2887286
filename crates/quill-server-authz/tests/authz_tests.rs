// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end authorization behavior across roles.
//!
//! These tests go through the public API only: claims in, decisions and
//! filters out.

use proptest::prelude::*;
use quill_server_authz::{
	role_rules, AccessFilter, Action, AuthorizationContext, AuthzError, AuthzSettings, Decision,
	DenialReason, FieldCondition, Identity, IdentityClaims, Instance, PolicySet, Post, Role, Rule,
	SubjectType, UserId,
};
use serde_json::{json, Map, Value};
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

fn context(user_id: &str, role: &str) -> AuthorizationContext {
	AuthorizationContext::from_claims(Some(&IdentityClaims::new(user_id, role))).unwrap()
}

fn arb_action() -> impl Strategy<Value = Action> {
	prop_oneof![
		Just(Action::CREATE),
		Just(Action::READ),
		Just(Action::UPDATE),
		Just(Action::DELETE),
		Just(Action::PUBLISH),
		Just(Action::HIDE),
		"[a-z]{1,12}".prop_map(|name: String| Action::new(name)),
	]
}

fn arb_subject_type() -> impl Strategy<Value = SubjectType> {
	prop_oneof![
		Just(SubjectType::POST),
		Just(SubjectType::COMMENT),
		Just(SubjectType::USER),
		"[A-Z][a-z]{1,10}".prop_map(|name: String| SubjectType::new(name)),
	]
}

fn arb_user_id() -> impl Strategy<Value = String> {
	"[a-z0-9-]{1,16}"
}

fn arb_scalar() -> impl Strategy<Value = Value> {
	prop_oneof![
		any::<bool>().prop_map(Value::from),
		any::<i64>().prop_map(Value::from),
		"[a-z0-9-]{0,12}".prop_map(Value::from),
	]
}

/// Arbitrary rows: post, comment and user shaped ones as well as rows that
/// classify as nothing.
fn arb_shape() -> impl Strategy<Value = Instance> {
	let field = prop_oneof![
		Just("id".to_string()),
		Just("title".to_string()),
		Just("authorId".to_string()),
		Just("isPublished".to_string()),
		Just("isHidden".to_string()),
		Just("email".to_string()),
		Just("role".to_string()),
		"[a-z]{1,8}",
	];
	prop::collection::btree_map(field, arb_scalar(), 0..6)
		.prop_map(|fields| Instance::from_json(Value::Object(fields.into_iter().collect())))
}

/// Rows carrying the fields the role table conditions on, each possibly absent.
fn arb_row() -> impl Strategy<Value = Value> {
	(
		prop::option::of(prop_oneof![Just("u-1"), Just("other")]),
		prop::option::of(any::<bool>()),
		prop::option::of(any::<bool>()),
	)
		.prop_map(|(author, published, hidden)| {
			let mut row = Map::new();
			if let Some(author) = author {
				row.insert("authorId".to_string(), Value::from(author));
			}
			if let Some(published) = published {
				row.insert("isPublished".to_string(), Value::from(published));
			}
			if let Some(hidden) = hidden {
				row.insert("isHidden".to_string(), Value::from(hidden));
			}
			Value::Object(row)
		})
}

mod admin {
	use super::*;

	proptest! {
		#[test]
		fn admin_can_do_anything(
			user in arb_user_id(),
			action in arb_action(),
			subject_type in arb_subject_type(),
		) {
			let ctx = context(&user, "ADMIN");
			prop_assert!(ctx.can(&action, &subject_type));
		}

		#[test]
		fn admin_can_act_on_any_instance(
			user in arb_user_id(),
			instance in arb_shape(),
			action in arb_action(),
		) {
			let ctx = context(&user, "ADMIN");
			prop_assert!(ctx.can(&action, &instance), "denied {:?}", instance);
		}

		#[test]
		fn specific_deny_beats_manage_all(
			action in arb_action(),
			subject_type in arb_subject_type(),
		) {
			let user = UserId::new("admin");
			let mut rules = role_rules(Role::Admin, &user);
			rules.push(Rule::deny(action.clone(), subject_type.clone()));
			let policy = PolicySet::new(rules);
			prop_assert!(policy.cannot(&action, &subject_type));
		}
	}

	#[test]
	fn admin_can_read_post_row_without_publish_flag() {
		let ctx = context("u-1", "ADMIN");
		let row = Instance::from_json(json!({"id": "p-9", "authorId": "u-2", "title": "t"}));
		assert_eq!(ctx.evaluate(&Action::READ, &row), Decision::Allowed);
		assert!(ctx.ensure(&Action::DELETE, &row).is_ok());
	}

	#[test]
	fn other_roles_cannot_act_on_unclassified_rows() {
		let row = Instance::from_json(json!({"id": "p-9", "authorId": "u-1", "title": "t"}));
		for role in ["MODERATOR", "AUTHOR"] {
			assert_eq!(
				context("u-1", role).evaluate(&Action::READ, &row),
				Decision::Denied(DenialReason::UnclassifiedSubject)
			);
		}
	}
}

mod author {
	use super::*;

	proptest! {
		#[test]
		fn published_posts_are_readable_by_anyone(user in arb_user_id(), author in arb_user_id()) {
			let ctx = context(&user, "AUTHOR");
			let post = Instance::from_json(json!({"authorId": author, "isPublished": true}));
			prop_assert!(ctx.can(&Action::READ, &post));
		}

		#[test]
		fn own_drafts_are_readable(user in arb_user_id()) {
			let ctx = context(&user, "AUTHOR");
			let post = Instance::from_json(json!({"authorId": user, "isPublished": false}));
			prop_assert!(ctx.can(&Action::READ, &post));
		}

		#[test]
		fn other_drafts_are_not_readable(user in arb_user_id()) {
			prop_assume!(user != "other");
			let ctx = context(&user, "AUTHOR");
			let post = Instance::from_json(json!({"authorId": "other", "isPublished": false}));
			prop_assert!(ctx.cannot(&Action::READ, &post));
		}
	}

	#[test]
	fn publishing_is_always_denied() {
		let ctx = context("u-1", "AUTHOR");
		assert_eq!(
			ctx.evaluate(&Action::PUBLISH, &SubjectType::POST),
			Decision::Denied(DenialReason::ExplicitDeny)
		);

		let own = Post::draft(UserId::new("u-1"), "Mine", "body");
		assert!(ctx.cannot(&Action::PUBLISH, &own));
		assert!(ctx.can(&Action::UPDATE, &own));
	}

	#[test]
	fn others_posts_cannot_be_changed() {
		let ctx = context("u-1", "AUTHOR");
		let theirs = Post::draft(UserId::new("u-2"), "Theirs", "body").published();
		assert!(ctx.can(&Action::READ, &theirs));
		assert!(ctx.cannot(&Action::UPDATE, &theirs));
		assert!(ctx.cannot(&Action::DELETE, &theirs));
	}

	#[test]
	fn hidden_comments_are_not_readable() {
		let ctx = context("u-1", "AUTHOR");
		let hidden = Instance::from_json(json!({"content": "spam", "isHidden": true}));
		let visible = Instance::from_json(json!({"content": "hello", "isHidden": false}));
		assert!(ctx.cannot(&Action::READ, &hidden));
		assert!(ctx.can(&Action::READ, &visible));
	}

	#[test]
	fn read_filter_selects_published_and_own_drafts() {
		let ctx = context("u-1", "AUTHOR");
		let filter = ctx.conditions_for(&Action::READ, &SubjectType::POST);
		assert_eq!(
			filter,
			AccessFilter::Conditions {
				any_of: vec![
					FieldCondition::new().with("isPublished", true),
					FieldCondition::new()
						.with("authorId", "u-1")
						.with("isPublished", false),
				],
				none_of: vec![],
			}
		);

		let rows = vec![
			Instance::tagged(
				SubjectType::POST,
				json!({"id": 1, "isPublished": true, "authorId": "x"}),
			),
			Instance::tagged(
				SubjectType::POST,
				json!({"id": 2, "isPublished": false, "authorId": "u-1"}),
			),
			Instance::tagged(
				SubjectType::POST,
				json!({"id": 3, "isPublished": false, "authorId": "other"}),
			),
		];
		let ids: Vec<_> = filter
			.select(&rows)
			.into_iter()
			.map(|row| row.fields()["id"].clone())
			.collect();
		assert_eq!(ids, vec![json!(1), json!(2)]);
	}

	#[test]
	fn publish_filter_is_nothing() {
		let ctx = context("u-1", "AUTHOR");
		assert!(ctx
			.conditions_for(&Action::PUBLISH, &SubjectType::POST)
			.is_nothing());
	}
}

mod moderator {
	use super::*;

	#[test]
	fn cannot_delete_users() {
		let ctx = context("m-1", "MODERATOR");
		let user = Instance::from_json(json!({"email": "a@example.com", "role": "AUTHOR"}));
		assert!(ctx.cannot(&Action::DELETE, &user));
		assert!(ctx.cannot(&Action::DELETE, &SubjectType::USER));
	}

	#[test]
	fn can_publish_posts_and_hide_comments() {
		let ctx = context("m-1", "MODERATOR");
		assert!(ctx.can(&Action::PUBLISH, &SubjectType::POST));
		assert!(ctx.can(&Action::HIDE, &SubjectType::COMMENT));
		assert!(ctx.cannot(&Action::DELETE, &SubjectType::POST));
		assert!(ctx.cannot(&Action::UPDATE, &SubjectType::COMMENT));
	}
}

mod filters {
	use super::*;

	/// A row is in the list filter exactly when a point check on it passes.
	fn filter_agrees_with_checks(
		role: &str,
		action: &Action,
		subject_type: &SubjectType,
		row: Value,
	) -> Result<(), TestCaseError> {
		let ctx = context("u-1", role);
		let instance = Instance::tagged(subject_type.clone(), row);
		let filter = ctx.conditions_for(action, subject_type);
		prop_assert_eq!(
			filter.matches(&instance),
			ctx.can(action, &instance),
			"filter `{}` disagrees on {:?}",
			filter,
			instance
		);
		Ok(())
	}

	proptest! {
		#[test]
		fn admin_filter_agrees(
			action in arb_action(),
			subject_type in arb_subject_type(),
			row in arb_row(),
		) {
			filter_agrees_with_checks("ADMIN", &action, &subject_type, row)?;
		}

		#[test]
		fn moderator_filter_agrees(
			action in arb_action(),
			subject_type in arb_subject_type(),
			row in arb_row(),
		) {
			filter_agrees_with_checks("MODERATOR", &action, &subject_type, row)?;
		}

		#[test]
		fn author_filter_agrees(
			action in arb_action(),
			subject_type in arb_subject_type(),
			row in arb_row(),
		) {
			filter_agrees_with_checks("AUTHOR", &action, &subject_type, row)?;
		}

		#[test]
		fn unknown_role_filter_agrees(
			action in arb_action(),
			subject_type in arb_subject_type(),
			row in arb_row(),
		) {
			filter_agrees_with_checks("EDITOR", &action, &subject_type, row)?;
		}
	}
}

mod unknown_role {
	use super::*;

	proptest! {
		#[test]
		fn every_check_is_denied(
			role in "[A-Z]{1,10}",
			action in arb_action(),
			subject_type in arb_subject_type(),
		) {
			prop_assume!(role.parse::<Role>().is_err());
			let ctx = context("u-1", &role);
			prop_assert!(ctx.cannot(&action, &subject_type));
			prop_assert!(ctx.conditions_for(&action, &subject_type).is_nothing());
		}
	}
}

mod setup {
	use super::*;

	#[test]
	fn empty_id_without_role_fails_before_any_check() {
		let claims = IdentityClaims {
			user_id: Some(String::new()),
			role: None,
		};
		let err = AuthorizationContext::from_claims(Some(&claims)).unwrap_err();
		assert!(err.is_setup_error());
	}

	#[test]
	fn claims_deserialize_from_camel_case() {
		let claims: IdentityClaims =
			serde_json::from_value(json!({"userId": "u-9", "role": "AUTHOR"})).unwrap();
		let identity = Identity::from_claims(&claims).unwrap();
		assert_eq!(identity.role(), Some(Role::Author));
	}

	#[test]
	fn forbidden_names_the_action_and_type() {
		let ctx = context("u-1", "AUTHOR");
		let err = ctx.ensure(&Action::PUBLISH, &SubjectType::POST).unwrap_err();
		assert!(!err.is_setup_error());
		assert!(matches!(err, AuthzError::Forbidden { .. }));
		assert_eq!(err.to_string(), "forbidden: cannot publish Post");
	}
}

mod audit {
	use super::*;

	#[derive(Clone, Default)]
	struct Captured(Arc<Mutex<Vec<u8>>>);

	impl Captured {
		fn contents(&self) -> String {
			String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
		}
	}

	impl io::Write for Captured {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.0.lock().unwrap().extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	impl<'a> MakeWriter<'a> for Captured {
		type Writer = Captured;

		fn make_writer(&'a self) -> Self::Writer {
			self.clone()
		}
	}

	fn capture_info(f: impl FnOnce()) -> String {
		let captured = Captured::default();
		let subscriber = tracing_subscriber::fmt()
			.with_max_level(tracing::Level::INFO)
			.with_ansi(false)
			.with_writer(captured.clone())
			.finish();
		tracing::subscriber::with_default(subscriber, f);
		captured.contents()
	}

	#[test]
	fn audited_denials_are_logged_at_info() {
		let ctx = context("u-1", "AUTHOR")
			.with_settings(AuthzSettings::new().with_audit_denials(true));
		let output = capture_info(|| {
			assert!(ctx.cannot(&Action::PUBLISH, &SubjectType::POST));
		});
		assert!(output.contains("authorization denied"));
		assert!(output.contains("explicit_deny"));
		assert!(output.contains("role=AUTHOR"));
	}

	#[test]
	fn denials_are_quiet_by_default() {
		let ctx = context("u-1", "AUTHOR");
		let output = capture_info(|| {
			assert!(ctx.cannot(&Action::PUBLISH, &SubjectType::POST));
		});
		assert!(!output.contains("authorization denied"));
	}

	#[test]
	fn allowed_checks_are_not_audited() {
		let ctx = context("u-1", "ADMIN")
			.with_settings(AuthzSettings::new().with_audit_denials(true));
		let output = capture_info(|| {
			assert!(ctx.can(&Action::DELETE, &SubjectType::USER));
		});
		assert!(output.is_empty());
	}
}

proptest! {
	#[test]
	fn repeated_checks_agree(
		role in prop_oneof![Just("ADMIN"), Just("MODERATOR"), Just("AUTHOR")],
		action in arb_action(),
		subject_type in arb_subject_type(),
	) {
		let ctx = context("u-1", role);
		let first = ctx.evaluate(&action, &subject_type);
		let second = ctx.evaluate(&action, &subject_type);
		prop_assert_eq!(first, second);
	}
}
