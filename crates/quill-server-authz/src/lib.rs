// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role- and ownership-based authorization for the Quill publishing API.
//!
//! This crate provides:
//! - Typed identities, roles and resources (posts, comments, users)
//! - A rule-based policy engine with deny-overrides-allow and default-deny
//! - Access filters that restrict list queries to accessible rows
//! - A per-request [`AuthorizationContext`] consumed by request handlers
//!
//! # Design
//!
//! Permissions can depend on resource field values (authorship, published
//! and hidden state), not only on the action/resource-type pair. A role is
//! therefore expanded into a list of [`Rule`]s, each optionally narrowed by
//! a [`FieldCondition`], and one deterministic algorithm evaluates them:
//!
//! 1. **Pure**: policy sets are built from `(user id, role)` alone, with no I/O
//! 2. **Per request**: every request builds its own set; nothing is shared
//! 3. **Conservative**: no matching rule means deny, and any applicable deny
//!    beats every allow
//! 4. **Serializable**: rules, decisions and filters can be logged as JSON
//!
//! Authentication, persistence and HTTP status mapping belong to the caller.

pub mod context;
pub mod error;
pub mod policy;
pub mod resource;
pub mod types;

pub use context::{AuthorizationContext, AuthzSettings};
pub use error::AuthzError;
pub use policy::{
	build_policy_set, role_rules, AccessFilter, Action, Decision, DenialReason, Effect,
	FieldCondition, PolicySet, Rule, Subject, SubjectType,
};
pub use resource::{classify, slugify, Comment, FieldValue, Instance, Post, Resource, User};
pub use types::{CommentId, Identity, IdentityClaims, PostId, Role, UnknownRole, UserId};
