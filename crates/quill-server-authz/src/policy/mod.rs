// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rule-based policy engine.
//!
//! The engine is structured in four layers:
//!
//! 1. **Rules** ([`rule`]): grants and denials of an action on a subject type,
//!    optionally narrowed by a field condition
//! 2. **Policy sets** ([`set`]): an identity's rules plus the decision algorithm
//! 3. **Filters** ([`filter`]): the storage-facing form of a list permission
//! 4. **Builder** ([`builder`]): the static role table
//!
//! # Example
//!
//! ```
//! use quill_server_authz::policy::{build_policy_set, Action, SubjectType};
//! use quill_server_authz::{Identity, Instance, Role};
//! use serde_json::json;
//!
//! let identity = Identity::new("u-1", Role::Author).unwrap();
//! let policy = build_policy_set(&identity);
//!
//! let own_draft = Instance::from_json(json!({"authorId": "u-1", "isPublished": false}));
//! let their_draft = Instance::from_json(json!({"authorId": "u-2", "isPublished": false}));
//!
//! assert!(policy.can(&Action::READ, &own_draft));
//! assert!(policy.cannot(&Action::READ, &their_draft));
//! assert!(policy.cannot(&Action::PUBLISH, &SubjectType::POST));
//! ```

pub mod builder;
pub mod filter;
pub mod rule;
pub mod set;

pub use builder::{build_policy_set, role_rules};
pub use filter::AccessFilter;
pub use rule::{Action, Effect, FieldCondition, Rule, SubjectType};
pub use set::{Decision, DenialReason, PolicySet, Subject};
