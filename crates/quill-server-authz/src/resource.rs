// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resources that policies are evaluated against.
//!
//! A resource exposes two things to the engine: the subject type it
//! classifies as, and the values of its named fields. Field names are the
//! camelCase names shared with the storage layer (`authorId`, `isPublished`,
//! `isHidden`, ...), so a [`FieldCondition`](crate::policy::FieldCondition)
//! can be checked in memory or translated into a query filter unchanged.
//!
//! Typed records ([`Post`], [`Comment`], [`User`]) always know their subject
//! type. Untyped JSON rows ([`Instance`]) are classified by their shape
//! unless explicitly tagged.

use crate::policy::SubjectType;
use crate::types::{CommentId, PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A literal field value. Comparison is strict: values of different kinds
/// never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
	Bool(bool),
	Integer(i64),
	Text(String),
}

impl FieldValue {
	/// Converts a JSON scalar. Floats, nulls, arrays and objects have no
	/// literal form and yield `None`.
	pub fn from_json(value: &Value) -> Option<Self> {
		match value {
			Value::Bool(b) => Some(FieldValue::Bool(*b)),
			Value::Number(n) => n.as_i64().map(FieldValue::Integer),
			Value::String(s) => Some(FieldValue::Text(s.clone())),
			_ => None,
		}
	}
}

impl fmt::Display for FieldValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FieldValue::Bool(b) => write!(f, "{b}"),
			FieldValue::Integer(i) => write!(f, "{i}"),
			FieldValue::Text(s) => write!(f, "{s:?}"),
		}
	}
}

impl From<bool> for FieldValue {
	fn from(value: bool) -> Self {
		FieldValue::Bool(value)
	}
}

impl From<i64> for FieldValue {
	fn from(value: i64) -> Self {
		FieldValue::Integer(value)
	}
}

impl From<&str> for FieldValue {
	fn from(value: &str) -> Self {
		FieldValue::Text(value.to_string())
	}
}

impl From<String> for FieldValue {
	fn from(value: String) -> Self {
		FieldValue::Text(value)
	}
}

impl From<&UserId> for FieldValue {
	fn from(value: &UserId) -> Self {
		FieldValue::Text(value.as_str().to_string())
	}
}

/// Something a policy can be evaluated against.
pub trait Resource: fmt::Debug {
	/// The subject type this resource classifies as, or `None` when its
	/// shape does not map to any known kind.
	fn subject_type(&self) -> Option<SubjectType>;

	/// The literal value of a named field, if the resource has one.
	fn field(&self, name: &str) -> Option<FieldValue>;
}

// =============================================================================
// Typed records
// =============================================================================

/// A blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
	pub id: PostId,
	pub title: String,
	pub content: String,
	pub slug: String,
	pub author_id: UserId,
	pub is_published: bool,
	#[serde(default)]
	pub published_at: Option<DateTime<Utc>>,
}

impl Post {
	/// Creates an unpublished draft owned by `author_id`.
	pub fn draft(author_id: UserId, title: impl Into<String>, content: impl Into<String>) -> Self {
		let title = title.into();
		Self {
			id: PostId::generate(),
			slug: slugify(&title),
			title,
			content: content.into(),
			author_id,
			is_published: false,
			published_at: None,
		}
	}

	/// Builder: mark the post as published now.
	pub fn published(mut self) -> Self {
		self.is_published = true;
		self.published_at = Some(Utc::now());
		self
	}
}

impl Resource for Post {
	fn subject_type(&self) -> Option<SubjectType> {
		Some(SubjectType::POST)
	}

	fn field(&self, name: &str) -> Option<FieldValue> {
		match name {
			"id" => Some(self.id.as_str().into()),
			"title" => Some(self.title.as_str().into()),
			"content" => Some(self.content.as_str().into()),
			"slug" => Some(self.slug.as_str().into()),
			"authorId" => Some((&self.author_id).into()),
			"isPublished" => Some(self.is_published.into()),
			_ => None,
		}
	}
}

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
	pub id: CommentId,
	pub post_id: PostId,
	pub author_id: UserId,
	pub content: String,
	pub is_hidden: bool,
}

impl Resource for Comment {
	fn subject_type(&self) -> Option<SubjectType> {
		Some(SubjectType::COMMENT)
	}

	fn field(&self, name: &str) -> Option<FieldValue> {
		match name {
			"id" => Some(self.id.as_str().into()),
			"postId" => Some(self.post_id.as_str().into()),
			"authorId" => Some((&self.author_id).into()),
			"content" => Some(self.content.as_str().into()),
			"isHidden" => Some(self.is_hidden.into()),
			_ => None,
		}
	}
}

/// A registered user. Credentials never reach the policy engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: UserId,
	pub name: String,
	pub email: String,
	pub role: String,
}

impl Resource for User {
	fn subject_type(&self) -> Option<SubjectType> {
		Some(SubjectType::USER)
	}

	fn field(&self, name: &str) -> Option<FieldValue> {
		match name {
			"id" => Some((&self.id).into()),
			"name" => Some(self.name.as_str().into()),
			"email" => Some(self.email.as_str().into()),
			"role" => Some(self.role.as_str().into()),
			_ => None,
		}
	}
}

/// Lowercases a title and collapses it into a hyphenated slug.
pub fn slugify(title: &str) -> String {
	let cleaned: String = title
		.trim()
		.to_lowercase()
		.chars()
		.filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
		.collect();
	cleaned
		.split(|c: char| c.is_whitespace() || c == '-')
		.filter(|part| !part.is_empty())
		.collect::<Vec<_>>()
		.join("-")
}

// =============================================================================
// Untyped instances
// =============================================================================

/// An untyped resource row, e.g. a JSON object fetched by the storage layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instance {
	tag: Option<SubjectType>,
	fields: Map<String, Value>,
}

impl Instance {
	/// Wraps a JSON value; its subject type is inferred from its shape.
	/// Non-object values become an instance with no fields.
	pub fn from_json(value: Value) -> Self {
		let fields = match value {
			Value::Object(map) => map,
			_ => Map::new(),
		};
		Self { tag: None, fields }
	}

	/// Wraps a JSON value with an explicit subject type, bypassing shape
	/// classification.
	pub fn tagged(subject_type: SubjectType, value: Value) -> Self {
		Self {
			tag: Some(subject_type),
			..Self::from_json(value)
		}
	}

	pub fn fields(&self) -> &Map<String, Value> {
		&self.fields
	}
}

impl Resource for Instance {
	fn subject_type(&self) -> Option<SubjectType> {
		self.tag.clone().or_else(|| classify(&self.fields))
	}

	fn field(&self, name: &str) -> Option<FieldValue> {
		self.fields.get(name).and_then(FieldValue::from_json)
	}
}

/// Maps a row's structural shape to the subject type it represents.
///
/// | Fields present              | Subject type |
/// |-----------------------------|--------------|
/// | `authorId` and `isPublished`| `Post`       |
/// | `isHidden`                  | `Comment`    |
/// | `email` and `role`          | `User`       |
pub fn classify(fields: &Map<String, Value>) -> Option<SubjectType> {
	let has = |name: &str| fields.contains_key(name);

	if has("authorId") && has("isPublished") {
		Some(SubjectType::POST)
	} else if has("isHidden") {
		Some(SubjectType::COMMENT)
	} else if has("email") && has("role") {
		Some(SubjectType::USER)
	} else {
		None
	}
}
