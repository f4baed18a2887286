// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access filters for bulk reads.
//!
//! An [`AccessFilter`] describes which instances of a subject type an
//! identity may act on. It can be applied in memory or rendered into a
//! parameterized SQL predicate for the storage layer.

use super::rule::FieldCondition;
use crate::resource::{FieldValue, Resource};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessFilter {
	/// Every instance is accessible.
	Everything,
	/// No instance is accessible. Storage must return an empty result.
	Nothing,
	/// Instances matching any of `any_of` and none of `none_of`.
	Conditions {
		any_of: Vec<FieldCondition>,
		none_of: Vec<FieldCondition>,
	},
}

impl AccessFilter {
	pub fn is_nothing(&self) -> bool {
		matches!(self, AccessFilter::Nothing)
	}

	pub fn matches<R: Resource + ?Sized>(&self, resource: &R) -> bool {
		match self {
			AccessFilter::Everything => true,
			AccessFilter::Nothing => false,
			AccessFilter::Conditions { any_of, none_of } => {
				any_of.iter().any(|c| c.matches(resource))
					&& !none_of.iter().any(|c| c.matches(resource))
			}
		}
	}

	/// Keeps the rows the filter admits, in their original order.
	pub fn select<'r, R: Resource>(&self, rows: &'r [R]) -> Vec<&'r R> {
		rows.iter().filter(|row| self.matches(*row)).collect()
	}

	/// Appends the filter to `builder` as a boolean SQL expression.
	///
	/// Condition fields become double-quoted column identifiers and values
	/// are bound as parameters, never inlined.
	pub fn push_sql(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
		match self {
			AccessFilter::Everything => {
				builder.push("1 = 1");
			}
			AccessFilter::Nothing => {
				builder.push("1 = 0");
			}
			AccessFilter::Conditions { any_of, none_of } => {
				push_disjunction(builder, any_of);
				if !none_of.is_empty() {
					builder.push(" AND NOT ");
					push_disjunction(builder, none_of);
				}
			}
		}
	}
}

fn push_disjunction(builder: &mut QueryBuilder<'_, Sqlite>, conditions: &[FieldCondition]) {
	if conditions.is_empty() {
		builder.push("(1 = 0)");
		return;
	}

	builder.push("(");
	for (i, condition) in conditions.iter().enumerate() {
		if i > 0 {
			builder.push(" OR ");
		}
		push_conjunction(builder, condition);
	}
	builder.push(")");
}

fn push_conjunction(builder: &mut QueryBuilder<'_, Sqlite>, condition: &FieldCondition) {
	if condition.is_empty() {
		builder.push("(1 = 1)");
		return;
	}

	builder.push("(");
	for (i, (field, value)) in condition.iter().enumerate() {
		if i > 0 {
			builder.push(" AND ");
		}
		builder.push(quote_ident(field));
		builder.push(" = ");
		match value {
			FieldValue::Bool(b) => builder.push_bind(*b),
			FieldValue::Integer(n) => builder.push_bind(*n),
			FieldValue::Text(s) => builder.push_bind(s.clone()),
		};
	}
	builder.push(")");
}

fn quote_ident(name: &str) -> String {
	format!("\"{}\"", name.replace('"', "\"\""))
}

impl fmt::Display for AccessFilter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AccessFilter::Everything => f.write_str("true"),
			AccessFilter::Nothing => f.write_str("false"),
			AccessFilter::Conditions { any_of, none_of } => {
				let join = |conditions: &[FieldCondition]| {
					if conditions.is_empty() {
						return "false".to_string();
					}
					conditions
						.iter()
						.map(|c| format!("({c})"))
						.collect::<Vec<_>>()
						.join(" OR ")
				};
				write!(f, "{}", join(any_of))?;
				if !none_of.is_empty() {
					write!(f, " AND NOT ({})", join(none_of))?;
				}
				Ok(())
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::resource::Instance;
	use serde_json::json;

	fn drafts_filter() -> AccessFilter {
		AccessFilter::Conditions {
			any_of: vec![
				FieldCondition::new().with("isPublished", true),
				FieldCondition::new()
					.with("isPublished", false)
					.with("authorId", "u-1"),
			],
			none_of: vec![],
		}
	}

	mod in_memory {
		use super::*;

		#[test]
		fn everything_and_nothing() {
			let row = Instance::from_json(json!({"isHidden": false}));
			assert!(AccessFilter::Everything.matches(&row));
			assert!(!AccessFilter::Nothing.matches(&row));
		}

		#[test]
		fn selects_matching_rows() {
			let rows = vec![
				Instance::from_json(json!({"id": 1, "isPublished": true, "authorId": "x"})),
				Instance::from_json(json!({"id": 2, "isPublished": false, "authorId": "u-1"})),
				Instance::from_json(json!({"id": 3, "isPublished": false, "authorId": "other"})),
			];
			let selected: Vec<_> = drafts_filter()
				.select(&rows)
				.into_iter()
				.map(|row| row.fields()["id"].clone())
				.collect();
			assert_eq!(selected, vec![json!(1), json!(2)]);
		}

		#[test]
		fn exclusions_remove_rows() {
			let filter = AccessFilter::Conditions {
				any_of: vec![FieldCondition::new()],
				none_of: vec![FieldCondition::new().with("isHidden", true)],
			};
			assert!(filter.matches(&Instance::from_json(json!({"isHidden": false}))));
			assert!(!filter.matches(&Instance::from_json(json!({"isHidden": true}))));
		}
	}

	mod sql {
		use super::*;

		fn render(filter: &AccessFilter) -> String {
			let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM posts WHERE ");
			filter.push_sql(&mut builder);
			builder.sql().to_string()
		}

		#[test]
		fn constant_filters() {
			assert_eq!(render(&AccessFilter::Everything), "SELECT * FROM posts WHERE 1 = 1");
			assert_eq!(render(&AccessFilter::Nothing), "SELECT * FROM posts WHERE 1 = 0");
		}

		#[test]
		fn conditions_are_parameterized() {
			assert_eq!(
				render(&drafts_filter()),
				"SELECT * FROM posts WHERE ((\"isPublished\" = ?) OR (\"authorId\" = ? AND \"isPublished\" = ?))"
			);
		}

		#[test]
		fn exclusions_render_as_and_not() {
			let filter = AccessFilter::Conditions {
				any_of: vec![FieldCondition::new()],
				none_of: vec![FieldCondition::new().with("isHidden", true)],
			};
			assert_eq!(
				render(&filter),
				"SELECT * FROM posts WHERE ((1 = 1)) AND NOT ((\"isHidden\" = ?))"
			);
		}

		#[test]
		fn empty_disjunction_admits_nothing() {
			let filter = AccessFilter::Conditions {
				any_of: vec![],
				none_of: vec![],
			};
			assert_eq!(render(&filter), "SELECT * FROM posts WHERE (1 = 0)");
			assert!(!filter.matches(&Instance::from_json(json!({"isHidden": false}))));
			assert_eq!(filter.to_string(), "false");
		}

		#[test]
		fn empty_exclusions_render_without_and_not() {
			let filter = AccessFilter::Conditions {
				any_of: vec![FieldCondition::new().with("isHidden", false)],
				none_of: vec![],
			};
			assert_eq!(
				render(&filter),
				"SELECT * FROM posts WHERE ((\"isHidden\" = ?))"
			);
		}

		#[test]
		fn identifiers_are_escaped() {
			assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
		}
	}

	#[test]
	fn display_reads_like_a_predicate() {
		assert_eq!(
			drafts_filter().to_string(),
			r#"(isPublished = true) OR (authorId = "u-1" AND isPublished = false)"#
		);
	}
}
