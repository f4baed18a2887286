// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Logging configuration section.

use serde::{Deserialize, Serialize};

fn default_level() -> String {
	"info,quill_server_authz=info".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfigLayer {
	pub level: Option<String>,
	pub json: Option<bool>,
}

impl LoggingConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.level.is_some() {
			self.level = other.level;
		}
		if other.json.is_some() {
			self.json = other.json;
		}
	}

	pub fn finalize(self) -> LoggingConfig {
		LoggingConfig {
			level: self.level.unwrap_or_else(default_level),
			json: self.json.unwrap_or(false),
		}
	}
}

/// Resolved logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
	/// Filter directives, in `RUST_LOG` syntax.
	pub level: String,
	/// Emit JSON lines instead of human-readable output.
	pub json: bool,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: default_level(),
			json: false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = LoggingConfig::default();
		assert_eq!(config.level, "info,quill_server_authz=info");
		assert!(!config.json);
	}

	#[test]
	fn test_layer_finalize_with_values() {
		let layer = LoggingConfigLayer {
			level: Some("debug".to_string()),
			json: Some(true),
		};
		let config = layer.finalize();
		assert_eq!(config.level, "debug");
		assert!(config.json);
	}

	#[test]
	fn test_merge_overwrites() {
		let mut base = LoggingConfigLayer {
			level: Some("info".to_string()),
			json: Some(true),
		};
		base.merge(LoggingConfigLayer {
			level: Some("warn".to_string()),
			json: None,
		});
		assert_eq!(base.level, Some("warn".to_string()));
		assert_eq!(base.json, Some(true));
	}

	#[test]
	fn test_deserialize_layer_partial() {
		let layer: LoggingConfigLayer = toml::from_str("json = true").unwrap();
		assert!(layer.level.is_none());
		assert_eq!(layer.json, Some(true));
	}
}
