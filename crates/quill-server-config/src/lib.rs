// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration for the Quill server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`QUILL_SERVER_*`)
//! - Tracing subscriber setup driven by the logging section
//!
//! # Usage
//!
//! ```ignore
//! use quill_server_authz::{AuthorizationContext, IdentityClaims};
//! use quill_server_config::{init_tracing, load_config};
//!
//! let config = load_config()?;
//! init_tracing(&config.logging)?;
//!
//! let ctx = AuthorizationContext::from_claims(Some(&claims))?
//!     .with_settings(config.authz.settings());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

fn default_environment() -> String {
	"development".to_string()
}

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
	/// Deployment environment name (`development`, `production`, ...).
	pub environment: String,
	pub logging: LoggingConfig,
	pub authz: AuthzConfig,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			environment: default_environment(),
			logging: LoggingConfig::default(),
			authz: AuthzConfig::default(),
		}
	}
}

impl ServerConfig {
	pub fn is_production(&self) -> bool {
		self.environment == "production"
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`QUILL_SERVER_*`)
/// 2. Config file (`/etc/quill/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	let mut merged = ServerConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let environment = layer.environment.unwrap_or_else(default_environment);
	let logging = layer.logging.unwrap_or_default().finalize();
	let authz = layer.authz.unwrap_or_default().finalize();

	validate_config(&logging)?;

	info!(
		environment = %environment,
		log_level = %logging.level,
		log_json = logging.json,
		audit_denials = authz.audit_denials,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		environment,
		logging,
		authz,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(logging: &LoggingConfig) -> Result<(), ConfigError> {
	if logging.level.trim().is_empty() {
		return Err(ConfigError::Validation(
			"QUILL_SERVER_LOG_LEVEL must not be empty".to_string(),
		));
	}

	Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(logging: &LoggingConfig) -> Result<(), TryInitError> {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

	let json = logging
		.json
		.then(|| tracing_subscriber::fmt::layer().json());
	let plain = (!logging.json).then(tracing_subscriber::fmt::layer);

	tracing_subscriber::registry()
		.with(filter)
		.with(json)
		.with(plain)
		.try_init()
}
