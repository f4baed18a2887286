// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for quill-server.

pub mod authz;
pub mod logging;

pub use authz::{AuthzConfig, AuthzConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
