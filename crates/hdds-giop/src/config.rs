// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Interpreter configuration.
//!
//! Supports both programmatic and file-based (TOML) configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Highest GIOP minor version the interpreter understands.
pub const MAX_SUPPORTED_MINOR: u8 = 2;

/// Upper bound accepted for `max_typecode_depth`.
pub const MAX_TYPECODE_DEPTH_LIMIT: usize = 256;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// GIOP interpreter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiopConfig {
    /// Messages with a higher minor version get an opaque body.
    #[serde(default = "default_max_minor_version")]
    pub max_minor_version: u8,

    /// Nesting limit for complex TypeCodes.
    #[serde(default = "default_max_typecode_depth")]
    pub max_typecode_depth: usize,

    /// Try heuristic payload decoders when no explicit one matches.
    #[serde(default = "default_true")]
    pub heuristic_dispatch: bool,

    /// File of stringified IORs seeding the object key registry.
    #[serde(default)]
    pub ior_file: Option<PathBuf>,
}

fn default_max_minor_version() -> u8 {
    MAX_SUPPORTED_MINOR
}

fn default_max_typecode_depth() -> usize {
    crate::typecode::DEFAULT_MAX_DEPTH
}

fn default_true() -> bool {
    true
}

impl Default for GiopConfig {
    fn default() -> Self {
        Self {
            max_minor_version: default_max_minor_version(),
            max_typecode_depth: default_max_typecode_depth(),
            heuristic_dispatch: true,
            ior_file: None,
        }
    }
}

impl GiopConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_minor_version > MAX_SUPPORTED_MINOR {
            return Err(ConfigError::Invalid(format!(
                "max_minor_version {} exceeds supported GIOP 1.{}",
                self.max_minor_version, MAX_SUPPORTED_MINOR
            )));
        }
        if self.max_typecode_depth == 0 || self.max_typecode_depth > MAX_TYPECODE_DEPTH_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_typecode_depth must be within 1..={}, got {}",
                MAX_TYPECODE_DEPTH_LIMIT, self.max_typecode_depth
            )));
        }
        Ok(())
    }
}
