// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

// Service config loader
//
// Loads sajumon.yaml, applies defaults, resolves `${VAR}` interpolation and
// validates every section into typed structs.

mod defaults;
mod error;
mod interpolation;
mod loader;
mod raw;
mod source;
mod types;

pub use defaults::{DEFAULT_PORT, DEFAULT_PROMPT_EN, DEFAULT_PROMPT_KO};
pub use error::ConfigError;
pub use interpolation::{resolve_variables, ProcessEnv, VarLookup};
pub use loader::{compute_hash, load_config, load_config_with};
pub use source::{ConfigSource, FileSource, StringSource};
pub use types::*;
