// Copyright 2025 calcrpc Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # calcrpc CLI
//!
//! Command-line interface for the calcrpc system.
//!
//! The `calcrpc` binary runs each component of a deployment:
//!
//! - **Registry**: the UDP discovery service
//! - **Servers**: one operation server per role
//! - **Client**: a single call, printed for scripting
//!
//! This library holds the start-up helpers shared by the subcommands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use calcrpc_common::config::Config;

/// Loads the static configuration.
///
/// An explicit `--config` path must exist. Otherwise the `CALCRPC_CONFIG`
/// variable or `calcrpc.json` is used when present, and the built-in
/// defaults when not.
pub fn load_config(flag: Option<&str>) -> Result<Config> {
    let path = Config::resolve_path(flag);

    let config = if flag.is_some() {
        Config::load(&path)
    } else {
        Config::load_or_default(&path)
    }
    .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    Ok(config)
}

/// Applies a `--cache-dir` override, if any.
pub fn with_cache_dir(mut config: Config, cache_dir: Option<PathBuf>) -> Config {
    if let Some(dir) = cache_dir {
        config.cache.directory = dir;
    }
    config
}

/// Installs the tracing subscriber.
///
/// Defaults to INFO, overridable through `RUST_LOG`.
pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
