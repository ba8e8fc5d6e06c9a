// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runtime configuration.
//!
//! The loader, cache, and pool consume an explicit [`RuntimeConfig`]
//! constructed by the embedding application. Environment-variable sniffing
//! is confined to [`RuntimeConfig::from_env`]; the rest of the crate reads
//! plain fields and never branches on ambient environment state.
//!
//! In a detected serverless execution context the defaults trade
//! repeated-load latency for bounded per-container memory: the native
//! handle is not retained across invocations and the pool shrinks to a
//! single instance. Callers needing retention there opt in by setting the
//! fields explicitly.

pub mod consts;

use std::path::PathBuf;
use std::time::Duration;

use crate::observability::messages::config::ServerlessMarkerDetected;

/// Environment markers indicating a short-lived serverless execution
/// context. Presence of any one is sufficient to flip the defaults.
pub const SERVERLESS_MARKERS: &[&str] = &[
    "AWS_LAMBDA_FUNCTION_NAME",
    "LAMBDA_TASK_ROOT",
    "VERCEL",
    "NETLIFY",
    "FUNCTIONS_WORKER_RUNTIME",
    "K_SERVICE",
];

/// Returns the first serverless marker present in the process environment.
pub fn detect_serverless_marker() -> Option<&'static str> {
    detect_serverless_marker_in(|name| std::env::var(name).ok())
}

fn detect_serverless_marker_in<F>(lookup: F) -> Option<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    SERVERLESS_MARKERS
        .iter()
        .copied()
        .find(|name| lookup(name).is_some_and(|value| !value.is_empty()))
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Retain the resolved native engine handle across load calls. Off in
    /// serverless defaults.
    pub retain_native_handle: bool,
    /// Result cache on/off.
    pub cache_enabled: bool,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    /// Maximum live instances the pool will hold or hand out.
    pub pool_max_size: usize,
    /// How long `acquire` waits on an exhausted pool before failing.
    pub pool_acquire_timeout: Duration,
    /// Roots searched for prebuilt engine binaries, in order. Each root is
    /// expected to contain `prebuilt/{platform-key}/{library-file}`.
    pub prebuilt_roots: Vec<PathBuf>,
    /// Directory probed for a locally built engine binary.
    pub local_build_dir: PathBuf,
    /// Library stem of the optional last-resort engine, resolved through
    /// the platform's loader search path.
    pub fallback_library: String,
    /// Location of the sandboxed engine's bytecode module.
    pub wasm_module_path: PathBuf,
    /// Engine data-file directory handed to the backend after load, when
    /// set.
    pub ephemeris_path: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            retain_native_handle: true,
            cache_enabled: true,
            cache_capacity: consts::DEFAULT_CACHE_CAPACITY,
            cache_ttl: consts::DEFAULT_CACHE_TTL,
            pool_max_size: consts::DEFAULT_POOL_MAX_SIZE,
            pool_acquire_timeout: consts::DEFAULT_POOL_ACQUIRE_TIMEOUT,
            prebuilt_roots: vec![
                PathBuf::from("prebuilt"),
                PathBuf::from("vendor/sweph/prebuilt"),
            ],
            local_build_dir: PathBuf::from("target/sweph"),
            fallback_library: "swemini".to_string(),
            wasm_module_path: PathBuf::from("modules/sweph.wasm"),
            ephemeris_path: None,
        }
    }
}

impl RuntimeConfig {
    /// Builds a config with defaults adjusted for the detected execution
    /// environment. This is the only place the crate reads environment
    /// variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(marker) = detect_serverless_marker() {
            tracing::info!("{}", ServerlessMarkerDetected { marker });
            config.retain_native_handle = false;
            config.pool_max_size = 1;
        }
        config
    }
}
