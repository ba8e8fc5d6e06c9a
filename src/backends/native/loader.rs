// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Multi-strategy native backend loader.
//!
//! Produces a working adapter handle for the process-hosted native engine,
//! or one aggregated diagnostic naming every attempted strategy. Loading is
//! single-flight: concurrent callers of a not-yet-loaded backend share one
//! search and observe the same handle or the same failure.
//!
//! Retention is a policy choice, not a given: with
//! `retain_native_handle = false` (the serverless default) each resolution
//! after the in-flight one re-runs the full strategy search, bounding
//! per-container memory growth at the cost of repeated-load latency.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::RuntimeConfig;
use crate::contract::EphemerisAdapter;
use crate::observability::messages::loader::{
    BackendResolved, LoaderExhausted, StrategyAttempted, StrategyFailed,
};
use crate::utils::SingleFlight;

use super::error::{LoaderError, StrategyFailure};
use super::platform::platform_key;
use super::strategy::{
    FallbackLibraryStrategy, LoadStrategy, LocalBuildStrategy, PrebuiltStrategy,
};

pub struct NativeLoader {
    platform_key: String,
    strategies: Vec<Arc<dyn LoadStrategy>>,
    retain_handle: bool,
    ephemeris_path: Option<PathBuf>,
    retained: Mutex<Option<Arc<dyn EphemerisAdapter>>>,
    flight: SingleFlight<Arc<dyn EphemerisAdapter>, LoaderError>,
}

impl NativeLoader {
    /// Builds the production strategy tiers from configuration.
    pub fn new(config: &RuntimeConfig) -> Self {
        let key = platform_key();
        let strategies: Vec<Arc<dyn LoadStrategy>> = vec![
            Arc::new(PrebuiltStrategy::new(
                config.prebuilt_roots.clone(),
                key.clone(),
            )),
            Arc::new(LocalBuildStrategy::new(config.local_build_dir.clone())),
            Arc::new(FallbackLibraryStrategy::new(
                config.fallback_library.clone(),
            )),
        ];
        let mut loader =
            Self::with_strategies(key, strategies, config.retain_native_handle);
        loader.ephemeris_path = config.ephemeris_path.clone();
        loader
    }

    /// Injection seam for tests and embedders with their own tiers.
    pub fn with_strategies(
        platform_key: String,
        strategies: Vec<Arc<dyn LoadStrategy>>,
        retain_handle: bool,
    ) -> Self {
        Self {
            platform_key,
            strategies,
            retain_handle,
            ephemeris_path: None,
            retained: Mutex::new(None),
            flight: SingleFlight::new(),
        }
    }

    /// Resolves a backend handle, searching strategies in order.
    pub async fn load(&self) -> Result<Arc<dyn EphemerisAdapter>, Arc<LoaderError>> {
        if self.retain_handle {
            let retained = self
                .retained
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            if let Some(handle) = retained {
                return Ok(handle);
            }
        }

        let outcome = self
            .flight
            .run(|| {
                Self::resolve(
                    &self.platform_key,
                    &self.strategies,
                    self.ephemeris_path.as_deref(),
                )
            })
            .await;

        if self.retain_handle {
            if let Ok(handle) = &outcome {
                *self.retained.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(handle.clone());
            }
        }
        outcome
    }

    /// Drops a retained handle so the next load searches again. Intended
    /// for tests and explicit resets.
    pub fn reset(&self) {
        *self.retained.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    async fn resolve(
        platform_key: &str,
        strategies: &[Arc<dyn LoadStrategy>],
        ephemeris_path: Option<&std::path::Path>,
    ) -> Result<Arc<dyn EphemerisAdapter>, LoaderError> {
        let mut attempts = Vec::new();

        for strategy in strategies {
            let name = strategy.describe();
            tracing::debug!("{}", StrategyAttempted { strategy: &name });
            match strategy.attempt().await {
                Ok(adapter) => {
                    tracing::info!(
                        "{}",
                        BackendResolved {
                            strategy: &name,
                            platform_key,
                        }
                    );
                    if let Some(path) = ephemeris_path {
                        if let Err(error) = adapter.set_ephemeris_path(path) {
                            tracing::warn!("failed to set ephemeris path: {error}");
                        }
                    }
                    return Ok(adapter);
                }
                Err(error) => {
                    let reason = format!("{:#}", error);
                    tracing::warn!(
                        "{}",
                        StrategyFailed {
                            strategy: &name,
                            reason: &reason,
                        }
                    );
                    attempts.push(StrategyFailure {
                        strategy: name,
                        reason,
                    });
                }
            }
        }

        tracing::error!(
            "{}",
            LoaderExhausted {
                platform_key,
                attempt_count: attempts.len(),
            }
        );
        Err(LoaderError::Exhausted {
            platform_key: platform_key.to_string(),
            attempts,
        })
    }
}
