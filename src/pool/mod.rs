// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded instance pool for short-lived execution contexts.
//!
//! Reuses already-initialized (adapter + cache) bundles across invocations
//! so each one does not pay the backend load cost again. `acquire` hands an
//! idle instance back out or builds a fresh one through the injected
//! factory; total live instances are bounded by a semaphore, and an
//! exhausted pool makes callers wait a bounded time before failing with
//! [`PoolError::Exhausted`] rather than retrying forever.
//!
//! Release happens on guard drop: the instance's cache is cleared - its
//! adapter handle is not reset - and it rejoins the idle list only when the
//! list is below capacity; otherwise it is dropped.

use std::ops::Deref;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::RuntimeConfig;
use crate::observability::messages::pool::{
    InstanceBuilt, InstanceDropped, InstanceReused, PoolExhausted,
};
use crate::service::EngineService;

#[derive(Error, Debug)]
pub enum PoolError {
    /// No instance became available within the bounded wait.
    #[error("instance pool exhausted, gave up after {0:?}")]
    Exhausted(Duration),

    /// Building a fresh instance failed.
    #[error("failed to build pooled instance: {0}")]
    Build(String),

    /// The pool's semaphore was closed; no further instances are handed
    /// out.
    #[error("instance pool closed")]
    Closed,
}

/// Builds a fresh (adapter + cache) bundle when the pool has no idle one.
#[async_trait]
pub trait InstanceFactory: Send + Sync {
    async fn build(&self) -> anyhow::Result<EngineService>;
}

pub struct InstancePool {
    factory: Arc<dyn InstanceFactory>,
    idle: Mutex<Vec<EngineService>>,
    semaphore: Arc<Semaphore>,
    max_size: usize,
    acquire_timeout: Duration,
}

impl InstancePool {
    pub fn new(factory: Arc<dyn InstanceFactory>, config: &RuntimeConfig) -> Self {
        Self::with_limits(factory, config.pool_max_size, config.pool_acquire_timeout)
    }

    pub fn with_limits(
        factory: Arc<dyn InstanceFactory>,
        max_size: usize,
        acquire_timeout: Duration,
    ) -> Self {
        let max_size = max_size.max(1);
        Self {
            factory,
            idle: Mutex::new(Vec::new()),
            semaphore: Arc::new(Semaphore::new(max_size)),
            max_size,
            acquire_timeout,
        }
    }

    /// Borrows an instance, building one if no idle instance exists.
    /// Ownership transfers to the caller for the duration of the borrow;
    /// dropping the guard returns the instance.
    pub async fn acquire(&self) -> Result<PooledInstance<'_>, PoolError> {
        let permit = match tokio::time::timeout(
            self.acquire_timeout,
            self.semaphore.clone().acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(PoolError::Closed),
            Err(_) => {
                tracing::warn!(
                    "{}",
                    PoolExhausted {
                        waited: self.acquire_timeout,
                        max_size: self.max_size,
                    }
                );
                return Err(PoolError::Exhausted(self.acquire_timeout));
            }
        };

        let existing = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let service = match existing {
            Some(service) => {
                tracing::debug!(
                    "{}",
                    InstanceReused {
                        idle_len: self.idle_len(),
                    }
                );
                service
            }
            None => {
                // Permit is held while building; a build failure releases
                // it on drop.
                let service = self
                    .factory
                    .build()
                    .await
                    .map_err(|e| PoolError::Build(format!("{e:#}")))?;
                tracing::info!(
                    "{}",
                    InstanceBuilt {
                        idle_len: self.idle_len(),
                    }
                );
                service
            }
        };

        Ok(PooledInstance {
            pool: self,
            service: Some(service),
            _permit: permit,
        })
    }

    pub fn idle_len(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns a borrowed instance: clears its cache, then re-idles it if
    /// there is room, otherwise drops it.
    fn restore(&self, service: EngineService) {
        service.cache().clear();
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_size {
            idle.push(service);
        } else {
            tracing::debug!("{}", InstanceDropped { idle_len: idle.len() });
        }
    }
}

/// A borrowed pool instance. Dereferences to [`EngineService`]; dropping it
/// returns the instance to the pool.
pub struct PooledInstance<'a> {
    pool: &'a InstancePool,
    service: Option<EngineService>,
    _permit: OwnedSemaphorePermit,
}

impl std::fmt::Debug for PooledInstance<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledInstance").finish_non_exhaustive()
    }
}

impl Deref for PooledInstance<'_> {
    type Target = EngineService;

    fn deref(&self) -> &Self::Target {
        self.service
            .as_ref()
            .expect("pooled instance accessed after release")
    }
}

impl Drop for PooledInstance<'_> {
    fn drop(&mut self) {
        if let Some(service) = self.service.take() {
            self.pool.restore(service);
        }
    }
}
