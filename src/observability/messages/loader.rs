// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for native backend resolution events.

use std::fmt::{Display, Formatter};

/// A load strategy is about to run.
///
/// # Log Level
/// `debug!` - Diagnostic detail
///
/// # Example
/// ```
/// use ephbridge::observability::messages::loader::StrategyAttempted;
///
/// let msg = StrategyAttempted {
///     strategy: "prebuilt search",
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct StrategyAttempted<'a> {
    pub strategy: &'a str,
}

impl Display for StrategyAttempted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Attempting native engine load strategy: {}", self.strategy)
    }
}

/// A load strategy failed; the loader moves on to the next one.
///
/// # Log Level
/// `warn!` - Recoverable, but worth surfacing
pub struct StrategyFailed<'a> {
    pub strategy: &'a str,
    pub reason: &'a str,
}

impl Display for StrategyFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Native engine load strategy '{}' failed: {}",
            self.strategy, self.reason
        )
    }
}

/// A backend was resolved and is ready for use.
///
/// # Log Level
/// `info!` - Important operational event
pub struct BackendResolved<'a> {
    pub strategy: &'a str,
    pub platform_key: &'a str,
}

impl Display for BackendResolved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Resolved native engine via '{}' for platform {}",
            self.strategy, self.platform_key
        )
    }
}

/// Every strategy failed; the aggregated error is about to be returned.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct LoaderExhausted<'a> {
    pub platform_key: &'a str,
    pub attempt_count: usize,
}

impl Display for LoaderExhausted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "No native engine could be loaded for platform {} after {} strategies",
            self.platform_key, self.attempt_count
        )
    }
}
