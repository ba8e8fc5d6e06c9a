// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for result cache lifecycle events.

use std::fmt::{Display, Formatter};

/// An entry was evicted to make room at capacity.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct EntryEvicted<'a> {
    pub key: &'a str,
}

impl Display for EntryEvicted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Evicted oldest cache entry: {}", self.key)
    }
}

/// An entry was found expired on read and removed.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct EntryExpired<'a> {
    pub key: &'a str,
}

impl Display for EntryExpired<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Removed expired cache entry: {}", self.key)
    }
}

/// The cache was switched off and its contents dropped.
///
/// # Log Level
/// `info!` - Important operational event
pub struct CacheDisabled {
    pub dropped_entries: usize,
}

impl Display for CacheDisabled {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Result cache disabled, dropped {} entries",
            self.dropped_entries
        )
    }
}
