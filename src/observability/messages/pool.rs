// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for instance pool lifecycle events.

use std::fmt::{Display, Formatter};
use std::time::Duration;

/// A fresh instance was built because no idle one was available.
///
/// # Log Level
/// `info!` - Important operational event
pub struct InstanceBuilt {
    pub idle_len: usize,
}

impl Display for InstanceBuilt {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Built new pooled instance (idle after acquire: {})",
            self.idle_len
        )
    }
}

/// An idle instance was handed out again.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct InstanceReused {
    pub idle_len: usize,
}

impl Display for InstanceReused {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Reusing idle pooled instance (idle after acquire: {})",
            self.idle_len
        )
    }
}

/// A returned instance was dropped because the idle list was full.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct InstanceDropped {
    pub idle_len: usize,
}

impl Display for InstanceDropped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dropped returned instance, idle list full at {}",
            self.idle_len
        )
    }
}

/// `acquire` gave up after its bounded wait.
///
/// # Log Level
/// `warn!` - Recoverable, but worth surfacing
pub struct PoolExhausted {
    pub waited: Duration,
    pub max_size: usize,
}

impl Display for PoolExhausted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Instance pool exhausted (max {}), gave up after {:?}",
            self.max_size, self.waited
        )
    }
}
