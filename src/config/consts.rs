// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;

/// Default result-cache capacity (entries).
pub const DEFAULT_CACHE_CAPACITY: usize = 256;
/// Default result-cache entry lifetime.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);
/// Default maximum pool size.
pub const DEFAULT_POOL_MAX_SIZE: usize = 4;
/// Default bounded wait before `acquire` reports exhaustion.
pub const DEFAULT_POOL_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
