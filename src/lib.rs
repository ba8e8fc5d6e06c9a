// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;      // native + sandboxed engine backends
pub mod cache;         // bounded TTL result cache
pub mod config;        // runtime configuration + environment boundary
pub mod contract;      // adapter contract + result types
pub mod errors;        // error handling
pub mod observability;
pub mod pool;          // bounded instance pool
pub mod service;       // cached adapter bundle
pub mod utils;         // shared helpers
