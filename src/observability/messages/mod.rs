// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod cache;
pub mod config;
pub mod loader;
pub mod pool;
pub mod wasm;
