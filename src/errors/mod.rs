// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Re-export hub for the crate's error types.

pub use crate::backends::native::error::{LoaderError, LoaderResult, StrategyFailure};
pub use crate::backends::wasm::error::{WasmLoadError, WasmLoadResult};
pub use crate::contract::error::{AdapterError, AdapterResult};
pub use crate::pool::PoolError;
