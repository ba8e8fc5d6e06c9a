// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod adapter;
pub mod error;
pub mod marshal;
pub mod module_loader;

#[cfg(test)]
pub(crate) mod test_support;

pub use adapter::WasmAdapter;
pub use error::{WasmLoadError, WasmLoadResult};
pub use module_loader::WasmBackendLoader;
