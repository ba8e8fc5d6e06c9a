// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for sandboxed engine module loading and marshaling events.

use std::fmt::{Display, Formatter};

/// Engine module loaded and instantiated successfully.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use ephbridge::observability::messages::wasm::EngineModuleLoaded;
///
/// let msg = EngineModuleLoaded {
///     module_path: "modules/sweph.wasm",
///     size_bytes: 4096,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct EngineModuleLoaded<'a> {
    pub module_path: &'a str,
    pub size_bytes: usize,
}

impl Display for EngineModuleLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded sandboxed engine module: {} ({} bytes)",
            self.module_path, self.size_bytes
        )
    }
}

/// Engine module loading failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct EngineModuleLoadFailed<'a> {
    pub module_path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for EngineModuleLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to load sandboxed engine module '{}': {}",
            self.module_path, self.error
        )
    }
}

/// Freeing a scratch buffer failed during frame teardown. The pointer is
/// leaked for the life of the module instance.
///
/// # Log Level
/// `warn!` - Recoverable, but worth surfacing
pub struct ScratchFreeFailed<'a> {
    pub pointer: i32,
    pub detail: &'a str,
}

impl Display for ScratchFreeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to free scratch buffer at {}: {}",
            self.pointer, self.detail
        )
    }
}
