// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error type for adapter contract operations.
//!
//! Calculation failures are values, not panics: every fallible operation
//! returns `Result<T, AdapterError>` and callers must check before using a
//! result. Absence of a rise/set/transit event is represented in the result
//! type itself and never appears here.

use thiserror::Error;

/// Failure of a single contract operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The engine reported a calculation failure for this call (bad body
    /// id, missing data file for the requested date). The message is the
    /// engine's diagnostic, passed through unchanged.
    #[error("engine error: {message}")]
    Engine { message: String },

    /// Moving arguments or results across the backend boundary failed
    /// (allocation returned null, string decode failed, non-UTF-8 path).
    #[error("marshaling failed: {0}")]
    Marshal(String),

    /// The backend itself misbehaved outside the engine's own error
    /// protocol (trapped call, poisoned instance).
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Result type alias for contract operations.
pub type AdapterResult<T> = Result<T, AdapterError>;
