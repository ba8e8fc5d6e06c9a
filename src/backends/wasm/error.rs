// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for sandboxed engine module loading.
//!
//! Loading covers file I/O, binary validation, compilation, and
//! instantiation. Per-call failures (marshaling, engine diagnostics) are
//! `AdapterError`, not this type; this covers only getting the module into
//! a usable state.

use thiserror::Error;

/// Maximum allowed engine module size (16MB)
pub const MAX_MODULE_SIZE: usize = 16 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum WasmLoadError {
    /// File I/O error during module loading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Module exceeds the configured size cap.
    #[error("engine module too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },

    /// Invalid or malformed WASM binary format.
    #[error("invalid WASM binary: {0}")]
    InvalidBinary(String),

    /// The binary is valid but not a core module (e.g. a component-model
    /// binary, which this backend does not host).
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// WASM binary parsing error from wasmparser.
    #[error("WASM parser error: {0}")]
    Parser(#[from] wasmparser::BinaryReaderError),

    /// Wasmtime engine creation or configuration error.
    #[error("engine creation error: {0}")]
    Engine(String),

    /// Module compilation or instantiation error.
    #[error("engine module error: {0}")]
    Module(String),

    /// The module does not export a required function or memory.
    #[error("engine module missing export '{0}'")]
    MissingExport(String),
}

/// Result type alias for module loading.
pub type WasmLoadResult<T> = Result<T, WasmLoadError>;
