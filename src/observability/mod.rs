// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! Message types follow a struct-based pattern with a `Display`
//! implementation, consumed through `tracing`. This keeps magic strings out
//! of the loader/adapter/cache/pool code and gives every operational event
//! one definition site.
//!
//! Messages are organized by subsystem:
//! * `messages::loader` - native backend resolution events
//! * `messages::wasm` - sandboxed module loading and marshaling events
//! * `messages::cache` - result cache lifecycle events
//! * `messages::pool` - instance pool lifecycle events
//! * `messages::config` - environment detection events

pub mod messages;

/// Installs a `tracing` subscriber reading `RUST_LOG`, for binaries and
/// tests embedding the crate. Safe to call more than once; only the first
/// call installs.
pub fn init() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
