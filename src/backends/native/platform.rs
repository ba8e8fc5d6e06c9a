// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Platform key detection for prebuilt binary resolution.
//!
//! Prebuilt engine binaries are laid out in a directory tree keyed by
//! `{operating-system}-{architecture}`. An off-list platform is not fatal
//! at resolution time - a locally built or fallback library may still load -
//! so the supported list is only reported in the final diagnostic.

/// Platform keys for which prebuilt engine binaries are published.
pub const SUPPORTED_PLATFORMS: &[&str] = &[
    "linux-x86_64",
    "linux-aarch64",
    "macos-x86_64",
    "macos-aarch64",
    "windows-x86_64",
];

/// Library stem of the engine binary inside a platform directory.
pub const ENGINE_LIBRARY_STEM: &str = "sweph";

/// Key for the current process: `{os}-{arch}`.
pub fn platform_key() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

pub fn is_supported(key: &str) -> bool {
    SUPPORTED_PLATFORMS.contains(&key)
}

/// Platform-specific file name for a library stem, e.g. `libsweph.so` on
/// Linux or `sweph.dll` on Windows.
pub fn library_file_name(stem: &str) -> String {
    format!(
        "{}{}{}",
        std::env::consts::DLL_PREFIX,
        stem,
        std::env::consts::DLL_SUFFIX
    )
}
