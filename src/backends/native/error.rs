// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for native backend resolution.
//!
//! Resolution failure is always a single aggregated diagnostic: every
//! attempted strategy with its failure reason, the computed platform key,
//! and the officially supported platform keys. It is never retried
//! automatically; retry policy belongs to the caller.

use thiserror::Error;

use super::platform::{is_supported, SUPPORTED_PLATFORMS};

/// One failed strategy attempt, as recorded for the final diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    pub strategy: String,
    pub reason: String,
}

/// Error type for native backend loading.
#[derive(Error, Debug, Clone)]
pub enum LoaderError {
    /// Every strategy failed. Carries the full attempt log.
    #[error("{}", render_exhausted(.platform_key, .attempts))]
    Exhausted {
        platform_key: String,
        attempts: Vec<StrategyFailure>,
    },
}

fn render_exhausted(platform_key: &str, attempts: &[StrategyFailure]) -> String {
    let mut message = format!(
        "no usable native engine for platform '{}'",
        platform_key
    );
    if !is_supported(platform_key) {
        message.push_str(" (not an officially supported platform)");
    }
    for failure in attempts {
        message.push_str(&format!("\n  {}: {}", failure.strategy, failure.reason));
    }
    message.push_str(&format!(
        "\nofficially supported platforms: {}",
        SUPPORTED_PLATFORMS.join(", ")
    ));
    message
}

/// Result type alias for native backend loading.
pub type LoaderResult<T> = Result<T, LoaderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_lists_every_attempt() {
        let err = LoaderError::Exhausted {
            platform_key: "linux-x86_64".to_string(),
            attempts: vec![
                StrategyFailure {
                    strategy: "prebuilt search".to_string(),
                    reason: "no candidate found".to_string(),
                },
                StrategyFailure {
                    strategy: "local build".to_string(),
                    reason: "target/sweph missing".to_string(),
                },
            ],
        };

        let rendered = err.to_string();
        assert!(rendered.contains("linux-x86_64"));
        assert!(rendered.contains("prebuilt search"));
        assert!(rendered.contains("no candidate found"));
        assert!(rendered.contains("local build"));
        assert!(rendered.contains("officially supported platforms"));
        assert!(rendered.contains("macos-aarch64"));
    }

    #[test]
    fn test_unsupported_platform_is_called_out() {
        let err = LoaderError::Exhausted {
            platform_key: "plan9-mips".to_string(),
            attempts: vec![],
        };
        assert!(err.to_string().contains("not an officially supported platform"));
    }
}
