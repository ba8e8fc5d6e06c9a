// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Load strategies for the native engine.
//!
//! The loader runs an ordered list of these; the first that produces a
//! working adapter wins. Each strategy reports a single reason string on
//! failure, which the loader folds into the aggregated diagnostic.
//!
//! The production tiers:
//! 1. [`PrebuiltStrategy`] - published binaries keyed by platform.
//! 2. [`LocalBuildStrategy`] - a binary produced by a local engine build.
//! 3. [`FallbackLibraryStrategy`] - a named alternative engine resolved
//!    through the platform loader's own search path.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;

use super::engine::NativeEngine;
use super::platform::{library_file_name, ENGINE_LIBRARY_STEM};
use crate::contract::EphemerisAdapter;

#[async_trait]
pub trait LoadStrategy: Send + Sync {
    /// Short human-readable name used in logs and the aggregated error.
    fn describe(&self) -> String;

    /// Tries to produce a working adapter.
    async fn attempt(&self) -> anyhow::Result<Arc<dyn EphemerisAdapter>>;
}

/// Tier 1: ordered search of prebuilt binaries under the configured roots.
/// Candidates are `{root}/prebuilt/{platform_key}/{library_file}`.
pub struct PrebuiltStrategy {
    roots: Vec<PathBuf>,
    platform_key: String,
}

impl PrebuiltStrategy {
    pub fn new(roots: Vec<PathBuf>, platform_key: String) -> Self {
        Self { roots, platform_key }
    }

    pub fn candidates(&self) -> Vec<PathBuf> {
        let file_name = library_file_name(ENGINE_LIBRARY_STEM);
        self.roots
            .iter()
            .map(|root| {
                root.join("prebuilt")
                    .join(&self.platform_key)
                    .join(&file_name)
            })
            .collect()
    }
}

#[async_trait]
impl LoadStrategy for PrebuiltStrategy {
    fn describe(&self) -> String {
        "prebuilt search".to_string()
    }

    async fn attempt(&self) -> anyhow::Result<Arc<dyn EphemerisAdapter>> {
        let candidates = self.candidates();
        if candidates.is_empty() {
            bail!("no prebuilt roots configured");
        }

        let mut reasons = String::new();
        for candidate in &candidates {
            if !candidate.exists() {
                let _ = write!(reasons, "; '{}' not present", candidate.display());
                continue;
            }
            match NativeEngine::load(candidate) {
                Ok(engine) => return Ok(Arc::new(engine)),
                Err(error) => {
                    let _ = write!(reasons, "; '{}': {:#}", candidate.display(), error);
                }
            }
        }
        bail!("no prebuilt binary loaded{}", reasons);
    }
}

/// Tier 2: a binary produced by building the engine locally.
pub struct LocalBuildStrategy {
    build_dir: PathBuf,
}

impl LocalBuildStrategy {
    pub fn new(build_dir: PathBuf) -> Self {
        Self { build_dir }
    }

    fn candidate(&self) -> PathBuf {
        self.build_dir.join(library_file_name(ENGINE_LIBRARY_STEM))
    }
}

#[async_trait]
impl LoadStrategy for LocalBuildStrategy {
    fn describe(&self) -> String {
        "local build".to_string()
    }

    async fn attempt(&self) -> anyhow::Result<Arc<dyn EphemerisAdapter>> {
        let candidate = self.candidate();
        if !candidate.exists() {
            bail!("'{}' not present", candidate.display());
        }
        let engine = NativeEngine::load(&candidate)?;
        Ok(Arc::new(engine))
    }
}

/// Tier 3: a named alternative engine library, left to the platform
/// loader's search path to find.
pub struct FallbackLibraryStrategy {
    stem: String,
}

impl FallbackLibraryStrategy {
    pub fn new(stem: String) -> Self {
        Self { stem }
    }
}

#[async_trait]
impl LoadStrategy for FallbackLibraryStrategy {
    fn describe(&self) -> String {
        format!("fallback library '{}'", self.stem)
    }

    async fn attempt(&self) -> anyhow::Result<Arc<dyn EphemerisAdapter>> {
        let engine = NativeEngine::load(Path::new(&library_file_name(&self.stem)))?;
        Ok(Arc::new(engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prebuilt_candidates_follow_root_order() {
        let strategy = PrebuiltStrategy::new(
            vec![PathBuf::from("first"), PathBuf::from("second")],
            "linux-x86_64".to_string(),
        );
        let candidates = strategy.candidates();
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].starts_with("first"));
        assert!(candidates[1].starts_with("second"));
        for candidate in &candidates {
            assert!(candidate.to_string_lossy().contains("linux-x86_64"));
        }
    }

    #[tokio::test]
    async fn test_prebuilt_attempt_reports_every_candidate() {
        let strategy = PrebuiltStrategy::new(
            vec![PathBuf::from("/nonexistent/a"), PathBuf::from("/nonexistent/b")],
            "linux-x86_64".to_string(),
        );
        let error = strategy.attempt().await.unwrap_err();
        let rendered = format!("{:#}", error);
        assert!(rendered.contains("/nonexistent/a"));
        assert!(rendered.contains("/nonexistent/b"));
    }

    #[tokio::test]
    async fn test_prebuilt_attempt_fails_on_non_library_file() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let platform = "test-arch".to_string();
        let lib_dir = dir.path().join("prebuilt").join(&platform);
        std::fs::create_dir_all(&lib_dir).unwrap();
        let lib_path = lib_dir.join(library_file_name(ENGINE_LIBRARY_STEM));
        let mut file = std::fs::File::create(&lib_path).unwrap();
        file.write_all(b"not a shared object").unwrap();

        let strategy = PrebuiltStrategy::new(vec![dir.path().to_path_buf()], platform);
        let error = strategy.attempt().await.unwrap_err();
        assert!(format!("{:#}", error).contains(&lib_path.display().to_string()));
    }

    #[tokio::test]
    async fn test_local_build_attempt_reports_missing_dir() {
        let strategy = LocalBuildStrategy::new(PathBuf::from("/nonexistent/build"));
        let error = strategy.attempt().await.unwrap_err();
        assert!(format!("{:#}", error).contains("not present"));
    }

    #[test]
    fn test_fallback_describe_names_the_library() {
        let strategy = FallbackLibraryStrategy::new("swemini".to_string());
        assert!(strategy.describe().contains("swemini"));
    }
}
