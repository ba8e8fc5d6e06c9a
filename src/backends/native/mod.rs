// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod engine;
pub mod error;
pub mod loader;
pub mod platform;
pub mod strategy;

pub use engine::NativeEngine;
pub use error::{LoaderError, LoaderResult, StrategyFailure};
pub use loader::NativeLoader;
pub use strategy::LoadStrategy;
