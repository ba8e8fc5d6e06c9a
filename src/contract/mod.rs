// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod adapter;
pub mod error;
pub mod flags;
pub mod types;

pub use adapter::EphemerisAdapter;
pub use error::{AdapterError, AdapterResult};
pub use types::{
    AzAltResult, CalcResult, EclipticInput, GeoPosition, RiseSet, RiseTransResult,
};
