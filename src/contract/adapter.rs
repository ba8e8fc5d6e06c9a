// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The adapter contract.
//!
//! Every backend — process-hosted native engine or sandboxed WASM module —
//! implements exactly this set of primitive operations with identical
//! shapes. Calculation code programs against `dyn EphemerisAdapter` and
//! never learns which backend it is talking to.
//!
//! Flag arguments (`flags`, `ephe_flags`, `event_flag`) are opaque bitmasks
//! passed through to the engine unchanged; the contract carries them but
//! does not interpret them. Constants for building them live in
//! [`crate::contract::flags`].
//!
//! Loading a backend suspends; once a handle exists, every operation here
//! is synchronous and non-suspending.

use std::path::Path;

use super::error::AdapterResult;
use super::types::{AzAltResult, CalcResult, EclipticInput, GeoPosition, RiseTransResult};

pub trait EphemerisAdapter: Send + Sync {
    /// Ecliptic position (and speeds) of `body` at `day_number`.
    fn calc_position(&self, day_number: f64, body: i32, flags: i32) -> AdapterResult<CalcResult>;

    /// Searches for the next rise/set/transit event selected by
    /// `event_flag`, starting at `day_number`. A day/location with no such
    /// event yields `transit_time: None`, not an error. `star_name` selects
    /// a fixed star instead of `body` when present.
    #[allow(clippy::too_many_arguments)]
    fn rise_transit(
        &self,
        day_number: f64,
        body: i32,
        star_name: Option<&str>,
        ephe_flags: i32,
        event_flag: i32,
        geo: GeoPosition,
        pressure: f64,
        temperature: f64,
    ) -> AdapterResult<RiseTransResult>;

    /// Converts ecliptic (or equatorial, per `mode`) coordinates to
    /// horizontal azimuth/altitude for the given observer.
    fn az_alt(
        &self,
        day_number: f64,
        mode: i32,
        geo: GeoPosition,
        pressure: f64,
        temperature: f64,
        ecliptic: EclipticInput,
    ) -> AdapterResult<AzAltResult>;

    /// Sets the engine-global sidereal mode. This is an intentional global
    /// mode change; callers running concurrent calculations under different
    /// modes must serialize these themselves.
    fn set_sidereal_mode(&self, mode: i32, t0: f64, ayanamsa_t0: f64);

    /// Ayanamsa value at `day_number` under the current sidereal mode.
    fn ayanamsa(&self, day_number: f64) -> f64;

    /// Calendar date to day number. `calendar` is one of the calendar
    /// flags; `hour_fraction` is the time of day as a fraction of 24h
    /// expressed in hours (e.g. 13.5 for 13:30).
    fn day_number(&self, year: i32, month: i32, day: i32, hour_fraction: f64, calendar: i32)
        -> f64;

    /// Points the engine at its data-file directory. Global, like the
    /// sidereal mode.
    fn set_ephemeris_path(&self, path: &Path) -> AdapterResult<()>;

    /// Engine version string.
    fn version(&self) -> AdapterResult<String>;
}

impl std::fmt::Debug for dyn EphemerisAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn EphemerisAdapter")
    }
}
