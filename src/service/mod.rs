// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The (adapter + cache) bundle calculation code works against.
//!
//! `EngineService` fronts one adapter handle with a result cache: position,
//! rise/transit, and ayanamsa reads are memoized; setters and cheap scalar
//! conversions pass straight through. Errors are never cached - a failed
//! call leaves the cache unpopulated for that key. The engine-global
//! setters (sidereal mode, ephemeris path) clear the cache, since cached
//! results computed under the previous mode would be stale.
//!
//! This is also the unit the instance pool recycles; see [`crate::pool`].

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::cache::{cache_key, ResultCache};
use crate::config::RuntimeConfig;
use crate::contract::{
    AdapterResult, AzAltResult, CalcResult, EclipticInput, EphemerisAdapter, GeoPosition,
    RiseSet, RiseTransResult,
};
use crate::contract::flags::{SE_CALC_RISE, SE_CALC_SET};

/// Cached value variants, one per memoized operation.
#[derive(Debug, Clone)]
pub enum CachedResult {
    Calc(CalcResult),
    RiseTrans(RiseTransResult),
    Ayanamsa(f64),
}

#[derive(Serialize)]
struct CalcKey {
    day_number: f64,
    body: i32,
    flags: i32,
}

#[derive(Serialize)]
struct RiseTransKey<'a> {
    day_number: f64,
    body: i32,
    star_name: Option<&'a str>,
    ephe_flags: i32,
    event_flag: i32,
    geo: GeoPosition,
    pressure: f64,
    temperature: f64,
}

#[derive(Serialize)]
struct AyanamsaKey {
    day_number: f64,
}

pub struct EngineService {
    adapter: Arc<dyn EphemerisAdapter>,
    cache: ResultCache<CachedResult>,
}

impl EngineService {
    pub fn new(adapter: Arc<dyn EphemerisAdapter>, config: &RuntimeConfig) -> Self {
        let cache = ResultCache::new(config.cache_capacity, config.cache_ttl);
        cache.set_enabled(config.cache_enabled);
        Self { adapter, cache }
    }

    pub fn adapter(&self) -> &Arc<dyn EphemerisAdapter> {
        &self.adapter
    }

    pub fn cache(&self) -> &ResultCache<CachedResult> {
        &self.cache
    }

    pub fn calc_position(&self, day_number: f64, body: i32, flags: i32) -> AdapterResult<CalcResult> {
        let key = cache_key(
            "calc_position",
            &CalcKey {
                day_number,
                body,
                flags,
            },
        )
        .ok();

        if let Some(key) = &key {
            if let Some(CachedResult::Calc(value)) = self.cache.get(key) {
                return Ok(value);
            }
        }

        let value = self.adapter.calc_position(day_number, body, flags)?;
        if let Some(key) = key {
            self.cache.insert(key, CachedResult::Calc(value));
        }
        Ok(value)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rise_transit(
        &self,
        day_number: f64,
        body: i32,
        star_name: Option<&str>,
        ephe_flags: i32,
        event_flag: i32,
        geo: GeoPosition,
        pressure: f64,
        temperature: f64,
    ) -> AdapterResult<RiseTransResult> {
        let key = cache_key(
            "rise_transit",
            &RiseTransKey {
                day_number,
                body,
                star_name,
                ephe_flags,
                event_flag,
                geo,
                pressure,
                temperature,
            },
        )
        .ok();

        if let Some(key) = &key {
            if let Some(CachedResult::RiseTrans(value)) = self.cache.get(key) {
                return Ok(value);
            }
        }

        let value = self.adapter.rise_transit(
            day_number,
            body,
            star_name,
            ephe_flags,
            event_flag,
            geo,
            pressure,
            temperature,
        )?;
        if let Some(key) = key {
            self.cache.insert(key, CachedResult::RiseTrans(value));
        }
        Ok(value)
    }

    /// Rise and set paired for one day. Either side may be absent
    /// independently; a polar-night day yields both `None` without an
    /// error.
    pub fn rise_set(
        &self,
        day_number: f64,
        body: i32,
        ephe_flags: i32,
        geo: GeoPosition,
        pressure: f64,
        temperature: f64,
    ) -> AdapterResult<RiseSet> {
        let rise = self.rise_transit(
            day_number,
            body,
            None,
            ephe_flags,
            SE_CALC_RISE,
            geo,
            pressure,
            temperature,
        )?;
        let set = self.rise_transit(
            day_number,
            body,
            None,
            ephe_flags,
            SE_CALC_SET,
            geo,
            pressure,
            temperature,
        )?;
        Ok(RiseSet {
            rise: rise.transit_time,
            set: set.transit_time,
        })
    }

    pub fn az_alt(
        &self,
        day_number: f64,
        mode: i32,
        geo: GeoPosition,
        pressure: f64,
        temperature: f64,
        ecliptic: EclipticInput,
    ) -> AdapterResult<AzAltResult> {
        self.adapter
            .az_alt(day_number, mode, geo, pressure, temperature, ecliptic)
    }

    pub fn ayanamsa(&self, day_number: f64) -> f64 {
        let key = cache_key("ayanamsa", &AyanamsaKey { day_number }).ok();

        if let Some(key) = &key {
            if let Some(CachedResult::Ayanamsa(value)) = self.cache.get(key) {
                return value;
            }
        }

        let value = self.adapter.ayanamsa(day_number);
        if let Some(key) = key {
            if value.is_finite() {
                self.cache.insert(key, CachedResult::Ayanamsa(value));
            }
        }
        value
    }

    /// Changes the engine-global sidereal mode and drops cached results
    /// computed under the previous one.
    pub fn set_sidereal_mode(&self, mode: i32, t0: f64, ayanamsa_t0: f64) {
        self.adapter.set_sidereal_mode(mode, t0, ayanamsa_t0);
        self.cache.clear();
    }

    pub fn day_number(
        &self,
        year: i32,
        month: i32,
        day: i32,
        hour_fraction: f64,
        calendar: i32,
    ) -> f64 {
        self.adapter
            .day_number(year, month, day, hour_fraction, calendar)
    }

    /// Points the engine at its data files and drops cached results, which
    /// may have been computed from different data.
    pub fn set_ephemeris_path(&self, path: &Path) -> AdapterResult<()> {
        self.adapter.set_ephemeris_path(path)?;
        self.cache.clear();
        Ok(())
    }

    pub fn version(&self) -> AdapterResult<String> {
        self.adapter.version()
    }
}

#[cfg(test)]
mod integration_tests;
