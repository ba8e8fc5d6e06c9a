// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::Path;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::contract::flags::RISE_TRANS_NO_EVENT;
use crate::contract::{
    AdapterError, AdapterResult, AzAltResult, CalcResult, EclipticInput, EphemerisAdapter,
    GeoPosition, RiseTransResult,
};

/// A stub adapter implementation for testing and placeholder purposes.
///
/// Produces the same deterministic formulas as the test engine module and
/// counts calls per operation, so cache and pool behavior can be asserted
/// without a real engine.
#[derive(Default)]
pub struct StubAdapter {
    pub calc_calls: AtomicUsize,
    pub rise_calls: AtomicUsize,
    pub ayanamsa_calls: AtomicUsize,
    sid_mode: AtomicI32,
    ephe_path: Mutex<Option<String>>,
}

impl StubAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ephe_path(&self) -> Option<String> {
        self.ephe_path.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl EphemerisAdapter for StubAdapter {
    fn calc_position(&self, _day_number: f64, body: i32, _flags: i32) -> AdapterResult<CalcResult> {
        self.calc_calls.fetch_add(1, Ordering::SeqCst);
        if !(0..=9).contains(&body) {
            return Err(AdapterError::Engine {
                message: format!("illegal planet number {body}"),
            });
        }
        Ok(CalcResult {
            longitude: f64::from(body) * 30.0,
            latitude: 1.5,
            distance: 0.98,
            longitude_speed: 0.95,
            latitude_speed: 0.01,
            distance_speed: 0.002,
        })
    }

    fn rise_transit(
        &self,
        day_number: f64,
        body: i32,
        _star_name: Option<&str>,
        _ephe_flags: i32,
        event_flag: i32,
        geo: GeoPosition,
        _pressure: f64,
        _temperature: f64,
    ) -> AdapterResult<RiseTransResult> {
        self.rise_calls.fetch_add(1, Ordering::SeqCst);
        if body > 9 {
            return Err(AdapterError::Engine {
                message: format!("illegal planet number {body}"),
            });
        }
        if geo.latitude.abs() > 66.0 {
            return Ok(RiseTransResult {
                transit_time: None,
                flag: RISE_TRANS_NO_EVENT,
            });
        }
        let offset = if event_flag & 1 != 0 { 0.25 } else { 0.75 };
        Ok(RiseTransResult {
            transit_time: Some(day_number + offset),
            flag: 0,
        })
    }

    fn az_alt(
        &self,
        _day_number: f64,
        _mode: i32,
        geo: GeoPosition,
        _pressure: f64,
        _temperature: f64,
        ecliptic: EclipticInput,
    ) -> AdapterResult<AzAltResult> {
        Ok(AzAltResult {
            azimuth: ecliptic.longitude + geo.longitude,
            altitude: ecliptic.latitude + geo.latitude,
        })
    }

    fn set_sidereal_mode(&self, mode: i32, _t0: f64, _ayanamsa_t0: f64) {
        self.sid_mode.store(mode, Ordering::SeqCst);
    }

    fn ayanamsa(&self, _day_number: f64) -> f64 {
        self.ayanamsa_calls.fetch_add(1, Ordering::SeqCst);
        24.0 + f64::from(self.sid_mode.load(Ordering::SeqCst))
    }

    fn day_number(
        &self,
        year: i32,
        month: i32,
        day: i32,
        hour_fraction: f64,
        _calendar: i32,
    ) -> f64 {
        f64::from(year) * 365.25 + f64::from(month) * 30.0 + f64::from(day) + hour_fraction / 24.0
    }

    fn set_ephemeris_path(&self, path: &Path) -> AdapterResult<()> {
        *self.ephe_path.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(path.to_string_lossy().into_owned());
        Ok(())
    }

    fn version(&self) -> AdapterResult<String> {
        Ok("stub".to_string())
    }
}

/// An adapter whose fallible operations always fail, for testing failure
/// scenarios.
#[derive(Default)]
pub struct FailingAdapter;

impl FailingAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl EphemerisAdapter for FailingAdapter {
    fn calc_position(&self, _day_number: f64, _body: i32, _flags: i32) -> AdapterResult<CalcResult> {
        Err(AdapterError::Engine {
            message: "simulated engine failure".to_string(),
        })
    }

    fn rise_transit(
        &self,
        _day_number: f64,
        _body: i32,
        _star_name: Option<&str>,
        _ephe_flags: i32,
        _event_flag: i32,
        _geo: GeoPosition,
        _pressure: f64,
        _temperature: f64,
    ) -> AdapterResult<RiseTransResult> {
        Err(AdapterError::Engine {
            message: "simulated engine failure".to_string(),
        })
    }

    fn az_alt(
        &self,
        _day_number: f64,
        _mode: i32,
        _geo: GeoPosition,
        _pressure: f64,
        _temperature: f64,
        _ecliptic: EclipticInput,
    ) -> AdapterResult<AzAltResult> {
        Err(AdapterError::Backend("simulated backend failure".to_string()))
    }

    fn set_sidereal_mode(&self, _mode: i32, _t0: f64, _ayanamsa_t0: f64) {}

    fn ayanamsa(&self, _day_number: f64) -> f64 {
        f64::NAN
    }

    fn day_number(
        &self,
        _year: i32,
        _month: i32,
        _day: i32,
        _hour_fraction: f64,
        _calendar: i32,
    ) -> f64 {
        f64::NAN
    }

    fn set_ephemeris_path(&self, _path: &Path) -> AdapterResult<()> {
        Err(AdapterError::Marshal("simulated marshal failure".to_string()))
    }

    fn version(&self) -> AdapterResult<String> {
        Err(AdapterError::Backend("simulated backend failure".to_string()))
    }
}
