// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Process-hosted native engine handle.
//!
//! Wraps a dynamically loaded engine library and implements the adapter
//! contract by calling its C entry points directly. Symbols are resolved
//! once at load; the `Library` is kept alive for the life of the handle so
//! the copied-out function pointers stay valid. All `unsafe` in the native
//! backend is confined to this file.

use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::path::Path;

use anyhow::Context;
use libloading::Library;

use crate::contract::flags::RISE_TRANS_NO_EVENT;
use crate::contract::{
    AdapterError, AdapterResult, AzAltResult, CalcResult, EclipticInput, EphemerisAdapter,
    GeoPosition, RiseTransResult,
};

const ERROR_BUFFER_LEN: usize = 256;
const VERSION_BUFFER_LEN: usize = 256;

type CalcUtFn = unsafe extern "C" fn(f64, c_int, c_int, *mut f64, *mut c_char) -> c_int;
type RiseTransFn = unsafe extern "C" fn(
    f64,
    c_int,
    *const c_char,
    c_int,
    c_int,
    *mut f64,
    f64,
    f64,
    *mut f64,
    *mut c_char,
) -> c_int;
type AzAltFn = unsafe extern "C" fn(f64, c_int, *mut f64, f64, f64, *mut f64, *mut f64);
type SetSidModeFn = unsafe extern "C" fn(c_int, f64, f64);
type AyanamsaUtFn = unsafe extern "C" fn(f64) -> f64;
type JuldayFn = unsafe extern "C" fn(c_int, c_int, c_int, f64, c_int) -> f64;
type SetEphePathFn = unsafe extern "C" fn(*const c_char);
type VersionFn = unsafe extern "C" fn(*mut c_char) -> *mut c_char;

pub struct NativeEngine {
    // Keeps the loaded library mapped; the function pointers below point
    // into it.
    _library: Library,
    calc_ut: CalcUtFn,
    rise_trans: RiseTransFn,
    az_alt: AzAltFn,
    set_sid_mode: SetSidModeFn,
    ayanamsa_ut: AyanamsaUtFn,
    julday: JuldayFn,
    set_ephe_path: SetEphePathFn,
    version: VersionFn,
}

impl NativeEngine {
    /// Loads the engine library at `path` and resolves every required
    /// symbol. Any missing symbol fails the load as a whole.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let library = unsafe { Library::new(path) }
            .with_context(|| format!("loading '{}'", path.display()))?;

        unsafe {
            let calc_ut = *library
                .get::<CalcUtFn>(b"swe_calc_ut\0")
                .context("missing symbol swe_calc_ut")?;
            let rise_trans = *library
                .get::<RiseTransFn>(b"swe_rise_trans\0")
                .context("missing symbol swe_rise_trans")?;
            let az_alt = *library
                .get::<AzAltFn>(b"swe_azalt\0")
                .context("missing symbol swe_azalt")?;
            let set_sid_mode = *library
                .get::<SetSidModeFn>(b"swe_set_sid_mode\0")
                .context("missing symbol swe_set_sid_mode")?;
            let ayanamsa_ut = *library
                .get::<AyanamsaUtFn>(b"swe_get_ayanamsa_ut\0")
                .context("missing symbol swe_get_ayanamsa_ut")?;
            let julday = *library
                .get::<JuldayFn>(b"swe_julday\0")
                .context("missing symbol swe_julday")?;
            let set_ephe_path = *library
                .get::<SetEphePathFn>(b"swe_set_ephe_path\0")
                .context("missing symbol swe_set_ephe_path")?;
            let version = *library
                .get::<VersionFn>(b"swe_version\0")
                .context("missing symbol swe_version")?;

            Ok(Self {
                _library: library,
                calc_ut,
                rise_trans,
                az_alt,
                set_sid_mode,
                ayanamsa_ut,
                julday,
                set_ephe_path,
                version,
            })
        }
    }
}

/// Decodes a NUL-terminated engine diagnostic from a fixed C buffer.
fn c_buffer_to_string(buffer: &[c_char]) -> String {
    let bytes: &[u8] =
        unsafe { std::slice::from_raw_parts(buffer.as_ptr() as *const u8, buffer.len()) };
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

impl EphemerisAdapter for NativeEngine {
    fn calc_position(&self, day_number: f64, body: i32, flags: i32) -> AdapterResult<CalcResult> {
        let mut slots = [0f64; 6];
        let mut error = [0 as c_char; ERROR_BUFFER_LEN];

        let ret = unsafe {
            (self.calc_ut)(
                day_number,
                body,
                flags,
                slots.as_mut_ptr(),
                error.as_mut_ptr(),
            )
        };
        if ret < 0 {
            return Err(AdapterError::Engine {
                message: c_buffer_to_string(&error),
            });
        }
        Ok(CalcResult::from_slots(&slots))
    }

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
    ) -> AdapterResult<RiseTransResult> {
        let star = star_name
            .map(CString::new)
            .transpose()
            .map_err(|_| AdapterError::Marshal("star name contains NUL byte".to_string()))?;
        let star_ptr = star
            .as_ref()
            .map_or(std::ptr::null(), |name| name.as_ptr());

        let mut geo_slots = geo.to_slots();
        let mut times = [0f64; 8];
        let mut error = [0 as c_char; ERROR_BUFFER_LEN];

        let ret = unsafe {
            (self.rise_trans)(
                day_number,
                body,
                star_ptr,
                ephe_flags,
                event_flag,
                geo_slots.as_mut_ptr(),
                pressure,
                temperature,
                times.as_mut_ptr(),
                error.as_mut_ptr(),
            )
        };

        if ret == RISE_TRANS_NO_EVENT {
            return Ok(RiseTransResult {
                transit_time: None,
                flag: ret,
            });
        }
        if ret < 0 {
            return Err(AdapterError::Engine {
                message: c_buffer_to_string(&error),
            });
        }
        Ok(RiseTransResult {
            transit_time: Some(times[0]),
            flag: ret,
        })
    }

    fn az_alt(
        &self,
        day_number: f64,
        mode: i32,
        geo: GeoPosition,
        pressure: f64,
        temperature: f64,
        ecliptic: EclipticInput,
    ) -> AdapterResult<AzAltResult> {
        let mut geo_slots = geo.to_slots();
        let mut input = ecliptic.to_slots();
        let mut output = [0f64; 3];

        unsafe {
            (self.az_alt)(
                day_number,
                mode,
                geo_slots.as_mut_ptr(),
                pressure,
                temperature,
                input.as_mut_ptr(),
                output.as_mut_ptr(),
            )
        };
        Ok(AzAltResult {
            azimuth: output[0],
            altitude: output[1],
        })
    }

    fn set_sidereal_mode(&self, mode: i32, t0: f64, ayanamsa_t0: f64) {
        unsafe { (self.set_sid_mode)(mode, t0, ayanamsa_t0) };
    }

    fn ayanamsa(&self, day_number: f64) -> f64 {
        unsafe { (self.ayanamsa_ut)(day_number) }
    }

    fn day_number(
        &self,
        year: i32,
        month: i32,
        day: i32,
        hour_fraction: f64,
        calendar: i32,
    ) -> f64 {
        unsafe { (self.julday)(year, month, day, hour_fraction, calendar) }
    }

    fn set_ephemeris_path(&self, path: &Path) -> AdapterResult<()> {
        let text = path
            .to_str()
            .ok_or_else(|| AdapterError::Marshal("ephemeris path is not UTF-8".to_string()))?;
        let c_path = CString::new(text)
            .map_err(|_| AdapterError::Marshal("ephemeris path contains NUL byte".to_string()))?;
        unsafe { (self.set_ephe_path)(c_path.as_ptr()) };
        Ok(())
    }

    fn version(&self) -> AdapterResult<String> {
        let mut buffer = [0 as c_char; VERSION_BUFFER_LEN];
        unsafe { (self.version)(buffer.as_mut_ptr()) };
        Ok(c_buffer_to_string(&buffer))
    }
}
