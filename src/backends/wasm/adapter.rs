// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Contract implementation over the sandboxed engine module.
//!
//! Each operation opens a [`CallFrame`](super::marshal::CallFrame),
//! marshals through it, and tears it down unconditionally - the frame's
//! `free_all` runs on success and on every error path. A negative engine
//! return code is decoded from the diagnostic buffer into
//! `AdapterError::Engine`; marshaling problems (null allocation, decode
//! failure) surface as `AdapterError::Marshal` rather than degrading to
//! sentinel values.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::contract::flags::RISE_TRANS_NO_EVENT;
use crate::contract::{
    AdapterError, AdapterResult, AzAltResult, CalcResult, EclipticInput, EphemerisAdapter,
    GeoPosition, RiseTransResult,
};

use super::marshal::{
    CallFrame, MarshalCounters, CALC_RESULT_SLOTS, COORD_SLOTS, ERROR_BUFFER_LEN,
    RISE_RESULT_SLOTS,
};
use super::module_loader::EngineInstance;

pub struct WasmAdapter {
    inner: Mutex<EngineInstance>,
    counters: MarshalCounters,
}

impl std::fmt::Debug for WasmAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmAdapter").finish_non_exhaustive()
    }
}

impl WasmAdapter {
    pub(crate) fn new(instance: EngineInstance) -> Self {
        Self {
            inner: Mutex::new(instance),
            counters: MarshalCounters::default(),
        }
    }

    /// (allocations, frees) observed over the adapter's lifetime. Equal
    /// counts mean no scratch buffer has leaked.
    pub fn marshal_counts(&self) -> (u64, u64) {
        self.counters.snapshot()
    }

    fn lock_inner(&self) -> MutexGuard<'_, EngineInstance> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `op` inside a scratch frame and frees the frame on every path.
    fn with_frame<R>(
        &self,
        op: impl FnOnce(&mut CallFrame) -> AdapterResult<R>,
    ) -> AdapterResult<R> {
        let mut inner = self.lock_inner();
        let mut frame = CallFrame::new(&mut inner, &self.counters)?;
        let outcome = op(&mut frame);
        frame.free_all();
        outcome
    }
}

impl EphemerisAdapter for WasmAdapter {
    fn calc_position(&self, day_number: f64, body: i32, flags: i32) -> AdapterResult<CalcResult> {
        self.with_frame(|frame| {
            let error_ptr = frame.alloc_error_buffer()?;
            let result_ptr = frame.alloc_doubles(CALC_RESULT_SLOTS)?;

            let ret = frame.call_calc_ut(day_number, body, flags, result_ptr, error_ptr)?;
            if ret < 0 {
                return Err(AdapterError::Engine {
                    message: frame.read_error(error_ptr),
                });
            }

            let mut slots = [0f64; CALC_RESULT_SLOTS as usize];
            for (index, slot) in slots.iter_mut().enumerate() {
                *slot = frame.read_double(result_ptr, index as i32)?;
            }
            Ok(CalcResult::from_slots(&slots))
        })
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
        self.with_frame(|frame| {
            let error_ptr = frame.alloc_error_buffer()?;
            let star_ptr = match star_name {
                Some(name) => frame.alloc_c_string(name)?,
                None => 0,
            };
            let geo_ptr = frame.alloc_doubles(COORD_SLOTS)?;
            frame.write_doubles(geo_ptr, &geo.to_slots())?;
            let times_ptr = frame.alloc_doubles(RISE_RESULT_SLOTS)?;

            let ret = frame.call_rise_trans(
                day_number,
                body,
                star_ptr,
                ephe_flags,
                event_flag,
                geo_ptr,
                pressure,
                temperature,
                times_ptr,
                error_ptr,
            )?;

            if ret == RISE_TRANS_NO_EVENT {
                return Ok(RiseTransResult {
                    transit_time: None,
                    flag: ret,
                });
            }
            if ret < 0 {
                return Err(AdapterError::Engine {
                    message: frame.read_error(error_ptr),
                });
            }
            Ok(RiseTransResult {
                transit_time: Some(frame.read_double(times_ptr, 0)?),
                flag: ret,
            })
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
        self.with_frame(|frame| {
            let geo_ptr = frame.alloc_doubles(COORD_SLOTS)?;
            frame.write_doubles(geo_ptr, &geo.to_slots())?;
            let input_ptr = frame.alloc_doubles(COORD_SLOTS)?;
            frame.write_doubles(input_ptr, &ecliptic.to_slots())?;
            let output_ptr = frame.alloc_doubles(COORD_SLOTS)?;

            frame.call_az_alt(
                day_number,
                mode,
                geo_ptr,
                pressure,
                temperature,
                input_ptr,
                output_ptr,
            )?;

            Ok(AzAltResult {
                azimuth: frame.read_double(output_ptr, 0)?,
                altitude: frame.read_double(output_ptr, 1)?,
            })
        })
    }

    fn set_sidereal_mode(&self, mode: i32, t0: f64, ayanamsa_t0: f64) {
        let result = self.with_frame(|frame| frame.call_set_sid_mode(mode, t0, ayanamsa_t0));
        if let Err(error) = result {
            tracing::warn!("set_sidereal_mode failed: {error}");
        }
    }

    fn ayanamsa(&self, day_number: f64) -> f64 {
        match self.with_frame(|frame| frame.call_ayanamsa(day_number)) {
            Ok(value) => value,
            Err(error) => {
                tracing::error!("ayanamsa call failed: {error}");
                f64::NAN
            }
        }
    }

    fn day_number(
        &self,
        year: i32,
        month: i32,
        day: i32,
        hour_fraction: f64,
        calendar: i32,
    ) -> f64 {
        match self.with_frame(|frame| frame.call_julday(year, month, day, hour_fraction, calendar))
        {
            Ok(value) => value,
            Err(error) => {
                tracing::error!("day_number call failed: {error}");
                f64::NAN
            }
        }
    }

    fn set_ephemeris_path(&self, path: &Path) -> AdapterResult<()> {
        let text = path
            .to_str()
            .ok_or_else(|| AdapterError::Marshal("ephemeris path is not UTF-8".to_string()))?
            .to_string();
        self.with_frame(|frame| {
            let path_ptr = frame.alloc_c_string(&text)?;
            frame.call_set_ephe_path(path_ptr)
        })
    }

    fn version(&self) -> AdapterResult<String> {
        self.with_frame(|frame| {
            let buffer_ptr = frame.alloc(ERROR_BUFFER_LEN)?;
            frame.call_version(buffer_ptr)?;
            frame.read_c_string(buffer_ptr, ERROR_BUFFER_LEN)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::wasm::module_loader::instantiate_engine;
    use crate::backends::wasm::test_support::stub_engine_bytes;
    use crate::contract::flags::{SE_CALC_RISE, SE_CALC_SET, SE_SIDM_KRISHNAMURTI};
    use wasmtime::Val;

    fn stub_adapter() -> WasmAdapter {
        let bytes = stub_engine_bytes();
        let instance = instantiate_engine(&bytes).expect("stub engine instantiates");
        WasmAdapter::new(instance)
    }

    fn assert_balanced(adapter: &WasmAdapter) {
        let (allocated, freed) = adapter.marshal_counts();
        assert_eq!(allocated, freed, "scratch allocations leaked");
    }

    /// Arms the stub's malloc fault injection: the allocation `n` calls
    /// from now returns null.
    fn arm_malloc_failure(adapter: &WasmAdapter, n: i32) {
        let mut inner = adapter.inner.lock().unwrap();
        let EngineInstance {
            instance, store, ..
        } = &mut *inner;
        store.set_fuel(1_000_000).expect("refuel for direct call");
        let func = instance
            .get_typed_func::<i32, ()>(&mut *store, "set_malloc_fail_in")
            .expect("stub exports set_malloc_fail_in");
        func.call(&mut *store, n).expect("arming fault injection");
    }

    fn exported_i32_global(adapter: &WasmAdapter, name: &str) -> i32 {
        let mut inner = adapter.inner.lock().unwrap();
        let EngineInstance {
            instance, store, ..
        } = &mut *inner;
        let global = instance.get_global(&mut *store, name).expect("global");
        match global.get(&mut *store) {
            Val::I32(value) => value,
            other => panic!("unexpected global value: {other:?}"),
        }
    }

    #[test]
    fn test_calc_position_success() {
        let adapter = stub_adapter();
        let result = adapter.calc_position(2460000.5, 4, 258).unwrap();
        assert_eq!(result.longitude, 120.0);
        assert_eq!(result.latitude, 1.5);
        assert_eq!(result.distance, 0.98);
        assert_eq!(result.longitude_speed, 0.95);
        assert_eq!(result.latitude_speed, 0.01);
        assert_eq!(result.distance_speed, 0.002);
        assert_balanced(&adapter);
    }

    #[test]
    fn test_calc_position_engine_error() {
        let adapter = stub_adapter();
        let error = adapter.calc_position(2460000.5, 15, 2).unwrap_err();
        match error {
            AdapterError::Engine { message } => {
                assert!(message.contains("unknown body"), "message: {message}");
            }
            other => panic!("expected engine error, got {other:?}"),
        }
        assert_balanced(&adapter);
    }

    #[test]
    fn test_rise_transit_event_found() {
        let adapter = stub_adapter();
        let geo = GeoPosition::new(77.2, 28.6, 216.0);

        let rise = adapter
            .rise_transit(2460000.5, 0, None, 2, SE_CALC_RISE, geo, 1013.25, 15.0)
            .unwrap();
        assert_eq!(rise.transit_time, Some(2460000.75));
        assert_eq!(rise.flag, 0);

        let set = adapter
            .rise_transit(2460000.5, 0, None, 2, SE_CALC_SET, geo, 1013.25, 15.0)
            .unwrap();
        assert_eq!(set.transit_time, Some(2460001.25));
        assert_balanced(&adapter);
    }

    #[test]
    fn test_rise_transit_no_event_is_not_an_error() {
        let adapter = stub_adapter();
        let polar = GeoPosition::new(25.7, 71.2, 10.0);

        let result = adapter
            .rise_transit(2460000.5, 0, None, 2, SE_CALC_RISE, polar, 1013.25, 15.0)
            .unwrap();
        assert_eq!(result.transit_time, None);
        assert_eq!(result.flag, RISE_TRANS_NO_EVENT);
        assert_balanced(&adapter);
    }

    #[test]
    fn test_rise_transit_with_star_name() {
        let adapter = stub_adapter();
        let geo = GeoPosition::new(0.0, 45.0, 0.0);
        let result = adapter
            .rise_transit(
                2460000.5,
                0,
                Some("Aldebaran"),
                2,
                SE_CALC_RISE,
                geo,
                0.0,
                0.0,
            )
            .unwrap();
        assert!(result.transit_time.is_some());
        assert_balanced(&adapter);
    }

    #[test]
    fn test_az_alt_marshals_both_arrays() {
        let adapter = stub_adapter();
        let geo = GeoPosition::new(10.0, 20.0, 0.0);
        let ecliptic = EclipticInput::new(30.0, 40.0, 1.0);

        let result = adapter
            .az_alt(2460000.5, 0, geo, 1013.25, 15.0, ecliptic)
            .unwrap();
        assert_eq!(result.azimuth, 40.0);
        assert_eq!(result.altitude, 60.0);
        assert_balanced(&adapter);
    }

    #[test]
    fn test_sidereal_mode_feeds_ayanamsa() {
        let adapter = stub_adapter();
        assert_eq!(adapter.ayanamsa(2460000.5), 24.0);

        adapter.set_sidereal_mode(SE_SIDM_KRISHNAMURTI, 0.0, 0.0);
        assert_eq!(adapter.ayanamsa(2460000.5), 29.0);
        assert_balanced(&adapter);
    }

    #[test]
    fn test_day_number_formula() {
        let adapter = stub_adapter();
        let value = adapter.day_number(2000, 1, 1, 12.0, 1);
        let expected = 2000.0 * 365.25 + 30.0 + 1.0 + 0.5;
        assert_eq!(value, expected);
        assert_balanced(&adapter);
    }

    #[test]
    fn test_set_ephemeris_path_writes_string() {
        let adapter = stub_adapter();
        adapter.set_ephemeris_path(Path::new("/data/ephe")).unwrap();
        assert_eq!(exported_i32_global(&adapter, "ephe_path_len"), 10);
        assert_balanced(&adapter);
    }

    #[test]
    fn test_set_ephemeris_path_rejects_interior_nul() {
        let adapter = stub_adapter();
        let error = adapter
            .set_ephemeris_path(Path::new("/data/\0ephe"))
            .unwrap_err();
        assert!(matches!(error, AdapterError::Marshal(_)));
        assert_balanced(&adapter);
    }

    #[test]
    fn test_version_string() {
        let adapter = stub_adapter();
        assert_eq!(adapter.version().unwrap(), "2.10.03-stub");
        assert_balanced(&adapter);
    }

    #[test]
    fn test_first_allocation_failure_is_marshal_error() {
        let adapter = stub_adapter();
        arm_malloc_failure(&adapter, 0);

        let error = adapter.calc_position(2460000.5, 4, 2).unwrap_err();
        assert!(matches!(error, AdapterError::Marshal(_)));
        assert_balanced(&adapter);
    }

    #[test]
    fn test_midcall_allocation_failure_frees_earlier_buffers() {
        let adapter = stub_adapter();
        // First allocation (error buffer) succeeds, second (result buffer)
        // fails; the first must still be freed.
        arm_malloc_failure(&adapter, 1);

        let error = adapter.calc_position(2460000.5, 4, 2).unwrap_err();
        assert!(matches!(error, AdapterError::Marshal(_)));

        let (allocated, freed) = adapter.marshal_counts();
        assert_eq!(allocated, 1);
        assert_eq!(freed, 1);
    }

    #[test]
    fn test_az_alt_allocation_failure_is_an_error_not_zeros() {
        let adapter = stub_adapter();
        arm_malloc_failure(&adapter, 0);

        let result = adapter.az_alt(
            2460000.5,
            0,
            GeoPosition::new(10.0, 20.0, 0.0),
            1013.25,
            15.0,
            EclipticInput::new(30.0, 40.0, 1.0),
        );
        assert!(matches!(result, Err(AdapterError::Marshal(_))));
        assert_balanced(&adapter);
    }

    #[test]
    fn test_no_leak_across_mixed_operations() {
        let adapter = stub_adapter();
        let geo = GeoPosition::new(77.2, 28.6, 216.0);

        for day in 0..5 {
            let day_number = 2460000.5 + f64::from(day);
            let _ = adapter.calc_position(day_number, day, 258);
            let _ = adapter.calc_position(day_number, 99, 258); // engine error path
            let _ = adapter.rise_transit(day_number, 0, None, 2, SE_CALC_RISE, geo, 0.0, 0.0);
            let _ = adapter.az_alt(
                day_number,
                0,
                geo,
                0.0,
                0.0,
                EclipticInput::new(1.0, 2.0, 3.0),
            );
            let _ = adapter.version();
        }
        assert_balanced(&adapter);
    }
}
