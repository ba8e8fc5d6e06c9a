// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! End-to-end tests over the sandboxed backend: service layer, adapter,
//! and marshaling exercised together against the stub engine module.

use std::sync::Arc;

use crate::backends::wasm::adapter::WasmAdapter;
use crate::backends::wasm::module_loader::instantiate_engine;
use crate::backends::wasm::test_support::stub_engine_bytes;
use crate::config::RuntimeConfig;
use crate::contract::flags::{SEFLG_SPEED, SEFLG_SWIEPH};
use crate::contract::{AdapterError, GeoPosition};
use crate::service::EngineService;

fn wasm_service() -> (Arc<WasmAdapter>, EngineService) {
    let instance = instantiate_engine(&stub_engine_bytes()).expect("stub engine instantiates");
    let adapter = Arc::new(WasmAdapter::new(instance));
    let service = EngineService::new(adapter.clone(), &RuntimeConfig::default());
    (adapter, service)
}

#[test]
fn test_out_of_range_body_is_an_error_variant_and_uncached() {
    let (adapter, service) = wasm_service();

    let error = service
        .calc_position(2460000.5, 42, SEFLG_SWIEPH | SEFLG_SPEED)
        .unwrap_err();
    match error {
        AdapterError::Engine { message } => assert!(message.contains("unknown body")),
        other => panic!("expected engine error, got {other:?}"),
    }
    assert_eq!(service.cache().len(), 0);

    let (allocated, freed) = adapter.marshal_counts();
    assert_eq!(allocated, freed);
}

#[test]
fn test_polar_night_rise_set_is_none_none() {
    let (_adapter, service) = wasm_service();
    let polar = GeoPosition::new(25.7, 71.2, 10.0);

    let pair = service
        .rise_set(2460000.5, 0, SEFLG_SWIEPH, polar, 1013.25, 15.0)
        .unwrap();
    assert_eq!(pair.rise, None);
    assert_eq!(pair.set, None);
}

#[test]
fn test_cached_position_skips_the_module() {
    let (adapter, service) = wasm_service();

    let first = service
        .calc_position(2460000.5, 4, SEFLG_SWIEPH | SEFLG_SPEED)
        .unwrap();
    let allocations_after_first = adapter.marshal_counts().0;

    let second = service
        .calc_position(2460000.5, 4, SEFLG_SWIEPH | SEFLG_SPEED)
        .unwrap();
    assert_eq!(first, second);
    // The second read came from the cache; no further marshaling happened.
    assert_eq!(adapter.marshal_counts().0, allocations_after_first);
}

#[test]
fn test_full_surface_leaves_no_scratch_behind() {
    let (adapter, service) = wasm_service();
    let geo = GeoPosition::new(77.2, 28.6, 216.0);

    service.calc_position(2460000.5, 1, SEFLG_SWIEPH).unwrap();
    let _ = service.calc_position(2460000.5, 99, SEFLG_SWIEPH);
    service
        .rise_set(2460000.5, 0, SEFLG_SWIEPH, geo, 1013.25, 15.0)
        .unwrap();
    service.set_sidereal_mode(1, 0.0, 0.0);
    let _ = service.ayanamsa(2460000.5);
    let _ = service.day_number(2024, 6, 21, 12.0, 1);
    service
        .set_ephemeris_path(std::path::Path::new("/data/ephe"))
        .unwrap();
    assert_eq!(service.version().unwrap(), "2.10.03-stub");

    let (allocated, freed) = adapter.marshal_counts();
    assert_eq!(allocated, freed, "scratch allocations leaked");
}
