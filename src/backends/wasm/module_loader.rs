// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Sandboxed engine module loading and instantiation.
//!
//! The bytecode module is loaded exactly once per process: repeat calls are
//! idempotent and concurrent initial calls share one in-flight load. The
//! module exposes a flat set of exported functions over a linear memory;
//! instantiation resolves every required export up front so per-call code
//! never looks up functions.
//!
//! The module is deliberately hosted without any imports - no WASI, no host
//! functions. A module that needs them fails instantiation.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use wasmparser::{Encoding, Parser, Payload};
use wasmtime::{Config, Engine, Instance, Memory, Module, Store, TypedFunc};

use crate::config::RuntimeConfig;
use crate::observability::messages::wasm::{EngineModuleLoadFailed, EngineModuleLoaded};
use crate::utils::SingleFlight;

use super::adapter::WasmAdapter;
use super::error::{WasmLoadError, WasmLoadResult, MAX_MODULE_SIZE};

/// Computational budget set on the store before every call.
pub(crate) const FUEL_LEVEL: u64 = 100_000_000;

/// One instantiated engine module with its resolved exports.
pub(crate) struct EngineInstance {
    pub(crate) store: Store<()>,
    pub(crate) instance: Instance,
    pub(crate) memory: Memory,
    pub(crate) malloc: TypedFunc<i32, i32>,
    pub(crate) free: TypedFunc<i32, ()>,
    pub(crate) calc_ut: TypedFunc<(f64, i32, i32, i32, i32), i32>,
    #[allow(clippy::type_complexity)]
    pub(crate) rise_trans: TypedFunc<(f64, i32, i32, i32, i32, i32, f64, f64, i32, i32), i32>,
    pub(crate) az_alt: TypedFunc<(f64, i32, i32, f64, f64, i32, i32), ()>,
    pub(crate) set_sid_mode: TypedFunc<(i32, f64, f64), ()>,
    pub(crate) ayanamsa_ut: TypedFunc<f64, f64>,
    pub(crate) julday: TypedFunc<(i32, i32, i32, f64, i32), f64>,
    pub(crate) set_ephe_path: TypedFunc<i32, ()>,
    pub(crate) version: TypedFunc<i32, i32>,
}

/// Loads the sandboxed backend once per process.
pub struct WasmBackendLoader {
    module_path: PathBuf,
    ephemeris_path: Option<PathBuf>,
    loaded: Mutex<Option<Arc<WasmAdapter>>>,
    flight: SingleFlight<Arc<WasmAdapter>, WasmLoadError>,
}

impl WasmBackendLoader {
    pub fn new(config: &RuntimeConfig) -> Self {
        let mut loader = Self::with_module_path(config.wasm_module_path.clone());
        loader.ephemeris_path = config.ephemeris_path.clone();
        loader
    }

    pub fn with_module_path(module_path: PathBuf) -> Self {
        Self {
            module_path,
            ephemeris_path: None,
            loaded: Mutex::new(None),
            flight: SingleFlight::new(),
        }
    }

    /// Returns the process-wide adapter, loading the module on first call.
    pub async fn load(&self) -> Result<Arc<WasmAdapter>, Arc<WasmLoadError>> {
        let existing = self
            .loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(adapter) = existing {
            return Ok(adapter);
        }

        let outcome = self
            .flight
            .run(|| Self::load_fresh(&self.module_path, self.ephemeris_path.as_deref()))
            .await;

        if let Ok(adapter) = &outcome {
            *self.loaded.lock().unwrap_or_else(PoisonError::into_inner) =
                Some(adapter.clone());
        }
        outcome
    }

    /// Drops the loaded adapter so the next call re-instantiates. Intended
    /// for tests.
    pub fn reset(&self) {
        *self.loaded.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    async fn load_fresh(
        module_path: &Path,
        ephemeris_path: Option<&Path>,
    ) -> WasmLoadResult<Arc<WasmAdapter>> {
        let path_display = module_path.display().to_string();

        let bytes = tokio::fs::read(module_path).await.map_err(|e| {
            let error = WasmLoadError::Io(e);
            tracing::error!(
                "{}",
                EngineModuleLoadFailed {
                    module_path: &path_display,
                    error: &error,
                }
            );
            error
        })?;

        let instance = instantiate_engine(&bytes).map_err(|error| {
            tracing::error!(
                "{}",
                EngineModuleLoadFailed {
                    module_path: &path_display,
                    error: &error,
                }
            );
            error
        })?;

        tracing::info!(
            "{}",
            EngineModuleLoaded {
                module_path: &path_display,
                size_bytes: bytes.len(),
            }
        );

        let adapter = Arc::new(WasmAdapter::new(instance));
        if let Some(path) = ephemeris_path {
            use crate::contract::EphemerisAdapter;
            if let Err(error) = adapter.set_ephemeris_path(path) {
                tracing::warn!("failed to set ephemeris path: {error}");
            }
        }
        Ok(adapter)
    }
}

/// Validates, compiles, and instantiates an engine module from raw bytes.
pub(crate) fn instantiate_engine(bytes: &[u8]) -> WasmLoadResult<EngineInstance> {
    if bytes.len() > MAX_MODULE_SIZE {
        return Err(WasmLoadError::TooLarge {
            size: bytes.len(),
            max: MAX_MODULE_SIZE,
        });
    }
    validate_encoding(bytes)?;

    let engine = create_engine()?;
    let module =
        Module::new(&engine, bytes).map_err(|e| WasmLoadError::Module(e.to_string()))?;

    let mut store = Store::new(&engine, ());
    let instance = Instance::new(&mut store, &module, &[])
        .map_err(|e| WasmLoadError::Module(e.to_string()))?;

    let memory = instance
        .get_memory(&mut store, "memory")
        .ok_or_else(|| WasmLoadError::MissingExport("memory".to_string()))?;

    macro_rules! export {
        ($name:literal, $params:ty, $results:ty) => {
            instance
                .get_typed_func::<$params, $results>(&mut store, $name)
                .map_err(|_| WasmLoadError::MissingExport($name.to_string()))?
        };
    }

    let malloc = export!("malloc", i32, i32);
    let free = export!("free", i32, ());
    let calc_ut = export!("swe_calc_ut", (f64, i32, i32, i32, i32), i32);
    let rise_trans = export!(
        "swe_rise_trans",
        (f64, i32, i32, i32, i32, i32, f64, f64, i32, i32),
        i32
    );
    let az_alt = export!("swe_azalt", (f64, i32, i32, f64, f64, i32, i32), ());
    let set_sid_mode = export!("swe_set_sid_mode", (i32, f64, f64), ());
    let ayanamsa_ut = export!("swe_get_ayanamsa_ut", f64, f64);
    let julday = export!("swe_julday", (i32, i32, i32, f64, i32), f64);
    let set_ephe_path = export!("swe_set_ephe_path", i32, ());
    let version = export!("swe_version", i32, i32);

    Ok(EngineInstance {
        store,
        instance,
        memory,
        malloc,
        free,
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

/// Creates the wasmtime engine with the locked-down configuration the
/// sandboxed backend runs under.
fn create_engine() -> WasmLoadResult<Engine> {
    let mut config = Config::new();

    config.wasm_reference_types(true);
    config.wasm_bulk_memory(true);

    config.wasm_threads(false);
    config.wasm_simd(false);
    config.wasm_relaxed_simd(false); // Explicitly disable relaxed SIMD to avoid conflicts
    config.wasm_multi_memory(false);
    config.wasm_memory64(false);
    config.wasm_component_model(false);

    // Fuel bounds runaway engine calls; the budget is reset per call.
    config.consume_fuel(true);
    config.epoch_interruption(false);

    Engine::new(&config).map_err(|e| WasmLoadError::Engine(e.to_string()))
}

/// Requires a classic core module; component-model binaries are rejected.
fn validate_encoding(bytes: &[u8]) -> WasmLoadResult<()> {
    let parser = Parser::new(0);
    for payload in parser.parse_all(bytes) {
        if let Payload::Version { encoding, .. } = payload? {
            return match encoding {
                Encoding::Module => Ok(()),
                Encoding::Component => Err(WasmLoadError::UnsupportedEncoding(
                    "component-model binary; the engine backend hosts core modules only"
                        .to_string(),
                )),
            };
        }
    }
    Err(WasmLoadError::InvalidBinary(
        "missing version header".to_string(),
    ))
}
