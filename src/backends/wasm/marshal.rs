// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-call scratch marshaling over the engine module's linear memory.
//!
//! Every call that exchanges structured data allocates scratch buffers in
//! the module's linear memory, writes inputs at 8-byte-aligned slots, runs
//! the exported function, and reads results back by indexed offset. The
//! module has no garbage collector for its linear memory; a leaked
//! allocation is permanent for the life of the instance. `CallFrame` owns
//! that invariant: it records every allocation and `free_all` releases all
//! of them unconditionally, on success and failure paths alike.
//!
//! Buffers are per-call and never shared across calls, which is what makes
//! concurrent calls safe under cooperative scheduling despite one shared
//! module instance.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::contract::{AdapterError, AdapterResult};
use crate::observability::messages::wasm::ScratchFreeFailed;

use super::module_loader::{EngineInstance, FUEL_LEVEL};

/// Fixed size of the engine diagnostic buffer.
pub(crate) const ERROR_BUFFER_LEN: i32 = 256;
/// Result slots for position calls.
pub(crate) const CALC_RESULT_SLOTS: i32 = 6;
/// Result slots for rise/transit calls.
pub(crate) const RISE_RESULT_SLOTS: i32 = 8;
/// Slots for geoposition / ecliptic-input / horizontal-output arrays.
pub(crate) const COORD_SLOTS: i32 = 3;

const DOUBLE_SIZE: i32 = 8;

/// Running allocation/free tallies for leak accounting.
#[derive(Default)]
pub(crate) struct MarshalCounters {
    allocated: AtomicU64,
    freed: AtomicU64,
}

impl MarshalCounters {
    pub(crate) fn snapshot(&self) -> (u64, u64) {
        (
            self.allocated.load(Ordering::SeqCst),
            self.freed.load(Ordering::SeqCst),
        )
    }
}

/// Scratch state for one engine call.
pub(crate) struct CallFrame<'a> {
    instance: &'a mut EngineInstance,
    counters: &'a MarshalCounters,
    allocations: Vec<(i32, i32)>,
}

impl<'a> CallFrame<'a> {
    pub(crate) fn new(
        instance: &'a mut EngineInstance,
        counters: &'a MarshalCounters,
    ) -> AdapterResult<Self> {
        instance
            .store
            .set_fuel(FUEL_LEVEL)
            .map_err(|e| AdapterError::Backend(format!("failed to refuel engine store: {e}")))?;
        Ok(Self {
            instance,
            counters,
            allocations: Vec::new(),
        })
    }

    /// Allocates `size` bytes in the module's linear memory and records the
    /// allocation for teardown.
    pub(crate) fn alloc(&mut self, size: i32) -> AdapterResult<i32> {
        let pointer = self
            .instance
            .malloc
            .call(&mut self.instance.store, size)
            .map_err(trap_error)?;
        if pointer == 0 {
            return Err(AdapterError::Marshal(format!(
                "engine allocation of {size} bytes returned null"
            )));
        }
        self.counters.allocated.fetch_add(1, Ordering::SeqCst);
        self.allocations.push((pointer, size));
        Ok(pointer)
    }

    pub(crate) fn alloc_doubles(&mut self, count: i32) -> AdapterResult<i32> {
        self.alloc(count * DOUBLE_SIZE)
    }

    /// Allocates the fixed diagnostic buffer, pre-terminated so an engine
    /// that writes nothing reads back as an empty message.
    pub(crate) fn alloc_error_buffer(&mut self) -> AdapterResult<i32> {
        let pointer = self.alloc(ERROR_BUFFER_LEN)?;
        self.write_bytes(pointer, &[0])?;
        Ok(pointer)
    }

    /// Allocates and writes a NUL-terminated UTF-8 string.
    pub(crate) fn alloc_c_string(&mut self, text: &str) -> AdapterResult<i32> {
        if text.as_bytes().contains(&0) {
            return Err(AdapterError::Marshal(
                "string argument contains NUL byte".to_string(),
            ));
        }
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        let pointer = self.alloc(bytes.len() as i32)?;
        self.write_bytes(pointer, &bytes)?;
        Ok(pointer)
    }

    /// Writes doubles into consecutive 8-byte slots starting at `pointer`.
    pub(crate) fn write_doubles(&mut self, pointer: i32, values: &[f64]) -> AdapterResult<()> {
        for (index, value) in values.iter().enumerate() {
            let offset = pointer as u32 as usize + index * DOUBLE_SIZE as usize;
            self.instance
                .memory
                .write(&mut self.instance.store, offset, &value.to_le_bytes())
                .map_err(|e| AdapterError::Marshal(format!("writing result slot: {e}")))?;
        }
        Ok(())
    }

    /// Reads the double at slot `index` of the buffer at `pointer`.
    pub(crate) fn read_double(&mut self, pointer: i32, index: i32) -> AdapterResult<f64> {
        let offset = pointer as u32 as usize + (index * DOUBLE_SIZE) as usize;
        let mut bytes = [0u8; 8];
        self.instance
            .memory
            .read(&self.instance.store, offset, &mut bytes)
            .map_err(|e| AdapterError::Marshal(format!("reading result slot {index}: {e}")))?;
        Ok(f64::from_le_bytes(bytes))
    }

    /// Decodes the engine diagnostic at `pointer`. Never fails; an
    /// unreadable buffer yields a placeholder so the original engine error
    /// code still surfaces.
    pub(crate) fn read_error(&mut self, pointer: i32) -> String {
        match self.read_c_string(pointer, ERROR_BUFFER_LEN) {
            Ok(message) => message,
            Err(_) => "<unreadable engine diagnostic>".to_string(),
        }
    }

    /// Reads a NUL-terminated UTF-8 string of at most `max_len` bytes.
    pub(crate) fn read_c_string(&mut self, pointer: i32, max_len: i32) -> AdapterResult<String> {
        let mut bytes = vec![0u8; max_len as usize];
        self.instance
            .memory
            .read(&self.instance.store, pointer as u32 as usize, &mut bytes)
            .map_err(|e| AdapterError::Marshal(format!("reading string buffer: {e}")))?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        bytes.truncate(end);
        String::from_utf8(bytes)
            .map_err(|e| AdapterError::Marshal(format!("engine string is not UTF-8: {e}")))
    }

    fn write_bytes(&mut self, pointer: i32, bytes: &[u8]) -> AdapterResult<()> {
        self.instance
            .memory
            .write(&mut self.instance.store, pointer as u32 as usize, bytes)
            .map_err(|e| AdapterError::Marshal(format!("writing scratch buffer: {e}")))
    }

    /// Releases every recorded allocation. Must run on every path out of a
    /// call; a failed free is logged and the pointer stays leaked.
    pub(crate) fn free_all(mut self) {
        for (pointer, _size) in self.allocations.drain(..) {
            match self.instance.free.call(&mut self.instance.store, pointer) {
                Ok(()) => {
                    self.counters.freed.fetch_add(1, Ordering::SeqCst);
                }
                Err(error) => {
                    let detail = format!("{error:#}");
                    tracing::warn!(
                        "{}",
                        ScratchFreeFailed {
                            pointer,
                            detail: &detail,
                        }
                    );
                }
            }
        }
    }

    // Engine entry points. TypedFuncs are Copy; each helper re-borrows the
    // store for the duration of the call.

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn call_calc_ut(
        &mut self,
        day_number: f64,
        body: i32,
        flags: i32,
        result_ptr: i32,
        error_ptr: i32,
    ) -> AdapterResult<i32> {
        let func = self.instance.calc_ut.clone();
        func.call(
            &mut self.instance.store,
            (day_number, body, flags, result_ptr, error_ptr),
        )
        .map_err(trap_error)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn call_rise_trans(
        &mut self,
        day_number: f64,
        body: i32,
        star_ptr: i32,
        ephe_flags: i32,
        event_flag: i32,
        geo_ptr: i32,
        pressure: f64,
        temperature: f64,
        times_ptr: i32,
        error_ptr: i32,
    ) -> AdapterResult<i32> {
        let func = self.instance.rise_trans.clone();
        func.call(
            &mut self.instance.store,
            (
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
            ),
        )
        .map_err(trap_error)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn call_az_alt(
        &mut self,
        day_number: f64,
        mode: i32,
        geo_ptr: i32,
        pressure: f64,
        temperature: f64,
        input_ptr: i32,
        output_ptr: i32,
    ) -> AdapterResult<()> {
        let func = self.instance.az_alt.clone();
        func.call(
            &mut self.instance.store,
            (
                day_number,
                mode,
                geo_ptr,
                pressure,
                temperature,
                input_ptr,
                output_ptr,
            ),
        )
        .map_err(trap_error)
    }

    pub(crate) fn call_set_sid_mode(
        &mut self,
        mode: i32,
        t0: f64,
        ayanamsa_t0: f64,
    ) -> AdapterResult<()> {
        let func = self.instance.set_sid_mode.clone();
        func.call(&mut self.instance.store, (mode, t0, ayanamsa_t0))
            .map_err(trap_error)
    }

    pub(crate) fn call_ayanamsa(&mut self, day_number: f64) -> AdapterResult<f64> {
        let func = self.instance.ayanamsa_ut.clone();
        func.call(&mut self.instance.store, day_number)
            .map_err(trap_error)
    }

    pub(crate) fn call_julday(
        &mut self,
        year: i32,
        month: i32,
        day: i32,
        hour_fraction: f64,
        calendar: i32,
    ) -> AdapterResult<f64> {
        let func = self.instance.julday.clone();
        func.call(
            &mut self.instance.store,
            (year, month, day, hour_fraction, calendar),
        )
        .map_err(trap_error)
    }

    pub(crate) fn call_set_ephe_path(&mut self, path_ptr: i32) -> AdapterResult<()> {
        let func = self.instance.set_ephe_path.clone();
        func.call(&mut self.instance.store, path_ptr)
            .map_err(trap_error)
    }

    pub(crate) fn call_version(&mut self, buffer_ptr: i32) -> AdapterResult<i32> {
        let func = self.instance.version.clone();
        func.call(&mut self.instance.store, buffer_ptr)
            .map_err(trap_error)
    }
}

fn trap_error(error: wasmtime::Error) -> AdapterError {
    AdapterError::Backend(format!("engine call trapped: {error}"))
}
