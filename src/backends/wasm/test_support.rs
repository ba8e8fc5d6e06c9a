// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stub engine module for tests.
//!
//! A hand-written core module exposing the same flat export surface as the
//! real engine build: `malloc`/`free` over linear memory plus the engine
//! entry points. Results are deterministic formulas so tests can assert
//! exact values, and `set_malloc_fail_in` arms allocation-failure injection
//! for the leak-accounting tests.

/// Assembles the stub engine module.
pub(crate) fn stub_engine_bytes() -> Vec<u8> {
    wat::parse_str(STUB_ENGINE_WAT).expect("stub engine WAT is valid")
}

const STUB_ENGINE_WAT: &str = r#"
(module
  (memory (export "memory") 2)

  (data (i32.const 1024) "sweph stub: unknown body\00")
  (data (i32.const 1088) "2.10.03-stub\00")

  (global $bump (mut i32) (i32.const 4096))
  (global $fail_in (mut i32) (i32.const -1))
  (global $sid_mode (mut i32) (i32.const 0))
  (global $ephe_path_len (export "ephe_path_len") (mut i32) (i32.const 0))

  ;; Bump allocator with countdown fault injection: when $fail_in reaches
  ;; zero the allocation returns null and the countdown disarms.
  (func (export "malloc") (param $n i32) (result i32)
    (local $p i32)
    (if (i32.eq (global.get $fail_in) (i32.const 0))
      (then
        (global.set $fail_in (i32.const -1))
        (return (i32.const 0))))
    (if (i32.gt_s (global.get $fail_in) (i32.const 0))
      (then (global.set $fail_in (i32.sub (global.get $fail_in) (i32.const 1)))))
    (local.set $p (global.get $bump))
    (global.set $bump
      (i32.add (global.get $bump)
               (i32.and (i32.add (local.get $n) (i32.const 7)) (i32.const -8))))
    (local.get $p))

  (func (export "free") (param $p i32))

  (func (export "set_malloc_fail_in") (param $n i32)
    (global.set $fail_in (local.get $n)))

  ;; Bodies 0..=9 are valid; anything else writes a diagnostic and fails.
  (func (export "swe_calc_ut")
        (param $tjd f64) (param $ipl i32) (param $iflag i32)
        (param $res i32) (param $err i32) (result i32)
    (if (i32.or (i32.lt_s (local.get $ipl) (i32.const 0))
                (i32.gt_s (local.get $ipl) (i32.const 9)))
      (then
        (memory.copy (local.get $err) (i32.const 1024) (i32.const 25))
        (return (i32.const -1))))
    (f64.store (local.get $res)
      (f64.mul (f64.convert_i32_s (local.get $ipl)) (f64.const 30)))
    (f64.store offset=8 (local.get $res) (f64.const 1.5))
    (f64.store offset=16 (local.get $res) (f64.const 0.98))
    (f64.store offset=24 (local.get $res) (f64.const 0.95))
    (f64.store offset=32 (local.get $res) (f64.const 0.01))
    (f64.store offset=40 (local.get $res) (f64.const 0.002))
    (local.get $iflag))

  ;; Latitudes beyond the polar circle report "no event" (-2). Rise events
  ;; (bit 1) land at tjd + 0.25, everything else at tjd + 0.75.
  (func (export "swe_rise_trans")
        (param $tjd f64) (param $ipl i32) (param $star i32)
        (param $epheflag i32) (param $rsmi i32) (param $geo i32)
        (param $atpress f64) (param $attemp f64)
        (param $tret i32) (param $err i32) (result i32)
    (if (i32.gt_s (local.get $ipl) (i32.const 9))
      (then
        (memory.copy (local.get $err) (i32.const 1024) (i32.const 25))
        (return (i32.const -1))))
    (if (f64.gt (f64.abs (f64.load offset=8 (local.get $geo))) (f64.const 66))
      (then (return (i32.const -2))))
    (f64.store (local.get $tret)
      (f64.add (local.get $tjd)
        (select (f64.const 0.25) (f64.const 0.75)
                (i32.and (local.get $rsmi) (i32.const 1)))))
    (i32.const 0))

  ;; Echoes inputs so the host can verify both arrays were marshaled:
  ;; az = xin[0] + geo[0], alt = xin[1] + geo[1].
  (func (export "swe_azalt")
        (param $tjd f64) (param $flag i32) (param $geo i32)
        (param $atpress f64) (param $attemp f64)
        (param $xin i32) (param $xaz i32)
    (f64.store (local.get $xaz)
      (f64.add (f64.load (local.get $xin)) (f64.load (local.get $geo))))
    (f64.store offset=8 (local.get $xaz)
      (f64.add (f64.load offset=8 (local.get $xin))
               (f64.load offset=8 (local.get $geo))))
    (f64.store offset=16 (local.get $xaz)
      (f64.load offset=8 (local.get $xin))))

  (func (export "swe_set_sid_mode")
        (param $mode i32) (param $t0 f64) (param $ayan f64)
    (global.set $sid_mode (local.get $mode)))

  (func (export "swe_get_ayanamsa_ut") (param $tjd f64) (result f64)
    (f64.add (f64.const 24) (f64.convert_i32_s (global.get $sid_mode))))

  (func (export "swe_julday")
        (param $y i32) (param $m i32) (param $d i32)
        (param $h f64) (param $flag i32) (result f64)
    (f64.add
      (f64.add
        (f64.add
          (f64.mul (f64.convert_i32_s (local.get $y)) (f64.const 365.25))
          (f64.mul (f64.convert_i32_s (local.get $m)) (f64.const 30)))
        (f64.convert_i32_s (local.get $d)))
      (f64.div (local.get $h) (f64.const 24))))

  (func (export "swe_set_ephe_path") (param $path i32)
    (local $len i32)
    (block $done
      (loop $scan
        (br_if $done
          (i32.eqz (i32.load8_u (i32.add (local.get $path) (local.get $len)))))
        (local.set $len (i32.add (local.get $len) (i32.const 1)))
        (br $scan)))
    (global.set $ephe_path_len (local.get $len)))

  (func (export "swe_version") (param $buf i32) (result i32)
    (memory.copy (local.get $buf) (i32.const 1088) (i32.const 13))
    (i32.const 12))
)
"#;
