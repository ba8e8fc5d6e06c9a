// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Engine constants duplicated locally.
//!
//! Both backends carry these values themselves so that neither has a
//! compile-time dependency on the engine's C headers. The adapter contract
//! passes flag bitmasks through unchanged; these constants exist so callers
//! can build them.

/// Body ids.
pub const SE_SUN: i32 = 0;
pub const SE_MOON: i32 = 1;
pub const SE_MERCURY: i32 = 2;
pub const SE_VENUS: i32 = 3;
pub const SE_MARS: i32 = 4;
pub const SE_JUPITER: i32 = 5;
pub const SE_SATURN: i32 = 6;
pub const SE_URANUS: i32 = 7;
pub const SE_NEPTUNE: i32 = 8;
pub const SE_PLUTO: i32 = 9;
pub const SE_MEAN_NODE: i32 = 10;
pub const SE_TRUE_NODE: i32 = 11;

/// Ephemeris selection flags.
pub const SEFLG_JPLEPH: i32 = 1;
pub const SEFLG_SWIEPH: i32 = 2;
pub const SEFLG_MOSEPH: i32 = 4;
/// Request speed fields in position results.
pub const SEFLG_SPEED: i32 = 256;
/// Sidereal (ayanamsa-corrected) longitudes.
pub const SEFLG_SIDEREAL: i32 = 65536;

/// Calendar flags for day-number conversion.
pub const SE_JUL_CAL: i32 = 0;
pub const SE_GREG_CAL: i32 = 1;

/// Rise/set/transit event selection.
pub const SE_CALC_RISE: i32 = 1;
pub const SE_CALC_SET: i32 = 2;
pub const SE_CALC_MTRANSIT: i32 = 4;
pub const SE_CALC_ITRANSIT: i32 = 8;
pub const SE_BIT_DISC_CENTER: i32 = 256;
pub const SE_BIT_NO_REFRACTION: i32 = 512;

/// Sidereal modes.
pub const SE_SIDM_FAGAN_BRADLEY: i32 = 0;
pub const SE_SIDM_LAHIRI: i32 = 1;
pub const SE_SIDM_RAMAN: i32 = 3;
pub const SE_SIDM_KRISHNAMURTI: i32 = 5;

/// Coordinate conversion modes for horizontal conversion.
pub const SE_ECL2HOR: i32 = 0;
pub const SE_EQU2HOR: i32 = 1;

/// Engine return code meaning "no such event for this day/location".
pub const RISE_TRANS_NO_EVENT: i32 = -2;
/// Engine return code meaning the call itself failed.
pub const ENGINE_ERR: i32 = -1;
