// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Value types exchanged across the adapter contract.
//!
//! Every backend produces exactly these shapes. There is one type per
//! operation; absence of an event is `Option::None`, never a sentinel value
//! or an alternate result shape.

use serde::{Deserialize, Serialize};

/// Ecliptic position of a body, with motion rates.
///
/// Longitude and latitude are in degrees, distance in AU. The three speed
/// fields are daily rates for the corresponding coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalcResult {
    pub longitude: f64,
    pub latitude: f64,
    pub distance: f64,
    pub longitude_speed: f64,
    pub latitude_speed: f64,
    pub distance_speed: f64,
}

impl CalcResult {
    /// Builds a result from the six-double slot layout used by the engine
    /// (longitude, latitude, distance, then the three speeds).
    pub fn from_slots(slots: &[f64; 6]) -> Self {
        Self {
            longitude: slots[0],
            latitude: slots[1],
            distance: slots[2],
            longitude_speed: slots[3],
            latitude_speed: slots[4],
            distance_speed: slots[5],
        }
    }
}

/// Outcome of a rise/set/transit search.
///
/// `transit_time` is the event time as a day number. `None` means the event
/// does not occur for the given day and location (polar day, circumpolar
/// body); that is a valid outcome, not an error. `flag` is the engine's raw
/// return code for the search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiseTransResult {
    pub transit_time: Option<f64>,
    pub flag: i32,
}

/// Horizontal coordinates of a body, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AzAltResult {
    pub azimuth: f64,
    pub altitude: f64,
}

/// Observer position on the geoid. Longitude/latitude in degrees, altitude
/// in meters above sea level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
}

impl GeoPosition {
    pub fn new(longitude: f64, latitude: f64, altitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            altitude,
        }
    }

    /// Engine slot order: longitude, latitude, altitude.
    pub fn to_slots(self) -> [f64; 3] {
        [self.longitude, self.latitude, self.altitude]
    }
}

/// Ecliptic input coordinates for horizontal conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EclipticInput {
    pub longitude: f64,
    pub latitude: f64,
    pub distance: f64,
}

impl EclipticInput {
    pub fn new(longitude: f64, latitude: f64, distance: f64) -> Self {
        Self {
            longitude,
            latitude,
            distance,
        }
    }

    pub fn to_slots(self) -> [f64; 3] {
        [self.longitude, self.latitude, self.distance]
    }
}

/// Paired rise and set times for one day, as produced by the service layer.
///
/// Either side may be absent independently; a polar-night day yields
/// `{ rise: None, set: None }` without an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiseSet {
    pub rise: Option<f64>,
    pub set: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_result_from_slots() {
        let slots = [120.5, -1.2, 0.98, 0.95, 0.01, 0.002];
        let result = CalcResult::from_slots(&slots);
        assert_eq!(result.longitude, 120.5);
        assert_eq!(result.latitude, -1.2);
        assert_eq!(result.distance, 0.98);
        assert_eq!(result.longitude_speed, 0.95);
        assert_eq!(result.latitude_speed, 0.01);
        assert_eq!(result.distance_speed, 0.002);
    }

    #[test]
    fn test_geo_position_slot_order() {
        let geo = GeoPosition::new(77.2, 28.6, 216.0);
        assert_eq!(geo.to_slots(), [77.2, 28.6, 216.0]);
    }

    #[test]
    fn test_absent_transit_is_not_an_error() {
        let result = RiseTransResult {
            transit_time: None,
            flag: -2,
        };
        assert!(result.transit_time.is_none());
    }
}
