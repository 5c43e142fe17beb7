// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Unit systems and conversion tables
//
// Records arrive tagged with the unit system of the station that produced
// them. Everything downstream of the queue works in METRICWX:
// degree_C, meter_per_second, mbar, mm and mm_per_hour.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit system tag carried in `usUnits`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum UnitSystem {
    /// degree_F, mile_per_hour, inHg, inch
    Us,
    /// degree_C, km_per_hour, mbar, cm
    Metric,
    /// degree_C, meter_per_second, mbar, mm
    MetricWx,
}

impl UnitSystem {
    pub fn code(self) -> u8 {
        match self {
            UnitSystem::Us => 0x01,
            UnitSystem::Metric => 0x10,
            UnitSystem::MetricWx => 0x11,
        }
    }
}

impl TryFrom<u8> for UnitSystem {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x01 => Ok(UnitSystem::Us),
            0x10 => Ok(UnitSystem::Metric),
            0x11 => Ok(UnitSystem::MetricWx),
            other => Err(format!("unknown unit system code {}", other)),
        }
    }
}

impl From<UnitSystem> for u8 {
    fn from(system: UnitSystem) -> u8 {
        system.code()
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitSystem::Us => write!(f, "US"),
            UnitSystem::Metric => write!(f, "METRIC"),
            UnitSystem::MetricWx => write!(f, "METRICWX"),
        }
    }
}

/// Physical quantity an observation field measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitGroup {
    Temperature,
    Speed,
    Pressure,
    Rain,
    RainRate,
    /// Directions, percentages, UV index, radiation and unknown fields
    Unconverted,
}

impl UnitGroup {
    /// Look up the group of an observation field by its record name
    pub fn of(field: &str) -> Self {
        match field {
            "outTemp" | "inTemp" | "extraTemp1" | "extraTemp2" | "extraTemp3" | "dewpoint"
            | "inDewpoint" | "windchill" | "heatindex" | "appTemp" => UnitGroup::Temperature,
            "windSpeed" | "windGust" => UnitGroup::Speed,
            "barometer" | "pressure" | "altimeter" => UnitGroup::Pressure,
            "rain" | "hourRain" | "rain24" | "dayRain" => UnitGroup::Rain,
            "rainRate" => UnitGroup::RainRate,
            _ => UnitGroup::Unconverted,
        }
    }
}

const MPH_TO_MPS: f64 = 0.44704;
const KPH_TO_MPS: f64 = 1.0 / 3.6;
const INHG_TO_MBAR: f64 = 33.8638866667;
const INCH_TO_MM: f64 = 25.4;
const CM_TO_MM: f64 = 10.0;

/// Convert one value of `group` from `from` into METRICWX
pub fn to_metricwx(group: UnitGroup, from: UnitSystem, value: f64) -> f64 {
    match (from, group) {
        (UnitSystem::MetricWx, _) | (_, UnitGroup::Unconverted) => value,
        (UnitSystem::Us, UnitGroup::Temperature) => (value - 32.0) * 5.0 / 9.0,
        (UnitSystem::Us, UnitGroup::Speed) => value * MPH_TO_MPS,
        (UnitSystem::Us, UnitGroup::Pressure) => value * INHG_TO_MBAR,
        (UnitSystem::Us, UnitGroup::Rain | UnitGroup::RainRate) => value * INCH_TO_MM,
        (UnitSystem::Metric, UnitGroup::Speed) => value * KPH_TO_MPS,
        (UnitSystem::Metric, UnitGroup::Rain | UnitGroup::RainRate) => value * CM_TO_MM,
        (UnitSystem::Metric, UnitGroup::Temperature | UnitGroup::Pressure) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_system_codes() {
        for system in [UnitSystem::Us, UnitSystem::Metric, UnitSystem::MetricWx] {
            assert_eq!(UnitSystem::try_from(system.code()), Ok(system));
        }
        assert!(UnitSystem::try_from(7).is_err());
    }

    #[test]
    fn test_us_conversions() {
        let celsius = to_metricwx(UnitGroup::Temperature, UnitSystem::Us, 32.5);
        assert!((celsius - 0.277_777).abs() < 1e-5);

        let mps = to_metricwx(UnitGroup::Speed, UnitSystem::Us, 10.0);
        assert!((mps - 4.4704).abs() < 1e-9);

        let mbar = to_metricwx(UnitGroup::Pressure, UnitSystem::Us, 30.0);
        assert!((mbar - 1015.9166).abs() < 1e-3);

        assert_eq!(to_metricwx(UnitGroup::Rain, UnitSystem::Us, 1.0), 25.4);
    }

    #[test]
    fn test_metric_conversions() {
        let mps = to_metricwx(UnitGroup::Speed, UnitSystem::Metric, 36.0);
        assert!((mps - 10.0).abs() < 1e-9);
        assert_eq!(to_metricwx(UnitGroup::Rain, UnitSystem::Metric, 0.2), 2.0);
        assert_eq!(to_metricwx(UnitGroup::Temperature, UnitSystem::Metric, 21.0), 21.0);
    }

    #[test]
    fn test_unconverted_fields() {
        assert_eq!(UnitGroup::of("windDir"), UnitGroup::Unconverted);
        assert_eq!(UnitGroup::of("UV"), UnitGroup::Unconverted);
        assert_eq!(to_metricwx(UnitGroup::of("windDir"), UnitSystem::Us, 32.0), 32.0);
    }
}
