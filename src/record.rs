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

use crate::units::{to_metricwx, UnitGroup, UnitSystem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One timestamped set of station observations
///
/// Fields are sparse: a field may be missing entirely or present with a
/// `None` value, and both mean "not observed".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unix timestamp in seconds
    #[serde(rename = "dateTime")]
    pub date_time: i64,

    #[serde(rename = "usUnits")]
    pub units: UnitSystem,

    #[serde(flatten)]
    pub fields: BTreeMap<String, Option<f64>>,
}

impl Record {
    pub fn new(date_time: i64, units: UnitSystem) -> Self {
        Self {
            date_time,
            units,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter
    pub fn with(mut self, field: &str, value: f64) -> Self {
        self.fields.insert(field.to_string(), Some(value));
        self
    }

    pub fn set(&mut self, field: &str, value: Option<f64>) {
        self.fields.insert(field.to_string(), value);
    }

    /// Observed value of `field`, `None` when missing or explicitly absent
    pub fn get(&self, field: &str) -> Option<f64> {
        self.fields.get(field).copied().flatten()
    }

    /// Convert every physical field to METRICWX
    ///
    /// Total and idempotent: the field set is preserved, absent values stay
    /// absent and the result is tagged METRICWX.
    pub fn normalize(&self) -> Record {
        let fields = self
            .fields
            .iter()
            .map(|(name, value)| {
                let converted =
                    value.map(|v| to_metricwx(UnitGroup::of(name), self.units, v));
                (name.clone(), converted)
            })
            .collect();

        Record {
            date_time: self.date_time,
            units: UnitSystem::MetricWx,
            fields,
        }
    }
}

/// Free-function form of [`Record::normalize`]
pub fn to_metric(record: &Record) -> Record {
    record.normalize()
}
