//! # Sensor Data Sources
//!
//! Raw tagged time series for each facility node. The propagator only sees
//! the [`SensorSource`] trait; [`SimulatedSensorSource`] is the in-memory
//! simulator used by the service and the ledger report.

pub mod sensor;

pub use sensor::{SensorChannel, SensorError, SimulatedSensorSource};

use chrono::{Duration, NaiveDateTime};
use std::collections::BTreeMap;

use crate::domain::{NodeType, ParamValue, TaggedSample};

/// Provider of raw per-tag readings for one node
pub trait SensorSource {
    /// Readings for a node of `node_type`, `n_readings` per tag, spaced
    /// `interval_seconds` apart from `start_time`
    fn read(
        &mut self,
        node_type: NodeType,
        params: &BTreeMap<String, ParamValue>,
        n_readings: usize,
        start_time: NaiveDateTime,
        interval_seconds: u32,
    ) -> Result<Vec<TaggedSample>, SensorError>;
}

/// Evenly spaced sample timestamps
pub fn timeline(start_time: NaiveDateTime, n: usize, interval_seconds: u32) -> Vec<NaiveDateTime> {
    (0..n)
        .map(|i| start_time + Duration::seconds(i as i64 * interval_seconds as i64))
        .collect()
}
