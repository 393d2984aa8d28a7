use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::collections::BTreeMap;
use thiserror::Error;

use super::{timeline, SensorSource};
use crate::domain::{tags, NodeType, ParamValue, Quality, TaggedSample};

/// Sensor simulation errors
#[derive(Debug, Error, PartialEq)]
pub enum SensorError {
    #[error("invalid parameter '{key}' for {node_type} node: {reason}")]
    InvalidParameter {
        node_type: NodeType,
        key: String,
        reason: String,
    },
    #[error("noise distribution error for tag {tag}: {reason}")]
    Distribution { tag: String, reason: String },
}

/// One simulated instrument on a node
#[derive(Debug, Clone, PartialEq)]
pub struct SensorChannel {
    pub tag: &'static str,
    pub unit: &'static str,
    pub base_value: f64,
    pub noise_std: f64,
    /// Fraction of readings lost, in [0, 1]
    pub dropout_rate: f64,
}

impl SensorChannel {
    /// Instruments fitted to a node of the given type, parameterized from `params`
    pub fn for_node(
        node_type: NodeType,
        params: &BTreeMap<String, ParamValue>,
    ) -> Result<Vec<SensorChannel>, SensorError> {
        let p = Params { node_type, params };
        let channels = match node_type {
            NodeType::Capture => {
                let base_flow = p.base("base_flow", 150.0)?;
                let efficiency = p.base("efficiency", 88.5)?;
                let dropout = p.dropout(0.05)?;
                vec![
                    channel(tags::FLOW, "kg/hr", base_flow, base_flow * 0.05, dropout),
                    channel(tags::EFFICIENCY, "%", efficiency, 1.0, dropout / 2.0),
                ]
            }
            NodeType::Transport => {
                let leakage = p.base("base_leakage", 1.8)?;
                let dropout = p.dropout(0.02)?;
                vec![channel(tags::LEAKAGE, "kg/hr", leakage, leakage * 0.1, dropout)]
            }
            NodeType::Storage => {
                let pressure = p.base("base_pressure", 100.0)?;
                let dropout = p.dropout(0.01)?;
                vec![channel(tags::PRESSURE, "bar", pressure, pressure * 0.02, dropout)]
            }
            NodeType::Utilization => {
                let rate = p.base("conversion_rate", 95.0)?;
                let dropout = p.dropout(0.01)?;
                vec![channel(tags::CONVERSION_RATE, "%", rate, 1.0, dropout)]
            }
            NodeType::Other => {
                let value = p.base("value", 100.0)?;
                vec![channel(tags::GENERIC, "unit", value, value * 0.05, 0.05)]
            }
        };
        Ok(channels)
    }
}

fn channel(
    tag: &'static str,
    unit: &'static str,
    base_value: f64,
    noise_std: f64,
    dropout_rate: f64,
) -> SensorChannel {
    SensorChannel {
        tag,
        unit,
        base_value,
        noise_std,
        dropout_rate: dropout_rate.clamp(0.0, 1.0),
    }
}

struct Params<'a> {
    node_type: NodeType,
    params: &'a BTreeMap<String, ParamValue>,
}

impl Params<'_> {
    fn get(&self, key: &str, default: f64) -> Result<f64, SensorError> {
        match self.params.get(key) {
            None => Ok(default),
            Some(value) => value.as_f64().ok_or_else(|| SensorError::InvalidParameter {
                node_type: self.node_type,
                key: key.to_string(),
                reason: format!("expected a number, got {value:?}"),
            }),
        }
    }

    /// A base value for the noise model: finite and non-negative
    fn base(&self, key: &str, default: f64) -> Result<f64, SensorError> {
        let value = self.get(key, default)?;
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(SensorError::InvalidParameter {
                node_type: self.node_type,
                key: key.to_string(),
                reason: format!("must be non-negative, got {value}"),
            })
        }
    }

    /// `dropout_rate`, with `dropout` accepted as an alias
    fn dropout(&self, default: f64) -> Result<f64, SensorError> {
        if self.params.contains_key("dropout_rate") {
            self.get("dropout_rate", default)
        } else {
            self.get("dropout", default)
        }
    }
}

/// Gaussian-noise sensor simulator with injected dropouts.
///
/// Dropped readings report value 0.0 with BAD quality, the way a failed
/// instrument shows up in a historian export.
pub struct SimulatedSensorSource {
    rng: StdRng,
}

impl SimulatedSensorSource {
    /// Reproducible source
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is given, entropy-backed otherwise
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    fn simulate_channel(
        &mut self,
        ch: &SensorChannel,
        timestamps: &[NaiveDateTime],
    ) -> Result<Vec<TaggedSample>, SensorError> {
        let normal = Normal::new(0.0, ch.noise_std).map_err(|e| SensorError::Distribution {
            tag: ch.tag.to_string(),
            reason: e.to_string(),
        })?;

        let mut samples: Vec<TaggedSample> = timestamps
            .iter()
            .map(|ts| TaggedSample {
                timestamp: *ts,
                tag: ch.tag.to_string(),
                value: (ch.base_value + normal.sample(&mut self.rng)).max(0.0),
                unit: ch.unit.to_string(),
                quality: Quality::Good,
            })
            .collect();

        let n = samples.len();
        let dropouts = (n as f64 * ch.dropout_rate).floor() as usize;
        for i in rand::seq::index::sample(&mut self.rng, n, dropouts.min(n)) {
            samples[i].value = 0.0;
            samples[i].quality = Quality::Bad;
        }

        Ok(samples)
    }
}

impl SensorSource for SimulatedSensorSource {
    fn read(
        &mut self,
        node_type: NodeType,
        params: &BTreeMap<String, ParamValue>,
        n_readings: usize,
        start_time: NaiveDateTime,
        interval_seconds: u32,
    ) -> Result<Vec<TaggedSample>, SensorError> {
        let timestamps = timeline(start_time, n_readings, interval_seconds);
        let mut samples = Vec::new();
        for ch in SensorChannel::for_node(node_type, params)? {
            samples.extend(self.simulate_channel(&ch, &timestamps)?);
        }
        Ok(samples)
    }
}
