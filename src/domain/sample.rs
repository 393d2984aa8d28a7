use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use strum::{Display, EnumString};

/// Sensor tag names produced by the facility instruments
pub mod tags {
    pub const FLOW: &str = "FLOW";
    pub const EFFICIENCY: &str = "EFFICIENCY";
    pub const LEAKAGE: &str = "LEAKAGE";
    pub const PRESSURE: &str = "PRESSURE";
    pub const CONVERSION_RATE: &str = "CONVERSION_RATE";
    pub const GENERIC: &str = "GENERIC";

    /// Percentage tags bounded to [0, 100] after gap filling
    pub const PERCENT_BOUNDED: [&str; 2] = [EFFICIENCY, CONVERSION_RATE];
}

/// Instrument quality marker attached to every reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Quality {
    Good,
    Bad,
}

/// One raw reading in long format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedSample {
    pub timestamp: NaiveDateTime,
    pub tag: String,
    pub value: f64,
    pub unit: String,
    pub quality: Quality,
}

impl TaggedSample {
    /// Value usable for gap filling; BAD readings count as missing
    pub fn usable_value(&self) -> Option<f64> {
        match self.quality {
            Quality::Good => Some(self.value),
            Quality::Bad => None,
        }
    }
}

/// Per-tag series with one slot per timeline step; `None` marks a missing value
pub type TagSeries = BTreeMap<String, Vec<Option<f64>>>;

/// Pivot long-format samples into one series per tag aligned to `timeline`.
///
/// BAD samples become `None`. Several GOOD samples for the same slot are averaged.
/// Samples whose timestamp is not on the timeline are dropped.
pub fn pivot_by_tag(samples: &[TaggedSample], timeline: &[NaiveDateTime]) -> TagSeries {
    let slot_of: HashMap<NaiveDateTime, usize> = timeline
        .iter()
        .enumerate()
        .map(|(i, ts)| (*ts, i))
        .collect();

    let mut sums: BTreeMap<String, Vec<(f64, u32)>> = BTreeMap::new();
    for sample in samples {
        let Some(&slot) = slot_of.get(&sample.timestamp) else {
            tracing::debug!(
                tag = %sample.tag,
                timestamp = %sample.timestamp,
                "sample outside timeline dropped"
            );
            continue;
        };
        let acc = sums
            .entry(sample.tag.clone())
            .or_insert_with(|| vec![(0.0, 0); timeline.len()]);
        if let Some(v) = sample.usable_value() {
            acc[slot].0 += v;
            acc[slot].1 += 1;
        }
    }

    sums.into_iter()
        .map(|(tag, acc)| {
            let series = acc
                .into_iter()
                .map(|(sum, n)| (n > 0).then(|| sum / n as f64))
                .collect();
            (tag, series)
        })
        .collect()
}

/// Share of GOOD readings in percent (100 when there are no readings)
pub fn completeness_percent(samples: &[TaggedSample]) -> f64 {
    if samples.is_empty() {
        return 100.0;
    }
    let good = samples
        .iter()
        .filter(|s| s.quality == Quality::Good)
        .count();
    good as f64 / samples.len() as f64 * 100.0
}
