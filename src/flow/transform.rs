//! Per-node physical transformations on index-aligned flow series.
//!
//! Series are `f64` with NaN marking a value no policy was allowed to fill;
//! NaN propagates through arithmetic and is skipped when totals are summed.

const MINUTES_PER_HOUR: f64 = 60.0;
const KG_PER_TONNE: f64 = 1000.0;

/// Captured CO2 in kg/min: `(FLOW kg/hr / 60) * (EFFICIENCY % / 100)`
pub fn capture_outflow(flow_kg_hr: &[f64], efficiency_pct: &[f64]) -> Vec<f64> {
    flow_kg_hr
        .iter()
        .zip(efficiency_pct)
        .map(|(f, e)| (f / MINUTES_PER_HOUR) * (e / 100.0))
        .collect()
}

/// The share of a node's outflow carried by each of its `out_degree` edges
pub fn fan_out_share(outflow: &[f64], out_degree: usize) -> Vec<f64> {
    let k = out_degree.max(1) as f64;
    outflow.iter().map(|v| v / k).collect()
}

/// Element-wise sum of incoming shares; `None` when there are no shares
pub fn sum_shares(shares: &[Vec<f64>]) -> Option<Vec<f64>> {
    let (first, rest) = shares.split_first()?;
    let mut total = first.clone();
    for share in rest {
        for (acc, v) in total.iter_mut().zip(share) {
            *acc += v;
        }
    }
    Some(total)
}

/// Inflow minus hourly leakage converted to kg/min, floored at zero
pub fn transport_outflow(inflow: &[f64], leakage_kg_hr: &[f64]) -> Vec<f64> {
    inflow
        .iter()
        .zip(leakage_kg_hr)
        .map(|(i, l)| {
            let out = i - l / MINUTES_PER_HOUR;
            if out < 0.0 {
                0.0
            } else {
                out
            }
        })
        .collect()
}

/// Inflow scaled by the conversion rate (percent)
pub fn utilization_outflow(inflow: &[f64], conversion_pct: &[f64]) -> Vec<f64> {
    inflow
        .iter()
        .zip(conversion_pct)
        .map(|(i, c)| i * (c / 100.0))
        .collect()
}

/// Clamp a percentage series to [0, 100], leaving NaN untouched
pub fn clip_percent(series: &mut [f64]) {
    for v in series.iter_mut().filter(|v| !v.is_nan()) {
        *v = v.clamp(0.0, 100.0);
    }
}

/// Mass in tonnes of a kg/min series sampled every `timestep_minutes`.
/// NaN samples are skipped; the result may still be infinite.
pub fn total_tonnes(flow_kg_min: &[f64], timestep_minutes: f64) -> f64 {
    let kg_per_min: f64 = flow_kg_min.iter().filter(|v| !v.is_nan()).sum();
    kg_per_min * timestep_minutes / KG_PER_TONNE
}
