use super::{count_missing, AuditRecord, GapFill, GapFillingStrategy};
use crate::domain::{metadata_f64, Metadata};

const SHORT_GAP_HOURS: f64 = 4.0;
const CONSERVATIVE_QUANTILE: f64 = 0.10;

/// Puro biochar methodology.
///
/// Short gaps (under 4 hours, measured in samples via `interval_minutes`) are
/// linearly interpolated between the neighbouring valid readings. Longer gaps,
/// and gaps at either end of the series, take the conservative 10th
/// percentile of the original valid readings (0 if there are none).
#[derive(Debug, Clone, Copy, Default)]
pub struct PuroBiochar;

impl PuroBiochar {
    /// Longest gap, in samples, that may be interpolated
    pub fn short_gap_limit(metadata: &Metadata) -> usize {
        let interval_minutes = metadata_f64(metadata, "interval_minutes")
            .filter(|m| m.is_finite() && *m > 0.0)
            .unwrap_or(1.0);
        (SHORT_GAP_HOURS * 60.0 / interval_minutes).floor() as usize
    }
}

impl GapFillingStrategy for PuroBiochar {
    fn name(&self) -> &'static str {
        "Puro Biochar"
    }

    fn fill(&self, series: &[Option<f64>], metadata: &Metadata) -> GapFill {
        let limit = Self::short_gap_limit(metadata);
        let valid: Vec<f64> = series.iter().flatten().copied().collect();
        let p10 = quantile(&valid, CONSERVATIVE_QUANTILE).unwrap_or(0.0);

        let mut filled = series.to_vec();
        let mut interpolated = 0;
        let mut percentile_filled = 0;

        let mut i = 0;
        while i < series.len() {
            if series[i].is_some() {
                i += 1;
                continue;
            }
            let start = i;
            while i < series.len() && series[i].is_none() {
                i += 1;
            }
            let end = i;

            let left = start.checked_sub(1).and_then(|j| series[j]);
            let right = series.get(end).copied().flatten();

            match (left, right) {
                (Some(l), Some(r)) if end - start <= limit => {
                    // neighbours sit at start-1 and end
                    let span = (end - start + 1) as f64;
                    for (k, slot) in filled[start..end].iter_mut().enumerate() {
                        let t = (k + 1) as f64 / span;
                        *slot = Some(l + (r - l) * t);
                    }
                    interpolated += end - start;
                }
                _ => {
                    for slot in &mut filled[start..end] {
                        *slot = Some(p10);
                    }
                    percentile_filled += end - start;
                }
            }
        }

        let substitutions = count_missing(&filled);
        GapFill {
            series: filled,
            audit: AuditRecord::PuroBiochar {
                substitutions,
                interpolated,
                percentile_filled,
            },
        }
    }
}

/// Quantile with linear interpolation between closest ranks
fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
