use super::{count_missing, AuditRecord, GapFill, GapFillingStrategy};
use crate::domain::Metadata;

/// 90 days of 5-second samples
pub const ROLLING_WINDOW_SAMPLES: usize = 90 * 24 * 12;

/// EPA Subpart RR: facility-specific, pre-approved substitution.
///
/// Missing readings are replaced by the trailing rolling mean of valid
/// readings over [`ROLLING_WINDOW_SAMPLES`]; at least one valid reading must
/// fall inside the window, otherwise the slot stays missing. A series with no
/// valid reading at all is zero-filled. Every substitution is counted.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpaSubpartRr;

impl GapFillingStrategy for EpaSubpartRr {
    fn name(&self) -> &'static str {
        "EPA Subpart RR"
    }

    fn fill(&self, series: &[Option<f64>], _metadata: &Metadata) -> GapFill {
        let substitutions = count_missing(series);
        let audit = AuditRecord::EpaSubpartRr { substitutions };

        if substitutions == series.len() {
            return GapFill {
                series: vec![Some(0.0); series.len()],
                audit,
            };
        }

        GapFill {
            series: fill_with_rolling_mean(series, ROLLING_WINDOW_SAMPLES),
            audit,
        }
    }
}

/// Replace each gap with the mean of the valid values in the trailing window
/// ending at that slot.
fn fill_with_rolling_mean(series: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    // prefix[i] = (sum, count) of valid values in series[..i]
    let mut prefix = Vec::with_capacity(series.len() + 1);
    prefix.push((0.0_f64, 0_usize));
    for value in series {
        let (sum, count) = prefix[prefix.len() - 1];
        prefix.push(match value {
            Some(v) => (sum + v, count + 1),
            None => (sum, count),
        });
    }

    series
        .iter()
        .enumerate()
        .map(|(i, value)| {
            value.or_else(|| {
                let start = (i + 1).saturating_sub(window);
                let (sum_end, count_end) = prefix[i + 1];
                let (sum_start, count_start) = prefix[start];
                let count = count_end - count_start;
                (count > 0).then(|| (sum_end - sum_start) / count as f64)
            })
        })
        .collect()
}
