use super::{count_missing, AuditRecord, GapFill, GapFillingStrategy};
use crate::domain::Metadata;

/// California LCFS: completeness first.
///
/// Credits are not issued for periods with gaps, so every gap is zero-filled.
/// Also the fallback for unrecognized jurisdictions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaliforniaLcfs;

impl GapFillingStrategy for CaliforniaLcfs {
    fn name(&self) -> &'static str {
        "California LCFS"
    }

    fn fill(&self, series: &[Option<f64>], _metadata: &Metadata) -> GapFill {
        GapFill {
            series: series.iter().map(|v| Some(v.unwrap_or(0.0))).collect(),
            audit: AuditRecord::CaliforniaLcfs {
                incomplete_periods: count_missing(series),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_fills_gaps() {
        let fill = CaliforniaLcfs.fill(&[Some(5.0), None, None, Some(1.0)], &Metadata::new());
        assert_eq!(fill.series, vec![Some(5.0), Some(0.0), Some(0.0), Some(1.0)]);
        assert_eq!(fill.audit, AuditRecord::CaliforniaLcfs { incomplete_periods: 2 });
    }
}
