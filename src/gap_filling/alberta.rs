use super::{AuditRecord, GapFill, GapFillingStrategy};
use crate::domain::{metadata_f64, Metadata};

const DEFAULT_TIER_LEVEL: f64 = 3.0;
const DEFAULT_EMISSION_FACTOR: f64 = 0.0;

/// Alberta TIER: prescribed method per level classification.
///
/// Levels 1/2 substitute the prescribed `emission_factor`. Level 3 is direct
/// measurement: gaps stay missing and a formal deviation is required.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlbertaTier;

impl GapFillingStrategy for AlbertaTier {
    fn name(&self) -> &'static str {
        "Alberta TIER"
    }

    fn fill(&self, series: &[Option<f64>], metadata: &Metadata) -> GapFill {
        let level = metadata_f64(metadata, "tier_level").unwrap_or(DEFAULT_TIER_LEVEL);

        if level == 3.0 {
            let requires_deviation = series.iter().any(Option::is_none);
            return GapFill {
                series: series.to_vec(),
                audit: AuditRecord::AlbertaTier { requires_deviation },
            };
        }

        let emission_factor =
            metadata_f64(metadata, "emission_factor").unwrap_or(DEFAULT_EMISSION_FACTOR);
        GapFill {
            series: series
                .iter()
                .map(|v| Some(v.unwrap_or(emission_factor)))
                .collect(),
            audit: AuditRecord::AlbertaTier {
                requires_deviation: false,
            },
        }
    }
}
