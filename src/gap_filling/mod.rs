//! Jurisdictional gap-filling strategies
//!
//! Each regulatory regime prescribes its own way of substituting missing or
//! invalid sensor data:
//! - EPA Subpart RR: trailing rolling mean of valid readings
//! - Alberta TIER: emission factors, or a mandatory deviation at tier 3
//! - California LCFS: zero-fill (no data, no credit)
//! - Puro Biochar: interpolate short gaps, 10th percentile for long ones
//!
//! Strategies are pure: `fill` returns the filled series together with the
//! audit record describing that single call.

pub mod alberta;
pub mod epa;
pub mod lcfs;
pub mod puro;

pub use alberta::AlbertaTier;
pub use epa::EpaSubpartRr;
pub use lcfs::CaliforniaLcfs;
pub use puro::PuroBiochar;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::domain::Metadata;

/// Audit trail entry for one fill (or the merge of several fills on one node)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy")]
pub enum AuditRecord {
    #[serde(rename = "EPA Subpart RR")]
    EpaSubpartRr { substitutions: usize },
    #[serde(rename = "Alberta TIER")]
    AlbertaTier { requires_deviation: bool },
    #[serde(rename = "California LCFS")]
    CaliforniaLcfs { incomplete_periods: usize },
    #[serde(rename = "Puro Biochar")]
    PuroBiochar {
        /// Values still missing after the fill
        substitutions: usize,
        interpolated: usize,
        percentile_filled: usize,
    },
}

impl AuditRecord {
    /// Combine the records of two fills made by the same strategy.
    ///
    /// Counts are summed and deviation flags OR-ed. Records from different
    /// strategies never meet in one run; if they do, `self` is kept.
    pub fn merge(self, other: &AuditRecord) -> AuditRecord {
        use AuditRecord::*;
        match (self, other) {
            (EpaSubpartRr { substitutions: a }, EpaSubpartRr { substitutions: b }) => {
                EpaSubpartRr { substitutions: a + b }
            }
            (AlbertaTier { requires_deviation: a }, AlbertaTier { requires_deviation: b }) => {
                AlbertaTier { requires_deviation: a || *b }
            }
            (
                CaliforniaLcfs { incomplete_periods: a },
                CaliforniaLcfs { incomplete_periods: b },
            ) => CaliforniaLcfs { incomplete_periods: a + b },
            (
                PuroBiochar {
                    substitutions: s1,
                    interpolated: i1,
                    percentile_filled: p1,
                },
                PuroBiochar {
                    substitutions: s2,
                    interpolated: i2,
                    percentile_filled: p2,
                },
            ) => PuroBiochar {
                substitutions: s1 + s2,
                interpolated: i1 + i2,
                percentile_filled: p1 + p2,
            },
            (record, _) => {
                tracing::debug!(?record, "ignoring audit record from a different strategy");
                record
            }
        }
    }

    /// True when the record demands a formal regulatory deviation
    pub fn requires_deviation(&self) -> bool {
        matches!(self, AuditRecord::AlbertaTier { requires_deviation: true })
    }
}

/// Result of filling one series
#[derive(Debug, Clone, PartialEq)]
pub struct GapFill {
    /// One slot per input slot; `None` only where the policy forbids substitution
    pub series: Vec<Option<f64>>,
    pub audit: AuditRecord,
}

/// A jurisdiction-approved substitution policy
pub trait GapFillingStrategy: Send + Sync {
    /// Human-readable regulatory name
    fn name(&self) -> &'static str;

    /// Fill one tagged series (missing values as `None`) using node metadata
    fn fill(&self, series: &[Option<f64>], metadata: &Metadata) -> GapFill;
}

/// The closed set of supported regulatory regimes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Jurisdiction {
    Epa,
    Alberta,
    Lcfs,
    Puro,
}

impl Jurisdiction {
    /// Case-insensitive lookup. Unrecognized names resolve to California LCFS,
    /// the most conservative policy.
    pub fn resolve(name: &str) -> Jurisdiction {
        name.to_lowercase()
            .parse()
            .unwrap_or(Jurisdiction::Lcfs)
    }

    pub fn strategy(&self) -> Box<dyn GapFillingStrategy> {
        match self {
            Jurisdiction::Epa => Box::new(EpaSubpartRr),
            Jurisdiction::Alberta => Box::new(AlbertaTier),
            Jurisdiction::Lcfs => Box::new(CaliforniaLcfs),
            Jurisdiction::Puro => Box::new(PuroBiochar),
        }
    }
}

/// Strategy for a jurisdiction key, defaulting to California LCFS
pub fn get_strategy(name: &str) -> Box<dyn GapFillingStrategy> {
    Jurisdiction::resolve(name).strategy()
}

/// Number of missing slots in a series
pub(crate) fn count_missing(series: &[Option<f64>]) -> usize {
    series.iter().filter(|v| v.is_none()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("epa", Jurisdiction::Epa)]
    #[case("EPA", Jurisdiction::Epa)]
    #[case("Alberta", Jurisdiction::Alberta)]
    #[case("lcfs", Jurisdiction::Lcfs)]
    #[case("PuRo", Jurisdiction::Puro)]
    #[case("quebec", Jurisdiction::Lcfs)]
    #[case("", Jurisdiction::Lcfs)]
    #[case(" epa", Jurisdiction::Lcfs)]
    fn test_resolve_jurisdiction(#[case] name: &str, #[case] expected: Jurisdiction) {
        assert_eq!(Jurisdiction::resolve(name), expected);
    }

    #[rstest]
    #[case("epa", "EPA Subpart RR")]
    #[case("ALBERTA", "Alberta TIER")]
    #[case("puro", "Puro Biochar")]
    #[case("unknown-regime", "California LCFS")]
    fn test_get_strategy_names(#[case] key: &str, #[case] name: &str) {
        assert_eq!(get_strategy(key).name(), name);
    }

    #[rstest]
    #[case::epa("epa")]
    #[case::lcfs("lcfs")]
    #[case::puro("puro")]
    fn test_all_missing_yields_zero_series(#[case] key: &str) {
        let series = vec![None; 12];
        let fill = get_strategy(key).fill(&series, &Metadata::new());
        assert_eq!(fill.series, vec![Some(0.0); 12]);
    }

    #[test]
    fn test_all_missing_alberta_tier3_requires_deviation() {
        let series = vec![None; 12];
        let fill = get_strategy("alberta").fill(&series, &Metadata::new());
        assert_eq!(fill.series, vec![None; 12]);
        assert!(fill.audit.requires_deviation());
    }

    #[test]
    fn test_audit_serialization_shape() {
        let record = AuditRecord::CaliforniaLcfs { incomplete_periods: 3 };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["strategy"], "California LCFS");
        assert_eq!(json["incomplete_periods"], 3);
    }

    #[test]
    fn test_audit_merge() {
        let a = AuditRecord::EpaSubpartRr { substitutions: 2 };
        let merged = a.merge(&AuditRecord::EpaSubpartRr { substitutions: 5 });
        assert_eq!(merged, AuditRecord::EpaSubpartRr { substitutions: 7 });

        let dev = AuditRecord::AlbertaTier { requires_deviation: false }
            .merge(&AuditRecord::AlbertaTier { requires_deviation: true });
        assert!(dev.requires_deviation());

        let mixed = AuditRecord::CaliforniaLcfs { incomplete_periods: 1 }
            .merge(&AuditRecord::EpaSubpartRr { substitutions: 9 });
        assert_eq!(mixed, AuditRecord::CaliforniaLcfs { incomplete_periods: 1 });
    }
}
