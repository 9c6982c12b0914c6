use std::collections::BTreeMap;

use serde::Serialize;

use super::source::AreaBreakdown;
use super::types::{FeatureImpact, FeatureKind, PropertyRecord};

/// Largest gap, in percentage points, tolerated between a stated line
/// percentage and impact / valuation. Supplied percentages carry one decimal.
pub const PERCENTAGE_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Discrepancy {
    /// No breakdown was supplied for the property's area.
    #[serde(rename_all = "camelCase")]
    MissingBreakdown { area: String },
    /// Base price plus impacts does not land on the property's valuation.
    #[serde(rename_all = "camelCase")]
    TotalMismatch { implied_valuation: i64, valuation: u64 },
    #[serde(rename_all = "camelCase")]
    PercentageMismatch {
        feature: FeatureKind,
        stated: f64,
        implied: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub postcode: String,
    pub valuation: u64,
    pub base_price: Option<u64>,
    pub implied_valuation: Option<i64>,
    pub impacts: Vec<FeatureImpact>,
    pub discrepancies: Vec<Discrepancy>,
    pub reconciled: bool,
}

/// Presents supplied impact lines in canonical order and checks them
/// against the property they are shown for. Values are never derived here.
#[derive(Debug, Clone, Default)]
pub struct FeatureImpactExplainer {
    breakdowns: BTreeMap<String, AreaBreakdown>,
}

impl FeatureImpactExplainer {
    pub fn new(mut breakdowns: BTreeMap<String, AreaBreakdown>) -> Self {
        for breakdown in breakdowns.values_mut() {
            breakdown.impacts.sort_by_key(|line| line.kind);
        }
        Self { breakdowns }
    }

    pub fn explain(&self, property: &PropertyRecord) -> Explanation {
        let area = property.area();
        let Some(breakdown) = self.breakdowns.get(&area) else {
            return Explanation {
                postcode: property.postcode.clone(),
                valuation: property.valuation,
                base_price: None,
                implied_valuation: None,
                impacts: Vec::new(),
                discrepancies: vec![Discrepancy::MissingBreakdown { area }],
                reconciled: false,
            };
        };

        let implied_valuation = breakdown.base_price as i64
            + breakdown.impacts.iter().map(|line| line.impact).sum::<i64>();

        let mut discrepancies = Vec::new();
        if implied_valuation != property.valuation as i64 {
            discrepancies.push(Discrepancy::TotalMismatch {
                implied_valuation,
                valuation: property.valuation,
            });
        }
        for line in &breakdown.impacts {
            let implied = line.impact as f64 / property.valuation as f64 * 100.0;
            if (implied - line.percentage).abs() > PERCENTAGE_TOLERANCE {
                discrepancies.push(Discrepancy::PercentageMismatch {
                    feature: line.kind,
                    stated: line.percentage,
                    implied: round2(implied),
                });
            }
        }

        if !discrepancies.is_empty() {
            tracing::warn!(
                postcode = %property.postcode,
                count = discrepancies.len(),
                "feature breakdown does not reconcile with valuation"
            );
        }

        Explanation {
            postcode: property.postcode.clone(),
            valuation: property.valuation,
            base_price: Some(breakdown.base_price),
            implied_valuation: Some(implied_valuation),
            impacts: breakdown.impacts.clone(),
            reconciled: discrepancies.is_empty(),
            discrepancies,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
