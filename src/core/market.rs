use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::source::AreaInsights;
use super::types::{ComparableSale, MarketPoint, PropertyRecord, normalize_area};
use crate::error::{Error, Result};

fn by_distance_then_newest(a: &ComparableSale, b: &ComparableSale) -> Ordering {
    a.distance_km
        .total_cmp(&b.distance_km)
        .then_with(|| b.date.cmp(&a.date))
}

/// Recent sales near each area, served nearest first.
#[derive(Debug, Clone, Default)]
pub struct ComparablesProvider {
    by_area: BTreeMap<String, Vec<ComparableSale>>,
}

impl ComparablesProvider {
    pub fn new(sales: BTreeMap<String, Vec<ComparableSale>>) -> Self {
        let by_area = sales
            .into_iter()
            .map(|(area, mut sales)| {
                sales.sort_by(by_distance_then_newest);
                (normalize_area(&area), sales)
            })
            .collect();
        Self { by_area }
    }

    /// Ascending distance, ties broken by most recent sale. The subject
    /// property itself is never listed as its own comparable.
    pub fn comparables_for(&self, property: &PropertyRecord) -> Vec<ComparableSale> {
        let subject = property.address.to_lowercase();
        self.by_area
            .get(&property.area())
            .map(|sales| {
                sales
                    .iter()
                    .filter(|sale| sale.address.to_lowercase() != subject)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Monthly median price and index per area, in calendar order.
#[derive(Debug, Clone, Default)]
pub struct MarketSeriesProvider {
    by_area: BTreeMap<String, Vec<MarketPoint>>,
}

impl MarketSeriesProvider {
    pub fn new(series: BTreeMap<String, Vec<MarketPoint>>) -> Self {
        let by_area = series
            .into_iter()
            .map(|(area, mut points)| {
                points.sort_by_key(|point| point.month);
                (normalize_area(&area), points)
            })
            .collect();
        Self { by_area }
    }

    pub fn series_for(&self, area: &str) -> Result<&[MarketPoint]> {
        self.by_area
            .get(&normalize_area(area))
            .map(Vec::as_slice)
            .ok_or_else(|| Error::not_found(format!("market area {}", area.trim())))
    }

    /// The latest `months` points, still oldest first.
    pub fn recent(&self, area: &str, months: usize) -> Result<&[MarketPoint]> {
        let series = self.series_for(area)?;
        Ok(&series[series.len().saturating_sub(months)..])
    }
}

#[derive(Debug, Clone, Default)]
pub struct AreaInsightsProvider {
    by_area: BTreeMap<String, AreaInsights>,
}

impl AreaInsightsProvider {
    pub fn new(insights: BTreeMap<String, AreaInsights>) -> Self {
        let by_area = insights
            .into_iter()
            .map(|(area, insights)| (normalize_area(&area), insights))
            .collect();
        Self { by_area }
    }

    pub fn insights_for(&self, area: &str) -> Result<&AreaInsights> {
        self.by_area
            .get(&normalize_area(area))
            .ok_or_else(|| Error::not_found(format!("insights for area {}", area.trim())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{DEMO_AREA, FixtureSource};
    use crate::core::source::{DataSource, ymd};
    use crate::core::types::PropertyType;
    use proptest::prelude::{prop_assert, proptest};
    use proptest::collection::vec;

    fn sale(address: &str, day: u32, distance_km: f64) -> ComparableSale {
        ComparableSale {
            address: address.to_string(),
            price: 480_000,
            date: ymd(2024, 7, day).expect("valid date"),
            property_type: PropertyType::SemiDetached,
            bedrooms: 3,
            floor_area: 95.0,
            distance_km,
        }
    }

    #[test]
    fn fixture_comparables_are_nearest_first_with_newest_tie_break() {
        let dataset = FixtureSource.load().expect("fixtures load");
        let provider = ComparablesProvider::new(dataset.comparables);
        let sales = provider.comparables_for(&dataset.properties[0]);
        let addresses: Vec<_> = sales.iter().map(|s| s.address.as_str()).collect();
        assert_eq!(
            addresses,
            vec![
                "8 Elm Avenue, IG3 9AA",
                "22 Maple Street, IG3 9AC",
                "31 Cedar Way, IG3 9AE",
                "15 Birch Close, IG3 9AB",
                "7 Pine Gardens, IG3 9AD",
            ]
        );
    }

    #[test]
    fn subject_property_is_not_its_own_comparable() {
        let dataset = FixtureSource.load().expect("fixtures load");
        let subject = dataset.properties[0].clone();
        let mut comparables = dataset.comparables;
        if let Some(sales) = comparables.get_mut(DEMO_AREA) {
            sales.push(sale(&subject.address.to_uppercase(), 1, 0.0));
        }
        let provider = ComparablesProvider::new(comparables);
        let sales = provider.comparables_for(&subject);
        assert_eq!(sales.len(), 5);
        assert!(sales.iter().all(|s| s.distance_km > 0.0));
    }

    #[test]
    fn unknown_area_has_no_comparables() {
        let dataset = FixtureSource.load().expect("fixtures load");
        let provider = ComparablesProvider::default();
        assert!(provider.comparables_for(&dataset.properties[0]).is_empty());
    }

    #[test]
    fn series_is_sorted_by_month_whatever_the_storage_order() {
        let dataset = FixtureSource.load().expect("fixtures load");
        let mut series = dataset.market_series;
        if let Some(points) = series.get_mut(DEMO_AREA) {
            points.reverse();
            points.swap(2, 6);
        }
        let provider = MarketSeriesProvider::new(series);
        let points = provider.series_for("ig3-9").expect("known area");
        assert_eq!(points.len(), 9);
        assert_eq!(points[0].label(), "Jan 2024");
        assert_eq!(points[8].label(), "Sep 2024");
        assert!(points.windows(2).all(|pair| pair[0].month < pair[1].month));
    }

    #[test]
    fn recent_returns_the_latest_points_oldest_first() {
        let dataset = FixtureSource.load().expect("fixtures load");
        let provider = MarketSeriesProvider::new(dataset.market_series);
        let recent = provider.recent(DEMO_AREA, 6).expect("known area");
        let labels: Vec<_> = recent.iter().map(MarketPoint::label).collect();
        assert_eq!(
            labels,
            vec!["Apr 2024", "May 2024", "Jun 2024", "Jul 2024", "Aug 2024", "Sep 2024"]
        );
        assert_eq!(provider.recent(DEMO_AREA, 50).expect("known area").len(), 9);
    }

    #[test]
    fn unknown_area_series_is_not_found() {
        let provider = MarketSeriesProvider::default();
        assert!(matches!(
            provider.series_for("E1 6"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn insights_are_found_by_any_area_spelling() {
        let dataset = FixtureSource.load().expect("fixtures load");
        let provider = AreaInsightsProvider::new(dataset.insights);
        for area in ["IG3 9", "ig3-9", " ig3 9 "] {
            let insights = provider.insights_for(area).expect("known area");
            assert_eq!(insights.annual_growth_pct, 3.2);
            assert_eq!(insights.rental_yield_pct, 4.1);
            assert_eq!(insights.highlights[1].detail, "15 min to Liverpool Street");
        }
        assert!(matches!(
            provider.insights_for("E1 6"),
            Err(Error::NotFound { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_comparables_are_sorted_by_non_decreasing_distance(
            distances in vec(0u32..2_000, 0..24),
        ) {
            let dataset = FixtureSource.load().expect("fixtures load");
            let sales: Vec<_> = distances
                .iter()
                .enumerate()
                .map(|(i, &metres)| sale(&format!("{i} Test Road"), (i % 28) as u32 + 1, f64::from(metres) / 1000.0))
                .collect();
            let mut by_area = BTreeMap::new();
            by_area.insert(DEMO_AREA.to_string(), sales);
            let provider = ComparablesProvider::new(by_area);
            let out = provider.comparables_for(&dataset.properties[0]);
            let sorted = out.windows(2).all(|pair| {
                pair[0].distance_km < pair[1].distance_km
                    || (pair[0].distance_km == pair[1].distance_km && pair[0].date >= pair[1].date)
            });
            prop_assert!(out.len() == distances.len());
            prop_assert!(sorted);
        }
    }
}
