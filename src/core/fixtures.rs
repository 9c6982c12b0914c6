use std::collections::BTreeMap;

use super::source::{AreaBreakdown, AreaHighlight, AreaInsights, DataSource, Dataset, ymd};
use super::types::{
    ComparableSale, Condition, Coordinates, FeatureImpact, FeatureKind, Features, MarketPoint,
    Parking, PropertyRecord, PropertyType,
};
use crate::error::Result;

pub const DEMO_AREA: &str = "IG3 9";

/// Static demo data for the IG3 9 sector of Redbridge.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureSource;

impl DataSource for FixtureSource {
    fn load(&self) -> Result<Dataset> {
        let mut comparables = BTreeMap::new();
        comparables.insert(DEMO_AREA.to_string(), comparables_fixture()?);
        let mut market_series = BTreeMap::new();
        market_series.insert(DEMO_AREA.to_string(), market_fixture()?);
        let mut breakdowns = BTreeMap::new();
        breakdowns.insert(DEMO_AREA.to_string(), breakdown_fixture());
        let mut insights = BTreeMap::new();
        insights.insert(DEMO_AREA.to_string(), insights_fixture());

        Ok(Dataset {
            properties: properties_fixture()?,
            comparables,
            market_series,
            breakdowns,
            insights,
        })
    }
}

fn properties_fixture() -> Result<Vec<PropertyRecord>> {
    Ok(vec![
        PropertyRecord {
            postcode: "IG3 9AA".to_string(),
            address: "12 Elm Avenue, Redbridge, IG3 9AA".to_string(),
            property_type: PropertyType::SemiDetached,
            bedrooms: 3,
            bathrooms: 2,
            floor_area: 95.0,
            valuation: 485_000,
            confidence: 92,
            last_sold: ymd(2019, 3, 15)?,
            last_price: 425_000,
            coordinates: Coordinates {
                lat: 51.5590,
                lng: 0.0821,
            },
            features: Features {
                condition: Condition::Good,
                parking: Parking::Driveway,
                garden: "Rear garden".to_string(),
                heating: "Gas central heating".to_string(),
            },
        },
        PropertyRecord {
            postcode: "IG3 9BB".to_string(),
            address: "45 Oak Road, Redbridge, IG3 9BB".to_string(),
            property_type: PropertyType::Terraced,
            bedrooms: 2,
            bathrooms: 1,
            floor_area: 72.0,
            valuation: 395_000,
            confidence: 89,
            last_sold: ymd(2020, 11, 22)?,
            last_price: 375_000,
            coordinates: Coordinates {
                lat: 51.5595,
                lng: 0.0815,
            },
            features: Features {
                condition: Condition::Fair,
                parking: Parking::Street,
                garden: "Small rear garden".to_string(),
                heating: "Gas central heating".to_string(),
            },
        },
    ])
}

fn comparables_fixture() -> Result<Vec<ComparableSale>> {
    let sale = |address: &str, price, date, bedrooms, floor_area, distance_km| ComparableSale {
        address: address.to_string(),
        price,
        date,
        property_type: PropertyType::SemiDetached,
        bedrooms,
        floor_area,
        distance_km,
    };
    Ok(vec![
        sale("8 Elm Avenue, IG3 9AA", 475_000, ymd(2024, 7, 15)?, 3, 92.0, 0.1),
        sale("15 Birch Close, IG3 9AB", 492_000, ymd(2024, 6, 3)?, 3, 98.0, 0.3),
        sale("22 Maple Street, IG3 9AC", 468_000, ymd(2024, 8, 20)?, 3, 89.0, 0.2),
        sale("7 Pine Gardens, IG3 9AD", 501_000, ymd(2024, 5, 18)?, 4, 105.0, 0.4),
        sale("31 Cedar Way, IG3 9AE", 479_000, ymd(2024, 7, 28)?, 3, 94.0, 0.2),
    ])
}

fn market_fixture() -> Result<Vec<MarketPoint>> {
    let rows: [(u32, u64, f64); 9] = [
        (1, 465_000, 145.2),
        (2, 468_000, 146.1),
        (3, 472_000, 147.3),
        (4, 478_000, 149.1),
        (5, 482_000, 150.4),
        (6, 485_000, 151.3),
        (7, 487_000, 152.0),
        (8, 485_000, 151.3),
        (9, 485_000, 151.3),
    ];
    rows.into_iter()
        .map(|(month, median_price, index)| {
            Ok(MarketPoint {
                month: ymd(2024, month, 1)?,
                median_price,
                index,
            })
        })
        .collect()
}

// The modelling collaborator publishes one breakdown for the whole sector,
// measured against a 3-bed semi on a driveway. It reconciles for IG3 9AA
// only; the explainer reports the mismatch for anything else.
fn breakdown_fixture() -> AreaBreakdown {
    let line = |kind, label: &str, impact, percentage| FeatureImpact {
        kind,
        label: label.to_string(),
        impact,
        percentage,
    };
    AreaBreakdown {
        base_price: 450_000,
        impacts: vec![
            line(FeatureKind::FloorArea, "Floor Area (95m²)", 25_000, 5.2),
            line(FeatureKind::Bedrooms, "3 Bedrooms", 15_000, 3.1),
            line(FeatureKind::Condition, "Good Condition", 8_000, 1.6),
            line(FeatureKind::Parking, "Driveway Parking", 7_000, 1.4),
            line(FeatureKind::LocationPremium, "Location Premium", -20_000, -4.1),
        ],
    }
}

fn insights_fixture() -> AreaInsights {
    let highlight = |title: &str, detail: &str| AreaHighlight {
        title: title.to_string(),
        detail: detail.to_string(),
    };
    AreaInsights {
        annual_growth_pct: 3.2,
        rental_yield_pct: 4.1,
        highlights: vec![
            highlight("Strong Growth Area", "12% increase over 2 years"),
            highlight("Good Transport Links", "15 min to Liverpool Street"),
            highlight("Good Schools", "3 Outstanding schools nearby"),
        ],
    }
}
