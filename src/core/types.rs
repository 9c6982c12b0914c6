use chrono::NaiveDate;
use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyType {
    Detached,
    SemiDetached,
    Terraced,
    Flat,
}

impl PropertyType {
    pub fn label(self) -> &'static str {
        match self {
            PropertyType::Detached => "Detached",
            PropertyType::SemiDetached => "Semi-detached",
            PropertyType::Terraced => "Terraced",
            PropertyType::Flat => "Flat",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Condition {
    pub fn label(self) -> &'static str {
        match self {
            Condition::Excellent => "Excellent",
            Condition::Good => "Good",
            Condition::Fair => "Fair",
            Condition::Poor => "Poor",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Parking {
    Garage,
    Driveway,
    Allocated,
    Street,
    None,
}

impl Parking {
    pub fn label(self) -> &'static str {
        match self {
            Parking::Garage => "Garage",
            Parking::Driveway => "Driveway",
            Parking::Allocated => "Allocated space",
            Parking::Street => "Street parking",
            Parking::None => "No parking",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    pub condition: Condition,
    pub parking: Parking,
    pub garden: String,
    pub heating: String,
}

/// A valued property. Records come from a [`DataSource`](super::DataSource)
/// and are never mutated once a store has been built from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub postcode: String,
    pub address: String,
    pub property_type: PropertyType,
    pub bedrooms: u32,
    pub bathrooms: u32,
    /// Internal floor area in m².
    pub floor_area: f64,
    pub valuation: u64,
    /// Supplied reliability score, 0 to 100.
    pub confidence: u8,
    pub last_sold: NaiveDate,
    pub last_price: u64,
    pub coordinates: Coordinates,
    pub features: Features,
}

impl PropertyRecord {
    pub fn area(&self) -> String {
        area_of(&self.postcode)
    }

    /// Whole stars out of five, as shown next to the confidence score.
    pub fn confidence_stars(&self) -> u8 {
        self.confidence / 20
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparableSale {
    pub address: String,
    pub price: u64,
    pub date: NaiveDate,
    pub property_type: PropertyType,
    pub bedrooms: u32,
    pub floor_area: f64,
    pub distance_km: f64,
}

impl ComparableSale {
    pub fn price_per_sqm(&self) -> u64 {
        per_sqm(self.price, self.floor_area)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketPoint {
    /// First day of the calendar month the point covers.
    pub month: NaiveDate,
    pub median_price: u64,
    pub index: f64,
}

impl MarketPoint {
    pub fn label(&self) -> String {
        self.month.format("%b %Y").to_string()
    }
}

/// Canonical explanation order; a breakdown is always presented in the
/// order these variants are declared.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureKind {
    FloorArea,
    Bedrooms,
    Condition,
    Parking,
    LocationPremium,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureImpact {
    pub kind: FeatureKind,
    pub label: String,
    pub impact: i64,
    pub percentage: f64,
}

pub(crate) fn per_sqm(price: u64, floor_area: f64) -> u64 {
    if floor_area <= 0.0 {
        return 0;
    }
    (price as f64 / floor_area).round() as u64
}

/// Collapses separators and case so "ig3-9", "IG3+9" and " IG3  9 " agree.
pub fn normalize_area(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '-' || c == '+')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Postcode sector: the outward code plus the first character of the
/// inward code, e.g. "IG3 9AA" -> "IG3 9".
pub fn area_of(postcode: &str) -> String {
    let normalized = normalize_area(postcode);
    match normalized.split_once(' ') {
        Some((outward, inward)) => match inward.chars().next() {
            Some(sector) => format!("{outward} {sector}"),
            None => outward.to_string(),
        },
        None => normalized,
    }
}
