use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::types::{ComparableSale, FeatureImpact, MarketPoint, PropertyRecord};
use crate::error::{Error, Result};

/// Impact lines supplied for an area, with the area base price they are
/// measured against.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaBreakdown {
    pub base_price: u64,
    pub impacts: Vec<FeatureImpact>,
}

/// Published investment figures and notes for an area.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaInsights {
    pub annual_growth_pct: f64,
    pub rental_yield_pct: f64,
    pub highlights: Vec<AreaHighlight>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaHighlight {
    pub title: String,
    pub detail: String,
}

/// Everything a [`Valuer`](super::Valuer) is built from. Comparables, market
/// series, breakdowns and insights are keyed by area (see [`area_of`](super::area_of)).
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub properties: Vec<PropertyRecord>,
    pub comparables: BTreeMap<String, Vec<ComparableSale>>,
    pub market_series: BTreeMap<String, Vec<MarketPoint>>,
    pub breakdowns: BTreeMap<String, AreaBreakdown>,
    pub insights: BTreeMap<String, AreaInsights>,
}

pub trait DataSource {
    fn load(&self) -> Result<Dataset>;
}

pub(crate) fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::InvalidRecord(format!("bad date {year:04}-{month:02}-{day:02}")))
}
