use super::explain::{Explanation, FeatureImpactExplainer};
use super::market::{AreaInsightsProvider, ComparablesProvider, MarketSeriesProvider};
use super::search::{FallbackPolicy, SearchResolver};
use super::source::{AreaInsights, DataSource};
use super::store::PropertyStore;
use super::types::{ComparableSale, MarketPoint, PropertyRecord};
use super::valuation::{ScenarioSelection, ScenarioSummary, adjusted_valuation, scenario_summary};
use crate::error::Result;

/// Read-only lookup and valuation facade over one loaded dataset.
#[derive(Debug, Clone)]
pub struct Valuer {
    store: PropertyStore,
    comparables: ComparablesProvider,
    market: MarketSeriesProvider,
    insights: AreaInsightsProvider,
    explainer: FeatureImpactExplainer,
    fallback: FallbackPolicy,
}

impl Valuer {
    pub fn from_source(source: &dyn DataSource, fallback: FallbackPolicy) -> Result<Self> {
        let dataset = source.load()?;
        let store = PropertyStore::new(dataset.properties)?;
        tracing::info!(
            properties = store.len(),
            areas = dataset.market_series.len(),
            ?fallback,
            "dataset loaded"
        );
        Ok(Self {
            store,
            comparables: ComparablesProvider::new(dataset.comparables),
            market: MarketSeriesProvider::new(dataset.market_series),
            insights: AreaInsightsProvider::new(dataset.insights),
            explainer: FeatureImpactExplainer::new(dataset.breakdowns),
            fallback,
        })
    }

    pub fn store(&self) -> &PropertyStore {
        &self.store
    }

    pub fn lookup(&self, postcode: &str) -> Result<&PropertyRecord> {
        self.store.lookup(postcode)
    }

    pub fn resolve(&self, query: &str) -> Result<&PropertyRecord> {
        SearchResolver::new(&self.store, self.fallback).resolve(query)
    }

    pub fn adjusted_valuation(&self, postcode: &str, selection: &ScenarioSelection) -> Result<u64> {
        Ok(adjusted_valuation(self.lookup(postcode)?, selection))
    }

    pub fn scenario_summary(
        &self,
        postcode: &str,
        selection: &ScenarioSelection,
    ) -> Result<ScenarioSummary> {
        Ok(scenario_summary(self.lookup(postcode)?, selection))
    }

    pub fn explain(&self, property: &PropertyRecord) -> Explanation {
        self.explainer.explain(property)
    }

    pub fn comparables_for(&self, property: &PropertyRecord) -> Vec<ComparableSale> {
        self.comparables.comparables_for(property)
    }

    pub fn series_for(&self, area: &str) -> Result<&[MarketPoint]> {
        self.market.series_for(area)
    }

    pub fn recent_series(&self, area: &str, months: usize) -> Result<&[MarketPoint]> {
        self.market.recent(area, months)
    }

    pub fn insights_for(&self, area: &str) -> Result<&AreaInsights> {
        self.insights.insights_for(area)
    }
}
