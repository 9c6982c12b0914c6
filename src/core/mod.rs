mod explain;
mod fixtures;
mod market;
mod search;
mod session;
mod source;
mod store;
mod types;
mod valuation;
mod valuer;

pub use explain::{Discrepancy, Explanation, FeatureImpactExplainer, PERCENTAGE_TOLERANCE};
pub use fixtures::{DEMO_AREA, FixtureSource};
pub use market::{AreaInsightsProvider, ComparablesProvider, MarketSeriesProvider};
pub use search::{FallbackPolicy, MAX_QUERY_LEN, SearchResolver};
pub use session::{Session, Tab};
pub use source::{AreaBreakdown, AreaHighlight, AreaInsights, DataSource, Dataset};
pub use store::PropertyStore;
pub use types::{
    ComparableSale, Condition, Coordinates, FeatureImpact, FeatureKind, Features, MarketPoint,
    Parking, PropertyRecord, PropertyType, area_of, normalize_area,
};
pub use valuation::{
    Scenario, ScenarioSelection, ScenarioSummary, adjusted_valuation, price_per_sqm,
    scenario_summary,
};
pub use valuer::Valuer;
