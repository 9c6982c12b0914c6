use std::str::FromStr;

use serde::Serialize;

use super::types::PropertyRecord;
use super::valuation::{Scenario, ScenarioSelection, adjusted_valuation};
use super::valuer::Valuer;
use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    #[default]
    Valuation,
    Comparables,
    Scenarios,
    Trends,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Valuation, Tab::Comparables, Tab::Scenarios, Tab::Trends];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Valuation => "Explainable Valuation",
            Tab::Comparables => "Comparables",
            Tab::Scenarios => "Scenario Modelling",
            Tab::Trends => "Market Trends",
        }
    }
}

impl FromStr for Tab {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "valuation" | "breakdown" => Ok(Tab::Valuation),
            "comparables" => Ok(Tab::Comparables),
            "scenarios" | "scenario" => Ok(Tab::Scenarios),
            "trends" | "market" => Ok(Tab::Trends),
            other => Err(Error::InvalidInput(format!("unknown tab {other:?}"))),
        }
    }
}

/// One viewer's state: the last query, the property on screen, the open tab
/// and the improvement toggles.
#[derive(Debug)]
pub struct Session<'a> {
    valuer: &'a Valuer,
    query: String,
    selected: &'a PropertyRecord,
    active_tab: Tab,
    scenarios: ScenarioSelection,
}

impl<'a> Session<'a> {
    /// Starts on the store's default property.
    pub fn new(valuer: &'a Valuer) -> Self {
        Self {
            valuer,
            query: String::new(),
            selected: valuer.store().default_property(),
            active_tab: Tab::default(),
            scenarios: ScenarioSelection::new(),
        }
    }

    /// Runs a search and selects the result. On error the previous selection
    /// stays on screen. Scenario toggles carry over to the new property.
    pub fn search(&mut self, query: &str) -> Result<&'a PropertyRecord> {
        self.query = query.to_string();
        let found = self.valuer.resolve(query)?;
        self.selected = found;
        Ok(found)
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    pub fn set_scenario(&mut self, scenario: Scenario, on: bool) {
        self.scenarios.set(scenario, on);
    }

    pub fn toggle(&mut self, scenario: Scenario) -> bool {
        self.scenarios.toggle(scenario)
    }

    /// Switches every improvement off; the selection and tab are kept.
    pub fn reset_scenarios(&mut self) {
        self.scenarios.clear();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selected(&self) -> &'a PropertyRecord {
        self.selected
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn scenarios(&self) -> &ScenarioSelection {
        &self.scenarios
    }

    pub fn adjusted_valuation(&self) -> u64 {
        adjusted_valuation(self.selected, &self.scenarios)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::FixtureSource;
    use crate::core::search::FallbackPolicy;

    fn valuer(fallback: FallbackPolicy) -> Valuer {
        Valuer::from_source(&FixtureSource, fallback).expect("valuer")
    }

    #[test]
    fn new_session_shows_default_property_on_valuation_tab() {
        let valuer = valuer(FallbackPolicy::Default);
        let session = Session::new(&valuer);
        assert_eq!(session.selected().postcode, "IG3 9AA");
        assert_eq!(session.active_tab(), Tab::Valuation);
        assert_eq!(session.adjusted_valuation(), 485_000);
    }

    #[test]
    fn toggles_survive_a_new_search() {
        let valuer = valuer(FallbackPolicy::Default);
        let mut session = Session::new(&valuer);
        session.set_scenario(Scenario::LoftConversion, true);
        session.toggle(Scenario::Parking);
        session.search("Oak Road").expect("match");
        assert_eq!(session.selected().postcode, "IG3 9BB");
        assert_eq!(session.adjusted_valuation(), 395_000 + 45_000 + 8_000);
        session.toggle(Scenario::Parking);
        assert_eq!(session.adjusted_valuation(), 440_000);
    }

    #[test]
    fn reset_scenarios_restores_the_published_valuation() {
        let valuer = valuer(FallbackPolicy::Default);
        let mut session = Session::new(&valuer);
        session.search("IG3 9BB").expect("match");
        session.select_tab(Tab::Scenarios);
        for scenario in Scenario::ALL {
            session.set_scenario(scenario, true);
        }
        assert_eq!(session.adjusted_valuation(), 478_000);
        session.reset_scenarios();
        assert_eq!(session.adjusted_valuation(), 395_000);
        assert_eq!(session.scenarios().enabled().count(), 0);
        assert_eq!(session.selected().postcode, "IG3 9BB");
        assert_eq!(session.active_tab(), Tab::Scenarios);
    }

    #[test]
    fn failed_search_keeps_previous_selection() {
        let valuer = valuer(FallbackPolicy::NotFound);
        let mut session = Session::new(&valuer);
        session.search("IG3 9BB").expect("match");
        assert!(session.search("nonexistent postcode").is_err());
        assert_eq!(session.selected().postcode, "IG3 9BB");
        assert_eq!(session.query(), "nonexistent postcode");
    }

    #[test]
    fn tabs_parse_and_switch_freely() {
        let valuer = valuer(FallbackPolicy::Default);
        let mut session = Session::new(&valuer);
        for tab in Tab::ALL.into_iter().rev() {
            session.select_tab(tab);
            assert_eq!(session.active_tab(), tab);
        }
        assert_eq!("Trends".parse::<Tab>(), Ok(Tab::Trends));
        assert!("settings".parse::<Tab>().is_err());
    }
}
