use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;

use super::types::{PropertyRecord, per_sqm};
use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Scenario {
    LoftConversion,
    KitchenRefurb,
    BathroomUpdate,
    Parking,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::LoftConversion,
        Scenario::KitchenRefurb,
        Scenario::BathroomUpdate,
        Scenario::Parking,
    ];

    /// Fixed valuation uplift in pounds.
    pub fn uplift(self) -> u64 {
        match self {
            Scenario::LoftConversion => 45_000,
            Scenario::KitchenRefurb => 18_000,
            Scenario::BathroomUpdate => 12_000,
            Scenario::Parking => 8_000,
        }
    }

    /// Indicative build cost in pounds.
    pub fn cost(self) -> u64 {
        match self {
            Scenario::LoftConversion => 25_000,
            Scenario::KitchenRefurb => 12_000,
            Scenario::BathroomUpdate => 8_000,
            Scenario::Parking => 5_000,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Scenario::LoftConversion => "loftConversion",
            Scenario::KitchenRefurb => "kitchenRefurb",
            Scenario::BathroomUpdate => "bathroomUpdate",
            Scenario::Parking => "parking",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Scenario::LoftConversion => "Loft Conversion",
            Scenario::KitchenRefurb => "Kitchen Refurbishment",
            Scenario::BathroomUpdate => "Bathroom Update",
            Scenario::Parking => "Add Parking Space",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Scenario::LoftConversion => "Add bedroom and bathroom in loft space",
            Scenario::KitchenRefurb => "Modern fitted kitchen with quality appliances",
            Scenario::BathroomUpdate => "Contemporary bathroom suite with quality fittings",
            Scenario::Parking => "Convert front garden to parking space",
        }
    }
}

impl FromStr for Scenario {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let folded: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "loftconversion" | "loft" => Ok(Scenario::LoftConversion),
            "kitchenrefurb" | "kitchenrefurbishment" | "kitchen" => Ok(Scenario::KitchenRefurb),
            "bathroomupdate" | "bathroom" => Ok(Scenario::BathroomUpdate),
            "parking" | "addedparking" | "addparking" => Ok(Scenario::Parking),
            _ => Err(Error::InvalidInput(format!("unknown scenario flag {raw:?}"))),
        }
    }
}

/// Improvement toggles for one session. Any flag may be set or cleared in
/// any order; flags never interact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioSelection {
    flags: BTreeMap<Scenario, bool>,
}

impl ScenarioSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a wire-format flag map. Unknown flag names are rejected rather
    /// than ignored.
    pub fn from_flags<'a, I>(flags: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let mut selection = Self::new();
        for (name, on) in flags {
            selection.set(name.parse()?, on);
        }
        Ok(selection)
    }

    pub fn set(&mut self, scenario: Scenario, on: bool) {
        self.flags.insert(scenario, on);
    }

    pub fn toggle(&mut self, scenario: Scenario) -> bool {
        let on = !self.is_enabled(scenario);
        self.set(scenario, on);
        on
    }

    pub fn is_enabled(&self, scenario: Scenario) -> bool {
        self.flags.get(&scenario).copied().unwrap_or(false)
    }

    pub fn enabled(&self) -> impl Iterator<Item = Scenario> + '_ {
        self.flags
            .iter()
            .filter(|&(_, &on)| on)
            .map(|(&scenario, _)| scenario)
    }

    pub fn clear(&mut self) {
        self.flags.clear();
    }
}

/// Saturates at `u64::MAX` for a source that supplies an extreme valuation.
pub fn adjusted_valuation(property: &PropertyRecord, selection: &ScenarioSelection) -> u64 {
    property
        .valuation
        .saturating_add(selection.enabled().map(Scenario::uplift).sum::<u64>())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    pub postcode: String,
    pub base_valuation: u64,
    pub uplift: u64,
    pub cost: u64,
    pub net_gain: i64,
    pub adjusted_valuation: u64,
    pub enabled: Vec<Scenario>,
}

pub fn scenario_summary(property: &PropertyRecord, selection: &ScenarioSelection) -> ScenarioSummary {
    let enabled: Vec<Scenario> = selection.enabled().collect();
    let uplift: u64 = enabled.iter().map(|s| s.uplift()).sum();
    let cost: u64 = enabled.iter().map(|s| s.cost()).sum();
    ScenarioSummary {
        postcode: property.postcode.clone(),
        base_valuation: property.valuation,
        uplift,
        cost,
        net_gain: uplift as i64 - cost as i64,
        adjusted_valuation: adjusted_valuation(property, selection),
        enabled,
    }
}

pub fn price_per_sqm(property: &PropertyRecord) -> u64 {
    per_sqm(property.valuation, property.floor_area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::FixtureSource;
    use crate::core::source::DataSource;
    use proptest::prelude::{any, prop_assert, prop_assert_eq, proptest};

    fn elm_avenue() -> PropertyRecord {
        FixtureSource.load().expect("fixtures load").properties[0].clone()
    }

    fn selection_from_bits(bits: [bool; 4]) -> ScenarioSelection {
        let mut selection = ScenarioSelection::new();
        for (scenario, on) in Scenario::ALL.into_iter().zip(bits) {
            selection.set(scenario, on);
        }
        selection
    }

    #[test]
    fn empty_selection_keeps_base_valuation() {
        let property = elm_avenue();
        assert_eq!(adjusted_valuation(&property, &ScenarioSelection::new()), 485_000);
    }

    #[test]
    fn loft_and_kitchen_add_up() {
        let property = elm_avenue();
        let mut selection = ScenarioSelection::new();
        selection.set(Scenario::LoftConversion, true);
        selection.set(Scenario::KitchenRefurb, true);
        assert_eq!(adjusted_valuation(&property, &selection), 548_000);
    }

    #[test]
    fn cleared_flags_contribute_nothing() {
        let property = elm_avenue();
        let mut selection = ScenarioSelection::new();
        selection.set(Scenario::Parking, true);
        selection.set(Scenario::Parking, false);
        assert!(selection.toggle(Scenario::BathroomUpdate));
        assert_eq!(adjusted_valuation(&property, &selection), 497_000);
        selection.toggle(Scenario::BathroomUpdate);
        assert_eq!(adjusted_valuation(&property, &selection), 485_000);
    }

    #[test]
    fn adjustment_saturates_instead_of_overflowing() {
        let mut property = elm_avenue();
        property.valuation = u64::MAX - 10_000;
        let selection = selection_from_bits([true, true, true, true]);
        assert_eq!(adjusted_valuation(&property, &selection), u64::MAX);
        assert_eq!(scenario_summary(&property, &selection).adjusted_valuation, u64::MAX);
    }

    #[test]
    fn clear_switches_every_flag_off() {
        let mut selection = selection_from_bits([true, false, true, true]);
        selection.clear();
        assert_eq!(selection.enabled().count(), 0);
        assert_eq!(adjusted_valuation(&elm_avenue(), &selection), 485_000);
    }

    #[test]
    fn summary_reports_cost_and_net_gain() {
        let property = elm_avenue();
        let selection = selection_from_bits([true, true, true, true]);
        let summary = scenario_summary(&property, &selection);
        assert_eq!(summary.uplift, 83_000);
        assert_eq!(summary.cost, 50_000);
        assert_eq!(summary.net_gain, 33_000);
        assert_eq!(summary.adjusted_valuation, 568_000);
        assert_eq!(summary.enabled, Scenario::ALL.to_vec());
    }

    #[test]
    fn flags_parse_from_wire_aliases() {
        let selection = ScenarioSelection::from_flags([
            ("loftConversion", true),
            ("kitchen-refurbishment", true),
            ("bathroom_update", false),
            ("addedParking", true),
        ])
        .expect("known flags");
        let enabled: Vec<_> = selection.enabled().collect();
        assert_eq!(
            enabled,
            vec![Scenario::LoftConversion, Scenario::KitchenRefurb, Scenario::Parking]
        );
    }

    #[test]
    fn unknown_flag_is_invalid_input() {
        let err = ScenarioSelection::from_flags([("swimmingPool", true)]).expect_err("unknown");
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn price_per_sqm_of_elm_avenue() {
        assert_eq!(price_per_sqm(&elm_avenue()), 5105);
    }

    proptest! {
        #[test]
        fn prop_adjustment_is_base_plus_enabled_uplifts(
            bits in any::<[bool; 4]>(),
            base in 1u64..5_000_000,
        ) {
            let mut property = elm_avenue();
            property.valuation = base;
            let selection = selection_from_bits(bits);
            let expected: u64 = Scenario::ALL
                .into_iter()
                .zip(bits)
                .filter(|&(_, on)| on)
                .map(|(s, _)| s.uplift())
                .sum();
            prop_assert_eq!(adjusted_valuation(&property, &selection), base + expected);
        }

        #[test]
        fn prop_enabling_a_flag_never_lowers_the_valuation(
            bits in any::<[bool; 4]>(),
            extra in 0usize..4,
        ) {
            let property = elm_avenue();
            let before = selection_from_bits(bits);
            let mut after = before.clone();
            after.set(Scenario::ALL[extra], true);
            prop_assert!(adjusted_valuation(&property, &after) >= adjusted_valuation(&property, &before));
        }
    }
}
