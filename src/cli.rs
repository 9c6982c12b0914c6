use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write;
use std::net::SocketAddr;

use crate::config::Config;
use crate::core::{
    Discrepancy, FallbackPolicy, FixtureSource, Scenario, Session, Tab, Valuer, price_per_sqm,
};
use crate::error::{Error, Result};

const TREND_MONTHS: usize = 6;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliFallback {
    Default,
    NotFound,
}

impl From<CliFallback> for FallbackPolicy {
    fn from(value: CliFallback) -> Self {
        match value {
            CliFallback::Default => FallbackPolicy::Default,
            CliFallback::NotFound => FallbackPolicy::NotFound,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliTab {
    Valuation,
    Comparables,
    Scenarios,
    Trends,
}

impl From<CliTab> for Tab {
    fn from(value: CliTab) -> Self {
        match value {
            CliTab::Valuation => Tab::Valuation,
            CliTab::Comparables => Tab::Comparables,
            CliTab::Scenarios => Tab::Scenarios,
            CliTab::Trends => Tab::Trends,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "valuer",
    about = "Property valuation lookup and improvement scenarios for the IG3 9 sector"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        help = "What a search with no match returns; overrides VALUER_SEARCH_FALLBACK"
    )]
    fallback: Option<CliFallback>,
    #[arg(
        long,
        global = true,
        help = "Emit logs as JSON lines; overrides VALUER_LOG_JSON"
    )]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API
    Serve {
        #[arg(long, help = "Listen address, defaults to VALUER_BIND or 0.0.0.0:8080")]
        bind: Option<SocketAddr>,
        #[arg(long, help = "Override the port of the listen address")]
        port: Option<u16>,
    },
    /// Resolve a postcode or address and print the record as JSON
    Search { query: String },
    /// Print a text valuation report
    Report {
        query: String,
        #[arg(long, value_enum, help = "Only render this tab")]
        tab: Option<CliTab>,
        #[arg(long)]
        loft_conversion: bool,
        #[arg(long)]
        kitchen_refurb: bool,
        #[arg(long)]
        bathroom_update: bool,
        #[arg(long)]
        parking: bool,
    },
}

pub enum Action {
    Serve { valuer: Valuer, addr: SocketAddr },
    Print(String),
}

impl Cli {
    /// Environment config with command line overrides applied.
    pub fn config(&self) -> Result<Config> {
        let mut config = Config::from_env()?;
        if let Some(fallback) = self.fallback {
            config.fallback = fallback.into();
        }
        if self.log_json {
            config.log_json = true;
        }
        if let Command::Serve { bind, port } = &self.command {
            if let Some(bind) = bind {
                config.bind = *bind;
            }
            if let Some(port) = port {
                config.bind.set_port(*port);
            }
        }
        Ok(config)
    }

    pub fn into_action(self, config: &Config) -> Result<Action> {
        let valuer = Valuer::from_source(&FixtureSource, config.fallback)?;
        match self.command {
            Command::Serve { .. } => Ok(Action::Serve {
                valuer,
                addr: config.bind,
            }),
            Command::Search { query } => {
                let property = valuer.resolve(&query)?;
                let json = serde_json::to_string_pretty(property)
                    .map_err(|e| Error::InvalidRecord(e.to_string()))?;
                Ok(Action::Print(json))
            }
            Command::Report {
                query,
                tab,
                loft_conversion,
                kitchen_refurb,
                bathroom_update,
                parking,
            } => {
                let mut session = Session::new(&valuer);
                session.search(&query)?;
                for (scenario, on) in [
                    (Scenario::LoftConversion, loft_conversion),
                    (Scenario::KitchenRefurb, kitchen_refurb),
                    (Scenario::BathroomUpdate, bathroom_update),
                    (Scenario::Parking, parking),
                ] {
                    session.set_scenario(scenario, on);
                }
                let tabs: Vec<Tab> = match tab {
                    Some(tab) => vec![tab.into()],
                    None => Tab::ALL.to_vec(),
                };
                Ok(Action::Print(render_report(&valuer, &mut session, &tabs)?))
            }
        }
    }
}

/// `£485,000`, with a leading minus for negative amounts.
pub fn format_price(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-£{grouped}")
    } else {
        format!("£{grouped}")
    }
}

fn signed_price(amount: i64) -> String {
    if amount >= 0 {
        format!("+{}", format_price(amount))
    } else {
        format_price(amount)
    }
}

pub fn render_report(valuer: &Valuer, session: &mut Session<'_>, tabs: &[Tab]) -> Result<String> {
    let mut out = String::new();
    let property = session.selected();
    writeln!(out, "{}", property.address)?;
    writeln!(
        out,
        "{} • {} bed • {} bath • {}m²",
        property.property_type.label(),
        property.bedrooms,
        property.bathrooms,
        property.floor_area
    )?;
    writeln!(
        out,
        "Estimated value {} ({}% confidence, {}/5)",
        format_price(session.adjusted_valuation() as i64),
        property.confidence,
        property.confidence_stars()
    )?;

    for &tab in tabs {
        session.select_tab(tab);
        writeln!(out, "\n== {} ==", tab.title())?;
        match tab {
            Tab::Valuation => render_valuation(valuer, session, &mut out)?,
            Tab::Comparables => render_comparables(valuer, session, &mut out)?,
            Tab::Scenarios => render_scenarios(session, &mut out)?,
            Tab::Trends => render_trends(valuer, session, &mut out)?,
        }
    }
    Ok(out)
}

fn render_valuation(
    valuer: &Valuer,
    session: &Session<'_>,
    out: &mut impl Write,
) -> Result<()> {
    let property = session.selected();
    let explanation = valuer.explain(property);
    for line in &explanation.impacts {
        writeln!(
            out,
            "  {:<24} {:>10} ({:+.1}%)",
            line.label,
            signed_price(line.impact),
            line.percentage
        )?;
    }
    writeln!(out, "  Final valuation: {}", format_price(property.valuation as i64))?;
    writeln!(
        out,
        "  Price per m²: {}",
        format_price(price_per_sqm(property) as i64)
    )?;
    if let Ok(insights) = valuer.insights_for(&property.area()) {
        writeln!(out, "  Annual growth: {:+.1}%", insights.annual_growth_pct)?;
        writeln!(out, "  Est. rental yield: {:.1}%", insights.rental_yield_pct)?;
    }
    for discrepancy in &explanation.discrepancies {
        let note = match discrepancy {
            Discrepancy::MissingBreakdown { area } => {
                format!("no breakdown published for {area}")
            }
            Discrepancy::TotalMismatch {
                implied_valuation,
                valuation,
            } => format!(
                "breakdown sums to {} but valuation is {}",
                format_price(*implied_valuation),
                format_price(*valuation as i64)
            ),
            Discrepancy::PercentageMismatch {
                feature,
                stated,
                implied,
            } => format!("{feature:?} stated {stated:+.1}% but implies {implied:+.2}%"),
        };
        writeln!(out, "  warning: {note}")?;
    }
    Ok(())
}

fn render_comparables(
    valuer: &Valuer,
    session: &Session<'_>,
    out: &mut impl Write,
) -> Result<()> {
    for sale in valuer.comparables_for(session.selected()) {
        writeln!(
            out,
            "  {} | {} bed | {}m² | {}km | sold {} | {} ({}/m²)",
            sale.address,
            sale.bedrooms,
            sale.floor_area,
            sale.distance_km,
            sale.date,
            format_price(sale.price as i64),
            format_price(sale.price_per_sqm() as i64)
        )?;
    }
    Ok(())
}

fn render_scenarios(session: &Session<'_>, out: &mut impl Write) -> Result<()> {
    for scenario in Scenario::ALL {
        let mark = if session.scenarios().is_enabled(scenario) {
            "x"
        } else {
            " "
        };
        writeln!(
            out,
            "  [{mark}] {:<22} cost {:>8}  impact {:>9}",
            scenario.label(),
            format_price(scenario.cost() as i64),
            signed_price(scenario.uplift() as i64)
        )?;
    }
    let base = session.selected().valuation;
    let adjusted = session.adjusted_valuation();
    write!(out, "  Updated valuation: {}", format_price(adjusted as i64))?;
    if adjusted > base {
        write!(out, " ({} increase)", signed_price((adjusted - base) as i64))?;
    }
    writeln!(out)?;
    Ok(())
}

fn render_trends(
    valuer: &Valuer,
    session: &Session<'_>,
    out: &mut impl Write,
) -> Result<()> {
    let area = session.selected().area();
    for point in valuer.recent_series(&area, TREND_MONTHS)? {
        writeln!(
            out,
            "  {:<9} {:>9}  index {:.1}",
            point.label(),
            format_price(point.median_price as i64),
            point.index
        )?;
    }
    if let Ok(insights) = valuer.insights_for(&area) {
        writeln!(out, "  Area insights:")?;
        for highlight in &insights.highlights {
            writeln!(out, "    {}: {}", highlight.title, highlight.detail)?;
        }
    }
    Ok(())
}
