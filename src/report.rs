//! Summaries of solved cases, for printing and writing to file.
use crate::case::{Case, ContractID, HourID};
use crate::optimisation::Solution;
use crate::solver::Termination;
use crate::units::{Dimensionless, Energy, Money, MoneyPerEnergy};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use std::fmt;

/// Total supply below which the contracting level is undefined
const MIN_TOTAL_SUPPLY: f64 = 1e-12;

/// Spot purchases and the quantities behind them in one hour
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyPurchase {
    /// The hour
    pub hour: HourID,
    /// Demand including the selected contracts
    pub demand: Energy,
    /// Own production
    pub supply: Energy,
    /// Energy bought on the spot market
    pub spot_purchase: Energy,
    /// The spot price
    pub spot_price: MoneyPerEnergy,
}

/// The figures reported for an optimal case
#[derive(Debug, Clone, PartialEq)]
pub struct CaseSummary {
    /// Contracts which were selected, in declaration order
    pub selected_contracts: Vec<ContractID>,
    /// Whether each contract was selected
    pub selection: IndexMap<ContractID, bool>,
    /// The objective value (PPA revenue minus spot costs)
    pub revenue: Money,
    /// Total energy bought on the spot market
    pub total_spot: Energy,
    /// Ratio of total demand to total own production (NaN if there is no production)
    pub contracting_level: Dimensionless,
    /// The hedge rate for the case
    pub hedge_rate: Dimensionless,
    /// Hour-by-hour breakdown of spot purchases
    pub hourly: Vec<HourlyPurchase>,
}

/// The result of solving one case
#[derive(Debug, Clone, PartialEq)]
pub struct CaseResult {
    /// The name of the case
    pub case: String,
    /// How the solve ended
    pub termination: Termination,
    /// Only present if the solve was optimal
    pub summary: Option<CaseSummary>,
}

impl CaseResult {
    /// Summarise the solution for a case
    pub fn new(case: &Case, solution: &Solution) -> Self {
        let summary = solution.values.as_ref().map(|values| {
            let selected: IndexSet<ContractID> = values.iter_selected().cloned().collect();
            let total_supply = case.total_supply();
            let contracting_level = if total_supply.value() > MIN_TOTAL_SUPPLY {
                case.total_demand(&selected) / total_supply
            } else {
                Dimensionless(f64::NAN)
            };

            let hourly = values
                .spot_purchases
                .iter()
                .map(|(hour, spot_purchase)| HourlyPurchase {
                    hour: hour.clone(),
                    demand: case.demand(hour, &selected),
                    supply: case.supply(hour),
                    spot_purchase: *spot_purchase,
                    spot_price: case.spot_price[hour],
                })
                .collect();

            CaseSummary {
                selected_contracts: selected.into_iter().collect(),
                selection: values.selection.clone(),
                revenue: values.objective,
                total_spot: values.total_spot(),
                contracting_level,
                hedge_rate: case.hedge_rate,
                hourly,
            }
        });

        Self {
            case: case.name.clone(),
            termination: solution.termination.clone(),
            summary,
        }
    }
}

impl CaseSummary {
    /// The selected contracts as a `;`-separated list
    pub fn format_selected(&self) -> String {
        self.selected_contracts.iter().join(";")
    }

    /// The selection as `contract=0|1` pairs separated by `;`
    pub fn format_selection(&self) -> String {
        self.selection
            .iter()
            .map(|(contract, selected)| format!("{contract}={}", u8::from(*selected)))
            .join(";")
    }
}

impl fmt::Display for CaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} ---", self.case)?;
        write!(f, "termination: {}", self.termination)?;
        if let Some(summary) = &self.summary {
            writeln!(f)?;
            writeln!(f, "selected_contracts: {}", summary.format_selected())?;
            writeln!(f, "y: {}", summary.format_selection())?;
            writeln!(f, "Ingresos: {}", summary.revenue)?;
            writeln!(f, "total_spot: {}", summary.total_spot)?;
            writeln!(f, "contracting_level: {}", summary.contracting_level.0)?;
            write!(f, "HedgeRate: {}", summary.hedge_rate.0)?;
        }

        Ok(())
    }
}
