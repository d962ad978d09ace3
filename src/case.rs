//! The data for a deterministic case: hours, candidate contracts and renewable projects.
use crate::id::{IDCollection, IDLike, define_id_type, ids_from_members};
use crate::input::dat::{DatFile, ParamValue};
use crate::units::{Dimensionless, Energy, MoneyPerEnergy};
use anyhow::{Context, Result, bail};
use indexmap::{IndexMap, IndexSet};
use log::warn;
use std::borrow::Borrow;

define_id_type! {HourID}
define_id_type! {ContractID}
define_id_type! {ProjectID}

/// Set of hours in the day
pub const HOURS_SET: &str = "HORAS";
/// Set of candidate PPAs
pub const CONTRACTS_SET: &str = "CONTRATOS";
/// Set of renewable projects
pub const PROJECTS_SET: &str = "PRY_RER";
/// Demand of the existing portfolio, by hour
pub const PORTFOLIO_DEMAND_PARAM: &str = "DemandaPortafolioActual";
/// Demand of each candidate PPA, by hour and contract
pub const PPA_DEMAND_PARAM: &str = "DemandaPPA";
/// Conventional production, by hour
pub const CONVENTIONAL_PRODUCTION_PARAM: &str = "Produccion_Convencional";
/// Renewable production, by hour and project
pub const RENEWABLE_PRODUCTION_PARAM: &str = "Produccion_RER";
/// Price of each candidate PPA
pub const PPA_PRICE_PARAM: &str = "PrecioPPA";
/// Spot price, by hour
pub const SPOT_PRICE_PARAM: &str = "PrecioSpot";
/// Maximum ratio of daily demand to daily supply
pub const HEDGE_RATE_PARAM: &str = "HedgeRate";

/// Validated data for a single case
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    /// The name of the case (usually the file name)
    pub name: String,
    /// The hours of the day being scheduled
    pub hours: IndexSet<HourID>,
    /// The candidate PPAs
    pub contracts: IndexSet<ContractID>,
    /// The renewable projects
    pub projects: IndexSet<ProjectID>,
    /// Demand of the existing portfolio in each hour
    pub portfolio_demand: IndexMap<HourID, Energy>,
    /// Demand of each candidate PPA in each hour
    pub ppa_demand: IndexMap<(HourID, ContractID), Energy>,
    /// Conventional production in each hour
    pub conventional_production: IndexMap<HourID, Energy>,
    /// Production of each renewable project in each hour
    pub renewable_production: IndexMap<(HourID, ProjectID), Energy>,
    /// The price for each candidate PPA
    pub ppa_price: IndexMap<ContractID, MoneyPerEnergy>,
    /// The spot price in each hour
    pub spot_price: IndexMap<HourID, MoneyPerEnergy>,
    /// Maximum ratio of total demand to total supply over the day
    pub hedge_rate: Dimensionless,
}

impl Case {
    /// Create a case from the sets and parameters in a data file.
    ///
    /// Every parameter must have a value for every combination of members of the sets it is
    /// indexed over, and no others.
    pub fn from_dat(name: &str, dat: &DatFile) -> Result<Self> {
        let hours: IndexSet<HourID> = read_set(dat, HOURS_SET)?;
        let contracts: IndexSet<ContractID> = read_set(dat, CONTRACTS_SET)?;
        let projects: IndexSet<ProjectID> = read_set(dat, PROJECTS_SET)?;

        let hedge_rate = read_scalar(dat, HEDGE_RATE_PARAM)?;
        if !(0.0..=1.0).contains(&hedge_rate) {
            warn!("{name}: {HEDGE_RATE_PARAM} is {hedge_rate}, which is outside the range [0, 1]");
        }

        Ok(Self {
            name: name.to_string(),
            portfolio_demand: read_indexed(dat, PORTFOLIO_DEMAND_PARAM, &hours)?,
            ppa_demand: read_table(dat, PPA_DEMAND_PARAM, &hours, &contracts)?,
            conventional_production: read_indexed(dat, CONVENTIONAL_PRODUCTION_PARAM, &hours)?,
            renewable_production: read_table(dat, RENEWABLE_PRODUCTION_PARAM, &hours, &projects)?,
            ppa_price: read_indexed(dat, PPA_PRICE_PARAM, &contracts)?,
            spot_price: read_indexed(dat, SPOT_PRICE_PARAM, &hours)?,
            hedge_rate: Dimensionless(hedge_rate),
            hours,
            contracts,
            projects,
        })
    }

    /// Demand of contract `contract` in hour `hour`
    pub fn ppa_demand(&self, hour: &HourID, contract: &ContractID) -> Energy {
        self.ppa_demand[&(hour.clone(), contract.clone())]
    }

    /// Own production (conventional plus renewable) in the given hour
    pub fn supply(&self, hour: &HourID) -> Energy {
        let renewable: Energy = self
            .projects
            .iter()
            .map(|project| self.renewable_production[&(hour.clone(), project.clone())])
            .sum();
        self.conventional_production[hour] + renewable
    }

    /// Total own production over the day.
    ///
    /// This does not depend on any decision, so the hedge-rate constraint is linear.
    pub fn total_supply(&self) -> Energy {
        self.hours.iter().map(|hour| self.supply(hour)).sum()
    }

    /// Demand in the given hour if the contracts in `selected` are taken
    pub fn demand(&self, hour: &HourID, selected: &IndexSet<ContractID>) -> Energy {
        let ppa: Energy = selected
            .iter()
            .map(|contract| self.ppa_demand(hour, contract))
            .sum();
        self.portfolio_demand[hour] + ppa
    }

    /// Total demand over the day if the contracts in `selected` are taken
    pub fn total_demand(&self, selected: &IndexSet<ContractID>) -> Energy {
        self.hours
            .iter()
            .map(|hour| self.demand(hour, selected))
            .sum()
    }

    /// Total energy sold under a contract over the day
    pub fn contract_energy(&self, contract: &ContractID) -> Energy {
        self.hours
            .iter()
            .map(|hour| self.ppa_demand(hour, contract))
            .sum()
    }
}

/// Read the members of a set
fn read_set<ID: IDLike>(dat: &DatFile, name: &str) -> Result<IndexSet<ID>> {
    let members = dat
        .sets
        .get(name)
        .with_context(|| format!("Missing set {name}"))?;
    ids_from_members(members).with_context(|| format!("Invalid members for set {name}"))
}

/// Read a scalar numeric parameter
fn read_scalar(dat: &DatFile, name: &str) -> Result<f64> {
    match dat.params.get(name) {
        Some(ParamValue::Number(value)) => Ok(*value),
        Some(_) => bail!("Parameter {name} must be a number"),
        None => bail!("Missing parameter {name}"),
    }
}

/// Read a parameter indexed over one set
fn read_indexed<ID, U>(dat: &DatFile, name: &str, ids: &IndexSet<ID>) -> Result<IndexMap<ID, U>>
where
    ID: IDLike,
    U: From<f64>,
{
    let values = match dat.params.get(name) {
        Some(ParamValue::Indexed(values)) => values,
        Some(_) => bail!("Parameter {name} must be indexed over one set"),
        // Nothing is needed if the set is empty
        None if ids.is_empty() => return Ok(IndexMap::new()),
        None => bail!("Missing parameter {name}"),
    };

    for key in values.keys() {
        ids.get_id_by_str(key)
            .with_context(|| format!("Invalid index for parameter {name}"))?;
    }

    ids.iter()
        .map(|id| {
            let value = values
                .get::<str>(id.borrow())
                .with_context(|| format!("Missing value for {name}[{id}]"))?;
            Ok((id.clone(), U::from(*value)))
        })
        .collect()
}

/// Read a parameter indexed over two sets, given as a table with a row per member of `rows`
fn read_table<R, C, U>(
    dat: &DatFile,
    name: &str,
    rows: &IndexSet<R>,
    columns: &IndexSet<C>,
) -> Result<IndexMap<(R, C), U>>
where
    R: IDLike,
    C: IDLike,
    U: From<f64>,
{
    let table = match dat.params.get(name) {
        Some(ParamValue::Table(table)) => table,
        // An empty table can't be told apart from an empty indexed parameter in JSON
        Some(ParamValue::Indexed(values)) if values.is_empty() => return Ok(IndexMap::new()),
        Some(_) => bail!("Parameter {name} must be a table indexed over two sets"),
        None if rows.is_empty() || columns.is_empty() => return Ok(IndexMap::new()),
        None => bail!("Missing parameter {name}"),
    };

    for (row, row_values) in table {
        rows.get_id_by_str(row)
            .with_context(|| format!("Invalid row for parameter {name}"))?;
        for column in row_values.keys() {
            columns
                .get_id_by_str(column)
                .with_context(|| format!("Invalid column for parameter {name}"))?;
        }
    }

    let mut values = IndexMap::with_capacity(rows.len() * columns.len());
    for row in rows {
        for column in columns {
            let value = table
                .get::<str>(row.borrow())
                .and_then(|row_values| row_values.get::<str>(column.borrow()))
                .with_context(|| format!("Missing value for {name}[{row}, {column}]"))?;
            values.insert((row.clone(), column.clone()), U::from(*value));
        }
    }
    Ok(values)
}
