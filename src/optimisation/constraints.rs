//! Code for adding constraints to the PPA selection problem.
use super::{MAX_SELECTED_CONTRACTS, VariableMap};
use crate::case::{Case, HourID};
use crate::units::Energy;
use highs::RowProblem as Problem;

/// Add all constraints to the problem.
///
/// Constant terms (existing portfolio demand and own production) are moved into the row bounds.
pub fn add_constraints(problem: &mut Problem, variables: &VariableMap, case: &Case) {
    add_spot_purchase_constraints(problem, variables, case);
    add_balance_constraints(problem, variables, case);
    add_hedge_rate_constraint(problem, variables, case);
    add_contract_selection_constraint(problem, variables, case);
}

/// Terms for the demand of the candidate contracts in an hour, with the given sign
fn ppa_demand_terms<'a>(
    variables: &'a VariableMap,
    case: &'a Case,
    hour: &'a HourID,
    sign: f64,
) -> impl Iterator<Item = (super::Variable, f64)> + 'a {
    case.contracts.iter().map(move |contract| {
        let demand = case.ppa_demand(hour, contract);
        (variables.selection(contract), sign * demand.value())
    })
}

/// Demand of the existing portfolio less own production in an hour
fn residual_demand(case: &Case, hour: &HourID) -> Energy {
    case.portfolio_demand[hour] - case.supply(hour)
}

/// Spot purchases must cover any shortfall in each hour.
///
/// `CompraSpot[h] >= demand(h) - supply(h)`
fn add_spot_purchase_constraints(problem: &mut Problem, variables: &VariableMap, case: &Case) {
    for hour in &case.hours {
        let terms = ppa_demand_terms(variables, case, hour, -1.0)
            .chain([(variables.spot(hour), 1.0)])
            .collect::<Vec<_>>();
        problem.add_row(residual_demand(case, hour).value().., terms);
    }
}

/// Demand in each hour must be met by own production plus spot purchases.
///
/// `demand(h) <= supply(h) + CompraSpot[h]`
fn add_balance_constraints(problem: &mut Problem, variables: &VariableMap, case: &Case) {
    for hour in &case.hours {
        let terms = ppa_demand_terms(variables, case, hour, 1.0)
            .chain([(variables.spot(hour), -1.0)])
            .collect::<Vec<_>>();
        problem.add_row(..=-residual_demand(case, hour).value(), terms);
    }
}

/// Total demand over the day must not exceed the hedge rate times total own production.
///
/// Total supply is a constant, so the ratio constraint can be written as a product.
fn add_hedge_rate_constraint(problem: &mut Problem, variables: &VariableMap, case: &Case) {
    let portfolio_demand: Energy = case.portfolio_demand.values().copied().sum();
    let limit = case.hedge_rate * case.total_supply() - portfolio_demand;

    let terms = case
        .contracts
        .iter()
        .map(|contract| {
            let energy = case.contract_energy(contract);
            (variables.selection(contract), energy.value())
        })
        .collect::<Vec<_>>();
    problem.add_row(..=limit.value(), terms);
}

/// At most [`MAX_SELECTED_CONTRACTS`] contracts can be taken
fn add_contract_selection_constraint(problem: &mut Problem, variables: &VariableMap, case: &Case) {
    let terms = case
        .contracts
        .iter()
        .map(|contract| (variables.selection(contract), 1.0))
        .collect::<Vec<_>>();
    problem.add_row(0.0..=f64::from(MAX_SELECTED_CONTRACTS), terms);
}
