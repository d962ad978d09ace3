//! Code for formulating and solving the PPA selection problem.
//!
//! Each candidate contract has a binary selection variable and each hour has a non-negative spot
//! purchase variable. The objective is to maximise PPA revenue minus the cost of spot purchases.
use crate::case::{Case, ContractID, HourID};
use crate::log::is_logging_disabled;
use crate::solver::{SolverKind, SolverOptions, Termination};
use crate::units::{Energy, Money};
use anyhow::{Result, bail};
use float_cmp::approx_eq;
use highs::{RowProblem as Problem, Sense};
use indexmap::IndexMap;
use log::{debug, warn};

mod constraints;
use constraints::add_constraints;

/// The maximum number of contracts which can be selected
pub const MAX_SELECTED_CONTRACTS: u32 = 3;

/// A decision variable in the optimisation
///
/// Note that this type does **not** include the value of the variable; it just refers to a
/// particular column of the problem.
pub type Variable = highs::Col;

/// The variables of the problem, keyed by what they represent.
///
/// Columns are added in the order of the maps, selection variables first, so the solution's
/// column values can be zipped with the keys.
pub struct VariableMap {
    /// Whether each contract is taken (`y`)
    selection_vars: IndexMap<ContractID, Variable>,
    /// Energy bought on the spot market in each hour (`CompraSpot`)
    spot_vars: IndexMap<HourID, Variable>,
}

impl VariableMap {
    /// Get the selection variable for a contract
    fn selection(&self, contract: &ContractID) -> Variable {
        *self
            .selection_vars
            .get(contract)
            .expect("No selection variable found for contract")
    }

    /// Get the spot purchase variable for an hour
    fn spot(&self, hour: &HourID) -> Variable {
        *self
            .spot_vars
            .get(hour)
            .expect("No spot purchase variable found for hour")
    }
}

/// Values of the decision variables at an optimal solution
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionValues {
    /// The value of the objective (PPA revenue minus spot costs)
    pub objective: Money,
    /// Whether each contract is selected
    pub selection: IndexMap<ContractID, bool>,
    /// Energy bought on the spot market in each hour
    pub spot_purchases: IndexMap<HourID, Energy>,
}

impl SolutionValues {
    /// Iterate over the contracts which were selected
    pub fn iter_selected(&self) -> impl Iterator<Item = &ContractID> {
        self.selection
            .iter()
            .filter(|(_, selected)| **selected)
            .map(|(contract, _)| contract)
    }

    /// Total energy bought on the spot market over the day
    pub fn total_spot(&self) -> Energy {
        self.spot_purchases.values().copied().sum()
    }
}

/// The outcome of solving a case
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// How the solve ended
    pub termination: Termination,
    /// Variable values, only available if the solve was optimal
    pub values: Option<SolutionValues>,
}

/// Add variables to the problem.
///
/// The objective coefficient of a selection variable is the revenue from the contract over the
/// whole day. Spot purchases are a cost, so their coefficients are negated.
fn add_variables(problem: &mut Problem, case: &Case) -> VariableMap {
    let selection_vars = case
        .contracts
        .iter()
        .map(|contract| {
            let revenue = case.ppa_price[contract] * case.contract_energy(contract);
            let var = problem.add_integer_column(revenue.value(), 0.0..=1.0);
            (contract.clone(), var)
        })
        .collect();

    let spot_vars = case
        .hours
        .iter()
        .map(|hour| {
            let var = problem.add_column(-case.spot_price[hour].value(), 0.0..);
            (hour.clone(), var)
        })
        .collect();

    VariableMap {
        selection_vars,
        spot_vars,
    }
}

/// Build the problem for a case and solve it.
///
/// # Arguments
///
/// * `case` - The case to solve
/// * `solver` - The solver backend to use
/// * `options` - Options passed through to the solver
///
/// # Returns
///
/// The solution, which only contains variable values if the solve was optimal. An error is only
/// returned if the solver backend cannot be used.
pub fn perform_optimisation(
    case: &Case,
    solver: SolverKind,
    options: &SolverOptions,
) -> Result<Solution> {
    match solver {
        SolverKind::Highs => Ok(solve_with_highs(case, options)),
        other => bail!("Solver '{other}' is not available"),
    }
}

/// Formulate the problem with HiGHS and solve it
fn solve_with_highs(case: &Case, options: &SolverOptions) -> Solution {
    let mut problem = Problem::default();
    let variables = add_variables(&mut problem, case);
    add_constraints(&mut problem, &variables, case);
    debug!(
        "{}: problem has {} variables and {} constraints",
        case.name,
        problem.num_cols(),
        problem.num_rows()
    );

    let mut model = problem.optimise(Sense::Maximise);
    apply_options(&mut model, options);

    let solved = match model.try_solve() {
        Ok(solved) => solved,
        Err(status) => {
            return Solution {
                termination: Termination::Error(format!("{status:?}")),
                values: None,
            };
        }
    };

    let termination = Termination::from(solved.status());
    if !termination.is_optimal() {
        return Solution {
            termination,
            values: None,
        };
    }

    let values = read_values(
        &variables,
        solved.get_solution().columns(),
        solved.objective_value(),
    );

    Solution {
        termination,
        values: Some(values),
    }
}

/// Pass options through to HiGHS
fn apply_options(model: &mut highs::Model, options: &SolverOptions) {
    if options.tee && !is_logging_disabled() {
        model.set_option("output_flag", true);
        model.set_option("log_to_console", true);
    }
    if let Some(time_limit) = options.time_limit {
        model.set_option("time_limit", time_limit);
    }
    if let Some(mip_rel_gap) = options.mip_rel_gap {
        model.set_option("mip_rel_gap", mip_rel_gap);
    }
}

/// Read the variable values out of the solution's columns
fn read_values(variables: &VariableMap, columns: &[f64], objective: f64) -> SolutionValues {
    let (selection_values, spot_values) = columns.split_at(variables.selection_vars.len());

    let selection = variables
        .selection_vars
        .keys()
        .zip(selection_values.iter().copied())
        .map(|(contract, value)| {
            if !approx_eq!(f64, value, value.round(), epsilon = 1e-6) {
                warn!("Selection variable for contract {contract} is not integral: {value}");
            }
            (contract.clone(), value > 0.5)
        })
        .collect();

    let spot_purchases = variables
        .spot_vars
        .keys()
        .zip(spot_values.iter().copied())
        .map(|(hour, value)| (hour.clone(), Energy(value)))
        .collect();

    SolutionValues {
        objective: Money(objective),
        selection,
        spot_purchases,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{cardinality_case, case_from_str, infeasible_case, simple_case};
    use float_cmp::assert_approx_eq;
    use itertools::Itertools;
    use rstest::rstest;

    fn solve(case: &Case) -> Solution {
        perform_optimisation(case, SolverKind::Highs, &SolverOptions::default()).unwrap()
    }

    #[rstest]
    fn test_simple_case(simple_case: Case) {
        let solution = solve(&simple_case);
        assert_eq!(solution.termination, Termination::Optimal);

        let values = solution.values.unwrap();
        assert_eq!(values.iter_selected().collect_vec(), [&ContractID::new("C1")]);

        // Revenue of 70 * 20 minus 5 units bought at 80 in H2
        assert_approx_eq!(f64, values.objective.value(), 1000.0, epsilon = 1e-6);
        assert_approx_eq!(f64, values.total_spot().value(), 5.0, epsilon = 1e-6);
        assert_approx_eq!(
            f64,
            values.spot_purchases[&HourID::new("H1")].value(),
            0.0,
            epsilon = 1e-6
        );
    }

    #[rstest]
    fn test_solver_options(simple_case: Case) {
        let options = SolverOptions {
            time_limit: Some(10.0),
            mip_rel_gap: Some(0.0),
            tee: true,
        };
        let solution = perform_optimisation(&simple_case, SolverKind::Highs, &options).unwrap();
        assert_eq!(solution.termination, Termination::Optimal);
        assert_approx_eq!(
            f64,
            solution.values.unwrap().objective.value(),
            1000.0,
            epsilon = 1e-6
        );
    }

    #[rstest]
    fn test_cardinality_limit(cardinality_case: Case) {
        let values = solve(&cardinality_case).values.unwrap();
        let selected = values.iter_selected().map(ToString::to_string).collect_vec();
        assert_eq!(selected, ["C2", "C3", "C4"]);
        assert_approx_eq!(f64, values.objective.value(), 900.0, epsilon = 1e-6);
    }

    #[rstest]
    fn test_infeasible_case(infeasible_case: Case) {
        let solution = solve(&infeasible_case);
        assert_eq!(solution.termination, Termination::Infeasible);
        assert!(solution.values.is_none());
    }

    #[test]
    fn test_unprofitable_contract_not_selected() {
        // Taking the contract would mean buying at 100 to sell at 20. The hedge rate is set high
        // enough not to rule it out.
        let text = "set HORAS := H1;
set CONTRATOS := C1;
set PRY_RER := ;
param DemandaPortafolioActual := H1 10;
param DemandaPPA: C1 :=
H1 5
;
param Produccion_Convencional := H1 10;
param PrecioPPA := C1 20;
param PrecioSpot := H1 100;
param HedgeRate = 2.0;
";
        let values = solve(&case_from_str("x", text)).values.unwrap();
        assert_eq!(values.iter_selected().count(), 0);
        assert_approx_eq!(f64, values.objective.value(), 0.0, epsilon = 1e-6);
    }

    #[rstest]
    fn test_unavailable_solver(simple_case: Case) {
        let result = perform_optimisation(&simple_case, SolverKind::Cbc, &SolverOptions::default());
        assert!(result.is_err());
    }
}
