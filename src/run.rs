//! Functionality for solving cases and writing the results.
use crate::input::load_case;
use crate::optimisation::perform_optimisation;
use crate::output::DataWriter;
use crate::report::CaseResult;
use crate::solver::{SolverKind, SolverOptions};
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Load a case from file and solve it.
///
/// Failing to reach an optimal solution is not an error; it is recorded in the result.
pub fn solve_case_file(
    file_path: &Path,
    solver: SolverKind,
    options: &SolverOptions,
) -> Result<CaseResult> {
    let case = load_case(file_path)?;
    info!("Solving case {} with {solver}", case.name);

    let solution = perform_optimisation(&case, solver, options)
        .with_context(|| format!("Failed to solve case {}", case.name))?;
    let result = CaseResult::new(&case, &solution);

    match &result.summary {
        Some(summary) => info!(
            "{}: objective {} with contracts [{}]",
            result.case,
            summary.revenue,
            summary.format_selected()
        ),
        None => warn!("{}: no optimal solution ({})", result.case, result.termination),
    }

    Ok(result)
}

/// Solve each case in turn, writing one row per case to the results file.
///
/// # Arguments
///
/// * `files` - The case files to solve
/// * `output_path` - The folder to which output files will be written
/// * `solver` - The solver backend to use
/// * `options` - Options passed through to the solver
/// * `debug_model` - Whether to write additional information (e.g. hourly spot purchases) to file
pub fn run(
    files: &[PathBuf],
    output_path: &Path,
    solver: SolverKind,
    options: &SolverOptions,
    debug_model: bool,
) -> Result<Vec<CaseResult>> {
    let mut writer = DataWriter::create(output_path, debug_model)?;

    let mut results = Vec::with_capacity(files.len());
    for file_path in files {
        let result = solve_case_file(file_path, solver, options)?;
        writer.write_result(&result)?;
        results.push(result);
    }
    writer.flush()?;

    let num_optimal = results
        .iter()
        .filter(|result| result.termination.is_optimal())
        .count();
    info!("Solved {num_optimal} of {} cases to optimality", results.len());

    Ok(results)
}
