//! The command line interface for the program.
use crate::input::dat::convert_dat_to_json;
use crate::input::{find_all_case_files, find_case_files, load_case};
use crate::log;
use crate::output::metadata::write_metadata;
use crate::output::{create_output_directory, get_output_dir};
use crate::run::{run, solve_case_file};
use crate::settings::Settings;
use crate::solver::{SolverKind, SolverOptions};
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the program.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for choosing and configuring the solver
#[derive(Args, Default)]
pub struct SolverOpts {
    /// MILP solver (highs, glpk, cbc, cplex, gurobi)
    #[arg(long)]
    pub solver: Option<String>,
    /// Show solver output
    #[arg(long)]
    pub tee: bool,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// Whether to write additional information to CSV files
    #[arg(long)]
    pub debug_model: bool,
    /// Solver options
    #[command(flatten)]
    pub solver: SolverOpts,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Solve one or more cases and print each solution.
    Solve {
        /// Case files, or directories containing case files.
        #[arg(required = true)]
        data: Vec<PathBuf>,
        /// Solver options
        #[command(flatten)]
        opts: SolverOpts,
    },
    /// Solve all cases and write a results table.
    Run {
        /// A case file or a directory containing case files.
        data: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Convert a .dat case file to JSON.
    Convert {
        /// Input .dat file
        #[arg(long)]
        dat: PathBuf,
        /// Output .json file
        #[arg(long)]
        json: PathBuf,
    },
    /// Validate case data without solving.
    Validate {
        /// Case files, or directories containing case files.
        #[arg(required = true)]
        data: Vec<PathBuf>,
    },
    /// Manage example cases.
    Example {
        /// The available subcommands for managing example cases.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Solve { data, opts } => handle_solve_command(&data, &opts, None),
            Self::Run { data, opts } => handle_run_command(&data, &opts, None),
            Self::Convert { dat, json } => handle_convert_command(&dat, &json, None),
            Self::Validate { data } => handle_validate_command(&data, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ ppa_hcr --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load program settings, if not provided
fn load_settings(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Initialise the program logger, unless this has already been done
fn init_logger(settings: &Settings, log_file_path: Option<&Path>) -> Result<()> {
    if log::is_logger_initialised() {
        return Ok(());
    }

    log::init(&settings.log_level, log_file_path).context("Failed to initialise logging.")
}

/// Work out which solver to use and its options. Command-line options override settings.
fn get_solver(opts: &SolverOpts, settings: &Settings) -> Result<(SolverKind, SolverOptions)> {
    let name = opts.solver.as_deref().unwrap_or(&settings.solver);
    let solver = SolverKind::from_name(name)?;
    let options = SolverOptions {
        tee: opts.tee,
        ..settings.solver_options()
    };

    Ok((solver, options))
}

/// Handle the `solve` command.
pub fn handle_solve_command(
    data_paths: &[PathBuf],
    opts: &SolverOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;
    init_logger(&settings, None)?;

    let (solver, options) = get_solver(opts, &settings)?;
    for file_path in find_all_case_files(data_paths)? {
        let result = solve_case_file(&file_path, solver, &options)?;
        println!("\n{result}");
    }

    Ok(())
}

/// Handle the `run` command.
pub fn handle_run_command(
    data_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;
    let (solver, options) = get_solver(&opts.solver, &settings)?;

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(data_path)?;
        &pathbuf
    };

    let overwrite = create_output_directory(output_path, opts.overwrite || settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    init_logger(&settings, Some(output_path))?;

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    let files = find_case_files(data_path)?;
    info!("Found {} case(s) in {}", files.len(), data_path.display());
    info!("Output folder: {}", output_path.display());

    write_metadata(output_path, data_path, solver, files.len())
        .context("Failed to save metadata.")?;

    run(
        &files,
        output_path,
        solver,
        &options,
        opts.debug_model || settings.debug_model,
    )?;
    info!("Wrote results to {}", output_path.display());

    Ok(())
}

/// Handle the `convert` command.
pub fn handle_convert_command(
    dat_path: &Path,
    json_path: &Path,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;
    init_logger(&settings, None)?;

    convert_dat_to_json(dat_path, json_path)?;
    info!("Wrote: {}", json_path.display());

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(data_paths: &[PathBuf], settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;

    // We won't save log files when running the validate command
    init_logger(&settings, None)?;

    let files = find_all_case_files(data_paths)?;
    for file_path in &files {
        load_case(file_path).context("Failed to validate case.")?;
    }
    info!("Validated {} case(s) successfully!", files.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_solver_from_settings() {
        let settings: Settings = toml::from_str("time_limit = 30.0\nmip_rel_gap = 0.01").unwrap();
        let opts = SolverOpts {
            solver: None,
            tee: true,
        };

        let (solver, options) = get_solver(&opts, &settings).unwrap();
        assert_eq!(solver, SolverKind::Highs);
        assert_eq!(
            options,
            SolverOptions {
                time_limit: Some(30.0),
                mip_rel_gap: Some(0.01),
                tee: true,
            }
        );
    }

    #[test]
    fn test_get_solver_command_line_overrides_settings() {
        let settings: Settings = toml::from_str("solver = \"gurobi\"").unwrap();

        // The setting names an unavailable solver...
        assert!(get_solver(&SolverOpts::default(), &settings).is_err());

        // ...but the command line takes precedence
        let opts = SolverOpts {
            solver: Some("HiGHS".into()),
            tee: false,
        };
        let (solver, options) = get_solver(&opts, &settings).unwrap();
        assert_eq!(solver, SolverKind::Highs);
        assert_eq!(options, SolverOptions::default());
    }
}
