//! Integration tests for the `run` command.
use ppa_hcr::cli::{RunOpts, SolverOpts, handle_run_command};
use ppa_hcr::settings::Settings;
use std::path::PathBuf;
use tempfile::tempdir;

/// Get the path to the example cases.
fn get_data_dir() -> PathBuf {
    PathBuf::from("demos/deterministic")
}

/// An integration test for the `run` command.
#[test]
fn test_handle_run_command() {
    unsafe { std::env::set_var("PPA_HCR_LOG_LEVEL", "off") };

    // Save results to non-existent directory to check that directory creation works
    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("results");
    let opts = RunOpts {
        output_dir: Some(output_dir.clone()),
        ..Default::default()
    };
    handle_run_command(&get_data_dir(), &opts, Some(Settings::default())).unwrap();

    assert!(output_dir.join("results.csv").is_file());
    assert!(output_dir.join("metadata.toml").is_file());
    assert!(!output_dir.join("debug_spot_purchases.csv").exists());

    // Output folder is no longer empty
    assert!(handle_run_command(&get_data_dir(), &opts, Some(Settings::default())).is_err());

    // ...but can be overwritten
    let opts = RunOpts {
        output_dir: Some(output_dir.clone()),
        overwrite: true,
        ..Default::default()
    };
    handle_run_command(&get_data_dir(), &opts, Some(Settings::default())).unwrap();

    // Unavailable solvers are rejected before any solving happens
    let output_dir = tempdir.path().join("other");
    let opts = RunOpts {
        output_dir: Some(output_dir.clone()),
        solver: SolverOpts {
            solver: Some("gurobi".into()),
            tee: false,
        },
        ..Default::default()
    };
    assert!(handle_run_command(&get_data_dir(), &opts, Some(Settings::default())).is_err());
    assert!(!output_dir.exists());
}
