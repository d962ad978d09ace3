//! Selection of power purchase agreements (PPAs) under a daily hedge-rate constraint.
//!
//! Case data are read from AMPL-style `.dat` files (or their JSON equivalent), formulated as a
//! mixed-integer linear program and handed to an external MILP solver. Results are written to CSV.
use std::path::PathBuf;

pub mod case;
pub mod cli;
pub mod id;
pub mod input;
pub mod log;
pub mod optimisation;
pub mod output;
pub mod report;
pub mod run;
pub mod settings;
pub mod solver;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the config folder for the program.
///
/// This is platform dependent (e.g. `~/.config/ppa_hcr` on Linux).
pub fn get_ppa_hcr_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        // Only likely to happen on a very unusual system
        panic!("Could not get path to config dir");
    };

    config_dir.push("ppa_hcr");
    config_dir
}
