//! Common routines for handling input data.
use crate::case::Case;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use log::debug;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use unicase::UniCase;

pub mod dat;
use dat::{DatFile, read_dat, read_json};

/// The file extension for AMPL-style case data files
pub const DAT_EXTENSION: &str = "dat";

/// The file extension for case data files in the interchange format
pub const JSON_EXTENSION: &str = "json";

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path)
        .with_context(|| format!("Could not read file {}", file_path.display()))?;
    let toml_data = toml::from_str(&toml_str)
        .with_context(|| format!("Could not parse TOML file {}", file_path.display()))?;
    Ok(toml_data)
}

/// The kinds of file which can hold case data
#[derive(Debug, Clone, Copy, PartialEq)]
enum CaseFileKind {
    Dat,
    Json,
}

/// Work out what kind of case file is at `path` from its extension (case-insensitive)
fn case_file_kind(path: &Path) -> Option<CaseFileKind> {
    let ext = UniCase::new(path.extension()?.to_str()?);
    if ext == UniCase::new(DAT_EXTENSION) {
        Some(CaseFileKind::Dat)
    } else if ext == UniCase::new(JSON_EXTENSION) {
        Some(CaseFileKind::Json)
    } else {
        None
    }
}

/// Find the case files at the given path.
///
/// A path to a file is taken to be a single case. For a directory, all the case files it contains
/// (`.dat` and `.json`) are returned, sorted by file name. Subdirectories are not searched.
pub fn find_case_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        ensure!(path.is_file(), "Case data not found: {}", path.display());
        return Ok(vec![path.to_path_buf()]);
    }

    let entries = fs::read_dir(path)
        .with_context(|| format!("Could not read directory {}", path.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let file_path = entry?.path();
        if file_path.is_file() && case_file_kind(&file_path).is_some() {
            files.push(file_path);
        }
    }
    ensure!(
        !files.is_empty(),
        "No case files (.{DAT_EXTENSION} or .{JSON_EXTENSION}) found in {}",
        path.display()
    );

    Ok(files
        .into_iter()
        .sorted_by(|a, b| a.file_name().cmp(&b.file_name()))
        .collect())
}

/// Find the case files at each of the given paths, in order
pub fn find_all_case_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        files.extend(find_case_files(path)?);
    }

    Ok(files)
}

/// Read the raw (untyped) case data from a `.dat` or `.json` file
pub fn read_case_data(file_path: &Path) -> Result<DatFile> {
    match case_file_kind(file_path) {
        Some(CaseFileKind::Json) => read_json(file_path),
        // Anything that isn't JSON is assumed to be in the AMPL data format
        Some(CaseFileKind::Dat) | None => read_dat(file_path),
    }
}

/// Load and validate a case from a `.dat` or `.json` file.
///
/// The case takes its name from the file name.
pub fn load_case(file_path: &Path) -> Result<Case> {
    let name = file_path
        .file_name()
        .context("Case path has no file name")?
        .to_string_lossy();
    let data = read_case_data(file_path)?;
    let case = Case::from_dat(&name, &data)
        .with_context(|| format!("Invalid case data in {}", file_path.display()))?;
    debug!(
        "Loaded case {name}: {} hours, {} contracts, {} renewable projects",
        case.hours.len(),
        case.contracts.len(),
        case.projects.len()
    );

    Ok(case)
}
