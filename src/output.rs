//! The module responsible for writing output data to disk.
use crate::case::HourID;
use crate::report::{CaseResult, CaseSummary};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which case-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "ppa_hcr_results";

/// The output file name for the results table
pub const RESULTS_FILE_NAME: &str = "results.csv";

/// The output file name for hourly spot purchases
pub const SPOT_PURCHASES_FILE_NAME: &str = "debug_spot_purchases.csv";

/// Get the default output directory for the case data at the specified path
pub fn get_output_dir(data_path: &Path) -> Result<PathBuf> {
    // Get the name from the path. This ends up being convoluted because we need to check for all
    // possible errors.
    let data_path = data_path
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to case data")?;

    let data_name = data_path
        .file_stem()
        .context("Case data cannot be in root folder")?
        .to_str()
        .context("Invalid chars in case data path")?;

    Ok([OUTPUT_DIRECTORY_ROOT, data_name].iter().collect())
}

/// Create a new output directory, creating parent folders as needed.
///
/// An existing directory which isn't empty is only reused if `allow_overwrite` is set, in which case
/// its contents are deleted.
///
/// # Returns
///
/// Whether an existing directory was overwritten.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Directory exists and is empty
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the results CSV file.
///
/// Column names follow those of the reference model. Fields other than the case name and
/// termination are empty unless the case was solved to optimality.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ResultRow {
    case: String,
    termination: String,
    #[serde(rename = "Ingresos")]
    revenue: Option<f64>,
    #[serde(rename = "HedgeRate")]
    hedge_rate: Option<f64>,
    contracting_level: Option<f64>,
    total_spot: Option<f64>,
    selected_contracts: Option<String>,
    y: Option<String>,
}

impl ResultRow {
    /// Create a new [`ResultRow`]
    fn new(result: &CaseResult) -> Self {
        let summary = result.summary.as_ref();
        Self {
            case: result.case.clone(),
            termination: result.termination.to_string(),
            revenue: summary.map(|s| s.revenue.value()),
            hedge_rate: summary.map(|s| s.hedge_rate.0),
            contracting_level: summary.map(|s| s.contracting_level.0),
            total_spot: summary.map(|s| s.total_spot.value()),
            selected_contracts: summary.map(CaseSummary::format_selected),
            y: summary.map(CaseSummary::format_selection),
        }
    }
}

/// Represents a row in the hourly spot purchases CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SpotPurchaseRow {
    case: String,
    hour: HourID,
    demand: f64,
    supply: f64,
    spot_purchase: f64,
    spot_price: f64,
}

/// An object for writing results to file
pub struct DataWriter {
    results_writer: csv::Writer<File>,
    spot_purchases_writer: Option<csv::Writer<File>>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `save_debug_info` - Whether to include extra CSV files for debugging
    pub fn create(output_path: &Path, save_debug_info: bool) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(&file_path)
                .with_context(|| format!("Could not create {}", file_path.display()))
        };

        let spot_purchases_writer = if save_debug_info {
            Some(new_writer(SPOT_PURCHASES_FILE_NAME)?)
        } else {
            None
        };

        Ok(Self {
            results_writer: new_writer(RESULTS_FILE_NAME)?,
            spot_purchases_writer,
        })
    }

    /// Write the result for a case
    pub fn write_result(&mut self, result: &CaseResult) -> Result<()> {
        self.results_writer.serialize(ResultRow::new(result))?;

        if let Some(wtr) = &mut self.spot_purchases_writer {
            let hourly = result.summary.iter().flat_map(|summary| &summary.hourly);
            for purchase in hourly {
                wtr.serialize(SpotPurchaseRow {
                    case: result.case.clone(),
                    hour: purchase.hour.clone(),
                    demand: purchase.demand.value(),
                    supply: purchase.supply.value(),
                    spot_purchase: purchase.spot_purchase.value(),
                    spot_price: purchase.spot_price.value(),
                })?;
            }
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.results_writer.flush()?;
        if let Some(wtr) = &mut self.spot_purchases_writer {
            wtr.flush()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::Case;
    use crate::fixture::{assert_error, simple_case};
    use crate::optimisation::{Solution, SolutionValues};
    use crate::solver::Termination;
    use crate::units::{Energy, Money};
    use indexmap::indexmap;
    use itertools::{Itertools, assert_equal};
    use rstest::{fixture, rstest};
    use tempfile::tempdir;

    #[fixture]
    fn optimal_result(simple_case: Case) -> CaseResult {
        let solution = Solution {
            termination: Termination::Optimal,
            values: Some(SolutionValues {
                objective: Money(1000.0),
                selection: indexmap! {"C1".into() => true, "C2".into() => false},
                spot_purchases: indexmap! {"H1".into() => Energy(0.0), "H2".into() => Energy(5.0)},
            }),
        };
        CaseResult::new(&simple_case, &solution)
    }

    #[fixture]
    fn infeasible_result() -> CaseResult {
        CaseResult {
            case: "infeasible.dat".into(),
            termination: Termination::Infeasible,
            summary: None,
        }
    }

    #[rstest]
    fn test_write_results(optimal_result: CaseResult, infeasible_result: CaseResult) {
        let dir = tempdir().unwrap();
        {
            let mut writer = DataWriter::create(dir.path(), false).unwrap();
            writer.write_result(&optimal_result).unwrap();
            writer.write_result(&infeasible_result).unwrap();
            writer.flush().unwrap();
        }

        // No debug files are written
        assert!(!dir.path().join(SPOT_PURCHASES_FILE_NAME).exists());

        // Read back and compare
        let records: Vec<ResultRow> = csv::Reader::from_path(dir.path().join(RESULTS_FILE_NAME))
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap();
        assert_equal(
            records,
            [
                ResultRow::new(&optimal_result),
                ResultRow {
                    case: "infeasible.dat".into(),
                    termination: "infeasible".into(),
                    revenue: None,
                    hedge_rate: None,
                    contracting_level: None,
                    total_spot: None,
                    selected_contracts: None,
                    y: None,
                },
            ],
        );
    }

    #[rstest]
    fn test_results_header(infeasible_result: CaseResult) {
        let dir = tempdir().unwrap();
        {
            let mut writer = DataWriter::create(dir.path(), false).unwrap();
            writer.write_result(&infeasible_result).unwrap();
            writer.flush().unwrap();
        }

        let contents = fs::read_to_string(dir.path().join(RESULTS_FILE_NAME)).unwrap();
        assert_eq!(
            contents,
            "case,termination,Ingresos,HedgeRate,contracting_level,total_spot,selected_contracts,y\n\
            infeasible.dat,infeasible,,,,,,\n"
        );
    }

    #[rstest]
    fn test_write_spot_purchases(optimal_result: CaseResult) {
        let dir = tempdir().unwrap();
        {
            let mut writer = DataWriter::create(dir.path(), true).unwrap();
            writer.write_result(&optimal_result).unwrap();
            writer.flush().unwrap();
        }

        let records: Vec<SpotPurchaseRow> =
            csv::Reader::from_path(dir.path().join(SPOT_PURCHASES_FILE_NAME))
                .unwrap()
                .into_deserialize()
                .try_collect()
                .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[1],
            SpotPurchaseRow {
                case: "simple.dat".into(),
                hour: "H2".into(),
                demand: 60.0,
                supply: 55.0,
                spot_purchase: 5.0,
                spot_price: 80.0,
            }
        );
    }

    #[test]
    fn test_create_output_directory() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");

        // New directory
        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());

        // Existing empty directory
        assert!(!create_output_directory(&output_dir, false).unwrap());

        // Existing directory with contents
        fs::write(output_dir.join(RESULTS_FILE_NAME), "").unwrap();
        assert_error!(
            create_output_directory(&output_dir, false),
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command-line option."
        );
        assert!(create_output_directory(&output_dir, true).unwrap());
        assert!(!output_dir.join(RESULTS_FILE_NAME).exists());
    }

    #[test]
    fn test_get_output_dir() {
        let dir = tempdir().unwrap();
        let data_path = dir.path().join("cases.dat");
        fs::write(&data_path, "").unwrap();

        assert_eq!(
            get_output_dir(&data_path).unwrap(),
            PathBuf::from(OUTPUT_DIRECTORY_ROOT).join("cases")
        );
    }
}
