//! Reader for AMPL-style `.dat` case files and their JSON interchange format.
//!
//! Only the statement forms used by the case files are supported:
//!
//! * `set NAME := m1 m2 ... ;`
//! * `param NAME := k1 v1 k2 v2 ... ;`
//! * `param NAME: c1 c2 ... := r1 v11 v12 ... ;` (a table indexed by `[row, column]`)
//! * `param NAME = value;`
//!
//! Comments start with `#`. Any line which doesn't begin a `set` or `param` statement is ignored.
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The value of a parameter declared in a data file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A numeric scalar
    Number(f64),
    /// A scalar which isn't a number
    Text(String),
    /// A parameter indexed over one set
    Indexed(IndexMap<String, f64>),
    /// A parameter indexed over two sets, keyed by row then column
    Table(IndexMap<String, IndexMap<String, f64>>),
}

/// The sets and parameters declared in a data file, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatFile {
    /// Set members, by set name
    pub sets: IndexMap<String, Vec<String>>,
    /// Parameter values, by parameter name
    pub params: IndexMap<String, ParamValue>,
}

impl DatFile {
    /// Convert to the JSON interchange format
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add a set, checking that it hasn't already been declared
    fn add_set(&mut self, name: &str, members: Vec<String>) -> Result<()> {
        ensure!(
            self.sets.insert(name.to_string(), members).is_none(),
            "Set {name} is declared more than once"
        );
        Ok(())
    }

    /// Add a parameter, checking that it hasn't already been declared
    fn add_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        ensure!(
            self.params.insert(name.to_string(), value).is_none(),
            "Parameter {name} is declared more than once"
        );
        Ok(())
    }
}

/// Remove the comment (if any) from a line
fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(before, _)| before)
}

/// Check that `name` is a valid identifier for a set or parameter
fn check_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    ensure!(valid, "Invalid name: '{name}'");
    Ok(())
}

/// Parse a number, naming the offending value on failure
fn parse_number(value: &str) -> Result<f64> {
    let number: f64 = value
        .parse()
        .with_context(|| format!("Invalid number: '{value}'"))?;
    ensure!(number.is_finite(), "Invalid number: '{value}'");
    Ok(number)
}

/// Parse the contents of a data file.
///
/// # Arguments
///
/// * `text` - The contents of the file
///
/// # Returns
///
/// The declared sets and parameters or an error if a statement is malformed.
pub fn parse_dat(text: &str) -> Result<DatFile> {
    let lines: Vec<&str> = text.lines().map(strip_comment).collect();
    let mut dat = DatFile::default();

    let mut i = 0;
    while i < lines.len() {
        let keyword = lines[i].split_whitespace().next();
        if !matches!(keyword, Some("set" | "param")) {
            i += 1;
            continue;
        }

        // Gather lines until the statement is terminated. Anything after the ';' is ignored.
        let start = i;
        let mut statement = Vec::new();
        loop {
            let Some(line) = lines.get(i) else {
                bail!(
                    "Statement starting on line {} is missing a terminating ';'",
                    start + 1
                );
            };
            i += 1;

            if let Some((before, _)) = line.split_once(';') {
                statement.push(before);
                break;
            }
            statement.push(line);
        }

        parse_statement(&statement.join("\n"), &mut dat)
            .with_context(|| format!("Invalid statement on line {}", start + 1))?;
    }

    Ok(dat)
}

/// Parse a single `set` or `param` statement, without its terminating `;`
fn parse_statement(statement: &str, dat: &mut DatFile) -> Result<()> {
    let statement = statement.trim_start();
    if let Some(body) = statement.strip_prefix("set") {
        let (name, members) = body
            .split_once(":=")
            .context("Missing ':=' in set declaration")?;
        let name = name.trim();
        check_name(name)?;
        let members = members.split_whitespace().map(String::from).collect();
        return dat.add_set(name, members);
    }

    let body = statement
        .strip_prefix("param")
        .context("Expected set or param statement")?;
    if let Some((head, data)) = body.split_once(":=") {
        if let Some((name, columns)) = head.split_once(':') {
            let name = name.trim();
            check_name(name)?;
            let table = parse_table(name, columns, data)?;
            dat.add_param(name, ParamValue::Table(table))
        } else {
            let name = head.trim();
            check_name(name)?;
            let values = parse_indexed(data)?;
            dat.add_param(name, ParamValue::Indexed(values))
        }
    } else if let Some((name, value)) = body.split_once('=') {
        let name = name.trim();
        check_name(name)?;
        let value = value.trim();
        let value = match value.parse::<f64>() {
            Ok(number) => {
                ensure!(number.is_finite(), "Invalid number: '{value}'");
                ParamValue::Number(number)
            }
            Err(_) => ParamValue::Text(value.to_string()),
        };
        dat.add_param(name, value)
    } else {
        bail!("Missing ':=' or '=' in parameter declaration")
    }
}

/// Parse the data for a one-dimensional parameter as key-value pairs
fn parse_indexed(data: &str) -> Result<IndexMap<String, f64>> {
    let tokens: Vec<&str> = data.split_whitespace().collect();
    ensure!(
        tokens.len() % 2 == 0,
        "Expected key-value pairs, but found a key without a value"
    );

    let mut values = IndexMap::with_capacity(tokens.len() / 2);
    for pair in tokens.chunks_exact(2) {
        let (key, value) = (pair[0], pair[1]);
        ensure!(
            values
                .insert(key.to_string(), parse_number(value)?)
                .is_none(),
            "Duplicate key {key}"
        );
    }

    Ok(values)
}

/// Parse the data for a two-dimensional parameter.
///
/// Each row is on its own line. Rows with the wrong number of values are skipped with a warning.
fn parse_table(
    name: &str,
    columns: &str,
    data: &str,
) -> Result<IndexMap<String, IndexMap<String, f64>>> {
    let columns: Vec<&str> = columns.split_whitespace().collect();
    ensure!(!columns.is_empty(), "Table has no column headers");

    let mut table = IndexMap::new();
    for line in data.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&row, values)) = tokens.split_first() else {
            continue;
        };

        if values.len() != columns.len() {
            warn!(
                "Skipping row {row} of parameter {name}: expected {} values, found {}",
                columns.len(),
                values.len()
            );
            continue;
        }

        let mut row_values = IndexMap::with_capacity(columns.len());
        for (&column, &value) in columns.iter().zip(values) {
            row_values.insert(column.to_string(), parse_number(value)?);
        }
        ensure!(
            table.insert(row.to_string(), row_values).is_none(),
            "Duplicate row {row}"
        );
    }

    Ok(table)
}

/// Read a data file from the specified path
pub fn read_dat(file_path: &Path) -> Result<DatFile> {
    let bytes =
        fs::read(file_path).with_context(|| format!("Could not read {}", file_path.display()))?;

    // Non-UTF-8 characters can only appear in comments in the files we care about
    let text = String::from_utf8_lossy(&bytes);
    parse_dat(&text).with_context(|| format!("Could not parse {}", file_path.display()))
}

/// Read case data in the JSON interchange format from the specified path
pub fn read_json(file_path: &Path) -> Result<DatFile> {
    let json_str = fs::read_to_string(file_path)
        .with_context(|| format!("Could not read {}", file_path.display()))?;
    serde_json::from_str(&json_str)
        .with_context(|| format!("Could not parse JSON file {}", file_path.display()))
}

/// Convert a `.dat` file into the JSON interchange format
pub fn convert_dat_to_json(dat_path: &Path, json_path: &Path) -> Result<()> {
    let dat = read_dat(dat_path)?;
    fs::write(json_path, dat.to_json()?)
        .with_context(|| format!("Could not write {}", json_path.display()))
}
