//! Batch translation of files and directories.
//!
//! Every unit gets its own `CompilerSession` through [`crate::translate`], so
//! nothing one file defines is visible while translating another. A missing
//! input or a unit that fails to translate is logged, counted and skipped;
//! the remaining inputs are still processed.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::translate;

/// Extension of the source files picked up from a directory.
pub const SOURCE_EXTENSION: &str = "py";

#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Files, or directories whose `*.py` files are translated.
    pub inputs: Vec<PathBuf>,
    /// Written beside each input when unset.
    pub out_dir: Option<PathBuf>,
    pub extension: String,
    /// Print translations instead of writing files.
    pub to_stdout: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            inputs: vec![PathBuf::from("test")],
            out_dir: None,
            extension: "jl".to_string(),
            to_stdout: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverReport {
    pub translated: usize,
    pub failed: usize,
}

impl DriverReport {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Translates every input, printing to the process's stdout when
/// `to_stdout` is set.
pub fn run(config: &DriverConfig) -> DriverReport {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with_output(config, &mut out)
}

pub fn run_with_output<W: Write>(config: &DriverConfig, out: &mut W) -> DriverReport {
    let mut report = DriverReport::default();
    for input in &config.inputs {
        let units = match collect_units(input) {
            Ok(units) => units,
            Err(error) => {
                warn!(input = %input.display(), "{error:#}");
                report.failed += 1;
                continue;
            }
        };
        debug!(input = %input.display(), units = units.len(), "collected inputs");

        for unit in units {
            match translate_unit(&unit, config, out) {
                Ok(Some(destination)) => {
                    info!(source = %unit.display(), output = %destination.display(), "translated");
                    report.translated += 1;
                }
                Ok(None) => {
                    info!(source = %unit.display(), "translated");
                    report.translated += 1;
                }
                Err(error) => {
                    warn!(source = %unit.display(), "{error:#}");
                    report.failed += 1;
                }
            }
        }
    }
    report
}

/// A file input as is, or the sorted `*.py` files directly inside a
/// directory input.
pub fn collect_units(input: &Path) -> Result<Vec<PathBuf>> {
    let metadata = fs::metadata(input)
        .with_context(|| format!("input '{}' does not exist", input.display()))?;
    if !metadata.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut units = Vec::new();
    for entry in WalkDir::new(input).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to read directory '{}'", input.display()))?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().is_some_and(|extension| extension == SOURCE_EXTENSION)
        {
            units.push(path.to_path_buf());
        }
    }
    Ok(units)
}

/// `<out_dir or source dir>/<stem>.<extension>`
pub fn output_path(source: &Path, out_dir: Option<&Path>, extension: &str) -> PathBuf {
    let directory = match out_dir {
        Some(directory) => directory.to_path_buf(),
        None => source.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let mut name = source.file_stem().unwrap_or(source.as_os_str()).to_os_string();
    name.push(".");
    name.push(extension);
    directory.join(name)
}

fn translate_unit<W: Write>(
    source: &Path,
    config: &DriverConfig,
    out: &mut W,
) -> Result<Option<PathBuf>> {
    let text = fs::read_to_string(source)
        .with_context(|| format!("failed to read '{}'", source.display()))?;
    let julia = translate(&text).with_context(|| format!("failed to translate '{}'", source.display()))?;

    if config.to_stdout {
        writeln!(out, "# {}", source.display())?;
        out.write_all(julia.as_bytes())?;
        return Ok(None);
    }

    let destination = output_path(source, config.out_dir.as_deref(), &config.extension);
    if let Some(parent) = destination.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create '{}'", parent.display()))?;
    }
    fs::write(&destination, julia)
        .with_context(|| format!("failed to write '{}'", destination.display()))?;
    Ok(Some(destination))
}
