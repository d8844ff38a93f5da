//! Flat result records.
//!
//! Each fit appends one `name;value;error;provenance` line to `linear.csv`
//! or `<Model>.csv`. Files are opened in append mode so repeated batches
//! accumulate rows.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::ModelKind;
use crate::result::{FitResult, Method, Provenance};

/// One line of a record file.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordLine {
    pub name: String,
    pub value: f64,
    pub error: f64,
    pub extra: String,
}

impl RecordLine {
    pub fn from_result(name: &str, result: &FitResult) -> Self {
        let (value, error) = result.viscosity();
        Self {
            name: name.to_string(),
            value,
            error,
            extra: result.provenance().to_string(),
        }
    }

    /// The line written when a whole search came back empty.
    pub fn placeholder(name: &str, method: Method) -> Self {
        let reason = if method.model().is_linear() {
            "unable_to_fit"
        } else {
            "unable_to_find_viscosity"
        };
        Self {
            name: name.to_string(),
            value: 0.0,
            error: 0.0,
            extra: format!("{};{}", method, reason),
        }
    }

    /// Split a written line back into its fields.
    ///
    /// Only the first three `;` separate fields; the rest is `extra`.
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.trim_end_matches(['\r', '\n']).splitn(4, ';');
        let name = fields.next()?.to_string();
        let value = fields.next()?.parse().ok()?;
        let error = fields.next()?.parse().ok()?;
        let extra = fields.next().unwrap_or_default().to_string();
        Some(Self {
            name,
            value,
            error,
            extra,
        })
    }

    /// The provenance stored in `extra`, if this is not a placeholder.
    pub fn provenance(&self) -> Option<Provenance> {
        self.extra.parse().ok()
    }
}

impl std::fmt::Display for RecordLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{};{};{};{}", self.name, self.value, self.error, self.extra)
    }
}

/// Appends record lines to the files of an output directory.
#[derive(Debug, Clone)]
pub struct RecordWriter {
    dir: PathBuf,
}

impl RecordWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record file of a model: `linear.csv` or `<Model>.csv`.
    pub fn path_for(&self, model: ModelKind) -> PathBuf {
        if model.is_linear() {
            self.dir.join("linear.csv")
        } else {
            self.dir.join(format!("{}.csv", model.name()))
        }
    }

    pub fn record(&self, name: &str, result: &FitResult) -> Result<PathBuf> {
        self.append(result.model(), &RecordLine::from_result(name, result))
    }

    pub fn record_failure(&self, name: &str, method: Method) -> Result<PathBuf> {
        self.append(method.model(), &RecordLine::placeholder(name, method))
    }

    fn append(&self, model: ModelKind, line: &RecordLine) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(model);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}", line)?;
        tracing::debug!(path = %path.display(), "{}", line);
        Ok(path)
    }
}
