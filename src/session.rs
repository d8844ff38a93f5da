//! Batch processing of export files.
//!
//! A [`FitSession`] turns [`Settings`] into configured searches and runs them
//! over one file at a time: read the export, run the linear and nonlinear
//! fits that are enabled, append records and optionally write plot data.
//! Problems with one file never stop the batch; they end up in its
//! [`FileReport`] and in the incident log.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{Result, RheoError};
use crate::io::{read_series, CurveBand, RecordWriter};
use crate::result::{FitResult, Method};
use crate::search::{LinearRangeSearch, NonlinearRangeSearch};
use crate::series::MeasurementSeries;

/// What happened to one fit kind of one file.
#[derive(Debug, Clone)]
pub enum FitOutcome {
    Fitted {
        result: FitResult,
        record: PathBuf,
        band: Option<PathBuf>,
    },
    /// The search came back empty; a placeholder record was written.
    Exhausted { method: Method, record: PathBuf },
}

impl FitOutcome {
    pub fn result(&self) -> Option<&FitResult> {
        match self {
            FitOutcome::Fitted { result, .. } => Some(result),
            FitOutcome::Exhausted { .. } => None,
        }
    }

    pub fn method(&self) -> Method {
        match self {
            FitOutcome::Fitted { result, .. } => result.provenance().method,
            FitOutcome::Exhausted { method, .. } => *method,
        }
    }
}

impl fmt::Display for FitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitOutcome::Fitted { result, .. } => {
                let names = result.model().parameter_names();
                write!(f, "{}:", result.model())?;
                for ((name, value), error) in names
                    .iter()
                    .zip(result.parameters())
                    .zip(result.parameter_errors())
                {
                    write!(f, " {}={:.4} +- {:.4}", name, value, error)?;
                }
                write!(f, " [{}]", result.provenance())
            }
            FitOutcome::Exhausted { method, .. } => write!(f, "{}: no fit", method),
        }
    }
}

/// Result of processing one file.
#[derive(Debug)]
pub struct FileReport {
    pub name: String,
    pub outcomes: Vec<FitOutcome>,
    /// Set when the file was skipped.
    pub error: Option<RheoError>,
}

impl FileReport {
    pub fn is_skipped(&self) -> bool {
        self.error.is_some()
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(err) => write!(f, "{}: skipped ({})", self.name, err),
            None => {
                write!(f, "{}", self.name)?;
                for outcome in &self.outcomes {
                    write!(f, "\n  {}", outcome)?;
                }
                Ok(())
            }
        }
    }
}

/// Configured searches plus the output locations of a batch.
#[derive(Debug, Clone)]
pub struct FitSession {
    settings: Settings,
    linear: LinearRangeSearch,
    nonlinear: NonlinearRangeSearch,
    records: RecordWriter,
}

impl FitSession {
    /// Validate `settings` and build the searches they describe.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            linear: settings.linear_search()?,
            nonlinear: settings.nonlinear_search()?,
            records: RecordWriter::new(&settings.output_dir),
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Files with the configured extension in `dir`, sorted by name.
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let matches = path
                .extension()
                .map_or(false, |ext| ext.to_string_lossy() == self.settings.ext);
            if path.is_file() && matches {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Process every file in order.
    pub fn run(&self, files: &[PathBuf]) -> Vec<FileReport> {
        files.iter().map(|path| self.process_file(path)).collect()
    }

    /// Read and fit one export file.
    pub fn process_file(&self, path: &Path) -> FileReport {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let _span = tracing::info_span!("file", name = %name).entered();

        let result = read_series(path).and_then(|series| {
            tracing::debug!(points = series.len(), "read flow curve");
            self.process_series(&name, &series)
        });

        match result {
            Ok(outcomes) => FileReport {
                name,
                outcomes,
                error: None,
            },
            Err(err) => {
                match &err {
                    RheoError::IoError(_) | RheoError::CsvError(_) | RheoError::NoFlowCurveData(_) => {
                        tracing::warn!(
                            target: "incident",
                            "Failed to open file {}. Re-export the data: {}",
                            name,
                            err
                        )
                    }
                    _ => tracing::warn!(target: "incident", "Error while processing {}: {}", name, err),
                }
                FileReport {
                    name,
                    outcomes: Vec::new(),
                    error: Some(err),
                }
            }
        }
    }

    /// Run the enabled fits on a series already in memory.
    ///
    /// Search exhaustion becomes a placeholder record; other errors abort
    /// the series.
    pub fn process_series(&self, name: &str, series: &MeasurementSeries) -> Result<Vec<FitOutcome>> {
        let mut outcomes = Vec::new();

        if self.settings.do_lin {
            let (method, fit) = if self.settings.auto_lin {
                (Method::LinearAuto, self.linear.run(series))
            } else {
                (
                    Method::LinearManual,
                    self.linear.fit_window(series, series.full_window()),
                )
            };
            outcomes.push(self.finish(name, series, method, fit)?);
        }

        if self.settings.do_nl {
            let model = self.nonlinear.model();
            let (method, fit) = if self.settings.auto_nl {
                (Method::NonlinearAuto(model), self.nonlinear.run(series))
            } else {
                (
                    Method::NonlinearManual(model),
                    self.nonlinear.fit_window(series, series.full_window()),
                )
            };
            outcomes.push(self.finish(name, series, method, fit)?);
        }

        Ok(outcomes)
    }

    fn finish(
        &self,
        name: &str,
        series: &MeasurementSeries,
        method: Method,
        fit: Result<FitResult>,
    ) -> Result<FitOutcome> {
        match fit {
            Ok(result) => {
                let record = self.records.record(name, &result)?;
                let band = if self.settings.export_bands() {
                    let band = CurveBand::new(name, series, &result)?;
                    Some(band.write(self.records.dir())?)
                } else {
                    None
                };
                tracing::info!(method = %method, "{}", result.provenance());
                Ok(FitOutcome::Fitted {
                    result,
                    record,
                    band,
                })
            }
            Err(err) if err.is_search_exhaustion() => {
                tracing::warn!(target: "incident", "Unable to find viscosity for file {}: {}", name, err);
                let record = self.records.record_failure(name, method)?;
                Ok(FitOutcome::Exhausted { method, record })
            }
            Err(err) => Err(err),
        }
    }
}
