//! Plot data for a selected fit.
//!
//! A [`CurveBand`] holds everything needed to draw a fit over its data: the
//! model evaluated on a log-spaced shear-rate grid with its propagated error,
//! the measured points and the window the fit was chosen on. It is written as
//! JSON; drawing it is left to other tools.

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::result::{FitResult, Provenance};
use crate::series::MeasurementSeries;

/// Grid size of the fitted curve.
pub const BAND_POINTS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveBand {
    pub name: String,
    pub model: String,
    pub parameter_names: Vec<String>,
    pub parameters: Vec<f64>,
    pub parameter_errors: Vec<f64>,
    pub provenance: Provenance,
    pub shear_rate: Vec<f64>,
    pub viscosity: Vec<f64>,
    pub viscosity_error: Vec<f64>,
    pub measured_shear_rate: Vec<f64>,
    pub measured_viscosity: Vec<f64>,
    /// Measured points at the window ends, `[first, last]`.
    pub window_points: [(f64, f64); 2],
}

impl CurveBand {
    pub fn new(name: &str, series: &MeasurementSeries, result: &FitResult) -> Result<Self> {
        let window = result.window();
        let (x, y) = series.window(window)?;
        let grid = log_grid(series.shear_rate()[0], series.shear_rate()[series.len() - 1]);

        let model = result.model();
        let (viscosity, viscosity_error) =
            model.eval_array_with_uncertainty(&grid, result.parameters(), result.parameter_errors())?;

        Ok(Self {
            name: name.to_string(),
            model: model.name().to_string(),
            parameter_names: model.parameter_names().iter().map(|s| s.to_string()).collect(),
            parameters: result.parameters().to_vec(),
            parameter_errors: result.parameter_errors().to_vec(),
            provenance: result.provenance().clone(),
            shear_rate: grid.to_vec(),
            viscosity: viscosity.to_vec(),
            viscosity_error: viscosity_error.to_vec(),
            measured_shear_rate: series.shear_rate().to_vec(),
            measured_viscosity: series.viscosity().to_vec(),
            window_points: [(x[0], y[0]), (x[x.len() - 1], y[y.len() - 1])],
        })
    }

    /// `<stem>_<method>.json` inside `dir`.
    pub fn file_name(&self, dir: &Path) -> PathBuf {
        let stem = Path::new(&self.name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone());
        dir.join(format!("{}_{}.json", stem, self.provenance.method))
    }

    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = self.file_name(dir);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(path)
    }
}

/// `BAND_POINTS` shear rates evenly spaced in log10 between `start` and `end`.
fn log_grid(start: f64, end: f64) -> Array1<f64> {
    Array1::logspace(10.0, start.log10(), end.log10(), BAND_POINTS)
}
