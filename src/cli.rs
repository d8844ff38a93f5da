//! CLI argument definitions.

use std::path::PathBuf;

use clap::Parser;

use rheofit::Settings;

/// Default settings file looked up in the working directory.
pub const DEFAULT_CONFIG: &str = "rheofit.toml";

/// rheofit - Flow-curve range search and viscosity fitting for rheometer exports
#[derive(Debug, Parser)]
#[command(name = "rheofit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Export files to process
    pub files: Vec<PathBuf>,

    /// Settings file (TOML, upper-case keys)
    #[arg(short, long, env = "RHEOFIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Process every file with the configured extension in the working directory
    #[arg(short, long)]
    pub all: bool,

    /// Extension used by --all
    #[arg(long)]
    pub ext: Option<String>,

    /// Skip the linear fit
    #[arg(long)]
    pub no_lin: bool,

    /// Skip the nonlinear fit
    #[arg(long)]
    pub no_nl: bool,

    /// Fit the linear model on the whole series instead of searching
    #[arg(long)]
    pub manual_lin: bool,

    /// Fit the nonlinear model on the whole series instead of searching
    #[arg(long)]
    pub manual_nl: bool,

    /// Nonlinear model: Carreau, Cross or Carreau-Yasuda
    #[arg(short, long)]
    pub model: Option<String>,

    /// Linear ranking: by_error or by_error_length
    #[arg(long)]
    pub lin_sorting: Option<String>,

    /// Nonlinear ranking: eta_0 or overall
    #[arg(long)]
    pub nl_sorting: Option<String>,

    /// Last start index tried by the nonlinear search
    #[arg(long)]
    pub first_point_max: Option<usize>,

    /// Fit candidates in parallel
    #[arg(short, long)]
    pub parallel: bool,

    /// Write plot data next to the records
    #[arg(long)]
    pub save_graphs: bool,

    /// Directory for records, plot data and the incident log
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub debug: bool,
}

impl Cli {
    /// Settings from the file (if any) with command-line overrides applied.
    pub fn settings(&self) -> rheofit::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_file(path)?,
            None if std::path::Path::new(DEFAULT_CONFIG).is_file() => {
                Settings::from_file(DEFAULT_CONFIG)?
            }
            None => Settings::default(),
        };
        self.apply(&mut settings);
        Ok(settings)
    }

    fn apply(&self, settings: &mut Settings) {
        settings.treat_all |= self.all;
        settings.do_lin &= !self.no_lin;
        settings.do_nl &= !self.no_nl;
        settings.auto_lin &= !self.manual_lin;
        settings.auto_nl &= !self.manual_nl;
        settings.parallel |= self.parallel;
        settings.save_graphs |= self.save_graphs;
        settings.debug |= self.debug;

        if let Some(ext) = &self.ext {
            settings.ext = ext.trim_start_matches('.').to_string();
        }
        if let Some(model) = &self.model {
            settings.nl_fitting_method = model.clone();
        }
        if let Some(sorting) = &self.lin_sorting {
            settings.lin_sorting_method = sorting.clone();
        }
        if let Some(sorting) = &self.nl_sorting {
            settings.nl_sorting_method = sorting.clone();
        }
        if let Some(first_point_max) = self.first_point_max {
            settings.first_point_max = first_point_max;
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
    }
}
