//! Tests for the batch session and its record files

use std::fs;
use std::path::Path;

use rheofit::io::{CurveBand, RecordLine};
use rheofit::{FitSession, Method, ModelKind, Provenance, Settings};

use crate::test_helpers::{export_text, noisy_series};

fn settings(dir: &Path) -> Settings {
    Settings {
        output_dir: dir.to_path_buf(),
        ..Settings::default()
    }
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn write_export(dir: &Path, name: &str) -> std::path::PathBuf {
    let series = noisy_series(ModelKind::Carreau, &[1000.0, 1.0, 10.0, 0.6], 40, 0.005, 1);
    let path = dir.join(name);
    fs::write(&path, export_text(&series)).unwrap();
    path
}

#[test]
fn test_records_round_trip_provenance() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let path = write_export(input.path(), "sample.txt");

    let session = FitSession::new(settings(output.path())).unwrap();
    let report = session.process_file(&path);
    assert!(!report.is_skipped(), "{}", report);
    assert_eq!(report.outcomes.len(), 2);

    for outcome in &report.outcomes {
        let result = outcome.result().unwrap();
        let file = if result.model() == ModelKind::Linear {
            output.path().join("linear.csv")
        } else {
            output.path().join("Carreau.csv")
        };
        let written = lines(&file);
        assert_eq!(written.len(), 1);

        let line = RecordLine::parse(&written[0]).unwrap();
        assert_eq!(line.name, "sample.txt");
        assert_eq!(line.value, result.viscosity().0);

        let provenance: Provenance = line.provenance().unwrap();
        assert_eq!(provenance.window, result.window());
        assert_eq!(provenance.model(), result.model());
        assert_eq!(&provenance, result.provenance());
    }
}

#[test]
fn test_exhaustion_writes_one_placeholder() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let path = write_export(input.path(), "stubborn.txt");

    let session = FitSession::new(Settings {
        do_lin: false,
        first_point_max: 3,
        max_iterations: 1,
        ..settings(output.path())
    })
    .unwrap();
    let report = session.process_file(&path);

    assert_eq!(report.outcomes.len(), 1);
    assert!(report.outcomes[0].result().is_none());
    assert_eq!(report.outcomes[0].method(), Method::NonlinearAuto(ModelKind::Carreau));

    let written = lines(&output.path().join("Carreau.csv"));
    assert_eq!(
        written,
        vec!["stubborn.txt;0;0;nonlinear_auto_Carreau;unable_to_find_viscosity".to_string()]
    );
    assert!(!output.path().join("linear.csv").exists());
}

#[test]
fn test_short_series_linear_placeholder() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let path = input.path().join("short.txt");
    fs::write(&path, ";GP;Eta\n;1;100\n;2;100\n;3;99\n;4;101\n;5;100\n").unwrap();

    let session = FitSession::new(Settings {
        do_nl: false,
        ..settings(output.path())
    })
    .unwrap();
    session.process_file(&path);

    let written = lines(&output.path().join("linear.csv"));
    assert_eq!(written, vec!["short.txt;0;0;linear_auto;unable_to_fit".to_string()]);
}

#[test]
fn test_batch_skips_unreadable_files() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let good = write_export(input.path(), "a.txt");
    let bad = input.path().join("b.txt");
    fs::write(&bad, "nothing to see\n").unwrap();
    fs::write(input.path().join("c.dat"), "ignored\n").unwrap();

    let session = FitSession::new(Settings {
        do_nl: false,
        ..settings(output.path())
    })
    .unwrap();
    let files = session.discover(input.path()).unwrap();
    assert_eq!(files, vec![good, bad]);

    let reports = session.run(&files);
    assert!(!reports[0].is_skipped());
    assert!(reports[1].is_skipped());
    assert_eq!(lines(&output.path().join("linear.csv")).len(), 1);
}

#[test]
fn test_plot_data_export() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let path = write_export(input.path(), "plotme.txt");

    let session = FitSession::new(Settings {
        do_lin: false,
        save_graphs: true,
        ..settings(output.path())
    })
    .unwrap();
    session.process_file(&path);

    let band_path = output.path().join("plotme_nonlinear_auto_Carreau.json");
    let band: CurveBand = serde_json::from_str(&fs::read_to_string(band_path).unwrap()).unwrap();
    assert_eq!(band.model, "Carreau");
    assert_eq!(band.shear_rate.len(), 50);
    assert_eq!(band.measured_viscosity.len(), 40);
    assert_eq!(band.provenance.method, Method::NonlinearAuto(ModelKind::Carreau));
}
