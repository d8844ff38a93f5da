//! Tests for the export reader

use std::io::Write;

use approx::assert_relative_eq;
use rheofit::io::read_series;
use rheofit::{ModelKind, RheoError};

use crate::test_helpers::{export_text, model_series};

#[test]
fn test_reads_generated_export() {
    let series = model_series(ModelKind::Carreau, &[1000.0, 1.0, 10.0, 0.6], 20);
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    file.write_all(export_text(&series).as_bytes()).unwrap();

    let read = read_series(file.path()).unwrap();
    assert_eq!(read.len(), 20);
    for (a, b) in read.viscosity().iter().zip(series.viscosity().iter()) {
        assert_relative_eq!(*a, *b, max_relative = 1e-12);
    }
}

#[test]
fn test_latin1_header_and_bad_rows() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    // "Viskosit\xe4t" is Latin-1; the units row and the zero row are dropped.
    file.write_all(
        b"Probe;Viskosit\xe4t\n\
          ;Punkt;GP;Eta;Eta*\n\
          ;;[1/s];[Pa\xb7s];[Pa\xb7s]\n\
          ;1;0,5;12,5;1\n\
          ;2;0;12,5;1\n\
          ;3;5,0;11,0;1\n",
    )
    .unwrap();

    let series = read_series(file.path()).unwrap();
    assert_eq!(series.shear_rate().to_vec(), vec![0.5, 5.0]);
    assert_eq!(series.viscosity().to_vec(), vec![12.5, 11.0]);
}

#[test]
fn test_missing_data() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"Time;Torque\n1;2\n").unwrap();
    let err = read_series(file.path()).unwrap_err();
    assert!(matches!(err, RheoError::NoFlowCurveData(ref name) if name.contains(&*file.path().display().to_string())));

    let err = read_series("/nonexistent/export.txt").unwrap_err();
    assert!(matches!(err, RheoError::IoError(_)));
}
