//! Rheometer export reader.
//!
//! Exports are `;`-separated, Latin-1 encoded and may use decimal commas.
//! The header is the first record with a shear-rate column (`GP`) and a
//! viscosity column (`Eta`, excluding complex viscosity `Eta*`). Every later
//! record whose two columns parse as positive numbers contributes a point.

use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};

use crate::error::{Result, RheoError};
use crate::series::MeasurementSeries;

/// Column positions of one flow-curve table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub shear_rate: usize,
    pub viscosity: usize,
}

impl ColumnLayout {
    /// Find the shear-rate and viscosity columns of a header record.
    ///
    /// The first matching column wins for each.
    pub fn detect<'a, I>(fields: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut shear_rate = None;
        let mut viscosity = None;
        for (i, field) in fields.into_iter().enumerate() {
            if shear_rate.is_none() && field.contains("GP") {
                shear_rate = Some(i);
            }
            if viscosity.is_none() && field.contains("Eta") && !field.contains("Eta*") {
                viscosity = Some(i);
            }
        }
        Some(Self {
            shear_rate: shear_rate?,
            viscosity: viscosity?,
        })
    }
}

/// Read the flow curve of an export file.
pub fn read_series(path: impl AsRef<Path>) -> Result<MeasurementSeries> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    read_series_from(file).map_err(|err| match err {
        RheoError::NoFlowCurveData(_) => RheoError::NoFlowCurveData(path.display().to_string()),
        other => other,
    })
}

/// Read a flow curve from any export stream.
pub fn read_series_from<R: Read>(reader: R) -> Result<MeasurementSeries> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut layout: Option<ColumnLayout> = None;
    let mut shear_rate = Vec::new();
    let mut viscosity = Vec::new();
    let mut record = ByteRecord::new();

    while reader.read_byte_record(&mut record)? {
        let fields: Vec<String> = record.iter().map(latin1).collect();

        let Some(columns) = layout else {
            layout = ColumnLayout::detect(fields.iter().map(String::as_str));
            if let Some(columns) = layout {
                tracing::debug!(
                    shear_rate = columns.shear_rate,
                    viscosity = columns.viscosity,
                    "found flow curve header"
                );
            }
            continue;
        };

        let point = fields
            .get(columns.shear_rate)
            .and_then(|field| parse_number(field))
            .zip(fields.get(columns.viscosity).and_then(|field| parse_number(field)));
        if let Some((x, y)) = point {
            if x > 0.0 && y > 0.0 {
                shear_rate.push(x);
                viscosity.push(y);
            }
        }
    }

    if shear_rate.is_empty() {
        return Err(RheoError::NoFlowCurveData(String::from("export")));
    }
    MeasurementSeries::new(shear_rate, viscosity)
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Parse a number that may use a decimal comma.
fn parse_number(field: &str) -> Option<f64> {
    let value: f64 = field.trim().replace(',', ".").parse().ok()?;
    value.is_finite().then_some(value)
}
