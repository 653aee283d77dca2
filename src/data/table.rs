//! Wide-format spectral tables: one row per sample, numeric column names
//! forming the wavelength axis, and named columns for everything else
//! (sample ids, lab references, predictions, timestamps, categories).

use std::io::Read;

use log::{debug, warn};

use super::model::{Metadata, MetadataValue, Spectrum};
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Column classification
// ---------------------------------------------------------------------------

/// Role of a wide-table column, decided from its header name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnGroup {
    /// Sample identifier (first column, when it precedes the axis).
    SampleId,
    /// Wavelength axis column (numeric header name).
    Wavelength,
    /// Laboratory reference value, header ending in `(LAB)`.
    Reference,
    /// NIR model prediction, header ending in `(NIR)`.
    Prediction,
    /// Mahalanobis-distance diagnostic, header starting with `MD value`.
    MdValue,
    /// Acquisition timestamp, header starting with `Start`, `Time` or `Date`.
    Time,
    /// Product category, header starting with `Product`.
    Category,
    /// Anything else.
    Unknown,
}

/// Classify a column by its header name.
///
/// `is_first` and `is_before_axis` disambiguate the sample-id column: only
/// the first column, and only when it appears before any wavelength column.
pub fn classify_column(name: &str, is_first: bool, is_before_axis: bool) -> ColumnGroup {
    if is_first && is_before_axis {
        return ColumnGroup::SampleId;
    }
    if name.parse::<f64>().is_ok() {
        return ColumnGroup::Wavelength;
    }
    if name.ends_with("(LAB)") {
        return ColumnGroup::Reference;
    }
    if name.ends_with("(NIR)") {
        return ColumnGroup::Prediction;
    }
    if name.starts_with("MD value") {
        return ColumnGroup::MdValue;
    }
    if name.starts_with("Start") || name.starts_with("Time") || name.starts_with("Date") {
        return ColumnGroup::Time;
    }
    if name.starts_with("Product") {
        return ColumnGroup::Category;
    }
    ColumnGroup::Unknown
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Parse a wide-format table into one [`Spectrum`] per data row.
///
/// The wavelength axis comes from the numeric header names; every other
/// column lands in the spectrum's metadata under its header name. The
/// sample-id column, if present, names the spectrum (falling back to
/// `{source}-{row}`).
pub fn read_table<R: Read>(reader: R, source: &str, delimiter: u8) -> Result<Vec<Spectrum>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();

    let first_axis_idx = headers.iter().position(|h| h.parse::<f64>().is_ok());
    let groups: Vec<ColumnGroup> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let is_before_axis = first_axis_idx.map(|a| idx < a).unwrap_or(true);
            classify_column(name, idx == 0, is_before_axis)
        })
        .collect();

    let axis: Vec<(usize, f64)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| groups[*idx] == ColumnGroup::Wavelength)
        .map(|(idx, name)| (idx, name.parse::<f64>().expect("classified as numeric")))
        .collect();

    if axis.is_empty() {
        return Err(DataError::Format {
            row: 1,
            message: "no numeric wavelength columns in header".to_string(),
        });
    }
    debug!(
        "'{source}': {} wavelength columns, {} metadata columns",
        axis.len(),
        headers.len() - axis.len()
    );

    let sid_idx = groups.iter().position(|g| *g == ColumnGroup::SampleId);
    let wavelengths: Vec<f64> = axis.iter().map(|(_, wl)| *wl).collect();

    let mut spectra = Vec::new();

    for (row_no, result) in rdr.records().enumerate() {
        let record = result?;
        let row = record.position().map(|p| p.line()).unwrap_or(0);

        let mut intensities = Vec::with_capacity(axis.len());
        for (idx, _) in &axis {
            let raw = record.get(*idx).unwrap_or("");
            let v = raw.parse::<f64>().map_err(|_| DataError::Parse {
                row,
                column: headers[*idx].clone(),
                value: raw.to_string(),
            })?;
            intensities.push(v);
        }

        let mut metadata = Metadata::new();
        for (idx, value) in record.iter().enumerate() {
            match groups[idx] {
                ColumnGroup::Wavelength | ColumnGroup::SampleId => continue,
                ColumnGroup::Unknown => {
                    if row_no == 0 {
                        warn!("'{source}': unclassified column '{}'", headers[idx]);
                    }
                }
                _ => {}
            }
            metadata.insert(headers[idx].clone(), MetadataValue::from_field(value));
        }

        let id = sid_idx
            .and_then(|idx| record.get(idx))
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("{source}-{}", row_no + 1));

        spectra.push(Spectrum::new(id, wavelengths.clone(), intensities, metadata)?);
    }

    if spectra.is_empty() {
        return Err(DataError::EmptyData);
    }
    Ok(spectra)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_rules() {
        assert_eq!(classify_column("Sample", true, true), ColumnGroup::SampleId);
        assert_eq!(classify_column("908.1", false, false), ColumnGroup::Wavelength);
        assert_eq!(
            classify_column("Protein (LAB)", false, false),
            ColumnGroup::Reference
        );
        assert_eq!(
            classify_column("Protein (NIR)", false, false),
            ColumnGroup::Prediction
        );
        assert_eq!(
            classify_column("MD value 1", false, false),
            ColumnGroup::MdValue
        );
        assert_eq!(classify_column("Start time", false, false), ColumnGroup::Time);
        assert_eq!(classify_column("Date", false, false), ColumnGroup::Time);
        assert_eq!(
            classify_column("Product name", false, false),
            ColumnGroup::Category
        );
        assert_eq!(classify_column("Operator", false, false), ColumnGroup::Unknown);
    }

    #[test]
    fn first_column_is_sid_only_before_the_axis() {
        // A numeric first column is part of the axis, not a sample id.
        assert_eq!(classify_column("900", true, false), ColumnGroup::Wavelength);
    }

    #[test]
    fn one_spectrum_per_row() {
        let text = "Sample,900,902,904,Protein (LAB),Product name\n\
                    A1,0.1,0.2,0.3,12.5,Wheat\n\
                    A2,0.4,0.5,0.6,13.1,Wheat\n";
        let spectra = read_table(text.as_bytes(), "tbl", b',').unwrap();
        assert_eq!(spectra.len(), 2);

        let first = &spectra[0];
        assert_eq!(first.id(), "A1");
        assert_eq!(first.wavelengths(), &[900.0, 902.0, 904.0]);
        assert_eq!(first.intensities(), &[0.1, 0.2, 0.3]);
        assert_eq!(
            first.metadata().get("Protein (LAB)"),
            Some(&MetadataValue::Float(12.5))
        );
        assert_eq!(
            first.metadata().get("Product name"),
            Some(&MetadataValue::String("Wheat".into()))
        );

        assert_eq!(spectra[1].id(), "A2");
        assert_eq!(spectra[1].intensities(), &[0.4, 0.5, 0.6]);
    }

    #[test]
    fn missing_axis_is_a_format_error() {
        let err = read_table("Sample,Protein (LAB)\nA1,12.5\n".as_bytes(), "tbl", b',')
            .unwrap_err();
        assert!(matches!(err, DataError::Format { row: 1, .. }));
    }

    #[test]
    fn header_only_is_empty_data() {
        let err = read_table("Sample,900,902\n".as_bytes(), "tbl", b',').unwrap_err();
        assert!(matches!(err, DataError::EmptyData));
    }

    #[test]
    fn non_numeric_intensity_is_a_parse_error() {
        let text = "Sample,900,902\nA1,0.1,oops\n";
        let err = read_table(text.as_bytes(), "tbl", b',').unwrap_err();
        match err {
            DataError::Parse { column, value, .. } => {
                assert_eq!(column, "902");
                assert_eq!(value, "oops");
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }
}
