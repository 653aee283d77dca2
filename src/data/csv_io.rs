use std::io::{Read, Write};

use log::debug;

use super::model::{Metadata, Spectrum};
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How columns beyond the first two are treated on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtraColumns {
    /// Drop them (the default).
    #[default]
    Ignore,
    /// Keep each as a named numeric series parallel to the wavelength axis.
    Series,
}

/// Long-format CSV configuration. Nothing is auto-detected: delimiter,
/// header presence, and extra-column policy are all explicit.
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub has_header: bool,
    pub extra_columns: ExtraColumns,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: b',',
            has_header: true,
            extra_columns: ExtraColumns::Ignore,
        }
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Parse long-format spectral CSV: header row (column names), then one
/// `wavelength,intensity[,...]` row per point.
///
/// Pure function from bytes to [`Spectrum`]; the caller decides what to do
/// with the result (normally: hand it to the workspace).
pub fn read_spectrum<R: Read>(reader: R, id: &str, opts: &CsvOptions) -> Result<Spectrum> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .has_headers(opts.has_header)
        .trim(csv::Trim::All)
        .from_reader(reader);

    // Column names: from the header row, or synthesised for header-less input.
    let columns: Vec<String> = if opts.has_header {
        let headers = rdr.headers()?;
        if headers.len() < 2 {
            return Err(DataError::Format {
                row: 1,
                message: format!("expected at least 2 columns, found {}", headers.len()),
            });
        }
        headers.iter().map(|h| h.to_string()).collect()
    } else {
        Vec::new()
    };

    let mut wavelengths = Vec::new();
    let mut intensities = Vec::new();
    let mut extra: Vec<(String, Vec<f64>)> = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let row = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() < 2 {
            return Err(DataError::Format {
                row,
                message: format!("expected at least 2 columns, found {}", record.len()),
            });
        }

        // First data row of a header-less file fixes the column layout.
        if extra.is_empty() && wavelengths.is_empty() {
            if let ExtraColumns::Series = opts.extra_columns {
                for i in 2..record.len() {
                    let name = columns
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| format!("series{}", i + 1));
                    extra.push((name, Vec::new()));
                }
            }
        }

        wavelengths.push(parse_field(&record, 0, row, &columns, "wavelength")?);
        intensities.push(parse_field(&record, 1, row, &columns, "intensity")?);

        for (slot, (_, values)) in extra.iter_mut().enumerate() {
            values.push(parse_field(&record, slot + 2, row, &columns, "series")?);
        }
    }

    if wavelengths.is_empty() {
        return Err(DataError::EmptyData);
    }

    debug!("parsed {} points for '{id}'", wavelengths.len());

    let mut spectrum = Spectrum::new(id, wavelengths, intensities, Metadata::new())?;
    for (name, values) in extra {
        spectrum = spectrum.with_extra_series(name, values)?;
    }
    Ok(spectrum)
}

fn parse_field(
    record: &csv::StringRecord,
    idx: usize,
    row: u64,
    columns: &[String],
    fallback_name: &str,
) -> Result<f64> {
    let raw = record.get(idx).unwrap_or("");
    raw.parse::<f64>().map_err(|_| DataError::Parse {
        row,
        column: columns
            .get(idx)
            .cloned()
            .unwrap_or_else(|| fallback_name.to_string()),
        value: raw.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Write a spectrum back out as long-format CSV: header row, then one row per
/// point. Values use `f64`'s shortest-round-trip formatting, so a re-import
/// reproduces them exactly.
pub fn write_spectrum<W: Write>(writer: W, spectrum: &Spectrum, opts: &CsvOptions) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(opts.delimiter)
        .from_writer(writer);

    if opts.has_header {
        let mut header = vec!["wavelength".to_string(), "intensity".to_string()];
        header.extend(spectrum.extra_series().iter().map(|(name, _)| name.clone()));
        wtr.write_record(&header)?;
    }

    for (i, (wl, inty)) in spectrum.points().enumerate() {
        let mut fields = vec![wl.to_string(), inty.to_string()];
        fields.extend(
            spectrum
                .extra_series()
                .iter()
                .map(|(_, values)| values[i].to_string()),
        );
        wtr.write_record(&fields)?;
    }

    wtr.flush()?;
    Ok(())
}
