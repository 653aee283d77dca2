//! Minimal JCAMP-DX reader.
//!
//! Covers the subset NIR instruments actually emit: labelled data records
//! (`##KEY= value`), tabular data as either `(X++(Y..Y))` with
//! `XFACTOR`/`YFACTOR` scaling or explicit `(XY..XY)` pairs, and compound
//! (multi-block) files, which yield one spectrum per block.

use std::io::{BufRead, BufReader, Read};

use log::warn;

use super::model::{Metadata, MetadataValue, Spectrum};
use crate::error::{DataError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataForm {
    /// `##XYDATA= (X++(Y..Y))`: each line is an X start followed by Y values.
    XThenYs,
    /// `##XYPOINTS= (XY..XY)` / `##PEAK TABLE=`: explicit pairs.
    Pairs,
}

/// One `##TITLE= ... ##END=` block, raw.
struct RawBlock {
    /// (file line number, text) for every line in the block.
    lines: Vec<(u64, String)>,
}

/// Parse a JCAMP-DX file into one [`Spectrum`] per block.
///
/// Blocks without a data table (e.g. the outer link block of a compound
/// file) are skipped. `source` names spectra whose block carries no title.
pub fn read_jcamp<R: Read>(reader: R, source: &str) -> Result<Vec<Spectrum>> {
    let mut blocks: Vec<RawBlock> = Vec::new();

    for (i, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let row = (i + 1) as u64;
        // $$ starts an inline comment.
        let text = match line.split_once("$$") {
            Some((before, _)) => before.trim_end().to_string(),
            None => line,
        };
        if text.trim().is_empty() {
            continue;
        }
        if text.trim_start().starts_with("##TITLE=") || blocks.is_empty() {
            blocks.push(RawBlock { lines: Vec::new() });
        }
        blocks
            .last_mut()
            .expect("pushed above")
            .lines
            .push((row, text));
    }

    let mut spectra = Vec::new();
    let mut saw_data_ldr = false;

    for block in &blocks {
        if let Some(spectrum) = parse_block(block, source, &mut saw_data_ldr)? {
            spectra.push(spectrum);
        }
    }

    if !saw_data_ldr {
        return Err(DataError::Format {
            row: 1,
            message: "no XYDATA or XYPOINTS table".to_string(),
        });
    }
    if spectra.is_empty() {
        return Err(DataError::EmptyData);
    }
    Ok(spectra)
}

fn parse_block(
    block: &RawBlock,
    source: &str,
    saw_data_ldr: &mut bool,
) -> Result<Option<Spectrum>> {
    let mut title: Option<String> = None;
    let mut xunits: Option<String> = None;
    let mut yunits: Option<String> = None;
    let mut xfactor = 1.0_f64;
    let mut yfactor = 1.0_f64;
    let mut deltax: Option<f64> = None;
    let mut firstx: Option<f64> = None;
    let mut lastx: Option<f64> = None;
    let mut npoints: Option<usize> = None;

    let mut form: Option<DataForm> = None;
    // Raw data lines after the table LDR, before scaling.
    let mut data_lines: Vec<(u64, String)> = Vec::new();
    let mut in_table = false;

    for (row, line) in &block.lines {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("##") {
            in_table = false;
            let (key, value) = match rest.split_once('=') {
                Some((k, v)) => (k.trim().to_uppercase(), v.trim()),
                None => continue,
            };
            match key.as_str() {
                "TITLE" => title = Some(value.to_string()),
                "XUNITS" => xunits = Some(value.to_string()),
                "YUNITS" => yunits = Some(value.to_string()),
                "XFACTOR" => xfactor = parse_number(value, *row, "XFACTOR")?,
                "YFACTOR" => yfactor = parse_number(value, *row, "YFACTOR")?,
                "DELTAX" => deltax = Some(parse_number(value, *row, "DELTAX")?),
                "FIRSTX" => firstx = Some(parse_number(value, *row, "FIRSTX")?),
                "LASTX" => lastx = Some(parse_number(value, *row, "LASTX")?),
                "NPOINTS" => {
                    npoints = Some(parse_number(value, *row, "NPOINTS")? as usize);
                }
                "XYDATA" => {
                    form = Some(DataForm::XThenYs);
                    *saw_data_ldr = true;
                    in_table = true;
                }
                "XYPOINTS" | "PEAK TABLE" => {
                    form = Some(DataForm::Pairs);
                    *saw_data_ldr = true;
                    in_table = true;
                }
                "END" => break,
                _ => {}
            }
        } else if in_table {
            data_lines.push((*row, trimmed.to_string()));
        }
    }

    let Some(form) = form else {
        // Link block of a compound file, or bare header junk.
        return Ok(None);
    };

    let (wavelengths, intensities) = match form {
        DataForm::Pairs => decode_pairs(&data_lines)?,
        DataForm::XThenYs => {
            decode_x_then_ys(&data_lines, xfactor, yfactor, deltax, firstx, lastx, npoints)?
        }
    };

    if wavelengths.is_empty() {
        return Ok(None);
    }
    if let Some(n) = npoints {
        if n != wavelengths.len() {
            warn!(
                "'{source}': NPOINTS says {n} but table holds {}",
                wavelengths.len()
            );
        }
    }

    let mut metadata = Metadata::new();
    if let Some(t) = &title {
        metadata.insert("title".to_string(), MetadataValue::String(t.clone()));
    }
    if let Some(u) = xunits {
        metadata.insert("xunits".to_string(), MetadataValue::String(u));
    }
    if let Some(u) = yunits {
        metadata.insert("yunits".to_string(), MetadataValue::String(u));
    }

    let id = title.unwrap_or_else(|| source.to_string());
    Some(Spectrum::new(id, wavelengths, intensities, metadata)).transpose()
}

/// Decode `(XY..XY)` lines: pairs of numbers separated by `,`, `;` or space.
fn decode_pairs(lines: &[(u64, String)]) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut xs = Vec::new();
    let mut ys = Vec::new();

    for (row, line) in lines {
        let tokens: Vec<&str> = line
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.len() % 2 != 0 {
            return Err(DataError::Format {
                row: *row,
                message: format!("odd number of values ({}) in XY pair line", tokens.len()),
            });
        }
        for pair in tokens.chunks(2) {
            xs.push(parse_number(pair[0], *row, "x")?);
            ys.push(parse_number(pair[1], *row, "y")?);
        }
    }
    Ok((xs, ys))
}

/// Decode `(X++(Y..Y))` lines: each starts with an unscaled X, followed by
/// unscaled Y values at successive X increments.
fn decode_x_then_ys(
    lines: &[(u64, String)],
    xfactor: f64,
    yfactor: f64,
    deltax: Option<f64>,
    firstx: Option<f64>,
    lastx: Option<f64>,
    npoints: Option<usize>,
) -> Result<(Vec<f64>, Vec<f64>)> {
    // Raw (per-line x start, y values).
    let mut raw: Vec<(f64, Vec<f64>, u64)> = Vec::new();
    for (row, line) in lines {
        let mut tokens = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty());
        let Some(first) = tokens.next() else { continue };
        let x0 = parse_number(first, *row, "x")?;
        let mut ys = Vec::new();
        for tok in tokens {
            ys.push(parse_number(tok, *row, "y")?);
        }
        raw.push((x0, ys, *row));
    }

    // X increment, in raw (pre-XFACTOR) units.
    let dx = if let Some(dx) = deltax {
        Some(dx)
    } else if let (Some(first), Some(last), Some(n)) = (firstx, lastx, npoints) {
        if n > 1 {
            Some((last - first) / xfactor / (n as f64 - 1.0))
        } else {
            Some(0.0)
        }
    } else if raw.len() >= 2 && !raw[0].1.is_empty() {
        Some((raw[1].0 - raw[0].0) / raw[0].1.len() as f64)
    } else {
        None
    };

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (x0, line_ys, row) in &raw {
        if line_ys.len() > 1 && dx.is_none() {
            return Err(DataError::Format {
                row: *row,
                message: "cannot determine x increment (no DELTAX/FIRSTX/LASTX/NPOINTS)"
                    .to_string(),
            });
        }
        for (i, y) in line_ys.iter().enumerate() {
            xs.push((x0 + i as f64 * dx.unwrap_or(0.0)) * xfactor);
            ys.push(y * yfactor);
        }
    }
    Ok((xs, ys))
}

fn parse_number(raw: &str, row: u64, column: &str) -> Result<f64> {
    raw.parse::<f64>().map_err(|_| DataError::Parse {
        row,
        column: column.to_string(),
        value: raw.to_string(),
    })
}
