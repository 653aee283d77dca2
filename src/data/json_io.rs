use std::io::{Read, Write};

use serde_json::Value as JsonValue;

use super::model::{Metadata, MetadataValue, Spectrum};
use crate::error::{DataError, Result};

/// Expected JSON schema, records-oriented:
///
/// ```json
/// [
///   {
///     "wavelengths": [900.0, 902.0, ...],
///     "intensities": [0.12,  0.15,  ...],
///     "sample": "A",
///     "protein": 12.5
///   },
///   ...
/// ]
/// ```
///
/// Every key other than the two arrays becomes metadata. `source` names the
/// spectra (`{source}-{n}` past the first record).
pub fn read_records<R: Read>(mut reader: R, source: &str) -> Result<Vec<Spectrum>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let root: JsonValue = serde_json::from_str(&text).map_err(|e| DataError::Format {
        row: e.line() as u64,
        message: e.to_string(),
    })?;

    let records = root.as_array().ok_or_else(|| DataError::Format {
        row: 1,
        message: "expected top-level JSON array".to_string(),
    })?;

    let mut spectra = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or_else(|| DataError::Format {
            row: 1,
            message: format!("record {i} is not a JSON object"),
        })?;

        let wavelengths = number_array(obj.get("wavelengths"), i, "wavelengths")?;
        let intensities = number_array(obj.get("intensities"), i, "intensities")?;

        let mut metadata = Metadata::new();
        for (key, val) in obj {
            if key == "wavelengths" || key == "intensities" {
                continue;
            }
            metadata.insert(key.clone(), json_to_metadata(val));
        }

        let id = if i == 0 {
            source.to_string()
        } else {
            format!("{source}-{}", i + 1)
        };
        spectra.push(Spectrum::new(id, wavelengths, intensities, metadata)?);
    }

    if spectra.is_empty() {
        return Err(DataError::EmptyData);
    }
    Ok(spectra)
}

fn number_array(val: Option<&JsonValue>, record: usize, key: &str) -> Result<Vec<f64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .ok_or_else(|| DataError::Format {
            row: 1,
            message: format!("record {record}: missing or invalid '{key}' array"),
        })?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| {
            v.as_f64().ok_or_else(|| DataError::Parse {
                row: 1,
                column: format!("{key}[{j}]"),
                value: v.to_string(),
            })
        })
        .collect()
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetadataValue::Float(f)
            } else {
                MetadataValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        other => MetadataValue::String(other.to_string()),
    }
}

/// Write one spectrum as a single-record JSON array in the same schema
/// [`read_records`] accepts.
pub fn write_records<W: Write>(writer: W, spectrum: &Spectrum) -> Result<()> {
    serde_json::to_writer_pretty(writer, &[spectrum]).map_err(|e| {
        if e.is_io() {
            DataError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
        } else {
            DataError::Format {
                row: 0,
                message: e.to_string(),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_records_with_metadata() {
        let text = r#"[
            {"wavelengths": [900.0, 902.0], "intensities": [0.12, 0.15],
             "sample": "A", "protein": 12.5, "scans": 32}
        ]"#;
        let spectra = read_records(text.as_bytes(), "batch").unwrap();
        assert_eq!(spectra.len(), 1);
        let sp = &spectra[0];
        assert_eq!(sp.id(), "batch");
        assert_eq!(sp.wavelengths(), &[900.0, 902.0]);
        assert_eq!(
            sp.metadata().get("sample"),
            Some(&MetadataValue::String("A".into()))
        );
        assert_eq!(
            sp.metadata().get("protein"),
            Some(&MetadataValue::Float(12.5))
        );
        assert_eq!(
            sp.metadata().get("scans"),
            Some(&MetadataValue::Integer(32))
        );
    }

    #[test]
    fn unequal_arrays_are_a_length_mismatch() {
        let text = r#"[{"wavelengths": [900.0, 902.0], "intensities": [0.12]}]"#;
        let err = read_records(text.as_bytes(), "bad").unwrap_err();
        assert!(matches!(err, DataError::LengthMismatch { .. }));
    }

    #[test]
    fn empty_array_is_empty_data() {
        let err = read_records("[]".as_bytes(), "none").unwrap_err();
        assert!(matches!(err, DataError::EmptyData));
    }

    #[test]
    fn non_array_root_is_a_format_error() {
        let err = read_records("{}".as_bytes(), "obj").unwrap_err();
        assert!(matches!(err, DataError::Format { .. }));
    }

    #[test]
    fn round_trip_through_json() {
        let original = Spectrum::new(
            "rt",
            vec![900.0, 902.0, 904.0],
            vec![0.12, 0.15, 0.20],
            Metadata::new(),
        )
        .unwrap();
        let mut buf = Vec::new();
        write_records(&mut buf, &original).unwrap();
        let reread = read_records(buf.as_slice(), "rt").unwrap();
        assert_eq!(reread[0].wavelengths(), original.wavelengths());
        assert_eq!(reread[0].intensities(), original.intensities());
    }
}
