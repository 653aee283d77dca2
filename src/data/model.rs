use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// MetadataValue – a single typed metadata cell
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata value attached to a spectrum: units,
/// acquisition labels, reference lab values, timestamps kept as text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v:.4}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

impl MetadataValue {
    /// Try to interpret the value as an `f64` (e.g. for regression targets).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Float(v) => Some(*v),
            MetadataValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Parse a raw text field into the narrowest matching variant.
    pub fn from_field(s: &str) -> MetadataValue {
        if s.is_empty() {
            return MetadataValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return MetadataValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return MetadataValue::Float(f);
        }
        if s == "true" || s == "false" {
            return MetadataValue::Bool(s == "true");
        }
        MetadataValue::String(s.to_string())
    }
}

/// Metadata columns of a spectrum: column name → value.
pub type Metadata = BTreeMap<String, MetadataValue>;

// ---------------------------------------------------------------------------
// Spectrum – one open document
// ---------------------------------------------------------------------------

/// One set of paired wavelength/intensity measurements treated as a single
/// document.
///
/// The numeric sequences are private: they always have equal length, and the
/// only way to change them after construction is through the workspace edit
/// API ([`Workspace::set_point`]).
///
/// [`Workspace::set_point`]: crate::store::Workspace::set_point
#[derive(Debug, Clone, Serialize)]
pub struct Spectrum {
    #[serde(skip)]
    id: String,
    wavelengths: Vec<f64>,
    intensities: Vec<f64>,
    /// Additional numeric series (extra CSV columns), each parallel to
    /// `wavelengths`.
    #[serde(skip)]
    extra_series: Vec<(String, Vec<f64>)>,
    #[serde(flatten)]
    metadata: Metadata,
}

impl Spectrum {
    /// Build a spectrum, checking the parallel-sequence invariant.
    pub fn new(
        id: impl Into<String>,
        wavelengths: Vec<f64>,
        intensities: Vec<f64>,
        metadata: Metadata,
    ) -> Result<Self> {
        if wavelengths.len() != intensities.len() {
            return Err(DataError::LengthMismatch {
                wavelengths: wavelengths.len(),
                intensities: intensities.len(),
            });
        }
        Ok(Spectrum {
            id: id.into(),
            wavelengths,
            intensities,
            extra_series: Vec::new(),
            metadata,
        })
    }

    /// Attach an extra numeric series; must match the axis length.
    pub fn with_extra_series(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        if values.len() != self.wavelengths.len() {
            return Err(DataError::LengthMismatch {
                wavelengths: self.wavelengths.len(),
                intensities: values.len(),
            });
        }
        self.extra_series.push((name.into(), values));
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    /// Extra series as `(column name, values)` pairs, in source order.
    pub fn extra_series(&self) -> &[(String, Vec<f64>)] {
        &self.extra_series
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    /// `(wavelength, intensity)` pairs in axis order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavelengths
            .iter()
            .copied()
            .zip(self.intensities.iter().copied())
    }

    // Crate-internal mutators, reached through the workspace edit API.

    pub(crate) fn set_id(&mut self, id: String) {
        self.id = id;
    }

    pub(crate) fn set_point_unchecked(&mut self, index: usize, wavelength: f64, intensity: f64) {
        self.wavelengths[index] = wavelength;
        self.intensities[index] = intensity;
    }
}
