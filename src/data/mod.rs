/// Data layer: core types and the format readers/writers.
///
/// Architecture:
/// ```text
///  .csv (long) / .csv (wide) / .jdx / .json
///        │
///        ▼
///   ┌───────────────────────────┐
///   │ csv_io / table /          │  parse bytes → Spectrum(s)
///   │ jcamp / json_io           │
///   └───────────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Spectrum  │  parallel wavelength/intensity series + metadata
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Workspace │  open documents, keyed by unique id
///   └──────────┘
/// ```
pub mod csv_io;
pub mod jcamp;
pub mod json_io;
pub mod model;
pub mod table;
