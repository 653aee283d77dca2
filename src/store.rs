use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::info;

use crate::data::csv_io::{self, CsvOptions};
use crate::data::jcamp;
use crate::data::json_io;
use crate::data::model::Spectrum;
use crate::data::table;
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Workspace – the set of open spectra
// ---------------------------------------------------------------------------

/// The in-memory collection of currently open spectra.
///
/// Entries keep insertion order (so UI lists are deterministic) and carry
/// unique ids: importing a second source that would collide gets a `-2`,
/// `-3`, ... suffix instead of overwriting.
///
/// All operations are synchronous and atomic: a failed import leaves the
/// workspace exactly as it was. The workspace itself is plain `&mut` state;
/// a host that adds threads puts its own lock around it.
#[derive(Debug, Default)]
pub struct Workspace {
    entries: Vec<Spectrum>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    // -- import ------------------------------------------------------------

    /// Import a long-format CSV file (`wavelength,intensity[,...]` rows) with
    /// default options. The new spectrum's id derives from the file stem.
    pub fn import_csv(&mut self, path: impl AsRef<Path>) -> Result<&Spectrum> {
        self.import_csv_with(path, &CsvOptions::default())
    }

    /// Same as [`import_csv`](Self::import_csv) with explicit options.
    pub fn import_csv_with(&mut self, path: impl AsRef<Path>, opts: &CsvOptions) -> Result<&Spectrum> {
        let path = path.as_ref();
        let file = File::open(path)?;
        self.import_csv_reader(BufReader::new(file), &source_name(path), opts)
    }

    /// Import long-format CSV from any reader, e.g. an in-memory buffer or a
    /// stream handed over by the host. `name` seeds the spectrum id.
    pub fn import_csv_reader<R: Read>(
        &mut self,
        reader: R,
        name: &str,
        opts: &CsvOptions,
    ) -> Result<&Spectrum> {
        let spectrum = csv_io::read_spectrum(reader, name, opts)?;
        Ok(self.insert(spectrum))
    }

    /// Import a wide-format table (one row per sample, numeric header names
    /// as the wavelength axis). Returns the ids of all spectra added.
    pub fn import_table(&mut self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let spectra = table::read_table(BufReader::new(file), &source_name(path), b',')?;
        Ok(self.insert_all(spectra))
    }

    /// Import a JCAMP-DX file; compound files add one spectrum per block.
    /// Returns the ids of all spectra added.
    pub fn import_jcamp(&mut self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let spectra = jcamp::read_jcamp(BufReader::new(file), &source_name(path))?;
        Ok(self.insert_all(spectra))
    }

    /// Import records-oriented JSON. Returns the ids of all spectra added.
    pub fn import_json(&mut self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let spectra = json_io::read_records(BufReader::new(file), &source_name(path))?;
        Ok(self.insert_all(spectra))
    }

    // -- export ------------------------------------------------------------

    /// Write an open spectrum to a CSV file with default options.
    pub fn export_csv(&self, id: &str, path: impl AsRef<Path>) -> Result<()> {
        self.export_csv_with(id, path, &CsvOptions::default())
    }

    /// Same as [`export_csv`](Self::export_csv) with explicit options.
    pub fn export_csv_with(
        &self,
        id: &str,
        path: impl AsRef<Path>,
        opts: &CsvOptions,
    ) -> Result<()> {
        let spectrum = self.get_or_not_found(id)?;
        let file = File::create(path.as_ref())?;
        csv_io::write_spectrum(BufWriter::new(file), spectrum, opts)?;
        info!("exported '{id}' to {}", path.as_ref().display());
        Ok(())
    }

    /// Write an open spectrum as CSV to any writer.
    pub fn export_csv_writer<W: Write>(&self, id: &str, writer: W, opts: &CsvOptions) -> Result<()> {
        let spectrum = self.get_or_not_found(id)?;
        csv_io::write_spectrum(writer, spectrum, opts)
    }

    /// Write an open spectrum as a single-record JSON array.
    pub fn export_json(&self, id: &str, path: impl AsRef<Path>) -> Result<()> {
        let spectrum = self.get_or_not_found(id)?;
        let file = File::create(path.as_ref())?;
        json_io::write_records(BufWriter::new(file), spectrum)
    }

    // -- lifecycle ---------------------------------------------------------

    /// Close an open spectrum, returning it. Fails with `NotFound` for an
    /// unknown id.
    pub fn close(&mut self, id: &str) -> Result<Spectrum> {
        let idx = self
            .entries
            .iter()
            .position(|sp| sp.id() == id)
            .ok_or_else(|| DataError::NotFound(id.to_string()))?;
        let removed = self.entries.remove(idx);
        info!("closed '{id}'");
        Ok(removed)
    }

    /// Ids of all open spectra, in insertion order.
    pub fn list_open(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|sp| sp.id())
    }

    /// Look up an open spectrum.
    pub fn get(&self, id: &str) -> Option<&Spectrum> {
        self.entries.iter().find(|sp| sp.id() == id)
    }

    /// Number of open spectra.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -- edit --------------------------------------------------------------

    /// Replace one point of an open spectrum. The only mutation path into a
    /// spectrum's numeric sequences, so the parallel-length invariant holds
    /// by construction.
    pub fn set_point(&mut self, id: &str, index: usize, wavelength: f64, intensity: f64) -> Result<()> {
        let spectrum = self
            .entries
            .iter_mut()
            .find(|sp| sp.id() == id)
            .ok_or_else(|| DataError::NotFound(id.to_string()))?;
        if index >= spectrum.len() {
            return Err(DataError::PointOutOfRange {
                id: id.to_string(),
                index,
                len: spectrum.len(),
            });
        }
        spectrum.set_point_unchecked(index, wavelength, intensity);
        Ok(())
    }

    // -- internals ---------------------------------------------------------

    fn get_or_not_found(&self, id: &str) -> Result<&Spectrum> {
        self.get(id).ok_or_else(|| DataError::NotFound(id.to_string()))
    }

    /// Register a spectrum under a collision-free id.
    fn insert(&mut self, mut spectrum: Spectrum) -> &Spectrum {
        let id = self.unique_id(spectrum.id());
        spectrum.set_id(id.clone());
        info!("opened '{id}' ({} points)", spectrum.len());
        self.entries.push(spectrum);
        self.entries.last().expect("just pushed")
    }

    fn insert_all(&mut self, spectra: Vec<Spectrum>) -> Vec<String> {
        spectra
            .into_iter()
            .map(|sp| self.insert(sp).id().to_string())
            .collect()
    }

    fn unique_id(&self, base: &str) -> String {
        if self.get(base).is_none() {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}-{n}");
            if self.get(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Identifier seed for a spectrum imported from a file: the file stem.
fn source_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("spectrum")
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    const SAMPLE: &str = "wavelength,intensity\n900,0.12\n902,0.15\n904,0.20\n";

    fn import(ws: &mut Workspace, name: &str, text: &str) -> Result<String> {
        ws.import_csv_reader(text.as_bytes(), name, &CsvOptions::default())
            .map(|sp| sp.id().to_string())
    }

    #[test]
    fn import_adds_to_workspace() {
        let mut ws = Workspace::new();
        let id = import(&mut ws, "sample1", SAMPLE).unwrap();
        assert_eq!(id, "sample1");
        assert_eq!(ws.list_open().collect::<Vec<_>>(), vec!["sample1"]);
        let sp = ws.get("sample1").unwrap();
        assert_eq!(sp.wavelengths(), &[900.0, 902.0, 904.0]);
        assert_eq!(sp.intensities(), &[0.12, 0.15, 0.20]);
    }

    #[test]
    fn failed_import_leaves_workspace_unchanged() {
        let mut ws = Workspace::new();
        import(&mut ws, "good", SAMPLE).unwrap();
        let before: Vec<String> = ws.list_open().map(str::to_string).collect();

        let err = import(&mut ws, "bad", "wavelength,intensity\n900,0.12\n902\n");
        assert!(matches!(err, Err(DataError::Format { .. })));

        let after: Vec<String> = ws.list_open().map(str::to_string).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn colliding_ids_get_suffixes() {
        let mut ws = Workspace::new();
        assert_eq!(import(&mut ws, "sample", SAMPLE).unwrap(), "sample");
        assert_eq!(import(&mut ws, "sample", SAMPLE).unwrap(), "sample-2");
        assert_eq!(import(&mut ws, "sample", SAMPLE).unwrap(), "sample-3");
        assert_eq!(ws.len(), 3);
    }

    #[test]
    fn list_open_preserves_insertion_order() {
        let mut ws = Workspace::new();
        import(&mut ws, "zeta", SAMPLE).unwrap();
        import(&mut ws, "alpha", SAMPLE).unwrap();
        import(&mut ws, "mid", SAMPLE).unwrap();
        assert_eq!(
            ws.list_open().collect::<Vec<_>>(),
            vec!["zeta", "alpha", "mid"]
        );
    }

    #[test]
    fn close_removes_and_returns() {
        let mut ws = Workspace::new();
        import(&mut ws, "a", SAMPLE).unwrap();
        import(&mut ws, "b", SAMPLE).unwrap();
        let closed = ws.close("a").unwrap();
        assert_eq!(closed.id(), "a");
        assert_eq!(ws.list_open().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn close_unknown_is_not_found() {
        let mut ws = Workspace::new();
        let err = ws.close("ghost").unwrap_err();
        assert!(matches!(err, DataError::NotFound(id) if id == "ghost"));
    }

    #[test]
    fn export_unknown_is_not_found() {
        let ws = Workspace::new();
        let mut buf = Vec::new();
        let err = ws
            .export_csv_writer("sample1", &mut buf, &CsvOptions::default())
            .unwrap_err();
        assert!(matches!(err, DataError::NotFound(id) if id == "sample1"));
    }

    #[test]
    fn set_point_edits_in_place() {
        let mut ws = Workspace::new();
        import(&mut ws, "edit", SAMPLE).unwrap();
        ws.set_point("edit", 1, 902.0, 0.99).unwrap();
        assert_eq!(ws.get("edit").unwrap().intensities(), &[0.12, 0.99, 0.20]);
    }

    #[test]
    fn set_point_out_of_range() {
        let mut ws = Workspace::new();
        import(&mut ws, "edit", SAMPLE).unwrap();
        let err = ws.set_point("edit", 3, 906.0, 0.5).unwrap_err();
        assert!(matches!(
            err,
            DataError::PointOutOfRange {
                index: 3,
                len: 3,
                ..
            }
        ));
    }

    #[test]
    fn file_round_trip_through_the_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let in_path = dir.path().join("grain.csv");
        let out_path = dir.path().join("grain_out.csv");
        {
            let mut f = File::create(&in_path).unwrap();
            f.write_all(SAMPLE.as_bytes()).unwrap();
        }

        let mut ws = Workspace::new();
        let id = ws.import_csv(&in_path).unwrap().id().to_string();
        assert_eq!(id, "grain");
        ws.export_csv(&id, &out_path).unwrap();

        let mut ws2 = Workspace::new();
        let id2 = ws2.import_csv(&out_path).unwrap().id().to_string();
        let (a, b) = (ws.get(&id).unwrap(), ws2.get(&id2).unwrap());
        assert_eq!(a.wavelengths(), b.wavelengths());
        assert_eq!(a.intensities(), b.intensities());
    }

    #[test]
    fn missing_file_is_io() {
        let mut ws = Workspace::new();
        let err = ws.import_csv("/nonexistent/spectrum.csv").unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
        assert!(ws.is_empty());
    }
}
