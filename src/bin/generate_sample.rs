//! Generate deterministic sample NIR data for manual testing: a few
//! long-format CSV spectra plus one wide-format table, written through the
//! library so the public API gets exercised end to end.

use std::fs::File;
use std::io::Write;

use anyhow::{Context, Result};
use spectradesk::{CsvOptions, Metadata, Spectrum, Workspace};

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

fn generate_intensities(
    wavelengths: &[f64],
    peaks: &[(f64, f64, f64)],
    noise_level: f64,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    wavelengths
        .iter()
        .map(|&wl| {
            let signal: f64 = peaks
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(wl, mu, sigma, amp))
                .sum();
            signal + rng.gauss(0.0, noise_level)
        })
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = SimpleRng::new(42);

    // NIR wavelengths: 900 → 1698 nm, step 2
    let wavelengths: Vec<f64> = (0..400).map(|i| 900.0 + i as f64 * 2.0).collect();

    let sample_peaks: Vec<(&str, Vec<(f64, f64, f64)>)> = vec![
        ("wheat", vec![(1200.0, 60.0, 0.8), (1450.0, 40.0, 0.5), (1650.0, 30.0, 0.3)]),
        ("barley", vec![(1100.0, 50.0, 0.6), (1400.0, 45.0, 0.7), (1550.0, 35.0, 0.4)]),
        ("rapeseed", vec![(1000.0, 55.0, 0.9), (1300.0, 45.0, 0.4), (1600.0, 25.0, 0.5)]),
    ];

    let mut ws = Workspace::new();

    // One long-format CSV per sample.
    for (name, peaks) in &sample_peaks {
        let intensities = generate_intensities(&wavelengths, peaks, 0.005, &mut rng);
        let spectrum = Spectrum::new(*name, wavelengths.clone(), intensities, Metadata::new())?;

        let path = format!("sample_{name}.csv");
        let file = File::create(&path).with_context(|| format!("creating {path}"))?;
        spectradesk::data::csv_io::write_spectrum(file, &spectrum, &CsvOptions::default())?;
        println!("Wrote {} points to {path}", spectrum.len());

        // Re-import so the workspace sees what a host would.
        ws.import_csv(&path)
            .with_context(|| format!("re-importing {path}"))?;
    }

    // One wide-format table: all samples, axis in the header.
    let table_path = "sample_table.csv";
    {
        let mut file = File::create(table_path).context("creating sample table")?;
        let mut header = vec!["Sample".to_string(), "Product name".to_string()];
        header.extend(wavelengths.iter().map(|wl| wl.to_string()));
        writeln!(file, "{}", header.join(","))?;

        for (name, peaks) in &sample_peaks {
            let intensities = generate_intensities(&wavelengths, peaks, 0.005, &mut rng);
            let mut row = vec![format!("{name}_wide"), "grain".to_string()];
            row.extend(intensities.iter().map(|v| v.to_string()));
            writeln!(file, "{}", row.join(","))?;
        }
    }
    let added = ws.import_table(table_path).context("re-importing table")?;
    println!("Wrote {} spectra to {table_path}", added.len());

    println!(
        "Workspace now holds: {}",
        ws.list_open().collect::<Vec<_>>().join(", ")
    );
    Ok(())
}
