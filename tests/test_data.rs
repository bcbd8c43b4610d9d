//! Shared fixture helpers: synthetic HEALPix maps written to a scratch directory.
//!
//! Each test gets its own directory under the system temp dir so tests can
//! run in parallel without sharing files.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use skyclean::healpix::write_map;
use skyclean::{HealpixMap, Ordering};

/// Fresh, empty scratch directory for one test.
pub fn fixture_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("skyclean-it-{}-{}", name, std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir)
            .unwrap_or_else(|e| panic!("Failed to clear {:?}: {}", dir, e));
    }
    std::fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("Failed to create {:?}: {}", dir, e));
    dir
}

/// Write a map with every pixel set to `value`.
pub fn write_constant_map(path: &Path, nside: u32, value: f64) {
    let map = HealpixMap::filled(nside, value).expect("valid nside");
    write_map(path, &map).unwrap_or_else(|e| panic!("Failed to write {:?}: {}", path, e));
}

/// Write a Gaussian random map (seeded) and return its pixel values in the
/// ordering it was written with.
pub fn write_noise_map(
    path: &Path,
    nside: u32,
    ordering: Ordering,
    mean: f64,
    sigma: f64,
    seed: u64,
) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(mean, sigma).expect("valid sigma");
    let npix = 12 * nside as usize * nside as usize;
    let values: Vec<f64> = (0..npix).map(|_| normal.sample(&mut rng)).collect();
    let map = HealpixMap::new(nside, ordering, values.clone()).expect("valid map");
    write_map(path, &map).unwrap_or_else(|e| panic!("Failed to write {:?}: {}", path, e));
    values
}

/// Write a map from explicit values.
pub fn write_values(path: &Path, nside: u32, ordering: Ordering, values: Vec<f64>) {
    let map = HealpixMap::new(nside, ordering, values).expect("valid map");
    write_map(path, &map).unwrap_or_else(|e| panic!("Failed to write {:?}: {}", path, e));
}
