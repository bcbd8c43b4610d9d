//! Full-sky HEALPix scalar maps.
//!
//! A [`HealpixMap`] holds `12 * nside^2` pixel values in either RING or
//! NESTED order. Maps read from disk are always returned in RING order, the
//! same convention healpy's `read_map` uses by default, so that a data map and
//! a mask read from different files index the same sky positions.
//!
//! [`HealpixMap::ud_grade`] changes resolution the way healpy's `ud_grade`
//! does with `power=0` and `pess=False`: degrading averages the valid children
//! of each coarse pixel, upgrading repeats each parent value.

pub mod fits;
pub mod pixel;

pub use fits::{read_map, write_map};
pub use pixel::{nest2ring, npix2nside, nside2npix, ring2nest};

use crate::error::MapError;

/// Sentinel for missing pixels, matching healpy's `UNSEEN`.
pub const UNSEEN: f64 = -1.6375e30;

/// Pixel numbering scheme of a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    Ring,
    Nested,
}

impl Ordering {
    /// Value of the FITS `ORDERING` keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            Ordering::Ring => "RING",
            Ordering::Nested => "NESTED",
        }
    }

    /// Parse the FITS `ORDERING` keyword (`NEST` is accepted as well).
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RING" => Some(Ordering::Ring),
            "NESTED" | "NEST" => Some(Ordering::Nested),
            _ => None,
        }
    }
}

/// A full-sky HEALPix map of `f64` values.
#[derive(Debug, Clone, PartialEq)]
pub struct HealpixMap {
    nside: u32,
    ordering: Ordering,
    values: Vec<f64>,
}

/// Whether a pixel value contributes to averages.
fn is_valid(v: f64) -> bool {
    v.is_finite() && v != UNSEEN
}

impl HealpixMap {
    /// Wrap pixel values; `values.len()` must equal `12 * nside^2`.
    pub fn new(nside: u32, ordering: Ordering, values: Vec<f64>) -> Result<Self, MapError> {
        pixel::check_nside(nside)?;
        let expected = nside2npix(nside);
        if values.len() != expected {
            return Err(MapError::LengthMismatch {
                nside,
                len: values.len(),
                expected,
            });
        }
        Ok(Self {
            nside,
            ordering,
            values,
        })
    }

    /// Wrap pixel values, inferring `nside` from their count.
    pub fn from_values(ordering: Ordering, values: Vec<f64>) -> Result<Self, MapError> {
        let nside = npix2nside(values.len())?;
        Self::new(nside, ordering, values)
    }

    /// A constant-valued RING map.
    pub fn filled(nside: u32, value: f64) -> Result<Self, MapError> {
        pixel::check_nside(nside)?;
        Self::new(nside, Ordering::Ring, vec![value; nside2npix(nside)])
    }

    pub fn nside(&self) -> u32 {
        self.nside
    }

    pub fn ordering(&self) -> Ordering {
        self.ordering
    }

    pub fn npix(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Return the same map in the requested ordering.
    pub fn reorder(self, ordering: Ordering) -> Self {
        if self.ordering == ordering {
            return self;
        }
        let values = match ordering {
            Ordering::Nested => pixel::reorder_ring_to_nest(self.nside, &self.values),
            Ordering::Ring => pixel::reorder_nest_to_ring(self.nside, &self.values),
        };
        Self {
            nside: self.nside,
            ordering,
            values,
        }
    }

    /// Change resolution to `nside_out`, keeping the map's ordering.
    ///
    /// Degrading sets each coarse pixel to the mean of its valid (finite and
    /// not [`UNSEEN`]) children, or [`UNSEEN`] when none is valid. Upgrading
    /// copies each parent value to its children.
    pub fn ud_grade(&self, nside_out: u32) -> Result<Self, MapError> {
        pixel::check_nside(nside_out)?;
        if nside_out == self.nside {
            return Ok(self.clone());
        }
        let ordering = self.ordering;
        let nest = self.clone().reorder(Ordering::Nested);

        let values = if nside_out < self.nside {
            let ratio = (self.nside / nside_out) as usize;
            nest.values
                .chunks(ratio * ratio)
                .map(|children| {
                    let (sum, hits) = children
                        .iter()
                        .filter(|v| is_valid(**v))
                        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                    if hits == 0 {
                        UNSEEN
                    } else {
                        sum / hits as f64
                    }
                })
                .collect()
        } else {
            let ratio = (nside_out / self.nside) as usize;
            nest.values
                .iter()
                .flat_map(|&v| std::iter::repeat(v).take(ratio * ratio))
                .collect()
        };

        Ok(Self {
            nside: nside_out,
            ordering: Ordering::Nested,
            values,
        }
        .reorder(ordering))
    }

    /// Boolean inclusion set: `true` where the pixel value is strictly positive.
    pub fn threshold(&self) -> Vec<bool> {
        self.values.iter().map(|&v| v > 0.0).collect()
    }

    /// Mean of the finite pixels selected by `include` (all pixels when
    /// `None`). Returns `Ok(None)` when no pixel is selected.
    ///
    /// `include` must have one entry per pixel.
    pub fn masked_mean(&self, include: Option<&[bool]>) -> Result<Option<f64>, MapError> {
        if let Some(mask) = include {
            if mask.len() != self.values.len() {
                return Err(MapError::LengthMismatch {
                    nside: self.nside,
                    len: mask.len(),
                    expected: self.values.len(),
                });
            }
        }
        let (sum, count) = self
            .values
            .iter()
            .enumerate()
            .filter(|(i, v)| v.is_finite() && include.map_or(true, |m| m[*i]))
            .fold((0.0, 0usize), |(s, n), (_, v)| (s + v, n + 1));
        Ok((count > 0).then(|| sum / count as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_lengths() {
        assert!(matches!(
            HealpixMap::new(2, Ordering::Ring, vec![0.0; 47]),
            Err(MapError::LengthMismatch { expected: 48, .. })
        ));
        assert!(matches!(
            HealpixMap::new(3, Ordering::Ring, vec![0.0; 108]),
            Err(MapError::InvalidNside(3))
        ));
        assert_eq!(HealpixMap::from_values(Ordering::Ring, vec![0.0; 192]).unwrap().nside(), 4);
    }

    #[test]
    fn degrade_averages_children() {
        // In NESTED order the 4 children of coarse pixel p are 4p..4p+4
        let values: Vec<f64> = (0..48).map(|v| v as f64).collect();
        let map = HealpixMap::new(2, Ordering::Nested, values).unwrap();
        let low = map.ud_grade(1).unwrap();
        assert_eq!(low.ordering(), Ordering::Nested);
        for (p, v) in low.values().iter().enumerate() {
            let expected = (4 * p) as f64 + 1.5;
            assert!((v - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn degrade_skips_invalid_children() {
        let mut values = vec![1.0; 48];
        values[0] = f64::NAN;
        values[1] = UNSEEN;
        values[2] = 3.0;
        values[4..8].copy_from_slice(&[UNSEEN; 4]);
        let map = HealpixMap::new(2, Ordering::Nested, values).unwrap();
        let low = map.ud_grade(1).unwrap();
        assert!((low.values()[0] - 2.0).abs() < 1e-12);
        assert_eq!(low.values()[1], UNSEEN);
        assert_eq!(low.values()[2], 1.0);
    }

    #[test]
    fn upgrade_repeats_parent() {
        let values: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let map = HealpixMap::new(1, Ordering::Ring, values).unwrap();
        let high = map.ud_grade(4).unwrap();
        assert_eq!(high.ordering(), Ordering::Ring);
        assert_eq!(high.npix(), 192);

        let nest = high.reorder(Ordering::Nested);
        for (i, v) in nest.values().iter().enumerate() {
            assert_eq!(*v, (i / 16) as f64);
        }
    }

    #[test]
    fn ring_degrade_matches_nested_degrade() {
        let values: Vec<f64> = (0..768).map(|v| (v as f64 * 0.37).sin()).collect();
        let ring = HealpixMap::new(8, Ordering::Ring, values).unwrap();
        let via_ring = ring.ud_grade(2).unwrap();
        let via_nest = ring.clone().reorder(Ordering::Nested).ud_grade(2).unwrap();
        assert_eq!(via_ring, via_nest.reorder(Ordering::Ring));
    }

    #[test]
    fn masked_mean_ignores_non_finite() {
        let mut values = vec![2.0; 12];
        values[3] = f64::INFINITY;
        values[4] = f64::NAN;
        values[5] = 12.0;
        let map = HealpixMap::new(1, Ordering::Ring, values).unwrap();
        assert!((map.masked_mean(None).unwrap().unwrap() - 3.0).abs() < 1e-12);

        let mut include = vec![false; 12];
        include[4] = true;
        include[5] = true;
        assert_eq!(map.masked_mean(Some(&include)).unwrap(), Some(12.0));

        include[5] = false;
        assert_eq!(map.masked_mean(Some(&include)).unwrap(), None);
    }

    #[test]
    fn masked_mean_rejects_wrong_mask_length() {
        let map = HealpixMap::filled(2, 1.0).unwrap();
        let include = vec![true; 12];
        assert!(matches!(
            map.masked_mean(Some(&include)),
            Err(MapError::LengthMismatch {
                nside: 2,
                len: 12,
                expected: 48
            })
        ));
    }
}
