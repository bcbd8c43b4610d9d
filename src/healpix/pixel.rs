//! HEALPix pixel numbering: conversion between RING and NESTED indices.
//!
//! Both schemes are expressed through the intermediate `(ix, iy, face)`
//! triple, where `face` is one of the 12 base pixels and `(ix, iy)` are the
//! integer coordinates inside that face (`0..nside`).

use crate::error::MapError;

/// Ring index of the northernmost vertex of each base face, in units of nside.
const JRLL: [i64; 12] = [2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4];
/// Longitude index of the center of each base face, in units of nside / 2.
const JPLL: [i64; 12] = [1, 3, 5, 7, 0, 2, 4, 6, 1, 3, 5, 7];

/// Number of pixels of a full-sky map at the given resolution.
pub fn nside2npix(nside: u32) -> usize {
    12 * nside as usize * nside as usize
}

/// Inverse of [`nside2npix`]; fails when `npix` is not `12 * nside^2` for a
/// power-of-two `nside`.
pub fn npix2nside(npix: usize) -> Result<u32, MapError> {
    let face = npix / 12;
    let nside = (face as f64).sqrt().round() as u64;
    if npix == 0 || npix % 12 != 0 || (nside * nside) as usize != face {
        return Err(MapError::Unsupported(format!(
            "{npix} pixels is not a full-sky HEALPix map"
        )));
    }
    let nside = u32::try_from(nside).map_err(|_| MapError::Unsupported(format!("{npix} pixels")))?;
    check_nside(nside)?;
    Ok(nside)
}

/// Largest resolution HEALPix defines.
pub const MAX_NSIDE: u32 = 1 << 29;

/// Check that `nside` is a power of two no larger than [`MAX_NSIDE`].
pub fn check_nside(nside: u32) -> Result<(), MapError> {
    if nside == 0 || !nside.is_power_of_two() || nside > MAX_NSIDE {
        return Err(MapError::InvalidNside(nside));
    }
    Ok(())
}

/// Integer square root, exact for all inputs used here.
fn isqrt(v: i64) -> i64 {
    let mut r = (v as f64).sqrt() as i64;
    while r * r > v {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= v {
        r += 1;
    }
    r
}

/// Interleave the low 32 bits of `v` with zeros: bit `i` moves to bit `2i`.
fn spread_bits(v: i64) -> i64 {
    let mut out = 0;
    for bit in 0..32 {
        out |= ((v >> bit) & 1) << (2 * bit);
    }
    out
}

/// Inverse of [`spread_bits`]: collect the even bits of `v`.
fn compress_bits(v: i64) -> i64 {
    let mut out = 0;
    for bit in 0..32 {
        out |= ((v >> (2 * bit)) & 1) << bit;
    }
    out
}

/// Pixel geometry for one resolution.
#[derive(Debug, Clone, Copy)]
struct Layout {
    nside: i64,
    npface: i64,
    ncap: i64,
    npix: i64,
}

impl Layout {
    fn new(nside: u32) -> Self {
        let nside = nside as i64;
        Self {
            nside,
            npface: nside * nside,
            ncap: 2 * nside * (nside - 1),
            npix: 12 * nside * nside,
        }
    }

    fn nest2xyf(&self, pix: i64) -> (i64, i64, usize) {
        let face = (pix / self.npface) as usize;
        let p = pix % self.npface;
        (compress_bits(p), compress_bits(p >> 1), face)
    }

    fn xyf2nest(&self, ix: i64, iy: i64, face: usize) -> i64 {
        face as i64 * self.npface + spread_bits(ix) + (spread_bits(iy) << 1)
    }

    fn ring2xyf(&self, pix: i64) -> (i64, i64, usize) {
        let nside = self.nside;
        let (iring, iphi, kshift, nr, face) = if pix < self.ncap {
            // north polar cap
            let iring = (1 + isqrt(1 + 2 * pix)) >> 1;
            let iphi = (pix + 1) - 2 * iring * (iring - 1);
            let face = ((iphi - 1) / iring) as usize;
            (iring, iphi, 0, iring, face)
        } else if pix < self.npix - self.ncap {
            // equatorial belt
            let ip = pix - self.ncap;
            let tmp = ip / (4 * nside);
            let iring = tmp + nside;
            let iphi = ip - tmp * 4 * nside + 1;
            let kshift = (iring + nside) & 1;
            let ire = tmp + 1;
            let irm = 2 * nside + 2 - ire;
            let ifm = (iphi - ire / 2 + nside - 1) / nside;
            let ifp = (iphi - irm / 2 + nside - 1) / nside;
            let face = if ifp == ifm {
                ifp | 4
            } else if ifp < ifm {
                ifp
            } else {
                ifm + 8
            };
            (iring, iphi, kshift, nside, face as usize)
        } else {
            // south polar cap
            let ip = self.npix - pix;
            let iring = (1 + isqrt(2 * ip - 1)) >> 1;
            let iphi = 4 * iring + 1 - (ip - 2 * iring * (iring - 1));
            let face = 8 + ((iphi - 1) / iring) as usize;
            (4 * nside - iring, iphi, 0, iring, face)
        };

        let irt = iring - JRLL[face] * nside + 1;
        let mut ipt = 2 * iphi - JPLL[face] * nr - kshift - 1;
        if ipt >= 2 * nside {
            ipt -= 8 * nside;
        }
        ((ipt - irt) >> 1, (-ipt - irt) >> 1, face)
    }

    fn xyf2ring(&self, ix: i64, iy: i64, face: usize) -> i64 {
        let nside = self.nside;
        let nl4 = 4 * nside;
        let jr = JRLL[face] * nside - ix - iy - 1;

        let (nr, n_before, kshift) = if jr < nside {
            (jr, 2 * jr * (jr - 1), 0)
        } else if jr > 3 * nside {
            let nr = nl4 - jr;
            (nr, self.npix - 2 * (nr + 1) * nr, 0)
        } else {
            (nside, self.ncap + (jr - nside) * nl4, (jr - nside) & 1)
        };

        let mut jp = (JPLL[face] * nr + ix - iy + 1 + kshift) / 2;
        if jp > nl4 {
            jp -= nl4;
        } else if jp < 1 {
            jp += nl4;
        }
        n_before + jp - 1
    }
}

/// Convert a RING pixel index to the NESTED index of the same pixel.
pub fn ring2nest(nside: u32, pix: usize) -> usize {
    let layout = Layout::new(nside);
    let (ix, iy, face) = layout.ring2xyf(pix as i64);
    layout.xyf2nest(ix, iy, face) as usize
}

/// Convert a NESTED pixel index to the RING index of the same pixel.
pub fn nest2ring(nside: u32, pix: usize) -> usize {
    let layout = Layout::new(nside);
    let (ix, iy, face) = layout.nest2xyf(pix as i64);
    layout.xyf2ring(ix, iy, face) as usize
}

/// Reorder a full RING map into NESTED order.
pub fn reorder_ring_to_nest<T: Copy + Default>(nside: u32, ring: &[T]) -> Vec<T> {
    let layout = Layout::new(nside);
    let mut nest = vec![T::default(); ring.len()];
    for (ipix, &value) in ring.iter().enumerate() {
        let (ix, iy, face) = layout.ring2xyf(ipix as i64);
        nest[layout.xyf2nest(ix, iy, face) as usize] = value;
    }
    nest
}

/// Reorder a full NESTED map into RING order.
pub fn reorder_nest_to_ring<T: Copy + Default>(nside: u32, nest: &[T]) -> Vec<T> {
    let layout = Layout::new(nside);
    let mut ring = vec![T::default(); nest.len()];
    for (ipix, &value) in nest.iter().enumerate() {
        let (ix, iy, face) = layout.nest2xyf(ipix as i64);
        ring[layout.xyf2ring(ix, iy, face) as usize] = value;
    }
    ring
}
