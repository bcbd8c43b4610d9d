//! # skyclean
//!
//! Spectral mixing matrices and constraint vectors for **Internal Linear
//! Combination (ILC)** component separation of multi-frequency microwave sky
//! maps.
//!
//! An ILC solver needs two inputs besides the maps themselves:
//!
//! - the **mixing matrix** `F` (frequencies × components), whose column `j` is
//!   the frequency response of one physical component, and
//! - the **constraint vector** `f` (one entry per column of `F`), which selects
//!   the component(s) to preserve.
//!
//! This crate builds both, keeping the two aligned by component *name* so that
//! reordering the components never silently changes what the ILC extracts.
//!
//! ## Features
//!
//! - **Theoretical responses**: closed-form CMB, thermal SZ and synchrotron
//!   spectra in K_CMB, with caller-controlled column order
//! - **Empirical responses**: masked means of component maps on disk,
//!   tolerant of channels that were never downloaded
//! - **Name-aligned constraints**: case-insensitive, idempotent name →
//!   column mapping with descriptive errors
//! - **HEALPix map I/O**: FITS binary-table reader/writer, RING/NESTED
//!   reordering and healpy-compatible `ud_grade`
//!
//! ## Example
//!
//! ```no_run
//! use skyclean::{find_f_from_extract_comp, SpectralSource, SpectralVector, TheoryConfig};
//!
//! let config = TheoryConfig {
//!     components_order: Some(vec!["tsz".into(), "cmb".into(), "sync".into()]),
//!     ..Default::default()
//! };
//! let sv = SpectralVector::get_f(&SpectralSource::Theory(config)).unwrap();
//!
//! // f has a 1 in the cmb column, wherever that column ended up
//! let f = find_f_from_extract_comp(
//!     &sv.matrix,
//!     "cmb",
//!     &sv.reference_vectors,
//!     Some(sv.columns.as_slice()),
//! )
//! .unwrap();
//! assert_eq!(f.as_slice(), &[0.0, 1.0, 0.0]);
//! ```
//!
//! Empirical matrices are built from map files named by templates:
//!
//! ```no_run
//! use skyclean::{EmpiricalConfig, SpectralVector};
//!
//! let config = EmpiricalConfig::new("data/", &["030", "070", "143"])
//!     .with_template("cmb", "cmb_r{realisation:04d}_{frequency}.fits")
//!     .with_template("sync", "sync_{frequency}.fits")
//!     .with_mask("data/mask_gal60.fits")
//!     .with_realisation(3);
//! let sv = SpectralVector::build_f_empirical(&config).unwrap();
//! println!("F =\n{}", sv.matrix);
//! ```

pub mod component;
pub mod constraint;
pub mod error;
pub mod frequency;
pub mod healpix;
pub mod spectral;
pub mod template;

pub use component::{Component, DEFAULT_COMPONENTS_ORDER};
pub use constraint::{find_f_from_extract_comp, find_f_from_names, Selection};
pub use error::{MapError, SpectralError};
pub use frequency::{Frequency, PLANCK_FREQUENCIES};
pub use healpix::{HealpixMap, Ordering};
pub use spectral::{
    EmpiricalConfig, ReferenceVectors, SourceKind, SpectralSource, SpectralVector, TheoryConfig,
};
pub use template::FileTemplate;

/// Mixing matrix type: rows are frequencies, columns are components.
pub type MixingMatrix = nalgebra::DMatrix<f64>;
/// Constraint and response vector type.
pub type Vector = nalgebra::DVector<f64>;
