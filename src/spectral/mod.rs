//! Construction of the spectral mixing matrix `F`.
//!
//! `F` has one row per frequency channel and one column per component. Column
//! `j` is the raw (unnormalized) frequency response of component `columns[j]`.
//! Two builders produce it:
//!
//! 1. **Theory** ([`theory`]): closed-form responses for CMB, thermal SZ and
//!    synchrotron, in thermodynamic CMB units.
//! 2. **Empirical** ([`empirical`]): the masked mean of each component's sky
//!    map at each frequency, read from disk.
//!
//! Both keep the column order the caller asked for (restricted to what they
//! can build) and return the same [`SpectralVector`] shape, so a constraint
//! vector built from [`SpectralVector::columns`] always lines up with `F`.

pub mod empirical;
pub mod theory;

use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, DVector};

use crate::constraint::{find_f_from_names, Selection};
use crate::error::SpectralError;

pub use empirical::EmpiricalConfig;
pub use theory::TheoryConfig;

/// Raw response vectors keyed by component name, in insertion order.
///
/// Inserting an existing name replaces its vector and keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceVectors {
    entries: Vec<(String, DVector<f64>)>,
}

impl ReferenceVectors {
    pub fn insert(&mut self, name: impl Into<String>, vector: DVector<f64>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = vector,
            None => self.entries.push((name, vector)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DVector<f64>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Component names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DVector<f64>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A built mixing matrix with the metadata needed to use it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralVector {
    /// Mixing matrix `F`, shape `(frequencies.len(), columns.len())`.
    pub matrix: DMatrix<f64>,
    /// Component name of each column of `matrix`, in column order.
    pub columns: Vec<String>,
    /// Raw response vector of each component.
    pub reference_vectors: ReferenceVectors,
    /// Frequency tags of the rows of `matrix`, in row order.
    pub frequencies: Vec<String>,
}

impl SpectralVector {
    /// Assemble from per-column vectors; every vector must have one entry per
    /// frequency.
    pub(crate) fn from_columns(
        columns: Vec<String>,
        vectors: Vec<DVector<f64>>,
        frequencies: Vec<String>,
    ) -> Self {
        let nfreq = frequencies.len();
        debug_assert_eq!(columns.len(), vectors.len());
        debug_assert!(vectors.iter().all(|v| v.len() == nfreq));

        let matrix = DMatrix::from_fn(nfreq, vectors.len(), |i, j| vectors[j][i]);
        let mut reference_vectors = ReferenceVectors::default();
        for (name, v) in columns.iter().zip(vectors) {
            reference_vectors.insert(name.clone(), v);
        }
        Self {
            matrix,
            columns,
            reference_vectors,
            frequencies,
        }
    }

    /// Build `F` from the closed-form component responses.
    pub fn build_f_theory(config: &TheoryConfig) -> Result<Self, SpectralError> {
        theory::build(config)
    }

    /// Build `F` from masked means of sky maps on disk.
    pub fn build_f_empirical(config: &EmpiricalConfig) -> Result<Self, SpectralError> {
        empirical::build(config)
    }

    /// Build `F` with whichever builder `source` selects.
    pub fn get_f(source: &SpectralSource) -> Result<Self, SpectralError> {
        match source {
            SpectralSource::Theory(config) => Self::build_f_theory(config),
            SpectralSource::Empirical(config) => Self::build_f_empirical(config),
        }
    }

    /// [`get_f`](Self::get_f) with the mode given by name, `"theory"` or
    /// `"empirical"`. The config of the other mode is ignored.
    pub fn get_f_named(
        source: &str,
        theory: TheoryConfig,
        empirical: EmpiricalConfig,
    ) -> Result<Self, SpectralError> {
        let kind: SourceKind = source.parse()?;
        Self::get_f(&SpectralSource::select(kind, theory, empirical))
    }

    /// Constraint vector for `targets`, aligned to this matrix's columns.
    pub fn constraint_for(&self, targets: impl Into<Selection>) -> Result<DVector<f64>, SpectralError> {
        find_f_from_names(self.columns.as_slice(), targets).map(|(f, _)| f)
    }

    pub fn nfreq(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ncomp(&self) -> usize {
        self.matrix.ncols()
    }

    /// Column of `F` for a component, by name (case-insensitive).
    pub fn column(&self, name: &str) -> Option<DVector<f64>> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .map(|j| self.matrix.column(j).into_owned())
    }

    /// Split into `(F, F_cols, reference_vectors, frequencies)`.
    pub fn into_parts(self) -> (DMatrix<f64>, Vec<String>, ReferenceVectors, Vec<String>) {
        (
            self.matrix,
            self.columns,
            self.reference_vectors,
            self.frequencies,
        )
    }
}

/// Names the construction mode without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Theory,
    Empirical,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Theory => "theory",
            SourceKind::Empirical => "empirical",
        }
    }
}

impl FromStr for SourceKind {
    type Err = SpectralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "theory" => Ok(SourceKind::Theory),
            "empirical" => Ok(SourceKind::Empirical),
            other => Err(SpectralError::UnknownSource {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A construction mode together with its parameters.
#[derive(Debug, Clone)]
pub enum SpectralSource {
    Theory(TheoryConfig),
    Empirical(EmpiricalConfig),
}

impl SpectralSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            SpectralSource::Theory(_) => SourceKind::Theory,
            SpectralSource::Empirical(_) => SourceKind::Empirical,
        }
    }

    /// Keep the config matching `kind`.
    pub fn select(kind: SourceKind, theory: TheoryConfig, empirical: EmpiricalConfig) -> Self {
        match kind {
            SourceKind::Theory => SpectralSource::Theory(theory),
            SourceKind::Empirical => SpectralSource::Empirical(empirical),
        }
    }
}

impl Default for SpectralSource {
    fn default() -> Self {
        SpectralSource::Theory(TheoryConfig::default())
    }
}

impl From<TheoryConfig> for SpectralSource {
    fn from(config: TheoryConfig) -> Self {
        SpectralSource::Theory(config)
    }
}

impl From<EmpiricalConfig> for SpectralSource {
    fn from(config: EmpiricalConfig) -> Self {
        SpectralSource::Empirical(config)
    }
}
