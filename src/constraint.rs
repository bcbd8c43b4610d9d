//! ILC constraint vectors aligned to the columns of a mixing matrix.
//!
//! The constraint vector `f` has one entry per column of `F`, set to 1 for
//! the component(s) the ILC should preserve and 0 for those it should
//! null or ignore. Alignment is always done by column *name*, never by an
//! assumed column order.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::SpectralError;
use crate::spectral::ReferenceVectors;

/// One or more component names selected as ILC targets.
///
/// Built from a single name or from any list of names, so callers can pass
/// `"cmb"`, `["cmb", "tsz"]` or a `Vec<String>` alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection(Vec<String>);

impl Selection {
    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for Selection {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for Selection {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<&String> for Selection {
    fn from(name: &String) -> Self {
        Self(vec![name.clone()])
    }
}

impl From<Vec<String>> for Selection {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<Vec<&str>> for Selection {
    fn from(names: Vec<&str>) -> Self {
        Self(names.into_iter().map(String::from).collect())
    }
}

impl From<&[String]> for Selection {
    fn from(names: &[String]) -> Self {
        Self(names.to_vec())
    }
}

impl From<&[&str]> for Selection {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Selection {
    fn from(names: [&str; N]) -> Self {
        Self(names.iter().map(|s| s.to_string()).collect())
    }
}

/// Build `f` purely from the name→column mapping of `component_names`.
///
/// Matching is case-insensitive. Returns the 0/1 vector aligned to
/// `component_names` and the indices that were set, in selection order.
/// Selecting the same component more than once sets its index only once.
pub fn find_f_from_names<S: AsRef<str>>(
    component_names: &[S],
    selected: impl Into<Selection>,
) -> Result<(DVector<f64>, Vec<usize>), SpectralError> {
    let selected = selected.into();
    let names_lower: Vec<String> = component_names
        .iter()
        .map(|n| n.as_ref().to_lowercase())
        .collect();

    let mut f = DVector::zeros(component_names.len());
    let mut idxs: Vec<usize> = Vec::with_capacity(selected.0.len());
    for name in &selected.0 {
        let key = name.to_lowercase();
        let idx = names_lower.iter().position(|n| *n == key).ok_or_else(|| {
            SpectralError::ComponentNotFound {
                name: name.clone(),
                available: component_names
                    .iter()
                    .map(|n| n.as_ref().to_string())
                    .collect(),
            }
        })?;
        if !idxs.contains(&idx) {
            f[idx] = 1.0;
            idxs.push(idx);
        }
    }
    Ok((f, idxs))
}

/// Build `f` aligned to the columns of `matrix`.
///
/// When `columns` is given it is used as the authoritative column order.
/// Otherwise the iteration order of `reference_vectors` is used; every
/// [`ReferenceVectors`] produced by this crate iterates in column order, but
/// for hand-assembled values matching that order is the caller's obligation.
///
/// Fails with [`SpectralError::ColumnMismatch`] when the alignment list does
/// not have one name per column of `matrix`.
pub fn find_f_from_extract_comp(
    matrix: &DMatrix<f64>,
    targets: impl Into<Selection>,
    reference_vectors: &ReferenceVectors,
    columns: Option<&[String]>,
) -> Result<DVector<f64>, SpectralError> {
    let columns: Vec<String> = match columns {
        Some(cols) => cols.to_vec(),
        None => reference_vectors.names(),
    };
    if columns.len() != matrix.ncols() {
        return Err(SpectralError::ColumnMismatch {
            columns,
            ncols: matrix.ncols(),
        });
    }

    let (f, _) = find_f_from_names(columns.as_slice(), targets)?;
    debug!("f: {}", f.transpose());
    Ok(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_name_sets_one_index() {
        let (f, idxs) = find_f_from_names(&["tsz", "cmb", "sync"], "cmb").unwrap();
        assert_eq!(f.as_slice(), &[0.0, 1.0, 0.0]);
        assert_eq!(idxs, vec![1]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let (f, idxs) = find_f_from_names(&["CMB", "tSZ"], ["tsz", "Cmb"]).unwrap();
        assert_eq!(f.as_slice(), &[1.0, 1.0]);
        assert_eq!(idxs, vec![1, 0]);
    }

    #[test]
    fn duplicates_are_idempotent() {
        let names = ["cmb", "tsz", "sync"];
        let (once, _) = find_f_from_names(&names, "sync").unwrap();
        let (twice, idxs) = find_f_from_names(&names, ["sync", "SYNC"]).unwrap();
        assert_eq!(once, twice);
        assert_eq!(idxs, vec![2]);
        assert_eq!(twice.sum(), 1.0);
    }

    #[test]
    fn missing_name_reports_available_set() {
        let err = find_f_from_names(&["cmb", "tsz"], vec!["cmb", "dust"]).unwrap_err();
        match &err {
            SpectralError::ComponentNotFound { name, available } => {
                assert_eq!(name, "dust");
                assert_eq!(available, &vec!["cmb".to_string(), "tsz".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().contains("dust"));
        assert!(err.to_string().contains("tsz"));
    }

    #[test]
    fn empty_selection_is_all_zero() {
        let (f, idxs) = find_f_from_names(&["cmb"], Vec::<String>::new()).unwrap();
        assert_eq!(f.as_slice(), &[0.0]);
        assert!(idxs.is_empty());
    }

    #[test]
    fn extract_comp_prefers_explicit_columns() {
        let matrix = DMatrix::<f64>::zeros(4, 2);
        let mut refs = ReferenceVectors::default();
        refs.insert("cmb", DVector::zeros(4));
        refs.insert("tsz", DVector::zeros(4));

        let cols = vec!["tsz".to_string(), "cmb".to_string()];
        let f = find_f_from_extract_comp(&matrix, "cmb", &refs, Some(cols.as_slice())).unwrap();
        assert_eq!(f.as_slice(), &[0.0, 1.0]);

        // fallback: reference vector insertion order
        let f = find_f_from_extract_comp(&matrix, "cmb", &refs, None).unwrap();
        assert_eq!(f.as_slice(), &[1.0, 0.0]);
    }

    #[test]
    fn extract_comp_rejects_misaligned_columns() {
        let matrix = DMatrix::<f64>::zeros(4, 3);
        let refs = ReferenceVectors::default();
        let cols = vec!["cmb".to_string()];
        assert!(matches!(
            find_f_from_extract_comp(&matrix, "cmb", &refs, Some(cols.as_slice())),
            Err(SpectralError::ColumnMismatch { ncols: 3, .. })
        ));
    }
}
